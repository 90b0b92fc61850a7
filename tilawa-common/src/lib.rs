//! # Tilawa Common Library
//!
//! Shared code for the Tilawa crates:
//! - Content data model (sections, units, track sets, voices)
//! - Event types (SyncEvent enum) and the EventBus
//! - Configuration loading
//! - Gain curve definitions for the start-of-playback ramp
//! - Clock label formatting

pub mod config;
pub mod error;
pub mod events;
pub mod gain_curve;
pub mod human_time;
pub mod model;

pub use error::{Error, Result};
pub use gain_curve::GainCurve;
