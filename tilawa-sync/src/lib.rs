//! # Tilawa Sync Library (tilawa-sync)
//!
//! Playback synchronization engine: drives per-unit (or whole-section) audio
//! through two alternating output slots with gapless auto-advance and
//! fade-in, and keeps the rendering surface's scroll position locked to
//! playback while tolerating manual scrolling.
//!
//! **Architecture:** one engine task owns the [`transport`] controller and
//! the [`scroll`] synchronizer; commands arrive over an
//! [`EngineHandle`](engine::EngineHandle), media events over a channel fed
//! by the [`media`] slots, and every observable change leaves as a
//! [`SyncEvent`](tilawa_common::events::SyncEvent).

pub mod api;
pub mod content;
pub mod engine;
pub mod error;
pub mod media;
pub mod media_session;
pub mod scroll;
pub mod transport;

pub use error::{Error, Result};
