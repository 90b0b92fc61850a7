//! Test helper modules for tilawa-sync integration tests
//!
//! Provides reusable test infrastructure components:
//! - RecordingSlot: in-memory slot backend that logs every operation
//! - fixtures: sections, track sets and event draining
//! - TestServer: router over a live engine with the demo library

#![allow(dead_code)]

pub mod fixtures;
pub mod recording_slot;
pub mod test_server;

pub use fixtures::{
    continuous_tracks, drain_events, section, segmented_tracks, unit_changes, TestTransport,
};
pub use recording_slot::{OpLog, RecordingSlot, SlotOp};
pub use test_server::TestServer;
