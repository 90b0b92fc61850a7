//! Shared type definitions
//!
//! Snapshot, scroll command and now-playing payloads carried by events.

use super::playback_types::TransportPhase;
use crate::human_time::format_clock;
use crate::model::{PlaybackMode, SectionId};
use serde::{Deserialize, Serialize};

/// Read-only view of transport state, published on every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlaybackSnapshot {
    pub section_id: Option<SectionId>,
    pub mode: Option<PlaybackMode>,
    pub phase: TransportPhase,
    pub active_unit_index: usize,
    /// 1-based ordinal of the active unit (None without a section)
    pub active_unit_ordinal: Option<u32>,
    pub unit_count: usize,
    pub is_playing: bool,
    pub is_transitioning: bool,
    /// Seconds into the active track
    pub current_time: f64,
    /// Active track length in seconds (0 until known)
    pub duration: f64,
    pub progress_percent: f64,
    pub current_time_label: String,
    pub duration_label: String,
}

impl PlaybackSnapshot {
    /// Fill in the derived progress fields from time and duration
    pub fn with_progress(mut self) -> Self {
        self.progress_percent = if self.duration > 0.0 {
            (self.current_time / self.duration * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.current_time_label = format_clock(self.current_time);
        self.duration_label = format_clock(self.duration);
        self
    }

    /// Progress through the active track as 0.0..=1.0
    pub fn progress_fraction(&self) -> f64 {
        self.progress_percent / 100.0
    }
}

/// Positioning command for the rendering surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrollCommand {
    /// Bring the unit at `index` to the vertical center of the viewport
    CenterUnit { index: usize, smooth: bool },
    /// Set the container's scroll offset in pixels
    ScrollTo { offset: f64 },
}

/// Artwork entry for platform media controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub src: String,
    pub sizes: String,
    pub mime_type: String,
}

/// Now-playing metadata for platform media controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlayingMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork: Vec<Artwork>,
}
