//! Playback-related type definitions
//!
//! Supporting types for transport state and unit changes.

use serde::{Deserialize, Serialize};

/// Transport phase of the active slot
///
/// `Idle → Loading → Ready → Playing ⇄ Paused`, with
/// `Playing → Transitioning → Playing` across an automatic unit advance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportPhase {
    /// No section or no playable source
    #[default]
    Idle,
    /// Source assigned, waiting for readiness
    Loading,
    /// Source loaded, not playing
    Ready,
    /// Audible playback
    Playing,
    /// Paused by the user or the platform
    Paused,
    /// Between the end of one unit and the next one becoming audible
    Transitioning,
}

impl TransportPhase {
    /// Whether this phase counts as "playing" for observers
    ///
    /// Transitioning reports as playing so listeners never see a paused
    /// flicker across a unit boundary.
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportPhase::Playing | TransportPhase::Transitioning)
    }
}

impl std::fmt::Display for TransportPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportPhase::Idle => write!(f, "idle"),
            TransportPhase::Loading => write!(f, "loading"),
            TransportPhase::Ready => write!(f, "ready"),
            TransportPhase::Playing => write!(f, "playing"),
            TransportPhase::Paused => write!(f, "paused"),
            TransportPhase::Transitioning => write!(f, "transitioning"),
        }
    }
}

/// Why the active unit changed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitChangeCause {
    /// Previous unit reached its natural end
    AutoAdvance,
    /// Direct selection, next or previous
    UserSelect,
    /// Section or track set replaced
    Reset,
}
