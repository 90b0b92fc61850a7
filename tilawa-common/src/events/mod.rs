//! Event types for the Tilawa event system
//!
//! Provides the outbound event definitions and the EventBus used by the
//! engine to publish ticks, state changes and scroll commands.

// Sub-modules (supporting types)
mod playback_types;
mod shared_types;

pub use playback_types::{TransportPhase, UnitChangeCause};
pub use shared_types::{Artwork, NowPlayingMetadata, PlaybackSnapshot, ScrollCommand};

use crate::model::{PlaybackMode, SectionId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Tilawa event types
///
/// Every observable change leaves the engine through this enum. Events are
/// broadcast via EventBus and serialized as-is for SSE clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncEvent {
    /// A new section (or track set) was installed
    ///
    /// Triggers:
    /// - Rendering surface: replace the unit list, reset scroll
    /// - Media controls: refresh metadata
    SectionLoaded {
        section_id: SectionId,
        unit_count: usize,
        mode: PlaybackMode,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Transport state snapshot
    ///
    /// Emitted on every progress update and after every command or media
    /// event that changed transport state.
    PlaybackTick {
        snapshot: PlaybackSnapshot,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Transport phase changed
    PlaybackStateChanged {
        old_state: TransportPhase,
        new_state: TransportPhase,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Active unit moved
    ActiveUnitChanged {
        index: usize,
        ordinal: u32,
        cause: UnitChangeCause,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Standby slot was given the next unit's audio
    PreloadAssigned {
        index: usize,
        locator: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Non-fatal audio failure (load, decode or autoplay rejection)
    PlaybackError {
        active_unit_index: usize,
        locator: Option<String>,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Positioning command for the rendering surface
    ScrollCommand {
        command: ScrollCommand,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Manual scroll override started or ended
    ManualOverrideChanged {
        active: bool,
        offset_delta: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Metadata for platform media controls
    NowPlaying {
        metadata: NowPlayingMetadata,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SyncEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            SyncEvent::SectionLoaded { .. } => "SectionLoaded",
            SyncEvent::PlaybackTick { .. } => "PlaybackTick",
            SyncEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            SyncEvent::ActiveUnitChanged { .. } => "ActiveUnitChanged",
            SyncEvent::PreloadAssigned { .. } => "PreloadAssigned",
            SyncEvent::PlaybackError { .. } => "PlaybackError",
            SyncEvent::ScrollCommand { .. } => "ScrollCommand",
            SyncEvent::ManualOverrideChanged { .. } => "ManualOverrideChanged",
            SyncEvent::NowPlaying { .. } => "NowPlaying",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the engine)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use tilawa_common::events::{EventBus, SyncEvent, TransportPhase};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(SyncEvent::PlaybackStateChanged {
///     old_state: TransportPhase::Paused,
///     new_state: TransportPhase::Playing,
///     timestamp: chrono::Utc::now(),
/// }).ok();
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before slow subscribers lag
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: SyncEvent) -> Result<usize, broadcast::error::SendError<SyncEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Ticks and scroll commands go through here: nobody listening is normal.
    pub fn emit_lossy(&self, event: SyncEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_subscribe() {
        let bus = EventBus::new(100);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_eventbus_emit_no_subscribers() {
        let bus = EventBus::new(10);
        let event = SyncEvent::PlaybackStateChanged {
            old_state: TransportPhase::Paused,
            new_state: TransportPhase::Playing,
            timestamp: chrono::Utc::now(),
        };

        assert!(bus.emit(event.clone()).is_err());
        // Lossy emission never fails
        bus.emit_lossy(event);
    }

    #[tokio::test]
    async fn test_eventbus_emit_with_subscriber() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit(SyncEvent::ActiveUnitChanged {
            index: 2,
            ordinal: 3,
            cause: UnitChangeCause::AutoAdvance,
            timestamp: chrono::Utc::now(),
        })
        .unwrap();

        match rx.recv().await.unwrap() {
            SyncEvent::ActiveUnitChanged { index, ordinal, cause, .. } => {
                assert_eq!(index, 2);
                assert_eq!(ordinal, 3);
                assert_eq!(cause, UnitChangeCause::AutoAdvance);
            }
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = SyncEvent::ScrollCommand {
            command: ScrollCommand::CenterUnit { index: 4, smooth: true },
            timestamp: chrono::Utc::now(),
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ScrollCommand");
        assert_eq!(json["command"]["kind"], "center_unit");
        assert_eq!(json["command"]["index"], 4);
        assert_eq!(event.event_type(), "ScrollCommand");
    }

    #[test]
    fn test_snapshot_progress_fields() {
        let snapshot = PlaybackSnapshot {
            current_time: 100.0,
            duration: 200.0,
            ..Default::default()
        }
        .with_progress();

        assert_eq!(snapshot.progress_percent, 50.0);
        assert_eq!(snapshot.progress_fraction(), 0.5);
        assert_eq!(snapshot.current_time_label, "1:40");
        assert_eq!(snapshot.duration_label, "3:20");
    }

    #[test]
    fn test_snapshot_progress_without_duration() {
        let snapshot = PlaybackSnapshot {
            current_time: 12.0,
            duration: 0.0,
            ..Default::default()
        }
        .with_progress();

        assert_eq!(snapshot.progress_percent, 0.0);
    }

    #[test]
    fn test_transitioning_reports_playing() {
        assert!(TransportPhase::Transitioning.is_playing());
        assert!(TransportPhase::Playing.is_playing());
        assert!(!TransportPhase::Paused.is_playing());
        assert!(!TransportPhase::Loading.is_playing());
    }
}
