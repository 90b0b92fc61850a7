//! Shared fixtures for transport and scroll tests

use super::recording_slot::{OpLog, RecordingSlot};
use tilawa_common::config::TransportConfig;
use tilawa_common::events::{EventBus, SyncEvent, UnitChangeCause};
use tilawa_common::model::{AudioTrack, Section, TrackSet, Unit};
use tilawa_sync::media::{AudioSlot, MediaEvent, MediaEventKind, SlotId};
use tilawa_sync::transport::TransportController;
use tokio::sync::broadcast;

/// Section 1 with `count` units
pub fn section(count: u32) -> Section {
    section_with_id(1, count)
}

pub fn section_with_id(id: u32, count: u32) -> Section {
    let units = (1..=count)
        .map(|ordinal| Unit {
            id: ordinal as u64,
            ordinal,
            text: Some(format!("unit {}", ordinal)),
            translation: None,
        })
        .collect();
    Section::new(id, format!("section {}", id), format!("Section {}", id), units).unwrap()
}

pub fn segmented_tracks(locators: &[&str]) -> TrackSet {
    TrackSet::segmented(
        locators
            .iter()
            .enumerate()
            .map(|(i, locator)| AudioTrack {
                unit_ordinal: i as u32 + 1,
                locator: locator.to_string(),
            })
            .collect(),
    )
}

pub fn continuous_tracks(locator: &str) -> TrackSet {
    TrackSet::continuous(locator)
}

/// Everything currently queued on the receiver
pub fn drain_events(rx: &mut broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// `(index, cause)` of every ActiveUnitChanged in `events`
pub fn unit_changes(events: &[SyncEvent]) -> Vec<(usize, UnitChangeCause)> {
    events
        .iter()
        .filter_map(|e| match e {
            SyncEvent::ActiveUnitChanged { index, cause, .. } => Some((*index, *cause)),
            _ => None,
        })
        .collect()
}

/// Transport over recording slots, with its op log and an event receiver
pub struct TestTransport {
    pub transport: TransportController<RecordingSlot>,
    pub log: OpLog,
    pub rx: broadcast::Receiver<SyncEvent>,
}

impl TestTransport {
    pub fn new() -> Self {
        let (slots, log) = RecordingSlot::pair();
        let bus = EventBus::new(1000);
        let rx = bus.subscribe();
        let transport = TransportController::new(slots, &TransportConfig::default(), bus);
        Self { transport, log, rx }
    }

    pub fn events(&mut self) -> Vec<SyncEvent> {
        drain_events(&mut self.rx)
    }

    /// Slot currently holding `locator`
    pub fn slot_of(&self, locator: &str) -> SlotId {
        [SlotId::A, SlotId::B]
            .into_iter()
            .find(|id| self.transport.slots().get(*id).source() == Some(locator))
            .unwrap_or_else(|| panic!("no slot holds {}", locator))
    }

    /// Deliver a media event from whichever slot holds `locator`
    pub fn deliver(&mut self, locator: &str, kind: MediaEventKind) {
        let slot = self.slot_of(locator);
        self.transport
            .on_media_event(MediaEvent::new(slot, locator, kind));
    }

    pub fn ready(&mut self, locator: &str, duration: f64) {
        self.deliver(locator, MediaEventKind::Ready { duration });
    }

    pub fn playing(&mut self, locator: &str) {
        self.deliver(locator, MediaEventKind::Playing);
    }

    /// Device ordering at the natural end: last progress, pause, ended
    pub fn finish(&mut self, locator: &str, duration: f64) {
        self.deliver(
            locator,
            MediaEventKind::TimeUpdate {
                current_time: duration,
                duration,
            },
        );
        self.deliver(locator, MediaEventKind::Paused { ended: true });
        self.deliver(locator, MediaEventKind::Ended);
    }

    /// Complete the gain ramp
    pub fn finish_ramp(&mut self) {
        while self.transport.ramp_active() {
            self.transport.on_ramp_tick();
        }
    }
}
