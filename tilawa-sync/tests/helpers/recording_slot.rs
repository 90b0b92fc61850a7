//! Recording slot backend
//!
//! Keeps the source and volume like a real slot would, and appends every
//! device operation to a shared log. Nothing is ever emitted: tests deliver
//! media events by hand.

use std::sync::{Arc, Mutex};
use tilawa_sync::media::{AudioSlot, SlotId, SlotPair};

#[derive(Debug, Clone, PartialEq)]
pub enum SlotOp {
    Assign(String),
    Clear,
    Play,
    Pause,
    Seek(f64),
}

/// Operations from both slots, in call order
#[derive(Clone, Default)]
pub struct OpLog(Arc<Mutex<Vec<(SlotId, SlotOp)>>>);

impl OpLog {
    fn push(&self, slot: SlotId, op: SlotOp) {
        self.0.lock().unwrap().push((slot, op));
    }

    pub fn all(&self) -> Vec<(SlotId, SlotOp)> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    /// Every locator assigned so far, across both slots
    pub fn assigned(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|(_, op)| match op {
                SlotOp::Assign(locator) => Some(locator),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, slot: SlotId, op: &SlotOp) -> usize {
        self.all()
            .iter()
            .filter(|(s, o)| *s == slot && o == op)
            .count()
    }

    pub fn plays(&self) -> usize {
        self.count(SlotId::A, &SlotOp::Play) + self.count(SlotId::B, &SlotOp::Play)
    }
}

pub struct RecordingSlot {
    id: SlotId,
    source: Option<String>,
    volume: f32,
    log: OpLog,
}

impl RecordingSlot {
    pub fn new(id: SlotId, log: OpLog) -> Self {
        Self {
            id,
            source: None,
            volume: 0.0,
            log,
        }
    }

    /// Both slots sharing one log
    pub fn pair() -> (SlotPair<RecordingSlot>, OpLog) {
        let log = OpLog::default();
        let pair = SlotPair::new(
            RecordingSlot::new(SlotId::A, log.clone()),
            RecordingSlot::new(SlotId::B, log.clone()),
        );
        (pair, log)
    }
}

impl AudioSlot for RecordingSlot {
    fn id(&self) -> SlotId {
        self.id
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn assign(&mut self, locator: &str) {
        self.source = Some(locator.to_string());
        self.log.push(self.id, SlotOp::Assign(locator.to_string()));
    }

    fn clear(&mut self) {
        self.source = None;
        self.log.push(self.id, SlotOp::Clear);
    }

    fn play(&mut self) {
        self.log.push(self.id, SlotOp::Play);
    }

    fn pause(&mut self) {
        self.log.push(self.id, SlotOp::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.log.push(self.id, SlotOp::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn volume(&self) -> f32 {
        self.volume
    }
}
