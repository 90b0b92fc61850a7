//! Audio output slot abstraction
//!
//! The transport drives two symmetric slots. One is *active* (audible), the
//! other is *standby* (holding a silent, preloaded source). Roles swap when
//! the standby slot's source becomes the one to play.
//!
//! Slot operations are fire-and-forget: their outcome comes back as
//! [`MediaEvent`]s on the engine's media channel, in the order the device
//! produced them.

pub mod simulated;

use serde::{Deserialize, Serialize};

/// Physical slot identity (stable across role swaps)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    pub fn other(self) -> SlotId {
        match self {
            SlotId::A => SlotId::B,
            SlotId::B => SlotId::A,
        }
    }

    fn index(self) -> usize {
        match self {
            SlotId::A => 0,
            SlotId::B => 1,
        }
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotId::A => write!(f, "A"),
            SlotId::B => write!(f, "B"),
        }
    }
}

/// Current role of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotRole {
    Active,
    Standby,
}

/// One addressable audio output handle
///
/// Implementations must report every outcome as a [`MediaEvent`] tagged with
/// their [`SlotId`] and the source the event belongs to.
pub trait AudioSlot: Send + 'static {
    fn id(&self) -> SlotId;

    /// Currently assigned locator
    fn source(&self) -> Option<&str>;

    /// Replace the source and start loading it; playback stays stopped
    fn assign(&mut self, locator: &str);

    /// Drop the source
    fn clear(&mut self);

    /// Request playback (starts once loaded)
    fn play(&mut self);

    fn pause(&mut self);

    /// Move the play position to `seconds`
    fn seek(&mut self, seconds: f64);

    /// Set output volume (0.0..=1.0)
    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;
}

/// Notification from an audio slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEvent {
    pub slot: SlotId,
    /// Locator the slot held when the event was produced
    pub source: String,
    pub kind: MediaEventKind,
}

impl MediaEvent {
    pub fn new(slot: SlotId, source: impl Into<String>, kind: MediaEventKind) -> Self {
        Self {
            slot,
            source: source.into(),
            kind,
        }
    }
}

/// Media event kinds, mirroring the usual audio element notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaEventKind {
    /// Source loaded and playable without buffering
    Ready { duration: f64 },
    /// Playback became audible
    Playing,
    /// Playback paused; `ended` is set when the pause comes from reaching the end
    Paused { ended: bool },
    /// Progress update
    TimeUpdate { current_time: f64, duration: f64 },
    /// Natural end of the source
    Ended,
    /// Load, decode or play request failed
    Failed { reason: String },
}

/// Two slots with an active/standby role tag
///
/// Also tracks which slot sources have reported ready, and their length.
pub struct SlotPair<S: AudioSlot> {
    slots: [S; 2],
    loaded: [Option<f64>; 2],
    active: SlotId,
}

impl<S: AudioSlot> SlotPair<S> {
    /// Build a pair; slot A starts active
    ///
    /// The slots may be passed in either order.
    pub fn new(first: S, second: S) -> Self {
        let slots = if first.id() == SlotId::A {
            [first, second]
        } else {
            [second, first]
        };
        Self {
            slots,
            loaded: [None, None],
            active: SlotId::A,
        }
    }

    pub fn active_id(&self) -> SlotId {
        self.active
    }

    pub fn standby_id(&self) -> SlotId {
        self.active.other()
    }

    pub fn role_of(&self, id: SlotId) -> SlotRole {
        if id == self.active {
            SlotRole::Active
        } else {
            SlotRole::Standby
        }
    }

    pub fn active(&self) -> &S {
        &self.slots[self.active.index()]
    }

    pub fn active_mut(&mut self) -> &mut S {
        &mut self.slots[self.active.index()]
    }

    pub fn standby(&self) -> &S {
        &self.slots[self.standby_id().index()]
    }

    pub fn get(&self, id: SlotId) -> &S {
        &self.slots[id.index()]
    }

    /// Whether the slot's current source has reported ready
    pub fn is_ready(&self, id: SlotId) -> bool {
        self.loaded[id.index()].is_some()
    }

    /// Length reported by the slot's current source, once ready
    pub fn loaded_duration(&self, id: SlotId) -> Option<f64> {
        self.loaded[id.index()]
    }

    pub fn mark_ready(&mut self, id: SlotId, duration: f64) {
        self.loaded[id.index()] = Some(duration);
    }

    pub fn mark_unready(&mut self, id: SlotId) {
        self.loaded[id.index()] = None;
    }

    /// Exchange roles: standby becomes active
    pub fn swap(&mut self) {
        self.active = self.active.other();
    }

    /// Assign a new source to a slot, silencing it and clearing readiness
    pub fn assign(&mut self, id: SlotId, locator: &str) {
        let slot = &mut self.slots[id.index()];
        if slot.source().is_some() {
            slot.pause();
        }
        slot.set_volume(0.0);
        slot.assign(locator);
        self.loaded[id.index()] = None;
    }

    /// Stop a slot and drop its source
    pub fn release(&mut self, id: SlotId) {
        let slot = &mut self.slots[id.index()];
        if slot.source().is_some() {
            slot.pause();
            slot.clear();
        }
        slot.set_volume(0.0);
        self.loaded[id.index()] = None;
    }

    /// Release both slots; slot A becomes active again
    pub fn reset(&mut self) {
        self.release(SlotId::A);
        self.release(SlotId::B);
        self.active = SlotId::A;
    }
}
