//! Transport controller
//!
//! Owns the current playable unit and the two audio slots, issues
//! play/pause/seek, preloads the next unit and advances automatically at the
//! natural end of a unit.
//!
//! # State machine
//!
//! ```text
//! Idle → Loading → Ready → Playing ⇄ Paused
//! Playing --end of unit, not last--> Transitioning --audible--> Playing
//! Playing/Paused --unit selected--> Loading
//! any --teardown--> Idle
//! ```
//!
//! All mutation happens through `&mut self` on the engine task, so media
//! events and commands are applied one at a time and no handler ever sees a
//! half-updated state. Observable changes are published on the [`EventBus`].
//!
//! # Pause suppression
//!
//! A `Paused` notification is an artifact (not a user pause) when it arrives
//! while `Transitioning`, when the device flags it as caused by the end of the
//! track, or after the natural end was already observed. Notifications from
//! the standby slot are ignored altogether except readiness and failure.

pub mod ramp;

use crate::media::{AudioSlot, MediaEvent, MediaEventKind, SlotId, SlotPair, SlotRole};
use chrono::Utc;
use ramp::GainRamp;
use std::time::Duration;
use tilawa_common::config::TransportConfig;
use tilawa_common::events::{
    EventBus, PlaybackSnapshot, SyncEvent, TransportPhase, UnitChangeCause,
};
use tilawa_common::model::{PlaybackMode, Section, TrackSet};
use tracing::{debug, info, trace, warn};

/// Unit whose audio sits in the standby slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preload {
    pub index: usize,
    pub locator: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceAssignment {
    /// No usable locator for the active unit
    Missing,
    Unchanged,
    Changed,
}

pub struct TransportController<S: AudioSlot> {
    slots: SlotPair<S>,
    section: Option<Section>,
    tracks: Option<TrackSet>,
    phase: TransportPhase,
    active_index: usize,
    current_time: f64,
    duration: f64,
    /// Playback requested but not yet audible
    play_pending: bool,
    /// Natural end of the active source observed since the last play
    ended: bool,
    preload: Option<Preload>,
    ramp: GainRamp,
    events: EventBus,
}

impl<S: AudioSlot> TransportController<S> {
    pub fn new(slots: SlotPair<S>, config: &TransportConfig, events: EventBus) -> Self {
        Self {
            slots,
            section: None,
            tracks: None,
            phase: TransportPhase::Idle,
            active_index: 0,
            current_time: 0.0,
            duration: 0.0,
            play_pending: false,
            ended: false,
            preload: None,
            ramp: GainRamp::from_config(config),
            events,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn phase(&self) -> TransportPhase {
        self.phase
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn section(&self) -> Option<&Section> {
        self.section.as_ref()
    }

    pub fn mode(&self) -> Option<PlaybackMode> {
        self.tracks.as_ref().map(TrackSet::mode)
    }

    pub fn is_segmented(&self) -> bool {
        self.mode() == Some(PlaybackMode::Segmented)
    }

    /// Playing, transitioning, or waiting for a requested play to start
    pub fn is_playing(&self) -> bool {
        self.phase.is_playing() || self.play_pending
    }

    pub fn slots(&self) -> &SlotPair<S> {
        &self.slots
    }

    pub fn preload(&self) -> Option<&Preload> {
        self.preload.as_ref()
    }

    pub fn ramp_active(&self) -> bool {
        self.ramp.is_active()
    }

    pub fn ramp_generation(&self) -> u64 {
        self.ramp.generation()
    }

    pub fn ramp_interval(&self) -> Duration {
        self.ramp.interval()
    }

    /// Read-only view published to the rendering surface
    pub fn snapshot(&self) -> PlaybackSnapshot {
        let section = self.section.as_ref();
        PlaybackSnapshot {
            section_id: section.map(|s| s.id),
            mode: self.mode(),
            phase: self.phase,
            active_unit_index: self.active_index,
            active_unit_ordinal: section
                .and_then(|s| s.unit(self.active_index))
                .map(|u| u.ordinal),
            unit_count: section.map(Section::len).unwrap_or(0),
            is_playing: self.is_playing(),
            is_transitioning: self.phase == TransportPhase::Transitioning,
            current_time: self.current_time,
            duration: self.duration,
            ..Default::default()
        }
        .with_progress()
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Install a new section and track set, discarding the previous session
    ///
    /// Playback state resets to unit 0, stopped, time 0; any ramp and
    /// preload are cancelled.
    pub fn load_section(&mut self, section: Section, tracks: TrackSet) {
        self.reset_session();

        info!(
            section_id = section.id,
            units = section.len(),
            tracks = tracks.len(),
            mode = %tracks.mode(),
            "Loading section"
        );

        self.events.emit_lossy(SyncEvent::SectionLoaded {
            section_id: section.id,
            unit_count: section.len(),
            mode: tracks.mode(),
            timestamp: Utc::now(),
        });

        let has_units = !section.is_empty();
        self.section = Some(section);
        self.tracks = Some(tracks);

        if has_units {
            self.emit_unit_changed(UnitChangeCause::Reset);
            self.begin_unit(false, false);
        }
        self.publish_tick();
    }

    /// Swap the track set for the current section (voice change)
    ///
    /// Keeps the active unit when the new set is segmented (pinned to 0 when
    /// continuous) and resumes playback if it was in progress.
    pub fn replace_tracks(&mut self, tracks: TrackSet) {
        let Some(section) = self.section.as_ref() else {
            warn!("Track set replacement ignored: no section loaded");
            return;
        };
        let section_id = section.id;
        let unit_count = section.len();
        let last_index = section.last_index();
        let resume = self.is_playing();

        info!(
            section_id,
            tracks = tracks.len(),
            mode = %tracks.mode(),
            resume,
            "Replacing track set"
        );

        self.ramp.cancel();
        self.slots.reset();
        self.preload = None;
        self.play_pending = false;
        self.ended = false;
        self.current_time = 0.0;
        self.duration = 0.0;
        self.set_phase(TransportPhase::Idle);

        let previous_index = self.active_index;
        self.active_index = if tracks.is_segmented() {
            last_index.map_or(0, |last| previous_index.min(last))
        } else {
            0
        };

        self.events.emit_lossy(SyncEvent::SectionLoaded {
            section_id,
            unit_count,
            mode: tracks.mode(),
            timestamp: Utc::now(),
        });
        self.tracks = Some(tracks);

        if unit_count > 0 {
            if self.active_index != previous_index {
                self.emit_unit_changed(UnitChangeCause::Reset);
            }
            self.begin_unit(resume, false);
        }
        self.publish_tick();
    }

    /// End the session: stop both slots and drop the section
    pub fn teardown(&mut self) {
        if self.section.is_none() && self.phase == TransportPhase::Idle {
            return;
        }
        info!("Tearing down playback session");
        self.reset_session();
        self.publish_tick();
    }

    fn reset_session(&mut self) {
        self.ramp.cancel();
        self.slots.reset();
        self.preload = None;
        self.section = None;
        self.tracks = None;
        self.active_index = 0;
        self.current_time = 0.0;
        self.duration = 0.0;
        self.play_pending = false;
        self.ended = false;
        self.set_phase(TransportPhase::Idle);
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn toggle_play_pause(&mut self) {
        if self.tracks.is_none() {
            debug!("Play/pause ignored: no track set");
            return;
        }

        if self.is_playing() {
            info!(unit = self.active_index, "Pausing playback");
            self.play_pending = false;
            self.ramp.cancel();
            if self.slots.active().source().is_some() {
                self.slots.active_mut().pause();
            }
            if self.phase.is_playing() {
                self.set_phase(TransportPhase::Paused);
            }
        } else {
            if self.target_locator().is_none() {
                debug!(unit = self.active_index, "Play ignored: no locator for active unit");
                return;
            }
            info!(unit = self.active_index, "Starting playback");
            self.ended = false;
            self.begin_unit(true, false);
        }
        self.publish_tick();
    }

    /// Jump to a unit (segmented mode only; clamped to the last unit)
    pub fn select_unit(&mut self, index: usize) {
        self.jump_to(index);
    }

    pub fn advance(&mut self) {
        if !self.is_segmented() {
            debug!("Advance ignored in continuous mode");
            return;
        }
        self.jump_to(self.active_index.saturating_add(1));
    }

    pub fn retreat(&mut self) {
        if !self.is_segmented() {
            debug!("Retreat ignored in continuous mode");
            return;
        }
        self.jump_to(self.active_index.saturating_sub(1));
    }

    /// Move the active slot to `fraction` of its length (clamped to 0..=1)
    pub fn seek(&mut self, fraction: f64) {
        if !fraction.is_finite() {
            debug!("Seek ignored: non-finite position");
            return;
        }
        if self.duration <= 0.0 || self.slots.active().source().is_none() {
            debug!("Seek ignored: duration unknown");
            return;
        }

        let time = fraction.clamp(0.0, 1.0) * self.duration;
        debug!(unit = self.active_index, time, "Seeking");
        self.slots.active_mut().seek(time);
        self.current_time = time;
        self.publish_tick();
    }

    /// Advance the gain ramp by one step
    pub fn on_ramp_tick(&mut self) {
        if let Some(volume) = self.ramp.tick() {
            self.slots.active_mut().set_volume(volume);
            if !self.ramp.is_active() {
                trace!(unit = self.active_index, "Gain ramp complete");
            }
        }
    }

    fn jump_to(&mut self, requested: usize) {
        if !self.is_segmented() {
            debug!(requested, "Unit selection ignored in continuous mode");
            return;
        }
        let Some(last) = self.section.as_ref().and_then(Section::last_index) else {
            return;
        };
        let index = requested.min(last);
        if index == self.active_index {
            return;
        }

        let resume = self.is_playing();
        info!(from = self.active_index, to = index, resume, "Unit selected");

        self.ramp.cancel();
        self.ended = false;
        self.active_index = index;
        self.emit_unit_changed(UnitChangeCause::UserSelect);
        self.begin_unit(resume, false);
        self.publish_tick();
    }

    // ------------------------------------------------------------------
    // Media events
    // ------------------------------------------------------------------

    pub fn on_media_event(&mut self, event: MediaEvent) {
        let MediaEvent { slot, source, kind } = event;

        if self.slots.get(slot).source() != Some(source.as_str()) {
            trace!(slot = %slot, source = %source, "Stale media event dropped");
            return;
        }

        match self.slots.role_of(slot) {
            SlotRole::Standby => self.on_standby_event(slot, &source, kind),
            SlotRole::Active => self.on_active_event(slot, &source, kind),
        }
    }

    fn on_standby_event(&mut self, slot: SlotId, source: &str, kind: MediaEventKind) {
        match kind {
            MediaEventKind::Ready { duration } => {
                self.slots.mark_ready(slot, duration);
                debug!(slot = %slot, source, duration, "Preload ready");
            }
            MediaEventKind::Failed { reason } => {
                warn!(slot = %slot, source, reason = %reason, "Preload failed");
                self.slots.release(slot);
                self.preload = None;
            }
            other => {
                trace!(slot = %slot, event = ?other, "Standby slot event ignored");
            }
        }
    }

    fn on_active_event(&mut self, slot: SlotId, source: &str, kind: MediaEventKind) {
        match kind {
            MediaEventKind::Ready { duration } => {
                self.slots.mark_ready(slot, duration);
                self.duration = duration;
                debug!(slot = %slot, source, duration, "Active source ready");
                if self.phase == TransportPhase::Loading {
                    self.set_phase(TransportPhase::Ready);
                }
                if self.play_pending || self.phase == TransportPhase::Transitioning {
                    self.request_play();
                }
                self.publish_tick();
            }
            MediaEventKind::Playing => {
                if !(self.play_pending || self.phase.is_playing()) {
                    debug!(slot = %slot, "Unrequested playback start ignored");
                    return;
                }
                if self.phase == TransportPhase::Playing {
                    return;
                }
                if self.phase == TransportPhase::Transitioning {
                    info!(unit = self.active_index, source, "Transition complete");
                }
                self.play_pending = false;
                self.ended = false;
                self.set_phase(TransportPhase::Playing);
                let volume = self.ramp.start();
                self.slots.active_mut().set_volume(volume);
                self.publish_tick();
            }
            MediaEventKind::Paused { ended } => {
                if ended || self.ended || self.phase == TransportPhase::Transitioning {
                    debug!(unit = self.active_index, ended, "Pause suppressed");
                    return;
                }
                if self.phase == TransportPhase::Playing {
                    info!(unit = self.active_index, "Playback paused by device");
                    self.play_pending = false;
                    self.ramp.cancel();
                    self.set_phase(TransportPhase::Paused);
                    self.publish_tick();
                }
            }
            MediaEventKind::TimeUpdate {
                current_time,
                duration,
            } => {
                if current_time.is_finite() {
                    self.current_time = current_time.max(0.0);
                }
                if duration.is_finite() && duration > 0.0 {
                    self.duration = duration;
                }
                self.publish_tick();
            }
            MediaEventKind::Ended => self.on_natural_end(),
            MediaEventKind::Failed { reason } => self.on_failure(source, reason),
        }
    }

    fn on_natural_end(&mut self) {
        self.ended = true;
        self.ramp.cancel();

        if !self.is_segmented() {
            info!("Continuous track finished");
            self.stop_at_start();
            self.publish_tick();
            return;
        }

        let last = self.section.as_ref().and_then(Section::last_index);
        match last {
            Some(last) if self.active_index < last => {
                let from = self.active_index;
                self.set_phase(TransportPhase::Transitioning);
                self.active_index = from + 1;
                info!(from, to = self.active_index, "Auto-advancing to next unit");
                self.emit_unit_changed(UnitChangeCause::AutoAdvance);
                self.begin_unit(true, true);
            }
            _ => {
                info!(unit = self.active_index, "Reached end of section");
                self.stop_at_start();
            }
        }
        self.publish_tick();
    }

    fn on_failure(&mut self, source: &str, reason: String) {
        warn!(
            unit = self.active_index,
            source,
            reason = %reason,
            "Playback failed"
        );

        let active = self.slots.active_id();
        if !self.slots.is_ready(active) {
            // Load never completed: drop the source so the next play retries it
            self.slots.release(active);
        }

        self.play_pending = false;
        self.ramp.cancel();
        if self.phase != TransportPhase::Idle {
            self.set_phase(TransportPhase::Paused);
        }

        self.events.emit_lossy(SyncEvent::PlaybackError {
            active_unit_index: self.active_index,
            locator: Some(source.to_string()),
            message: reason,
            timestamp: Utc::now(),
        });
        self.publish_tick();
    }

    // ------------------------------------------------------------------
    // Source assignment
    // ------------------------------------------------------------------

    /// Locator for the active unit's track (track 0 in continuous mode)
    fn target_locator(&self) -> Option<&str> {
        let tracks = self.tracks.as_ref()?;
        let index = if tracks.is_segmented() {
            self.active_index
        } else {
            0
        };
        tracks.locator_for(index)
    }

    /// Make the active slot hold the active unit's source, then preload
    ///
    /// `resume` requests playback as soon as the source is ready;
    /// `transitioning` keeps the phase at `Transitioning` until audible.
    fn begin_unit(&mut self, resume: bool, transitioning: bool) {
        let assignment = self.assign_active_source();
        self.assign_preload();

        if assignment == SourceAssignment::Missing {
            self.play_pending = false;
            self.set_phase(TransportPhase::Idle);
            return;
        }

        if resume {
            self.play_pending = true;
        }

        let ready = self.slots.is_ready(self.slots.active_id());
        let reloaded =
            assignment == SourceAssignment::Changed || self.phase == TransportPhase::Idle;
        if !transitioning && reloaded {
            self.set_phase(if ready {
                TransportPhase::Ready
            } else {
                TransportPhase::Loading
            });
        }

        if ready && (self.play_pending || transitioning) {
            self.request_play();
        }
    }

    fn assign_active_source(&mut self) -> SourceAssignment {
        let Some(target) = self.target_locator().map(str::to_owned) else {
            debug!(unit = self.active_index, "No locator for active unit; assignment skipped");
            return SourceAssignment::Missing;
        };

        if self.slots.active().source() == Some(target.as_str()) {
            return SourceAssignment::Unchanged;
        }

        let outgoing = self.slots.active_id();
        if self.slots.standby().source() == Some(target.as_str()) {
            // Silence the outgoing slot before promoting the preloaded one
            if self.slots.active().source().is_some() {
                self.slots.active_mut().pause();
            }
            self.slots.active_mut().set_volume(0.0);
            self.slots.swap();
            self.preload = None;
            info!(
                unit = self.active_index,
                from = %outgoing,
                to = %self.slots.active_id(),
                locator = %target,
                "Promoted preloaded slot"
            );
        } else {
            self.slots.assign(outgoing, &target);
            info!(
                unit = self.active_index,
                slot = %outgoing,
                locator = %target,
                "Assigned source to active slot"
            );
        }

        self.slots.active_mut().set_volume(0.0);
        self.current_time = 0.0;
        self.duration = self
            .slots
            .loaded_duration(self.slots.active_id())
            .unwrap_or(0.0);
        SourceAssignment::Changed
    }

    /// Load the next unit's audio into the standby slot (segmented only)
    fn assign_preload(&mut self) {
        if !self.is_segmented() {
            return;
        }

        let next = self.active_index + 1;
        let in_section = self
            .section
            .as_ref()
            .and_then(Section::last_index)
            .is_some_and(|last| next <= last);
        let locator = if in_section {
            self.tracks
                .as_ref()
                .and_then(|t| t.locator_for(next))
                .map(str::to_owned)
        } else {
            None
        };

        let standby = self.slots.standby_id();
        match locator {
            Some(locator) => {
                if self.slots.standby().source() != Some(locator.as_str()) {
                    self.slots.assign(standby, &locator);
                    debug!(unit = next, slot = %standby, locator = %locator, "Preloading next unit");
                    self.events.emit_lossy(SyncEvent::PreloadAssigned {
                        index: next,
                        locator: locator.clone(),
                        timestamp: Utc::now(),
                    });
                }
                self.preload = Some(Preload {
                    index: next,
                    locator,
                });
            }
            None => {
                if self.slots.standby().source().is_some() {
                    self.slots.release(standby);
                }
                self.preload = None;
            }
        }
    }

    fn request_play(&mut self) {
        self.play_pending = true;
        let slot = self.slots.active_mut();
        slot.set_volume(0.0);
        slot.play();
    }

    /// Stop after the natural end: progress back to 0, nothing pending
    fn stop_at_start(&mut self) {
        self.play_pending = false;
        self.current_time = 0.0;
        if self.slots.active().source().is_some() {
            self.slots.active_mut().seek(0.0);
        }
        let stopped = if self.slots.is_ready(self.slots.active_id()) {
            TransportPhase::Ready
        } else {
            TransportPhase::Idle
        };
        self.set_phase(stopped);
    }

    // ------------------------------------------------------------------
    // Publishing
    // ------------------------------------------------------------------

    fn set_phase(&mut self, new_state: TransportPhase) {
        if self.phase == new_state {
            return;
        }
        let old_state = self.phase;
        self.phase = new_state;
        debug!(from = %old_state, to = %new_state, "Transport phase changed");
        self.events.emit_lossy(SyncEvent::PlaybackStateChanged {
            old_state,
            new_state,
            timestamp: Utc::now(),
        });
    }

    fn emit_unit_changed(&self, cause: UnitChangeCause) {
        let ordinal = self
            .section
            .as_ref()
            .and_then(|s| s.unit(self.active_index))
            .map(|u| u.ordinal)
            .unwrap_or(self.active_index as u32 + 1);
        self.events.emit_lossy(SyncEvent::ActiveUnitChanged {
            index: self.active_index,
            ordinal,
            cause,
            timestamp: Utc::now(),
        });
    }

    fn publish_tick(&self) {
        self.events.emit_lossy(SyncEvent::PlaybackTick {
            snapshot: self.snapshot(),
            timestamp: Utc::now(),
        });
    }
}
