//! Scroll synchronizer
//!
//! Maps playback progress onto positioning commands for the rendering
//! surface and backs off while the user scrolls by hand.
//!
//! - Segmented mode: center the active unit whenever it changes.
//! - Continuous mode: follow `scrollable_height × progress + offset_delta`
//!   on every tick while playing, only when the view is off by more than the
//!   threshold.
//!
//! A non-programmatic scroll starts a manual override and (re)arms the quiet
//! period deadline. When the deadline passes, following resumes; in
//! continuous mode the offset delta is recomputed so following continues
//! from where the user left the view.
//!
//! The synchronizer never touches transport state. Deadlines are plain
//! instants handed in by the caller, so a later scroll simply overwrites the
//! pending deadline.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tilawa_common::config::ScrollConfig;
use tilawa_common::events::{EventBus, PlaybackSnapshot, ScrollCommand, SyncEvent};
use tilawa_common::model::{PlaybackMode, SectionId};
use tokio::time::Instant;
use tracing::{debug, info, trace};

/// Raw scroll notification from the rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollEvent {
    /// Container scroll offset in pixels
    pub scroll_top: f64,
    /// Content height minus viewport height, when the surface reports it
    #[serde(default)]
    pub scrollable_height: Option<f64>,
    /// Set by the surface when it applied one of our commands
    #[serde(default)]
    pub programmatic: bool,
}

/// Observable scroll state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollState {
    pub manual_override_active: bool,
    /// Signed correction on top of the progress-computed position
    pub manual_offset_delta: f64,
    pub last_known_scroll_top: f64,
    pub scrollable_height: f64,
}

pub struct ScrollSynchronizer {
    config: ScrollConfig,
    events: EventBus,
    section: Option<SectionId>,
    mode: Option<PlaybackMode>,
    state: ScrollState,
    quiet_deadline: Option<Instant>,
    /// Next unflagged scroll event is the echo of our own command
    expecting_programmatic: bool,
    last_centered: Option<usize>,
    /// (current_time, duration) from the latest tick
    last_progress: Option<(f64, f64)>,
}

impl ScrollSynchronizer {
    pub fn new(config: &ScrollConfig, events: EventBus) -> Self {
        Self {
            config: config.clone(),
            events,
            section: None,
            mode: None,
            state: ScrollState::default(),
            quiet_deadline: None,
            expecting_programmatic: false,
            last_centered: None,
            last_progress: None,
        }
    }

    pub fn state(&self) -> &ScrollState {
        &self.state
    }

    pub fn is_attached(&self) -> bool {
        self.section.is_some()
    }

    /// Pending quiet-period deadline, if an override is active
    pub fn quiet_deadline(&self) -> Option<Instant> {
        self.quiet_deadline
    }

    /// Unclamped follow position for continuous mode
    ///
    /// `None` until the duration is known.
    pub fn target_offset(&self, current_time: f64, duration: f64) -> Option<f64> {
        if !(duration > 0.0) || !current_time.is_finite() {
            return None;
        }
        Some(self.state.scrollable_height * (current_time / duration) + self.state.manual_offset_delta)
    }

    /// React to a transport tick; returns the command issued, if any
    pub fn on_playback(&mut self, snapshot: &PlaybackSnapshot) -> Option<ScrollCommand> {
        let Some(section_id) = snapshot.section_id else {
            if self.is_attached() {
                self.detach();
            }
            return None;
        };
        if self.section != Some(section_id) {
            self.attach(section_id);
        }
        if self.mode != snapshot.mode {
            self.mode = snapshot.mode;
            self.last_centered = None;
        }
        self.last_progress = Some((snapshot.current_time, snapshot.duration));

        match self.mode? {
            PlaybackMode::Continuous => self.follow_progress(snapshot),
            PlaybackMode::Segmented => self.follow_unit(snapshot),
        }
    }

    /// React to a scroll event from the surface at `now`
    pub fn on_scroll(&mut self, event: ScrollEvent, now: Instant) {
        if let Some(height) = event.scrollable_height {
            if height.is_finite() && height >= 0.0 {
                self.state.scrollable_height = height;
            }
        }
        if event.scroll_top.is_finite() {
            self.state.last_known_scroll_top = event.scroll_top;
        }

        if event.programmatic {
            self.expecting_programmatic = false;
            return;
        }
        if std::mem::take(&mut self.expecting_programmatic) {
            trace!(scroll_top = event.scroll_top, "Programmatic scroll echo");
            return;
        }
        if !self.is_attached() {
            return;
        }

        let was_active = self.state.manual_override_active;
        self.state.manual_override_active = true;
        self.quiet_deadline = Some(now + self.config.quiet_period());

        if !was_active {
            info!(scroll_top = event.scroll_top, "Manual scroll override started");
            self.events.emit_lossy(SyncEvent::ManualOverrideChanged {
                active: true,
                offset_delta: self.state.manual_offset_delta,
                timestamp: Utc::now(),
            });
        }
    }

    /// Release the override if the quiet period has elapsed at `now`
    ///
    /// Returns true when the override was released.
    pub fn poll_quiet(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.quiet_deadline else {
            return false;
        };
        if !self.is_attached() {
            debug!("Discarding quiet period for detached section");
            self.quiet_deadline = None;
            return false;
        }
        if now < deadline {
            return false;
        }

        self.quiet_deadline = None;
        self.state.manual_override_active = false;

        if self.mode == Some(PlaybackMode::Continuous) {
            if let Some((current_time, duration)) = self.last_progress {
                if duration > 0.0 {
                    let computed = self.state.scrollable_height * (current_time / duration);
                    self.state.manual_offset_delta = self.state.last_known_scroll_top - computed;
                }
            }
        }

        info!(
            offset_delta = self.state.manual_offset_delta,
            "Manual scroll override released"
        );
        self.events.emit_lossy(SyncEvent::ManualOverrideChanged {
            active: false,
            offset_delta: self.state.manual_offset_delta,
            timestamp: Utc::now(),
        });
        true
    }

    /// Forget the section; pending deadlines are dropped
    pub fn detach(&mut self) {
        debug!(section_id = ?self.section, "Scroll synchronizer detached");
        self.section = None;
        self.mode = None;
        self.reset();
    }

    /// The section was replaced, even if under the same id
    ///
    /// Cancels any override and its quiet period; the next tick attaches
    /// afresh.
    pub fn release_section(&mut self) {
        let was_overridden = self.state.manual_override_active;
        self.detach();
        if was_overridden {
            self.emit_override_cleared();
        }
    }

    fn attach(&mut self, section_id: SectionId) {
        debug!(section_id, "Scroll synchronizer attached");
        let was_overridden = self.state.manual_override_active;
        self.section = Some(section_id);
        self.mode = None;
        self.reset();
        if was_overridden {
            self.emit_override_cleared();
        }
    }

    fn emit_override_cleared(&self) {
        self.events.emit_lossy(SyncEvent::ManualOverrideChanged {
            active: false,
            offset_delta: 0.0,
            timestamp: Utc::now(),
        });
    }

    fn reset(&mut self) {
        self.state.manual_override_active = false;
        self.state.manual_offset_delta = 0.0;
        self.state.last_known_scroll_top = 0.0;
        self.quiet_deadline = None;
        self.expecting_programmatic = false;
        self.last_centered = None;
        self.last_progress = None;
    }

    fn follow_progress(&mut self, snapshot: &PlaybackSnapshot) -> Option<ScrollCommand> {
        if snapshot.current_time < self.config.offset_reset_secs
            && self.state.manual_offset_delta != 0.0
        {
            debug!("Playback near start; manual offset reset");
            self.state.manual_offset_delta = 0.0;
        }

        if self.state.manual_override_active || !snapshot.is_playing {
            return None;
        }

        let target = self
            .target_offset(snapshot.current_time, snapshot.duration)?
            .clamp(0.0, self.state.scrollable_height.max(0.0));
        if (self.state.last_known_scroll_top - target).abs() <= self.config.threshold_px {
            return None;
        }

        self.state.last_known_scroll_top = target;
        Some(self.issue(ScrollCommand::ScrollTo { offset: target }))
    }

    fn follow_unit(&mut self, snapshot: &PlaybackSnapshot) -> Option<ScrollCommand> {
        if snapshot.unit_count == 0 {
            return None;
        }
        let index = snapshot.active_unit_index;
        if self.last_centered == Some(index) {
            return None;
        }
        self.last_centered = Some(index);

        if self.state.manual_override_active {
            debug!(index, "Centering skipped during manual override");
            return None;
        }

        Some(self.issue(ScrollCommand::CenterUnit {
            index,
            smooth: self.config.smooth_centering,
        }))
    }

    fn issue(&mut self, command: ScrollCommand) -> ScrollCommand {
        self.expecting_programmatic = true;
        trace!(?command, "Scroll command");
        self.events.emit_lossy(SyncEvent::ScrollCommand {
            command: command.clone(),
            timestamp: Utc::now(),
        });
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tilawa_common::events::TransportPhase;

    fn synchronizer() -> ScrollSynchronizer {
        ScrollSynchronizer::new(&ScrollConfig::default(), EventBus::new(64))
    }

    fn continuous_tick(current_time: f64, duration: f64) -> PlaybackSnapshot {
        PlaybackSnapshot {
            section_id: Some(1),
            mode: Some(PlaybackMode::Continuous),
            phase: TransportPhase::Playing,
            unit_count: 7,
            is_playing: true,
            current_time,
            duration,
            ..Default::default()
        }
    }

    fn viewport(sync: &mut ScrollSynchronizer, height: f64) {
        sync.on_scroll(
            ScrollEvent {
                scroll_top: 0.0,
                scrollable_height: Some(height),
                programmatic: true,
            },
            Instant::now(),
        );
    }

    #[test]
    fn test_target_offset_at_half_progress() {
        let mut sync = synchronizer();
        sync.on_playback(&continuous_tick(0.0, 200.0));
        viewport(&mut sync, 4000.0);

        assert_eq!(sync.target_offset(100.0, 200.0), Some(2000.0));

        sync.state.manual_offset_delta = -150.0;
        assert_eq!(sync.target_offset(100.0, 200.0), Some(0.5 * 4000.0 - 150.0));
    }

    #[test]
    fn test_target_offset_unknown_duration() {
        let sync = synchronizer();
        assert_eq!(sync.target_offset(10.0, 0.0), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_small_drift_is_not_corrected() {
        let mut sync = synchronizer();
        sync.on_playback(&continuous_tick(0.0, 200.0));
        viewport(&mut sync, 2000.0);

        // 1s of 200s over 2000px is 10px: within threshold
        assert_eq!(sync.on_playback(&continuous_tick(1.0, 200.0)), None);
        assert!(sync.on_playback(&continuous_tick(2.0, 200.0)).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_echo_is_not_manual() {
        let mut sync = synchronizer();
        sync.on_playback(&continuous_tick(0.0, 100.0));
        viewport(&mut sync, 1000.0);

        let command = sync.on_playback(&continuous_tick(50.0, 100.0));
        assert_eq!(command, Some(ScrollCommand::ScrollTo { offset: 500.0 }));

        // Surface applied the command without flagging it
        sync.on_scroll(
            ScrollEvent {
                scroll_top: 500.0,
                scrollable_height: None,
                programmatic: false,
            },
            Instant::now(),
        );
        assert!(!sync.state().manual_override_active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_override_deadline_is_rescheduled() {
        let mut sync = synchronizer();
        sync.on_playback(&continuous_tick(10.0, 100.0));
        let start = Instant::now();

        let manual = ScrollEvent {
            scroll_top: 300.0,
            scrollable_height: Some(1000.0),
            programmatic: false,
        };
        sync.on_scroll(manual, start);
        sync.on_scroll(manual, start + Duration::from_secs(3));

        assert_eq!(sync.quiet_deadline(), Some(start + Duration::from_secs(7)));
        assert!(!sync.poll_quiet(start + Duration::from_secs(5)));
        assert!(sync.poll_quiet(start + Duration::from_secs(7)));
        assert!(!sync.state().manual_override_active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_recomputes_offset_in_continuous_mode() {
        let mut sync = synchronizer();
        sync.on_playback(&continuous_tick(20.0, 100.0));
        let start = Instant::now();

        sync.on_scroll(
            ScrollEvent {
                scroll_top: 350.0,
                scrollable_height: Some(1000.0),
                programmatic: false,
            },
            start,
        );
        sync.on_playback(&continuous_tick(25.0, 100.0));
        assert!(sync.poll_quiet(start + Duration::from_secs(4)));

        // 350 - 1000 × 0.25
        assert_eq!(sync.state().manual_offset_delta, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offset_resets_near_start() {
        let mut sync = synchronizer();
        sync.on_playback(&continuous_tick(20.0, 100.0));
        sync.state.manual_offset_delta = 80.0;

        sync.on_playback(&continuous_tick(0.4, 100.0));
        assert_eq!(sync.state().manual_offset_delta, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detach_discards_pending_deadline() {
        let mut sync = synchronizer();
        sync.on_playback(&continuous_tick(20.0, 100.0));
        let start = Instant::now();
        sync.on_scroll(
            ScrollEvent {
                scroll_top: 10.0,
                scrollable_height: Some(1000.0),
                programmatic: false,
            },
            start,
        );

        sync.on_playback(&PlaybackSnapshot::default());
        assert!(!sync.is_attached());
        assert_eq!(sync.quiet_deadline(), None);
        assert!(!sync.poll_quiet(start + Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_section_with_same_id_clears_override() {
        let mut sync = synchronizer();
        sync.on_playback(&continuous_tick(20.0, 100.0));
        let start = Instant::now();
        sync.on_scroll(
            ScrollEvent {
                scroll_top: 300.0,
                scrollable_height: Some(1000.0),
                programmatic: false,
            },
            start,
        );
        sync.state.manual_offset_delta = 60.0;

        sync.release_section();
        assert!(!sync.state().manual_override_active);
        assert_eq!(sync.state().manual_offset_delta, 0.0);
        assert_eq!(sync.quiet_deadline(), None);

        // Same section id again: reattaches from scratch
        sync.on_playback(&continuous_tick(0.0, 100.0));
        assert!(sync.is_attached());
        assert!(!sync.poll_quiet(start + Duration::from_secs(10)));
    }
}
