//! Simulated output device
//!
//! Clock-driven stand-in for real audio handles, used by the headless
//! binary and the engine tests. Each slot runs a small driver task that
//! models load latency, periodic progress updates, natural end, seek and
//! pause, and reports them as [`MediaEvent`]s.
//!
//! The driver follows audio element ordering at end of track:
//! `TimeUpdate` → `Paused { ended: true }` → `Ended`.

use super::{AudioSlot, MediaEvent, MediaEventKind, SlotId, SlotPair};
use std::sync::Arc;
use std::time::Duration;
use tilawa_common::config::SimulationConfig;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Resolves a locator to its simulated length; `None` makes loading fail
pub type DurationResolver = Arc<dyn Fn(&str) -> Option<f64> + Send + Sync>;

/// Factory for simulated slots sharing one media event channel
pub struct SimulatedDevice {
    config: SimulationConfig,
    events: mpsc::UnboundedSender<MediaEvent>,
    durations: DurationResolver,
}

impl SimulatedDevice {
    /// Every source lasts `unit_duration_secs` unless a resolver is set
    pub fn new(config: SimulationConfig, events: mpsc::UnboundedSender<MediaEvent>) -> Self {
        let unit_secs = config.unit_duration_secs;
        Self {
            config,
            events,
            durations: Arc::new(move |_| Some(unit_secs)),
        }
    }

    pub fn with_durations<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> Option<f64> + Send + Sync + 'static,
    {
        self.durations = Arc::new(resolver);
        self
    }

    /// Spawn one slot driver (must be called inside a Tokio runtime)
    pub fn slot(&self, id: SlotId) -> SimulatedSlot {
        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let driver = SlotDriver {
            id,
            source: None,
            duration: 0.0,
            position: 0.0,
            playing: false,
            play_requested: false,
            loaded: false,
            load_deadline: None,
            clock: Instant::now(),
            latency: Duration::from_millis(self.config.load_latency_ms),
            tick: Duration::from_millis(self.config.tick_interval_ms.max(1)),
            durations: Arc::clone(&self.durations),
            events: self.events.clone(),
        };
        tokio::spawn(driver.run(ops_rx));

        SimulatedSlot {
            id,
            source: None,
            volume: 0.0,
            ops: ops_tx,
        }
    }

    /// Both slots, ready to hand to the transport
    pub fn slot_pair(&self) -> SlotPair<SimulatedSlot> {
        SlotPair::new(self.slot(SlotId::A), self.slot(SlotId::B))
    }
}

enum SlotOp {
    Assign(String),
    Clear,
    Play,
    Pause,
    Seek(f64),
}

/// Handle to one simulated slot
pub struct SimulatedSlot {
    id: SlotId,
    source: Option<String>,
    volume: f32,
    ops: mpsc::UnboundedSender<SlotOp>,
}

impl SimulatedSlot {
    fn send(&self, op: SlotOp) {
        if self.ops.send(op).is_err() {
            warn!(slot = %self.id, "Simulated slot driver has stopped");
        }
    }
}

impl AudioSlot for SimulatedSlot {
    fn id(&self) -> SlotId {
        self.id
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn assign(&mut self, locator: &str) {
        self.source = Some(locator.to_string());
        self.send(SlotOp::Assign(locator.to_string()));
    }

    fn clear(&mut self) {
        self.source = None;
        self.send(SlotOp::Clear);
    }

    fn play(&mut self) {
        self.send(SlotOp::Play);
    }

    fn pause(&mut self) {
        self.send(SlotOp::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.send(SlotOp::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.volume
    }
}

struct SlotDriver {
    id: SlotId,
    source: Option<String>,
    duration: f64,
    position: f64,
    playing: bool,
    play_requested: bool,
    loaded: bool,
    load_deadline: Option<Instant>,
    /// Instant the position was last brought up to date
    clock: Instant,
    latency: Duration,
    tick: Duration,
    durations: DurationResolver,
    events: mpsc::UnboundedSender<MediaEvent>,
}

impl SlotDriver {
    async fn run(mut self, mut ops: mpsc::UnboundedReceiver<SlotOp>) {
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let load_deadline = self.load_deadline;
            tokio::select! {
                op = ops.recv() => match op {
                    Some(op) => self.apply(op),
                    None => break,
                },
                _ = sleep_until(load_deadline.unwrap_or_else(Instant::now)), if load_deadline.is_some() => {
                    self.finish_loading();
                }
                _ = ticker.tick(), if self.playing => {
                    self.advance_clock();
                }
            }
        }

        debug!(slot = %self.id, "Simulated slot driver exiting");
    }

    fn apply(&mut self, op: SlotOp) {
        match op {
            SlotOp::Assign(locator) => {
                self.playing = false;
                self.play_requested = false;
                self.loaded = false;
                self.position = 0.0;
                self.duration = 0.0;
                self.load_deadline = Some(Instant::now() + self.latency);
                self.source = Some(locator);
            }
            SlotOp::Clear => {
                self.playing = false;
                self.play_requested = false;
                self.loaded = false;
                self.load_deadline = None;
                self.source = None;
            }
            SlotOp::Play => {
                if self.source.is_none() {
                    debug!(slot = %self.id, "Play requested without a source");
                } else if self.loaded {
                    self.start();
                } else {
                    self.play_requested = true;
                }
            }
            SlotOp::Pause => {
                self.play_requested = false;
                if self.playing {
                    self.advance_clock();
                    if self.playing {
                        self.playing = false;
                        self.emit(MediaEventKind::Paused { ended: false });
                    }
                }
            }
            SlotOp::Seek(seconds) => {
                if self.loaded {
                    self.clock = Instant::now();
                    self.position = seconds.clamp(0.0, self.duration);
                    self.emit(MediaEventKind::TimeUpdate {
                        current_time: self.position,
                        duration: self.duration,
                    });
                }
            }
        }
    }

    fn finish_loading(&mut self) {
        self.load_deadline = None;
        let Some(source) = self.source.as_deref() else {
            return;
        };

        match (self.durations)(source) {
            Some(duration) if duration.is_finite() && duration > 0.0 => {
                self.duration = duration;
                self.loaded = true;
                self.emit(MediaEventKind::Ready { duration });
                if self.play_requested {
                    self.play_requested = false;
                    self.start();
                }
            }
            _ => {
                self.play_requested = false;
                self.emit(MediaEventKind::Failed {
                    reason: format!("unable to load {}", source),
                });
            }
        }
    }

    fn start(&mut self) {
        if self.playing {
            return;
        }
        if self.position >= self.duration {
            self.position = 0.0;
        }
        self.playing = true;
        self.clock = Instant::now();
        self.emit(MediaEventKind::Playing);
    }

    fn advance_clock(&mut self) {
        let now = Instant::now();
        self.position += now.duration_since(self.clock).as_secs_f64();
        self.clock = now;

        if self.position >= self.duration {
            self.position = self.duration;
            self.playing = false;
            self.emit(MediaEventKind::TimeUpdate {
                current_time: self.position,
                duration: self.duration,
            });
            self.emit(MediaEventKind::Paused { ended: true });
            self.emit(MediaEventKind::Ended);
        } else {
            self.emit(MediaEventKind::TimeUpdate {
                current_time: self.position,
                duration: self.duration,
            });
        }
    }

    fn emit(&self, kind: MediaEventKind) {
        if let Some(source) = &self.source {
            let _ = self.events.send(MediaEvent::new(self.id, source.clone(), kind));
        }
    }
}
