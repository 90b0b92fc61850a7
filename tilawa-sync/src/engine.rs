//! Engine task
//!
//! Owns the transport controller and the scroll synchronizer and runs them
//! on a single task. Commands, media events, ramp ticks and the quiet-period
//! deadline are selected in one loop, which makes the arrival order the
//! serialization point: no locks around playback or scroll state.
//!
//! Everything observable leaves through the [`EventBus`]; [`EngineHandle`]
//! is the only way in.

use crate::content::ContentProvider;
use crate::media::{AudioSlot, MediaEvent, SlotPair};
use crate::media_session::{self, MediaControlAction};
use crate::scroll::{ScrollEvent, ScrollState, ScrollSynchronizer};
use crate::transport::TransportController;
use crate::{Error, Result};
use chrono::Utc;
use serde::Serialize;
use tilawa_common::config::{ContentConfig, SyncConfig};
use tilawa_common::events::{EventBus, NowPlayingMetadata, PlaybackSnapshot, SyncEvent};
use tilawa_common::model::{Section, SectionId, TrackSet, Voice};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Input accepted by the engine task
#[derive(Debug)]
pub enum EngineCommand {
    /// Replace the section and its track set atomically
    LoadSection {
        section: Section,
        tracks: TrackSet,
        voice: Option<Voice>,
    },
    /// New track set for the current section (voice change)
    ///
    /// Ignored unless `section_id` is still the loaded section.
    ReplaceTracks {
        section_id: SectionId,
        tracks: TrackSet,
        voice: Option<Voice>,
    },
    TogglePlayPause,
    SelectUnit(usize),
    Advance,
    Retreat,
    /// Fraction of the active track, 0.0..=1.0
    Seek(f64),
    Scroll(ScrollEvent),
    MediaAction(MediaControlAction),
    Teardown,
    Status(oneshot::Sender<EngineStatus>),
}

/// Combined engine state for queries
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub playback: PlaybackSnapshot,
    pub scroll: ScrollState,
    pub voice: Option<String>,
    pub now_playing: Option<NowPlayingMetadata>,
}

/// Cloneable handle to a running engine
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    events: EventBus,
}

impl EngineHandle {
    pub async fn send(&self, command: EngineCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::EngineStopped)
    }

    pub async fn status(&self) -> Result<EngineStatus> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineCommand::Status(tx)).await?;
        rx.await.map_err(|_| Error::EngineStopped)
    }

    pub async fn load_section(
        &self,
        section: Section,
        tracks: TrackSet,
        voice: Option<Voice>,
    ) -> Result<()> {
        self.send(EngineCommand::LoadSection {
            section,
            tracks,
            voice,
        })
        .await
    }

    pub async fn replace_tracks(
        &self,
        section_id: SectionId,
        tracks: TrackSet,
        voice: Option<Voice>,
    ) -> Result<()> {
        self.send(EngineCommand::ReplaceTracks {
            section_id,
            tracks,
            voice,
        })
        .await
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.send(EngineCommand::TogglePlayPause).await
    }

    pub async fn select_unit(&self, index: usize) -> Result<()> {
        self.send(EngineCommand::SelectUnit(index)).await
    }

    pub async fn advance(&self) -> Result<()> {
        self.send(EngineCommand::Advance).await
    }

    pub async fn retreat(&self) -> Result<()> {
        self.send(EngineCommand::Retreat).await
    }

    pub async fn seek(&self, fraction: f64) -> Result<()> {
        self.send(EngineCommand::Seek(fraction)).await
    }

    pub async fn scroll(&self, event: ScrollEvent) -> Result<()> {
        self.send(EngineCommand::Scroll(event)).await
    }

    pub async fn media_action(&self, action: MediaControlAction) -> Result<()> {
        self.send(EngineCommand::MediaAction(action)).await
    }

    pub async fn teardown(&self) -> Result<()> {
        self.send(EngineCommand::Teardown).await
    }

    /// Fetch a section in a voice and hand it to the engine
    ///
    /// Everything is fetched before the engine sees anything, so a provider
    /// failure leaves playback untouched. Staying on the same section with a
    /// new voice swaps the track set instead of reloading; the swap names the
    /// section, so a load that lands in between wins.
    pub async fn open_section(
        &self,
        content: &dyn ContentProvider,
        section_id: SectionId,
        voice_id: &str,
    ) -> Result<()> {
        let voice = content
            .find_voice(voice_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("voice {}", voice_id)))?;
        let tracks = content.get_audio_tracks(section_id, voice_id).await?;

        let current = self.status().await?;
        if current.playback.section_id == Some(section_id) {
            if current.voice.as_deref() == Some(voice_id) {
                debug!(section_id, voice_id, "Section already open");
                return Ok(());
            }
            info!(section_id, voice_id, "Switching voice");
            return self.replace_tracks(section_id, tracks, Some(voice)).await;
        }

        let section = content.get_section(section_id).await?;
        info!(section_id, voice_id, units = section.len(), "Opening section");
        self.load_section(section, tracks, Some(voice)).await
    }

    /// Subscribe to all future engine events
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}

/// Single-task owner of all synchronization state
pub struct SyncEngine<S: AudioSlot> {
    transport: TransportController<S>,
    scroll: ScrollSynchronizer,
    content: ContentConfig,
    voice: Option<Voice>,
    now_playing: Option<NowPlayingMetadata>,
    events: EventBus,
}

impl<S: AudioSlot> SyncEngine<S> {
    pub fn new(config: &SyncConfig, slots: SlotPair<S>, events: EventBus) -> Self {
        Self {
            transport: TransportController::new(slots, &config.transport, events.clone()),
            scroll: ScrollSynchronizer::new(&config.scroll, events.clone()),
            content: config.content.clone(),
            voice: None,
            now_playing: None,
            events,
        }
    }

    /// Start the engine task
    ///
    /// `media` must be the receiving end of the channel the slots report on.
    /// The task ends when every [`EngineHandle`] is dropped.
    pub fn spawn(self, media: mpsc::UnboundedReceiver<MediaEvent>) -> (EngineHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let handle = EngineHandle {
            commands: tx,
            events: self.events.clone(),
        };
        let task = tokio::spawn(self.run(rx, media));
        (handle, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<EngineCommand>,
        mut media: mpsc::UnboundedReceiver<MediaEvent>,
    ) {
        info!("Sync engine started");

        let mut ramp_ticker = interval(self.transport.ramp_interval());
        ramp_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ramp_generation = self.transport.ramp_generation();

        loop {
            // A restarted ramp gets a full interval before its first step
            if self.transport.ramp_generation() != ramp_generation {
                ramp_generation = self.transport.ramp_generation();
                ramp_ticker.reset();
            }
            let quiet_deadline = self.scroll.quiet_deadline();

            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command, Instant::now()),
                    None => {
                        info!("All engine handles dropped");
                        break;
                    }
                },
                event = media.recv() => match event {
                    Some(event) => self.handle_media_event(event),
                    None => {
                        warn!("Media event channel closed");
                        break;
                    }
                },
                _ = ramp_ticker.tick(), if self.transport.ramp_active() => {
                    self.transport.on_ramp_tick();
                }
                _ = sleep_until(quiet_deadline.unwrap_or_else(Instant::now)), if quiet_deadline.is_some() => {
                    self.scroll.poll_quiet(Instant::now());
                }
            }
        }

        self.transport.teardown();
        self.scroll.detach();
        info!("Sync engine stopped");
    }

    /// Apply one command at `now`
    pub fn handle_command(&mut self, command: EngineCommand, now: Instant) {
        match command {
            EngineCommand::LoadSection {
                section,
                tracks,
                voice,
            } => {
                self.voice = voice;
                self.scroll.release_section();
                self.transport.load_section(section, tracks);
                self.publish_now_playing();
            }
            EngineCommand::ReplaceTracks {
                section_id,
                tracks,
                voice,
            } => {
                let loaded = self.transport.section().map(|s| s.id);
                if loaded != Some(section_id) {
                    warn!(section_id, ?loaded, "Voice change ignored: section no longer loaded");
                    return;
                }
                self.voice = voice;
                self.transport.replace_tracks(tracks);
                self.publish_now_playing();
            }
            EngineCommand::TogglePlayPause => self.transport.toggle_play_pause(),
            EngineCommand::SelectUnit(index) => self.transport.select_unit(index),
            EngineCommand::Advance => self.transport.advance(),
            EngineCommand::Retreat => self.transport.retreat(),
            EngineCommand::Seek(fraction) => self.transport.seek(fraction),
            EngineCommand::Scroll(event) => {
                self.scroll.on_scroll(event, now);
                return;
            }
            EngineCommand::MediaAction(action) => action.apply(&mut self.transport),
            EngineCommand::Teardown => {
                self.transport.teardown();
                self.voice = None;
                self.now_playing = None;
            }
            EngineCommand::Status(reply) => {
                if reply.send(self.status()).is_err() {
                    debug!("Status requester went away");
                }
                return;
            }
        }
        self.sync_scroll();
    }

    pub fn handle_media_event(&mut self, event: MediaEvent) {
        self.transport.on_media_event(event);
        self.sync_scroll();
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            playback: self.transport.snapshot(),
            scroll: self.scroll.state().clone(),
            voice: self.voice.as_ref().map(|v| v.identifier.clone()),
            now_playing: self.now_playing.clone(),
        }
    }

    pub fn transport(&self) -> &TransportController<S> {
        &self.transport
    }

    pub fn scroll(&self) -> &ScrollSynchronizer {
        &self.scroll
    }

    fn sync_scroll(&mut self) {
        let snapshot = self.transport.snapshot();
        self.scroll.on_playback(&snapshot);
    }

    fn publish_now_playing(&mut self) {
        let Some(section) = self.transport.section() else {
            return;
        };
        let metadata = media_session::now_playing(section, self.voice.as_ref(), &self.content);
        self.now_playing = Some(metadata.clone());
        self.events.emit_lossy(SyncEvent::NowPlaying {
            metadata,
            timestamp: Utc::now(),
        });
    }
}
