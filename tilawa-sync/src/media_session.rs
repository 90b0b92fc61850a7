//! Platform media-control adapter
//!
//! Publishes now-playing metadata and maps media-control actions (hardware
//! keys, lock screen, headset buttons) onto the transport's own commands.
//! It keeps no state of its own.

use crate::media::AudioSlot;
use crate::transport::TransportController;
use serde::{Deserialize, Serialize};
use tilawa_common::config::ContentConfig;
use tilawa_common::events::{Artwork, NowPlayingMetadata};
use tilawa_common::model::{Section, Voice};
use tracing::debug;

const ARTWORK_SIZE: &str = "512x512";
const ARTWORK_MIME: &str = "image/png";

/// Action requested by a platform media-control surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MediaControlAction {
    Play,
    Pause,
    NextTrack,
    PreviousTrack,
    SeekTo { fraction: f64 },
}

impl MediaControlAction {
    pub fn apply<S: AudioSlot>(self, transport: &mut TransportController<S>) {
        debug!(action = ?self, "Media control action");
        match self {
            MediaControlAction::Play => {
                if !transport.is_playing() {
                    transport.toggle_play_pause();
                }
            }
            MediaControlAction::Pause => {
                if transport.is_playing() {
                    transport.toggle_play_pause();
                }
            }
            MediaControlAction::NextTrack => transport.advance(),
            MediaControlAction::PreviousTrack => transport.retreat(),
            MediaControlAction::SeekTo { fraction } => transport.seek(fraction),
        }
    }
}

/// Metadata shown by platform media controls
///
/// Artwork lists the voice's picture first and the default picture as the
/// fallback.
pub fn now_playing(
    section: &Section,
    voice: Option<&Voice>,
    config: &ContentConfig,
) -> NowPlayingMetadata {
    let base = config.artwork_base.trim_end_matches('/');
    let mut artwork = Vec::with_capacity(2);
    if let Some(voice) = voice {
        artwork.push(artwork_entry(format!("{}/{}.png", base, voice.identifier)));
    }
    artwork.push(artwork_entry(format!("{}/default.png", base)));

    NowPlayingMetadata {
        title: section.english_name.clone(),
        artist: voice.map(|v| v.name.clone()).unwrap_or_default(),
        album: config.album.clone(),
        artwork,
    }
}

fn artwork_entry(src: String) -> Artwork {
    Artwork {
        src,
        sizes: ARTWORK_SIZE.to_string(),
        mime_type: ARTWORK_MIME.to_string(),
    }
}
