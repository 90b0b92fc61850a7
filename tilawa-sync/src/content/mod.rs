//! Content providers
//!
//! A provider supplies sections (ordered units with text) and, per section
//! and voice, the audio track set. The engine trusts the ordering it is
//! given; providers are only called from the API layer, never from the
//! engine task.

pub mod alquran;
pub mod memory;

use crate::Result;
use tilawa_common::model::{Section, SectionId, SectionSummary, TrackSet, Voice};

pub use alquran::AlQuranCloud;
pub use memory::InMemoryContent;

/// Source of sections, voices and audio tracks
#[async_trait::async_trait]
pub trait ContentProvider: Send + Sync {
    /// All sections, in display order
    async fn list_sections(&self) -> Result<Vec<SectionSummary>>;

    /// Voices offered to the user, in display order
    async fn list_voices(&self) -> Result<Vec<Voice>>;

    /// One section with its units
    async fn get_section(&self, id: SectionId) -> Result<Section>;

    /// Audio for a section in the given voice
    ///
    /// A single-track continuous set means the voice recorded the whole
    /// section in one file.
    async fn get_audio_tracks(&self, section: SectionId, voice_id: &str) -> Result<TrackSet>;

    /// Look up one voice by identifier
    async fn find_voice(&self, voice_id: &str) -> Result<Option<Voice>> {
        Ok(self
            .list_voices()
            .await?
            .into_iter()
            .find(|v| v.identifier == voice_id))
    }
}
