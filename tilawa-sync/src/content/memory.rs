//! In-memory content provider
//!
//! Serves a fixed library. Used for offline runs of the binary and by tests.

use super::alquran::continuous_locator;
use super::ContentProvider;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use tilawa_common::model::{
    AudioTrack, Section, SectionId, SectionSummary, TrackSet, Unit, Voice,
};

/// Locator prefix of the offline library's whole-section recordings
pub const DEMO_CONTINUOUS_PREFIX: &str = "demo://continuous/";

pub const DEMO_SEGMENTED_VOICE: &str = "demo.segmented";
pub const DEMO_CONTINUOUS_VOICE: &str = "demo.continuous";

#[derive(Default)]
pub struct InMemoryContent {
    sections: BTreeMap<SectionId, Section>,
    voices: Vec<Voice>,
    tracks: HashMap<(SectionId, String), TrackSet>,
}

impl InMemoryContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.insert(section.id, section);
        self
    }

    pub fn with_voice(mut self, voice: Voice) -> Self {
        self.voices.push(voice);
        self
    }

    pub fn with_tracks(mut self, section: SectionId, voice_id: &str, tracks: TrackSet) -> Self {
        self.tracks.insert((section, voice_id.to_string()), tracks);
        self
    }

    /// Small offline library: three short sections, one voice per mode
    pub fn demo() -> Result<Self> {
        let mut library = Self::new()
            .with_voice(Voice {
                identifier: DEMO_SEGMENTED_VOICE.to_string(),
                name: "Demo (per verse)".to_string(),
                english_name: "Demo (per verse)".to_string(),
                language: "ar".to_string(),
                segmented: true,
                url_prefix: None,
            })
            .with_voice(Voice {
                identifier: DEMO_CONTINUOUS_VOICE.to_string(),
                name: "Demo (whole section)".to_string(),
                english_name: "Demo (whole section)".to_string(),
                language: "ar".to_string(),
                segmented: false,
                url_prefix: Some(DEMO_CONTINUOUS_PREFIX.to_string()),
            });

        for (id, name, english_name, count, first_global) in [
            (1, "الفاتحة", "Al-Faatiha", 7, 1),
            (108, "الكوثر", "Al-Kawthar", 3, 6205),
            (112, "الإخلاص", "Al-Ikhlaas", 4, 6222),
        ] {
            let units = (1..=count)
                .map(|ordinal| Unit {
                    id: first_global + ordinal as u64 - 1,
                    ordinal,
                    text: Some(format!("{} {}", name, ordinal)),
                    translation: Some(format!("{}, verse {}", english_name, ordinal)),
                })
                .collect();
            let tracks = (1..=count)
                .map(|ordinal| AudioTrack {
                    unit_ordinal: ordinal,
                    locator: format!("demo://segmented/{:03}/{:03}.mp3", id, ordinal),
                })
                .collect();

            library = library
                .with_section(Section::new(id, name, english_name, units)?)
                .with_tracks(id, DEMO_SEGMENTED_VOICE, TrackSet::segmented(tracks))
                .with_tracks(
                    id,
                    DEMO_CONTINUOUS_VOICE,
                    TrackSet::continuous(continuous_locator(DEMO_CONTINUOUS_PREFIX, id)),
                );
        }

        Ok(library)
    }
}

#[async_trait::async_trait]
impl ContentProvider for InMemoryContent {
    async fn list_sections(&self) -> Result<Vec<SectionSummary>> {
        Ok(self
            .sections
            .values()
            .map(|s| SectionSummary {
                number: s.id,
                name: s.name.clone(),
                english_name: s.english_name.clone(),
                english_name_translation: String::new(),
                unit_count: s.len() as u32,
                revelation_type: String::new(),
            })
            .collect())
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(self.voices.clone())
    }

    async fn get_section(&self, id: SectionId) -> Result<Section> {
        self.sections
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("section {}", id)))
    }

    async fn get_audio_tracks(&self, section: SectionId, voice_id: &str) -> Result<TrackSet> {
        self.tracks
            .get(&(section, voice_id.to_string()))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("audio for section {} in voice {}", section, voice_id)))
    }
}
