//! alquran.cloud content provider
//!
//! Endpoints used (relative to `content.base_url`):
//! - `GET /surah` - section list
//! - `GET /edition?format=audio&type=versebyverse` - per-unit voices
//! - `GET /surah/{n}/editions/{primary},{translation}` - unit text
//! - `GET /surah/{n}/{voice}` - per-unit audio locators
//!
//! Voices with whole-section recordings are not served by the API; they come
//! from `content.continuous_voices` and resolve to
//! `{url_prefix}{zero-padded section number}.mp3`.

use super::ContentProvider;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tilawa_common::config::{ContentConfig, ContinuousVoiceConfig};
use tilawa_common::model::{
    AudioTrack, Section, SectionId, SectionSummary, TrackSet, Unit, Voice,
};
use tracing::{debug, info};

const USER_AGENT: &str = concat!("tilawa-sync/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: u16,
    #[serde(default)]
    status: String,
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSurah {
    number: u32,
    name: String,
    english_name: String,
    english_name_translation: String,
    number_of_ayahs: u32,
    revelation_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEdition {
    identifier: String,
    language: String,
    name: String,
    english_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAyah {
    number: u64,
    number_in_surah: u32,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSurahContent {
    number: u32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    english_name: String,
    ayahs: Vec<ApiAyah>,
    edition: Option<ApiEditionRef>,
}

#[derive(Debug, Deserialize)]
struct ApiEditionRef {
    identifier: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAudioAyah {
    number_in_surah: u32,
    #[serde(default)]
    audio: String,
}

#[derive(Debug, Deserialize)]
struct ApiAudioSurah {
    ayahs: Vec<ApiAudioAyah>,
}

/// HTTP client for api.alquran.cloud
pub struct AlQuranCloud {
    http_client: reqwest::Client,
    config: ContentConfig,
}

impl AlQuranCloud {
    pub fn new(config: &ContentConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        debug!(url = %url, "Querying content API");

        let response = self.http_client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(path.to_string()));
        }
        let envelope: Envelope<T> = response.error_for_status()?.json().await?;
        if envelope.code != 200 {
            return Err(Error::Content(format!(
                "{} returned code {} ({})",
                path, envelope.code, envelope.status
            )));
        }
        Ok(envelope.data)
    }

    fn continuous_voice(&self, voice_id: &str) -> Option<&ContinuousVoiceConfig> {
        self.config
            .continuous_voices
            .iter()
            .find(|v| v.identifier == voice_id)
    }
}

#[async_trait::async_trait]
impl ContentProvider for AlQuranCloud {
    async fn list_sections(&self) -> Result<Vec<SectionSummary>> {
        let surahs: Vec<ApiSurah> = self.get("surah").await?;
        Ok(surahs.into_iter().map(section_summary).collect())
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        let editions: Vec<ApiEdition> = self.get("edition?format=audio&type=versebyverse").await?;
        let voices = merge_voices(editions, &self.config);
        info!(count = voices.len(), "Loaded voice list");
        Ok(voices)
    }

    async fn get_section(&self, id: SectionId) -> Result<Section> {
        let path = format!(
            "surah/{}/editions/{},{}",
            id, self.config.primary_edition, self.config.translation_edition
        );
        let editions: Vec<ApiSurahContent> = self.get(&path).await?;
        let section = build_section(
            id,
            editions,
            &self.config.primary_edition,
            &self.config.translation_edition,
        )?;
        info!(section_id = id, units = section.len(), "Loaded section text");
        Ok(section)
    }

    async fn get_audio_tracks(&self, section: SectionId, voice_id: &str) -> Result<TrackSet> {
        if let Some(voice) = self.continuous_voice(voice_id) {
            let locator = continuous_locator(&voice.url_prefix, section);
            debug!(section_id = section, voice = voice_id, locator = %locator, "Continuous recording");
            return Ok(TrackSet::continuous(locator));
        }

        let audio: ApiAudioSurah = self.get(&format!("surah/{}/{}", section, voice_id)).await?;
        let tracks = segmented_tracks(audio.ayahs);
        info!(section_id = section, voice = voice_id, tracks = tracks.len(), "Loaded audio tracks");
        Ok(tracks)
    }
}

fn section_summary(surah: ApiSurah) -> SectionSummary {
    SectionSummary {
        number: surah.number,
        name: surah.name,
        english_name: surah.english_name,
        english_name_translation: surah.english_name_translation,
        unit_count: surah.number_of_ayahs,
        revelation_type: surah.revelation_type,
    }
}

/// API voices filtered to the configured language, plus continuous voices,
/// restricted to the allow-list and sorted in allow-list order
fn merge_voices(editions: Vec<ApiEdition>, config: &ContentConfig) -> Vec<Voice> {
    let api_voices = editions
        .into_iter()
        .filter(|e| e.language == config.voice_language)
        .map(|e| Voice {
            identifier: e.identifier,
            name: e.name,
            english_name: e.english_name,
            language: e.language,
            segmented: true,
            url_prefix: None,
        });

    let continuous = config.continuous_voices.iter().map(|v| Voice {
        identifier: v.identifier.clone(),
        name: v.name.clone(),
        english_name: v.english_name.clone(),
        language: config.voice_language.clone(),
        segmented: false,
        url_prefix: Some(v.url_prefix.clone()),
    });

    let rank = |voice: &Voice| {
        config
            .allowed_voices
            .iter()
            .position(|id| *id == voice.identifier)
    };

    let mut voices: Vec<(usize, Voice)> = api_voices
        .chain(continuous)
        .filter_map(|v| rank(&v).map(|r| (r, v)))
        .collect();
    // Stable sort keeps the API entry ahead of a configured duplicate
    voices.sort_by_key(|(r, _)| *r);
    voices.dedup_by_key(|(r, _)| *r);
    voices.into_iter().map(|(_, v)| v).collect()
}

/// Merge the primary and translation editions into units by position
fn build_section(
    id: SectionId,
    editions: Vec<ApiSurahContent>,
    primary: &str,
    translation: &str,
) -> Result<Section> {
    let mut editions = editions;
    let take = |editions: &mut Vec<ApiSurahContent>, identifier: &str| {
        let pos = editions.iter().position(|e| {
            e.edition
                .as_ref()
                .is_some_and(|ed| ed.identifier == identifier)
        });
        pos.map(|p| editions.remove(p))
    };

    let primary_content = take(&mut editions, primary);
    let translation_content = take(&mut editions, translation);
    // Fall back to response order when editions carry no identifier
    let mut rest = editions.into_iter();
    let primary_content = primary_content
        .or_else(|| rest.next())
        .ok_or_else(|| Error::Content(format!("section {}: no text edition returned", id)))?;
    let translation_content = translation_content.or_else(|| rest.next());

    if primary_content.number != id {
        return Err(Error::Content(format!(
            "requested section {} but received {}",
            id, primary_content.number
        )));
    }

    let translations = translation_content
        .map(|c| c.ayahs)
        .unwrap_or_default();

    let units = primary_content
        .ayahs
        .into_iter()
        .enumerate()
        .map(|(index, ayah)| Unit {
            id: ayah.number,
            ordinal: ayah.number_in_surah,
            text: non_blank(ayah.text),
            translation: translations
                .get(index)
                .and_then(|t| non_blank(t.text.clone())),
        })
        .collect();

    Ok(Section::new(
        id,
        primary_content.name,
        primary_content.english_name,
        units,
    )?)
}

fn segmented_tracks(ayahs: Vec<ApiAudioAyah>) -> TrackSet {
    TrackSet::segmented(
        ayahs
            .into_iter()
            .map(|a| AudioTrack {
                unit_ordinal: a.number_in_surah,
                locator: a.audio,
            })
            .collect(),
    )
}

/// Whole-section recording locator: prefix + 3-digit section number + `.mp3`
pub fn continuous_locator(url_prefix: &str, section: SectionId) -> String {
    format!("{}{:03}.mp3", url_prefix, section)
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
