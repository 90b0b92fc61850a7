//! Content data model
//!
//! Sections, units and audio track sets as handed to the engine by the
//! content provider. All values are immutable once built; a section change
//! replaces them wholesale.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Section identifier (chapter number, 1-based)
pub type SectionId = u32;

/// One addressable piece of text (a verse)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Stable identifier (global verse number)
    pub id: u64,
    /// 1-based position within the section
    pub ordinal: u32,
    /// Source-language text
    pub text: Option<String>,
    /// Translation text
    pub translation: Option<String>,
}

/// Ordered collection of units played as one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub english_name: String,
    units: Vec<Unit>,
}

impl Section {
    /// Build a section, checking that ordinals run 1, 2, 3, ... in order
    pub fn new(
        id: SectionId,
        name: impl Into<String>,
        english_name: impl Into<String>,
        units: Vec<Unit>,
    ) -> Result<Self> {
        for (index, unit) in units.iter().enumerate() {
            let expected = index as u32 + 1;
            if unit.ordinal != expected {
                return Err(Error::InvalidInput(format!(
                    "section {}: unit at position {} has ordinal {} (expected {})",
                    id, index, unit.ordinal, expected
                )));
            }
        }

        Ok(Self {
            id,
            name: name.into(),
            english_name: english_name.into(),
            units,
        })
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, index: usize) -> Option<&Unit> {
        self.units.get(index)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Index of the final unit, `None` for an empty section
    pub fn last_index(&self) -> Option<usize> {
        self.units.len().checked_sub(1)
    }
}

/// Locator for one unit's audio (segmented) or the whole section (continuous)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub unit_ordinal: u32,
    pub locator: String,
}

/// How a track set maps onto the units of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// One track per unit
    Segmented,
    /// One track for the whole section
    Continuous,
}

impl std::fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackMode::Segmented => write!(f, "segmented"),
            PlaybackMode::Continuous => write!(f, "continuous"),
        }
    }
}

/// Ordered audio tracks for one section and voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSet {
    is_segmented: bool,
    tracks: Vec<AudioTrack>,
}

impl TrackSet {
    /// One track per unit, in unit order
    pub fn segmented(tracks: Vec<AudioTrack>) -> Self {
        Self {
            is_segmented: true,
            tracks,
        }
    }

    /// A single track spanning the whole section
    pub fn continuous(locator: impl Into<String>) -> Self {
        Self {
            is_segmented: false,
            tracks: vec![AudioTrack {
                unit_ordinal: 1,
                locator: locator.into(),
            }],
        }
    }

    /// Build from provider output; continuous sets must hold exactly one track
    pub fn from_parts(is_segmented: bool, tracks: Vec<AudioTrack>) -> Result<Self> {
        if !is_segmented && tracks.len() != 1 {
            return Err(Error::InvalidInput(format!(
                "continuous track set must contain exactly one track, got {}",
                tracks.len()
            )));
        }
        Ok(Self {
            is_segmented,
            tracks,
        })
    }

    pub fn is_segmented(&self) -> bool {
        self.is_segmented
    }

    pub fn mode(&self) -> PlaybackMode {
        if self.is_segmented {
            PlaybackMode::Segmented
        } else {
            PlaybackMode::Continuous
        }
    }

    pub fn tracks(&self) -> &[AudioTrack] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Locator for the track at `index`
    ///
    /// Blank locators count as missing so callers skip them the same way.
    pub fn locator_for(&self, index: usize) -> Option<&str> {
        self.tracks
            .get(index)
            .map(|t| t.locator.as_str())
            .filter(|l| !l.trim().is_empty())
    }
}

/// A reciter voice offered by the content provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub identifier: String,
    pub name: String,
    pub english_name: String,
    pub language: String,
    /// True when the voice has one recording per unit
    pub segmented: bool,
    /// Base URL for continuous recordings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_prefix: Option<String>,
}

/// Section listing entry (no unit text)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub number: SectionId,
    pub name: String,
    pub english_name: String,
    pub english_name_translation: String,
    pub unit_count: u32,
    pub revelation_type: String,
}
