//! Configuration loading and config file resolution
//!
//! All settings live in one TOML file; every field has a built-in default so
//! an empty (or absent) file yields a working configuration.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`TILAWA_CONFIG`)
//! 3. User config directory (`<config_dir>/tilawa/config.toml`, if present)
//! 4. Built-in defaults (no file)

use crate::gain_curve::GainCurve;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "TILAWA_CONFIG";

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub content: ContentConfig,
    pub transport: TransportConfig,
    pub scroll: ScrollConfig,
    pub events: EventsConfig,
    pub simulation: SimulationConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5741,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// A voice whose recordings cover a whole section in one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousVoiceConfig {
    pub identifier: String,
    pub name: String,
    pub english_name: String,
    /// Locator prefix; the file name is the zero-padded section number + `.mp3`
    pub url_prefix: String,
}

/// Content provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub base_url: String,
    /// Edition holding the source-language text
    pub primary_edition: String,
    /// Edition holding the translation
    pub translation_edition: String,
    /// Language filter applied to provider voices
    pub voice_language: String,
    pub default_section: u32,
    pub default_voice: String,
    /// Voices offered to the user, in display order
    pub allowed_voices: Vec<String>,
    pub continuous_voices: Vec<ContinuousVoiceConfig>,
    /// Artwork directory for now-playing metadata
    pub artwork_base: String,
    /// Album name shown by platform media controls
    pub album: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.alquran.cloud/v1".to_string(),
            primary_edition: "quran-uthmani".to_string(),
            translation_edition: "en.hilali".to_string(),
            voice_language: "ar".to_string(),
            default_section: 1,
            default_voice: "ar.abdurrahmaansudais".to_string(),
            allowed_voices: [
                "ar.abdurrahmaansudais",
                "ar.saoodshuraym",
                "ar.mahermuaiqly",
                "ar.muhammadayyoub",
                "ar.hudhaify",
                "ar.yasseraldosari",
                "ar.muhammadalluhaidan",
                "ar.ahmedtalib",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            continuous_voices: vec![
                ContinuousVoiceConfig {
                    identifier: "ar.yasseraldosari".to_string(),
                    name: "ياسر الدوسري".to_string(),
                    english_name: "Yasser Al-Dosari".to_string(),
                    url_prefix: "https://server11.mp3quran.net/yasser/".to_string(),
                },
                ContinuousVoiceConfig {
                    identifier: "ar.muhammadalluhaidan".to_string(),
                    name: "محمد اللحيدان".to_string(),
                    english_name: "Muhammad Al-Luhaidan".to_string(),
                    url_prefix: "https://server8.mp3quran.net/lhdan/".to_string(),
                },
                ContinuousVoiceConfig {
                    identifier: "ar.ahmedtalib".to_string(),
                    name: "أحمد طالب بن حميد".to_string(),
                    english_name: "Ahmed bin Talib".to_string(),
                    url_prefix: "https://server16.mp3quran.net/a_binhameed/Rewayat-Hafs-A-n-Assem/"
                        .to_string(),
                },
            ],
            artwork_base: "/assets/reciters".to_string(),
            album: "Tarteela".to_string(),
        }
    }
}

/// Transport tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Length of the start-of-playback volume ramp
    pub ramp_duration_ms: u64,
    /// Normalized position increment per ramp tick
    pub ramp_step: f32,
    pub ramp_curve: GainCurve,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ramp_duration_ms: 400,
            ramp_step: 0.05,
            ramp_curve: GainCurve::Linear,
        }
    }
}

impl TransportConfig {
    /// Delay between ramp ticks: `duration × step` (20ms with defaults)
    pub fn ramp_interval(&self) -> Duration {
        let ms = (self.ramp_duration_ms as f64 * self.ramp_step as f64).round() as u64;
        Duration::from_millis(ms.max(1))
    }
}

/// Scroll synchronizer tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Minimum distance before a follow command is issued
    pub threshold_px: f64,
    /// Quiet period after the last manual scroll before following resumes
    pub quiet_period_ms: u64,
    /// Playback positions below this reset the manual offset
    pub offset_reset_secs: f64,
    /// Whether unit centering is requested with smooth scrolling
    pub smooth_centering: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            threshold_px: 10.0,
            quiet_period_ms: 4000,
            offset_reset_secs: 1.0,
            smooth_centering: true,
        }
    }
}

impl ScrollConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

/// Event bus settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}

/// Simulated output device settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Time from source assignment to readiness
    pub load_latency_ms: u64,
    /// Interval between progress updates while playing
    pub tick_interval_ms: u64,
    /// Reported length of a per-unit recording
    pub unit_duration_secs: f64,
    /// Reported length of a whole-section recording
    pub section_duration_secs: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            load_latency_ms: 150,
            tick_interval_ms: 250,
            unit_duration_secs: 8.0,
            section_duration_secs: 600.0,
        }
    }
}

impl SyncConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SyncConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve the config file (see module docs) and load it
    ///
    /// Returns the configuration and the file it came from, if any.
    pub fn load_resolved(cli_arg: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        match resolve_config_path(cli_arg, CONFIG_ENV_VAR) {
            Some(path) => {
                let config = Self::load(&path)?;
                Ok((config, Some(path)))
            }
            None => {
                debug!("No config file found, using built-in defaults");
                Ok((Self::default(), None))
            }
        }
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let t = &self.transport;
        if !(t.ramp_step > 0.0 && t.ramp_step <= 1.0) {
            return Err(Error::Config(format!(
                "transport.ramp_step must be in (0, 1], got {}",
                t.ramp_step
            )));
        }
        if t.ramp_duration_ms == 0 {
            return Err(Error::Config("transport.ramp_duration_ms must be > 0".to_string()));
        }
        if self.scroll.quiet_period_ms == 0 {
            return Err(Error::Config("scroll.quiet_period_ms must be > 0".to_string()));
        }
        if !(self.scroll.threshold_px >= 0.0) {
            return Err(Error::Config("scroll.threshold_px must be >= 0".to_string()));
        }
        if self.events.capacity == 0 {
            return Err(Error::Config("events.capacity must be > 0".to_string()));
        }
        if self.simulation.tick_interval_ms == 0 {
            return Err(Error::Config("simulation.tick_interval_ms must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Config file resolution following the priority order in the module docs
///
/// An explicit path (argument or environment) is returned even if it does
/// not exist, so the caller reports it instead of silently falling back.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config directory
    default_config_file().filter(|p| p.exists())
}

/// Platform config file location (`~/.config/tilawa/config.toml` on Linux)
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tilawa").join("config.toml"))
}
