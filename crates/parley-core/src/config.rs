use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for Parley.
///
/// Loaded from `~/.parley/config.toml` by default. Every section falls back
/// to its defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Name shown in front of answers on the console.
    pub assistant_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            assistant_name: "Rashmika".to_string(),
        }
    }
}

/// Speech recognition and synthesis settings.
///
/// Recognizer settings (language, continuous mode, interim results) are
/// fixed, so unknown keys such as `language` are rejected at load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpeechConfig {
    /// Whether to use speech input at all. When false the input path is inert.
    pub input_enabled: bool,
    /// Whether answers are spoken aloud.
    pub output_enabled: bool,
    /// Speaking rate used to pace the console synthesizer.
    pub words_per_minute: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            input_enabled: true,
            output_enabled: true,
            words_per_minute: 180,
        }
    }
}

/// Extra question/answer pairs appended after the built-in phrase table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub entries: Vec<KnowledgeEntryConfig>,
}

/// A single configured phrase table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntryConfig {
    pub pattern: String,
    pub response: String,
}
