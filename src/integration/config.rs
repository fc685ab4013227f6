//! Application configuration
//!
//! Loaded once at start-up from a TOML file (every key optional), then
//! adjusted by `CALLBOT_*` environment variables.

use crate::dialogue::DialogueConfig;
use crate::speech::SpeechConfig;
use crate::{CallbotError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the complete application
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where exported transcripts are written
    pub export_dir: PathBuf,

    pub dialogue: DialogueConfig,
    pub speech: SpeechConfig,
    pub orchestrator: OrchestratorConfig,
    pub ui: UiConfig,
}

/// Window appearance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub dark_mode: bool,

    /// Extra font with CJK coverage, tried before egui's built-in fonts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            dark_mode: true,
            font_path: None,
        }
    }
}

/// Turn loop settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Pause between listen turns
    pub loop_interval_ms: u64,

    /// Longest accepted typed reply, in characters
    pub max_input_chars: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            loop_interval_ms: 500,
            max_input_chars: 500,
        }
    }
}

impl OrchestratorConfig {
    pub fn loop_interval(&self) -> Duration {
        Duration::from_millis(self.loop_interval_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            export_dir: default_export_dir(),
            dialogue: DialogueConfig::default(),
            speech: SpeechConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

fn default_export_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("callbot")
}

impl AppConfig {
    /// `<config dir>/callbot/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("callbot").join("config.toml"))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CallbotError::Config(format!("{}: {}", path.display(), e)))?;
        let config: AppConfig = toml::from_str(&contents)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Read `path` if it exists, otherwise use the built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::from_file(path),
            Some(path) => {
                info!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| CallbotError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `CALLBOT_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored
    /// with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
            let raw = raw?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid {}={}", key, raw);
                    None
                }
            }
        }

        if let Some(v) = parse("CALLBOT_VOLUME", lookup("CALLBOT_VOLUME")) {
            self.speech.volume = v;
        }
        if let Some(v) = parse("CALLBOT_VOICE_RATE", lookup("CALLBOT_VOICE_RATE")) {
            self.speech.rate = v;
        }
        if let Some(v) = parse("CALLBOT_LISTEN_TIMEOUT", lookup("CALLBOT_LISTEN_TIMEOUT")) {
            self.speech.listen_timeout_secs = v;
        }
        if let Some(v) = parse("CALLBOT_PHRASE_LIMIT", lookup("CALLBOT_PHRASE_LIMIT")) {
            self.speech.phrase_limit_secs = v;
        }
        if let Some(v) = parse("CALLBOT_MAX_INPUT", lookup("CALLBOT_MAX_INPUT")) {
            self.orchestrator.max_input_chars = v;
        }
        if let Some(lang) = lookup("CALLBOT_LANGUAGE").filter(|l| !l.trim().is_empty()) {
            self.speech.language = lang;
        }
    }

    /// Disable audio input (typed replies only)
    pub fn without_audio_input(mut self) -> Self {
        self.speech = self.speech.without_audio_input();
        self
    }

    /// Disable audio output (text-only bot lines)
    pub fn without_audio_output(mut self) -> Self {
        self.speech = self.speech.without_audio_output();
        self
    }

    pub fn with_script<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dialogue = self.dialogue.with_script(lines);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.dialogue.validate()?;
        self.speech.validate()?;
        if self.orchestrator.max_input_chars == 0 {
            return Err(CallbotError::Config(
                "max_input_chars must be positive".into(),
            ));
        }
        Ok(())
    }
}
