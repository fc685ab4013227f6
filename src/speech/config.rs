use crate::{CallbotError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Speech rate at which the voice model runs unscaled
const NOMINAL_RATE_WPM: f32 = 150.0;

/// Upper bound for every configured listen duration
const MAX_DURATION_SECS: f32 = 600.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Output volume (0.0 to 1.0)
    pub volume: f32,

    /// Speech rate in words per minute
    pub rate: u32,

    /// Recognition language code, e.g. `ja-JP`
    pub language: String,

    /// Longest wait for speech to begin
    pub listen_timeout_secs: f32,

    /// Longest single phrase once speech has begun
    pub phrase_limit_secs: f32,

    /// Ambient-noise sampling before the first listen
    pub ambient_calibration_secs: f32,

    pub enable_audio_input: bool,
    pub enable_audio_output: bool,

    pub tts: VoiceModelConfig,
    pub stt: RecognizerConfig,
}

/// VITS voice model files
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceModelConfig {
    pub model_path: String,
    pub tokens_path: String,
    pub lexicon_path: Option<String>,
    pub data_dir: Option<String>,
    pub dict_dir: Option<String>,
    pub speaker_id: i32,
}

/// Whisper model and speech-onset detection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub model_path: PathBuf,

    pub n_threads: i32,

    /// Lowest RMS level treated as speech
    pub min_energy: f32,

    /// Speech threshold as a multiple of the calibrated ambient level
    pub energy_ratio: f32,

    /// Trailing silence that ends a phrase
    pub pause_secs: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            volume: 0.8,
            rate: 150,
            language: "ja-JP".to_string(),
            listen_timeout_secs: 5.0,
            phrase_limit_secs: 10.0,
            ambient_calibration_secs: 0.5,
            enable_audio_input: true,
            enable_audio_output: true,
            tts: VoiceModelConfig::default(),
            stt: RecognizerConfig::default(),
        }
    }
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.bin"),
            n_threads: 4,
            min_energy: 0.01,
            energy_ratio: 1.5,
            pause_secs: 0.8,
        }
    }
}

impl SpeechConfig {
    /// Disable audio input (typed replies only)
    pub fn without_audio_input(mut self) -> Self {
        self.enable_audio_input = false;
        self
    }

    /// Disable audio output (text-only bot lines)
    pub fn without_audio_output(mut self) -> Self {
        self.enable_audio_output = false;
        self
    }

    pub fn listen_timeout(&self) -> Duration {
        Duration::from_secs_f32(self.listen_timeout_secs)
    }

    pub fn phrase_limit(&self) -> Duration {
        Duration::from_secs_f32(self.phrase_limit_secs)
    }

    pub fn calibration_duration(&self) -> Duration {
        Duration::from_secs_f32(self.ambient_calibration_secs)
    }

    /// VITS length scale for the configured rate; slower speech is longer
    pub fn length_scale(&self) -> f32 {
        NOMINAL_RATE_WPM / self.rate.max(1) as f32
    }

    /// Whisper language code: the part before the region, e.g. `ja`
    pub fn recognition_language(&self) -> &str {
        self.language.split(['-', '_']).next().unwrap_or("")
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(CallbotError::Config(format!(
                "volume must be between 0 and 1, got {}",
                self.volume
            )));
        }
        if self.rate == 0 {
            return Err(CallbotError::Config("speech rate must be positive".into()));
        }
        for (name, secs) in [
            ("listen timeout", self.listen_timeout_secs),
            ("phrase limit", self.phrase_limit_secs),
        ] {
            if !(secs > 0.0 && secs <= MAX_DURATION_SECS) {
                return Err(CallbotError::Config(format!(
                    "{} must be between 0 and {} seconds, got {}",
                    name, MAX_DURATION_SECS, secs
                )));
            }
        }
        // NaN fails both comparisons
        if !(self.ambient_calibration_secs >= 0.0
            && self.ambient_calibration_secs <= MAX_DURATION_SECS)
        {
            return Err(CallbotError::Config(format!(
                "ambient calibration time must be between 0 and {} seconds, got {}",
                MAX_DURATION_SECS, self.ambient_calibration_secs
            )));
        }
        if self.language.trim().is_empty() {
            return Err(CallbotError::Config("recognition language is required".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SpeechConfig::default();
        assert_eq!(config.volume, 0.8);
        assert_eq!(config.rate, 150);
        assert_eq!(config.listen_timeout(), Duration::from_secs(5));
        assert_eq!(config.phrase_limit(), Duration::from_secs(10));
        assert_eq!(config.calibration_duration(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_length_scale() {
        let mut config = SpeechConfig::default();
        assert!((config.length_scale() - 1.0).abs() < f32::EPSILON);
        config.rate = 300;
        assert!((config.length_scale() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_recognition_language() {
        let mut config = SpeechConfig::default();
        assert_eq!(config.recognition_language(), "ja");
        config.language = "en".into();
        assert_eq!(config.recognition_language(), "en");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SpeechConfig::default();
        config.volume = 1.5;
        assert!(config.validate().is_err());

        let mut config = SpeechConfig::default();
        config.listen_timeout_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_durations() {
        let mut config = SpeechConfig::default();
        config.listen_timeout_secs = f32::INFINITY;
        assert!(config.validate().is_err());

        let mut config = SpeechConfig::default();
        config.phrase_limit_secs = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = SpeechConfig::default();
        config.ambient_calibration_secs = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = SpeechConfig::default();
        config.ambient_calibration_secs = 0.0;
        assert!(config.validate().is_ok());
    }
}
