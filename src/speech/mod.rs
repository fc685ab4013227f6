//! Speech ports and their adapters
//!
//! This module provides:
//! - [`SpeechOutput`]: blocking synthesis and playback
//! - [`SpeechInput`]: blocking capture and transcription
//! - text-only adapters used when audio is disabled
//! - VITS synthesis via sherpa-rs (feature `tts`)
//! - Whisper recognition via whisper-rs (feature `stt`)

pub mod config;
pub mod pitch;
#[cfg(feature = "stt")]
pub mod stt;
pub mod text;
#[cfg(feature = "tts")]
pub mod tts;

pub use config::{RecognizerConfig, SpeechConfig, VoiceModelConfig};
pub use pitch::{PitchBar, PitchFrame};
pub use text::{IdleListener, SilentSpeaker};

use crate::utils::CancellationToken;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Why a listen call produced no text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenError {
    #[error("no speech detected")]
    NoSpeechDetected,

    #[error("speech could not be understood")]
    Unintelligible,

    #[error("recognition service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("listening cancelled")]
    Cancelled,
}

impl ListenError {
    /// Status line shown to the user
    pub fn status_message(&self) -> String {
        match self {
            ListenError::NoSpeechDetected => "Speech input timed out".to_string(),
            ListenError::Unintelligible => "Could not understand the speech".to_string(),
            ListenError::ServiceUnavailable(detail) => {
                format!("Speech recognition service error: {}", detail)
            }
            ListenError::Cancelled => "Listening cancelled".to_string(),
        }
    }
}

/// Synthesis and playback of bot lines
pub trait SpeechOutput: Send + Sync {
    /// One-time engine set-up. A failure here is fatal and not retried.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Speak `text`, returning once playback has finished or `cancel` fires.
    fn speak(&self, text: &str, cancel: &CancellationToken) -> Result<()>;

    /// Interrupt in-flight playback. Safe to call from any thread.
    fn stop(&self);

    fn set_volume(&self, volume: f32);

    fn name(&self) -> &str;
}

/// Capture and transcription of user replies
pub trait SpeechInput: Send + Sync {
    /// Measure ambient noise before the first listen of a session
    fn calibrate(&self, _duration: Duration) -> Result<()> {
        Ok(())
    }

    /// Wait at most `timeout` for speech to begin and at most `phrase_limit`
    /// once it has, then return the transcription.
    fn listen(
        &self,
        timeout: Duration,
        phrase_limit: Duration,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, ListenError>;

    /// Whether a real capture device is behind this port
    fn is_live(&self) -> bool {
        true
    }

    fn name(&self) -> &str;
}

/// Pick the output adapter for this build and configuration
pub fn build_output(config: &SpeechConfig) -> Arc<dyn SpeechOutput> {
    if !config.enable_audio_output {
        info!("Audio output disabled, bot lines will only be shown as text");
        return Arc::new(SilentSpeaker::new(config.volume));
    }

    #[cfg(feature = "tts")]
    {
        if !config.tts.model_path.is_empty() {
            return Arc::new(tts::VitsSpeaker::new(config));
        }
        warn!("No voice model configured, falling back to text output");
    }

    #[cfg(not(feature = "tts"))]
    warn!("Built without the `tts` feature, falling back to text output");

    Arc::new(SilentSpeaker::new(config.volume))
}

/// Pick the input adapter for this build and configuration
pub fn build_input(config: &SpeechConfig) -> Arc<dyn SpeechInput> {
    if !config.enable_audio_input {
        info!("Audio input disabled, replies must be typed");
        return Arc::new(IdleListener::new());
    }

    #[cfg(feature = "stt")]
    {
        match stt::WhisperListener::new(config) {
            Ok(listener) => return Arc::new(listener),
            Err(e) => warn!("Speech recognition unavailable ({}), replies must be typed", e),
        }
    }

    #[cfg(not(feature = "stt"))]
    warn!("Built without the `stt` feature, replies must be typed");

    Arc::new(IdleListener::new())
}
