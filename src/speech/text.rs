//! Text-only adapters for running without audio devices or models

use super::{ListenError, SpeechInput, SpeechOutput};
use crate::utils::CancellationToken;
use crate::Result;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Output port that only logs what would have been said
#[derive(Debug)]
pub struct SilentSpeaker {
    volume: Mutex<f32>,
}

impl SilentSpeaker {
    pub fn new(volume: f32) -> Self {
        Self {
            volume: Mutex::new(volume.clamp(0.0, 1.0)),
        }
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock()
    }
}

impl Default for SilentSpeaker {
    fn default() -> Self {
        Self::new(0.8)
    }
}

impl SpeechOutput for SilentSpeaker {
    fn speak(&self, text: &str, _cancel: &CancellationToken) -> Result<()> {
        info!("Bot says: {}", text);
        Ok(())
    }

    fn stop(&self) {}

    fn set_volume(&self, volume: f32) {
        *self.volume.lock() = volume.clamp(0.0, 1.0);
    }

    fn name(&self) -> &str {
        "text"
    }
}

/// Input port that never hears anything. Each listen waits out its timeout.
#[derive(Debug, Default)]
pub struct IdleListener;

impl IdleListener {
    pub fn new() -> Self {
        Self
    }
}

impl SpeechInput for IdleListener {
    fn listen(
        &self,
        timeout: Duration,
        _phrase_limit: Duration,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, ListenError> {
        if cancel.wait(timeout) {
            return Err(ListenError::Cancelled);
        }
        debug!("No speech input available");
        Err(ListenError::NoSpeechDetected)
    }

    fn is_live(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "idle"
    }
}
