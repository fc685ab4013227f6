//! Text-to-speech with sherpa-rs (VITS models)
//!
//! The model and the output device are opened once by
//! [`SpeechOutput::initialize`]. Each `speak` call synthesizes the whole
//! line, converts it to the device rate and blocks until it has drained.

use super::config::{SpeechConfig, VoiceModelConfig};
use super::SpeechOutput;
use crate::audio::{resample_mono, AudioOutput};
use crate::utils::CancellationToken;
use crate::{CallbotError, Result};
use parking_lot::Mutex;
use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub struct VitsSpeaker {
    voice: VoiceModelConfig,
    length_scale: f32,
    volume: Mutex<f32>,
    tts: Mutex<Option<VitsTts>>,
    output: Mutex<Option<Arc<AudioOutput>>>,
}

impl VitsSpeaker {
    /// Prepare a speaker; nothing is loaded until `initialize`
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            voice: config.tts.clone(),
            length_scale: config.length_scale(),
            volume: Mutex::new(config.volume),
            tts: Mutex::new(None),
            output: Mutex::new(None),
        }
    }

    fn load_model(&self) -> Result<VitsTts> {
        for (what, path) in [("Model", &self.voice.model_path), ("Tokens file", &self.voice.tokens_path)] {
            if path.is_empty() || !Path::new(path).exists() {
                return Err(CallbotError::EngineUnavailable(format!(
                    "{} not found: {}",
                    what, path
                )));
            }
        }

        info!("Loading VITS voice from: {}", self.voice.model_path);

        let config = VitsTtsConfig {
            model: self.voice.model_path.clone(),
            tokens: self.voice.tokens_path.clone(),
            lexicon: self.voice.lexicon_path.clone().unwrap_or_default(),
            data_dir: self.voice.data_dir.clone().unwrap_or_default(),
            dict_dir: self.voice.dict_dir.clone().unwrap_or_default(),
            length_scale: self.length_scale,
            noise_scale: 0.667,
            noise_scale_w: 0.8,
            ..Default::default()
        };

        Ok(VitsTts::new(config))
    }

    fn synthesize(&self, text: &str) -> Result<(Vec<f32>, u32)> {
        let mut guard = self.tts.lock();
        let tts = guard
            .as_mut()
            .ok_or_else(|| CallbotError::Synthesis("Voice not initialized".into()))?;

        let audio = tts
            .create(text, self.voice.speaker_id, 1.0)
            .map_err(|e| CallbotError::Synthesis(format!("Synthesis failed: {}", e)))?;

        Ok((audio.samples, audio.sample_rate as u32))
    }
}

impl SpeechOutput for VitsSpeaker {
    fn initialize(&self) -> Result<()> {
        if self.tts.lock().is_some() {
            return Ok(());
        }

        let model = self.load_model()?;
        let output = AudioOutput::open(*self.volume.lock())
            .map_err(|e| CallbotError::EngineUnavailable(e.to_string()))?;

        *self.output.lock() = Some(Arc::new(output));
        *self.tts.lock() = Some(model);

        info!("Voice ready");
        Ok(())
    }

    fn speak(&self, text: &str, cancel: &CancellationToken) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let (samples, model_rate) = self.synthesize(text)?;
        if cancel.is_cancelled() {
            return Ok(());
        }

        let output = self
            .output
            .lock()
            .clone()
            .ok_or_else(|| CallbotError::Synthesis("Output device not open".into()))?;

        let samples = resample_mono(&samples, model_rate, output.sample_rate())
            .map_err(|e| CallbotError::Synthesis(e.to_string()))?;

        debug!(
            "Playing {:.2}s of speech",
            samples.len() as f32 / output.sample_rate() as f32
        );
        output.play_blocking(&samples, cancel);
        Ok(())
    }

    fn stop(&self) {
        if let Some(output) = self.output.lock().as_ref() {
            output.clear();
        }
    }

    fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        *self.volume.lock() = volume;
        if let Some(output) = self.output.lock().as_ref() {
            output.set_volume(volume);
        }
    }

    fn name(&self) -> &str {
        "vits"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_unavailable() {
        let mut config = SpeechConfig::default();
        config.tts.model_path = "/nonexistent/voice.onnx".into();
        config.tts.tokens_path = "/nonexistent/tokens.txt".into();

        let speaker = VitsSpeaker::new(&config);
        let err = speaker.initialize().unwrap_err();
        assert!(matches!(err, CallbotError::EngineUnavailable(_)));
    }

    #[test]
    fn test_speak_before_initialize_fails() {
        let speaker = VitsSpeaker::new(&SpeechConfig::default());
        let err = speaker.speak("こんにちは", &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, CallbotError::Synthesis(_)));
    }
}
