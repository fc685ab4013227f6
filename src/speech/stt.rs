//! Microphone listening with energy-based endpointing and Whisper
//! transcription

use super::config::SpeechConfig;
use super::{ListenError, SpeechInput};
use crate::audio::{resample_mono, AudioInput, EnergyGate, WHISPER_SAMPLE_RATE};
use crate::utils::CancellationToken;
use crate::{CallbotError, Result};
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

const BLOCK_WAIT: Duration = Duration::from_millis(50);

pub struct WhisperListener {
    context: WhisperContext,
    input: AudioInput,
    gate: Mutex<EnergyGate>,
    language: String,
    n_threads: i32,
    pause: Duration,
}

impl WhisperListener {
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let model_path = &config.stt.model_path;
        if !model_path.exists() {
            return Err(CallbotError::EngineUnavailable(format!(
                "Whisper model not found: {:?}",
                model_path
            )));
        }

        info!("Loading Whisper model from: {:?}", model_path);
        let context = WhisperContext::new_with_params(
            model_path
                .to_str()
                .ok_or_else(|| CallbotError::Config("Invalid model path".to_string()))?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| CallbotError::EngineUnavailable(format!("Failed to load Whisper model: {:?}", e)))?;

        let input = AudioInput::open()?;

        Ok(Self {
            context,
            input,
            gate: Mutex::new(EnergyGate::new(config.stt.min_energy, config.stt.energy_ratio)),
            language: config.recognition_language().to_string(),
            n_threads: config.stt.n_threads,
            pause: Duration::from_secs_f32(config.stt.pause_secs),
        })
    }

    /// Collect one phrase: wait for onset, then record until a pause or the limit
    fn capture_phrase(
        &self,
        timeout: Duration,
        phrase_limit: Duration,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<f32>, ListenError> {
        let gate = self.gate.lock().clone();
        let started = Instant::now();
        let mut phrase = Vec::new();
        let mut onset: Option<Instant> = None;
        let mut last_voice = started;

        loop {
            if cancel.is_cancelled() {
                return Err(ListenError::Cancelled);
            }

            let block = self
                .input
                .next_block(BLOCK_WAIT)
                .map_err(|e| ListenError::ServiceUnavailable(e.to_string()))?;
            let now = Instant::now();

            match onset {
                None => {
                    if let Some(block) = block.filter(|b| gate.is_speech(b)) {
                        debug!("Speech onset after {:?}", started.elapsed());
                        onset = Some(now);
                        last_voice = now;
                        phrase.extend(block);
                    } else if started.elapsed() >= timeout {
                        return Err(ListenError::NoSpeechDetected);
                    }
                }
                Some(began) => {
                    if let Some(block) = block {
                        if gate.is_speech(&block) {
                            last_voice = now;
                        }
                        phrase.extend(block);
                    }
                    if now.duration_since(last_voice) >= self.pause
                        || now.duration_since(began) >= phrase_limit
                    {
                        return Ok(phrase);
                    }
                }
            }
        }
    }

    fn transcribe(&self, samples: &[f32]) -> std::result::Result<String, ListenError> {
        let samples = resample_mono(samples, self.input.sample_rate(), WHISPER_SAMPLE_RATE)
            .map_err(|e| ListenError::ServiceUnavailable(e.to_string()))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.n_threads);
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_language(Some(self.language.as_str()));

        let unavailable = |e: whisper_rs::WhisperError| ListenError::ServiceUnavailable(format!("{:?}", e));

        let mut state = self.context.create_state().map_err(unavailable)?;
        state.full(params, &samples).map_err(unavailable)?;

        let segments = state.full_n_segments().map_err(unavailable)?;
        let mut text = String::new();
        for i in 0..segments {
            text.push_str(&state.full_get_segment_text(i).map_err(unavailable)?);
        }

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ListenError::Unintelligible);
        }
        debug!("Transcribed: {}", text);
        Ok(text)
    }
}

impl SpeechInput for WhisperListener {
    fn calibrate(&self, duration: Duration) -> Result<()> {
        let wanted = (self.input.sample_rate() as f32 * duration.as_secs_f32()) as usize;
        let deadline = Instant::now() + duration + Duration::from_millis(500);
        let mut ambient = Vec::with_capacity(wanted);

        self.input.begin();
        while ambient.len() < wanted && Instant::now() < deadline {
            if let Some(block) = self.input.next_block(BLOCK_WAIT)? {
                ambient.extend(block);
            }
        }
        self.input.end();

        let threshold = self.gate.lock().calibrate(&ambient);
        info!("Calibrated speech threshold to {:.4}", threshold);
        Ok(())
    }

    fn listen(
        &self,
        timeout: Duration,
        phrase_limit: Duration,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, ListenError> {
        self.input.begin();
        let captured = self.capture_phrase(timeout, phrase_limit, cancel);
        self.input.end();

        let samples = captured?;
        if cancel.is_cancelled() {
            return Err(ListenError::Cancelled);
        }
        self.transcribe(&samples)
    }

    fn name(&self) -> &str {
        "whisper"
    }
}
