use crate::utils::CancellationToken;
use crate::{CallbotError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

const DRAIN_POLL: Duration = Duration::from_millis(20);

/// Blocking playback on the default output device.
///
/// The cpal stream lives on its own thread; this handle only shares the
/// sample queue and volume with it, so it can be used from any thread.
pub struct AudioOutput {
    queue: Arc<Mutex<VecDeque<f32>>>,
    volume: Arc<AtomicU32>,
    sample_rate: u32,
    shutdown_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl AudioOutput {
    /// Open the default output device
    pub fn open(volume: f32) -> Result<Self> {
        let queue = Arc::new(Mutex::new(VecDeque::new()));
        let volume = Arc::new(AtomicU32::new(volume.clamp(0.0, 1.0).to_bits()));
        let (ready_tx, ready_rx) = bounded::<Result<u32>>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let stream_queue = Arc::clone(&queue);
        let stream_volume = Arc::clone(&volume);

        let thread = thread::spawn(move || {
            let stream = match build_stream(stream_queue, stream_volume) {
                Ok((stream, rate)) => {
                    let _ = ready_tx.send(Ok(rate));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            // Park until the handle is dropped
            let _ = shutdown_rx.recv();
            drop(stream);
            debug!("Output stream closed");
        });

        let sample_rate = ready_rx
            .recv()
            .map_err(|_| CallbotError::AudioDevice("Output thread exited during set-up".into()))??;

        Ok(Self {
            queue,
            volume,
            sample_rate,
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Queue mono samples and wait until they have been played or `cancel` fires
    pub fn play_blocking(&self, samples: &[f32], cancel: &CancellationToken) {
        self.queue.lock().extend(samples.iter().copied());

        loop {
            if self.queue.lock().is_empty() {
                break;
            }
            if cancel.wait(DRAIN_POLL) {
                self.clear();
                break;
            }
        }
    }

    /// Drop everything not yet played
    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    pub fn pending_samples(&self) -> usize {
        self.queue.lock().len()
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.clear();
        self.shutdown_tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn build_stream(
    queue: Arc<Mutex<VecDeque<f32>>>,
    volume: Arc<AtomicU32>,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| CallbotError::AudioDevice("No output device available".into()))?;

    info!(
        "Using output device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );

    let config: cpal::StreamConfig = device
        .default_output_config()
        .map_err(|e| CallbotError::AudioDevice(format!("Failed to get output config: {}", e)))?
        .into();

    let channels = config.channels as usize;
    let sample_rate = config.sample_rate.0;

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let gain = f32::from_bits(volume.load(Ordering::Relaxed));
                let mut queue = queue.lock();
                for frame in data.chunks_mut(channels) {
                    let sample = queue.pop_front().unwrap_or(0.0) * gain;
                    frame.fill(sample);
                }
            },
            |err| error!("Audio output stream error: {}", err),
            None,
        )
        .map_err(|e| CallbotError::AudioDevice(format!("Failed to build output stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| CallbotError::AudioDevice(format!("Failed to start output stream: {}", e)))?;

    Ok((stream, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_open() {
        // Skipped silently on machines without an output device
        if let Ok(output) = AudioOutput::open(0.5) {
            assert!(output.sample_rate() > 0);
            assert_eq!(output.volume(), 0.5);
            output.set_volume(2.0);
            assert_eq!(output.volume(), 1.0);
        }
    }

    #[test]
    fn test_cancelled_playback_clears_queue() {
        if let Ok(output) = AudioOutput::open(0.0) {
            let token = CancellationToken::new();
            token.cancel();
            let samples = vec![0.0f32; output.sample_rate() as usize * 5];
            output.play_blocking(&samples, &token);
            assert_eq!(output.pending_samples(), 0);
        }
    }
}
