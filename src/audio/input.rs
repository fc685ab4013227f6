use crate::{CallbotError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Microphone capture on the default input device.
///
/// Blocks of mono samples arrive on a channel while capture is enabled.
/// The cpal stream is owned by a private thread for the lifetime of the
/// handle.
pub struct AudioInput {
    capturing: Arc<AtomicBool>,
    blocks_rx: Receiver<Vec<f32>>,
    sample_rate: u32,
    shutdown_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl AudioInput {
    pub fn open() -> Result<Self> {
        let capturing = Arc::new(AtomicBool::new(false));
        let (blocks_tx, blocks_rx) = bounded(256);
        let (ready_tx, ready_rx) = bounded::<Result<u32>>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let gate = Arc::clone(&capturing);
        let thread = thread::spawn(move || {
            let stream = match build_stream(gate, blocks_tx) {
                Ok((stream, rate)) => {
                    let _ = ready_tx.send(Ok(rate));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let _ = shutdown_rx.recv();
            drop(stream);
            debug!("Input stream closed");
        });

        let sample_rate = ready_rx
            .recv()
            .map_err(|_| CallbotError::AudioDevice("Input thread exited during set-up".into()))??;

        Ok(Self {
            capturing,
            blocks_rx,
            sample_rate,
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Enable capture, discarding anything left over from a previous turn
    pub fn begin(&self) {
        self.discard();
        self.capturing.store(true, Ordering::SeqCst);
    }

    pub fn end(&self) {
        self.capturing.store(false, Ordering::SeqCst);
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    /// Next captured block, or `None` after `timeout`
    pub fn next_block(&self, timeout: Duration) -> Result<Option<Vec<f32>>> {
        match self.blocks_rx.recv_timeout(timeout) {
            Ok(block) => Ok(Some(block)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(CallbotError::AudioDevice("Input stream stopped".into()))
            }
        }
    }

    fn discard(&self) {
        while self.blocks_rx.try_recv().is_ok() {}
    }
}

impl Drop for AudioInput {
    fn drop(&mut self) {
        self.end();
        self.shutdown_tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Names of the available capture devices
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| CallbotError::AudioDevice(format!("Failed to enumerate inputs: {}", e)))?;
    Ok(devices
        .map(|d| d.name().unwrap_or_else(|_| "Unknown".to_string()))
        .collect())
}

fn build_stream(
    capturing: Arc<AtomicBool>,
    blocks_tx: Sender<Vec<f32>>,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| CallbotError::AudioDevice("No input device available".into()))?;

    info!(
        "Using input device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );

    let config: cpal::StreamConfig = device
        .default_input_config()
        .map_err(|e| CallbotError::AudioDevice(format!("Failed to get input config: {}", e)))?
        .into();

    let channels = config.channels as usize;
    let sample_rate = config.sample_rate.0;

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if !capturing.load(Ordering::Relaxed) {
                    return;
                }

                let mono: Vec<f32> = if channels == 1 {
                    data.to_vec()
                } else {
                    data.chunks(channels)
                        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                        .collect()
                };

                if blocks_tx.try_send(mono).is_err() {
                    debug!("Dropped an input block");
                }
            },
            |err| error!("Audio input stream error: {}", err),
            None,
        )
        .map_err(|e| CallbotError::AudioDevice(format!("Failed to build input stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| CallbotError::AudioDevice(format!("Failed to start input stream: {}", e)))?;

    Ok((stream, sample_rate))
}
