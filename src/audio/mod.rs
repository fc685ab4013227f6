#[cfg(feature = "audio-io")]
pub mod input;
pub mod level;
#[cfg(feature = "audio-io")]
pub mod output;
pub mod resampler;

#[cfg(feature = "audio-io")]
pub use input::{list_input_devices, AudioInput};
pub use level::{rms, EnergyGate};
#[cfg(feature = "audio-io")]
pub use output::AudioOutput;
pub use resampler::{resample_mono, AudioResampler};

/// Sample rate Whisper expects
pub const WHISPER_SAMPLE_RATE: u32 = 16000;
