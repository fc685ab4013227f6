use crate::{CallbotError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

const CHUNK_FRAMES: usize = 1024;

/// Mono sample-rate converter
pub struct AudioResampler {
    inner: SincFixedIn<f32>,
    from_rate: u32,
    to_rate: u32,
}

impl AudioResampler {
    pub fn new(from_rate: u32, to_rate: u32) -> Result<Self> {
        if from_rate == 0 || to_rate == 0 {
            return Err(CallbotError::Config(
                "Sample rates must be greater than 0".into(),
            ));
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let inner = SincFixedIn::<f32>::new(
            to_rate as f64 / from_rate as f64,
            2.0,
            params,
            CHUNK_FRAMES,
            1,
        )
        .map_err(|e| CallbotError::AudioProcessing(format!("Failed to create resampler: {}", e)))?;

        Ok(Self {
            inner,
            from_rate,
            to_rate,
        })
    }

    /// Convert a complete clip. The tail chunk is zero-padded and the result
    /// trimmed to the expected length.
    pub fn process(&mut self, samples: &[f32]) -> Result<Vec<f32>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let expected = self.expected_len(samples.len());
        let mut output = Vec::with_capacity(expected + CHUNK_FRAMES);

        for chunk in samples.chunks(CHUNK_FRAMES) {
            let wave: [&[f32]; 1] = [chunk];
            let frames = if chunk.len() == CHUNK_FRAMES {
                self.inner.process(&wave[..], None)
            } else {
                self.inner.process_partial(Some(&wave[..]), None)
            }
            .map_err(|e| CallbotError::AudioProcessing(format!("Resampling failed: {}", e)))?;

            if let Some(channel) = frames.into_iter().next() {
                output.extend(channel);
            }
        }

        output.truncate(expected);
        debug!(
            "Resampled {} -> {} samples ({} Hz -> {} Hz)",
            samples.len(),
            output.len(),
            self.from_rate,
            self.to_rate
        );
        Ok(output)
    }

    pub fn expected_len(&self, input_len: usize) -> usize {
        (input_len as f64 * self.to_rate as f64 / self.from_rate as f64).ceil() as usize
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

/// One-shot mono conversion; returns the input unchanged when rates match
pub fn resample_mono(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }
    AudioResampler::new(from_rate, to_rate)?.process(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_rates() {
        assert!(AudioResampler::new(0, 16000).is_err());
        assert!(AudioResampler::new(16000, 0).is_err());
    }

    #[test]
    fn test_downsample_length() {
        let input: Vec<f32> = (0..4800).map(|i| (i as f32 * 0.05).sin()).collect();
        let output = resample_mono(&input, 48000, 16000).unwrap();
        assert!(output.len() <= 1600);
        assert!(output.len() > 1000);
    }

    #[test]
    fn test_upsample_length() {
        let mut resampler = AudioResampler::new(16000, 48000).unwrap();
        let input: Vec<f32> = (0..2048).map(|i| (i as f32 * 0.01).sin()).collect();
        let output = resampler.process(&input).unwrap();
        assert!(output.len() > input.len() * 2);
    }

    #[test]
    fn test_same_rate_passthrough() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_mono(&input, 22050, 22050).unwrap(), input);
    }

    #[test]
    fn test_empty_input() {
        let mut resampler = AudioResampler::new(22050, 44100).unwrap();
        assert!(resampler.process(&[]).unwrap().is_empty());
    }
}
