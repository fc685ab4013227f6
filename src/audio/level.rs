//! Signal level metering and speech-onset gating

/// Root-mean-square level of a block of samples
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Energy threshold that separates speech from room noise.
///
/// Starts at `min_energy`; [`calibrate`](Self::calibrate) raises it to
/// `ratio` times the measured ambient level when the room is louder.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyGate {
    threshold: f32,
    min_energy: f32,
    ratio: f32,
}

impl EnergyGate {
    pub fn new(min_energy: f32, ratio: f32) -> Self {
        Self {
            threshold: min_energy,
            min_energy,
            ratio: ratio.max(1.0),
        }
    }

    pub fn calibrate(&mut self, ambient: &[f32]) -> f32 {
        let level = rms(ambient);
        self.threshold = (level * self.ratio).max(self.min_energy);
        self.threshold
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_speech(&self, block: &[f32]) -> bool {
        rms(block) >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[0.5, -0.5, 0.5, -0.5]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_calibration_raises_threshold() {
        let mut gate = EnergyGate::new(0.01, 2.0);
        let noise = vec![0.05f32; 800];
        let threshold = gate.calibrate(&noise);
        assert!((threshold - 0.1).abs() < 1e-6);
        assert!(!gate.is_speech(&noise));
        assert!(gate.is_speech(&vec![0.3f32; 160]));
    }

    #[test]
    fn test_quiet_room_keeps_floor() {
        let mut gate = EnergyGate::new(0.02, 1.5);
        gate.calibrate(&vec![0.0f32; 800]);
        assert_eq!(gate.threshold(), 0.02);
        assert!(!gate.is_speech(&vec![0.001f32; 160]));
    }
}
