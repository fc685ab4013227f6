use rand::Rng;
use serde::{Deserialize, Serialize};

/// One bar of the voice meter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchBar {
    /// Horizontal offset in meter units
    pub x: u32,
    /// Bar height, 20 to 120
    pub height: u32,
    pub color: [u8; 3],
}

/// Decorative bar data published before each bot utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchFrame {
    pub bars: Vec<PitchBar>,
}

impl PitchFrame {
    pub const BAR_COUNT: u32 = 10;
    pub const MIN_HEIGHT: u32 = 20;
    pub const MAX_HEIGHT: u32 = 120;

    pub fn random() -> Self {
        Self::random_with(&mut rand::thread_rng())
    }

    pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let bars = (0..Self::BAR_COUNT)
            .map(|i| PitchBar {
                x: i * 10,
                height: rng.gen_range(Self::MIN_HEIGHT..=Self::MAX_HEIGHT),
                color: [
                    rng.gen_range(100..=255),
                    rng.gen_range(100..=255),
                    rng.gen_range(100..=255),
                ],
            })
            .collect();
        Self { bars }
    }
}

impl PitchBar {
    /// `#rrggbb`
    pub fn hex_color(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.color[0], self.color[1], self.color[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_frame_shape() {
        let frame = PitchFrame::random_with(&mut StdRng::seed_from_u64(3));
        assert_eq!(frame.bars.len(), 10);
        for (i, bar) in frame.bars.iter().enumerate() {
            assert_eq!(bar.x, i as u32 * 10);
            assert!((20..=120).contains(&bar.height));
            assert!(bar.color.iter().all(|&c| c >= 100));
        }
    }

    #[test]
    fn test_hex_color() {
        let bar = PitchBar { x: 0, height: 20, color: [255, 100, 171] };
        assert_eq!(bar.hex_color(), "#ff64ab");
    }
}
