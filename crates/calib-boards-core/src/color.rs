//! Visualization colors for boards.
//!
//! Colors only tint debug drawings and plots; they never enter calibration math.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// RGB display color.
pub type BoardColor = [u8; 3];

/// Source of per-board display colors.
pub trait BoardColorizer {
    fn next_color(&mut self) -> BoardColor;
}

/// Uniformly random colors.
///
/// Use [`RandomColorizer::seeded`] where reproducible colors are needed.
#[derive(Clone, Debug)]
pub struct RandomColorizer {
    rng: StdRng,
}

impl RandomColorizer {
    /// Seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomColorizer {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl BoardColorizer for RandomColorizer {
    fn next_color(&mut self) -> BoardColor {
        self.rng.random()
    }
}

/// The same color for every board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedColorizer(pub BoardColor);

impl BoardColorizer for FixedColorizer {
    fn next_color(&mut self) -> BoardColor {
        self.0
    }
}
