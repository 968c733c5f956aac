//! Per-particle constant force sampling

use cinder_core::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Per-axis `[min, max]` intervals a particle's force is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ForceRange {
    pub x: [f32; 2],
    pub y: [f32; 2],
    pub z: [f32; 2],
}

/// Draws a force vector per new particle, each axis uniform and independent
pub struct ForceSampler {
    rng: StdRng,
}

impl ForceSampler {
    /// Deterministic sampler
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Sampler seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn sample(&mut self, range: &ForceRange) -> Vec3 {
        Vec3::new(
            self.sample_axis(range.x),
            self.sample_axis(range.y),
            self.sample_axis(range.z),
        )
    }

    fn sample_axis(&mut self, [min, max]: [f32; 2]) -> f32 {
        // An infinite or NaN span cannot be sampled
        if !(min < max && (max - min).is_finite()) {
            return if min.is_finite() { min } else { 0.0 };
        }
        self.rng.random_range(min..=max)
    }
}
