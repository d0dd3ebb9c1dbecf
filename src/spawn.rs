//! Per-slot sampling context for shape generators.
//!
//! Each generator call builds a [`SlotContext`] whose RNG is seeded from the
//! template's salt and the slot index. The same slot therefore lands on the
//! same point every time targets are regenerated, which keeps shapes visually
//! stable and makes retargeting idempotent.
//!
//! ```ignore
//! let mut ctx = SlotContext::new(i, total, HEART_SALT);
//! let z = ctx.random_range(-2.0, 2.0);
//! let p = ctx.random_on_sphere(5.0);
//! ```

use crate::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Sampling helpers for one particle slot.
pub struct SlotContext {
    /// Index of the slot being generated (0 to count-1).
    pub index: u32,
    /// Total number of slots.
    pub count: u32,
    rng: SmallRng,
}

impl SlotContext {
    /// Create a context for slot `index` of `count`, seeded by `salt`.
    pub fn new(index: u32, count: u32, salt: u64) -> Self {
        Self {
            index,
            count,
            rng: SmallRng::seed_from_u64(slot_seed(salt, index)),
        }
    }

    /// Normalized progress through the slots (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f32 {
        self.index as f32 / self.count as f32
    }

    /// Random f32 in `[min, max)`.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        self.rng.gen_range(min..max)
    }

    /// Symmetric jitter in `[-amount, amount)`.
    #[inline]
    pub fn jitter(&mut self, amount: f32) -> f32 {
        self.random_range(-amount, amount)
    }

    /// Point inside a sphere of given radius, uniform throughout the volume.
    pub fn random_in_sphere(&mut self, radius: f32) -> Vec3 {
        // Cube root keeps the core from being over-dense.
        let r = radius * self.rng.gen::<f32>().cbrt();
        self.random_direction() * r
    }

    /// Point on the surface of a sphere of given radius.
    pub fn random_on_sphere(&mut self, radius: f32) -> Vec3 {
        self.random_direction() * radius
    }

    /// Unit vector, uniform on the sphere.
    pub fn random_direction(&mut self) -> Vec3 {
        let theta = self.rng.gen_range(0.0..TAU);
        let phi = (self.rng.gen::<f32>() * 2.0 - 1.0).clamp(-1.0, 1.0).acos();
        Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos())
    }

    /// Position on a helix around the Y axis, distributed by progress.
    ///
    /// * `radius` - Helix radius
    /// * `height` - Total height of helix
    /// * `turns` - Number of complete rotations
    pub fn helix_position(&self, radius: f32, height: f32, turns: f32) -> Vec3 {
        let t = self.progress();
        let angle = t * TAU * turns;
        Vec3::new(radius * angle.cos(), (t - 0.5) * height, radius * angle.sin())
    }
}

/// Mix a template salt and slot index into an RNG seed (splitmix64 finalizer).
pub fn slot_seed(salt: u64, index: u32) -> u64 {
    let mut z = salt ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
