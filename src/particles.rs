//! The particle field: one current position and one target per slot.
//!
//! Positions start as a random cloud and are pulled toward their targets by
//! the integrator every frame. Targets only change when a template is
//! applied through [`ParticleField::retarget`].

use crate::error::SimulationError;
use crate::template::ShapeTemplate;
use crate::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Side length of the cube the initial cloud is scattered in.
pub const INITIAL_CLOUD_SIZE: f32 = 50.0;

/// Fixed-size set of particle slots.
///
/// Holds at most `u32::MAX` slots, since generators address slots as `u32`.
#[derive(Debug, Clone)]
pub struct ParticleField {
    positions: Vec<Vec3>,
    targets: Vec<Vec3>,
}

impl ParticleField {
    /// Allocate `count` particles scattered in a cube around the origin.
    pub fn new(count: usize) -> Result<Self, SimulationError> {
        Self::with_rng(count, &mut SmallRng::from_entropy())
    }

    /// Same as [`new`](Self::new) with a reproducible initial cloud.
    pub fn with_seed(count: usize, seed: u64) -> Result<Self, SimulationError> {
        Self::with_rng(count, &mut SmallRng::seed_from_u64(seed))
    }

    fn with_rng(count: usize, rng: &mut SmallRng) -> Result<Self, SimulationError> {
        u32::try_from(count).map_err(|_| SimulationError::Allocation { count })?;
        let mut positions = Vec::new();
        let mut targets = Vec::new();
        positions
            .try_reserve_exact(count)
            .and_then(|_| targets.try_reserve_exact(count))
            .map_err(|_| SimulationError::Allocation { count })?;

        let half = INITIAL_CLOUD_SIZE * 0.5;
        positions.extend((0..count).map(|_| {
            Vec3::new(
                rng.gen_range(-half..half),
                rng.gen_range(-half..half),
                rng.gen_range(-half..half),
            )
        }));
        targets.resize(count, Vec3::ZERO);

        debug!(count, "Allocated particle field");
        Ok(Self { positions, targets })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Regenerate every target from `template`.
    ///
    /// Non-finite generator output is replaced with the origin so positions
    /// stay finite.
    pub fn retarget(&mut self, template: &ShapeTemplate) {
        if self.targets.is_empty() {
            return;
        }
        // Lossless: construction rejects counts above u32::MAX.
        let total = self.targets.len() as u32;
        for (i, target) in self.targets.iter_mut().enumerate() {
            let p = template.generate(i as u32, total);
            *target = if p.is_finite() { p } else { Vec3::ZERO };
        }
        debug!(template = template.id(), count = total, "Retargeted particle field");
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn targets(&self) -> &[Vec3] {
        &self.targets
    }

    /// Positions as `3N` packed floats, ready for a vertex buffer upload.
    pub fn as_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Mutable access for the integrator: positions alongside their targets.
    pub(crate) fn slots_mut(&mut self) -> (&mut [Vec3], &[Vec3]) {
        (&mut self.positions, &self.targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;
    use crate::template::TemplateKind;

    #[test]
    fn test_initial_cloud_in_cube() {
        let field = ParticleField::with_seed(1000, 1).unwrap();
        assert_eq!(field.len(), 1000);
        for p in field.positions() {
            assert!(p.abs().max_element() <= INITIAL_CLOUD_SIZE * 0.5);
        }
        assert!(field.targets().iter().all(|t| *t == Vec3::ZERO));
    }

    #[test]
    fn test_flat_view() {
        let field = ParticleField::with_seed(4, 2).unwrap();
        let flat = field.as_flat();
        assert_eq!(flat.len(), 12);
        assert_eq!(flat[3], field.positions()[1].x);
        assert_eq!(flat[11], field.positions()[3].z);
    }

    #[test]
    fn test_retarget_idempotent() {
        let heart = shapes::builtin("heart").unwrap();
        let mut field = ParticleField::with_seed(500, 3).unwrap();
        field.retarget(&heart);
        let first = field.targets().to_vec();
        field.retarget(&heart);
        assert_eq!(field.targets(), first.as_slice());
    }

    #[test]
    fn test_retarget_leaves_positions() {
        let mut field = ParticleField::with_seed(100, 4).unwrap();
        let before = field.positions().to_vec();
        field.retarget(&shapes::builtin("sphere").unwrap());
        assert_eq!(field.positions(), before.as_slice());
    }

    #[test]
    fn test_empty_field_never_calls_generator() {
        let mut field = ParticleField::with_seed(0, 5).unwrap();
        let t = ShapeTemplate::new("boom", "Boom", TemplateKind::Custom, |_, _| {
            panic!("generator called on empty field")
        });
        field.retarget(&t);
        assert!(field.is_empty());
        assert!(field.as_flat().is_empty());
    }

    #[test]
    fn test_non_finite_targets_sanitized() {
        let mut field = ParticleField::with_seed(10, 6).unwrap();
        let t = ShapeTemplate::new("nan", "NaN", TemplateKind::Custom, |i, _| {
            if i % 2 == 0 {
                Vec3::splat(f32::NAN)
            } else {
                Vec3::ONE
            }
        });
        field.retarget(&t);
        assert_eq!(field.targets()[0], Vec3::ZERO);
        assert_eq!(field.targets()[1], Vec3::ONE);
    }

    #[test]
    fn test_huge_allocation_fails_cleanly() {
        let err = ParticleField::with_seed(usize::MAX / 4, 7).unwrap_err();
        assert!(matches!(err, SimulationError::Allocation { .. }));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_count_beyond_slot_index_range_rejected() {
        let count = u32::MAX as usize + 1;
        let err = ParticleField::with_seed(count, 8).unwrap_err();
        assert!(matches!(err, SimulationError::Allocation { count: c } if c == count));
    }
}
