//! Hand forces on particle targets.
//!
//! Hands never move particles directly. Each frame the model turns a
//! [`HandState`] into world-space hand positions and a global scale, and then
//! bends every particle's template target:
//!
//! - A pinching hand pulls nearby targets toward itself.
//! - An open hand pushes nearby targets away in the screen plane and stirs
//!   them with random jitter.
//! - Two hands together scale the whole shape by how far apart they are.
//!
//! The integrator then relaxes positions toward the bent targets.

use crate::error::ConfigError;
use crate::hand::{HandInfo, HandState};
use crate::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tuning constants for the hand force model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Hands only affect particles closer than this.
    pub radius: f32,
    /// Pinch values above this attract; at or below it repel.
    pub pinch_threshold: f32,
    pub attraction_gain: f32,
    pub repulsion_gain: f32,
    /// Amplitude of the random stir under an open hand.
    pub turbulence_gain: f32,
    /// Half the world width covered by the normalized x range.
    pub half_width: f32,
    /// Half the world height covered by the normalized y range.
    pub half_height: f32,
    /// Inter-hand distance that maps to a scale of 1.
    pub scale_divisor: f32,
    pub scale_min: f32,
    pub scale_max: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            radius: 15.0,
            pinch_threshold: 0.5,
            attraction_gain: 2.0,
            repulsion_gain: 0.5,
            turbulence_gain: 2.0,
            half_width: 20.0,
            half_height: 15.0,
            scale_divisor: 10.0,
            scale_min: 0.5,
            scale_max: 2.5,
        }
    }
}

impl ForceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("force.radius", self.radius),
            ("force.half_width", self.half_width),
            ("force.half_height", self.half_height),
            ("force.scale_divisor", self.scale_divisor),
            ("force.scale_min", self.scale_min),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }
        if !(self.scale_max.is_finite() && self.scale_max >= self.scale_min) {
            return Err(ConfigError::InvalidValue {
                field: "force.scale_max",
                reason: format!("must be at least scale_min ({})", self.scale_min),
            });
        }
        let gains = [
            ("force.pinch_threshold", self.pinch_threshold),
            ("force.attraction_gain", self.attraction_gain),
            ("force.repulsion_gain", self.repulsion_gain),
            ("force.turbulence_gain", self.turbulence_gain),
        ];
        for (field, value) in gains {
            if !value.is_finite() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be finite".into(),
                });
            }
        }
        Ok(())
    }
}

/// A detected hand resolved into world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldHand {
    pub position: Vec2,
    pub pinch: f32,
}

/// Hand influence for one frame, resolved once and applied to every particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameForces {
    pub hands: [Option<WorldHand>; 2],
    pub scale: f32,
}

impl FrameForces {
    /// No hands: targets pass through unchanged.
    pub const IDLE: FrameForces = FrameForces {
        hands: [None, None],
        scale: 1.0,
    };

    pub fn is_idle(&self) -> bool {
        self.hands.iter().all(Option::is_none) && self.scale == 1.0
    }
}

/// Maps hand state to bent particle targets.
#[derive(Debug, Clone, Default)]
pub struct HandForceModel {
    config: ForceConfig,
}

impl HandForceModel {
    pub fn new(config: ForceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    /// World-plane position of a hand, or `None` if it is absent or not detected.
    pub fn hand_world_position(&self, hand: Option<&HandInfo>) -> Option<Vec2> {
        let hand = hand.filter(|h| h.detected)?;
        let c = &self.config;
        let p = Vec2::new(
            (hand.x - 0.5) * 2.0 * c.half_width,
            -(hand.y - 0.5) * 2.0 * c.half_height,
        );
        p.is_finite().then_some(p)
    }

    /// Global target scale from the distance between two detected hands.
    pub fn system_scale(&self, hands: &HandState) -> f32 {
        let left = self.hand_world_position(hands.left.as_ref());
        let right = self.hand_world_position(hands.right.as_ref());
        match (left, right) {
            (Some(l), Some(r)) => {
                let c = &self.config;
                (l.distance(r) / c.scale_divisor).clamp(c.scale_min, c.scale_max)
            }
            _ => 1.0,
        }
    }

    /// Resolve a snapshot for one frame.
    pub fn prepare(&self, hands: &HandState) -> FrameForces {
        let resolve = |hand: Option<&HandInfo>| {
            self.hand_world_position(hand).map(|position| WorldHand {
                position,
                pinch: hand.map_or(0.0, |h| h.pinch),
            })
        };
        FrameForces {
            hands: [resolve(hands.left.as_ref()), resolve(hands.right.as_ref())],
            scale: self.system_scale(hands),
        }
    }

    /// Template target for one particle after scale and hand forces.
    pub fn effective_target<R: Rng + ?Sized>(
        &self,
        frame: &FrameForces,
        target: Vec3,
        position: Vec3,
        rng: &mut R,
    ) -> Vec3 {
        let c = &self.config;
        let mut t = target * frame.scale;

        for hand in frame.hands.iter().flatten() {
            // Hands sit on the z = 0 plane.
            let d = Vec3::new(
                hand.position.x - position.x,
                hand.position.y - position.y,
                -position.z,
            );
            let dist = d.length();
            if dist >= c.radius {
                continue;
            }
            let force = (c.radius - dist) / c.radius;

            if hand.pinch > c.pinch_threshold {
                t += d * (force * hand.pinch * c.attraction_gain);
            } else {
                t.x -= d.x * force * c.repulsion_gain;
                t.y -= d.y * force * c.repulsion_gain;
                t.x += (rng.gen::<f32>() - 0.5) * force * c.turbulence_gain;
                t.y += (rng.gen::<f32>() - 0.5) * force * c.turbulence_gain;
            }
        }
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn pair(left_x: f32, right_x: f32) -> HandState {
        HandState {
            left: Some(HandInfo::new(left_x, 0.5, 0.0)),
            right: Some(HandInfo::new(right_x, 0.5, 0.0)),
        }
    }

    #[test]
    fn test_world_mapping() {
        let model = HandForceModel::default();
        let centre = model.hand_world_position(Some(&HandInfo::new(0.5, 0.5, 0.0)));
        assert_eq!(centre, Some(Vec2::ZERO));

        let corner = model.hand_world_position(Some(&HandInfo::new(1.0, 0.0, 0.0)));
        assert_eq!(corner, Some(Vec2::new(20.0, 15.0)));
    }

    #[test]
    fn test_undetected_hand_resolves_to_none() {
        let model = HandForceModel::default();
        let ghost = HandInfo {
            detected: false,
            ..HandInfo::new(0.5, 0.5, 1.0)
        };
        assert_eq!(model.hand_world_position(Some(&ghost)), None);
        assert_eq!(model.hand_world_position(None), None);
    }

    #[test]
    fn test_undetected_hands_leave_targets_unchanged() {
        let model = HandForceModel::default();
        let ghost = HandInfo {
            detected: false,
            ..HandInfo::new(0.5, 0.5, 1.0)
        };
        let frame = model.prepare(&HandState {
            left: Some(ghost),
            right: Some(ghost),
        });
        assert!(frame.is_idle());

        let mut rng = SmallRng::seed_from_u64(1);
        let target = Vec3::new(3.0, -2.0, 1.0);
        let t = model.effective_target(&frame, target, Vec3::new(0.5, 0.5, 0.0), &mut rng);
        assert_eq!(t, target);
    }

    #[test]
    fn test_system_scale() {
        let model = HandForceModel::default();
        // 0.25 of the normalized width is 10 world units.
        assert!((model.system_scale(&pair(0.375, 0.625)) - 1.0).abs() < 1e-5);
        // 2 units apart clamps up to the minimum.
        assert_eq!(model.system_scale(&pair(0.45, 0.5)), 0.5);
        // 30 units apart clamps down to the maximum.
        assert_eq!(model.system_scale(&pair(0.125, 0.875)), 2.5);
    }

    #[test]
    fn test_single_hand_scale_is_one() {
        let model = HandForceModel::default();
        let one = HandState {
            left: None,
            right: Some(HandInfo::new(0.9, 0.1, 0.0)),
        };
        assert_eq!(model.system_scale(&one), 1.0);
        assert_eq!(model.system_scale(&HandState::NONE), 1.0);
    }

    #[test]
    fn test_pinch_attracts_open_repels() {
        let model = HandForceModel::default();
        let position = Vec3::new(1.0, 0.0, 0.0);
        let target = Vec3::new(5.0, 0.0, 0.0);
        let hand = |pinch| HandState {
            left: None,
            right: Some(HandInfo::new(0.5, 0.5, pinch)),
        };

        for seed in 0..32 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let pinched =
                model.effective_target(&model.prepare(&hand(1.0)), target, position, &mut rng);
            let open =
                model.effective_target(&model.prepare(&hand(0.0)), target, position, &mut rng);
            assert!(pinched.x < target.x);
            assert!(pinched.distance(Vec3::ZERO) < open.distance(Vec3::ZERO));
        }
    }

    #[test]
    fn test_hand_on_particle_is_finite() {
        let model = HandForceModel::default();
        let frame = model.prepare(&HandState {
            left: Some(HandInfo::new(0.5, 0.5, 1.0)),
            right: Some(HandInfo::new(0.5, 0.5, 0.0)),
        });
        let mut rng = SmallRng::seed_from_u64(2);
        let t = model.effective_target(&frame, Vec3::ONE, Vec3::ZERO, &mut rng);
        assert!(t.is_finite());
    }

    #[test]
    fn test_out_of_radius_ignored() {
        let model = HandForceModel::default();
        let frame = model.prepare(&HandState {
            left: None,
            right: Some(HandInfo::new(0.5, 0.5, 1.0)),
        });
        let mut rng = SmallRng::seed_from_u64(3);
        let far = Vec3::new(0.0, 0.0, 20.0);
        assert_eq!(model.effective_target(&frame, far, far, &mut rng), far);
    }

    #[test]
    fn test_config_validation() {
        assert!(ForceConfig::default().validate().is_ok());

        let bad = ForceConfig {
            radius: 0.0,
            ..ForceConfig::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidValue { field: "force.radius", .. })
        ));

        let bad = ForceConfig {
            scale_max: 0.1,
            ..ForceConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_config_partial_json() {
        let c: ForceConfig = serde_json::from_str(r#"{"radius": 20.0}"#).unwrap();
        assert_eq!(c.radius, 20.0);
        assert_eq!(c.attraction_gain, 2.0);
    }
}
