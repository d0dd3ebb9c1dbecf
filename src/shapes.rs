//! Built-in shape templates.
//!
//! | id | Shape |
//! |----|-------|
//! | `heart` | Heart curve with a jittered thickness axis |
//! | `saturn` | Sphere core (first 30% of slots) plus an orbital ring (remaining 70%) |
//! | `flowers` | Four-petal rose swept along a linear height axis |
//! | `fireworks` | Uniform solid ball |
//! | `sphere` | Sphere surface |
//! | `spiral` | Jittered helix |
//!
//! Every generator draws its randomness from a [`SlotContext`] seeded by
//! slot index, so repeated calls return the same point for the same slot.

use crate::spawn::SlotContext;
use crate::template::{ShapeTemplate, TemplateKind};
use crate::Vec3;
use std::f32::consts::{PI, TAU};

/// Fraction of Saturn slots that belong to the planet core.
pub const SATURN_CORE_FRACTION: f64 = 0.3;
/// Radius of the Saturn core sphere.
pub const SATURN_CORE_RADIUS: f32 = 5.0;
/// Inner and outer radius of the Saturn ring.
pub const SATURN_RING_RADII: (f32, f32) = (8.0, 14.0);
/// Half-thickness of the Saturn ring.
pub const SATURN_RING_HALF_THICKNESS: f32 = 0.2;
/// Radius of the Big Bang ball.
pub const FIREWORKS_RADIUS: f32 = 15.0;
/// Radius of the sphere-surface template.
pub const SPHERE_RADIUS: f32 = 10.0;

const HEART_SALT: u64 = 0x4845_4152;
const SATURN_SALT: u64 = 0x5341_5455;
const FLOWER_SALT: u64 = 0x524f_5345;
const FIREWORKS_SALT: u64 = 0x4241_4e47;
const SPHERE_SALT: u64 = 0x4f52_4221;
const SPIRAL_SALT: u64 = 0x5350_4952;

/// All built-in templates in menu order.
pub fn builtin_templates() -> Vec<ShapeTemplate> {
    vec![
        ShapeTemplate::new("heart", "Neon Heart", TemplateKind::Heart, heart),
        ShapeTemplate::new("saturn", "Saturn Rings", TemplateKind::Saturn, saturn),
        ShapeTemplate::new("flowers", "Cosmic Rose", TemplateKind::Flower, rose),
        ShapeTemplate::new("fireworks", "Big Bang", TemplateKind::Fireworks, big_bang),
        ShapeTemplate::new("sphere", "Glass Orb", TemplateKind::Sphere, sphere),
        ShapeTemplate::new("spiral", "Galaxy Spiral", TemplateKind::Spiral, spiral),
    ]
}

/// Look up a built-in template by id.
pub fn builtin(id: &str) -> Option<ShapeTemplate> {
    builtin_templates().into_iter().find(|t| t.id() == id)
}

/// Whether slot `index` of `total` belongs to the Saturn core population.
#[inline]
pub fn is_saturn_core(index: u32, total: u32) -> bool {
    index as f64 <= total as f64 * SATURN_CORE_FRACTION
}

/// Heart curve `x = 16 sin³t`, `y = 13 cos t − 5 cos 2t − 2 cos 3t − cos 4t`,
/// halved, with ±0.5 jitter in the plane and z spread over `[-2, 2)`.
pub fn heart(index: u32, total: u32) -> Vec3 {
    let mut ctx = SlotContext::new(index, total, HEART_SALT);
    let t = ctx.progress() * TAU;
    let x = 16.0 * t.sin().powi(3);
    let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
    let z = ctx.random_range(-2.0, 2.0);

    let scale = 0.5;
    Vec3::new(x * scale + ctx.jitter(0.5), y * scale + ctx.jitter(0.5), z)
}

/// Planet core plus ring. The ring winds ten times around the Y axis.
pub fn saturn(index: u32, total: u32) -> Vec3 {
    let mut ctx = SlotContext::new(index, total, SATURN_SALT);
    if is_saturn_core(index, total) {
        return ctx.random_on_sphere(SATURN_CORE_RADIUS);
    }

    let angle = ctx.progress() * PI * 20.0;
    let (inner, outer) = SATURN_RING_RADII;
    let radius = ctx.random_range(inner, outer);
    Vec3::new(
        angle.cos() * radius,
        ctx.jitter(SATURN_RING_HALF_THICKNESS),
        angle.sin() * radius,
    )
}

/// Rose `r = 10 cos 4θ` over six full turns, lifted linearly from z = -5 to 5.
pub fn rose(index: u32, total: u32) -> Vec3 {
    let mut ctx = SlotContext::new(index, total, FLOWER_SALT);
    let k = 4.0;
    let theta = ctx.progress() * PI * 12.0;
    let r = 10.0 * (k * theta).cos();
    let z = ctx.progress() * 10.0 - 5.0;
    Vec3::new(
        r * theta.cos() + ctx.jitter(0.5),
        r * theta.sin() + ctx.jitter(0.5),
        z,
    )
}

/// Uniform solid ball: `r = R·u^(1/3)`.
pub fn big_bang(index: u32, total: u32) -> Vec3 {
    SlotContext::new(index, total, FIREWORKS_SALT).random_in_sphere(FIREWORKS_RADIUS)
}

/// Points on a sphere surface.
pub fn sphere(index: u32, total: u32) -> Vec3 {
    SlotContext::new(index, total, SPHERE_SALT).random_on_sphere(SPHERE_RADIUS)
}

/// Helix with a little volume so it reads as a band rather than a wire.
pub fn spiral(index: u32, total: u32) -> Vec3 {
    let mut ctx = SlotContext::new(index, total, SPIRAL_SALT);
    let base = ctx.helix_position(8.0, 20.0, 6.0);
    base + Vec3::new(ctx.jitter(0.4), ctx.jitter(0.4), ctx.jitter(0.4))
}
