//! Turns coordinate expressions into shape templates.
//!
//! ```ignore
//! let exprs = ShapeExpressions::new(
//!     "10 * sin(acos(2*v - 1)) * cos(TAU * u)",
//!     "10 * sin(acos(2*v - 1)) * sin(TAU * u)",
//!     "10 * cos(acos(2*v - 1))",
//! );
//! let orb = compile("Orb", &exprs);
//! ```
//!
//! [`compile`] never fails: a descriptor that does not parse, or a slot whose
//! evaluation is not finite, yields the origin. Each template logs its first
//! failure and stays quiet afterwards.

use crate::error::CompileError;
use crate::expr::{Bindings, Expr};
use crate::template::{ShapeTemplate, TemplateKind};
use crate::Vec3;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;
use tracing::warn;

static CUSTOM_IDS: AtomicU64 = AtomicU64::new(1);

/// Source text for the three coordinates of a runtime shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeExpressions {
    pub x: String,
    pub y: String,
    pub z: String,
}

impl ShapeExpressions {
    pub fn new(x: impl Into<String>, y: impl Into<String>, z: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            z: z.into(),
        }
    }
}

/// Per-slot pseudo-random value `v` in `[0, 1)`.
///
/// `fract(|sin(i · 12.9898) · 43758.5453|)`; the same index always maps to
/// the same value.
pub fn slot_noise(index: u32) -> f64 {
    ((index as f64 * 12.9898).sin() * 43758.5453).abs().fract()
}

/// Variable bindings for slot `index` of `total`.
pub fn bindings(index: u32, total: u32) -> Bindings {
    let i = index as f64;
    let total = total as f64;
    Bindings {
        i,
        total,
        u: if total > 0.0 { i / total } else { 0.0 },
        v: slot_noise(index),
    }
}

/// Three parsed coordinate expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledShape {
    x: Expr,
    y: Expr,
    z: Expr,
}

impl CompiledShape {
    /// Parse all three expressions, reporting the first axis that fails.
    pub fn parse(exprs: &ShapeExpressions) -> Result<Self, CompileError> {
        let axis = |axis: char, src: &str| {
            Expr::parse(src).map_err(|source| CompileError { axis, source })
        };
        Ok(Self {
            x: axis('x', &exprs.x)?,
            y: axis('y', &exprs.y)?,
            z: axis('z', &exprs.z)?,
        })
    }

    /// Evaluate for one slot. `None` if any coordinate is not finite in `f32`.
    pub fn evaluate(&self, index: u32, total: u32) -> Option<Vec3> {
        let b = bindings(index, total);
        let p = Vec3::new(
            self.x.eval(&b) as f32,
            self.y.eval(&b) as f32,
            self.z.eval(&b) as f32,
        );
        p.is_finite().then_some(p)
    }
}

fn next_custom_id() -> String {
    format!("custom-{}", CUSTOM_IDS.fetch_add(1, Ordering::Relaxed))
}

/// Compile expressions into a template, rejecting descriptors that do not parse.
pub fn try_compile(name: &str, exprs: &ShapeExpressions) -> Result<ShapeTemplate, CompileError> {
    let shape = CompiledShape::parse(exprs)?;
    let label = name.to_string();
    let reported = Once::new();

    Ok(ShapeTemplate::new(
        next_custom_id(),
        name,
        TemplateKind::Custom,
        move |i, total| {
            shape.evaluate(i, total).unwrap_or_else(|| {
                reported.call_once(|| {
                    warn!(
                        shape = %label,
                        slot = i,
                        "Shape expression produced a non-finite coordinate; using origin"
                    );
                });
                Vec3::ZERO
            })
        },
    ))
}

/// Compile expressions into a template that never fails.
///
/// A descriptor that does not parse becomes a template that places every
/// slot at the origin.
pub fn compile(name: &str, exprs: &ShapeExpressions) -> ShapeTemplate {
    match try_compile(name, exprs) {
        Ok(template) => template,
        Err(err) => {
            warn!(
                shape = %name,
                error = %err,
                "Shape expression rejected; all slots fall back to origin"
            );
            ShapeTemplate::new(next_custom_id(), name, TemplateKind::Custom, |_, _| Vec3::ZERO)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExprError;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Counts `WARN` events seen while installed.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_constant_shape() {
        let t = compile("Dot", &ShapeExpressions::new("1", "2", "3"));
        for i in 0..100 {
            assert_eq!(t.generate(i, 100), Vec3::new(1.0, 2.0, 3.0));
        }
        assert_eq!(t.kind(), TemplateKind::Custom);
        assert_eq!(t.name(), "Dot");
    }

    #[test]
    fn test_undefined_variable_falls_back_to_origin() {
        let t = compile("Bad", &ShapeExpressions::new("w * 2", "1", "1"));
        assert_eq!(t.generate(0, 10), Vec3::ZERO);
        assert_eq!(t.generate(9, 10), Vec3::ZERO);
    }

    #[test]
    fn test_try_compile_reports_axis() {
        let err = try_compile("Bad", &ShapeExpressions::new("1", "2", "sin(")).unwrap_err();
        assert_eq!(err.axis, 'z');
        assert_eq!(err.source, ExprError::UnexpectedEnd);
    }

    #[test]
    fn test_non_finite_slot_falls_back() {
        // 1/(i-5) blows up only at slot 5.
        let t = compile("Spike", &ShapeExpressions::new("1 / (i - 5)", "0", "0"));
        assert_eq!(t.generate(5, 10), Vec3::ZERO);
        assert!((t.generate(6, 10).x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_slot_noise_reproducible() {
        for i in [0, 1, 17, 4_000, 7_999] {
            let v = slot_noise(i);
            assert_eq!(v, slot_noise(i));
            assert!((0.0..1.0).contains(&v));
        }
        assert_ne!(slot_noise(1), slot_noise(2));
    }

    #[test]
    fn test_bindings() {
        let b = bindings(25, 100);
        assert_eq!(b.i, 25.0);
        assert_eq!(b.total, 100.0);
        assert!((b.u - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_expressions() {
        let exprs = ShapeExpressions::new(
            "10 * Math.sin(Math.acos(2*v - 1)) * Math.cos(2 * Math.PI * u)",
            "10 * Math.sin(Math.acos(2*v - 1)) * Math.sin(2 * Math.PI * u)",
            "10 * Math.cos(Math.acos(2*v - 1))",
        );
        let t = try_compile("Orb", &exprs).unwrap();
        for i in 0..500 {
            assert!((t.generate(i, 500).length() - 10.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_failures_warn_once_per_template() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let infinite = compile("Infinite", &ShapeExpressions::new("1 / 0", "0", "0"));
            for i in 0..50 {
                assert_eq!(infinite.generate(i, 50), Vec3::ZERO);
            }
            assert_eq!(warnings.load(Ordering::SeqCst), 1);

            // Regenerating the same template stays quiet.
            for i in 0..50 {
                infinite.generate(i, 50);
            }
            assert_eq!(warnings.load(Ordering::SeqCst), 1);

            // A fresh template reports its own first failure.
            let other = compile("Other", &ShapeExpressions::new("0", "0 / 0", "0"));
            other.generate(0, 2);
            other.generate(1, 2);
            assert_eq!(warnings.load(Ordering::SeqCst), 2);

            // Unparseable input warns at compile time, never per slot.
            let broken = compile("Broken", &ShapeExpressions::new("q + 1", "0", "0"));
            assert_eq!(warnings.load(Ordering::SeqCst), 3);
            for i in 0..50 {
                assert_eq!(broken.generate(i, 50), Vec3::ZERO);
            }
        });

        assert_eq!(warnings.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_custom_ids_unique() {
        let a = compile("a", &ShapeExpressions::new("0", "0", "0"));
        let b = compile("b", &ShapeExpressions::new("0", "0", "0"));
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with("custom-"));
    }
}
