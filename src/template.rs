//! Shape templates: named functions from particle slot to target position.

use crate::Vec3;
use std::fmt;
use std::sync::Arc;

/// Generator signature: `(slot_index, total) -> target`.
///
/// Must be callable for every `i` in `0..total` and return a finite point.
/// `total` is never zero.
pub type Generator = dyn Fn(u32, u32) -> Vec3 + Send + Sync;

/// Broad family a template belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Heart,
    Saturn,
    Flower,
    Fireworks,
    Sphere,
    Spiral,
    /// Compiled from coordinate expressions at runtime.
    Custom,
}

/// A named shape the particle field can morph into.
///
/// Templates are immutable; cloning shares the generator.
#[derive(Clone)]
pub struct ShapeTemplate {
    id: String,
    name: String,
    kind: TemplateKind,
    generator: Arc<Generator>,
}

impl ShapeTemplate {
    /// Create a template from a generator closure.
    pub fn new<F>(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: TemplateKind,
        generator: F,
    ) -> Self
    where
        F: Fn(u32, u32) -> Vec3 + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            generator: Arc::new(generator),
        }
    }

    /// Stable identifier (e.g. `"heart"`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name (e.g. `"Neon Heart"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Target position for slot `index` out of `total`.
    #[inline]
    pub fn generate(&self, index: u32, total: u32) -> Vec3 {
        (self.generator)(index, total)
    }
}

impl fmt::Debug for ShapeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeTemplate")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_generate() {
        let line = ShapeTemplate::new("line", "Line", TemplateKind::Custom, |i, total| {
            Vec3::new(i as f32 / total as f32, 0.0, 0.0)
        });
        assert_eq!(line.id(), "line");
        assert_eq!(line.kind(), TemplateKind::Custom);
        assert!((line.generate(5, 10).x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_template_clone_shares_generator() {
        let t = ShapeTemplate::new("c", "C", TemplateKind::Sphere, |_, _| Vec3::ONE);
        let copy = t.clone();
        assert!(Arc::ptr_eq(&t.generator, &copy.generator));
        assert_eq!(copy.generate(0, 1), Vec3::ONE);
    }
}
