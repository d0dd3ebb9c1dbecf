//! The simulation context: particle field, active template and hand forces.
//!
//! [`Simulation::step`] is the whole per-frame update. It is independent of
//! any window, so tests and benches drive it directly with a delta and a
//! hand snapshot.
//!
//! ```ignore
//! let mut sim = Simulation::new(&Config::default())?;
//! let flat = sim.step(1.0 / 60.0, &HandState::NONE);
//! assert_eq!(flat.len(), 3 * 8000);
//! ```

use crate::color::Rgb;
use crate::config::Config;
use crate::error::{ServiceError, SimulationError};
use crate::force::HandForceModel;
use crate::hand::HandState;
use crate::particles::ParticleField;
use crate::service::{ShapeResponse, ShapeService};
use crate::shapes;
use crate::template::ShapeTemplate;
use crate::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::f32::consts::TAU;
use tracing::{info, warn};

/// Move `position` a fraction `factor` of the way to `target`.
#[inline]
pub fn relax(position: Vec3, target: Vec3, factor: f32) -> Vec3 {
    position + (target - position) * factor
}

/// Owned simulation state. Created once, stepped every frame, dropped at exit.
#[derive(Debug)]
pub struct Simulation {
    field: ParticleField,
    forces: HandForceModel,
    rng: SmallRng,
    template: ShapeTemplate,
    color: Rgb,
    rotation: f32,
    rotation_speed: f32,
    relaxation_rate: f32,
}

impl Simulation {
    /// Allocate the field and apply the configured starting template.
    pub fn new(config: &Config) -> Result<Self, SimulationError> {
        let field = ParticleField::new(config.particle_count)?;
        Self::from_field(config, field, SmallRng::from_entropy())
    }

    /// Like [`new`](Self::new), with a reproducible initial cloud and jitter.
    pub fn with_seed(config: &Config, seed: u64) -> Result<Self, SimulationError> {
        let field = ParticleField::with_seed(config.particle_count, seed)?;
        Self::from_field(config, field, SmallRng::seed_from_u64(seed))
    }

    fn from_field(
        config: &Config,
        mut field: ParticleField,
        rng: SmallRng,
    ) -> Result<Self, SimulationError> {
        let template = shapes::builtin(&config.template)
            .ok_or_else(|| SimulationError::UnknownTemplate(config.template.clone()))?;
        field.retarget(&template);
        info!(
            particles = field.len(),
            template = template.name(),
            "Simulation ready"
        );
        Ok(Self {
            field,
            forces: HandForceModel::new(config.force),
            rng,
            template,
            color: config.color,
            rotation: 0.0,
            rotation_speed: config.rotation_speed,
            relaxation_rate: config.relaxation_rate,
        })
    }

    /// Advance one frame and return the packed positions.
    ///
    /// Each particle moves `min(1, rate * dt)` of the way toward its target
    /// after scale and hand forces are applied.
    pub fn step(&mut self, dt: f32, hands: &HandState) -> &[f32] {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let factor = (self.relaxation_rate * dt).min(1.0);
        self.rotation = (self.rotation + self.rotation_speed * dt).rem_euclid(TAU);

        let frame = self.forces.prepare(hands);
        let (positions, targets) = self.field.slots_mut();
        if frame.is_idle() {
            for (p, t) in positions.iter_mut().zip(targets) {
                *p = relax(*p, *t, factor);
            }
        } else {
            for (p, t) in positions.iter_mut().zip(targets) {
                let target = self.forces.effective_target(&frame, *t, *p, &mut self.rng);
                *p = relax(*p, target, factor);
            }
        }
        self.field.as_flat()
    }

    /// Make `template` the active shape and regenerate all targets.
    pub fn set_template(&mut self, template: ShapeTemplate) {
        info!(id = template.id(), name = template.name(), "Switching template");
        self.field.retarget(&template);
        self.template = template;
    }

    /// Switch to a built-in template by id.
    pub fn select_builtin(&mut self, id: &str) -> Result<(), SimulationError> {
        let template = shapes::builtin(id)
            .ok_or_else(|| SimulationError::UnknownTemplate(id.to_string()))?;
        self.set_template(template);
        Ok(())
    }

    /// Install the shape from a service response.
    ///
    /// Returns `true` if a new template was applied. On failure the active
    /// template stays as it was.
    pub fn apply_shape_result(&mut self, result: Result<ShapeResponse, ServiceError>) -> bool {
        match result {
            Ok(response) => {
                self.set_template(response.to_template());
                true
            }
            Err(e) => {
                warn!(error = %e, "No new shape from service; keeping current template");
                false
            }
        }
    }

    /// Ask `service` for a shape matching `prompt` and install it.
    pub fn request_shape(&mut self, service: &dyn ShapeService, prompt: &str) -> bool {
        info!(prompt, "Requesting shape");
        self.apply_shape_result(service.generate(prompt))
    }

    pub fn template(&self) -> &ShapeTemplate {
        &self.template
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn positions(&self) -> &[Vec3] {
        self.field.positions()
    }

    /// Current spin about the vertical axis, in radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.color = color;
    }

    /// Step to the next palette color and return it.
    pub fn cycle_color(&mut self) -> Rgb {
        self.color = self.color.next_preset();
        self.color
    }

    pub fn forces(&self) -> &HandForceModel {
        &self.forces
    }
}
