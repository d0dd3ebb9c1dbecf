//! # Nebula - hand-driven particle shapes
//!
//! A cloud of particles that morphs between parametric 3D shapes and reacts
//! to up to two tracked hands: pinch to pull particles in, open a hand to
//! push them away and stir them, spread both hands to scale the whole shape.
//!
//! ## Quick Start
//!
//! ```ignore
//! use nebula::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     let config = Config::default();
//!     let simulation = Simulation::new(&config)?;
//!     nebula::run(config, simulation, HandInput::Pointer)
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Templates
//!
//! A [`ShapeTemplate`] maps a particle slot `(i, total)` to a target point.
//! Built-in shapes live in [`shapes`]; runtime shapes are compiled from three
//! coordinate expressions by [`compiler::compile`]:
//!
//! ```ignore
//! let halo = compile("Halo", &ShapeExpressions::new(
//!     "12 * cos(TAU * u)",
//!     "v - 0.5",
//!     "12 * sin(TAU * u)",
//! ));
//! simulation.set_template(halo);
//! ```
//!
//! Expressions run in a small sandboxed interpreter ([`expr`]): arithmetic,
//! comparisons, the ternary, a fixed math function set, and the variables
//! `i`, `total`, `u = i / total` and a per-slot random `v`.
//!
//! ### Hands
//!
//! Trackers implement [`HandSource`] and publish [`HandState`] snapshots from
//! their own thread. Without a tracker the pointer stands in for the hands
//! (see [`input`]).
//!
//! ### Stepping
//!
//! [`Simulation::step`] relaxes every particle toward its hand-adjusted
//! target and returns the packed positions. It needs no window:
//!
//! ```ignore
//! let mut sim = Simulation::with_seed(&config, 7)?;
//! for _ in 0..60 {
//!     sim.step(1.0 / 60.0, &HandState::NONE);
//! }
//! ```
//!
//! ## Built-in Templates
//!
//! | Id | Name | Geometry |
//! |----|------|----------|
//! | `heart` | Neon Heart | Heart curve with volumetric jitter |
//! | `saturn` | Saturn Rings | Core sphere plus a flat ring |
//! | `flowers` | Cosmic Rose | Four-petal rose swept along z |
//! | `fireworks` | Big Bang | Uniform solid ball |
//! | `sphere` | Glass Orb | Sphere surface |
//! | `spiral` | Galaxy Spiral | Helix |

pub mod color;
pub mod compiler;
pub mod config;
pub mod error;
pub mod expr;
pub mod force;
mod gpu;
pub mod hand;
pub mod input;
pub mod particles;
pub mod service;
pub mod shapes;
pub mod simulation;
pub mod spawn;
pub mod template;
pub mod time;
mod window;

pub use glam::{Vec2, Vec3};

pub use color::{Rgb, PALETTE};
pub use compiler::{compile, try_compile, ShapeExpressions};
pub use config::Config;
pub use error::{CompileError, ConfigError, ExprError, GpuError, ServiceError, SimulationError};
pub use force::{ForceConfig, HandForceModel};
pub use hand::{
    spawn_hand_source, HandFeed, HandInfo, HandSource, HandState, OrbitHands, ReplayHands,
};
pub use particles::ParticleField;
pub use service::{ResponseFile, ShapeResponse, ShapeService};
pub use shapes::builtin_templates;
pub use simulation::Simulation;
pub use template::{ShapeTemplate, TemplateKind};
pub use time::FrameClock;
pub use window::{run, HandInput};

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::compiler::{compile, ShapeExpressions};
    pub use crate::config::Config;
    pub use crate::error::SimulationError;
    pub use crate::hand::{spawn_hand_source, HandInfo, HandSource, HandState};
    pub use crate::shapes::builtin_templates;
    pub use crate::simulation::Simulation;
    pub use crate::template::{ShapeTemplate, TemplateKind};
    pub use crate::window::{run, HandInput};
    pub use crate::{Vec2, Vec3};
}
