//! Runtime configuration.
//!
//! Stored as JSON. Every field has a default, so a config file only needs the
//! values it changes:
//!
//! ```json
//! { "particle_count": 20000, "template": "saturn", "force": { "radius": 20.0 } }
//! ```

use crate::color::Rgb;
use crate::error::ConfigError;
use crate::force::ForceConfig;
use crate::shapes;
use crate::time::DEFAULT_MAX_DELTA;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Upper bound on the particle count accepted from configuration.
pub const MAX_PARTICLES: usize = 4_000_000;

/// Everything needed to build and display a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub particle_count: usize,
    /// Rate at which positions relax toward targets, per second.
    pub relaxation_rate: f32,
    /// Longest frame delta the integrator will accept, in seconds.
    pub max_delta: f32,
    /// Spin of the whole cloud about the vertical axis, radians per second.
    pub rotation_speed: f32,
    /// Id of the built-in template shown at startup.
    pub template: String,
    pub color: Rgb,
    /// Point sprite size in world units.
    pub point_size: f32,
    pub camera_distance: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub force: ForceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            particle_count: 8000,
            relaxation_rate: 3.0,
            max_delta: DEFAULT_MAX_DELTA,
            rotation_speed: 0.05,
            template: "heart".into(),
            color: Rgb::default(),
            point_size: 0.2,
            camera_distance: 30.0,
            fov_degrees: 75.0,
            force: ForceConfig::default(),
        }
    }
}

impl Config {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count > MAX_PARTICLES {
            return Err(ConfigError::InvalidValue {
                field: "particle_count",
                reason: format!("at most {MAX_PARTICLES} particles are supported"),
            });
        }
        let non_negative = [
            ("relaxation_rate", self.relaxation_rate),
            ("max_delta", self.max_delta),
            ("point_size", self.point_size),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be a non-negative number, got {value}"),
                });
            }
        }
        if !self.rotation_speed.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "rotation_speed",
                reason: "must be finite".into(),
            });
        }
        if !(self.camera_distance.is_finite() && self.camera_distance > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "camera_distance",
                reason: format!("must be positive, got {}", self.camera_distance),
            });
        }
        if !(self.fov_degrees > 1.0 && self.fov_degrees < 179.0) {
            return Err(ConfigError::InvalidValue {
                field: "fov_degrees",
                reason: format!("must be between 1 and 179, got {}", self.fov_degrees),
            });
        }
        if shapes::builtin(&self.template).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "template",
                reason: format!("no built-in template named '{}'", self.template),
            });
        }
        self.force.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.particle_count, 8000);
        assert_eq!(config.color.to_string(), "#60a5fa");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = Config::from_json(r##"{"template":"saturn","color":"#f472b6"}"##).unwrap();
        assert_eq!(config.template, "saturn");
        assert_eq!(config.color, Rgb::new(0xf4, 0x72, 0xb6));
        assert_eq!(config.relaxation_rate, 3.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Config::from_json(r#"{"template":"teapot"}"#),
            Err(ConfigError::InvalidValue { field: "template", .. })
        ));
        assert!(matches!(
            Config::from_json(r#"{"color":"blue"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(Config::from_json(r#"{"relaxation_rate":-1.0}"#).is_err());
        assert!(Config::from_json(r#"{"fov_degrees":0.0}"#).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("nebula-config-{}.json", std::process::id()));
        let config = Config {
            particle_count: 1234,
            template: "spiral".into(),
            ..Config::default()
        };
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
