//! Contract with the external text-to-shape collaborator.
//!
//! A free-form prompt goes out; three coordinate expressions and a display
//! name come back as JSON, or nothing does. The service itself lives outside
//! this crate. [`ResponseFile`] replays a saved response so a shape can be
//! loaded without network access.

use crate::compiler::{self, ShapeExpressions};
use crate::error::ServiceError;
use crate::template::ShapeTemplate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name used when the service does not supply one.
pub const DEFAULT_SHAPE_NAME: &str = "AI Shape";

/// Shape descriptor returned by the service.
///
/// ```json
/// { "x": "10 * cos(TAU * u)", "y": "v * 4 - 2", "z": "10 * sin(TAU * u)", "name": "Halo" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeResponse {
    pub x: String,
    pub y: String,
    pub z: String,
    #[serde(default, alias = "description")]
    pub name: Option<String>,
}

impl ShapeResponse {
    /// Parse and validate a JSON response body.
    pub fn from_json(text: &str) -> Result<Self, ServiceError> {
        let response: ShapeResponse = serde_json::from_str(text)?;
        response.validate()?;
        Ok(response)
    }

    /// Read a saved response from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<(), ServiceError> {
        for (axis, src) in [("x", &self.x), ("y", &self.y), ("z", &self.z)] {
            if src.trim().is_empty() {
                return Err(ServiceError::MissingExpression(axis));
            }
        }
        Ok(())
    }

    /// Display name, falling back to [`DEFAULT_SHAPE_NAME`].
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_SHAPE_NAME,
        }
    }

    pub fn expressions(&self) -> ShapeExpressions {
        ShapeExpressions::new(self.x.as_str(), self.y.as_str(), self.z.as_str())
    }

    /// Compile into a template. Never fails; see [`compiler::compile`].
    pub fn to_template(&self) -> ShapeTemplate {
        compiler::compile(self.display_name(), &self.expressions())
    }
}

/// Anything that can turn a prompt into a shape descriptor.
pub trait ShapeService {
    fn generate(&self, prompt: &str) -> Result<ShapeResponse, ServiceError>;
}

/// Serves a response saved to a JSON file, whatever the prompt.
#[derive(Debug, Clone)]
pub struct ResponseFile {
    path: PathBuf,
}

impl ResponseFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ShapeService for ResponseFile {
    fn generate(&self, _prompt: &str) -> Result<ShapeResponse, ServiceError> {
        if !self.path.exists() {
            return Err(ServiceError::Unavailable(format!(
                "{} does not exist",
                self.path.display()
            )));
        }
        ShapeResponse::load(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let r = ShapeResponse::from_json(r#"{"x":"u","y":"v","z":"0","name":"Sheet"}"#).unwrap();
        assert_eq!(r.display_name(), "Sheet");
        assert_eq!(r.expressions(), ShapeExpressions::new("u", "v", "0"));
    }

    #[test]
    fn test_missing_name_defaults() {
        let r = ShapeResponse::from_json(r#"{"x":"1","y":"1","z":"1"}"#).unwrap();
        assert_eq!(r.display_name(), DEFAULT_SHAPE_NAME);

        let r = ShapeResponse::from_json(r#"{"x":"1","y":"1","z":"1","description":"Cube"}"#);
        let r = r.unwrap();
        assert_eq!(r.display_name(), "Cube");
    }

    #[test]
    fn test_malformed_responses() {
        assert!(matches!(
            ShapeResponse::from_json("not json"),
            Err(ServiceError::Malformed(_))
        ));
        assert!(matches!(
            ShapeResponse::from_json(r#"{"x":"1","y":"1"}"#),
            Err(ServiceError::Malformed(_))
        ));
        assert!(matches!(
            ShapeResponse::from_json(r#"{"x":"1","y":" ","z":"1"}"#),
            Err(ServiceError::MissingExpression("y"))
        ));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let service = ResponseFile::new("/nonexistent/nebula/shape.json");
        assert!(matches!(
            service.generate("a cat"),
            Err(ServiceError::Unavailable(_))
        ));
    }
}
