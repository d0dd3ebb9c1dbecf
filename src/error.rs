//! Error types for Nebula.
//!
//! Each fallible concern gets its own enum: expression compilation, the
//! text-to-shape service, configuration loading, GPU initialization, and
//! running the simulation window.

use thiserror::Error;

/// Errors produced while tokenizing or parsing a coordinate expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// The expression was empty or only whitespace.
    #[error("empty expression")]
    Empty,

    /// The expression exceeds the accepted source length.
    #[error("expression is {len} bytes, limit is {limit}")]
    TooLong { len: usize, limit: usize },

    /// A character that cannot start any token.
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    /// A numeric literal that does not parse as a float.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// The parser found a token it did not expect.
    #[error("unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        offset: usize,
    },

    /// Input ended in the middle of an expression.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A name that is not one of the bound variables or constants.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// A call to a function outside the math function set.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// A known function called with the wrong number of arguments.
    #[error("function '{name}' takes {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Parentheses or ternaries nested deeper than the parser allows.
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Result type for expression parsing.
pub type ExprResult<T> = std::result::Result<T, ExprError>;

/// One of a shape's three coordinate expressions failed to parse.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{axis} expression: {source}")]
pub struct CompileError {
    /// `'x'`, `'y'` or `'z'`.
    pub axis: char,
    pub source: ExprError,
}

/// Errors from the external text-to-shape collaborator.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service could not be reached or is not configured.
    #[error("shape service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with something that is not a shape descriptor.
    #[error("malformed shape response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The descriptor parsed but one of its expressions is empty.
    #[error("shape response is missing the '{0}' expression")]
    MissingExpression(&'static str),

    /// Reading a saved response from disk failed.
    #[error("failed to read shape response: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid configuration JSON.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A color string is not `#rrggbb`.
    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),

    /// A value is outside its accepted range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found (Vulkan, Metal, DX12 or WebGPU required)")]
    NoAdapter,

    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),

    /// The surface reports no usable texture format.
    #[error("surface exposes no supported texture format")]
    NoSurfaceFormat,
}

/// Errors that can occur when building or running a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The particle buffers could not be allocated.
    #[error("failed to allocate buffers for {count} particles")]
    Allocation { count: usize },

    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),

    /// The requested initial template does not exist.
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_error_display() {
        let err = ExprError::UnknownVariable("w".into());
        assert_eq!(format!("{err}"), "unknown variable 'w'");

        let err = ExprError::Arity {
            name: "atan2".into(),
            expected: 2,
            got: 1,
        };
        assert!(format!("{err}").contains("atan2"));
    }

    #[test]
    fn test_simulation_error_display() {
        let err = SimulationError::Allocation { count: 42 };
        assert!(format!("{err}").contains("42"));

        let err = SimulationError::from(GpuError::NoAdapter);
        assert!(format!("{err}").starts_with("GPU error"));
    }
}
