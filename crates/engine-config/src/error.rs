use thiserror::Error;

/// Errors raised while building or loading transfer settings.
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    /// Safety factor outside `(0, 1]`.
    #[error("Safety factor must be in (0, 1], got {0}")]
    InvalidSafetyFactor(f64),

    /// A page size setting was zero.
    #[error("{name} must be at least 1")]
    ZeroPageSize { name: &'static str },

    #[error("Minimum page size {min} exceeds maximum page size {max}")]
    PageSizeRange { min: usize, max: usize },

    #[error("Memory limit must be greater than zero")]
    ZeroMemoryLimit,

    #[error("Event buffer must hold at least one event")]
    ZeroEventBuffer,

    /// An environment value could not be parsed.
    #[error("Invalid value for {key}: '{value}' ({message})")]
    Parse {
        key: String,
        value: String,
        message: String,
    },
}
