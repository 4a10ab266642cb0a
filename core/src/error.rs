use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OfdmError {
    #[error("Transform length {0} is not a power of two")]
    InvalidLength(usize),

    #[error("Division by a complex value with near-zero magnitude")]
    DegenerateDivision,

    #[error("Parameter out of range: {0}")]
    ParameterOutOfRange(String),

    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, OfdmError>;
