use thiserror::Error;

/// Custom error type for the gradkit toolkit.
#[derive(Error, Debug, PartialEq, Clone)] // PartialEq for easier testing
pub enum GradKitError {
    /// A precondition on an argument was violated (empty data, missing
    /// collaborator, zero parameters, zero samples...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A sample cursor or cost-table index fell outside `0..len`. A cursor
    /// that has not reached its first sample reports index `-1`.
    #[error("Sample index {index} out of range for {len} samples")]
    OutOfRange { index: i64, len: usize },

    #[error("Index out of bounds: index {index:?} for shape {shape:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
    },

    #[error("Shape mismatch: expected {expected}, got {actual} during operation {operation}")]
    ShapeMismatch {
        expected: String,
        actual: String,
        operation: String,
    },

    #[error("Creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

// std::io::Error is neither Clone nor PartialEq, keep the message only.
impl From<std::io::Error> for GradKitError {
    fn from(err: std::io::Error) -> Self {
        GradKitError::Io(err.to_string())
    }
}
