// Core crate: differentiation tape, trainable parameters and shared types.
pub mod autograd;
pub mod error;
pub mod parameter;
pub mod types;
pub mod utils;

pub use autograd::{Tape, Var};
pub use error::GradKitError;
pub use parameter::{ParameterVector, SharedParameters};
pub use types::{Matrix, Vector};

// Re-export so downstream crates build matrices with the same ndarray version.
pub use ndarray;
