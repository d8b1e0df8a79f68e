//! Reverse-mode automatic differentiation on scalars.
//!
//! Operations on [`Var`]s are recorded on a [`Tape`] (a Wengert list) and
//! replayed in reverse by [`Tape::backward`] to accumulate adjoints.

pub mod grad_check;
pub mod tape;
pub mod var;

pub use tape::{Checkpoint, Tape};
pub use var::Var;
