use crate::autograd::{Tape, Var};
use crate::error::GradKitError;
use crate::types::Vector;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::cell::RefCell;
use std::rc::Rc;

/// Parameter vector shared between a cost function, the closures that build
/// its expressions and the optimizer updating it.
pub type SharedParameters = Rc<RefCell<ParameterVector>>;

/// The trainable variables of a model: leaf vars on a single tape.
///
/// Updating values goes through [`ParameterVector::set_values`], which writes
/// the leaves in place so that every clone of these vars sees the new point.
#[derive(Debug, Clone)]
pub struct ParameterVector {
    tape: Tape,
    vars: Vec<Var>,
}

impl ParameterVector {
    /// Records one leaf per entry of `values` on `tape`.
    pub fn new(tape: &Tape, values: &[f64]) -> Self {
        let vars = values.iter().map(|&v| tape.var(v)).collect();
        ParameterVector {
            tape: tape.clone(),
            vars,
        }
    }

    /// `len` parameters, all zero.
    pub fn zeros(tape: &Tape, len: usize) -> Self {
        Self::new(tape, &vec![0.0; len])
    }

    /// `len` parameters drawn from `N(0, std^2)`.
    ///
    /// # Errors
    /// `InvalidArgument` if `std` is negative or NaN.
    pub fn randn<R: Rng + ?Sized>(
        tape: &Tape,
        len: usize,
        std: f64,
        rng: &mut R,
    ) -> Result<Self, GradKitError> {
        let normal = Normal::new(0.0, std).map_err(|e| {
            GradKitError::InvalidArgument(format!("invalid standard deviation {}: {}", std, e))
        })?;
        let values: Vec<f64> = (0..len).map(|_| normal.sample(rng)).collect();
        Ok(Self::new(tape, &values))
    }

    /// Wraps the vector for sharing.
    pub fn shared(self) -> SharedParameters {
        Rc::new(RefCell::new(self))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// The tape every parameter is recorded on.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn get(&self, index: usize) -> Option<&Var> {
        self.vars.get(index)
    }

    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Var> {
        self.vars.iter()
    }

    /// Current values, copied out.
    pub fn values(&self) -> Vector {
        self.vars.iter().map(Var::value).collect()
    }

    /// Writes new values into the parameter leaves.
    ///
    /// # Errors
    /// `ShapeMismatch` if `values` does not have one entry per parameter.
    pub fn set_values(&self, values: &Vector) -> Result<(), GradKitError> {
        if values.len() != self.vars.len() {
            return Err(GradKitError::ShapeMismatch {
                expected: format!("[{}]", self.vars.len()),
                actual: format!("[{}]", values.len()),
                operation: "ParameterVector::set_values".to_string(),
            });
        }
        for (var, &value) in self.vars.iter().zip(values.iter()) {
            self.tape.set_value(var.index(), value)?;
        }
        Ok(())
    }

    /// Adjoint of each parameter after the last backward pass, copied out.
    pub fn adjoints(&self) -> Vector {
        self.vars.iter().map(Var::adjoint).collect()
    }
}

impl<'a> IntoIterator for &'a ParameterVector {
    type Item = &'a Var;
    type IntoIter = std::slice::Iter<'a, Var>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.iter()
    }
}

#[cfg(test)]
#[path = "parameter_test.rs"]
mod tests;
