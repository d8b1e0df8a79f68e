use crate::autograd::{Tape, Var};
use crate::error::GradKitError;
use thiserror::Error;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for input {input_index}: Analytical grad {analytical_grad:?} != Numerical grad {numerical_grad:?}. Difference: {difference:?}")]
    GradientMismatch {
        input_index: usize,
        analytical_grad: f64,
        numerical_grad: f64,
        difference: f64,
    },
    #[error("Numerical gradient is NaN or infinite for input {input_index}. Details: Loss+: {loss_plus:?}, Loss-: {loss_minus:?}")]
    NumericalGradNaNOrInfinite {
        input_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },
    #[error("Analytical gradient is NaN or infinite for input {input_index}. Value: {value:?}")]
    AnalyticalGradNaNOrInfinite { input_index: usize, value: f64 },
    #[error("Gradient check needs at least one input")]
    NoInputs,
    #[error("Tape error during gradient check: {0}")]
    TapeError(GradKitError),
}

impl From<GradKitError> for GradCheckError {
    fn from(err: GradKitError) -> Self {
        GradCheckError::TapeError(err)
    }
}

/// Records `func` on a fresh tape at `inputs` and returns its value and the
/// gradient w.r.t. every input.
pub fn value_and_grad<F>(func: F, inputs: &[f64]) -> Result<(f64, Vec<f64>), GradKitError>
where
    F: Fn(&[Var]) -> Var,
{
    let tape = Tape::new();
    let vars: Vec<Var> = inputs.iter().map(|&x| tape.var(x)).collect();
    let output = func(&vars);
    output.backward()?;
    let grads = vars.iter().map(Var::adjoint).collect();
    Ok((output.value(), grads))
}

/// Checks analytical gradients against central finite differences.
///
/// An input passes when either the absolute or the relative difference is
/// within `tolerance`.
pub fn check_grad<F>(
    func: F,
    inputs: &[f64],
    epsilon: f64,
    tolerance: f64,
) -> Result<(), GradCheckError>
where
    F: Fn(&[Var]) -> Var,
{
    if inputs.is_empty() {
        return Err(GradCheckError::NoInputs);
    }

    let (_, analytical) = value_and_grad(&func, inputs)?;
    let eval_at = |point: &[f64]| -> f64 {
        let tape = Tape::new();
        let vars: Vec<Var> = point.iter().map(|&x| tape.var(x)).collect();
        func(&vars).value()
    };

    let mut perturbed = inputs.to_vec();
    for (i, &analytical_grad) in analytical.iter().enumerate() {
        if !analytical_grad.is_finite() {
            return Err(GradCheckError::AnalyticalGradNaNOrInfinite {
                input_index: i,
                value: analytical_grad,
            });
        }

        let original = perturbed[i];
        perturbed[i] = original + epsilon;
        let loss_plus = eval_at(&perturbed);
        perturbed[i] = original - epsilon;
        let loss_minus = eval_at(&perturbed);
        perturbed[i] = original;

        let numerical_grad = (loss_plus - loss_minus) / (2.0 * epsilon);
        if !numerical_grad.is_finite() {
            return Err(GradCheckError::NumericalGradNaNOrInfinite {
                input_index: i,
                loss_plus,
                loss_minus,
            });
        }

        let difference = (analytical_grad - numerical_grad).abs();
        if difference > tolerance && (difference / (analytical_grad.abs() + epsilon)) > tolerance {
            return Err(GradCheckError::GradientMismatch {
                input_index: i,
                analytical_grad,
                numerical_grad,
                difference,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "grad_check_test.rs"]
mod tests;
