use crate::cost_function::FirstOrderSagCostFunction;
use gradkit_core::{GradKitError, Vector};

/// Settings for [`SagMinimizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SagConfig {
    /// Step size.
    pub learning_rate: f64,
    /// Maximum number of sweeps over the samples.
    pub num_passes: usize,
    /// Stop once a pass improves the cost by less than this. `0.0` never stops early.
    pub tolerance: f64,
}

impl Default for SagConfig {
    fn default() -> Self {
        SagConfig {
            learning_rate: 0.01,
            num_passes: 10,
            tolerance: 0.0,
        }
    }
}

impl SagConfig {
    pub fn validate(&self) -> Result<(), GradKitError> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(GradKitError::InvalidArgument(format!(
                "learning rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        if self.num_passes == 0 {
            return Err(GradKitError::InvalidArgument(
                "number of passes must be greater than 0".to_string(),
            ));
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(GradKitError::InvalidArgument(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Stochastic average gradient descent.
///
/// Remembers the last gradient seen for every sample and steps along the
/// average of those, updating one sample's entry at a time:
/// `w <- w - lr * sum / seen`, where `seen` counts the samples visited so far.
#[derive(Debug)]
pub struct SagMinimizer {
    config: SagConfig,
    passes_run: usize,
}

impl SagMinimizer {
    /// # Errors
    /// `InvalidArgument` if `config` does not validate.
    pub fn new(config: SagConfig) -> Result<Self, GradKitError> {
        config.validate()?;
        Ok(SagMinimizer {
            config,
            passes_run: 0,
        })
    }

    pub fn config(&self) -> &SagConfig {
        &self.config
    }

    /// Passes completed by the last call to [`SagMinimizer::minimize`].
    pub fn passes_run(&self) -> usize {
        self.passes_run
    }

    /// Minimizes `fun` in place and returns the final cost.
    ///
    /// The parameters of `fun` are left at the last iterate, also on error.
    pub fn minimize<F: FirstOrderSagCostFunction>(
        &mut self,
        fun: &mut F,
    ) -> Result<f64, GradKitError> {
        self.passes_run = 0;
        let n = fun.get_sample_size();
        if n == 0 {
            return Err(GradKitError::InvalidArgument(
                "cannot minimize a cost function without samples".to_string(),
            ));
        }

        let mut w = fun.parameter_values();
        let p = w.len();
        let mut stored: Vec<Option<Vector>> = vec![None; n];
        let mut sum = Vector::zeros(p);
        let mut seen = 0usize;

        let mut cost = fun.get_cost()?;
        log::debug!(
            "SAG start: {} samples, {} parameters, cost {}",
            n,
            p,
            cost
        );

        for pass in 0..self.config.num_passes {
            fun.begin_sample();
            let mut index = 0usize;
            while fun.next_sample() {
                if index >= n {
                    return Err(GradKitError::InternalError(format!(
                        "cost function yielded more than {} samples in one pass",
                        n
                    )));
                }
                let gradient = fun.get_gradient()?;
                if gradient.len() != p {
                    return Err(GradKitError::ShapeMismatch {
                        expected: format!("[{}]", p),
                        actual: format!("[{}]", gradient.len()),
                        operation: "SagMinimizer::minimize".to_string(),
                    });
                }

                match stored[index].replace(gradient) {
                    Some(previous) => sum -= &previous,
                    None => seen += 1,
                }
                if let Some(current) = &stored[index] {
                    sum += current;
                }

                w.scaled_add(-self.config.learning_rate / seen as f64, &sum);
                fun.set_parameter_values(&w)?;
                index += 1;
            }

            let previous_cost = cost;
            cost = fun.get_cost()?;
            self.passes_run = pass + 1;
            log::info!(
                "SAG pass {}/{}: cost {}",
                pass + 1,
                self.config.num_passes,
                cost
            );
            if !cost.is_finite() {
                log::warn!("SAG cost diverged to {} after pass {}", cost, pass + 1);
                break;
            }
            if (previous_cost - cost).abs() < self.config.tolerance {
                log::debug!(
                    "SAG converged after {} passes, improvement below {}",
                    pass + 1,
                    self.config.tolerance
                );
                break;
            }
        }
        Ok(cost)
    }
}

#[cfg(test)]
#[path = "sag_minimizer_test.rs"]
mod tests;
