use gradkit_core::{GradKitError, Vector};

/// A differentiable objective over a vector of parameters.
pub trait FirstOrderCostFunction {
    /// Value of the objective at the current parameters.
    fn get_cost(&self) -> Result<f64, GradKitError>;

    /// Gradient of the objective w.r.t. the parameters.
    ///
    /// The returned vector is an independent copy.
    fn get_gradient(&self) -> Result<Vector, GradKitError>;

    /// Current parameter values.
    fn parameter_values(&self) -> Vector;

    /// Moves the parameters to `values`.
    fn set_parameter_values(&mut self, values: &Vector) -> Result<(), GradKitError>;
}

/// A cost function whose gradient is taken one sample at a time.
///
/// Callers drive it as `begin_sample()`, then alternate `get_gradient()` and
/// `next_sample()` until `next_sample()` returns `false`.
pub trait FirstOrderStochasticCostFunction: FirstOrderCostFunction {
    /// Resets the sample cursor to the start of a sweep.
    fn begin_sample(&mut self);

    /// Advances the cursor; returns `false` once the samples are exhausted.
    fn next_sample(&mut self) -> bool;
}

/// Stochastic cost function exposing what stochastic average gradient
/// methods need on top of per-sample gradients.
pub trait FirstOrderSagCostFunction: FirstOrderStochasticCostFunction {
    /// Number of samples in the training data.
    fn get_sample_size(&self) -> usize;

    /// Mean of the per-sample gradients over the whole training set.
    ///
    /// Leaves the sample cursor where it was.
    fn get_average_gradient(&mut self) -> Result<Vector, GradKitError>;
}
