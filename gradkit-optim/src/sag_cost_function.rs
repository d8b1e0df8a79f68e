use crate::cost_function::{
    FirstOrderCostFunction, FirstOrderSagCostFunction, FirstOrderStochasticCostFunction,
};
use gradkit_core::{GradKitError, Matrix, SharedParameters, Var, Vector};
use std::fmt;
use std::rc::Rc;

/// Cost of one sample as an expression of the trainable parameters.
///
/// Entry `i` of a [`CostTable`] is called with `i`.
pub type SampleCost = Box<dyn Fn(usize) -> Var>;

/// Per-sample costs, indexed by sample.
pub type CostTable = Vec<SampleCost>;

/// Reduces the per-sample costs of the whole training set to one scalar.
pub type TotalCost = dyn Fn(&[Var]) -> Var;

/// Position of the sample cursor.
///
/// A sweep starts in `BeforeFirst`: the first `next_sample()` lands on
/// sample 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleCursor {
    /// No sweep started yet. Behaves like `BeforeFirst`.
    #[default]
    Uninitialized,
    BeforeFirst,
    At(usize),
    /// Advanced past the last sample.
    Exhausted,
}

/// SAG cost function whose per-sample costs are recorded on a
/// differentiation tape.
///
/// The training matrices store one sample per column. The trainable
/// parameters, the per-sample cost table and the total-cost reducer are
/// shared handles: the cost closures typically capture the same
/// [`SharedParameters`] that is handed to this adapter, and an optimizer
/// moves them through [`FirstOrderCostFunction::set_parameter_values`].
///
/// Every evaluation rewinds the parameters' tape to where it started, so
/// the tape only ever holds the parameter leaves between calls.
pub struct AutodiffSagCostFunction {
    x: Matrix,
    y: Matrix,
    trainable_parameters: SharedParameters,
    cost_for_ith_point: Rc<CostTable>,
    total_cost: Rc<TotalCost>,
    cursor: SampleCursor,
}

impl AutodiffSagCostFunction {
    /// Creates the adapter.
    ///
    /// # Errors
    /// `InvalidArgument` if `x` or `y` is empty, if there are no trainable
    /// parameters, or if the cost table is empty.
    pub fn new(
        x: Matrix,
        y: Matrix,
        trainable_parameters: SharedParameters,
        cost_for_ith_point: Rc<CostTable>,
        total_cost: Rc<TotalCost>,
    ) -> Result<Self, GradKitError> {
        Self::builder()
            .training_data(x, y)
            .trainable_parameters(trainable_parameters)
            .ith_cost_function(cost_for_ith_point)
            .cost_function(total_cost)
            .build()
    }

    pub fn builder() -> AutodiffSagCostFunctionBuilder {
        AutodiffSagCostFunctionBuilder::default()
    }

    /// Replaces both training matrices at once.
    ///
    /// Neither the cursor nor the parameter count is touched; keeping the
    /// new data consistent with the cost table is up to the caller.
    ///
    /// # Errors
    /// `InvalidArgument` if either matrix is empty. The previous data is kept.
    pub fn set_training_data(&mut self, x: Matrix, y: Matrix) -> Result<(), GradKitError> {
        check_training_data(&x, &y)?;
        self.x = x;
        self.y = y;
        Ok(())
    }

    /// # Errors
    /// `InvalidArgument` if `params` holds no parameters.
    pub fn set_trainable_parameters(
        &mut self,
        params: SharedParameters,
    ) -> Result<(), GradKitError> {
        if Rc::ptr_eq(&self.trainable_parameters, &params) {
            return Ok(());
        }
        check_parameters(&params)?;
        self.trainable_parameters = params;
        Ok(())
    }

    /// # Errors
    /// `InvalidArgument` if `cost_for_ith_point` is empty.
    pub fn set_ith_cost_function(
        &mut self,
        cost_for_ith_point: Rc<CostTable>,
    ) -> Result<(), GradKitError> {
        if Rc::ptr_eq(&self.cost_for_ith_point, &cost_for_ith_point) {
            return Ok(());
        }
        check_cost_table(&cost_for_ith_point)?;
        self.cost_for_ith_point = cost_for_ith_point;
        Ok(())
    }

    pub fn set_cost_function(&mut self, total_cost: Rc<TotalCost>) {
        if !Rc::ptr_eq(&self.total_cost, &total_cost) {
            self.total_cost = total_cost;
        }
    }

    /// Feature and target matrices.
    pub fn training_data(&self) -> (&Matrix, &Matrix) {
        (&self.x, &self.y)
    }

    pub fn trainable_parameters(&self) -> &SharedParameters {
        &self.trainable_parameters
    }

    pub fn cursor(&self) -> SampleCursor {
        self.cursor
    }

    /// Sample the cursor points at.
    ///
    /// # Errors
    /// `OutOfRange` unless the cursor is on a sample below `get_sample_size()`.
    /// Before the first `next_sample()` the reported index is `-1`.
    pub fn current_sample(&self) -> Result<usize, GradKitError> {
        let len = self.get_sample_size();
        match self.cursor {
            SampleCursor::At(index) if index < len => Ok(index),
            SampleCursor::At(index) => Err(GradKitError::OutOfRange {
                index: index as i64,
                len,
            }),
            SampleCursor::Uninitialized | SampleCursor::BeforeFirst => {
                Err(GradKitError::OutOfRange { index: -1, len })
            }
            SampleCursor::Exhausted => Err(GradKitError::OutOfRange {
                index: len as i64,
                len,
            }),
        }
    }

    /// Records the cost of sample `index` on the parameters' tape.
    fn record_sample_cost(&self, index: usize) -> Result<Var, GradKitError> {
        let cost = self
            .cost_for_ith_point
            .get(index)
            .ok_or(GradKitError::OutOfRange {
                index: index as i64,
                len: self.cost_for_ith_point.len(),
            })?;
        Ok(cost(index))
    }

    fn gradient_at(&self, index: usize) -> Result<Vector, GradKitError> {
        let tape = self.trainable_parameters.borrow().tape().clone();
        let checkpoint = tape.checkpoint();

        let gradient = (|| -> Result<Vector, GradKitError> {
            let f_i = self.record_sample_cost(index)?;
            if !f_i.tape().ptr_eq(&tape) {
                return Err(GradKitError::InvalidArgument(format!(
                    "cost of sample {} is not recorded on the trainable parameters' tape",
                    index
                )));
            }
            tape.zero_adjoints();
            f_i.backward()?;
            Ok(self.trainable_parameters.borrow().adjoints())
        })();

        tape.rewind(checkpoint);
        gradient
    }
}

impl FirstOrderCostFunction for AutodiffSagCostFunction {
    /// Total cost over every sample, reduced by the total-cost function.
    ///
    /// Ignores the cursor.
    fn get_cost(&self) -> Result<f64, GradKitError> {
        let n = self.get_sample_size();
        let tape = self.trainable_parameters.borrow().tape().clone();
        let checkpoint = tape.checkpoint();

        let cost = (|| -> Result<f64, GradKitError> {
            let cost_argument = (0..n)
                .map(|i| self.record_sample_cost(i))
                .collect::<Result<Vec<Var>, _>>()?;
            Ok((self.total_cost)(&cost_argument).value())
        })();

        tape.rewind(checkpoint);
        if let Ok(value) = cost {
            if !value.is_finite() {
                log::warn!("Total cost over {} samples is not finite: {}", n, value);
            }
        }
        cost
    }

    /// Gradient of the cost of the current sample.
    ///
    /// # Errors
    /// `InvalidArgument` without trainable parameters, `OutOfRange` if the
    /// cursor is not on a sample or the cost table has no entry for it.
    fn get_gradient(&self) -> Result<Vector, GradKitError> {
        let num_of_variables = self.trainable_parameters.borrow().len();
        if num_of_variables == 0 {
            return Err(GradKitError::InvalidArgument(
                "Number of variables must be greater than 0, you provided no parameters"
                    .to_string(),
            ));
        }
        let index = self.current_sample()?;
        self.gradient_at(index)
    }

    fn parameter_values(&self) -> Vector {
        self.trainable_parameters.borrow().values()
    }

    fn set_parameter_values(&mut self, values: &Vector) -> Result<(), GradKitError> {
        self.trainable_parameters.borrow().set_values(values)
    }
}

impl FirstOrderStochasticCostFunction for AutodiffSagCostFunction {
    fn begin_sample(&mut self) {
        self.cursor = SampleCursor::BeforeFirst;
    }

    fn next_sample(&mut self) -> bool {
        let next = match self.cursor {
            SampleCursor::Uninitialized | SampleCursor::BeforeFirst => 0,
            SampleCursor::At(index) => index + 1,
            SampleCursor::Exhausted => return false,
        };
        if next < self.get_sample_size() {
            self.cursor = SampleCursor::At(next);
            true
        } else {
            self.cursor = SampleCursor::Exhausted;
            false
        }
    }
}

impl FirstOrderSagCostFunction for AutodiffSagCostFunction {
    fn get_sample_size(&self) -> usize {
        self.x.ncols()
    }

    fn get_average_gradient(&mut self) -> Result<Vector, GradKitError> {
        let params_num = self.trainable_parameters.borrow().len();
        let n = self.get_sample_size();
        if n == 0 {
            return Err(GradKitError::InvalidArgument(
                "Number of sample must be greater than 0, you provided no samples".to_string(),
            ));
        }

        let old_cursor = self.cursor;
        let mut average_gradients = Vector::zeros(params_num);
        let mut result = Ok(());
        for i in 0..n {
            self.cursor = SampleCursor::At(i);
            match self.get_gradient() {
                Ok(gradient) => average_gradients += &gradient,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.cursor = old_cursor;
        result?;

        average_gradients *= 1.0 / n as f64;
        Ok(average_gradients)
    }
}

impl fmt::Debug for AutodiffSagCostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutodiffSagCostFunction")
            .field("x_shape", &self.x.dim())
            .field("y_shape", &self.y.dim())
            .field("num_parameters", &self.trainable_parameters.borrow().len())
            .field("num_sample_costs", &self.cost_for_ith_point.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

/// Builder for [`AutodiffSagCostFunction`]; every field is required.
#[derive(Default)]
pub struct AutodiffSagCostFunctionBuilder {
    x: Option<Matrix>,
    y: Option<Matrix>,
    trainable_parameters: Option<SharedParameters>,
    cost_for_ith_point: Option<Rc<CostTable>>,
    total_cost: Option<Rc<TotalCost>>,
}

impl AutodiffSagCostFunctionBuilder {
    pub fn training_data(mut self, x: Matrix, y: Matrix) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn trainable_parameters(mut self, params: SharedParameters) -> Self {
        self.trainable_parameters = Some(params);
        self
    }

    pub fn ith_cost_function(mut self, cost_for_ith_point: Rc<CostTable>) -> Self {
        self.cost_for_ith_point = Some(cost_for_ith_point);
        self
    }

    pub fn cost_function(mut self, total_cost: Rc<TotalCost>) -> Self {
        self.total_cost = Some(total_cost);
        self
    }

    /// # Errors
    /// `InvalidArgument` for empty or missing training data, missing or
    /// empty parameters, a missing or empty cost table, or a missing
    /// total-cost function.
    pub fn build(self) -> Result<AutodiffSagCostFunction, GradKitError> {
        let x = self
            .x
            .ok_or_else(|| GradKitError::InvalidArgument("Empty X provided".to_string()))?;
        let y = self
            .y
            .ok_or_else(|| GradKitError::InvalidArgument("Empty y provided".to_string()))?;
        check_training_data(&x, &y)?;

        let trainable_parameters = self.trainable_parameters.ok_or_else(|| {
            GradKitError::InvalidArgument("The trainable parameters must be provided".to_string())
        })?;
        check_parameters(&trainable_parameters)?;

        let cost_for_ith_point = self.cost_for_ith_point.ok_or_else(|| {
            GradKitError::InvalidArgument("Cost for ith point is not provided".to_string())
        })?;
        check_cost_table(&cost_for_ith_point)?;

        let total_cost = self.total_cost.ok_or_else(|| {
            GradKitError::InvalidArgument("Total cost function is not provided".to_string())
        })?;

        Ok(AutodiffSagCostFunction {
            x,
            y,
            trainable_parameters,
            cost_for_ith_point,
            total_cost,
            cursor: SampleCursor::Uninitialized,
        })
    }
}

fn check_training_data(x: &Matrix, y: &Matrix) -> Result<(), GradKitError> {
    if x.is_empty() {
        return Err(GradKitError::InvalidArgument("Empty X provided".to_string()));
    }
    if y.is_empty() {
        return Err(GradKitError::InvalidArgument("Empty y provided".to_string()));
    }
    Ok(())
}

fn check_parameters(params: &SharedParameters) -> Result<(), GradKitError> {
    let num_of_variables = params.borrow().len();
    if num_of_variables == 0 {
        return Err(GradKitError::InvalidArgument(format!(
            "Provided {} variables in the parameters, more than 0 parameters required",
            num_of_variables
        )));
    }
    Ok(())
}

fn check_cost_table(cost_for_ith_point: &CostTable) -> Result<(), GradKitError> {
    if cost_for_ith_point.is_empty() {
        return Err(GradKitError::InvalidArgument(
            "Cost for ith point is not provided".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "sag_cost_function_test.rs"]
mod tests;
