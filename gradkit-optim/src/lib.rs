//! Cost functions and minimizers for stochastic average gradient training.

pub mod cost_function;
pub mod sag_cost_function;
pub mod sag_minimizer;

// Re-export key items for easier access
pub use cost_function::{
    FirstOrderCostFunction, FirstOrderSagCostFunction, FirstOrderStochasticCostFunction,
};
pub use sag_cost_function::{
    AutodiffSagCostFunction, AutodiffSagCostFunctionBuilder, CostTable, SampleCost, SampleCursor,
    TotalCost,
};
pub use sag_minimizer::{SagConfig, SagMinimizer};
