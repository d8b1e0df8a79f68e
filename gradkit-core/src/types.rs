use ndarray::{Array1, Array2};

/// Dense owned vector of `f64`, used for gradients and parameter values.
pub type Vector = Array1<f64>;

/// Dense owned matrix of `f64`. Feature matrices store one sample per column.
pub type Matrix = Array2<f64>;
