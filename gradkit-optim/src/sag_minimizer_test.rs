use super::*;
use crate::cost_function::{FirstOrderCostFunction, FirstOrderStochasticCostFunction};
use crate::sag_cost_function::{AutodiffSagCostFunction, CostTable, SampleCost, TotalCost};
use approx::assert_relative_eq;
use gradkit_core::{ParameterVector, SharedParameters, Tape, Var};
use ndarray::Array2;
use std::rc::Rc;

fn mean_of_squares(ys: &[f64]) -> (AutodiffSagCostFunction, SharedParameters) {
    let tape = Tape::new();
    let params = ParameterVector::new(&tape, &[0.0]).shared();
    let n = ys.len();
    let costs: CostTable = ys
        .iter()
        .map(|&target| {
            let params = params.clone();
            Box::new(move |_i: usize| {
                let w = params.borrow().vars()[0].clone();
                (w - target).powi(2) * 0.5
            }) as SampleCost
        })
        .collect();
    let total = Rc::new(move |costs: &[Var]| tape.mean(costs)) as Rc<TotalCost>;
    let fun = AutodiffSagCostFunction::new(
        Array2::zeros((1, n)),
        Array2::from_shape_vec((1, n), ys.to_vec()).unwrap(),
        params.clone(),
        Rc::new(costs),
        total,
    )
    .unwrap();
    (fun, params)
}

#[test]
fn test_default_config_validates() {
    let config = SagConfig::default();
    assert_eq!(config.learning_rate, 0.01);
    assert_eq!(config.num_passes, 10);
    assert_eq!(config.tolerance, 0.0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_config_is_rejected() {
    for learning_rate in [0.0, -0.1, f64::NAN, f64::INFINITY] {
        let config = SagConfig {
            learning_rate,
            ..SagConfig::default()
        };
        assert!(matches!(
            SagMinimizer::new(config),
            Err(GradKitError::InvalidArgument(_))
        ));
    }
    let no_passes = SagConfig {
        num_passes: 0,
        ..SagConfig::default()
    };
    assert!(matches!(
        no_passes.validate(),
        Err(GradKitError::InvalidArgument(_))
    ));
    let negative_tolerance = SagConfig {
        tolerance: -1.0,
        ..SagConfig::default()
    };
    assert!(negative_tolerance.validate().is_err());
}

#[test]
fn test_minimize_finds_the_mean() {
    let (mut fun, params) = mean_of_squares(&[1.0, 2.0, 3.0]);
    let mut minimizer = SagMinimizer::new(SagConfig {
        learning_rate: 0.3,
        num_passes: 100,
        tolerance: 0.0,
    })
    .unwrap();

    let cost = minimizer.minimize(&mut fun).unwrap();
    assert_eq!(minimizer.passes_run(), 100);
    assert_relative_eq!(params.borrow().values()[0], 2.0, epsilon = 1e-6);
    assert_relative_eq!(cost, 1.0 / 3.0, epsilon = 1e-9);
    assert_relative_eq!(fun.get_cost().unwrap(), cost, epsilon = 1e-12);
}

#[test]
fn test_minimize_stops_on_tolerance() {
    let (mut fun, params) = mean_of_squares(&[1.0, 2.0, 3.0]);
    let mut minimizer = SagMinimizer::new(SagConfig {
        learning_rate: 0.3,
        num_passes: 100,
        tolerance: 1e-9,
    })
    .unwrap();

    minimizer.minimize(&mut fun).unwrap();
    assert!(minimizer.passes_run() < 100);
    assert_relative_eq!(params.borrow().values()[0], 2.0, epsilon = 1e-3);
}

#[test]
fn test_single_pass_decreases_cost() {
    let (mut fun, _params) = mean_of_squares(&[1.0, 2.0, 3.0]);
    let before = fun.get_cost().unwrap();
    let mut minimizer = SagMinimizer::new(SagConfig {
        learning_rate: 0.3,
        num_passes: 1,
        tolerance: 0.0,
    })
    .unwrap();

    let after = minimizer.minimize(&mut fun).unwrap();
    assert_eq!(minimizer.passes_run(), 1);
    assert!(after < before);
}

/// Two samples, gradient of the wrong length for the first one.
struct MisshapenCost {
    w: Vector,
    cursor: Option<usize>,
}

impl FirstOrderCostFunction for MisshapenCost {
    fn get_cost(&self) -> Result<f64, GradKitError> {
        Ok(self.w.dot(&self.w))
    }

    fn get_gradient(&self) -> Result<Vector, GradKitError> {
        Ok(Vector::zeros(self.w.len() + 1))
    }

    fn parameter_values(&self) -> Vector {
        self.w.clone()
    }

    fn set_parameter_values(&mut self, values: &Vector) -> Result<(), GradKitError> {
        self.w = values.clone();
        Ok(())
    }
}

impl FirstOrderStochasticCostFunction for MisshapenCost {
    fn begin_sample(&mut self) {
        self.cursor = None;
    }

    fn next_sample(&mut self) -> bool {
        let next = self.cursor.map_or(0, |i| i + 1);
        self.cursor = Some(next);
        next < 2
    }
}

impl FirstOrderSagCostFunction for MisshapenCost {
    fn get_sample_size(&self) -> usize {
        2
    }

    fn get_average_gradient(&mut self) -> Result<Vector, GradKitError> {
        self.get_gradient()
    }
}

#[test]
fn test_gradient_length_mismatch_is_reported() {
    let mut fun = MisshapenCost {
        w: Vector::zeros(2),
        cursor: None,
    };
    let mut minimizer = SagMinimizer::new(SagConfig::default()).unwrap();
    assert!(matches!(
        minimizer.minimize(&mut fun),
        Err(GradKitError::ShapeMismatch { .. })
    ));
    assert_eq!(minimizer.passes_run(), 0);
}
