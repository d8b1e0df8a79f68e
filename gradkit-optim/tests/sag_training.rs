use approx::assert_relative_eq;
use gradkit_core::autograd::grad_check::value_and_grad;
use gradkit_core::{Matrix, ParameterVector, SharedParameters, Tape, Var};
use gradkit_data::{Alphabet, ByteFeatures, Labels, SimpleFeatures};
use gradkit_optim::{
    AutodiffSagCostFunction, CostTable, FirstOrderCostFunction, FirstOrderSagCostFunction,
    SagConfig, SagMinimizer, SampleCost, TotalCost,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::rc::Rc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Logistic loss `ln(1 + e^z) - y z` of the linear score `z = w . x_i + b`.
fn logistic_loss(params: &[Var], x: &Matrix, y: &Matrix, i: usize) -> Var {
    let (w, b) = params.split_at(params.len() - 1);
    let score = w
        .iter()
        .zip(x.column(i).iter())
        .fold(b[0].clone(), |acc, (w_j, &x_j)| acc + w_j * x_j);
    (score.exp() + 1.0).ln() - score * y[[0, i]]
}

fn logistic_problem(
    x: Matrix,
    y: Matrix,
    init: &[f64],
) -> (AutodiffSagCostFunction, SharedParameters) {
    let tape = Tape::new();
    let params = ParameterVector::new(&tape, init).shared();
    let data = Rc::new((x.clone(), y.clone()));
    let costs: CostTable = (0..x.ncols())
        .map(|_| {
            let params = params.clone();
            let data = data.clone();
            Box::new(move |i: usize| logistic_loss(params.borrow().vars(), &data.0, &data.1, i))
                as SampleCost
        })
        .collect();
    let total = Rc::new(move |costs: &[Var]| tape.mean(costs)) as Rc<TotalCost>;
    let fun = AutodiffSagCostFunction::new(x, y, params.clone(), Rc::new(costs), total).unwrap();
    (fun, params)
}

#[test]
fn test_linear_regression_from_feature_containers() {
    init_logger();
    let xs = vec![-1.0, -0.5, 0.0, 0.5, 1.0];
    let features = SimpleFeatures::from_matrix(xs.clone(), 1, xs.len()).unwrap();
    let labels = Labels::from_vec(xs.iter().map(|x| 2.0 * x + 1.0).collect());
    let x = features.to_matrix().unwrap();
    let y = labels.to_matrix();

    let tape = Tape::new();
    let params = ParameterVector::zeros(&tape, 2).shared();
    let data = Rc::new((x.clone(), y.clone()));
    let costs: CostTable = (0..x.ncols())
        .map(|_| {
            let params = params.clone();
            let data = data.clone();
            Box::new(move |i: usize| {
                let p = params.borrow();
                let residual = &p.vars()[0] * data.0[[0, i]] + &p.vars()[1] - data.1[[0, i]];
                residual.powi(2) * 0.5
            }) as SampleCost
        })
        .collect();
    let total = {
        let tape = tape.clone();
        Rc::new(move |costs: &[Var]| tape.mean(costs)) as Rc<TotalCost>
    };
    let mut fun =
        AutodiffSagCostFunction::new(x, y, params.clone(), Rc::new(costs), total).unwrap();
    assert_relative_eq!(fun.get_cost().unwrap(), 1.5, epsilon = 1e-12);

    let mut minimizer = SagMinimizer::new(SagConfig {
        learning_rate: 0.2,
        num_passes: 50,
        tolerance: 0.0,
    })
    .unwrap();
    let cost = minimizer.minimize(&mut fun).unwrap();

    let fitted = params.borrow().values();
    assert_relative_eq!(fitted[0], 2.0, epsilon = 1e-6);
    assert_relative_eq!(fitted[1], 1.0, epsilon = 1e-6);
    assert!(cost < 1e-10);
    assert_eq!(tape.len(), 2);
}

#[test]
fn test_average_gradient_matches_gradient_of_mean_cost() {
    init_logger();
    let mut rng = StdRng::seed_from_u64(7);
    let num_features = 3;
    let num_vectors = 8;
    let bytes: Vec<u8> = (0..num_features * num_vectors)
        .map(|_| rng.gen_range(0..4u8))
        .collect();
    let features =
        ByteFeatures::from_matrix(Alphabet::RawDna, bytes, num_features, num_vectors).unwrap();
    let labels = Labels::from_vec((0..num_vectors).map(|i| (i % 2) as f64).collect());
    let x = features.to_matrix().unwrap();
    let y = labels.to_matrix();

    let init: Vec<f64> = (0..=num_features).map(|_| rng.gen_range(-0.5..0.5)).collect();
    let (mut fun, _params) = logistic_problem(x.clone(), y.clone(), &init);

    let (expected_cost, expected_grad) = value_and_grad(
        |params: &[Var]| {
            let tape = params[0].tape().clone();
            let losses: Vec<Var> = (0..num_vectors)
                .map(|i| logistic_loss(params, &x, &y, i))
                .collect();
            tape.mean(&losses)
        },
        &init,
    )
    .unwrap();

    assert_relative_eq!(fun.get_cost().unwrap(), expected_cost, epsilon = 1e-10);
    let average = fun.get_average_gradient().unwrap();
    assert_eq!(average.len(), num_features + 1);
    for (a, e) in average.iter().zip(expected_grad.iter()) {
        assert_relative_eq!(*a, *e, epsilon = 1e-10);
    }
}

#[test]
fn test_sag_reduces_logistic_loss() {
    init_logger();
    let features =
        ByteFeatures::from_matrix(Alphabet::RawDna, vec![0, 1, 0, 2, 3, 3, 3, 2, 1, 0, 2, 3], 2, 6)
            .unwrap();
    let labels = Labels::from_vec(vec![0.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    let (mut fun, params) = logistic_problem(
        features.to_matrix().unwrap(),
        labels.to_matrix(),
        &[0.0, 0.0, 0.0],
    );

    let initial = fun.get_cost().unwrap();
    assert_relative_eq!(initial, std::f64::consts::LN_2, epsilon = 1e-12);

    let mut minimizer = SagMinimizer::new(SagConfig {
        learning_rate: 0.1,
        num_passes: 20,
        tolerance: 1e-12,
    })
    .unwrap();
    let cost = minimizer.minimize(&mut fun).unwrap();

    assert!(cost < initial);
    assert!(minimizer.passes_run() >= 1);
    assert_eq!(params.borrow().len(), 3);
    assert_relative_eq!(fun.get_cost().unwrap(), cost, epsilon = 1e-12);
}
