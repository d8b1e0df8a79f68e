use approx::assert_relative_eq;
use gradkit_core::autograd::grad_check::check_grad;
use gradkit_core::{ParameterVector, Tape, Var};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_linear_regression_gradient_matches_finite_differences() {
    init_logger();
    let xs = [0.5, -1.0, 2.0, 3.5];
    let ys = [1.0, -2.0, 3.0, 8.0];

    // Mean squared error of w * x + b.
    let loss = |params: &[Var]| {
        let tape = params[0].tape().clone();
        let residuals: Vec<Var> = xs
            .iter()
            .zip(ys.iter())
            .map(|(&x, &y)| (&params[0] * x + &params[1] - y).powi(2))
            .collect();
        tape.mean(&residuals)
    };

    check_grad(loss, &[0.3, -0.1], 1e-6, 1e-5).unwrap();
}

#[test]
fn test_logistic_loss_gradient_matches_finite_differences() {
    init_logger();
    let loss = |params: &[Var]| {
        let z = &params[0] * 1.5 - &params[1] * 0.5 + &params[2];
        -(z.sigmoid().ln())
    };
    check_grad(loss, &[0.2, 0.4, -0.3], 1e-6, 1e-5).unwrap();
}

#[test]
fn test_repeated_passes_with_rewind_keep_tape_bounded() {
    init_logger();
    let tape = Tape::new();
    let params = ParameterVector::new(&tape, &[1.0, 2.0]);
    let leaves = tape.len();

    for step in 0..100 {
        let checkpoint = tape.checkpoint();
        let cost = (&params.vars()[0] * &params.vars()[1] - step as f64).powi(2);
        tape.zero_adjoints();
        cost.backward().unwrap();
        let grad = params.adjoints();
        assert_eq!(grad.len(), 2);
        tape.rewind(checkpoint);
        assert_eq!(tape.len(), leaves);
    }
}

#[test]
fn test_gradient_follows_updated_parameter_values() {
    init_logger();
    let tape = Tape::new();
    let params = ParameterVector::new(&tape, &[0.0]);

    let grad_at_current = || {
        let checkpoint = tape.checkpoint();
        let cost = 0.5 * (&params.vars()[0] - 2.0).powi(2);
        tape.zero_adjoints();
        cost.backward().unwrap();
        let grad = params.adjoints()[0];
        tape.rewind(checkpoint);
        grad
    };

    assert_relative_eq!(grad_at_current(), -2.0);
    params.set_values(&gradkit_core::ndarray::array![5.0]).unwrap();
    assert_relative_eq!(grad_at_current(), 3.0);
}
