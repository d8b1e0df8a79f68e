use crate::autograd::tape::Tape;
use crate::error::GradKitError;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A differentiable scalar recorded on a [`Tape`].
///
/// Cloning a `Var` clones the handle, not the node. Values are read from the
/// tape, so a leaf updated through [`Tape::set_value`] is observed by every
/// clone.
#[derive(Clone)]
pub struct Var {
    tape: Tape,
    index: usize,
}

impl Var {
    pub(crate) fn from_parts(tape: Tape, index: usize) -> Self {
        Var { tape, index }
    }

    /// Position of this var on its tape.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The tape this var is recorded on.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Current value.
    ///
    /// # Panics
    /// Panics if the tape was rewound past this var.
    pub fn value(&self) -> f64 {
        self.tape
            .value(self.index)
            .unwrap_or_else(|e| panic!("stale var {}: {}", self.index, e))
    }

    /// Derivative accumulated for this var by the last backward pass.
    ///
    /// # Panics
    /// Panics if the tape was rewound past this var.
    pub fn adjoint(&self) -> f64 {
        self.tape
            .adjoint(self.index)
            .unwrap_or_else(|e| panic!("stale var {}: {}", self.index, e))
    }

    /// Back-propagates from this var (seed 1) into every var it depends on.
    pub fn backward(&self) -> Result<(), GradKitError> {
        self.tape.backward(self.index)
    }

    fn unary(&self, value: f64, partial: f64) -> Var {
        let index = self.tape.push_unary(value, self.index, partial);
        Var::from_parts(self.tape.clone(), index)
    }

    pub fn powi(&self, n: i32) -> Var {
        let x = self.value();
        let partial = if n == 0 { 0.0 } else { n as f64 * x.powi(n - 1) };
        self.unary(x.powi(n), partial)
    }

    pub fn powf(&self, p: f64) -> Var {
        let x = self.value();
        self.unary(x.powf(p), p * x.powf(p - 1.0))
    }

    pub fn exp(&self) -> Var {
        let y = self.value().exp();
        self.unary(y, y)
    }

    pub fn ln(&self) -> Var {
        let x = self.value();
        self.unary(x.ln(), 1.0 / x)
    }

    pub fn sqrt(&self) -> Var {
        let y = self.value().sqrt();
        self.unary(y, 0.5 / y)
    }

    pub fn sin(&self) -> Var {
        let x = self.value();
        self.unary(x.sin(), x.cos())
    }

    pub fn cos(&self) -> Var {
        let x = self.value();
        self.unary(x.cos(), -x.sin())
    }

    pub fn tanh(&self) -> Var {
        let y = self.value().tanh();
        self.unary(y, 1.0 - y * y)
    }

    /// Logistic function `1 / (1 + e^-x)`.
    pub fn sigmoid(&self) -> Var {
        let y = 1.0 / (1.0 + (-self.value()).exp());
        self.unary(y, y * (1.0 - y))
    }

    /// Absolute value; the derivative at 0 is taken as 0.
    pub fn abs(&self) -> Var {
        let x = self.value();
        let partial = if x > 0.0 {
            1.0
        } else if x < 0.0 {
            -1.0
        } else {
            0.0
        };
        self.unary(x.abs(), partial)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tape.value(self.index) {
            Ok(value) => write!(f, "Var({} @ {})", value, self.index),
            Err(_) => write!(f, "Var(<stale> @ {})", self.index),
        }
    }
}

fn binary(lhs: &Var, rhs: &Var, value: f64, d_lhs: f64, d_rhs: f64) -> Var {
    assert!(
        lhs.tape.ptr_eq(&rhs.tape),
        "cannot combine vars recorded on different tapes"
    );
    let index = lhs
        .tape
        .push_binary(value, (lhs.index, d_lhs), (rhs.index, d_rhs));
    Var::from_parts(lhs.tape.clone(), index)
}

fn add_vv(a: &Var, b: &Var) -> Var {
    binary(a, b, a.value() + b.value(), 1.0, 1.0)
}

fn sub_vv(a: &Var, b: &Var) -> Var {
    binary(a, b, a.value() - b.value(), 1.0, -1.0)
}

fn mul_vv(a: &Var, b: &Var) -> Var {
    let (x, y) = (a.value(), b.value());
    binary(a, b, x * y, y, x)
}

fn div_vv(a: &Var, b: &Var) -> Var {
    let (x, y) = (a.value(), b.value());
    binary(a, b, x / y, 1.0 / y, -x / (y * y))
}

fn add_vf(a: &Var, c: f64) -> Var {
    a.unary(a.value() + c, 1.0)
}

fn sub_vf(a: &Var, c: f64) -> Var {
    a.unary(a.value() - c, 1.0)
}

fn add_fv(c: f64, a: &Var) -> Var {
    add_vf(a, c)
}

fn sub_fv(c: f64, a: &Var) -> Var {
    a.unary(c - a.value(), -1.0)
}

fn mul_vf(a: &Var, c: f64) -> Var {
    a.unary(a.value() * c, c)
}

fn mul_fv(c: f64, a: &Var) -> Var {
    mul_vf(a, c)
}

fn div_vf(a: &Var, c: f64) -> Var {
    a.unary(a.value() / c, 1.0 / c)
}

fn div_fv(c: f64, a: &Var) -> Var {
    let x = a.value();
    a.unary(c / x, -c / (x * x))
}

// Var (op) Var for every owned/borrowed combination.
macro_rules! impl_var_var_op {
    ($trait:ident, $method:ident, $func:ident) => {
        impl $trait<Var> for Var {
            type Output = Var;
            fn $method(self, rhs: Var) -> Var {
                $func(&self, &rhs)
            }
        }
        impl<'a> $trait<&'a Var> for Var {
            type Output = Var;
            fn $method(self, rhs: &'a Var) -> Var {
                $func(&self, rhs)
            }
        }
        impl<'a> $trait<Var> for &'a Var {
            type Output = Var;
            fn $method(self, rhs: Var) -> Var {
                $func(self, &rhs)
            }
        }
        impl<'a, 'b> $trait<&'b Var> for &'a Var {
            type Output = Var;
            fn $method(self, rhs: &'b Var) -> Var {
                $func(self, rhs)
            }
        }
    };
}

// Var (op) f64 and f64 (op) Var.
macro_rules! impl_var_scalar_op {
    ($trait:ident, $method:ident, $var_lhs:ident, $scalar_lhs:ident) => {
        impl $trait<f64> for Var {
            type Output = Var;
            fn $method(self, rhs: f64) -> Var {
                $var_lhs(&self, rhs)
            }
        }
        impl<'a> $trait<f64> for &'a Var {
            type Output = Var;
            fn $method(self, rhs: f64) -> Var {
                $var_lhs(self, rhs)
            }
        }
        impl $trait<Var> for f64 {
            type Output = Var;
            fn $method(self, rhs: Var) -> Var {
                $scalar_lhs(self, &rhs)
            }
        }
        impl<'a> $trait<&'a Var> for f64 {
            type Output = Var;
            fn $method(self, rhs: &'a Var) -> Var {
                $scalar_lhs(self, rhs)
            }
        }
    };
}

impl_var_var_op!(Add, add, add_vv);
impl_var_var_op!(Sub, sub, sub_vv);
impl_var_var_op!(Mul, mul, mul_vv);
impl_var_var_op!(Div, div, div_vv);

impl_var_scalar_op!(Add, add, add_vf, add_fv);
impl_var_scalar_op!(Sub, sub, sub_vf, sub_fv);
impl_var_scalar_op!(Mul, mul, mul_vf, mul_fv);
impl_var_scalar_op!(Div, div, div_vf, div_fv);

impl Neg for Var {
    type Output = Var;
    fn neg(self) -> Var {
        mul_vf(&self, -1.0)
    }
}

impl<'a> Neg for &'a Var {
    type Output = Var;
    fn neg(self) -> Var {
        mul_vf(self, -1.0)
    }
}

#[cfg(test)]
#[path = "var_test.rs"]
mod tests;
