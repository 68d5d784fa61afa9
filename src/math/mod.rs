//! Numerical building blocks shared by the engines.

pub mod laguerre;

pub use laguerre::{laguerre_fit, laguerre_value};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MathError {
    #[error("iteration did not converge")]
    NonConvergence,
    #[error("bracket [{lower}, {upper}] does not contain a sign change")]
    NoSignChange { lower: f64, upper: f64 },
    #[error("least-squares solve failed: {0}")]
    Singular(&'static str),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

pub fn normal_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF via the complementary error function.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * statrs::function::erf::erfc(-x / std::f64::consts::SQRT_2)
}

/// Bisection root search on `[lower, upper]`.
///
/// Stops once the bracket half-width drops below `xtol` and returns its
/// midpoint. The function must change sign over the initial bracket.
pub fn bisection<F>(
    f: F,
    lower: f64,
    upper: f64,
    xtol: f64,
    max_iter: usize,
) -> Result<f64, MathError>
where
    F: Fn(f64) -> f64,
{
    if xtol <= 0.0 {
        return Err(MathError::InvalidInput("xtol must be positive"));
    }
    if max_iter == 0 {
        return Err(MathError::InvalidInput("max_iter must be > 0"));
    }
    if !(lower < upper) {
        return Err(MathError::InvalidInput("lower must be below upper"));
    }

    let mut a = lower;
    let mut b = upper;
    let mut fa = f(a);
    let fb = f(b);
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if !(fa.is_finite() && fb.is_finite()) || fa.signum() == fb.signum() {
        return Err(MathError::NoSignChange { lower, upper });
    }

    for _ in 0..max_iter {
        let mid = 0.5 * (a + b);
        let fm = f(mid);
        if fm == 0.0 || 0.5 * (b - a) < xtol {
            return Ok(mid);
        }
        if fm.signum() == fa.signum() {
            a = mid;
            fa = fm;
        } else {
            b = mid;
        }
    }

    Err(MathError::NonConvergence)
}
