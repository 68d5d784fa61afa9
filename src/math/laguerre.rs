//! Laguerre polynomial least squares.
//!
//! `L0 = 1`, `L1 = 1 - x`, `(k + 1) L(k+1) = (2k + 1 - x) Lk - k L(k-1)`.
//! The fit scales each basis column to unit norm before an SVD solve, so
//! raw spot levels in the hundreds stay well conditioned up to degree 4.

use nalgebra::{DMatrix, DVector};

use super::MathError;

/// Values `L0(x)..=Ldegree(x)` written into `out`.
#[inline]
fn laguerre_basis(x: f64, out: &mut [f64]) {
    let Some(first) = out.first_mut() else {
        return;
    };
    *first = 1.0;
    if out.len() > 1 {
        out[1] = 1.0 - x;
    }
    for k in 1..out.len().saturating_sub(1) {
        let kf = k as f64;
        out[k + 1] = ((2.0 * kf + 1.0 - x) * out[k] - kf * out[k - 1]) / (kf + 1.0);
    }
}

/// Evaluates the Laguerre series with coefficients `coeffs` at `x`.
pub fn laguerre_value(coeffs: &[f64], x: f64) -> f64 {
    let mut basis = vec![0.0; coeffs.len()];
    laguerre_basis(x, &mut basis);
    coeffs.iter().zip(&basis).map(|(c, l)| c * l).sum()
}

/// Least-squares Laguerre coefficients of `y` against `x`.
///
/// # Examples
/// ```
/// use vanillaferric::math::{laguerre_fit, laguerre_value};
///
/// let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
/// let y: Vec<f64> = x.iter().map(|v| 3.0 - 2.0 * v + 0.25 * v * v).collect();
/// let coeffs = laguerre_fit(&x, &y, 2).unwrap();
/// assert!((laguerre_value(&coeffs, 4.0) - (3.0 - 8.0 + 4.0)).abs() < 1e-8);
/// ```
pub fn laguerre_fit(x: &[f64], y: &[f64], degree: usize) -> Result<Vec<f64>, MathError> {
    if x.len() != y.len() {
        return Err(MathError::InvalidInput("x and y must have equal length"));
    }
    if x.is_empty() {
        return Err(MathError::InvalidInput("at least one point is required"));
    }

    let n = x.len();
    let m = degree + 1;
    let mut design = DMatrix::<f64>::zeros(n, m);
    let mut row = vec![0.0; m];
    for (i, &xi) in x.iter().enumerate() {
        laguerre_basis(xi, &mut row);
        for (j, value) in row.iter().enumerate() {
            design[(i, j)] = *value;
        }
    }

    let scales: Vec<f64> = (0..m)
        .map(|j| {
            let norm = design.column(j).norm();
            if norm > 0.0 {
                norm
            } else {
                1.0
            }
        })
        .collect();
    for (j, scale) in scales.iter().enumerate() {
        design.column_mut(j).unscale_mut(*scale);
    }

    let rhs = DVector::from_column_slice(y);
    let cutoff = f64::EPSILON * n as f64;
    let solution = design
        .svd(true, true)
        .solve(&rhs, cutoff)
        .map_err(MathError::Singular)?;

    Ok(solution
        .iter()
        .zip(&scales)
        .map(|(coef, scale)| coef / scale)
        .collect())
}
