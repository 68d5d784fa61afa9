//! Module `engines::lsm::longstaff_schwartz`.
//!
//! Least-squares early-exercise valuation over simulated full paths.
//!
//! References: Longstaff and Schwartz (2001), Glasserman (2004) Ch. 8.
//!
//! Walking back from the step before expiry, the discounted one-step-ahead
//! value of every in-the-money path is regressed on its spot with a Laguerre
//! basis. A path exercises when intrinsic value beats the fitted continuation;
//! otherwise it keeps the realised discounted value. Out-of-the-money paths
//! always continue. A step with no in-the-money path is skipped entirely.
//!
//! Numerical considerations: the estimator is biased low through the
//! sub-optimal exercise policy and high through in-sample fitting; with
//! thousands of paths both effects are small next to the sampling error.

use crate::core::PricingError;
use crate::engines::monte_carlo::SimulatedPaths;
use crate::instruments::VanillaOption;
use crate::math::{laguerre_fit, laguerre_value};

/// Per-path discounted values and regression bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct LsmOutcome {
    /// Value of each path discounted to the pricing date.
    pub discounted_values: Vec<f64>,
    /// Exercise dates without any in-the-money path.
    pub skipped_regressions: usize,
}

/// Longstaff-Schwartz backward induction.
#[derive(Debug, Clone, Copy)]
pub struct LongstaffSchwartz {
    /// Per-step discount factor `exp(-r dt)`.
    pub step_discount: f64,
    /// Laguerre degree of the continuation fit.
    pub degree: usize,
}

impl LongstaffSchwartz {
    pub fn new(step_discount: f64, degree: usize) -> Self {
        Self {
            step_discount,
            degree,
        }
    }

    /// Values `option` with early exercise on every interior column of `paths`.
    pub fn value(
        &self,
        option: &VanillaOption,
        paths: &SimulatedPaths,
    ) -> Result<LsmOutcome, PricingError> {
        let last = paths.num_columns() - 1;
        let mut values: Vec<f64> = paths
            .terminal_levels()
            .map(|level| option.payoff(level))
            .collect();

        let mut itm = Vec::with_capacity(paths.num_paths());
        let mut x = Vec::with_capacity(paths.num_paths());
        let mut y = Vec::with_capacity(paths.num_paths());
        let mut skipped = 0;

        for step in (1..last).rev() {
            for v in &mut values {
                *v *= self.step_discount;
            }

            itm.clear();
            x.clear();
            y.clear();
            for (p, &continuation) in values.iter().enumerate() {
                let level = paths.level(p, step);
                if option.payoff(level) > 0.0 {
                    itm.push(p);
                    x.push(level);
                    y.push(continuation);
                }
            }

            if itm.is_empty() {
                skipped += 1;
                tracing::warn!(step, "no in-the-money paths, regression skipped");
                continue;
            }

            let coeffs = laguerre_fit(&x, &y, self.degree).map_err(|err| {
                PricingError::NumericalError(format!(
                    "continuation regression failed at step {step}: {err}"
                ))
            })?;

            let mut exercised = 0usize;
            for (&p, &level) in itm.iter().zip(&x) {
                let intrinsic = option.payoff(level);
                if intrinsic > laguerre_value(&coeffs, level) {
                    values[p] = intrinsic;
                    exercised += 1;
                }
            }
            tracing::trace!(step, itm = itm.len(), exercised, "exercise decision");
        }

        for v in &mut values {
            *v *= self.step_discount;
        }

        Ok(LsmOutcome {
            discounted_values: values,
            skipped_regressions: skipped,
        })
    }
}
