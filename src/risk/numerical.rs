//! Module `risk::numerical`.
//!
//! Bump-and-reprice sensitivities for any pricing engine.
//!
//! Every sensitivity re-values the instrument on market snapshots derived
//! from one read-only base through a [`ParameterOverlay`]:
//!
//! ```text
//! first order   (V(x(1+h)) - V(x(1-h))) / (2 x h)
//! second order  (V(x(1+h)) - 2 V(x) + V(x(1-h))) / (x h)^2
//! theta         (V(t + h days) - V(t)) / h
//! ```
//!
//! When `x` is zero the relative step degenerates and `h` is used as an
//! absolute step instead. Vega and rho are reported per one point (x 0.01)
//! and theta per calendar day, matching the analytic engines.
//!
//! With the `parallel` feature the independent scenarios of one request are
//! valued on the rayon pool; results are collected in scenario order, so
//! both modes return identical numbers.
//!
//! References: Glasserman (2004) Ch. 7.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::BumpConfig;
use crate::core::{PricingEngine, PricingError, RiskFactor, RiskParameter, RiskParameters};
use crate::instruments::VanillaOption;
use crate::market::{MarketContext, ParameterOverlay};

/// Per-point scaling of vega and rho.
const PER_POINT: f64 = 0.01;

/// Zero-argument sensitivity evaluator bound to one snapshot.
pub type RiskFunction = Box<dyn Fn() -> Result<f64, PricingError> + Send + Sync>;

/// Finite-difference risk over a borrowed engine and market snapshot.
#[derive(Debug, Clone, Copy)]
pub struct NumericalGreeks<'a> {
    engine: &'a dyn PricingEngine<VanillaOption>,
    instrument: &'a VanillaOption,
    market: &'a MarketContext,
    bumps: &'a BumpConfig,
}

/// Perturbed scalar factor with its absolute step.
#[derive(Debug, Clone, Copy)]
struct Bump {
    up: ParameterOverlay,
    down: ParameterOverlay,
    step: f64,
}

impl<'a> NumericalGreeks<'a> {
    pub fn new(
        engine: &'a dyn PricingEngine<VanillaOption>,
        instrument: &'a VanillaOption,
        market: &'a MarketContext,
        bumps: &'a BumpConfig,
    ) -> Self {
        Self {
            engine,
            instrument,
            market,
            bumps,
        }
    }

    fn value(&self, overlay: Option<ParameterOverlay>) -> Result<f64, PricingError> {
        match overlay {
            None => self.engine.price(self.instrument, self.market),
            Some(overlay) => self
                .engine
                .price(self.instrument, &self.market.with_overlay(overlay)),
        }
        .map(|result| result.price)
    }

    /// Values every scenario, preserving order.
    fn values(&self, scenarios: &[Option<ParameterOverlay>]) -> Result<Vec<f64>, PricingError> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            scenarios
                .par_iter()
                .map(|scenario| self.value(*scenario))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            scenarios
                .iter()
                .map(|scenario| self.value(*scenario))
                .collect()
        }
    }

    fn bump(&self, factor: RiskFactor) -> Result<Bump, PricingError> {
        let (Some(x), Some(h)) = (self.market.factor_value(factor), self.bumps.fraction(factor))
        else {
            return Err(PricingError::InvalidInput(format!(
                "{} cannot be bumped by a relative step",
                factor.as_str()
            )));
        };
        if h <= 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "bump size for {} must be > 0",
                factor.as_str()
            )));
        }
        let step = if x != 0.0 { (x * h).abs() } else { h };
        match (
            ParameterOverlay::scalar(factor, x + step),
            ParameterOverlay::scalar(factor, x - step),
        ) {
            (Some(up), Some(down)) => Ok(Bump { up, down, step }),
            _ => Err(PricingError::InvalidInput(format!(
                "{} is not a scalar factor",
                factor.as_str()
            ))),
        }
    }

    fn time_step_days(&self) -> Result<i64, PricingError> {
        if self.bumps.time_days <= 0 {
            return Err(PricingError::InvalidInput(
                "time bump must be at least one day".to_string(),
            ));
        }
        Ok(self.bumps.time_days)
    }

    /// Central first difference with respect to a scalar factor, unscaled.
    pub fn first_order(&self, factor: RiskFactor) -> Result<f64, PricingError> {
        let bump = self.bump(factor)?;
        let values = self.values(&[Some(bump.up), Some(bump.down)])?;
        Ok((values[0] - values[1]) / (2.0 * bump.step))
    }

    /// Central second difference with respect to a scalar factor.
    pub fn second_order(&self, factor: RiskFactor) -> Result<f64, PricingError> {
        let bump = self.bump(factor)?;
        let values = self.values(&[Some(bump.up), None, Some(bump.down)])?;
        Ok((values[0] - 2.0 * values[1] + values[2]) / (bump.step * bump.step))
    }

    pub fn delta(&self) -> Result<f64, PricingError> {
        self.first_order(RiskFactor::Spot)
    }

    pub fn gamma(&self) -> Result<f64, PricingError> {
        self.second_order(RiskFactor::Spot)
    }

    /// Per one volatility point.
    pub fn vega(&self) -> Result<f64, PricingError> {
        Ok(self.first_order(RiskFactor::Volatility)? * PER_POINT)
    }

    /// Per one rate point.
    pub fn rho(&self) -> Result<f64, PricingError> {
        Ok(self.first_order(RiskFactor::Rate)? * PER_POINT)
    }

    /// Forward difference over the configured number of days, per day.
    pub fn theta(&self) -> Result<f64, PricingError> {
        let days = self.time_step_days()?;
        let values = self.values(&[
            Some(ParameterOverlay::shift_days(self.market, days)),
            None,
        ])?;
        Ok((values[0] - values[1]) / days as f64)
    }

    /// Delta, gamma, theta, vega and rho from one batch of revaluations.
    pub fn risk_parameters(&self) -> Result<RiskParameters, PricingError> {
        let spot = self.bump(RiskFactor::Spot)?;
        let vol = self.bump(RiskFactor::Volatility)?;
        let rate = self.bump(RiskFactor::Rate)?;
        let days = self.time_step_days()?;

        let v = self.values(&[
            None,
            Some(spot.up),
            Some(spot.down),
            Some(vol.up),
            Some(vol.down),
            Some(rate.up),
            Some(rate.down),
            Some(ParameterOverlay::shift_days(self.market, days)),
        ])?;
        let base = v[0];

        let mut out = RiskParameters::new();
        out.insert(RiskParameter::Delta, (v[1] - v[2]) / (2.0 * spot.step));
        out.insert(
            RiskParameter::Gamma,
            (v[1] - 2.0 * base + v[2]) / (spot.step * spot.step),
        );
        out.insert(RiskParameter::Theta, (v[7] - base) / days as f64);
        out.insert(
            RiskParameter::Vega,
            (v[3] - v[4]) / (2.0 * vol.step) * PER_POINT,
        );
        out.insert(
            RiskParameter::Rho,
            (v[5] - v[6]) / (2.0 * rate.step) * PER_POINT,
        );
        tracing::debug!(model = %self.engine.model_kind().as_str(), ?out, "numerical risk");
        Ok(out)
    }

    /// Value change from a one-sided bump of each risk factor.
    ///
    /// A factor with a zero bump attributes zero without revaluing.
    pub fn pnl_attribution(&self) -> Result<BTreeMap<RiskFactor, f64>, PricingError> {
        let mut factors = Vec::with_capacity(RiskFactor::ALL.len());
        let mut scenarios = vec![None];
        for factor in RiskFactor::ALL {
            let overlay = match factor {
                RiskFactor::PricingDate => (self.bumps.time_days != 0)
                    .then(|| ParameterOverlay::shift_days(self.market, self.bumps.time_days)),
                _ => match (self.market.factor_value(factor), self.bumps.fraction(factor)) {
                    (Some(x), Some(h)) if h != 0.0 => {
                        let step = if x != 0.0 { x * h } else { h };
                        ParameterOverlay::scalar(factor, x + step)
                    }
                    _ => None,
                },
            };
            factors.push((factor, overlay.is_some()));
            if overlay.is_some() {
                scenarios.push(overlay);
            }
        }

        let values = self.values(&scenarios)?;
        let base = values[0];
        let mut bumped = values[1..].iter();
        let mut out = BTreeMap::new();
        for (factor, revalued) in factors {
            let pnl = if revalued {
                bumped.next().map_or(0.0, |value| value - base)
            } else {
                0.0
            };
            out.insert(factor, pnl);
        }
        Ok(out)
    }
}

type Snapshot = (
    Arc<dyn PricingEngine<VanillaOption>>,
    VanillaOption,
    MarketContext,
    BumpConfig,
);

fn bind(
    snapshot: &Arc<Snapshot>,
    select: fn(&NumericalGreeks<'_>) -> Result<f64, PricingError>,
) -> RiskFunction {
    let snapshot = Arc::clone(snapshot);
    Box::new(move || {
        let (engine, instrument, market, bumps) = &*snapshot;
        select(&NumericalGreeks::new(engine.as_ref(), instrument, market, bumps))
    })
}

/// Numerical sensitivities as closures bound to an owned snapshot.
pub fn numerical_risk_functions(
    engine: Arc<dyn PricingEngine<VanillaOption>>,
    instrument: VanillaOption,
    market: MarketContext,
    bumps: BumpConfig,
) -> BTreeMap<RiskParameter, RiskFunction> {
    let snapshot = Arc::new((engine, instrument, market, bumps));
    let mut out = BTreeMap::new();
    out.insert(RiskParameter::Delta, bind(&snapshot, |g| g.delta()));
    out.insert(RiskParameter::Gamma, bind(&snapshot, |g| g.gamma()));
    out.insert(RiskParameter::Theta, bind(&snapshot, |g| g.theta()));
    out.insert(RiskParameter::Vega, bind(&snapshot, |g| g.vega()));
    out.insert(RiskParameter::Rho, bind(&snapshot, |g| g.rho()));
    out
}
