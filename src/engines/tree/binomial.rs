//! Module `engines::tree::binomial`.
//!
//! Cox-Ross-Rubinstein lattice with early exercise and discrete cash
//! dividends.
//!
//! References: Hull (11th ed.) Ch. 13 and 21, Cox-Ross-Rubinstein (1979).
//!
//! Dividends are handled by the escrowed-spot construction: the lattice
//! diffuses `spot - PV(dividends)` and every node adds back the present value
//! of the dividends still to be paid from its own time. The node spot at
//! step `s` with `k` up-moves is
//!
//! ```text
//! S(s, k) = (S0 - PV(0)) * u^(2k - s) + PV(s * dt)
//! ```
//!
//! Node values are filled bottom-up into a [`NodeCache`] arena indexed by
//! `(step, up-count)`, so every node is computed once and the depth of the
//! computation never depends on the step count.
//!
//! Numerical considerations: the error oscillates with step parity and
//! shrinks roughly as `1/N`.

use crate::core::{
    DiagKey, Diagnostics, ExerciseStyle, ModelKind, PricingEngine, PricingError, PricingResult,
};
use crate::instruments::VanillaOption;
use crate::market::{present_value_of_dividends, MarketContext};

/// Triangular arena of lattice node values.
///
/// Owned by the valuation that built it and never shared between parameter
/// sets; a new snapshot means a new cache.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCache {
    steps: usize,
    values: Vec<f64>,
}

impl NodeCache {
    fn new(steps: usize) -> Self {
        Self {
            steps,
            values: vec![f64::NAN; (steps + 1) * (steps + 2) / 2],
        }
    }

    #[inline]
    fn index(step: usize, up: usize) -> usize {
        step * (step + 1) / 2 + up
    }

    #[inline]
    fn set(&mut self, step: usize, up: usize, value: f64) {
        self.values[Self::index(step, up)] = value;
    }

    /// Number of time steps in the lattice.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Discounted value at `(step, up)`, or `None` outside the lattice.
    #[inline]
    pub fn get(&self, step: usize, up: usize) -> Option<f64> {
        (step <= self.steps && up <= step).then(|| self.values[Self::index(step, up)])
    }

    /// Value at the root node.
    #[inline]
    pub fn root(&self) -> f64 {
        self.values[0]
    }
}

/// Lattice geometry for one valuation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeParameters {
    pub dt: f64,
    pub up: f64,
    pub probability: f64,
    pub discount: f64,
}

/// Binomial tree engine.
#[derive(Debug, Clone)]
pub struct BinomialTreeEngine {
    /// Number of tree steps.
    pub steps: usize,
}

impl Default for BinomialTreeEngine {
    fn default() -> Self {
        Self { steps: 100 }
    }
}

impl BinomialTreeEngine {
    /// Creates a tree engine with the given number of steps.
    pub fn new(steps: usize) -> Self {
        Self { steps }
    }

    /// Up-move, probability and per-step discount for `maturity`.
    pub fn lattice_parameters(
        &self,
        instrument: &VanillaOption,
        market: &MarketContext,
        maturity: f64,
    ) -> Result<LatticeParameters, PricingError> {
        let dt = maturity / self.steps as f64;
        let up = (market.volatility * dt.sqrt()).exp();
        let down = 1.0 / up;
        let drift = market.rate + market.cost_yield
            - market.effective_carry_yield(instrument.underlying);
        let probability = ((drift * dt).exp() - down) / (up - down);
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(PricingError::NumericalError(format!(
                "risk-neutral probability {probability} is outside [0, 1]; increase steps"
            )));
        }
        Ok(LatticeParameters {
            dt,
            up,
            probability,
            discount: (-market.rate * dt).exp(),
        })
    }

    /// Fills the full lattice and returns the node arena.
    pub fn build_lattice(
        &self,
        instrument: &VanillaOption,
        market: &MarketContext,
    ) -> Result<NodeCache, PricingError> {
        let params = self.prepare(instrument, market)?;
        self.fill_nodes(instrument, market, &params)
    }

    /// Validates inputs and derives the lattice geometry.
    fn prepare(
        &self,
        instrument: &VanillaOption,
        market: &MarketContext,
    ) -> Result<LatticeParameters, PricingError> {
        instrument.validate()?;
        if self.steps == 0 {
            return Err(PricingError::InvalidInput(
                "binomial steps must be > 0".to_string(),
            ));
        }
        let maturity = market.time_to_expiry(instrument.expiry_date)?;
        self.lattice_parameters(instrument, market, maturity)
    }

    fn fill_nodes(
        &self,
        instrument: &VanillaOption,
        market: &MarketContext,
        params: &LatticeParameters,
    ) -> Result<NodeCache, PricingError> {
        let dividends = market.processed_dividends(instrument.expiry_date);
        let escrowed_spot = market.spot - present_value_of_dividends(&dividends, 0.0, market.rate);
        if !(escrowed_spot > 0.0) {
            return Err(PricingError::InvalidInput(format!(
                "dividend-adjusted spot must be > 0, got {escrowed_spot}"
            )));
        }
        let is_american = instrument.exercise == ExerciseStyle::American;

        let up_squared = params.up * params.up;
        let node_spots = |step: usize| {
            let pv_remaining =
                present_value_of_dividends(&dividends, step as f64 * params.dt, market.rate);
            let mut level = escrowed_spot * params.up.powi(-(step as i32));
            (0..=step).map(move |_| {
                let spot = level + pv_remaining;
                level *= up_squared;
                spot
            })
        };

        let disc_p = params.discount * params.probability;
        let disc_1mp = params.discount * (1.0 - params.probability);

        let mut cache = NodeCache::new(self.steps);
        for (up, spot) in node_spots(self.steps).enumerate() {
            cache.set(self.steps, up, instrument.payoff(spot));
        }

        for step in (0..self.steps).rev() {
            let next = NodeCache::index(step + 1, 0);
            for (up, spot) in node_spots(step).enumerate() {
                let continuation =
                    disc_p * cache.values[next + up + 1] + disc_1mp * cache.values[next + up];
                let value = if is_american {
                    continuation.max(instrument.payoff(spot))
                } else {
                    continuation
                };
                cache.set(step, up, value);
            }
        }

        Ok(cache)
    }
}

impl PricingEngine<VanillaOption> for BinomialTreeEngine {
    fn model_kind(&self) -> ModelKind {
        ModelKind::Binomial
    }

    fn price(
        &self,
        instrument: &VanillaOption,
        market: &MarketContext,
    ) -> Result<PricingResult, PricingError> {
        let params = self.prepare(instrument, market)?;
        let cache = self.fill_nodes(instrument, market, &params)?;

        let mut diagnostics = Diagnostics::new();
        diagnostics.insert(DiagKey::NumSteps, self.steps as f64);
        diagnostics.insert(DiagKey::Vol, market.volatility);
        diagnostics.insert(DiagKey::U, params.up);
        diagnostics.insert(DiagKey::Pu, params.probability);

        let price = cache.root();
        tracing::debug!(model = "Binomial", steps = self.steps, price, "priced");
        Ok(PricingResult {
            price,
            stderr: None,
            greeks: None,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    use super::*;
    use crate::core::UnderlyingClass;
    use crate::engines::analytic::BlackScholesEngine;
    use crate::market::DividendSchedule;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn market(spot: f64, rate: f64, vol: f64) -> MarketContext {
        MarketContext::builder()
            .spot(spot)
            .rate(rate)
            .volatility(vol)
            .pricing_date(date(2019, 1, 1))
            .build()
            .unwrap()
    }

    #[test]
    fn one_step_tree_matches_hand_calculation() {
        let option = VanillaOption::european_call(100.0, date(2020, 1, 1));
        let market = market(100.0, 0.05, 0.2);
        let cache = BinomialTreeEngine::new(1)
            .build_lattice(&option, &market)
            .unwrap();

        let u = 0.2_f64.exp();
        let p = (0.05_f64.exp() - 1.0 / u) / (u - 1.0 / u);
        let expected = (-0.05_f64).exp() * p * (100.0 * u - 100.0);
        assert_relative_eq!(cache.root(), expected, epsilon = 1e-12);
        assert_relative_eq!(cache.get(1, 1).unwrap(), 100.0 * u - 100.0, epsilon = 1e-12);
        assert_eq!(cache.get(1, 0), Some(0.0));
        assert_eq!(cache.get(1, 2), None);
        assert_eq!(cache.get(2, 0), None);
    }

    #[test]
    fn european_tree_converges_to_black_scholes() {
        let option = VanillaOption::european_put(100.0, date(2020, 1, 1));
        let market = market(100.0, 0.05, 0.2);
        let bs = BlackScholesEngine::new().price(&option, &market).unwrap().price;
        let tree = BinomialTreeEngine::new(500)
            .price(&option, &market)
            .unwrap()
            .price;
        assert_relative_eq!(tree, bs, epsilon = 0.01);
    }

    #[test]
    fn american_put_carries_early_exercise_premium() {
        let expiry = date(2020, 1, 1);
        let market = market(100.0, 0.08, 0.2);
        let engine = BinomialTreeEngine::new(200);
        let american = engine
            .price(&VanillaOption::american_put(100.0, expiry), &market)
            .unwrap();
        let european = engine
            .price(&VanillaOption::european_put(100.0, expiry), &market)
            .unwrap();
        assert!(american.price > european.price + 0.1);
        assert!(american.diagnostics.contains_key("pu"));
    }

    #[test]
    fn every_node_is_filled() {
        let option = VanillaOption::american_put(100.0, date(2019, 7, 1));
        let cache = BinomialTreeEngine::new(25)
            .build_lattice(&option, &market(95.0, 0.03, 0.3))
            .unwrap();
        for step in 0..=25 {
            for up in 0..=step {
                let value = cache.get(step, up).unwrap();
                assert!(value.is_finite() && value >= 0.0);
            }
        }
    }

    #[test]
    fn dividend_reduces_call_and_is_added_back_at_nodes() {
        let expiry = date(2020, 1, 1);
        let plain = market(100.0, 0.05, 0.2);
        let paying = MarketContext {
            dividends: std::sync::Arc::new(
                DividendSchedule::from_pairs(&[(date(2019, 7, 1), 3.0)]).unwrap(),
            ),
            ..plain.clone()
        };
        let engine = BinomialTreeEngine::new(200);
        let call = VanillaOption::european_call(100.0, expiry);
        let without = engine.price(&call, &plain).unwrap().price;
        let with = engine.price(&call, &paying).unwrap().price;
        assert!(with < without);

        let bs = BlackScholesEngine::new().price(&call, &paying).unwrap().price;
        assert_relative_eq!(with, bs, epsilon = 0.05);
    }

    #[test]
    fn futures_lattice_is_driftless() {
        let option =
            VanillaOption::european_call(100.0, date(2020, 1, 1)).on(UnderlyingClass::Futures);
        let market = market(100.0, 0.05, 0.2);
        let engine = BinomialTreeEngine::new(50);
        let params = engine.lattice_parameters(&option, &market, 1.0).unwrap();
        let d = 1.0 / params.up;
        assert_relative_eq!(params.probability, (1.0 - d) / (params.up - d), epsilon = 1e-14);
    }

    #[test]
    fn dividends_exceeding_spot_are_rejected() {
        let plain = market(10.0, 0.05, 0.2);
        let paying = MarketContext {
            dividends: std::sync::Arc::new(
                DividendSchedule::from_pairs(&[(date(2019, 6, 1), 6.0), (date(2019, 9, 1), 6.0)])
                    .unwrap(),
            ),
            ..plain
        };
        let option = VanillaOption::american_put(10.0, date(2020, 1, 1));
        assert!(matches!(
            BinomialTreeEngine::new(50).price(&option, &paying),
            Err(PricingError::InvalidInput(_))
        ));
    }

    #[test]
    fn zero_steps_are_rejected() {
        let option = VanillaOption::european_call(100.0, date(2020, 1, 1));
        assert!(matches!(
            BinomialTreeEngine::new(0).price(&option, &market(100.0, 0.05, 0.2)),
            Err(PricingError::InvalidInput(_))
        ));
    }
}
