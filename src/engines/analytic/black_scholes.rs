//! Black-Scholes-Merton engine for European options on spot.
//!
//! Discrete cash dividends inside the option life are removed from spot at
//! their present value; the continuous carry yield is the dividend yield.
//! Besides the five standard Greeks the engine reports `phi`, the
//! sensitivity to the dividend yield.

use crate::config::ImpliedVolConfig;
use crate::core::{
    AnalyticEngine, ModelKind, PricingEngine, PricingError, PricingResult, RiskParameter,
    RiskParameters,
};
use crate::instruments::VanillaOption;
use crate::market::MarketContext;

use super::lognormal::{self, LognormalInputs};

/// Analytic Black-Scholes-Merton engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackScholesEngine;

impl BlackScholesEngine {
    /// Creates a Black-Scholes engine instance.
    pub fn new() -> Self {
        Self
    }

    fn inputs(
        instrument: &VanillaOption,
        market: &MarketContext,
    ) -> Result<LognormalInputs, PricingError> {
        LognormalInputs::from_market(
            instrument,
            market,
            market.effective_carry_yield(instrument.underlying),
        )
    }
}

impl PricingEngine<VanillaOption> for BlackScholesEngine {
    fn model_kind(&self) -> ModelKind {
        ModelKind::BlackScholesMerton
    }

    fn price(
        &self,
        instrument: &VanillaOption,
        market: &MarketContext,
    ) -> Result<PricingResult, PricingError> {
        let form = Self::inputs(instrument, market)?.evaluate();
        let result = form.into_result(form.greeks());
        tracing::debug!(model = "BSM", price = result.price, d1 = form.d1, "priced");
        Ok(result)
    }

    fn analytic(&self) -> Option<&dyn AnalyticEngine<VanillaOption>> {
        Some(self)
    }
}

impl AnalyticEngine<VanillaOption> for BlackScholesEngine {
    fn risk_parameters(
        &self,
        instrument: &VanillaOption,
        market: &MarketContext,
    ) -> Result<RiskParameters, PricingError> {
        let form = Self::inputs(instrument, market)?.evaluate();
        let mut risk = form.greeks().to_risk_parameters();
        risk.insert(RiskParameter::Phi, form.yield_sensitivity());
        Ok(risk)
    }

    fn implied_volatility(
        &self,
        instrument: &VanillaOption,
        market: &MarketContext,
        premium: f64,
        config: &ImpliedVolConfig,
    ) -> Result<f64, PricingError> {
        lognormal::implied_volatility(Self::inputs(instrument, market)?, premium, config)
    }
}
