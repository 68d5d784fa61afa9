//! Black-76 engine for European options on futures.
//!
//! The futures price carries at the risk-free rate, so `q = r` and the
//! adjusted forward discount factor collapses to one. Rho is the derivative
//! of the discounting alone: `-T * V`.

use crate::config::ImpliedVolConfig;
use crate::core::{
    AnalyticEngine, Greeks, ModelKind, PricingEngine, PricingError, PricingResult, RiskParameters,
};
use crate::instruments::VanillaOption;
use crate::market::MarketContext;

use super::lognormal::{self, ClosedForm, LognormalInputs};

/// Analytic Black-76 engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Black76Engine;

impl Black76Engine {
    /// Creates a Black-76 engine instance.
    pub fn new() -> Self {
        Self
    }

    fn inputs(
        instrument: &VanillaOption,
        market: &MarketContext,
    ) -> Result<LognormalInputs, PricingError> {
        LognormalInputs::from_market(instrument, market, market.rate)
    }

    fn greeks(form: &ClosedForm) -> Greeks {
        Greeks {
            rho: form.futures_rho(),
            ..form.greeks()
        }
    }
}

impl PricingEngine<VanillaOption> for Black76Engine {
    fn model_kind(&self) -> ModelKind {
        ModelKind::Black76
    }

    fn price(
        &self,
        instrument: &VanillaOption,
        market: &MarketContext,
    ) -> Result<PricingResult, PricingError> {
        let form = Self::inputs(instrument, market)?.evaluate();
        let result = form.into_result(Self::greeks(&form));
        tracing::debug!(model = "B76", price = result.price, d1 = form.d1, "priced");
        Ok(result)
    }

    fn analytic(&self) -> Option<&dyn AnalyticEngine<VanillaOption>> {
        Some(self)
    }
}

impl AnalyticEngine<VanillaOption> for Black76Engine {
    fn risk_parameters(
        &self,
        instrument: &VanillaOption,
        market: &MarketContext,
    ) -> Result<RiskParameters, PricingError> {
        let form = Self::inputs(instrument, market)?.evaluate();
        Ok(Self::greeks(&form).to_risk_parameters())
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
