//! Garman-Kohlhagen engine for European options on currencies and commodities.
//!
//! The carry yield is the foreign rate for a currency pair and the
//! convenience yield for a commodity, net of any cost-of-carry yield. The
//! engine adds one secondary sensitivity to that yield: `rho_foreign` for
//! currencies, `rho_conv_yield` for commodities.

use crate::config::ImpliedVolConfig;
use crate::core::{
    AnalyticEngine, ModelKind, PricingEngine, PricingError, PricingResult, RiskParameter,
    RiskParameters, UnderlyingClass,
};
use crate::instruments::VanillaOption;
use crate::market::MarketContext;

use super::lognormal::{self, LognormalInputs};

/// Analytic Garman-Kohlhagen engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct GarmanKohlhagenEngine;

impl GarmanKohlhagenEngine {
    /// Creates a Garman-Kohlhagen engine instance.
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

    /// Name of the secondary yield sensitivity for an underlying class.
    pub fn secondary_parameter(underlying: UnderlyingClass) -> RiskParameter {
        match underlying {
            UnderlyingClass::Commodity => RiskParameter::RhoConvYield,
            _ => RiskParameter::RhoForeign,
        }
    }
}

impl PricingEngine<VanillaOption> for GarmanKohlhagenEngine {
    fn model_kind(&self) -> ModelKind {
        ModelKind::GarmanKohlhagen
    }

    fn price(
        &self,
        instrument: &VanillaOption,
        market: &MarketContext,
    ) -> Result<PricingResult, PricingError> {
        let form = Self::inputs(instrument, market)?.evaluate();
        let result = form.into_result(form.greeks());
        tracing::debug!(model = "GK", price = result.price, d1 = form.d1, "priced");
        Ok(result)
    }

    fn analytic(&self) -> Option<&dyn AnalyticEngine<VanillaOption>> {
        Some(self)
    }
}

impl AnalyticEngine<VanillaOption> for GarmanKohlhagenEngine {
    fn risk_parameters(
        &self,
        instrument: &VanillaOption,
        market: &MarketContext,
    ) -> Result<RiskParameters, PricingError> {
        let form = Self::inputs(instrument, market)?.evaluate();
        let mut risk = form.greeks().to_risk_parameters();
        risk.insert(
            Self::secondary_parameter(instrument.underlying),
            form.yield_sensitivity(),
        );
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
