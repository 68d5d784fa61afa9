//! Shared closed form of the Black-Scholes family.
//!
//! All three analytic engines price with the same skeleton and differ only in
//! which rate they pass as the carry yield:
//!
//! ```text
//! adjS = S + PV(carry costs) - PV(dividends)
//! d1   = (ln(adjS / K) + (r - q + c + sigma^2 / 2) T) / (sigma sqrt(T)),  d2 = d1 - sigma sqrt(T)
//! V    = flag (adjS e^{-(q - c) T} N(flag d1) - K e^{-r T} N(flag d2))
//! ```
//!
//! References: Hull (11th ed.) Ch. 15, 17 and 18; Haug (2007) generalized
//! Black-Scholes with cost of carry.

use crate::config::ImpliedVolConfig;
use crate::core::{DiagKey, Diagnostics, ExerciseStyle, Greeks, PricingError, PricingResult};
use crate::instruments::VanillaOption;
use crate::market::{present_value_of_dividends, MarketContext, DAYS_PER_YEAR};
use crate::math::{bisection, normal_cdf, normal_pdf};

/// Scalar inputs of one closed-form evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LognormalInputs {
    pub flag: f64,
    pub adjusted_spot: f64,
    pub strike: f64,
    pub rate: f64,
    pub carry_yield: f64,
    pub cost_yield: f64,
    pub volatility: f64,
    pub maturity: f64,
    pub pv_dividends: f64,
}

impl LognormalInputs {
    /// Collects inputs for `instrument`, using `carry_yield` as `q`.
    pub fn from_market(
        instrument: &VanillaOption,
        market: &MarketContext,
        carry_yield: f64,
    ) -> Result<Self, PricingError> {
        instrument.validate()?;
        if instrument.exercise != ExerciseStyle::European {
            return Err(PricingError::InvalidInput(
                "closed-form engines support European exercise only".to_string(),
            ));
        }

        let maturity = market.time_to_expiry(instrument.expiry_date)?;
        let processed = market.processed_dividends(instrument.expiry_date);
        let pv_dividends = present_value_of_dividends(&processed, 0.0, market.rate);
        let adjusted_spot = market.spot + market.pv_carry_costs - pv_dividends;
        if !(adjusted_spot > 0.0) {
            return Err(PricingError::InvalidInput(format!(
                "dividend-adjusted spot must be > 0, got {adjusted_spot}"
            )));
        }

        Ok(Self {
            flag: instrument.option_type.sign(),
            adjusted_spot,
            strike: instrument.strike,
            rate: market.rate,
            carry_yield,
            cost_yield: market.cost_yield,
            volatility: market.volatility,
            maturity,
            pv_dividends,
        })
    }

    #[inline]
    pub fn with_volatility(self, volatility: f64) -> Self {
        Self { volatility, ..self }
    }

    pub fn evaluate(self) -> ClosedForm {
        let sqrt_t = self.maturity.sqrt();
        let sig_sqrt_t = self.volatility * sqrt_t;
        let net_carry = self.carry_yield - self.cost_yield;
        let d1 = ((self.adjusted_spot / self.strike).ln()
            + (self.rate - net_carry + 0.5 * self.volatility * self.volatility) * self.maturity)
            / sig_sqrt_t;
        ClosedForm {
            inputs: self,
            d1,
            d2: d1 - sig_sqrt_t,
            sqrt_t,
            discount_factor: (-self.rate * self.maturity).exp(),
            carry_discount_factor: (-net_carry * self.maturity).exp(),
        }
    }
}

/// Evaluated closed form with its intermediate terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ClosedForm {
    pub inputs: LognormalInputs,
    pub d1: f64,
    pub d2: f64,
    sqrt_t: f64,
    pub discount_factor: f64,
    pub carry_discount_factor: f64,
}

impl ClosedForm {
    #[inline]
    fn nd1(&self) -> f64 {
        normal_cdf(self.inputs.flag * self.d1)
    }

    #[inline]
    fn nd2(&self) -> f64 {
        normal_cdf(self.inputs.flag * self.d2)
    }

    pub fn value(&self) -> f64 {
        let p = &self.inputs;
        p.flag
            * (p.adjusted_spot * self.carry_discount_factor * self.nd1()
                - p.strike * self.discount_factor * self.nd2())
    }

    /// Quoted as `N(flag d1)`, without the option sign or carry discount.
    pub fn delta(&self) -> f64 {
        self.nd1()
    }

    pub fn gamma(&self) -> f64 {
        let p = &self.inputs;
        normal_pdf(self.d1) * self.carry_discount_factor
            / (p.adjusted_spot * p.volatility * self.sqrt_t)
    }

    /// Per one volatility point.
    pub fn vega(&self) -> f64 {
        let p = &self.inputs;
        p.adjusted_spot * self.carry_discount_factor * self.sqrt_t * normal_pdf(self.d1) / 100.0
    }

    /// Per calendar day.
    pub fn theta(&self) -> f64 {
        let p = &self.inputs;
        let decay = -normal_pdf(self.d1) * p.volatility * self.carry_discount_factor
            * p.adjusted_spot
            / (2.0 * self.sqrt_t);
        let carry = p.flag
            * (p.carry_yield - p.cost_yield)
            * p.adjusted_spot
            * self.nd1()
            * self.carry_discount_factor;
        let discounting = p.flag * p.rate * p.strike * self.discount_factor * self.nd2();
        (decay + carry - discounting) / DAYS_PER_YEAR
    }

    /// Per one rate point.
    pub fn rho(&self) -> f64 {
        let p = &self.inputs;
        p.flag * p.strike * p.maturity * self.discount_factor * self.nd2() / 100.0
    }

    /// Rho of an option whose carry moves with the discount rate.
    pub fn futures_rho(&self) -> f64 {
        -self.inputs.maturity * self.value()
    }

    /// Sensitivity to the carry yield.
    pub fn yield_sensitivity(&self) -> f64 {
        let p = &self.inputs;
        -p.flag * p.adjusted_spot * p.maturity * self.nd1()
    }

    pub fn greeks(&self) -> Greeks {
        Greeks {
            delta: self.delta(),
            gamma: self.gamma(),
            vega: self.vega(),
            theta: self.theta(),
            rho: self.rho(),
        }
    }

    /// Packs price, Greeks and diagnostics.
    pub fn into_result(self, greeks: Greeks) -> PricingResult {
        let mut diagnostics = Diagnostics::new();
        diagnostics.insert(DiagKey::Vol, self.inputs.volatility);
        diagnostics.insert(DiagKey::D1, self.d1);
        diagnostics.insert(DiagKey::D2, self.d2);
        diagnostics.insert(DiagKey::AdjustedSpot, self.inputs.adjusted_spot);
        diagnostics.insert(DiagKey::DiscountFactor, self.discount_factor);
        diagnostics.insert(DiagKey::CarryDiscountFactor, self.carry_discount_factor);
        diagnostics.insert(DiagKey::PvDividends, self.inputs.pv_dividends);

        PricingResult {
            price: self.value(),
            stderr: None,
            greeks: Some(greeks),
            diagnostics,
        }
    }
}

/// Volatility reproducing `premium`, by bisection over the configured bracket.
pub(crate) fn implied_volatility(
    inputs: LognormalInputs,
    premium: f64,
    config: &ImpliedVolConfig,
) -> Result<f64, PricingError> {
    if !premium.is_finite() || premium < 0.0 {
        return Err(PricingError::InvalidInput(
            "premium must be finite and >= 0".to_string(),
        ));
    }
    config.validate()?;

    let objective = |vol: f64| inputs.with_volatility(vol).evaluate().value() - premium;
    bisection(
        objective,
        config.lower,
        config.upper,
        config.tolerance,
        config.max_iterations,
    )
    .map_err(|err| {
        tracing::debug!(%err, premium, "implied volatility bisection failed");
        PricingError::ImpliedVolatility {
            premium,
            lower: config.lower,
            upper: config.upper,
        }
    })
}
