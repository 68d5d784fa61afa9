//! Market snapshot consumed by every pricing engine.
//!
//! A [`MarketContext`] holds the scalar inputs of one valuation (spot,
//! rates, yields, volatility, pricing date) plus a shared, immutable
//! dividend schedule. Snapshots are cheap to clone: the schedule sits
//! behind an [`Arc`], so a [`ParameterOverlay`] can derive a perturbed
//! snapshot that differs from its base in one field only.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::core::{PricingError, RiskFactor, UnderlyingClass};

pub mod dividends;

pub use dividends::{
    present_value_of_dividends, process_dividends, CashDividend, DividendSchedule,
    ProcessedDividend, DAYS_PER_YEAR,
};

/// Spot used when none is supplied; keeps ratio formulas finite.
pub const SPOT_FLOOR: f64 = 1.0e-5;
/// Volatility used when none is supplied.
pub const DEFAULT_VOLATILITY: f64 = 0.10;

/// Per-valuation market inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketContext {
    /// Spot level (futures price for futures options).
    pub spot: f64,
    /// Continuously compounded risk-free (domestic) rate.
    pub rate: f64,
    /// Continuous carry yield: dividend yield, foreign rate or convenience
    /// yield depending on the underlying class.
    pub carry_yield: f64,
    /// Continuous cost-of-carry yield (storage costs).
    pub cost_yield: f64,
    /// Lump present value of carry costs added to spot.
    pub pv_carry_costs: f64,
    /// Lognormal volatility.
    pub volatility: f64,
    pub pricing_date: NaiveDate,
    pub dividends: Arc<DividendSchedule>,
}

impl MarketContext {
    /// Starts a market builder.
    #[inline]
    pub fn builder() -> MarketContextBuilder {
        MarketContextBuilder::default()
    }

    /// Year fraction from the pricing date to `expiry_date`.
    ///
    /// # Errors
    /// [`PricingError::Precondition`] unless the pricing date is strictly
    /// before expiry.
    pub fn time_to_expiry(&self, expiry_date: NaiveDate) -> Result<f64, PricingError> {
        let days = (expiry_date - self.pricing_date).num_days();
        if days <= 0 {
            return Err(PricingError::Precondition(format!(
                "pricing date {} must be strictly before expiry date {expiry_date}",
                self.pricing_date
            )));
        }
        Ok(days as f64 / DAYS_PER_YEAR)
    }

    /// Carry yield seen by models; futures carry at the risk-free rate.
    #[inline]
    pub fn effective_carry_yield(&self, underlying: UnderlyingClass) -> f64 {
        match underlying {
            UnderlyingClass::Futures => self.rate,
            _ => self.carry_yield,
        }
    }

    /// Dividends falling inside the option life, in model time.
    #[inline]
    pub fn processed_dividends(&self, expiry_date: NaiveDate) -> Vec<ProcessedDividend> {
        process_dividends(&self.dividends, self.pricing_date, expiry_date)
    }

    /// Current value of a perturbable factor, or `None` for the pricing date.
    pub fn factor_value(&self, factor: RiskFactor) -> Option<f64> {
        match factor {
            RiskFactor::Spot => Some(self.spot),
            RiskFactor::PricingDate => None,
            RiskFactor::Volatility => Some(self.volatility),
            RiskFactor::Rate => Some(self.rate),
            RiskFactor::CarryYield => Some(self.carry_yield),
            RiskFactor::CostYield => Some(self.cost_yield),
        }
    }

    /// Snapshot identical to `self` except for the overridden field.
    pub fn with_overlay(&self, overlay: ParameterOverlay) -> Self {
        let mut bumped = self.clone();
        match overlay {
            ParameterOverlay::Spot(value) => bumped.spot = value,
            ParameterOverlay::Volatility(value) => bumped.volatility = value,
            ParameterOverlay::Rate(value) => bumped.rate = value,
            ParameterOverlay::CarryYield(value) => bumped.carry_yield = value,
            ParameterOverlay::CostYield(value) => bumped.cost_yield = value,
            ParameterOverlay::PricingDate(date) => bumped.pricing_date = date,
        }
        bumped
    }
}

/// One overridden field on top of a base [`MarketContext`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterOverlay {
    Spot(f64),
    Volatility(f64),
    Rate(f64),
    CarryYield(f64),
    CostYield(f64),
    PricingDate(NaiveDate),
}

impl ParameterOverlay {
    /// Overlay setting a scalar factor to `value`.
    ///
    /// Returns `None` for [`RiskFactor::PricingDate`]; use
    /// [`ParameterOverlay::shift_days`] for calendar moves.
    pub fn scalar(factor: RiskFactor, value: f64) -> Option<Self> {
        match factor {
            RiskFactor::Spot => Some(Self::Spot(value)),
            RiskFactor::PricingDate => None,
            RiskFactor::Volatility => Some(Self::Volatility(value)),
            RiskFactor::Rate => Some(Self::Rate(value)),
            RiskFactor::CarryYield => Some(Self::CarryYield(value)),
            RiskFactor::CostYield => Some(Self::CostYield(value)),
        }
    }

    /// Overlay moving the pricing date forward by `days`.
    pub fn shift_days(base: &MarketContext, days: i64) -> Self {
        Self::PricingDate(base.pricing_date + Duration::days(days))
    }
}

/// Builder for [`MarketContext`].
#[derive(Debug, Clone, Default)]
pub struct MarketContextBuilder {
    spot: Option<f64>,
    rate: Option<f64>,
    carry_yield: Option<f64>,
    cost_yield: Option<f64>,
    pv_carry_costs: Option<f64>,
    volatility: Option<f64>,
    pricing_date: Option<NaiveDate>,
    dividends: Option<DividendSchedule>,
}

impl MarketContextBuilder {
    /// Sets the spot (or futures) level.
    #[inline]
    pub fn spot(mut self, spot: f64) -> Self {
        self.spot = Some(spot);
        self
    }

    /// Sets the risk-free (domestic) rate.
    #[inline]
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Sets the continuous carry yield directly.
    #[inline]
    pub fn carry_yield(mut self, carry_yield: f64) -> Self {
        self.carry_yield = Some(carry_yield);
        self
    }

    /// Sets the continuous dividend yield of an equity.
    #[inline]
    pub fn dividend_yield(self, dividend_yield: f64) -> Self {
        self.carry_yield(dividend_yield)
    }

    /// Sets the foreign rate of a currency pair.
    #[inline]
    pub fn foreign_rate(self, foreign_rate: f64) -> Self {
        self.carry_yield(foreign_rate)
    }

    /// Sets the convenience yield of a commodity.
    #[inline]
    pub fn convenience_yield(self, convenience_yield: f64) -> Self {
        self.carry_yield(convenience_yield)
    }

    /// Sets the continuous cost-of-carry yield.
    #[inline]
    pub fn cost_yield(mut self, cost_yield: f64) -> Self {
        self.cost_yield = Some(cost_yield);
        self
    }

    /// Sets a lump present value of carry costs.
    #[inline]
    pub fn pv_carry_costs(mut self, pv: f64) -> Self {
        self.pv_carry_costs = Some(pv);
        self
    }

    #[inline]
    pub fn volatility(mut self, volatility: f64) -> Self {
        self.volatility = Some(volatility);
        self
    }

    #[inline]
    pub fn pricing_date(mut self, pricing_date: NaiveDate) -> Self {
        self.pricing_date = Some(pricing_date);
        self
    }

    /// Sets the discrete cash-dividend schedule.
    pub fn dividends(mut self, dividends: DividendSchedule) -> Self {
        self.dividends = Some(dividends);
        self
    }

    /// Validates and builds a [`MarketContext`].
    ///
    /// Unset spot falls back to [`SPOT_FLOOR`], unset volatility to
    /// [`DEFAULT_VOLATILITY`], unset rates and yields to zero.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use vanillaferric::market::MarketContext;
    ///
    /// let market = MarketContext::builder()
    ///     .spot(110.0)
    ///     .rate(0.05)
    ///     .dividend_yield(0.01)
    ///     .volatility(0.25)
    ///     .pricing_date(NaiveDate::from_ymd_opt(2018, 5, 31).unwrap())
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(market.carry_yield, 0.01);
    /// assert!(market.dividends.is_empty());
    /// ```
    pub fn build(self) -> Result<MarketContext, PricingError> {
        let pricing_date = self.pricing_date.ok_or_else(|| {
            PricingError::InvalidInput("market pricing date is required".to_string())
        })?;

        let spot = self.spot.unwrap_or(SPOT_FLOOR);
        if !spot.is_finite() || spot <= 0.0 {
            return Err(PricingError::InvalidInput(
                "market spot must be finite and > 0".to_string(),
            ));
        }

        let volatility = self.volatility.unwrap_or(DEFAULT_VOLATILITY);
        if !volatility.is_finite() || volatility <= 0.0 {
            return Err(PricingError::InvalidInput(
                "market volatility must be finite and > 0".to_string(),
            ));
        }

        let rate = self.rate.unwrap_or(0.0);
        let carry_yield = self.carry_yield.unwrap_or(0.0);
        let cost_yield = self.cost_yield.unwrap_or(0.0);
        let pv_carry_costs = self.pv_carry_costs.unwrap_or(0.0);
        for (name, value) in [
            ("rate", rate),
            ("carry yield", carry_yield),
            ("cost yield", cost_yield),
            ("pv carry costs", pv_carry_costs),
        ] {
            if !value.is_finite() {
                return Err(PricingError::InvalidInput(format!(
                    "market {name} must be finite"
                )));
            }
        }

        Ok(MarketContext {
            spot,
            rate,
            carry_yield,
            cost_yield,
            pv_carry_costs,
            volatility,
            pricing_date,
            dividends: Arc::new(self.dividends.unwrap_or_default()),
        })
    }
}
