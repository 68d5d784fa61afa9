//! Canonical plain-vanilla option contract definition used throughout the library.
//!
//! [`VanillaOption`] stores side, strike, expiry date, exercise rights
//! ([`crate::core::ExerciseStyle`]: European/American) and the underlying
//! class that decides which carry terms the models apply.
//! References: Hull (2018), Ch. 10-13 for payoff and exercise conventions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{ExerciseStyle, Instrument, ModelKind, OptionType, PricingError, UnderlyingClass};
use crate::pricing::permitted_models;

/// Vanilla option contract.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use vanillaferric::core::{ExerciseStyle, OptionType, UnderlyingClass};
/// use vanillaferric::instruments::VanillaOption;
///
/// let option = VanillaOption {
///     option_type: OptionType::Call,
///     strike: 100.0,
///     expiry_date: NaiveDate::from_ymd_opt(2018, 6, 30).unwrap(),
///     exercise: ExerciseStyle::European,
///     underlying: UnderlyingClass::Equity,
/// };
/// assert!(option.validate().is_ok());
/// assert_eq!(option.payoff(110.0), 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VanillaOption {
    /// Call or put.
    pub option_type: OptionType,
    /// Strike level.
    pub strike: f64,
    /// Last exercise date.
    pub expiry_date: NaiveDate,
    /// Exercise style.
    pub exercise: ExerciseStyle,
    /// Asset class of the underlying.
    pub underlying: UnderlyingClass,
}

impl VanillaOption {
    /// Builds an option on the given underlying class.
    pub fn new(
        option_type: OptionType,
        strike: f64,
        expiry_date: NaiveDate,
        exercise: ExerciseStyle,
        underlying: UnderlyingClass,
    ) -> Self {
        Self {
            option_type,
            strike,
            expiry_date,
            exercise,
            underlying,
        }
    }

    /// Builds a European call on an equity.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use vanillaferric::core::{ExerciseStyle, OptionType};
    /// use vanillaferric::instruments::VanillaOption;
    ///
    /// let call = VanillaOption::european_call(100.0, NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
    /// assert_eq!(call.option_type, OptionType::Call);
    /// assert!(matches!(call.exercise, ExerciseStyle::European));
    /// ```
    pub fn european_call(strike: f64, expiry_date: NaiveDate) -> Self {
        Self::new(
            OptionType::Call,
            strike,
            expiry_date,
            ExerciseStyle::European,
            UnderlyingClass::Equity,
        )
    }

    /// Builds a European put on an equity.
    pub fn european_put(strike: f64, expiry_date: NaiveDate) -> Self {
        Self::new(
            OptionType::Put,
            strike,
            expiry_date,
            ExerciseStyle::European,
            UnderlyingClass::Equity,
        )
    }

    /// Builds an American call on an equity.
    pub fn american_call(strike: f64, expiry_date: NaiveDate) -> Self {
        Self::new(
            OptionType::Call,
            strike,
            expiry_date,
            ExerciseStyle::American,
            UnderlyingClass::Equity,
        )
    }

    /// Builds an American put on an equity.
    pub fn american_put(strike: f64, expiry_date: NaiveDate) -> Self {
        Self::new(
            OptionType::Put,
            strike,
            expiry_date,
            ExerciseStyle::American,
            UnderlyingClass::Equity,
        )
    }

    /// Same contract on another underlying class.
    pub fn on(mut self, underlying: UnderlyingClass) -> Self {
        self.underlying = underlying;
        self
    }

    /// Exercise value at underlying level `level`.
    #[inline]
    pub fn payoff(&self, level: f64) -> f64 {
        (self.option_type.sign() * (level - self.strike)).max(0.0)
    }

    /// Models permitted for this option's underlying class and exercise style.
    pub fn list_models(&self) -> &'static [ModelKind] {
        permitted_models(self.underlying, self.exercise)
    }

    /// Validates instrument fields.
    ///
    /// # Errors
    /// Returns [`PricingError::InvalidInput`] when the strike is not finite
    /// and positive.
    pub fn validate(&self) -> Result<(), PricingError> {
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(PricingError::InvalidInput(
                "vanilla strike must be finite and > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Instrument for VanillaOption {
    fn instrument_type(&self) -> &str {
        "VanillaOption"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 6, 30).unwrap()
    }

    #[test]
    fn payoff_is_intrinsic_value() {
        let call = VanillaOption::european_call(100.0, expiry());
        let put = VanillaOption::american_put(100.0, expiry());
        assert_eq!(call.payoff(120.0), 20.0);
        assert_eq!(call.payoff(80.0), 0.0);
        assert_eq!(put.payoff(80.0), 20.0);
        assert_eq!(put.payoff(120.0), 0.0);
    }

    #[test]
    fn validate_rejects_non_positive_strike() {
        assert!(VanillaOption::european_call(0.0, expiry()).validate().is_err());
        assert!(VanillaOption::european_call(f64::NAN, expiry()).validate().is_err());
        assert!(VanillaOption::european_call(1.0, expiry()).validate().is_ok());
    }

    #[test]
    fn list_models_depends_on_exercise() {
        let european = VanillaOption::european_call(100.0, expiry()).on(UnderlyingClass::Fx);
        assert_eq!(
            european.list_models(),
            &[
                ModelKind::GarmanKohlhagen,
                ModelKind::MonteCarloGbm,
                ModelKind::Binomial
            ]
        );
        let american = VanillaOption::american_call(100.0, expiry());
        assert!(!american.list_models().contains(&ModelKind::BlackScholesMerton));
    }
}
