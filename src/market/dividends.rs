//! Module `market::dividends`.
//!
//! Discrete cash-dividend schedules and their projection onto model time.
//!
//! A [`DividendSchedule`] holds dated cash amounts. Engines never read it
//! directly: [`process_dividends`] keeps the ex-dates that fall inside the
//! option's life and maps them to year fractions (365-day year), and
//! [`present_value_of_dividends`] discounts what is still to be paid from a
//! given model time.
//!
//! References:
//! - Hull, *Options, Futures, and Other Derivatives* (11th ed.), Ch. 15 and 21
//!   (known cash dividends subtracted from spot at their present value).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::PricingError;

/// Days per year used for every date-to-time conversion.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Cash dividend paid on an ex-date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashDividend {
    pub ex_date: NaiveDate,
    pub amount: f64,
}

impl CashDividend {
    /// Builds a validated cash dividend.
    pub fn new(ex_date: NaiveDate, amount: f64) -> Result<Self, PricingError> {
        let dividend = Self { ex_date, amount };
        dividend.validate()?;
        Ok(dividend)
    }

    fn validate(self) -> Result<(), PricingError> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "dividend amount on {} must be finite and >= 0",
                self.ex_date
            )));
        }
        Ok(())
    }
}

/// Ordered list of cash dividends.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DividendSchedule {
    events: Vec<CashDividend>,
}

impl DividendSchedule {
    /// Builds a schedule sorted by ex-date. Same-day entries keep their order.
    pub fn new(mut events: Vec<CashDividend>) -> Result<Self, PricingError> {
        for event in &events {
            event.validate()?;
        }
        events.sort_by_key(|event| event.ex_date);
        Ok(Self { events })
    }

    /// Builds a schedule from `(ex-date, amount)` pairs.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use vanillaferric::market::DividendSchedule;
    ///
    /// let d = |m, day| NaiveDate::from_ymd_opt(2018, m, day).unwrap();
    /// let schedule = DividendSchedule::from_pairs(&[(d(9, 15), 0.6), (d(6, 15), 0.5)]).unwrap();
    /// assert_eq!(schedule.events()[0].amount, 0.5);
    /// ```
    pub fn from_pairs(pairs: &[(NaiveDate, f64)]) -> Result<Self, PricingError> {
        Self::new(
            pairs
                .iter()
                .map(|&(ex_date, amount)| CashDividend { ex_date, amount })
                .collect(),
        )
    }

    /// Returns an empty schedule.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[inline]
    pub fn events(&self) -> &[CashDividend] {
        &self.events
    }

    /// Sub-schedule of dividends with ex-date in `(pricing_date, expiry_date]`.
    pub fn within(&self, pricing_date: NaiveDate, expiry_date: NaiveDate) -> Self {
        Self {
            events: self
                .events
                .iter()
                .copied()
                .filter(|event| event.ex_date > pricing_date && event.ex_date <= expiry_date)
                .collect(),
        }
    }
}

/// Dividend projected onto model time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessedDividend {
    /// Year fraction from the pricing date to the ex-date.
    pub time: f64,
    pub amount: f64,
}

/// Projects a schedule onto model time.
///
/// Keeps ex-dates strictly after `pricing_date` and on or before
/// `expiry_date`; the result preserves schedule order.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use vanillaferric::market::{process_dividends, DividendSchedule};
///
/// let d = |m, day| NaiveDate::from_ymd_opt(2018, m, day).unwrap();
/// let schedule = DividendSchedule::from_pairs(&[
///     (d(5, 31), 1.0), // on the pricing date: excluded
///     (d(6, 30), 0.5), // on expiry: included
///     (d(7, 15), 0.5), // after expiry: excluded
/// ])
/// .unwrap();
/// let processed = process_dividends(&schedule, d(5, 31), d(6, 30));
/// assert_eq!(processed.len(), 1);
/// assert!((processed[0].time - 30.0 / 365.0).abs() < 1e-15);
/// ```
pub fn process_dividends(
    schedule: &DividendSchedule,
    pricing_date: NaiveDate,
    expiry_date: NaiveDate,
) -> Vec<ProcessedDividend> {
    schedule
        .events()
        .iter()
        .filter(|event| event.ex_date > pricing_date && event.ex_date <= expiry_date)
        .map(|event| ProcessedDividend {
            time: (event.ex_date - pricing_date).num_days() as f64 / DAYS_PER_YEAR,
            amount: event.amount,
        })
        .collect()
}

/// Present value at `from_time` of the dividends not yet paid.
///
/// Entries with `time < from_time` are treated as already paid and skipped.
#[inline]
pub fn present_value_of_dividends(processed: &[ProcessedDividend], from_time: f64, rate: f64) -> f64 {
    processed
        .iter()
        .filter(|dividend| dividend.time - from_time >= 0.0)
        .map(|dividend| dividend.amount * (-rate * (dividend.time - from_time)).exp())
        .sum()
}
