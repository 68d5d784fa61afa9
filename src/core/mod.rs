//! Core traits, common domain types, and library-wide result/error structures.

use std::collections::BTreeMap;

use crate::config::ImpliedVolConfig;
use crate::market::MarketContext;

pub mod types;

pub use types::*;

/// Standardized Greeks container used by engine results.
///
/// Vega and rho are quoted per one point (1%) move, theta per calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Greeks {
    /// First derivative to spot.
    pub delta: f64,
    /// Second derivative to spot.
    pub gamma: f64,
    /// First derivative to volatility.
    pub vega: f64,
    /// First derivative to time.
    pub theta: f64,
    /// First derivative to rate.
    pub rho: f64,
}

impl Greeks {
    /// Expands the five standard sensitivities into a named mapping.
    pub fn to_risk_parameters(self) -> RiskParameters {
        BTreeMap::from([
            (RiskParameter::Delta, self.delta),
            (RiskParameter::Gamma, self.gamma),
            (RiskParameter::Theta, self.theta),
            (RiskParameter::Vega, self.vega),
            (RiskParameter::Rho, self.rho),
        ])
    }
}

/// Named sensitivities reported to callers.
pub type RiskParameters = BTreeMap<RiskParameter, f64>;

/// Common trait implemented by every priceable instrument.
pub trait Instrument: std::fmt::Debug {
    /// Returns a short type identifier for diagnostics.
    fn instrument_type(&self) -> &str;
}

/// Pricing engine abstraction over an instrument type.
///
/// Every engine values an instrument against an explicit market snapshot,
/// so the same engine can be re-run on perturbed snapshots without copying
/// any of its own state.
pub trait PricingEngine<I: Instrument>: std::fmt::Debug + Send + Sync {
    /// Model identifier used in diagnostics and error messages.
    fn model_kind(&self) -> ModelKind;

    /// Prices an instrument under the provided market state.
    fn price(&self, instrument: &I, market: &MarketContext) -> Result<PricingResult, PricingError>;

    /// Closed-form capability, when the engine has one.
    fn analytic(&self) -> Option<&dyn AnalyticEngine<I>> {
        None
    }
}

/// Closed-form Greeks and implied volatility, offered only by analytic engines.
pub trait AnalyticEngine<I: Instrument>: PricingEngine<I> {
    /// Closed-form sensitivities at the current snapshot.
    fn risk_parameters(
        &self,
        instrument: &I,
        market: &MarketContext,
    ) -> Result<RiskParameters, PricingError>;

    /// Solves for the volatility that reproduces `premium`.
    fn implied_volatility(
        &self,
        instrument: &I,
        market: &MarketContext,
        premium: f64,
        config: &ImpliedVolConfig,
    ) -> Result<f64, PricingError>;
}

/// Compact key set for engine diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagKey {
    AdjustedSpot,
    CarryDiscountFactor,
    D1,
    D2,
    DiscountFactor,
    NumPaths,
    NumSteps,
    Pu,
    PvDividends,
    SkippedRegressions,
    U,
    Vol,
}

impl DiagKey {
    pub const COUNT: usize = 12;

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AdjustedSpot => "adjusted_spot",
            Self::CarryDiscountFactor => "carry_discount_factor",
            Self::D1 => "d1",
            Self::D2 => "d2",
            Self::DiscountFactor => "discount_factor",
            Self::NumPaths => "num_paths",
            Self::NumSteps => "num_steps",
            Self::Pu => "pu",
            Self::PvDividends => "pv_dividends",
            Self::SkippedRegressions => "skipped_regressions",
            Self::U => "u",
            Self::Vol => "vol",
        }
    }
}

impl std::str::FromStr for DiagKey {
    type Err = ();

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "adjusted_spot" => Ok(Self::AdjustedSpot),
            "carry_discount_factor" => Ok(Self::CarryDiscountFactor),
            "d1" => Ok(Self::D1),
            "d2" => Ok(Self::D2),
            "discount_factor" => Ok(Self::DiscountFactor),
            "num_paths" => Ok(Self::NumPaths),
            "num_steps" => Ok(Self::NumSteps),
            "pu" => Ok(Self::Pu),
            "pv_dividends" => Ok(Self::PvDividends),
            "skipped_regressions" => Ok(Self::SkippedRegressions),
            "u" => Ok(Self::U),
            "vol" => Ok(Self::Vol),
            _ => Err(()),
        }
    }
}

/// Inline diagnostics storage used in [`PricingResult`].
///
/// One slot per [`DiagKey`], so inserts never run out of room.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    entries: [Option<(DiagKey, f64)>; DiagKey::COUNT],
}

impl Diagnostics {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries[0].is_none()
    }

    /// Inserts or replaces a value, returning the previous one.
    #[inline]
    pub fn insert(&mut self, key: DiagKey, value: f64) -> Option<f64> {
        for (entry_key, existing) in self.entries.iter_mut().flatten() {
            if *entry_key == key {
                let prev = *existing;
                *existing = value;
                return Some(prev);
            }
        }

        if let Some(slot) = self.entries.iter_mut().find(|entry| entry.is_none()) {
            *slot = Some((key, value));
        }
        None
    }

    #[inline]
    fn find_entry(&self, key: DiagKey) -> Option<&f64> {
        self.entries
            .iter()
            .flatten()
            .find_map(|(entry_key, value)| (*entry_key == key).then_some(value))
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&f64> {
        let key: DiagKey = key.parse().ok()?;
        self.find_entry(key)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &f64)> {
        self.entries
            .iter()
            .flatten()
            .map(|(k, v)| (k.as_str(), v))
    }
}

/// Unified engine result payload.
#[derive(Debug, Clone)]
pub struct PricingResult {
    /// Present value.
    pub price: f64,
    /// Standard error of the estimate (Monte Carlo only).
    pub stderr: Option<f64>,
    /// Greeks when available from the engine.
    pub greeks: Option<Greeks>,
    /// Engine-specific scalar diagnostics.
    pub diagnostics: Diagnostics,
}

/// Engine and model errors surfaced by the API.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    /// Input validation error.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A fail-fast invariant such as pricing date before expiry.
    #[error("precondition violated: {0}")]
    Precondition(String),
    /// Model not permitted for the instrument.
    #[error(
        "model {model} is not supported for {exercise} {underlying} options; valid models: {supported}"
    )]
    ModelNotSupported {
        model: String,
        underlying: UnderlyingClass,
        exercise: ExerciseStyle,
        supported: String,
    },
    /// Operation only offered by another model family.
    #[error("{operation} is not supported by the {model} model")]
    UnsupportedOperation {
        operation: &'static str,
        model: ModelKind,
    },
    /// Implied-volatility root search failed.
    #[error(
        "implied volatility did not converge for premium {premium} within [{lower}, {upper}]"
    )]
    ImpliedVolatility { premium: f64, lower: f64, upper: f64 },
    /// Caller-supplied random draws have the wrong shape.
    #[error(
        "dimension mismatch: normal draws are {rows}x{cols}, simulation needs {expected_rows}x{expected_cols}"
    )]
    DimensionMismatch {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
    /// Numerical issue (overflow, invalid state, etc.).
    #[error("numerical error: {0}")]
    NumericalError(String),
    /// Engine configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}
