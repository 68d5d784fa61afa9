//! Engine tuning parameters.
//!
//! Every numeric knob of the pricing engines lives here so that a whole
//! pricing setup can be read from one TOML document:
//!
//! ```toml
//! [binomial]
//! steps = 250
//!
//! [monte_carlo]
//! american_paths = 20000
//! seed = 7
//! antithetic = true
//!
//! [bumps]
//! spot = 0.01
//! ```
//!
//! Missing tables and fields fall back to [`EngineConfig::default`].

use serde::{Deserialize, Serialize};

use crate::core::{ExerciseStyle, PricingError, RiskFactor};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub binomial: BinomialConfig,
    pub monte_carlo: MonteCarloConfig,
    pub bumps: BumpConfig,
    pub implied_vol: ImpliedVolConfig,
}

impl EngineConfig {
    /// Parses a TOML document.
    ///
    /// # Examples
    /// ```
    /// use vanillaferric::config::EngineConfig;
    ///
    /// let config = EngineConfig::from_toml_str("[binomial]\nsteps = 250\n").unwrap();
    /// assert_eq!(config.binomial.steps, 250);
    /// assert_eq!(config.monte_carlo.seed, 100);
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self, PricingError> {
        let config: Self =
            toml::from_str(input).map_err(|err| PricingError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no engine can run with.
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.binomial.steps == 0 {
            return Err(PricingError::Config("binomial.steps must be > 0".to_string()));
        }
        if self.monte_carlo.steps == 0 {
            return Err(PricingError::Config(
                "monte_carlo.steps must be > 0".to_string(),
            ));
        }
        if self.monte_carlo.european_paths == 0 || self.monte_carlo.american_paths == 0 {
            return Err(PricingError::Config(
                "monte_carlo path counts must be > 0".to_string(),
            ));
        }
        self.bumps.validate()?;
        self.implied_vol.validate()
    }
}

/// Binomial lattice settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinomialConfig {
    pub steps: usize,
}

impl Default for BinomialConfig {
    fn default() -> Self {
        Self { steps: 100 }
    }
}

/// Monte Carlo settings.
///
/// European pricing simulates terminal values only and affords many more
/// paths than the full-path regression used for American exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub european_paths: usize,
    pub american_paths: usize,
    pub steps: usize,
    pub seed: u64,
    pub antithetic: bool,
    /// Degree of the Laguerre basis used by the exercise regression.
    pub regression_degree: usize,
}

impl MonteCarloConfig {
    /// Default path count for the given exercise style.
    pub fn paths_for(&self, exercise: ExerciseStyle) -> usize {
        match exercise {
            ExerciseStyle::European => self.european_paths,
            ExerciseStyle::American => self.american_paths,
        }
    }
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            european_paths: 200_000,
            american_paths: 10_000,
            steps: 100,
            seed: 100,
            antithetic: false,
            regression_degree: 4,
        }
    }
}

/// Finite-difference bump sizes.
///
/// `spot`, `volatility`, `rate`, `carry_yield` and `cost_yield` are relative
/// fractions of the current value; `time_days` is whole calendar days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BumpConfig {
    pub spot: f64,
    pub volatility: f64,
    pub rate: f64,
    pub time_days: i64,
    pub carry_yield: f64,
    pub cost_yield: f64,
}

impl BumpConfig {
    /// Relative bump for a scalar factor; `None` for the pricing date.
    pub fn fraction(&self, factor: RiskFactor) -> Option<f64> {
        match factor {
            RiskFactor::Spot => Some(self.spot),
            RiskFactor::PricingDate => None,
            RiskFactor::Volatility => Some(self.volatility),
            RiskFactor::Rate => Some(self.rate),
            RiskFactor::CarryYield => Some(self.carry_yield),
            RiskFactor::CostYield => Some(self.cost_yield),
        }
    }

    pub fn validate(&self) -> Result<(), PricingError> {
        let fractions = [
            ("spot", self.spot),
            ("volatility", self.volatility),
            ("rate", self.rate),
            ("carry_yield", self.carry_yield),
            ("cost_yield", self.cost_yield),
        ];
        for (name, value) in fractions {
            if !value.is_finite() || !(0.0..1.0).contains(&value) {
                return Err(PricingError::Config(format!(
                    "bumps.{name} must be finite and in [0, 1)"
                )));
            }
        }
        if self.time_days < 0 {
            return Err(PricingError::Config(
                "bumps.time_days must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BumpConfig {
    fn default() -> Self {
        Self {
            spot: 0.02,
            volatility: 0.02,
            rate: 0.02,
            time_days: 1,
            carry_yield: 0.0,
            cost_yield: 0.0,
        }
    }
}

/// Bracket and tolerance for the implied-volatility bisection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpliedVolConfig {
    pub lower: f64,
    pub upper: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl ImpliedVolConfig {
    pub fn validate(&self) -> Result<(), PricingError> {
        if !(self.lower > 0.0 && self.upper > self.lower && self.upper.is_finite()) {
            return Err(PricingError::Config(
                "implied_vol bracket must satisfy 0 < lower < upper".to_string(),
            ));
        }
        if !(self.tolerance > 0.0) || self.max_iterations == 0 {
            return Err(PricingError::Config(
                "implied_vol tolerance and max_iterations must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ImpliedVolConfig {
    fn default() -> Self {
        Self {
            lower: 5.0e-5,
            upper: 2.0,
            tolerance: 5.0e-5,
            max_iterations: 200,
        }
    }
}
