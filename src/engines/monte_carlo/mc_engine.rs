//! Module `engines::monte_carlo::mc_engine`.
//!
//! Lognormal Monte Carlo engine for vanilla options.
//!
//! European options without dividends simulate terminal values only; any
//! dividend or American exercise switches to full paths. American exercise is
//! valued with Longstaff-Schwartz regression over the simulated paths.
//!
//! References: Glasserman (2004) Ch. 1 and 4, Hull (11th ed.) Ch. 21.
//!
//! Numerical considerations: the reported standard error is the sample
//! standard deviation of the discounted per-path values over `sqrt(n)`.
//! Antithetic pairs double the path count and are not independent, so the
//! reported error is conservative in that mode.

use std::sync::Arc;

use crate::config::MonteCarloConfig;
use crate::core::{
    DiagKey, Diagnostics, ExerciseStyle, ModelKind, PricingEngine, PricingError, PricingResult,
};
use crate::engines::lsm::LongstaffSchwartz;
use crate::instruments::VanillaOption;
use crate::market::{present_value_of_dividends, MarketContext};

use super::paths::{GbmSimulator, NormalDraws, SimulationMode};

/// Monte Carlo pricing engine under geometric Brownian motion.
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    /// Number of independent paths before antithetic doubling.
    pub num_paths: usize,
    /// Time steps per path in full-path mode.
    pub num_steps: usize,
    pub seed: u64,
    pub antithetic: bool,
    /// Laguerre degree of the early-exercise regression.
    pub regression_degree: usize,
    /// Caller-supplied normals used instead of seeded draws.
    pub draws: Option<Arc<NormalDraws>>,
}

impl MonteCarloEngine {
    /// Creates a seeded engine.
    pub fn new(num_paths: usize, num_steps: usize, seed: u64) -> Self {
        Self {
            num_paths,
            num_steps,
            seed,
            antithetic: false,
            regression_degree: 4,
            draws: None,
        }
    }

    /// Engine sized from configuration for the given exercise style.
    pub fn from_config(config: &MonteCarloConfig, exercise: ExerciseStyle) -> Self {
        Self {
            num_paths: config.paths_for(exercise),
            num_steps: config.steps,
            seed: config.seed,
            antithetic: config.antithetic,
            regression_degree: config.regression_degree,
            draws: None,
        }
    }

    pub fn with_antithetic(mut self, antithetic: bool) -> Self {
        self.antithetic = antithetic;
        self
    }

    /// Uses `draws` as the random input. Its shape must be
    /// `num_paths x 1` in final-value mode and `num_paths x num_steps` otherwise.
    pub fn with_draws(mut self, draws: Arc<NormalDraws>) -> Self {
        self.draws = Some(draws);
        self
    }

    /// Simulation layout required for `instrument` under `market`.
    pub fn simulation_mode(instrument: &VanillaOption, market: &MarketContext) -> SimulationMode {
        let has_dividends = !market.processed_dividends(instrument.expiry_date).is_empty();
        match instrument.exercise {
            ExerciseStyle::European if !has_dividends => SimulationMode::FinalValue,
            _ => SimulationMode::FullPath,
        }
    }

    fn normal_draws(&self, columns: usize) -> Result<Arc<NormalDraws>, PricingError> {
        let draws = match &self.draws {
            Some(draws) => {
                draws.expect_shape(self.num_paths, columns)?;
                Arc::clone(draws)
            }
            None => Arc::new(NormalDraws::generate(self.num_paths, columns, self.seed)),
        };
        if self.antithetic {
            Ok(Arc::new(NormalDraws::clone(&draws).with_antithetic()))
        } else {
            Ok(draws)
        }
    }
}

fn mean_and_stderr(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mut sum = 0.0_f64;
    let mut sum_sq = 0.0_f64;
    for &v in values {
        sum += v;
        sum_sq += v * v;
    }
    let mean = sum / n;
    let var = if values.len() > 1 {
        ((sum_sq - sum * sum / n) / (n - 1.0)).max(0.0)
    } else {
        0.0
    };
    (mean, (var / n).sqrt())
}

impl PricingEngine<VanillaOption> for MonteCarloEngine {
    fn model_kind(&self) -> ModelKind {
        ModelKind::MonteCarloGbm
    }

    fn price(
        &self,
        instrument: &VanillaOption,
        market: &MarketContext,
    ) -> Result<PricingResult, PricingError> {
        instrument.validate()?;
        if self.num_paths == 0 {
            return Err(PricingError::InvalidInput(
                "num_paths must be > 0".to_string(),
            ));
        }
        if self.num_steps == 0 {
            return Err(PricingError::InvalidInput(
                "num_steps must be > 0".to_string(),
            ));
        }

        let maturity = market.time_to_expiry(instrument.expiry_date)?;
        let dividends = market.processed_dividends(instrument.expiry_date);
        let escrowed_spot = market.spot - present_value_of_dividends(&dividends, 0.0, market.rate);
        if !(escrowed_spot > 0.0) {
            return Err(PricingError::InvalidInput(format!(
                "dividend-adjusted spot must be > 0, got {escrowed_spot}"
            )));
        }
        let mode = Self::simulation_mode(instrument, market);
        if mode == SimulationMode::FullPath && instrument.exercise == ExerciseStyle::European {
            tracing::warn!(
                dividends = dividends.len(),
                "dividends present, simulating full paths for European option"
            );
        }

        let simulator = GbmSimulator {
            spot: market.spot,
            drift: market.rate + market.cost_yield
                - market.effective_carry_yield(instrument.underlying),
            volatility: market.volatility,
            maturity,
            steps: self.num_steps,
        };
        let draws = self.normal_draws(simulator.draw_columns(mode))?;
        let paths = simulator.simulate(mode, &draws, &dividends)?;

        let mut diagnostics = Diagnostics::new();
        diagnostics.insert(DiagKey::NumPaths, paths.num_paths() as f64);
        diagnostics.insert(DiagKey::NumSteps, self.num_steps as f64);
        diagnostics.insert(DiagKey::Vol, market.volatility);

        let discounted = match instrument.exercise {
            ExerciseStyle::European => {
                let discount = (-market.rate * maturity).exp();
                paths
                    .terminal_levels()
                    .map(|level| discount * instrument.payoff(level))
                    .collect::<Vec<_>>()
            }
            ExerciseStyle::American => {
                let step_discount = (-market.rate * simulator.dt()).exp();
                let outcome = LongstaffSchwartz::new(step_discount, self.regression_degree)
                    .value(instrument, &paths)?;
                diagnostics.insert(
                    DiagKey::SkippedRegressions,
                    outcome.skipped_regressions as f64,
                );
                outcome.discounted_values
            }
        };

        let (price, stderr) = mean_and_stderr(&discounted);
        if !price.is_finite() {
            return Err(PricingError::NumericalError(
                "Monte Carlo estimate is not finite".to_string(),
            ));
        }
        tracing::debug!(
            model = "MC_GBM",
            paths = paths.num_paths(),
            ?mode,
            price,
            stderr,
            "priced"
        );

        Ok(PricingResult {
            price,
            stderr: Some(stderr),
            greeks: None,
            diagnostics,
        })
    }
}
