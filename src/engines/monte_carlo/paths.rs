//! Geometric Brownian motion path simulation.
//!
//! Two layouts are produced:
//! - final value: one column holding `S_T = S0 exp((mu - sigma^2/2) T + sigma sqrt(T) Z)`;
//! - full path: `steps + 1` columns starting at `S0`, built by compounding
//!   the per-step log increments.
//!
//! In full-path mode each cash dividend `D` with ex-time `t` is removed after
//! the fact: with `n = floor(t / dt)`, every column `j > n` loses
//! `D * exp(sum of increments n..j-1)`, i.e. the dividend grown at the
//! path's own realised return from the step it was paid.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

use crate::core::PricingError;
use crate::market::ProcessedDividend;

/// How much of each trajectory is simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    /// Single terminal draw per path.
    FinalValue,
    /// One draw per time step.
    FullPath,
}

/// Row-major matrix of standard normal variates, one row per path.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalDraws {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl NormalDraws {
    /// Wraps caller-supplied variates.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, PricingError> {
        if data.len() != rows * cols {
            return Err(PricingError::DimensionMismatch {
                expected_rows: rows,
                expected_cols: cols,
                rows: data.len() / cols.max(1),
                cols,
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Draws `rows x cols` variates from a generator seeded with `seed`.
    pub fn generate(rows: usize, cols: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..rows * cols)
            .map(|_| StandardNormal.sample(&mut rng))
            .collect();
        Self { rows, cols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn row(&self, index: usize) -> &[f64] {
        &self.data[index * self.cols..(index + 1) * self.cols]
    }

    /// Fails unless the matrix is exactly `rows x cols`.
    pub fn expect_shape(&self, rows: usize, cols: usize) -> Result<(), PricingError> {
        if self.rows != rows || self.cols != cols {
            return Err(PricingError::DimensionMismatch {
                expected_rows: rows,
                expected_cols: cols,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    /// Appends the negated variates below the originals.
    pub fn with_antithetic(mut self) -> Self {
        self.data.extend_from_within(..);
        let half = self.rows * self.cols;
        for z in &mut self.data[half..] {
            *z = -*z;
        }
        self.rows *= 2;
        self
    }
}

/// Simulated underlying levels, one row per path.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPaths {
    num_paths: usize,
    num_columns: usize,
    levels: Vec<f64>,
}

impl SimulatedPaths {
    #[inline]
    pub fn num_paths(&self) -> usize {
        self.num_paths
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    #[inline]
    pub fn path(&self, index: usize) -> &[f64] {
        &self.levels[index * self.num_columns..(index + 1) * self.num_columns]
    }

    #[inline]
    pub fn level(&self, path: usize, column: usize) -> f64 {
        self.levels[path * self.num_columns + column]
    }

    /// Levels in the last column.
    pub fn terminal_levels(&self) -> impl Iterator<Item = f64> + '_ {
        self.levels
            .chunks_exact(self.num_columns)
            .map(|row| row[row.len() - 1])
    }
}

/// Lognormal simulator for one parameter snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct GbmSimulator {
    pub spot: f64,
    /// Risk-neutral drift `r + cost - yield`.
    pub drift: f64,
    pub volatility: f64,
    pub maturity: f64,
    pub steps: usize,
}

impl GbmSimulator {
    #[inline]
    pub fn dt(&self) -> f64 {
        self.maturity / self.steps as f64
    }

    /// Number of normal columns needed per path in `mode`.
    pub fn draw_columns(&self, mode: SimulationMode) -> usize {
        match mode {
            SimulationMode::FinalValue => 1,
            SimulationMode::FullPath => self.steps,
        }
    }

    /// Simulates one row per draw row.
    pub fn simulate(
        &self,
        mode: SimulationMode,
        draws: &NormalDraws,
        dividends: &[ProcessedDividend],
    ) -> Result<SimulatedPaths, PricingError> {
        draws.expect_shape(draws.rows(), self.draw_columns(mode))?;
        match mode {
            SimulationMode::FinalValue => Ok(self.simulate_final(draws)),
            SimulationMode::FullPath => Ok(self.simulate_full(draws, dividends)),
        }
    }

    fn simulate_final(&self, draws: &NormalDraws) -> SimulatedPaths {
        let drift = (self.drift - 0.5 * self.volatility * self.volatility) * self.maturity;
        let diffusion = self.volatility * self.maturity.sqrt();
        let levels = draws
            .data
            .iter()
            .map(|z| self.spot * (drift + diffusion * z).exp())
            .collect();
        SimulatedPaths {
            num_paths: draws.rows(),
            num_columns: 1,
            levels,
        }
    }

    fn simulate_full(&self, draws: &NormalDraws, dividends: &[ProcessedDividend]) -> SimulatedPaths {
        let dt = self.dt();
        let drift = (self.drift - 0.5 * self.volatility * self.volatility) * dt;
        let diffusion = self.volatility * dt.sqrt();
        let columns = self.steps + 1;
        let dividend_steps: Vec<(usize, f64)> = dividends
            .iter()
            .map(|div| ((div.time / dt) as usize, div.amount))
            .collect();

        let mut levels = Vec::with_capacity(draws.rows() * columns);
        let mut increments = vec![0.0; self.steps];
        for p in 0..draws.rows() {
            for (inc, z) in increments.iter_mut().zip(draws.row(p)) {
                *inc = drift + diffusion * z;
            }

            let start = levels.len();
            levels.push(self.spot);
            let mut log_growth = 0.0;
            for inc in &increments {
                log_growth += inc;
                levels.push(self.spot * log_growth.exp());
            }

            let row = &mut levels[start..];
            for &(n, amount) in &dividend_steps {
                let mut growth = 0.0;
                for j in (n + 1)..columns {
                    growth += increments[j - 1];
                    row[j] -= amount * growth.exp();
                }
            }
        }

        SimulatedPaths {
            num_paths: draws.rows(),
            num_columns: columns,
            levels,
        }
    }
}
