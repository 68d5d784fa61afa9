//! Monte Carlo pricing engines.

pub mod mc_engine;
pub mod paths;

pub use mc_engine::MonteCarloEngine;
pub use paths::{GbmSimulator, NormalDraws, SimulatedPaths, SimulationMode};
