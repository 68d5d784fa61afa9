//! VanillaFerric prices vanilla options on equities, futures, currencies and
//! commodities, with European or American exercise, and computes their risk.
//!
//! Interchangeable engines share one valuation contract
//! ([`core::PricingEngine`]):
//! - closed forms of the Black-Scholes family (Black-Scholes-Merton, Black-76,
//!   Garman-Kohlhagen) with analytic Greeks and implied volatility;
//! - a Cox-Ross-Rubinstein binomial lattice with early exercise;
//! - a geometric Brownian motion Monte Carlo engine with antithetic sampling
//!   and Longstaff-Schwartz regression for American exercise.
//!
//! Engines without closed-form Greeks are differentiated by bump-and-reprice
//! in [`risk::NumericalGreeks`]. [`pricing::Pricer`] checks which models are
//! permitted for an option and exposes the uniform valuation/risk surface.
//!
//! References used across modules include:
//! - Hull, *Options, Futures, and Other Derivatives* (11th ed.), Ch. 13, 15, 17, 18 and 21.
//! - Glasserman (2004) for Monte Carlo estimators.
//! - Longstaff and Schwartz (2001) for regression-based early exercise.
//!
//! Numerical considerations:
//! - Lattice accuracy is controlled by the step count; the error oscillates
//!   with step parity and decays roughly as `1/N`.
//! - Monte Carlo results carry a standard error; American values add
//!   regression bias on top of sampling noise.
//! - Finite-difference Greeks trade truncation error (large bumps) against
//!   cancellation and simulation noise (small bumps).
//!
//! # Feature Flags
//! - `parallel`: values the independent bumped scenarios of numerical risk on
//!   the rayon pool.
//!
//! # Quick Start
//! Price a European call with the default model:
//! ```rust
//! use chrono::NaiveDate;
//! use vanillaferric::config::EngineConfig;
//! use vanillaferric::instruments::VanillaOption;
//! use vanillaferric::market::MarketContext;
//! use vanillaferric::pricing::Pricer;
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2018, m, day).unwrap();
//! let market = MarketContext::builder()
//!     .spot(110.0)
//!     .rate(0.05)
//!     .dividend_yield(0.01)
//!     .volatility(0.25)
//!     .pricing_date(d(5, 31))
//!     .build()
//!     .unwrap();
//! let option = VanillaOption::european_call(100.0, d(6, 30));
//! let pricer = Pricer::new(option, market, None, EngineConfig::default()).unwrap();
//! let value = pricer.valuation().unwrap();
//! assert!((value - 10.60964).abs() < 1e-5);
//! ```
//!
//! Compute Greeks:
//! ```rust
//! use chrono::NaiveDate;
//! use vanillaferric::config::EngineConfig;
//! use vanillaferric::core::RiskParameter;
//! use vanillaferric::instruments::VanillaOption;
//! use vanillaferric::market::MarketContext;
//! use vanillaferric::pricing::Pricer;
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2018, m, day).unwrap();
//! let market = MarketContext::builder()
//!     .spot(110.0)
//!     .rate(0.05)
//!     .dividend_yield(0.01)
//!     .volatility(0.25)
//!     .pricing_date(d(5, 31))
//!     .build()
//!     .unwrap();
//! let option = VanillaOption::european_call(100.0, d(6, 30));
//! let risk = Pricer::new(option, market, None, EngineConfig::default())
//!     .unwrap()
//!     .risk_parameters()
//!     .unwrap();
//! assert!((risk[&RiskParameter::Delta] - 0.9210).abs() < 1e-4);
//! ```
//!
//! Value an American put on a dividend-paying stock with the lattice:
//! ```rust
//! use chrono::NaiveDate;
//! use vanillaferric::config::EngineConfig;
//! use vanillaferric::core::ModelKind;
//! use vanillaferric::instruments::VanillaOption;
//! use vanillaferric::market::{DividendSchedule, MarketContext};
//! use vanillaferric::pricing::Pricer;
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2018, m, day).unwrap();
//! let market = MarketContext::builder()
//!     .spot(100.0)
//!     .rate(0.05)
//!     .volatility(0.3)
//!     .pricing_date(d(1, 1))
//!     .dividends(DividendSchedule::from_pairs(&[(d(6, 15), 2.0)]).unwrap())
//!     .build()
//!     .unwrap();
//! let put = VanillaOption::american_put(100.0, d(12, 31));
//! let pricer = Pricer::new(put, market, Some(ModelKind::Binomial), EngineConfig::default()).unwrap();
//! assert!(pricer.valuation().unwrap() > 9.0);
//! ```
//!
//! Load engine settings from TOML:
//! ```rust
//! use vanillaferric::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str("[monte_carlo]\nseed = 7\nantithetic = true\n").unwrap();
//! assert!(config.monte_carlo.antithetic);
//! ```

pub mod config;
pub mod core;
pub mod engines;
pub mod instruments;
pub mod market;
pub mod math;
pub mod pricing;
pub mod risk;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::*;
    pub use crate::engines::analytic::*;
    pub use crate::engines::monte_carlo::MonteCarloEngine;
    pub use crate::engines::tree::BinomialTreeEngine;
    pub use crate::instruments::*;
    pub use crate::market::*;
    pub use crate::pricing::Pricer;
}
