//! Finite-difference risk for engines without closed-form Greeks.

pub mod numerical;

pub use numerical::{numerical_risk_functions, NumericalGreeks, RiskFunction};
