//! Pricing engine implementations.

pub mod analytic;
pub mod lsm;
pub mod monte_carlo;
pub mod tree;
