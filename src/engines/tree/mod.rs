//! Tree-based pricing engines.

pub mod binomial;

pub use binomial::{BinomialTreeEngine, LatticeParameters, NodeCache};
