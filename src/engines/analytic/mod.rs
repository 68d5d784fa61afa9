//! Closed-form analytic pricing engines.

mod lognormal;

pub mod black76;
pub mod black_scholes;
pub mod garman_kohlhagen;

pub use black76::Black76Engine;
pub use black_scholes::BlackScholesEngine;
pub use garman_kohlhagen::GarmanKohlhagenEngine;
