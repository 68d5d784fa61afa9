use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PricingError;

/// Plain-vanilla option side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Call option payoff profile.
    Call,
    /// Put option payoff profile.
    Put,
}

impl OptionType {
    /// Returns +1.0 for calls and -1.0 for puts.
    pub fn sign(self) -> f64 {
        match self {
            Self::Call => 1.0,
            Self::Put => -1.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => f.write_str("call"),
            Self::Put => f.write_str("put"),
        }
    }
}

/// Exercise rights for an option contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseStyle {
    /// Exercise only at expiry.
    European,
    /// Exercise at any time up to expiry.
    American,
}

impl fmt::Display for ExerciseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::European => f.write_str("European"),
            Self::American => f.write_str("American"),
        }
    }
}

/// Asset class referenced by the option.
///
/// The class decides which continuous yield plays the carry role:
/// dividend yield for equities, the foreign rate for currencies, the
/// convenience yield for commodities. Futures carry at the risk-free rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnderlyingClass {
    Equity,
    Futures,
    Fx,
    Commodity,
}

impl UnderlyingClass {
    pub const ALL: [Self; 4] = [Self::Equity, Self::Futures, Self::Fx, Self::Commodity];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equity => "Stock",
            Self::Futures => "Futures",
            Self::Fx => "Currency",
            Self::Commodity => "Commodity",
        }
    }
}

impl fmt::Display for UnderlyingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a concrete valuation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    /// Black-Scholes-Merton on spot with discrete dividends.
    BlackScholesMerton,
    /// Black-76 on a futures price.
    Black76,
    /// Garman-Kohlhagen with a foreign rate or convenience yield.
    GarmanKohlhagen,
    /// Geometric Brownian motion Monte Carlo (LSM for American exercise).
    MonteCarloGbm,
    /// Recombining binomial lattice.
    Binomial,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BlackScholesMerton => "BSM",
            Self::Black76 => "B76",
            Self::GarmanKohlhagen => "GK",
            Self::MonteCarloGbm => "MC_GBM",
            Self::Binomial => "Binomial",
        }
    }

    /// Returns `true` for the closed-form family.
    pub fn is_analytic(self) -> bool {
        matches!(
            self,
            Self::BlackScholesMerton | Self::Black76 | Self::GarmanKohlhagen
        )
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = PricingError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "BSM" => Ok(Self::BlackScholesMerton),
            "B76" => Ok(Self::Black76),
            "GK" => Ok(Self::GarmanKohlhagen),
            "MC_GBM" | "MC_GBM_LSM" => Ok(Self::MonteCarloGbm),
            "Binomial" => Ok(Self::Binomial),
            other => Err(PricingError::InvalidInput(format!(
                "unknown model name `{other}`"
            ))),
        }
    }
}

/// Named option sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskParameter {
    Delta,
    Gamma,
    Theta,
    Vega,
    Rho,
    /// Sensitivity to the continuous dividend yield.
    Phi,
    /// Sensitivity to the foreign rate of a currency pair.
    RhoForeign,
    /// Sensitivity to a commodity convenience yield.
    RhoConvYield,
}

impl RiskParameter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delta => "delta",
            Self::Gamma => "gamma",
            Self::Theta => "theta",
            Self::Vega => "vega",
            Self::Rho => "rho",
            Self::Phi => "phi",
            Self::RhoForeign => "rho_foreign",
            Self::RhoConvYield => "rho_conv_yield",
        }
    }
}

impl fmt::Display for RiskParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market input that the numerical risk engine can perturb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskFactor {
    Spot,
    PricingDate,
    Volatility,
    Rate,
    CarryYield,
    CostYield,
}

impl RiskFactor {
    pub const ALL: [Self; 6] = [
        Self::Spot,
        Self::PricingDate,
        Self::Volatility,
        Self::Rate,
        Self::CarryYield,
        Self::CostYield,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spot => "spot0",
            Self::PricingDate => "pricing_date",
            Self::Volatility => "volatility",
            Self::Rate => "rf_rate",
            Self::CarryYield => "cnv_yield",
            Self::CostYield => "cost_yield",
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
