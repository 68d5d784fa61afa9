//! Module `pricing::dispatcher`.
//!
//! Model selection and the uniform valuation/risk surface.
//!
//! The permitted and default models per (underlying class, exercise style)
//! are fixed tables:
//!
//! | underlying | European            | American       | default (Eur / Amer) |
//! |------------|---------------------|----------------|----------------------|
//! | Equity     | BSM, MC_GBM, Binomial | MC_GBM, Binomial | BSM / Binomial     |
//! | Futures    | B76, MC_GBM, Binomial | MC_GBM, Binomial | B76 / Binomial     |
//! | FX         | GK, MC_GBM, Binomial  | MC_GBM, Binomial | GK / Binomial      |
//! | Commodity  | GK, MC_GBM, Binomial  | MC_GBM, Binomial | GK / Binomial      |
//!
//! A [`Pricer`] binds one option, one market snapshot and one engine.
//! Closed-form Greeks are used when the engine has them; every other engine
//! goes through [`NumericalGreeks`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::{
    ExerciseStyle, ModelKind, PricingEngine, PricingError, PricingResult, RiskFactor,
    RiskParameter, RiskParameters, UnderlyingClass,
};
use crate::engines::analytic::{Black76Engine, BlackScholesEngine, GarmanKohlhagenEngine};
use crate::engines::monte_carlo::MonteCarloEngine;
use crate::engines::tree::BinomialTreeEngine;
use crate::instruments::VanillaOption;
use crate::market::MarketContext;
use crate::risk::{numerical_risk_functions, NumericalGreeks, RiskFunction};

const EQUITY_EUROPEAN: &[ModelKind] = &[
    ModelKind::BlackScholesMerton,
    ModelKind::MonteCarloGbm,
    ModelKind::Binomial,
];
const FUTURES_EUROPEAN: &[ModelKind] = &[
    ModelKind::Black76,
    ModelKind::MonteCarloGbm,
    ModelKind::Binomial,
];
const TWO_CURRENCY_EUROPEAN: &[ModelKind] = &[
    ModelKind::GarmanKohlhagen,
    ModelKind::MonteCarloGbm,
    ModelKind::Binomial,
];
const AMERICAN: &[ModelKind] = &[ModelKind::MonteCarloGbm, ModelKind::Binomial];

/// Models permitted for an (underlying class, exercise style) pair.
pub fn permitted_models(underlying: UnderlyingClass, exercise: ExerciseStyle) -> &'static [ModelKind] {
    match (underlying, exercise) {
        (UnderlyingClass::Equity, ExerciseStyle::European) => EQUITY_EUROPEAN,
        (UnderlyingClass::Futures, ExerciseStyle::European) => FUTURES_EUROPEAN,
        (UnderlyingClass::Fx | UnderlyingClass::Commodity, ExerciseStyle::European) => {
            TWO_CURRENCY_EUROPEAN
        }
        (_, ExerciseStyle::American) => AMERICAN,
    }
}

/// Model used when the caller does not name one.
pub fn default_model(underlying: UnderlyingClass, exercise: ExerciseStyle) -> ModelKind {
    match (underlying, exercise) {
        (UnderlyingClass::Equity, ExerciseStyle::European) => ModelKind::BlackScholesMerton,
        (UnderlyingClass::Futures, ExerciseStyle::European) => ModelKind::Black76,
        (UnderlyingClass::Fx | UnderlyingClass::Commodity, ExerciseStyle::European) => {
            ModelKind::GarmanKohlhagen
        }
        (_, ExerciseStyle::American) => ModelKind::Binomial,
    }
}

fn ensure_permitted(option: &VanillaOption, model: ModelKind) -> Result<(), PricingError> {
    let permitted = permitted_models(option.underlying, option.exercise);
    if permitted.contains(&model) {
        return Ok(());
    }
    Err(PricingError::ModelNotSupported {
        model: model.as_str().to_string(),
        underlying: option.underlying,
        exercise: option.exercise,
        supported: permitted
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Builds the engine for `model` from configuration.
pub fn build_engine(
    model: ModelKind,
    exercise: ExerciseStyle,
    config: &EngineConfig,
) -> Arc<dyn PricingEngine<VanillaOption>> {
    match model {
        ModelKind::BlackScholesMerton => Arc::new(BlackScholesEngine::new()),
        ModelKind::Black76 => Arc::new(Black76Engine::new()),
        ModelKind::GarmanKohlhagen => Arc::new(GarmanKohlhagenEngine::new()),
        ModelKind::MonteCarloGbm => {
            Arc::new(MonteCarloEngine::from_config(&config.monte_carlo, exercise))
        }
        ModelKind::Binomial => Arc::new(BinomialTreeEngine::new(config.binomial.steps)),
    }
}

/// One option priced with one model against one market snapshot.
#[derive(Debug, Clone)]
pub struct Pricer {
    option: VanillaOption,
    market: MarketContext,
    engine: Arc<dyn PricingEngine<VanillaOption>>,
    config: EngineConfig,
}

impl Pricer {
    /// Validates the model for the option and builds its engine.
    ///
    /// `model = None` resolves the default for the option's underlying class
    /// and exercise style.
    ///
    /// # Errors
    /// - [`PricingError::ModelNotSupported`] when `model` is not permitted.
    /// - [`PricingError::Precondition`] unless the pricing date is before expiry.
    /// - [`PricingError::Config`] for unusable engine settings.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use vanillaferric::config::EngineConfig;
    /// use vanillaferric::core::ModelKind;
    /// use vanillaferric::instruments::VanillaOption;
    /// use vanillaferric::market::MarketContext;
    /// use vanillaferric::pricing::Pricer;
    ///
    /// let d = |m, day| NaiveDate::from_ymd_opt(2018, m, day).unwrap();
    /// let market = MarketContext::builder()
    ///     .spot(110.0)
    ///     .rate(0.05)
    ///     .volatility(0.25)
    ///     .pricing_date(d(5, 31))
    ///     .build()
    ///     .unwrap();
    /// let option = VanillaOption::american_put(100.0, d(6, 30));
    /// let pricer = Pricer::new(option, market, None, EngineConfig::default()).unwrap();
    /// assert_eq!(pricer.model_kind(), ModelKind::Binomial);
    /// assert!(pricer.implied_volatility(1.0).is_err());
    /// ```
    pub fn new(
        option: VanillaOption,
        market: MarketContext,
        model: Option<ModelKind>,
        config: EngineConfig,
    ) -> Result<Self, PricingError> {
        let model = match model {
            Some(model) => model,
            None => {
                let model = default_model(option.underlying, option.exercise);
                tracing::info!(
                    underlying = %option.underlying,
                    exercise = %option.exercise,
                    model = model.as_str(),
                    "resolved default model"
                );
                model
            }
        };
        ensure_permitted(&option, model)?;
        config.validate()?;
        let engine = build_engine(model, option.exercise, &config);
        Self::with_engine(option, market, engine, config)
    }

    /// Uses a caller-built engine, e.g. a Monte Carlo engine with supplied draws.
    pub fn with_engine(
        option: VanillaOption,
        market: MarketContext,
        engine: Arc<dyn PricingEngine<VanillaOption>>,
        config: EngineConfig,
    ) -> Result<Self, PricingError> {
        option.validate()?;
        ensure_permitted(&option, engine.model_kind())?;
        market.time_to_expiry(option.expiry_date)?;
        Ok(Self {
            option,
            market,
            engine,
            config,
        })
    }

    /// Same option and engine against another market snapshot.
    pub fn with_market(&self, market: MarketContext) -> Result<Self, PricingError> {
        market.time_to_expiry(self.option.expiry_date)?;
        Ok(Self {
            market,
            ..self.clone()
        })
    }

    #[inline]
    pub fn model_kind(&self) -> ModelKind {
        self.engine.model_kind()
    }

    #[inline]
    pub fn option(&self) -> &VanillaOption {
        &self.option
    }

    #[inline]
    pub fn market(&self) -> &MarketContext {
        &self.market
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full engine result with diagnostics.
    pub fn price(&self) -> Result<PricingResult, PricingError> {
        self.engine.price(&self.option, &self.market)
    }

    /// Option value.
    pub fn valuation(&self) -> Result<f64, PricingError> {
        Ok(self.price()?.price)
    }

    fn numerical(&self) -> NumericalGreeks<'_> {
        NumericalGreeks::new(
            self.engine.as_ref(),
            &self.option,
            &self.market,
            &self.config.bumps,
        )
    }

    /// Closed-form sensitivities when available, finite differences otherwise.
    pub fn risk_parameters(&self) -> Result<RiskParameters, PricingError> {
        match self.engine.analytic() {
            Some(analytic) => analytic.risk_parameters(&self.option, &self.market),
            None => self.numerical_risk_parameters(),
        }
    }

    /// Finite-difference sensitivities regardless of the model.
    pub fn numerical_risk_parameters(&self) -> Result<RiskParameters, PricingError> {
        self.numerical().risk_parameters()
    }

    /// Sensitivities as zero-argument closures bound to this snapshot.
    pub fn risk_parameters_as_functions(
        &self,
    ) -> Result<BTreeMap<RiskParameter, RiskFunction>, PricingError> {
        let Some(analytic) = self.engine.analytic() else {
            return Ok(numerical_risk_functions(
                Arc::clone(&self.engine),
                self.option.clone(),
                self.market.clone(),
                self.config.bumps.clone(),
            ));
        };

        let parameters = analytic.risk_parameters(&self.option, &self.market)?;
        let snapshot = Arc::new(self.clone());
        Ok(parameters
            .into_keys()
            .map(|parameter| {
                let snapshot = Arc::clone(&snapshot);
                let function: RiskFunction = Box::new(move || {
                    snapshot.risk_parameters()?.get(&parameter).copied().ok_or_else(|| {
                        PricingError::NumericalError(format!(
                            "{} missing from closed-form risk",
                            parameter.as_str()
                        ))
                    })
                });
                (parameter, function)
            })
            .collect())
    }

    /// One-sided scenario P&L per risk factor.
    pub fn pnl_attribution(&self) -> Result<BTreeMap<RiskFactor, f64>, PricingError> {
        self.numerical().pnl_attribution()
    }

    /// Volatility reproducing `premium` under the closed-form model.
    ///
    /// # Errors
    /// [`PricingError::UnsupportedOperation`] for lattice and simulation models.
    pub fn implied_volatility(&self, premium: f64) -> Result<f64, PricingError> {
        let analytic = self
            .engine
            .analytic()
            .ok_or(PricingError::UnsupportedOperation {
                operation: "implied volatility",
                model: self.engine.model_kind(),
            })?;
        analytic.implied_volatility(&self.option, &self.market, premium, &self.config.implied_vol)
    }
}
