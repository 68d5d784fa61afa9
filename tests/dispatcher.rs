//! Model selection and the caller-facing pricing surface.

use std::sync::Arc;

use chrono::NaiveDate;
use vanillaferric::config::EngineConfig;
use vanillaferric::core::{
    ExerciseStyle, ModelKind, PricingEngine, PricingError, RiskFactor, RiskParameter,
    UnderlyingClass,
};
use vanillaferric::engines::monte_carlo::{MonteCarloEngine, NormalDraws};
use vanillaferric::instruments::VanillaOption;
use vanillaferric::market::{DividendSchedule, MarketContext};
use vanillaferric::pricing::{default_model, permitted_models, Pricer};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn market() -> MarketContext {
    MarketContext::builder()
        .spot(100.0)
        .rate(0.05)
        .dividend_yield(0.01)
        .volatility(0.25)
        .pricing_date(date(2019, 1, 1))
        .build()
        .unwrap()
}

fn small_simulation_config() -> EngineConfig {
    EngineConfig::from_toml_str(
        r#"
        [monte_carlo]
        european_paths = 4000
        american_paths = 4000
        steps = 20
        seed = 17

        [binomial]
        steps = 150
        "#,
    )
    .unwrap()
}

#[test]
fn model_names_parse() {
    assert_eq!("BSM".parse::<ModelKind>().unwrap(), ModelKind::BlackScholesMerton);
    assert_eq!("B76".parse::<ModelKind>().unwrap(), ModelKind::Black76);
    assert_eq!("GK".parse::<ModelKind>().unwrap(), ModelKind::GarmanKohlhagen);
    assert_eq!("MC_GBM".parse::<ModelKind>().unwrap(), ModelKind::MonteCarloGbm);
    assert_eq!("MC_GBM_LSM".parse::<ModelKind>().unwrap(), ModelKind::MonteCarloGbm);
    assert_eq!("Binomial".parse::<ModelKind>().unwrap(), ModelKind::Binomial);
    assert!(matches!(
        "Heston".parse::<ModelKind>(),
        Err(PricingError::InvalidInput(_))
    ));
}

#[test]
fn every_default_is_permitted() {
    for underlying in UnderlyingClass::ALL {
        for exercise in [ExerciseStyle::European, ExerciseStyle::American] {
            let permitted = permitted_models(underlying, exercise);
            assert!(permitted.contains(&default_model(underlying, exercise)));
            assert!(permitted.contains(&ModelKind::Binomial));
            assert!(permitted.contains(&ModelKind::MonteCarloGbm));
        }
    }
    assert_eq!(
        permitted_models(UnderlyingClass::Equity, ExerciseStyle::American),
        &[ModelKind::MonteCarloGbm, ModelKind::Binomial]
    );
}

#[test]
fn list_models_follows_option_terms() {
    let european = VanillaOption::european_call(100.0, date(2020, 1, 1)).on(UnderlyingClass::Futures);
    assert_eq!(european.list_models()[0], ModelKind::Black76);
    let american = VanillaOption::american_put(100.0, date(2020, 1, 1));
    assert!(!american.list_models().contains(&ModelKind::BlackScholesMerton));
}

#[test]
fn configured_simulation_prices_american_put() {
    let config = small_simulation_config();
    let option = VanillaOption::american_put(100.0, date(2020, 1, 1));
    let simulated = Pricer::new(option.clone(), market(), Some(ModelKind::MonteCarloGbm), config.clone())
        .unwrap();
    let lattice = Pricer::new(option, market(), None, config).unwrap();

    let result = simulated.price().unwrap();
    assert_eq!(*result.diagnostics.get("num_paths").unwrap(), 4000.0);
    assert_eq!(*result.diagnostics.get("num_steps").unwrap(), 20.0);

    let tree = lattice.valuation().unwrap();
    assert!(
        (result.price - tree).abs() < 0.2 + 3.0 * result.stderr.unwrap(),
        "{} vs {tree}",
        result.price
    );
}

#[test]
fn simulation_risk_is_numerical() {
    let pricer = Pricer::new(
        VanillaOption::american_put(100.0, date(2020, 1, 1)),
        market(),
        Some(ModelKind::MonteCarloGbm),
        small_simulation_config(),
    )
    .unwrap();

    let risk = pricer.risk_parameters().unwrap();
    assert_eq!(risk.len(), 5);
    assert!(!risk.contains_key(&RiskParameter::Phi));
    assert!(risk[&RiskParameter::Delta] < 0.0);

    let err = pricer.implied_volatility(8.0).unwrap_err();
    assert!(matches!(
        err,
        PricingError::UnsupportedOperation {
            model: ModelKind::MonteCarloGbm,
            ..
        }
    ));
}

#[test]
fn supplied_draws_drive_the_simulation() {
    let option = VanillaOption::european_call(100.0, date(2020, 1, 1));
    let draws = Arc::new(NormalDraws::generate(2000, 1, 99));
    let engine = MonteCarloEngine::new(2000, 10, 0).with_draws(Arc::clone(&draws));

    let pricer = Pricer::with_engine(option.clone(), market(), Arc::new(engine), EngineConfig::default())
        .unwrap();
    let first = pricer.valuation().unwrap();
    let again = MonteCarloEngine::new(2000, 10, 12345)
        .with_draws(draws)
        .price(&option, &market())
        .unwrap()
        .price;
    assert_eq!(first, again);

    let wrong = MonteCarloEngine::new(2000, 10, 0).with_draws(Arc::new(NormalDraws::generate(1000, 1, 1)));
    assert!(matches!(
        wrong.price(&option, &market()),
        Err(PricingError::DimensionMismatch { .. })
    ));
}

#[test]
fn dividends_switch_simulation_to_full_paths() {
    let paying = MarketContext::builder()
        .spot(100.0)
        .rate(0.05)
        .volatility(0.25)
        .pricing_date(date(2019, 1, 1))
        .dividends(DividendSchedule::from_pairs(&[(date(2019, 6, 1), 1.0)]).unwrap())
        .build()
        .unwrap();
    let option = VanillaOption::european_call(100.0, date(2020, 1, 1));
    // Terminal-only draws no longer fit once a dividend forces full paths.
    let engine = MonteCarloEngine::new(500, 10, 0).with_draws(Arc::new(NormalDraws::generate(500, 1, 5)));
    assert!(matches!(
        engine.price(&option, &paying),
        Err(PricingError::DimensionMismatch { .. })
    ));
}

#[test]
fn pnl_attribution_reports_every_factor() {
    let pricer = Pricer::new(
        VanillaOption::european_call(100.0, date(2020, 1, 1)),
        market(),
        None,
        EngineConfig::default(),
    )
    .unwrap();
    let pnl = pricer.pnl_attribution().unwrap();
    assert_eq!(pnl.keys().copied().collect::<Vec<_>>(), RiskFactor::ALL.to_vec());
    assert!(pnl[&RiskFactor::Spot] > 0.0);
    assert!(pnl[&RiskFactor::PricingDate] < 0.0);
    // Default bumps leave carry and cost yields untouched.
    assert_eq!(pnl[&RiskFactor::CostYield], 0.0);
}

#[test]
fn unsupported_model_names_the_alternatives() {
    let err = Pricer::new(
        VanillaOption::european_call(100.0, date(2020, 1, 1)).on(UnderlyingClass::Fx),
        market(),
        Some(ModelKind::Black76),
        EngineConfig::default(),
    )
    .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("B76"), "{message}");
    assert!(message.contains("GK, MC_GBM, Binomial"), "{message}");
}

#[test]
fn every_model_rejects_dividends_exceeding_spot() {
    let paying = MarketContext::builder()
        .spot(10.0)
        .rate(0.05)
        .volatility(0.25)
        .pricing_date(date(2019, 1, 1))
        .dividends(
            DividendSchedule::from_pairs(&[(date(2019, 4, 1), 6.0), (date(2019, 10, 1), 6.0)])
                .unwrap(),
        )
        .build()
        .unwrap();
    let option = VanillaOption::european_call(10.0, date(2020, 1, 1));

    for &model in permitted_models(UnderlyingClass::Equity, ExerciseStyle::European) {
        let pricer = Pricer::new(option.clone(), paying.clone(), Some(model), small_simulation_config())
            .unwrap();
        assert!(
            matches!(pricer.valuation(), Err(PricingError::InvalidInput(_))),
            "{model:?} accepted a non-positive escrowed spot"
        );
    }
}
