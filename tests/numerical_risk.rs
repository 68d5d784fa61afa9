//! Finite-difference sensitivities against closed-form Greeks.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use vanillaferric::config::BumpConfig;
use vanillaferric::core::{AnalyticEngine, PricingEngine, RiskParameter, UnderlyingClass};
use vanillaferric::engines::analytic::{Black76Engine, BlackScholesEngine, GarmanKohlhagenEngine};
use vanillaferric::engines::monte_carlo::MonteCarloEngine;
use vanillaferric::engines::tree::BinomialTreeEngine;
use vanillaferric::instruments::VanillaOption;
use vanillaferric::market::MarketContext;
use vanillaferric::risk::NumericalGreeks;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn fine_bumps() -> BumpConfig {
    BumpConfig {
        spot: 1e-3,
        volatility: 1e-3,
        rate: 1e-3,
        ..BumpConfig::default()
    }
}

fn market(carry_yield: f64) -> MarketContext {
    MarketContext::builder()
        .spot(100.0)
        .rate(0.05)
        .carry_yield(carry_yield)
        .volatility(0.2)
        .pricing_date(date(2019, 1, 1))
        .build()
        .unwrap()
}

/// Slope of value in spot implied by the closed form.
///
/// Closed-form delta is quoted as `N(flag d1)`, without the option sign and
/// the carry discount factor that a bump-and-reprice slope carries.
fn spot_slope<E>(engine: &E, option: &VanillaOption, market: &MarketContext) -> f64
where
    E: AnalyticEngine<VanillaOption>,
{
    let result = engine.price(option, market).unwrap();
    let carry_df = *result.diagnostics.get("carry_discount_factor").unwrap();
    let quoted = engine.risk_parameters(option, market).unwrap()[&RiskParameter::Delta];
    option.option_type.sign() * carry_df * quoted
}

fn assert_first_order_matches<E>(engine: &E, option: &VanillaOption, market: &MarketContext, with_rho: bool)
where
    E: AnalyticEngine<VanillaOption>,
{
    let bumps = fine_bumps();
    let analytic = engine.risk_parameters(option, market).unwrap();
    let numerical = NumericalGreeks::new(engine, option, market, &bumps);

    assert_relative_eq!(numerical.delta().unwrap(), spot_slope(engine, option, market), epsilon = 1e-3);
    assert_relative_eq!(numerical.gamma().unwrap(), analytic[&RiskParameter::Gamma], epsilon = 1e-4);
    assert_relative_eq!(numerical.vega().unwrap(), analytic[&RiskParameter::Vega], epsilon = 1e-3);
    assert_relative_eq!(numerical.theta().unwrap(), analytic[&RiskParameter::Theta], epsilon = 2e-3);
    if with_rho {
        assert_relative_eq!(numerical.rho().unwrap(), analytic[&RiskParameter::Rho], epsilon = 1e-3);
    }
}

#[test]
fn equity_finite_differences_match_closed_form() {
    let engine = BlackScholesEngine::new();
    for option in [
        VanillaOption::european_call(95.0, date(2020, 1, 1)),
        VanillaOption::european_put(110.0, date(2020, 1, 1)),
    ] {
        assert_first_order_matches(&engine, &option, &market(0.02), true);
    }
}

#[test]
fn futures_finite_differences_match_closed_form() {
    // A rate bump moves discounting and carry together for futures, and the
    // closed-form futures rho is unscaled, so rho is not compared here.
    let engine = Black76Engine::new();
    let option = VanillaOption::european_call(100.0, date(2020, 1, 1)).on(UnderlyingClass::Futures);
    assert_first_order_matches(&engine, &option, &market(0.0), false);
}

#[test]
fn currency_finite_differences_match_closed_form() {
    let engine = GarmanKohlhagenEngine::new();
    let option = VanillaOption::european_put(102.0, date(2020, 1, 1)).on(UnderlyingClass::Fx);
    assert_first_order_matches(&engine, &option, &market(0.03), true);
}

#[test]
fn lattice_delta_tracks_closed_form() {
    let market = market(0.02);
    let option = VanillaOption::european_call(100.0, date(2020, 1, 1));
    let bumps = BumpConfig::default();
    let lattice = BinomialTreeEngine::new(500);

    let numerical = NumericalGreeks::new(&lattice, &option, &market, &bumps);
    let closed_form = BlackScholesEngine::new();
    let analytic = closed_form.risk_parameters(&option, &market).unwrap();

    assert_relative_eq!(
        numerical.delta().unwrap(),
        spot_slope(&closed_form, &option, &market),
        epsilon = 5e-3
    );
    assert_relative_eq!(numerical.vega().unwrap(), analytic[&RiskParameter::Vega], epsilon = 5e-3);
}

#[test]
fn simulated_delta_uses_common_random_numbers() {
    let market = market(0.02);
    let option = VanillaOption::european_call(100.0, date(2020, 1, 1));
    let bumps = BumpConfig::default();
    let engine = MonteCarloEngine::new(50_000, 1, 7);

    let numerical = NumericalGreeks::new(&engine, &option, &market, &bumps);
    let expected = spot_slope(&BlackScholesEngine::new(), &option, &market);

    // Same seed in every scenario, so sampling noise largely cancels.
    assert_relative_eq!(numerical.delta().unwrap(), expected, epsilon = 1e-2);

    let first = numerical.delta().unwrap();
    let again = numerical.delta().unwrap();
    assert_eq!(first, again);
}

#[test]
fn batch_risk_reports_standard_five() {
    let market = market(0.02);
    let option = VanillaOption::american_put(100.0, date(2020, 1, 1));
    let bumps = BumpConfig::default();
    let lattice = BinomialTreeEngine::new(200);

    let risk = NumericalGreeks::new(&lattice, &option, &market, &bumps)
        .risk_parameters()
        .unwrap();
    let keys: Vec<_> = risk.keys().copied().collect();
    assert_eq!(
        keys,
        vec![
            RiskParameter::Delta,
            RiskParameter::Gamma,
            RiskParameter::Theta,
            RiskParameter::Vega,
            RiskParameter::Rho,
        ]
    );
    assert!(risk[&RiskParameter::Delta] < 0.0);
    assert!(risk[&RiskParameter::Gamma] > 0.0);
    assert!(risk[&RiskParameter::Vega] > 0.0);
    let base = lattice.price(&option, &market).unwrap().price;
    assert!(base > 0.0);
}
