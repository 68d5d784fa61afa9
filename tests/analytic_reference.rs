// Closed-form reference scenarios.
//
// Equity case: S=110, K=100, vol 25%, r 5%, dividend yield 1%,
// pricing 2018-05-31, expiry 2018-06-30 (30/365 years).
// The futures and currency cases reuse the same strike, vol and dates with
// F=110 and a 3% foreign rate respectively.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use vanillaferric::config::ImpliedVolConfig;
use vanillaferric::core::{AnalyticEngine, PricingEngine, PricingError, RiskParameter, UnderlyingClass};
use vanillaferric::engines::analytic::{Black76Engine, BlackScholesEngine, GarmanKohlhagenEngine};
use vanillaferric::instruments::VanillaOption;
use vanillaferric::market::{DividendSchedule, MarketContext};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expiry() -> NaiveDate {
    date(2018, 6, 30)
}

fn base_builder() -> vanillaferric::market::MarketContextBuilder {
    MarketContext::builder()
        .spot(110.0)
        .rate(0.05)
        .volatility(0.25)
        .pricing_date(date(2018, 5, 31))
}

#[test]
fn equity_call_reference_values() {
    let market = base_builder().dividend_yield(0.01).build().unwrap();
    let option = VanillaOption::european_call(100.0, expiry());
    let engine = BlackScholesEngine::new();

    let price = engine.price(&option, &market).unwrap().price;
    let risk = engine.risk_parameters(&option, &market).unwrap();

    assert_relative_eq!(price, 10.60964, epsilon = 5e-6);
    assert_relative_eq!(risk[&RiskParameter::Delta], 0.9210, epsilon = 5e-5);
    assert_relative_eq!(risk[&RiskParameter::Gamma], 0.01867, epsilon = 5e-6);
    assert_relative_eq!(risk[&RiskParameter::Vega], 0.04642, epsilon = 5e-6);
    assert_relative_eq!(risk[&RiskParameter::Theta], -0.02898, epsilon = 5e-6);
    assert_relative_eq!(risk[&RiskParameter::Rho], 0.07448, epsilon = 5e-6);
    assert_relative_eq!(risk[&RiskParameter::Phi], -8.326_413_956_243_696, epsilon = 1e-8);
}

#[test]
fn futures_call_reference_values() {
    let market = base_builder().build().unwrap();
    let option = VanillaOption::european_call(100.0, expiry()).on(UnderlyingClass::Futures);
    let engine = Black76Engine::new();

    let price = engine.price(&option, &market).unwrap().price;
    let risk = engine.risk_parameters(&option, &market).unwrap();

    assert_relative_eq!(price, 10.278_649_928_591_477, epsilon = 1e-9);
    assert_relative_eq!(risk[&RiskParameter::Delta], 0.913_972_842_122_633_3, epsilon = 1e-9);
    assert_relative_eq!(risk[&RiskParameter::Gamma], 0.019_833_947_075_722_964, epsilon = 1e-11);
    assert_relative_eq!(risk[&RiskParameter::Theta], -0.019_139_119_839_940_2, epsilon = 1e-11);
    assert_relative_eq!(risk[&RiskParameter::Vega], 0.049_313_169_784_160_53, epsilon = 1e-11);
    assert_relative_eq!(risk[&RiskParameter::Rho], -0.844_820_542_076_011_8, epsilon = 1e-9);
}

#[test]
fn currency_call_reference_values() {
    let market = base_builder().foreign_rate(0.03).build().unwrap();
    let option = VanillaOption::european_call(100.0, expiry()).on(UnderlyingClass::Fx);
    let engine = GarmanKohlhagenEngine::new();

    let price = engine.price(&option, &market).unwrap().price;
    let risk = engine.risk_parameters(&option, &market).unwrap();

    assert_relative_eq!(price, 10.443_695_049_596_826, epsilon = 1e-9);
    assert_relative_eq!(risk[&RiskParameter::Delta], 0.917_517_902_711_291_3, epsilon = 1e-9);
    assert_relative_eq!(risk[&RiskParameter::Gamma], 0.019_248_913_449_738_413, epsilon = 1e-11);
    assert_relative_eq!(risk[&RiskParameter::Rho], 0.074_165_523_116_213_31, epsilon = 1e-11);
    assert_relative_eq!(risk[&RiskParameter::Theta], -0.024_027_065_595_951_48, epsilon = 1e-11);
    assert_relative_eq!(risk[&RiskParameter::Vega], 0.047_858_599_878_459_19, epsilon = 1e-11);
    assert!(risk.contains_key(&RiskParameter::RhoForeign));
    assert!(!risk.contains_key(&RiskParameter::RhoConvYield));
}

#[test]
fn commodity_reports_convenience_yield_sensitivity() {
    let market = base_builder()
        .convenience_yield(0.03)
        .cost_yield(0.01)
        .build()
        .unwrap();
    let option = VanillaOption::european_put(105.0, expiry()).on(UnderlyingClass::Commodity);
    let risk = GarmanKohlhagenEngine::new()
        .risk_parameters(&option, &market)
        .unwrap();
    assert!(risk.contains_key(&RiskParameter::RhoConvYield));
    // A put gains when the convenience yield rises.
    assert!(risk[&RiskParameter::RhoConvYield] > 0.0);
}

#[test]
fn put_call_parity_for_every_variant() {
    let paying = DividendSchedule::from_pairs(&[(date(2018, 6, 15), 1.5)]).unwrap();
    let cases: Vec<(Box<dyn AnalyticEngine<VanillaOption>>, UnderlyingClass, MarketContext)> = vec![
        (
            Box::new(BlackScholesEngine::new()),
            UnderlyingClass::Equity,
            base_builder()
                .dividend_yield(0.01)
                .dividends(paying)
                .build()
                .unwrap(),
        ),
        (
            Box::new(Black76Engine::new()),
            UnderlyingClass::Futures,
            base_builder().build().unwrap(),
        ),
        (
            Box::new(GarmanKohlhagenEngine::new()),
            UnderlyingClass::Fx,
            base_builder().foreign_rate(0.03).build().unwrap(),
        ),
        (
            Box::new(GarmanKohlhagenEngine::new()),
            UnderlyingClass::Commodity,
            base_builder()
                .convenience_yield(0.04)
                .cost_yield(0.015)
                .pv_carry_costs(0.8)
                .build()
                .unwrap(),
        ),
    ];

    for (engine, underlying, market) in cases {
        for strike in [90.0, 110.0, 125.0] {
            let call = VanillaOption::european_call(strike, expiry()).on(underlying);
            let put = VanillaOption::european_put(strike, expiry()).on(underlying);
            let c = engine.price(&call, &market).unwrap();
            let p = engine.price(&put, &market).unwrap();

            let adjusted_spot = *c.diagnostics.get("adjusted_spot").unwrap();
            let carry_df = *c.diagnostics.get("carry_discount_factor").unwrap();
            let df = *c.diagnostics.get("discount_factor").unwrap();
            assert_relative_eq!(
                c.price - p.price,
                adjusted_spot * carry_df - strike * df,
                epsilon = 1e-10
            );
        }
    }
}

#[test]
fn implied_volatility_round_trips_across_strikes() {
    let market = base_builder().dividend_yield(0.01).build().unwrap();
    let engine = BlackScholesEngine::new();
    let config = ImpliedVolConfig {
        tolerance: 1e-7,
        ..ImpliedVolConfig::default()
    };

    for (strike, vol) in [(95.0, 0.15), (110.0, 0.35), (125.0, 0.6)] {
        let option = VanillaOption::european_put(strike, expiry());
        let quoted = MarketContext {
            volatility: vol,
            ..market.clone()
        };
        let premium = engine.price(&option, &quoted).unwrap().price;
        let implied = engine
            .implied_volatility(&option, &market, premium, &config)
            .unwrap();
        assert_relative_eq!(implied, vol, epsilon = 1e-6);
    }
}

#[test]
fn premium_below_bracket_does_not_converge() {
    let market = base_builder().dividend_yield(0.01).build().unwrap();
    let option = VanillaOption::european_call(100.0, expiry());
    // Below the intrinsic forward value no volatility reproduces it.
    let err = BlackScholesEngine::new()
        .implied_volatility(&option, &market, 5.0, &ImpliedVolConfig::default())
        .unwrap_err();
    assert!(matches!(err, PricingError::ImpliedVolatility { .. }));
    assert!(err.to_string().contains("did not converge"));
}
