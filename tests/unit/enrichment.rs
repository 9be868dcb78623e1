//! Per-symbol enrichment against a stub provider

use assert_matches::assert_matches;
use chrono::Duration;
use equity_screener::enrichment::{enrich_symbol, GateRejection, GrowthRequest, SymbolOutcome};
use equity_screener::models::EligibilityConfig;
use equity_screener::ScreenerError;
use pretty_assertions::assert_eq;

use crate::common::test_data::{create_test_growth_period, create_test_price, create_test_profile, date, run_date};
use crate::common::{logging, StubProvider};

#[tokio::test]
async fn test_rows_follow_growth_periods() {
    logging::init_test_logging();
    logging::log_test_step("Testing row assembly");

    let provider = StubProvider::new()
        .with_profile(create_test_profile("AIR.PA", "Airbus SE"))
        .with_history(
            "AIR.PA",
            vec![
                (create_test_growth_period(date(2023, 12, 31)), create_test_price(date(2023, 12, 29), 165.0)),
                (create_test_growth_period(date(2022, 12, 31)), create_test_price(date(2022, 12, 30), 111.0)),
            ],
        );

    let outcome = enrich_symbol(&provider, "AIR.PA", &EligibilityConfig::default(), GrowthRequest::default(), run_date())
        .await
        .expect("enrichment failed");

    let rows = assert_matches!(outcome, SymbolOutcome::Rows(rows) => rows);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, date(2023, 12, 31));
    assert_eq!(rows[0].last_adjusted_close, 165.0);
    assert_eq!(rows[0].last_volume, 1_000_000);
    assert_eq!(rows[0].company_name.as_deref(), Some("Airbus SE"));
    assert_eq!(rows[0].revenue_growth, Some(0.12));
    assert_eq!(rows[1].last_adjusted_close, 111.0);
    assert!(!rows[0].ipo_date_lt_10_years);
    assert!(rows.iter().all(|r| r.y_return.is_none()));
}

#[tokio::test]
async fn test_inactive_instrument_is_skipped_without_fetching_fundamentals() {
    let mut profile = create_test_profile("ORA.PA", "Orange");
    profile.is_actively_trading = false;
    let provider = StubProvider::new().with_profile(profile);

    let outcome = enrich_symbol(&provider, "ORA.PA", &EligibilityConfig::default(), GrowthRequest::default(), run_date())
        .await
        .unwrap();

    assert_eq!(outcome, SymbolOutcome::Skipped(GateRejection::Inactive));
    assert_eq!(provider.calls(), vec!["profile:ORA.PA"]);
}

#[tokio::test]
async fn test_recent_ipo_sets_flag_on_rows() {
    let mut profile = create_test_profile("NEW.PA", "Newco");
    profile.ipo_date = Some(run_date() - Duration::days(3649));
    let provider = StubProvider::new().with_profile(profile).with_history(
        "NEW.PA",
        vec![(create_test_growth_period(date(2023, 12, 31)), create_test_price(date(2023, 12, 29), 30.0))],
    );

    let outcome = enrich_symbol(&provider, "NEW.PA", &EligibilityConfig::default(), GrowthRequest::default(), run_date())
        .await
        .unwrap();

    let rows = assert_matches!(outcome, SymbolOutcome::Rows(rows) => rows);
    assert!(rows[0].ipo_date_lt_10_years);
}

#[tokio::test]
async fn test_empty_price_history_fails_symbol() {
    let provider = StubProvider::new()
        .with_profile(create_test_profile("SAN.PA", "Sanofi"))
        .with_history(
            "SAN.PA",
            vec![(create_test_growth_period(date(2023, 12, 31)), create_test_price(date(2023, 12, 29), 90.0))],
        )
        .with_prices("SAN.PA", date(2023, 12, 31), Vec::new());

    let result = enrich_symbol(&provider, "SAN.PA", &EligibilityConfig::default(), GrowthRequest::default(), run_date()).await;

    assert_matches!(result, Err(ScreenerError::EmptyResponse { what: "price history", .. }));
}

#[tokio::test]
async fn test_growth_limit_is_forwarded() {
    let provider = StubProvider::new()
        .with_profile(create_test_profile("BN.PA", "Danone"))
        .with_history(
            "BN.PA",
            vec![
                (create_test_growth_period(date(2023, 12, 31)), create_test_price(date(2023, 12, 29), 58.0)),
                (create_test_growth_period(date(2022, 12, 31)), create_test_price(date(2022, 12, 30), 49.0)),
                (create_test_growth_period(date(2021, 12, 31)), create_test_price(date(2021, 12, 31), 54.0)),
            ],
        );
    let growth = GrowthRequest { limit: 1, ..GrowthRequest::default() };

    let outcome = enrich_symbol(&provider, "BN.PA", &EligibilityConfig::default(), growth, run_date())
        .await
        .unwrap();

    let rows = assert_matches!(outcome, SymbolOutcome::Rows(rows) => rows);
    assert_eq!(rows.len(), 1);
}
