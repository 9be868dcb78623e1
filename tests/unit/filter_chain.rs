//! Filter chain tests over a mixed universe

use equity_screener::filter_chain::select;
use equity_screener::models::{FilterConfig, InstrumentType};
use pretty_assertions::assert_eq;

use crate::common::logging;
use crate::common::test_data::create_test_instrument;

fn mixed_universe() -> Vec<equity_screener::models::InstrumentSummary> {
    vec![
        create_test_instrument("AIR.PA", InstrumentType::Stock, 120.0),
        create_test_instrument("AIR.DE", InstrumentType::Stock, 120.0),
        create_test_instrument("UCB.BR", InstrumentType::Stock, 420.0),
        create_test_instrument("EDP.LS", InstrumentType::Stock, 4.1),
        create_test_instrument("IWDA.AS", InstrumentType::Etf, 80.0),
        create_test_instrument("CW8.PA", InstrumentType::Fund, 400.0),
        create_test_instrument("ADYEN.AS", InstrumentType::Stock, 1300.0),
        create_test_instrument("KER.PA", InstrumentType::Stock, 14.0),
        create_test_instrument("XX", InstrumentType::Stock, 20.0),
    ]
}

#[test]
fn test_default_chain_keeps_euronext_stocks_in_band() {
    logging::init_test_logging();
    logging::log_test_step("Testing default filter chain");

    let selected = select(&mixed_universe(), &FilterConfig::default());
    let symbols: Vec<&str> = selected.iter().map(|i| i.symbol.as_str()).collect();

    assert_eq!(symbols, vec!["AIR.PA", "UCB.BR", "KER.PA"]);
}

#[test]
fn test_keep_etf_admits_every_type() {
    let config = FilterConfig {
        keep_etf: true,
        ..FilterConfig::default()
    };

    let selected = select(&mixed_universe(), &config);
    let symbols: Vec<&str> = selected.iter().map(|i| i.symbol.as_str()).collect();

    assert_eq!(symbols, vec!["AIR.PA", "UCB.BR", "IWDA.AS", "CW8.PA", "KER.PA"]);
}

#[test]
fn test_keep_fund_alone_changes_nothing() {
    let config = FilterConfig {
        keep_fund: true,
        ..FilterConfig::default()
    };

    assert_eq!(
        select(&mixed_universe(), &config),
        select(&mixed_universe(), &FilterConfig::default())
    );
}

#[test]
fn test_output_is_subset_and_fixed_point() {
    let universe = mixed_universe();
    for config in [
        FilterConfig::default(),
        FilterConfig { keep_etf: true, ..FilterConfig::default() },
        FilterConfig { exchange_suffixes: vec![".DE".into()], min_price: 0.0, max_price: 1e9, ..FilterConfig::default() },
    ] {
        let once = select(&universe, &config);
        assert!(once.iter().all(|i| universe.contains(i)));
        assert_eq!(select(&once, &config), once);
    }
}

#[test]
fn test_empty_allow_list_rejects_everything() {
    let config = FilterConfig {
        exchange_suffixes: Vec::new(),
        ..FilterConfig::default()
    };

    assert!(select(&mixed_universe(), &config).is_empty());
}
