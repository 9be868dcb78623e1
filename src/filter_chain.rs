//! First-stage screening over the instrument universe.
//!
//! Three predicates are applied in a fixed order: instrument type, exchange
//! suffix, then price band. The chain is a pure, order-preserving filter.

use crate::models::{FilterConfig, InstrumentSummary, InstrumentType};

/// Select the instruments that pass every predicate, keeping input order
pub fn select(universe: &[InstrumentSummary], config: &FilterConfig) -> Vec<InstrumentSummary> {
    universe
        .iter()
        .filter(|instrument| passes_type(instrument, config))
        .filter(|instrument| passes_exchange(instrument, config))
        .filter(|instrument| passes_price(instrument, config))
        .cloned()
        .collect()
}

/// ETFs and every other type are admitted only when `keep_etf` is set
pub fn passes_type(instrument: &InstrumentSummary, config: &FilterConfig) -> bool {
    config.keep_etf || instrument.instrument_type == InstrumentType::Stock
}

pub fn passes_exchange(instrument: &InstrumentSummary, config: &FilterConfig) -> bool {
    let suffix = exchange_suffix(&instrument.symbol);
    config.exchange_suffixes.iter().any(|allowed| allowed == suffix)
}

/// Inclusive on both bounds
pub fn passes_price(instrument: &InstrumentSummary, config: &FilterConfig) -> bool {
    instrument.price >= config.min_price && instrument.price <= config.max_price
}

/// Last three characters of a symbol, or the whole symbol when shorter
pub fn exchange_suffix(symbol: &str) -> &str {
    match symbol.char_indices().rev().nth(2) {
        Some((index, _)) => &symbol[index..],
        None => symbol,
    }
}
