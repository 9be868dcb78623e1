//! Screening run orchestration.
//!
//! Fetches the universe, applies the filter chain, enriches every surviving
//! symbol (optionally several at once), then sorts, labels and persists the
//! accumulated rows.

use std::collections::HashSet;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::api::MarketDataProvider;
use crate::database::ScreeningSink;
use crate::enrichment::{self, GrowthRequest, SymbolOutcome};
use crate::error::Result;
use crate::filter_chain;
use crate::labeling;
use crate::models::{
    Config, EligibilityConfig, FilterConfig, InstrumentSummary, LabelScope, ScreeningRow,
};

/// Settings for one screening run
#[derive(Debug, Clone)]
pub struct ScreeningOptions {
    pub filters: FilterConfig,
    pub eligibility: EligibilityConfig,
    pub growth: GrowthRequest,
    pub fetch_concurrency: usize,
    pub label_scope: LabelScope,
}

impl Default for ScreeningOptions {
    fn default() -> Self {
        Self {
            filters: FilterConfig::default(),
            eligibility: EligibilityConfig::default(),
            growth: GrowthRequest::default(),
            fetch_concurrency: 1,
            label_scope: LabelScope::PerInstrument,
        }
    }
}

impl From<&Config> for ScreeningOptions {
    fn from(config: &Config) -> Self {
        Self {
            filters: config.filters.clone(),
            eligibility: config.eligibility.clone(),
            growth: GrowthRequest {
                period: config.growth_period,
                limit: config.growth_period_limit,
            },
            fetch_concurrency: config.fetch_concurrency,
            label_scope: config.label_scope,
        }
    }
}

/// Outcome of a screening run
#[derive(Debug, Clone, Default)]
pub struct ScreeningReport {
    pub universe_size: usize,
    pub filtered: usize,
    pub eligible: usize,
    pub skipped: usize,
    pub failed_symbols: Vec<String>,
    pub persist_failures: usize,
    /// Labeled rows, sorted by date
    pub rows: Vec<ScreeningRow>,
}

/// Screening pipeline over an injected data provider and sink
pub struct Screener<P, S> {
    provider: P,
    sink: S,
    options: ScreeningOptions,
}

impl<P, S> Screener<P, S>
where
    P: MarketDataProvider,
    S: ScreeningSink,
{
    pub fn new(provider: P, sink: S, options: ScreeningOptions) -> Self {
        if options.filters.keep_fund {
            warn!("FILTER_KEEP_FUND is set but no fund filter is applied");
        }
        Self {
            provider,
            sink,
            options,
        }
    }

    /// Fetch the universe and run the full pipeline.
    ///
    /// A universe fetch failure aborts the run; everything after it is
    /// isolated per symbol.
    pub async fn screen(&self, run_date: NaiveDate) -> Result<ScreeningReport> {
        info!("Starting stock screening for {}", run_date);

        let universe = self.provider.list_tradable_instruments().await?;
        let selected = filter_chain::select(&universe, &self.options.filters);
        info!("Filter chain kept {} of {} instruments", selected.len(), universe.len());

        let mut report = self.run(&selected, run_date).await;
        report.universe_size = universe.len();
        Ok(report)
    }

    /// Enrich, label and persist already-filtered instruments.
    ///
    /// Repeated symbols are enriched once, and at most one row is kept per
    /// (date, symbol); the first occurrence wins.
    pub async fn run(
        &self,
        instruments: &[InstrumentSummary],
        run_date: NaiveDate,
    ) -> ScreeningReport {
        let listed = instruments.len();
        let mut seen_symbols = HashSet::new();
        let instruments: Vec<&InstrumentSummary> = instruments
            .iter()
            .filter(|instrument| seen_symbols.insert(instrument.symbol.as_str()))
            .collect();
        let total = instruments.len();
        if total < listed {
            warn!("Ignoring {} repeated symbols", listed - total);
        }
        let concurrency = self.options.fetch_concurrency.max(1);
        info!("Processing {} symbols with up to {} in flight", total, concurrency);

        let mut report = ScreeningReport {
            universe_size: listed,
            filtered: listed,
            ..ScreeningReport::default()
        };

        // `buffered` yields in input order, so accumulation order does not depend on timing
        let mut outcomes = stream::iter(instruments)
            .map(|instrument| async move {
                let outcome = enrichment::enrich_symbol(
                    &self.provider,
                    &instrument.symbol,
                    &self.options.eligibility,
                    self.options.growth,
                    run_date,
                )
                .await;
                (instrument.symbol.as_str(), outcome)
            })
            .buffered(concurrency);

        let mut rows: Vec<ScreeningRow> = Vec::new();
        let mut seen_keys: HashSet<(NaiveDate, String)> = HashSet::new();
        let mut processed = 0;

        while let Some((symbol, outcome)) = outcomes.next().await {
            processed += 1;
            match outcome {
                Ok(SymbolOutcome::Rows(mut symbol_rows)) => {
                    report.eligible += 1;
                    symbol_rows.retain(|row| {
                        let fresh = seen_keys.insert((row.date, row.symbol.clone()));
                        if !fresh {
                            warn!("Dropping repeated period {} for {}", row.date, row.symbol);
                        }
                        fresh
                    });
                    info!("{}/{}: {} - {} rows", processed, total, symbol, symbol_rows.len());
                    for row in &symbol_rows {
                        if let Err(e) = self.sink.upsert_screening_row(row).await {
                            report.persist_failures += 1;
                            error!("Failed to persist {} {}: {}", row.symbol, row.date, e);
                        }
                    }
                    rows.extend(symbol_rows);
                }
                Ok(SymbolOutcome::Skipped(_)) => {
                    report.skipped += 1;
                }
                Err(e) => {
                    error!("{}/{}: {} failed - {}", processed, total, symbol, e);
                    report.failed_symbols.push(symbol.to_string());
                }
            }

            if processed % 25 == 0 {
                info!(
                    "Progress: {}/{} symbols processed, {} rows collected",
                    processed,
                    total,
                    rows.len()
                );
            }
        }

        labeling::sort_by_date(&mut rows);
        labeling::assign_forward_returns(&mut rows, self.options.label_scope);

        for row in &rows {
            if let Err(e) = self.sink.record_label(row.date, &row.symbol, row.y_return).await {
                report.persist_failures += 1;
                error!("Failed to record label for {} {}: {}", row.symbol, row.date, e);
            }
        }

        info!(
            "Screening completed: {} rows from {} symbols ({} skipped, {} failed)",
            rows.len(),
            report.eligible,
            report.skipped,
            report.failed_symbols.len()
        );

        report.rows = rows;
        report
    }

    /// Release the sink's resources
    pub async fn close(&self) -> Result<()> {
        self.sink.close().await
    }
}
