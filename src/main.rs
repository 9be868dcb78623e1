use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use equity_screener::api::FmpClient;
use equity_screener::database::{DiscardSink, ScreeningDatabase, ScreeningSink};
use equity_screener::export;
use equity_screener::logging::{self, DEFAULT_LOG_FILE};
use equity_screener::models::{Config, LabelScope};
use equity_screener::screener::{Screener, ScreeningOptions, ScreeningReport};

/// Equity screener over Financial Modeling Prep data
#[derive(Parser)]
#[command(name = "equity-screener")]
#[command(version = "0.1.0")]
#[command(about = "Screen equities, enrich them with growth fundamentals and label forward returns")]
#[command(long_about = "
Fetches the tradable-instrument universe, keeps instruments matching the configured
exchange suffixes, type and price band, then checks listing age, liquidity, country and
trading status for each survivor. Eligible instruments get one row per growth period with
the adjusted close at the period end, and every row is labeled with the log return to the
next period.

Thresholds come from the environment (or a .env file); see FILTER_* variables.

Examples:
  equity-screener                              # screen as of today and persist
  equity-screener --dry-run -o rows.csv        # export only, database untouched
  equity-screener --run-date 2024-06-01 -c 4   # fixed run date, 4 symbols in flight
")]
struct Args {
    /// Run date used for listing-age checks (YYYY-MM-DD, defaults to today in UTC)
    #[arg(long)]
    run_date: Option<String>,

    /// Do not write to the database
    #[arg(long)]
    dry_run: bool,

    /// Export labeled rows to this CSV file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Number of symbols enriched at once (overrides FETCH_CONCURRENCY)
    #[arg(long, short = 'c')]
    concurrency: Option<usize>,

    /// Forward return scope: per-instrument or global (overrides LABEL_SCOPE)
    #[arg(long)]
    label_scope: Option<LabelScope>,

    /// Log file receiving debug output
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
}

fn parse_run_date(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| anyhow!("run date must be YYYY-MM-DD, got: {}", value)),
        None => Ok(Utc::now().date_naive()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(Some(&args.log_file))?;

    if let Err(e) = run(args).await {
        error!("Screening failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let run_date = parse_run_date(args.run_date.as_deref())?;

    let config = Config::from_env().context("failed to load configuration")?;
    info!("Configuration loaded successfully");

    let mut options = ScreeningOptions::from(&config);
    if let Some(concurrency) = args.concurrency {
        options.fetch_concurrency = concurrency.max(1);
    }
    if let Some(scope) = args.label_scope {
        options.label_scope = scope;
    }

    let client = FmpClient::new(&config)?;

    let report = if args.dry_run {
        info!("Dry run: results will not be persisted");
        screen_with(client, DiscardSink, options, run_date).await?
    } else {
        let database = ScreeningDatabase::new(&config.database_path)
            .await
            .with_context(|| format!("failed to open database at {}", config.database_path))?;
        screen_with(client, database, options, run_date).await?
    };

    print_summary(&report);

    if let Some(path) = &args.output {
        export::export_csv(path, &report.rows)?;
    }

    Ok(())
}

async fn screen_with<S: ScreeningSink>(
    client: FmpClient,
    sink: S,
    options: ScreeningOptions,
    run_date: NaiveDate,
) -> Result<ScreeningReport> {
    let screener = Screener::new(client, sink, options);
    let report = screener.screen(run_date).await;
    screener.close().await?;
    Ok(report?)
}

fn print_summary(report: &ScreeningReport) {
    info!("Universe: {} instruments", report.universe_size);
    info!("Passed filter chain: {}", report.filtered);
    info!("Eligible: {}, skipped by gate: {}", report.eligible, report.skipped);
    info!("Rows: {}", report.rows.len());
    if !report.failed_symbols.is_empty() {
        info!("Failed symbols ({}): {}", report.failed_symbols.len(), report.failed_symbols.join(", "));
    }
    if report.persist_failures > 0 {
        error!("{} database writes failed", report.persist_failures);
    }
}
