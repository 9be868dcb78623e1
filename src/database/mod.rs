use chrono::NaiveDate;
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Row, SqlitePool};
use tracing::info;

use crate::error::{Result, ScreenerError};
use crate::models::ScreeningRow;

/// Destination for screening rows, keyed by (date, symbol)
#[async_trait::async_trait]
pub trait ScreeningSink: Send + Sync {
    /// Insert the row, or update every column of an existing row with the same key
    async fn upsert_screening_row(&self, row: &ScreeningRow) -> Result<()>;

    /// Write the forward return label of an already persisted row.
    ///
    /// Fails when no row with that (date, symbol) key exists.
    async fn record_label(&self, date: NaiveDate, symbol: &str, y_return: Option<f64>) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait::async_trait]
impl<'a, T: ScreeningSink + ?Sized> ScreeningSink for &'a T {
    async fn upsert_screening_row(&self, row: &ScreeningRow) -> Result<()> {
        (**self).upsert_screening_row(row).await
    }

    async fn record_label(&self, date: NaiveDate, symbol: &str, y_return: Option<f64>) -> Result<()> {
        (**self).record_label(date, symbol, y_return).await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}

/// Sink that persists nothing, for dry runs
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

#[async_trait::async_trait]
impl ScreeningSink for DiscardSink {
    async fn upsert_screening_row(&self, _row: &ScreeningRow) -> Result<()> {
        Ok(())
    }

    async fn record_label(&self, _date: NaiveDate, _symbol: &str, _y_return: Option<f64>) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// SQLite store for screening results
#[derive(Clone)]
pub struct ScreeningDatabase {
    pool: SqlitePool,
}

impl ScreeningDatabase {
    /// Open (creating if needed) the database file and ensure the schema exists
    pub async fn new(database_path: &str) -> Result<Self> {
        let path = database_path.strip_prefix("sqlite:").unwrap_or(database_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(SqliteConnectOptions::new().filename(path).create_if_missing(true))
            .await?;

        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS screening_rows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date DATE NOT NULL,
                isin TEXT,
                symbol TEXT NOT NULL,
                company_name TEXT,
                ipo_date DATE,
                ipo_date_lt_10_years BOOLEAN NOT NULL,
                is_actively_trading BOOLEAN NOT NULL,
                avg_volume INTEGER NOT NULL,
                country TEXT,
                exchange_short_name TEXT,
                sector TEXT,
                industry TEXT,
                revenue_growth REAL,
                ebit_growth REAL,
                operating_income_growth REAL,
                net_income_growth REAL,
                eps_growth REAL,
                inventory_growth REAL,
                rd_expense_growth REAL,
                debt_growth REAL,
                sga_expenses_growth REAL,
                last_adjusted_close REAL NOT NULL,
                last_volume INTEGER NOT NULL,
                y_return REAL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(date, symbol)
            )
            "#
        ).execute(&pool).await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_screening_rows_symbol ON screening_rows(symbol)")
            .execute(&pool)
            .await?;

        info!("Database initialized at {}", path);
        Ok(Self { pool })
    }

    /// All persisted rows ordered by date then symbol
    pub async fn get_screening_rows(&self) -> Result<Vec<ScreeningRow>> {
        let rows = sqlx::query(
            r#"
            SELECT date, isin, symbol, company_name, ipo_date, ipo_date_lt_10_years,
                   is_actively_trading, avg_volume, country, exchange_short_name, sector, industry,
                   revenue_growth, ebit_growth, operating_income_growth, net_income_growth,
                   eps_growth, inventory_growth, rd_expense_growth, debt_growth, sga_expenses_growth,
                   last_adjusted_close, last_volume, y_return
            FROM screening_rows
            ORDER BY date, symbol
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| ScreeningRow {
            date: r.get::<NaiveDate, _>("date"),
            isin: r.get::<Option<String>, _>("isin"),
            symbol: r.get::<String, _>("symbol"),
            company_name: r.get::<Option<String>, _>("company_name"),
            ipo_date: r.get::<Option<NaiveDate>, _>("ipo_date"),
            ipo_date_lt_10_years: r.get::<bool, _>("ipo_date_lt_10_years"),
            is_actively_trading: r.get::<bool, _>("is_actively_trading"),
            avg_volume: r.get::<i64, _>("avg_volume"),
            country: r.get::<Option<String>, _>("country"),
            exchange_short_name: r.get::<Option<String>, _>("exchange_short_name"),
            sector: r.get::<Option<String>, _>("sector"),
            industry: r.get::<Option<String>, _>("industry"),
            revenue_growth: r.get::<Option<f64>, _>("revenue_growth"),
            ebit_growth: r.get::<Option<f64>, _>("ebit_growth"),
            operating_income_growth: r.get::<Option<f64>, _>("operating_income_growth"),
            net_income_growth: r.get::<Option<f64>, _>("net_income_growth"),
            eps_growth: r.get::<Option<f64>, _>("eps_growth"),
            inventory_growth: r.get::<Option<f64>, _>("inventory_growth"),
            rd_expense_growth: r.get::<Option<f64>, _>("rd_expense_growth"),
            debt_growth: r.get::<Option<f64>, _>("debt_growth"),
            sga_expenses_growth: r.get::<Option<f64>, _>("sga_expenses_growth"),
            last_adjusted_close: r.get::<f64, _>("last_adjusted_close"),
            last_volume: r.get::<i64, _>("last_volume"),
            y_return: r.get::<Option<f64>, _>("y_return"),
        }).collect())
    }

    pub async fn count_rows(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM screening_rows")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait::async_trait]
impl ScreeningSink for ScreeningDatabase {
    async fn upsert_screening_row(&self, row: &ScreeningRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO screening_rows (
                date, isin, symbol, company_name, ipo_date, ipo_date_lt_10_years,
                is_actively_trading, avg_volume, country, exchange_short_name, sector, industry,
                revenue_growth, ebit_growth, operating_income_growth, net_income_growth,
                eps_growth, inventory_growth, rd_expense_growth, debt_growth, sga_expenses_growth,
                last_adjusted_close, last_volume, y_return
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(date, symbol) DO UPDATE SET
                isin = excluded.isin,
                company_name = excluded.company_name,
                ipo_date = excluded.ipo_date,
                ipo_date_lt_10_years = excluded.ipo_date_lt_10_years,
                is_actively_trading = excluded.is_actively_trading,
                avg_volume = excluded.avg_volume,
                country = excluded.country,
                exchange_short_name = excluded.exchange_short_name,
                sector = excluded.sector,
                industry = excluded.industry,
                revenue_growth = excluded.revenue_growth,
                ebit_growth = excluded.ebit_growth,
                operating_income_growth = excluded.operating_income_growth,
                net_income_growth = excluded.net_income_growth,
                eps_growth = excluded.eps_growth,
                inventory_growth = excluded.inventory_growth,
                rd_expense_growth = excluded.rd_expense_growth,
                debt_growth = excluded.debt_growth,
                sga_expenses_growth = excluded.sga_expenses_growth,
                last_adjusted_close = excluded.last_adjusted_close,
                last_volume = excluded.last_volume,
                y_return = excluded.y_return,
                updated_at = CURRENT_TIMESTAMP
            "#
        )
        .bind(row.date)
        .bind(&row.isin)
        .bind(&row.symbol)
        .bind(&row.company_name)
        .bind(row.ipo_date)
        .bind(row.ipo_date_lt_10_years)
        .bind(row.is_actively_trading)
        .bind(row.avg_volume)
        .bind(&row.country)
        .bind(&row.exchange_short_name)
        .bind(&row.sector)
        .bind(&row.industry)
        .bind(row.revenue_growth)
        .bind(row.ebit_growth)
        .bind(row.operating_income_growth)
        .bind(row.net_income_growth)
        .bind(row.eps_growth)
        .bind(row.inventory_growth)
        .bind(row.rd_expense_growth)
        .bind(row.debt_growth)
        .bind(row.sga_expenses_growth)
        .bind(row.last_adjusted_close)
        .bind(row.last_volume)
        .bind(row.y_return)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_label(
        &self,
        date: NaiveDate,
        symbol: &str,
        y_return: Option<f64>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE screening_rows
            SET y_return = ?, updated_at = CURRENT_TIMESTAMP
            WHERE date = ? AND symbol = ?
            "#
        )
        .bind(y_return)
        .bind(date)
        .bind(symbol)
        .execute(&self.pool)
        .await?;

        // Labels only land on rows whose upsert succeeded
        if result.rows_affected() == 0 {
            return Err(ScreenerError::RowNotFound {
                symbol: symbol.to_string(),
                date,
            });
        }

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
