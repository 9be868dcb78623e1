use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the screening library.
///
/// Per-symbol failures and persistence failures share this type but are
/// counted separately by the screener.
#[derive(Debug, Error)]
pub enum ScreenerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("record for {symbol} is missing `{field}`")]
    MissingField { symbol: String, field: &'static str },

    #[error("no {what} returned for {symbol}")]
    EmptyResponse { symbol: String, what: &'static str },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("no stored row for {symbol} on {date}")]
    RowNotFound { symbol: String, date: NaiveDate },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to install logging: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScreenerError>;
