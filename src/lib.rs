pub mod api;
pub mod database;
pub mod enrichment;
pub mod error;
pub mod export;
pub mod filter_chain;
pub mod labeling;
pub mod logging;
pub mod models;
pub mod screener;

pub use error::{Result, ScreenerError};
