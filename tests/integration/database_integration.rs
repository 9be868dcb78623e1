//! Integration tests for the SQLite screening store

use assert_matches::assert_matches;
use equity_screener::database::ScreeningSink;
use equity_screener::ScreenerError;
use pretty_assertions::assert_eq;

use crate::common::database::init_fresh_test_database;
use crate::common::logging;
use crate::common::test_data::{create_test_row, date};

#[tokio::test]
async fn test_upsert_and_read_back() {
    logging::init_test_logging();
    logging::log_test_step("Testing screening row persistence");

    let test_db = init_fresh_test_database().await;
    let db = &test_db.database;

    let row = create_test_row("AIR.PA", date(2023, 12, 31), 165.0);
    db.upsert_screening_row(&row).await.expect("Failed to upsert row");

    let stored = db.get_screening_rows().await.expect("Failed to read rows");
    assert_eq!(stored, vec![row]);
}

#[tokio::test]
async fn test_upsert_updates_existing_key() {
    let test_db = init_fresh_test_database().await;
    let db = &test_db.database;

    let mut row = create_test_row("AIR.PA", date(2023, 12, 31), 165.0);
    db.upsert_screening_row(&row).await.unwrap();

    row.last_adjusted_close = 170.5;
    row.sector = Some("Aerospace".to_string());
    db.upsert_screening_row(&row).await.unwrap();

    assert_eq!(db.count_rows().await.unwrap(), 1);
    let stored = db.get_screening_rows().await.unwrap();
    assert_eq!(stored[0].last_adjusted_close, 170.5);
    assert_eq!(stored[0].sector.as_deref(), Some("Aerospace"));
}

#[tokio::test]
async fn test_same_date_different_symbols_are_distinct() {
    let test_db = init_fresh_test_database().await;
    let db = &test_db.database;

    db.upsert_screening_row(&create_test_row("AIR.PA", date(2023, 12, 31), 165.0)).await.unwrap();
    db.upsert_screening_row(&create_test_row("UCB.BR", date(2023, 12, 31), 80.0)).await.unwrap();

    assert_eq!(db.count_rows().await.unwrap(), 2);
}

#[tokio::test]
async fn test_record_label_updates_by_natural_key() {
    let test_db = init_fresh_test_database().await;
    let db = &test_db.database;

    db.upsert_screening_row(&create_test_row("AIR.PA", date(2022, 12, 31), 100.0)).await.unwrap();
    db.upsert_screening_row(&create_test_row("AIR.PA", date(2023, 12, 31), 110.0)).await.unwrap();

    let label = (110.0f64 / 100.0).ln();
    db.record_label(date(2022, 12, 31), "AIR.PA", Some(label)).await.unwrap();
    db.record_label(date(2023, 12, 31), "AIR.PA", None).await.unwrap();

    let stored = db.get_screening_rows().await.unwrap();
    assert_eq!(stored[0].y_return, Some(label));
    assert_eq!(stored[1].y_return, None);

    db.close().await.unwrap();
}

#[tokio::test]
async fn test_record_label_without_stored_row_fails() {
    let test_db = init_fresh_test_database().await;
    let db = &test_db.database;

    db.upsert_screening_row(&create_test_row("AIR.PA", date(2023, 12, 31), 110.0)).await.unwrap();

    let result = db.record_label(date(2022, 12, 31), "AIR.PA", Some(0.1)).await;

    assert_matches!(
        result,
        Err(ScreenerError::RowNotFound { ref symbol, date: missing })
            if symbol == "AIR.PA" && missing == date(2022, 12, 31)
    );
    assert_eq!(db.count_rows().await.unwrap(), 1);
}
