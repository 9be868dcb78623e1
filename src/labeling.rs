//! Forward log-return label over date-sorted screening rows.

use std::collections::HashMap;

use crate::models::{LabelScope, ScreeningRow};

/// Stable sort by period date, ascending
pub fn sort_by_date(rows: &mut [ScreeningRow]) {
    rows.sort_by_key(|row| row.date);
}

/// `ln(next / current)`, or `None` when either close cannot produce a finite log
pub fn log_return(current: f64, next: f64) -> Option<f64> {
    if current > 0.0 && next > 0.0 && current.is_finite() && next.is_finite() {
        Some((next / current).ln())
    } else {
        None
    }
}

/// Fill `y_return` on rows already sorted by date.
///
/// The last row of every scope is left without a label.
pub fn assign_forward_returns(rows: &mut [ScreeningRow], scope: LabelScope) {
    match scope {
        LabelScope::Global => {
            let order: Vec<usize> = (0..rows.len()).collect();
            label_sequence(rows, &order);
        }
        LabelScope::PerInstrument => {
            let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
            for (index, row) in rows.iter().enumerate() {
                groups.entry(row.symbol.clone()).or_default().push(index);
            }
            for indices in groups.values() {
                label_sequence(rows, indices);
            }
        }
    }
}

fn label_sequence(rows: &mut [ScreeningRow], indices: &[usize]) {
    for pair in indices.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        rows[current].y_return =
            log_return(rows[current].last_adjusted_close, rows[next].last_adjusted_close);
    }
    if let Some(&last) = indices.last() {
        rows[last].y_return = None;
    }
}
