use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::models::ScreeningRow;

/// Write rows as CSV with a header line
pub fn write_rows<W: Write>(writer: W, rows: &[ScreeningRow]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn export_csv(path: &Path, rows: &[ScreeningRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_rows(file, rows)?;
    info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(())
}
