use crate::projection::{TableRow, TABLE_COLUMNS};
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::io::Write;

/// Writes table rows as CSV with the column display names as header.
pub fn write_table<W: Write>(writer: W, rows: &[TableRow]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);

    wtr.write_record(TABLE_COLUMNS.iter().map(|column| column.name))
        .context("Failed to write CSV header")?;
    for row in rows {
        wtr.serialize(row).context("Failed to write CSV row")?;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}
