//! CSV input and output for tables

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

use super::table::{Column, Scalar, Table};

/// Read a headed CSV into a table, typing each cell independently
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("failed to read CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut values: Vec<Vec<Scalar>> = vec![Vec::new(); headers.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to parse CSV row {}", row + 1))?;
        for (i, cell) in values.iter_mut().enumerate() {
            cell.push(Scalar::parse_field(record.get(i).unwrap_or("")));
        }
    }

    let rows = values.first().map(Vec::len).unwrap_or(0);
    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Ok(Table::new((0..rows).collect(), columns)?)
}

pub fn read_csv_file(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_csv(file).with_context(|| format!("failed to read {}", path.display()))
}

/// Write a table as CSV; booleans are written as `True`/`False`
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.column_names())?;
    for row in 0..table.num_rows() {
        let cells = table.columns().iter().map(|c| match &c.values[row] {
            Scalar::Bool(true) => "True".to_string(),
            Scalar::Bool(false) => "False".to_string(),
            other => other.to_string(),
        });
        writer.write_record(cells)?;
    }
    writer.flush()?;
    Ok(())
}
