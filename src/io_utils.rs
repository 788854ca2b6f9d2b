//! Filesystem helpers for chart output and CSV snapshots.

use std::{
    fs::{self, File},
    io::{self, BufWriter},
    path::Path,
};

use anyhow::{Context, Result};
use csv::QuoteStyle;

use crate::data::{Table, Value, is_missing};

/// Creates `path` and its parents. Existing directories are left as they are.
pub fn ensure_output_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

pub fn open_csv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    let file = File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
    let mut builder = csv::WriterBuilder::new();
    builder
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(BufWriter::new(file)))
}

/// Writes `table` with a header row. Missing cells are empty and decimals keep
/// their exact text.
pub fn write_table_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = open_csv_writer(path)?;
    writer
        .write_record(table.column_names())
        .with_context(|| format!("Writing header to {path:?}"))?;
    for row in 0..table.row_count() {
        let record = table
            .columns()
            .iter()
            .map(|column| cell_text(&column.values()[row]));
        writer
            .write_record(record)
            .with_context(|| format!("Writing row {} to {path:?}", row + 1))?;
    }
    writer
        .flush()
        .with_context(|| format!("Flushing {path:?}"))?;
    Ok(())
}

fn cell_text(cell: &Option<Value>) -> String {
    match cell {
        _ if is_missing(cell) => String::new(),
        Some(Value::Decimal(d)) => d.to_string(),
        Some(value) => value.as_display(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    #[test]
    fn ensure_output_dir_is_idempotent() {
        let dir = tempdir().expect("temp dir");
        let nested = dir.path().join("charts").join("final");
        ensure_output_dir(&nested).expect("first create");
        ensure_output_dir(&nested).expect("second create");
        assert!(nested.is_dir());
    }

    #[test]
    fn snapshot_keeps_decimal_text_and_blanks_missing() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("raw_sql_output.csv");
        let table = Table::from_columns(vec![
            Column::new(
                "AMOUNT",
                vec![Some(Value::Decimal(Decimal::new(1050, 2))), None],
            ),
            Column::from_f64("RATE", vec![Some(0.5), Some(f64::NAN)]),
        ])
        .expect("table");
        write_table_csv(&table, &path).expect("write snapshot");
        let contents = fs::read_to_string(&path).expect("read snapshot");
        assert_eq!(contents, "AMOUNT,RATE\n10.50,0.5\n,\n");
    }
}
