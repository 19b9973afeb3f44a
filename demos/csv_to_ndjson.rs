use std::io::{self, Write};

use clap::Parser;
use serde_json::Value;
use spliterator::{CsvMode, CsvReaderBuilder, CsvRow, Needle};

/// Projects a CSV (or TSV, with `--column-delimiter '\t'`) file to newline-delimited JSON, one
/// object per row, keyed by the (canonicalized) header.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the CSV file.
    path: String,

    /// Delimiter between fields within a row.
    #[arg(long, default_value = ",")]
    column_delimiter: String,

    #[arg(long)]
    no_normalize_keys: bool,
}

fn row_to_json(row: CsvRow) -> Value {
    match row {
        CsvRow::Object(pairs) => Value::Object(
            pairs
                .into_iter()
                .map(|(k, v)| (k, v.map(Value::String).unwrap_or(Value::Null)))
                .collect(),
        ),
        CsvRow::Entries(entries) => Value::Object(
            entries
                .into_iter()
                .map(|e| (e.key, e.value.map(Value::String).unwrap_or(Value::Null)))
                .collect(),
        ),
        CsvRow::Array(values) => Value::Array(values.into_iter().map(Value::String).collect()),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let data = std::fs::read(&args.path)?;
    let column_delimiter = Needle::try_from(args.column_delimiter.as_str())?;

    let mut builder = CsvReaderBuilder::new();
    builder
        .mode(CsvMode::Object)
        .column_delimiter(column_delimiter)
        .normalize_keys(!args.no_normalize_keys);
    let rows = builder.build(&data)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for row in rows {
        let value = row_to_json(row?);
        serde_json::to_writer(&mut out, &value)?;
        out.write_all(b"\n")?;
    }

    Ok(())
}
