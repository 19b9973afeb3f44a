use std::io::{self, Write};

use clap::Parser;
use spliterator::{Needle, Spliterator};

/// Splits a file on an arbitrary byte-sequence delimiter and re-joins the records on stdout with
/// a (possibly different) delimiter.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the file to split.
    path: String,

    /// Delimiter to split the input on.
    #[arg(long, default_value = "\n")]
    split: String,

    /// Delimiter to join the output with.
    #[arg(long, default_value = "\n")]
    join: String,

    #[arg(long)]
    skip_empty: bool,

    #[arg(long)]
    take: Option<usize>,

    #[arg(long, default_value_t = 0)]
    drop: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let data = std::fs::read(&args.path)?;
    let needle = Needle::try_from(args.split.as_str())?;

    let mut builder = Spliterator::builder();
    builder.skip_empty(args.skip_empty).drop(args.drop).take(args.take);
    let mut splitter = builder.build(&data, needle);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut first = true;
    while let Some(span) = splitter.next() {
        if !first {
            out.write_all(args.join.as_bytes())?;
        }
        out.write_all(span.as_bytes())?;
        first = false;
    }

    Ok(())
}
