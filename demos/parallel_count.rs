use std::fs::File;

use clap::Parser;
use memmap2::Mmap;
use rayon::prelude::*;
use spliterator::{plan_chunks, Needle, Spliterator};

/// Counts records in a file by partitioning it into delimiter-aligned chunks with
/// [`plan_chunks`] and scanning each chunk with its own spliterator on a `rayon` thread pool.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the file to count records in.
    path: String,

    /// Target number of chunks to plan. The planner may return fewer.
    #[arg(long, default_value_t = 8)]
    chunks: usize,

    /// Record delimiter.
    #[arg(long, default_value = "\n")]
    delimiter: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let needle = Needle::try_from(args.delimiter.as_str())?;

    let mut file = File::open(&args.path)?;
    let ranges = plan_chunks(&mut file, &needle, args.chunks)?;
    let map = unsafe { Mmap::map(&file)? };

    let total: u64 = ranges
        .par_iter()
        .map(|range| {
            let slice = &map[range.start..range.end];
            let mut splitter = Spliterator::builder()
                .skip_empty(true)
                .build(slice, needle.clone());
            let mut count = 0u64;
            while splitter.next().is_some() {
                count += 1;
            }
            count
        })
        .sum();

    println!("{}", total);
    Ok(())
}
