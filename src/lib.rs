/*!
`spliterator` streams records out of delimited byte sources — files, in-memory buffers, and
asynchronous chunk streams — without materializing the full input in memory. Canonical uses are
newline-delimited text, NDJSON, and comma/tab-separated values, but the delimiter is arbitrary:
any non-empty byte sequence, including multi-byte sequences such as CRLF.

# Spliterators

From simplest to most capable:

- [`Spliterator`]: a synchronous, zero-copy iterator over an in-memory `&[u8]` slice. Each
  emitted [`Span`] borrows directly from the source; no record is ever copied.
- [`AsyncSpliterator`]: the same state machine driving either a [`SeekableSource`] (read at
  arbitrary positions, e.g. a file) or a [`ChunkStream`] (pull-based, e.g. a network body),
  suspending only at the underlying read.

# Stages

Thin decoders built on top of a spliterator:

- [`TextStage`]: decodes each record as UTF-8.
- [`JsonStage`]: decodes and parses each record as JSON (NDJSON).
- [`CsvReader`], [`CsvReaderBuilder`]: row spliterator composed with a quote-aware per-row column
  scan, optional header extraction and canonicalization, transformer application, and emission as
  array / object / entries.

# Parallelism

[`plan_chunks`] (aliased as [`segments`] for callers migrating from record-oriented seeking code)
partitions a seekable source of known size into delimiter-aligned byte ranges, so independent
spliterator instances can scan disjoint ranges concurrently; see `demos/parallel_count.rs` for a
`rayon`-driven example. [`approx_count`] estimates the total record count from a leading sample,
without scanning the whole source, for sizing that fan-out up front.

# Design notes

The hard part of this crate is the spliterator's fill/drain state machine: scan a growing buffer
for delimiter occurrences, emit zero-copy views between them, compact consumed regions, and
correctly handle every end-of-input boundary case (empty source, source that is exactly one
delimiter, multi-byte delimiter split across a chunk boundary, ...). The synchronous and
asynchronous spliterators share that state machine; the only difference is where bytes come from.

# Caveats

This is not a full CSV parser: embedded newlines inside quoted fields are not supported — only the
column scanner is quote-aware, the row scanner treats the row delimiter literally even inside
quotes. Doubled quotes (`""`) are two literal quotes, not a decoded escape.
*/
mod async_source;
mod async_splitter;
mod buffer;
mod byte_range;
mod csv;
mod error;
mod json;
mod needle;
mod planner;
mod range_queue;
mod span;
mod splitter;
mod text;
mod utils;

pub use async_source::{ChunkStream, SeekableSource};
pub use async_splitter::{AsyncSpliterator, AsyncSpliteratorBuilder};
pub use byte_range::ByteRange;
pub use csv::{CsvMode, CsvReader, CsvReaderBuilder, CsvRow, Entry, Transformer};
pub use error::{Error, Result};
pub use json::JsonStage;
pub use needle::Needle;
pub use planner::{approx_count, plan_chunks, segments};
pub use span::Span;
pub use splitter::{Spliterator, SpliteratorBuilder};
pub use text::TextStage;
pub use utils::{normalize_column_names, zip_padded};
