use crate::byte_range::ByteRange;
use crate::error::Result;
use crate::needle::Needle;
use crate::range_queue::RangeQueue;
use crate::span::Span;

/// Builder for a synchronous [`Spliterator`] over an in-memory byte slice.
#[derive(Debug, Clone)]
pub struct SpliteratorBuilder {
    position_init: usize,
    drop: usize,
    take: Option<usize>,
    skip_empty: bool,
    high_water_mark: usize,
    quote: Option<u8>,
}

impl Default for SpliteratorBuilder {
    fn default() -> Self {
        Self {
            position_init: 0,
            drop: 0,
            take: None,
            skip_empty: false,
            high_water_mark: 64 * 1024,
            quote: None,
        }
    }
}

impl SpliteratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting cursor into the source. If at or past the end of a non-empty source, the
    /// spliterator emits nothing at all, regardless of `skip_empty`.
    pub fn position_init(&mut self, position_init: usize) -> &mut Self {
        self.position_init = position_init;
        self
    }

    /// Number of leading records to discard before emission starts.
    pub fn drop(&mut self, drop: usize) -> &mut Self {
        self.drop = drop;
        self
    }

    /// Maximum number of records to emit, after `drop` is applied. `None` means unbounded.
    pub fn take(&mut self, take: Option<usize>) -> &mut Self {
        self.take = take;
        self
    }

    /// If set, empty records (two adjacent delimiters, or a leading/trailing delimiter) are
    /// silently dropped instead of emitted.
    pub fn skip_empty(&mut self, skip_empty: bool) -> &mut Self {
        self.skip_empty = skip_empty;
        self
    }

    /// Caps how many bytes of pending ranges a single fill pass accumulates before returning
    /// control. A synchronous spliterator over a slice has no I/O to amortize, but the cap still
    /// bounds how far ahead a single fill call scans.
    pub fn high_water_mark(&mut self, high_water_mark: usize) -> &mut Self {
        self.high_water_mark = high_water_mark;
        self
    }

    /// Enables quote-aware scanning: a delimiter occurrence between an odd-numbered and
    /// even-numbered occurrence of `quote` is not treated as a delimiter. Used by the CSV column
    /// scanner; the row scanner leaves this unset.
    pub fn quote_aware(&mut self, quote: Option<u8>) -> &mut Self {
        self.quote = quote;
        self
    }

    pub fn build<'a>(&self, source: &'a [u8], needle: Needle) -> Spliterator<'a> {
        // A cursor at or past the end of a non-empty source has nothing left to read: the
        // spliterator starts already exhausted, so it emits nothing, not even one empty record.
        // A source that is itself empty (the default `position_init == 0` case) keeps the
        // ordinary empty-source behavior below, which is governed by `skip_empty`.
        let out_of_bounds = self.position_init > 0 && self.position_init >= source.len();
        Spliterator {
            source,
            needle,
            pos: self.position_init,
            queue: RangeQueue::new(),
            last_emitted: None,
            yielded: 0,
            drop: self.drop,
            take: self.take,
            skip_empty: self.skip_empty,
            high_water_mark: self.high_water_mark,
            quote: self.quote,
            in_quotes: false,
            exhausted: out_of_bounds,
        }
    }
}

/// Streams delimiter-separated records out of an in-memory byte slice without copying.
///
/// Each call to [`Spliterator::next`] returns a [`Span`] borrowing directly from `source`; no
/// record is ever materialized into its own allocation.
pub struct Spliterator<'a> {
    source: &'a [u8],
    needle: Needle,
    pos: usize,
    queue: RangeQueue,
    last_emitted: Option<ByteRange>,
    yielded: u64,
    drop: usize,
    take: Option<usize>,
    skip_empty: bool,
    high_water_mark: usize,
    quote: Option<u8>,
    in_quotes: bool,
    exhausted: bool,
}

impl<'a> Spliterator<'a> {
    pub fn new(source: &'a [u8], needle: Needle) -> Self {
        SpliteratorBuilder::new().build(source, needle)
    }

    pub fn builder() -> SpliteratorBuilder {
        SpliteratorBuilder::new()
    }

    fn fill(&mut self) {
        let len = self.source.len();
        while self.pos < len && self.queue.total_bytes() < self.high_water_mark {
            match self.next_delimiter(len) {
                Some(at) => {
                    self.queue.push(ByteRange::new(self.pos, at));
                    self.pos = at + self.needle.len();
                }
                None => break,
            }
        }
    }

    /// Finds the next delimiter occurrence at or after `self.pos`. With no quote byte configured
    /// this is a plain BMH search; with one configured, scanning drops to a linear byte-by-byte
    /// pass that tracks quote parity across the whole source (quote state must survive across
    /// calls, since a single row can span more than one `fill` pass under a small high-water
    /// mark).
    fn next_delimiter(&mut self, len: usize) -> Option<usize> {
        let quote = match self.quote {
            Some(quote) => quote,
            None => return self.needle.search(self.source, self.pos, len),
        };
        let needle_bytes = self.needle.as_bytes();
        let dlen = needle_bytes.len();
        let mut i = self.pos;
        while i < len {
            let b = self.source[i];
            if b == quote {
                self.in_quotes = !self.in_quotes;
                i += 1;
                continue;
            }
            if !self.in_quotes && i + dlen <= len && &self.source[i..i + dlen] == needle_bytes {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    fn drain(&mut self) {
        if self.queue.is_empty() && !self.exhausted {
            let len = self.source.len();
            let range = match self.last_emitted {
                Some(last) => ByteRange::new(last.end + self.needle.len(), len),
                None => ByteRange::new(self.pos, len),
            };
            self.queue.push(range);
            self.exhausted = true;
        }
    }

    fn done(&self) -> bool {
        match self.take {
            Some(take) => self.yielded >= self.drop as u64 + take as u64,
            None => false,
        }
    }

    /// Returns the next record, or `None` once the source and the `take` budget are both
    /// exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Span<'_>> {
        loop {
            if self.done() {
                return None;
            }
            if self.queue.is_empty() {
                if self.exhausted {
                    return None;
                }
                self.fill();
                self.drain();
            }
            let range = self.queue.pop()?;
            self.last_emitted = Some(range);
            if range.is_empty() && self.skip_empty {
                continue;
            }
            self.yielded += 1;
            if self.yielded <= self.drop as u64 {
                continue;
            }
            let bytes = &self.source[range.start..range.end];
            return Some(Span::new(range, bytes));
        }
    }

    /// Collects the coordinates of every remaining record without decoding them. Terminal, like
    /// `next()`: it drains whatever the spliterator has left to give.
    pub fn collect(&mut self) -> Vec<ByteRange> {
        let mut out = Vec::new();
        while let Some(span) = self.next() {
            out.push(span.range());
        }
        out
    }

    /// Decodes every remaining record with `decoder`, collecting into a `Vec`. A convenience
    /// wrapper over `next()`; terminal, and stops at the first decode failure.
    pub fn collect_decoded<D>(&mut self, mut decoder: D) -> Result<Vec<String>>
    where
        D: FnMut(&[u8]) -> Result<String>,
    {
        let mut out = Vec::new();
        while let Some(span) = self.next() {
            out.push(decoder(span.as_bytes())?);
        }
        Ok(out)
    }
}
