use async_trait::async_trait;

use crate::async_source::{ChunkStream, SeekableSource};
use crate::buffer::GrowBuf;
use crate::byte_range::ByteRange;
use crate::error::Result;
use crate::needle::Needle;
use crate::range_queue::RangeQueue;
use crate::span::Span;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
const DEFAULT_HIGH_WATER_MARK: usize = 256 * 1024;

/// Something the asynchronous spliterator can pull the next chunk of bytes from.
///
/// Both a seekable source read in fixed-size chunks and a push-style chunk stream end up behind
/// this same trait, so [`AsyncSpliterator`] itself only ever has one feeding loop to run.
#[async_trait]
trait Feed: Send {
    async fn next(&mut self) -> Result<Option<Vec<u8>>>;
}

struct SeekableFeed<R> {
    source: R,
    cursor: u64,
    chunk_size: usize,
    total_len: Option<u64>,
}

#[async_trait]
impl<R: SeekableSource> Feed for SeekableFeed<R> {
    async fn next(&mut self) -> Result<Option<Vec<u8>>> {
        let total_len = match self.total_len {
            Some(len) => len,
            None => {
                let len = self.source.len().await?;
                self.total_len = Some(len);
                len
            }
        };
        if self.cursor >= total_len {
            return Ok(None);
        }

        // Each read is sized to what is actually left in the source, never past it.
        let remaining = total_len - self.cursor;
        let want = (self.chunk_size as u64).min(remaining) as usize;
        let mut buf = vec![0u8; want];
        let n = self.source.read_at(self.cursor, &mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        self.cursor += n as u64;
        Ok(Some(buf))
    }
}

struct ChunkFeed<C> {
    stream: C,
}

#[async_trait]
impl<C: ChunkStream> Feed for ChunkFeed<C> {
    async fn next(&mut self) -> Result<Option<Vec<u8>>> {
        self.stream.next_chunk().await
    }
}

/// Streams delimiter-separated records out of a seekable or chunked asynchronous source.
///
/// Unlike the synchronous [`Spliterator`](crate::Spliterator), this never spawns a task of its
/// own: `next()` suspends only at the single I/O boundary, the call into the underlying feed, and
/// returns control to whatever runtime is driving it between records.
pub struct AsyncSpliterator<F> {
    feed: F,
    needle: Needle,
    buf: GrowBuf,
    base: usize,
    pos: usize,
    queue: RangeQueue,
    last_emitted: Option<ByteRange>,
    yielded: u64,
    drop: usize,
    take: Option<usize>,
    skip_empty: bool,
    high_water_mark: usize,
    eof: bool,
    exhausted: bool,
}

impl<R: SeekableSource> AsyncSpliterator<SeekableFeed<R>> {
    pub fn from_seekable(source: R, needle: Needle) -> Self {
        AsyncSpliteratorBuilder::new().build_seekable(source, needle)
    }
}

impl<C: ChunkStream> AsyncSpliterator<ChunkFeed<C>> {
    pub fn from_chunk_stream(stream: C, needle: Needle) -> Self {
        AsyncSpliteratorBuilder::new().build_chunk_stream(stream, needle)
    }
}

/// Builder shared by both asynchronous spliterator constructors.
#[derive(Debug, Clone)]
pub struct AsyncSpliteratorBuilder {
    drop: usize,
    take: Option<usize>,
    skip_empty: bool,
    high_water_mark: usize,
    chunk_size: usize,
    buffer_capacity: usize,
}

impl Default for AsyncSpliteratorBuilder {
    fn default() -> Self {
        Self {
            drop: 0,
            take: None,
            skip_empty: false,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            chunk_size: DEFAULT_CHUNK_SIZE,
            buffer_capacity: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl AsyncSpliteratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drop(&mut self, drop: usize) -> &mut Self {
        self.drop = drop;
        self
    }

    pub fn take(&mut self, take: Option<usize>) -> &mut Self {
        self.take = take;
        self
    }

    pub fn skip_empty(&mut self, skip_empty: bool) -> &mut Self {
        self.skip_empty = skip_empty;
        self
    }

    pub fn high_water_mark(&mut self, high_water_mark: usize) -> &mut Self {
        self.high_water_mark = high_water_mark;
        self
    }

    /// Size of each read issued against a seekable source. Irrelevant to chunk-stream sources,
    /// which hand over whatever chunk size the stream itself produces.
    pub fn chunk_size(&mut self, chunk_size: usize) -> &mut Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn buffer_capacity(&mut self, buffer_capacity: usize) -> &mut Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    pub fn build_seekable<R: SeekableSource>(
        &self,
        source: R,
        needle: Needle,
    ) -> AsyncSpliterator<SeekableFeed<R>> {
        self.build(
            SeekableFeed {
                source,
                cursor: 0,
                chunk_size: self.chunk_size,
                total_len: None,
            },
            needle,
        )
    }

    pub fn build_chunk_stream<C: ChunkStream>(
        &self,
        stream: C,
        needle: Needle,
    ) -> AsyncSpliterator<ChunkFeed<C>> {
        self.build(ChunkFeed { stream }, needle)
    }

    fn build<F>(&self, feed: F, needle: Needle) -> AsyncSpliterator<F> {
        AsyncSpliterator {
            feed,
            needle,
            buf: GrowBuf::with_capacity(self.buffer_capacity),
            base: 0,
            pos: 0,
            queue: RangeQueue::new(),
            last_emitted: None,
            yielded: 0,
            drop: self.drop,
            take: self.take,
            skip_empty: self.skip_empty,
            high_water_mark: self.high_water_mark,
            eof: false,
            exhausted: false,
        }
    }
}

impl<F: Feed> AsyncSpliterator<F> {
    async fn fill(&mut self) -> Result<()> {
        loop {
            if self.queue.total_bytes() >= self.high_water_mark {
                return Ok(());
            }
            let local_pos = self.pos - self.base;
            let local_len = self.buf.written();
            match self.needle.search(self.buf.as_slice(), local_pos, local_len) {
                Some(local_at) => {
                    let at = self.base + local_at;
                    self.queue.push(ByteRange::new(self.pos, at));
                    self.pos = at + self.needle.len();
                }
                None => match self.feed.next().await? {
                    Some(chunk) => {
                        self.buf.set(&chunk, local_len);
                        self.compact();
                    }
                    None => {
                        self.eof = true;
                        return Ok(());
                    }
                },
            }
        }
    }

    /// Discards buffered bytes that lie before every range still live: either a pending range
    /// sitting unpopped in the queue, or the search cursor if the queue is currently empty.
    fn compact(&mut self) {
        let earliest_live = self.queue.front().map(|r| r.start).unwrap_or(self.pos);
        let lo_local = earliest_live - self.base;
        if lo_local == 0 {
            return;
        }
        let hi_local = self.buf.written();
        self.buf.compact(lo_local, hi_local);
        self.base += lo_local;
    }

    fn drain(&mut self) {
        if self.queue.is_empty() && self.eof && !self.exhausted {
            let total_len = self.base + self.buf.written();
            let range = match self.last_emitted {
                Some(last) => ByteRange::new(last.end + self.needle.len(), total_len),
                None => ByteRange::new(0, total_len),
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

    fn local_bytes(&self, range: ByteRange) -> &[u8] {
        let lo = range.start - self.base;
        let hi = range.end - self.base;
        &self.buf.as_slice()[lo..hi]
    }

    /// Returns the next record, suspending at most once per call (at the underlying feed's I/O
    /// boundary) to do so.
    pub async fn next(&mut self) -> Result<Option<Span<'_>>> {
        loop {
            if self.done() {
                return Ok(None);
            }
            if self.queue.is_empty() {
                if self.exhausted {
                    return Ok(None);
                }
                self.fill().await?;
                self.drain();
            }
            let range = match self.queue.pop() {
                Some(range) => range,
                None => return Ok(None),
            };
            self.last_emitted = Some(range);
            if range.is_empty() && self.skip_empty {
                continue;
            }
            self.yielded += 1;
            if self.yielded <= self.drop as u64 {
                continue;
            }
            let bytes = self.local_bytes(range);
            return Ok(Some(Span::new(range, bytes)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct MemorySource {
        data: Vec<u8>,
    }

    #[async_trait]
    impl SeekableSource for MemorySource {
        async fn len(&mut self) -> Result<u64> {
            Ok(self.data.len() as u64)
        }

        async fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
            let offset = offset as usize;
            if offset >= self.data.len() {
                return Ok(0);
            }
            let n = buf.len().min(self.data.len() - offset);
            buf[..n].copy_from_slice(&self.data[offset..offset + n]);
            Ok(n)
        }
    }

    struct VecChunks(Mutex<std::vec::IntoIter<Vec<u8>>>);

    #[async_trait]
    impl ChunkStream for VecChunks {
        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
            Ok(self.0.lock().unwrap().next())
        }
    }

    #[tokio::test]
    async fn seekable_source_splits_across_small_reads() {
        let source = MemorySource {
            data: b"ab\ncd\nef".to_vec(),
        };
        let mut spliterator = AsyncSpliteratorBuilder::new()
            .chunk_size(3)
            .build_seekable(source, Needle::from_byte(b'\n'));

        let mut out = Vec::new();
        while let Some(span) = spliterator.next().await.unwrap() {
            out.push(span.as_bytes().to_vec());
        }
        assert_eq!(out, vec![b"ab".to_vec(), b"cd".to_vec(), b"ef".to_vec()]);
    }

    #[tokio::test]
    async fn chunk_stream_source_splits_across_chunk_boundaries() {
        let stream = VecChunks(Mutex::new(
            vec![b"a\nb".to_vec(), b"\nc".to_vec()].into_iter(),
        ));
        let mut spliterator =
            AsyncSpliteratorBuilder::new().build_chunk_stream(stream, Needle::from_byte(b'\n'));

        let mut out = Vec::new();
        while let Some(span) = spliterator.next().await.unwrap() {
            out.push(span.as_bytes().to_vec());
        }
        assert_eq!(out, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[tokio::test]
    async fn high_water_mark_caps_how_far_fill_reads_ahead() {
        let source = MemorySource {
            data: b"a\nb\nc\nd\ne\n".to_vec(),
        };
        let mut spliterator = AsyncSpliteratorBuilder::new()
            .chunk_size(2)
            .high_water_mark(1)
            .build_seekable(source, Needle::from_byte(b'\n'));

        let first = spliterator.next().await.unwrap().unwrap().as_bytes().to_vec();
        assert_eq!(first, b"a".to_vec());
    }

    /// A source that fails any `read_at` requesting bytes past its own `len()`, so a feed that
    /// still sized its reads as a flat `chunk_size` regardless of how much is actually left would
    /// fail this test instead of silently over-requesting and relying on a short read.
    struct StrictSource {
        data: Vec<u8>,
    }

    #[async_trait]
    impl SeekableSource for StrictSource {
        async fn len(&mut self) -> Result<u64> {
            Ok(self.data.len() as u64)
        }

        async fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
            let offset = offset as usize;
            assert!(
                offset + buf.len() <= self.data.len(),
                "feed requested {} bytes at offset {offset}, past the source's length of {}",
                buf.len(),
                self.data.len()
            );
            buf.copy_from_slice(&self.data[offset..offset + buf.len()]);
            Ok(buf.len())
        }
    }

    #[tokio::test]
    async fn seekable_feed_sizes_reads_to_what_is_actually_left_in_the_source() {
        let source = StrictSource {
            data: b"ab\ncd\nef".to_vec(),
        };
        let mut spliterator = AsyncSpliteratorBuilder::new()
            .chunk_size(64 * 1024)
            .build_seekable(source, Needle::from_byte(b'\n'));

        let mut out = Vec::new();
        while let Some(span) = spliterator.next().await.unwrap() {
            out.push(span.as_bytes().to_vec());
        }
        assert_eq!(out, vec![b"ab".to_vec(), b"cd".to_vec(), b"ef".to_vec()]);
    }
}
