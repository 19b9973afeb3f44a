//! Checks that the different ways of walking a delimited byte source all agree: the synchronous
//! spliterator, the asynchronous spliterator (over a seekable source read in small chunks and
//! over a chunk stream), and the parallel chunk planner reconstructed in order.

use async_trait::async_trait;
use std::io::Cursor;

use spliterator::{
    plan_chunks, AsyncSpliteratorBuilder, ChunkStream, Needle, SeekableSource, Spliterator,
};

struct MemorySource {
    data: Vec<u8>,
}

#[async_trait]
impl SeekableSource for MemorySource {
    async fn len(&mut self) -> spliterator::Result<u64> {
        Ok(self.data.len() as u64)
    }

    async fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> spliterator::Result<usize> {
        let offset = offset as usize;
        if offset >= self.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.data.len() - offset);
        buf[..n].copy_from_slice(&self.data[offset..offset + n]);
        Ok(n)
    }
}

struct VecChunks(std::vec::IntoIter<Vec<u8>>);

#[async_trait]
impl ChunkStream for VecChunks {
    async fn next_chunk(&mut self) -> spliterator::Result<Option<Vec<u8>>> {
        Ok(self.0.next())
    }
}

fn sync_records(data: &[u8], needle: &Needle, skip_empty: bool) -> Vec<Vec<u8>> {
    let mut splitter = Spliterator::builder()
        .skip_empty(skip_empty)
        .build(data, needle.clone());
    let mut out = Vec::new();
    while let Some(span) = splitter.next() {
        out.push(span.as_bytes().to_vec());
    }
    out
}

fn conformance_cases() -> Vec<(&'static [u8], &'static [u8])> {
    vec![
        (b"ab\ncd\nef" as &[u8], b"\n" as &[u8]),
        (b"a\n\nb", b"\n"),
        (b"", b"\n"),
        (b"\n", b"\n"),
        (b"trailing delimiter\n", b"\n"),
        (b"a::b::c::d", b"::"),
        (b"no delimiter at all here", b"\n"),
    ]
}

#[tokio::test]
async fn sync_and_async_seekable_spliterators_agree() {
    for (data, delim) in conformance_cases() {
        for skip_empty in [false, true] {
            let needle = Needle::try_from(delim).unwrap();

            let expected = sync_records(data, &needle, skip_empty);

            let source = MemorySource { data: data.to_vec() };
            let mut async_splitter = AsyncSpliteratorBuilder::new()
                .chunk_size(3)
                .skip_empty(skip_empty)
                .build_seekable(source, needle);

            let mut actual = Vec::new();
            while let Some(span) = async_splitter.next().await.unwrap() {
                actual.push(span.as_bytes().to_vec());
            }

            assert_eq!(
                actual, expected,
                "seekable-source async spliterator disagreed with the synchronous one for {data:?} / {delim:?} / skip_empty={skip_empty}"
            );
        }
    }
}

#[tokio::test]
async fn sync_and_async_chunk_stream_spliterators_agree() {
    for (data, delim) in conformance_cases() {
        for skip_empty in [false, true] {
            let needle = Needle::try_from(delim).unwrap();

            let expected = sync_records(data, &needle, skip_empty);

            // Feed the chunk stream byte-by-byte: the narrowest possible chunking, most likely to
            // expose a boundary bug in the fill/compact loop.
            let chunks: Vec<Vec<u8>> = data.iter().map(|&b| vec![b]).collect();
            let stream = VecChunks(chunks.into_iter());
            let mut async_splitter = AsyncSpliteratorBuilder::new()
                .skip_empty(skip_empty)
                .build_chunk_stream(stream, needle);

            let mut actual = Vec::new();
            while let Some(span) = async_splitter.next().await.unwrap() {
                actual.push(span.as_bytes().to_vec());
            }

            assert_eq!(
                actual, expected,
                "chunk-stream async spliterator disagreed with the synchronous one for {data:?} / {delim:?} / skip_empty={skip_empty}"
            );
        }
    }
}

#[test]
fn planner_reconstruction_matches_whole_source_spliterator() {
    let data = b"one\ntwo\nthree\nfour\nfive\nsix\nseven\neight\nnine\nten\n".to_vec();
    let needle = Needle::from_byte(b'\n');

    let expected = sync_records(&data, &needle, true);

    for desired_chunks in [1usize, 2, 3, 4, 7, 32] {
        let mut cursor = Cursor::new(data.clone());
        let ranges = plan_chunks(&mut cursor, &needle, desired_chunks).unwrap();

        let mut actual = Vec::new();
        for range in &ranges {
            let slice = &data[range.start..range.end];
            actual.extend(sync_records(slice, &needle, true));
        }

        assert_eq!(
            actual, expected,
            "planner reconstruction disagreed with the whole-source spliterator for desired_chunks={desired_chunks}"
        );
    }
}

#[test]
fn planner_reconstruction_agrees_on_an_empty_source() {
    let data: Vec<u8> = Vec::new();
    let needle = Needle::from_byte(b'\n');

    let mut cursor = Cursor::new(data.clone());
    let ranges = plan_chunks(&mut cursor, &needle, 8).unwrap();
    assert_eq!(ranges.len(), 1);

    let slice = &data[ranges[0].start..ranges[0].end];
    assert!(sync_records(slice, &needle, true).is_empty());
}
