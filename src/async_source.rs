use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::Result;

/// A random-access byte source the asynchronous spliterator and the chunk planner can read from
/// at arbitrary offsets.
///
/// This is the seekable half of the asynchronous surface: a source that knows its own length and
/// can serve a read starting anywhere in it, the way a file or a memory map would.
#[async_trait]
pub trait SeekableSource: Send {
    async fn len(&mut self) -> Result<u64>;

    /// Reads up to `buf.len()` bytes starting at `offset`, returning the number of bytes read (0
    /// at end of source).
    async fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize>;
}

#[async_trait]
impl SeekableSource for tokio::fs::File {
    async fn len(&mut self) -> Result<u64> {
        Ok(self.metadata().await?.len())
    }

    async fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.seek(std::io::SeekFrom::Start(offset)).await?;
        Ok(self.read(buf).await?)
    }
}

/// A push-style byte source: the asynchronous spliterator pulls the next chunk rather than
/// seeking, which is what a network body or a `ChunkStream`-backed decoder pipeline needs.
#[async_trait]
pub trait ChunkStream: Send {
    /// Returns the next chunk, or `None` once the stream is exhausted. Returning `Some(vec![])`
    /// is legal and treated as a no-op chunk; implementations are not required to skip it.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
}

#[async_trait]
impl<S> ChunkStream for S
where
    S: futures_core::Stream<Item = Result<Vec<u8>>> + Unpin + Send,
{
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        match self.next().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    struct VecStream(std::vec::IntoIter<Vec<u8>>);

    impl futures_core::Stream for VecStream {
        type Item = Result<Vec<u8>>;

        fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            Poll::Ready(self.0.next().map(Ok))
        }
    }

    #[tokio::test]
    async fn blanket_chunk_stream_impl_drains_a_futures_stream() {
        let mut stream = VecStream(vec![b"ab".to_vec(), b"cd".to_vec()].into_iter());
        assert_eq!(stream.next_chunk().await.unwrap(), Some(b"ab".to_vec()));
        assert_eq!(stream.next_chunk().await.unwrap(), Some(b"cd".to_vec()));
        assert_eq!(stream.next_chunk().await.unwrap(), None);
    }
}
