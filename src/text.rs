use crate::error::{Error, Result};
use crate::splitter::Spliterator;

/// Lifts a [`Spliterator`] into a sequence of decoded `String`s, reporting per-record UTF-8
/// decode failures alongside the zero-based index of the offending record.
///
/// Unlike the spliterator it wraps, each yielded item owns its bytes: decoding a `Span` requires
/// copying it into a `String` one way or another, so there is no zero-copy variant of this stage.
pub struct TextStage<'a> {
    inner: Spliterator<'a>,
    index: u64,
}

impl<'a> TextStage<'a> {
    pub fn new(inner: Spliterator<'a>) -> Self {
        Self { inner, index: 0 }
    }
}

impl<'a> Iterator for TextStage<'a> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let span = self.inner.next()?;
        let index = self.index;
        self.index += 1;
        Some(String::from_utf8(span.as_bytes().to_vec()).map_err(|_| Error::decode(index)))
    }
}
