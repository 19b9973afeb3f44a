use serde_json::Value;

use crate::error::{Error, Result};
use crate::splitter::Spliterator;

/// Lifts a [`Spliterator`] into a sequence of parsed [`serde_json::Value`]s — the NDJSON
/// decoder stage. Each record is decoded as UTF-8 and then parsed as JSON; either failure is
/// reported with the zero-based index of the offending record.
pub struct JsonStage<'a> {
    inner: Spliterator<'a>,
    index: u64,
}

impl<'a> JsonStage<'a> {
    pub fn new(inner: Spliterator<'a>) -> Self {
        Self { inner, index: 0 }
    }

    fn parse(bytes: &[u8], index: u64) -> Result<Value> {
        let text = std::str::from_utf8(bytes).map_err(|_| Error::decode(index))?;
        serde_json::from_str(text).map_err(|err| Error::parse(index, err.to_string()))
    }
}

impl<'a> Iterator for JsonStage<'a> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let span = self.inner.next()?;
        let index = self.index;
        self.index += 1;
        Some(Self::parse(span.as_bytes(), index))
    }
}
