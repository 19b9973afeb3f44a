use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::needle::Needle;
use crate::splitter::Spliterator;
use crate::utils::{normalize_column_names, zip_padded};

/// A column value transform: `string -> string`, applied either positionally or by header name.
/// Must be a pure function — it is handed each row's raw value independently and carries no
/// state across rows.
pub type Transformer = Box<dyn Fn(&str) -> String + Send + Sync>;

enum Transformers {
    None,
    Positional(Vec<Option<Transformer>>),
    ByName(HashMap<String, Transformer>),
}

impl Transformers {
    fn apply(&self, index: usize, key: Option<&String>, value: &str) -> String {
        match self {
            Transformers::None => value.to_string(),
            Transformers::Positional(list) => list
                .get(index)
                .and_then(|t| t.as_ref())
                .map(|f| f(value))
                .unwrap_or_else(|| value.to_string()),
            Transformers::ByName(map) => key
                .and_then(|k| map.get(k))
                .map(|f| f(value))
                .unwrap_or_else(|| value.to_string()),
        }
    }
}

/// How a projected row is shaped on emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvMode {
    /// The row's values, in column order, as they appeared.
    Array,
    /// Header name -> value. Values past the header's length are dropped; header entries with no
    /// matching column in a short row are emitted with `None`.
    Object,
    /// `(key, value, index)` triples, in header order. Same missing-value behavior as `Object`.
    Entries,
}

/// One `(key, value, index)` triple of an `Entries`-mode row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: Option<String>,
    pub index: usize,
}

/// A single projected CSV row, shaped per [`CsvMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvRow {
    Array(Vec<String>),
    Object(Vec<(String, Option<String>)>),
    Entries(Vec<Entry>),
}

/// Builder for a [`CsvReader`] over an in-memory byte slice.
pub struct CsvReaderBuilder {
    row_delimiter: Needle,
    column_delimiter: Needle,
    header: bool,
    normalize_keys: Option<bool>,
    transformers: Transformers,
    mode: CsvMode,
    drop: usize,
    take: Option<usize>,
    skip_empty: bool,
}

impl Default for CsvReaderBuilder {
    fn default() -> Self {
        Self {
            row_delimiter: Needle::from_byte(b'\n'),
            column_delimiter: Needle::from_byte(b','),
            header: true,
            normalize_keys: None,
            transformers: Transformers::None,
            mode: CsvMode::Array,
            drop: 0,
            take: None,
            skip_empty: false,
        }
    }
}

impl CsvReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_delimiter(&mut self, needle: Needle) -> &mut Self {
        self.row_delimiter = needle;
        self
    }

    pub fn column_delimiter(&mut self, needle: Needle) -> &mut Self {
        self.column_delimiter = needle;
        self
    }

    /// If true (the default), the first emitted row becomes the header list instead of a data
    /// row.
    pub fn header(&mut self, header: bool) -> &mut Self {
        self.header = header;
        self
    }

    /// Overrides the mode-dependent default (on for `Object`/`Entries`, off for `Array`) for
    /// whether header strings are run through [`normalize_column_names`].
    pub fn normalize_keys(&mut self, normalize_keys: bool) -> &mut Self {
        self.normalize_keys = Some(normalize_keys);
        self
    }

    pub fn mode(&mut self, mode: CsvMode) -> &mut Self {
        self.mode = mode;
        self
    }

    /// Binds transformers positionally, aligned with column index regardless of header names.
    pub fn transformers_by_position(&mut self, transformers: Vec<Option<Transformer>>) -> &mut Self {
        self.transformers = Transformers::Positional(transformers);
        self
    }

    /// Binds transformers by (post-normalization) header name.
    pub fn transformers_by_name(&mut self, transformers: HashMap<String, Transformer>) -> &mut Self {
        self.transformers = Transformers::ByName(transformers);
        self
    }

    /// Number of leading data rows to discard, counted *after* the header row.
    pub fn drop(&mut self, drop: usize) -> &mut Self {
        self.drop = drop;
        self
    }

    /// Maximum number of data rows to emit, counted after `drop`.
    pub fn take(&mut self, take: Option<usize>) -> &mut Self {
        self.take = take;
        self
    }

    pub fn skip_empty(&mut self, skip_empty: bool) -> &mut Self {
        self.skip_empty = skip_empty;
        self
    }

    pub fn build<'a>(&mut self, source: &'a [u8]) -> Result<CsvReader<'a>> {
        let row_delimiter = self.row_delimiter.clone();
        let column_delimiter = self.column_delimiter.clone();
        let mut rows = Spliterator::builder()
            .skip_empty(self.skip_empty)
            .build(source, row_delimiter);

        let header = if self.header {
            match rows.next() {
                Some(span) => {
                    let mut columns = split_columns(span.as_bytes(), &column_delimiter)?;
                    let normalize = self
                        .normalize_keys
                        .unwrap_or(matches!(self.mode, CsvMode::Object | CsvMode::Entries));
                    if normalize {
                        columns = normalize_column_names(&columns);
                    }
                    Some(columns)
                }
                None => None,
            }
        } else {
            None
        };

        Ok(CsvReader {
            rows,
            column_delimiter,
            header,
            mode: self.mode,
            transformers: std::mem::replace(&mut self.transformers, Transformers::None),
            drop: self.drop,
            take: self.take,
            yielded: 0,
            finished: false,
        })
    }
}

/// Splits a single already-bounded row into quote-aware columns, decoding each as UTF-8.
fn split_columns(row: &[u8], column_delimiter: &Needle) -> Result<Vec<String>> {
    let mut splitter = Spliterator::builder()
        .quote_aware(Some(b'"'))
        .build(row, column_delimiter.clone());
    let mut out = Vec::new();
    while let Some(span) = splitter.next() {
        let text = std::str::from_utf8(span.as_bytes()).map_err(|_| Error::decode(out.len() as u64))?;
        out.push(text.to_string());
    }
    Ok(out)
}

/// Streams projected rows out of an in-memory CSV (or CSV-like, delimiter-configurable) byte
/// slice: a row-level [`Spliterator`] composed with a quote-aware per-row column scan, optional
/// header extraction and canonicalization, transformer application, and shaping per [`CsvMode`].
pub struct CsvReader<'a> {
    rows: Spliterator<'a>,
    column_delimiter: Needle,
    header: Option<Vec<String>>,
    mode: CsvMode,
    transformers: Transformers,
    drop: usize,
    take: Option<usize>,
    yielded: u64,
    finished: bool,
}

impl<'a> CsvReader<'a> {
    pub fn builder() -> CsvReaderBuilder {
        CsvReaderBuilder::new()
    }

    /// The canonicalized header list, if `header` was enabled and the source was non-empty.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    fn project(&self, columns: Vec<String>) -> CsvRow {
        let header = self.header.as_ref();
        let transformed: Vec<String> = columns
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let key = header.and_then(|h| h.get(i));
                self.transformers.apply(i, key, &value)
            })
            .collect();

        match self.mode {
            CsvMode::Array => CsvRow::Array(transformed),
            CsvMode::Object => CsvRow::Object(match header {
                // `zip_padded` pads whichever side is shorter with `None`: a header entry paired
                // with a missing trailing column becomes `(key, None)`, while a column past the
                // end of the header is paired with `(None, value)` and dropped by the `filter_map`
                // below, so no key outside the header set is ever emitted.
                Some(h) => zip_padded(h.iter(), transformed.iter())
                    .filter_map(|(k, v)| k.map(|k| (k.clone(), v.cloned())))
                    .collect(),
                None => transformed
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), Some(v)))
                    .collect(),
            }),
            CsvMode::Entries => CsvRow::Entries(match header {
                Some(h) => zip_padded(h.iter(), transformed.iter())
                    .enumerate()
                    .filter_map(|(i, (k, v))| {
                        k.map(|k| Entry {
                            key: k.clone(),
                            value: v.cloned(),
                            index: i,
                        })
                    })
                    .collect(),
                None => transformed
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| Entry {
                        key: i.to_string(),
                        value: Some(v),
                        index: i,
                    })
                    .collect(),
            }),
        }
    }
}

impl<'a> Iterator for CsvReader<'a> {
    type Item = Result<CsvRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }
            if let Some(take) = self.take {
                if self.yielded >= self.drop as u64 + take as u64 {
                    self.finished = true;
                    return None;
                }
            }
            let span = match self.rows.next() {
                Some(span) => span,
                None => {
                    self.finished = true;
                    return None;
                }
            };
            self.yielded += 1;
            if self.yielded <= self.drop as u64 {
                continue;
            }
            let columns = match split_columns(span.as_bytes(), &self.column_delimiter) {
                Ok(columns) => columns,
                Err(err) => return Some(Err(err)),
            };
            return Some(Ok(self.project(columns)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_mode_without_header() {
        let mut rows = CsvReaderBuilder::new()
            .header(false)
            .build(b"a,b,c")
            .unwrap();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row, CsvRow::Array(vec!["a".into(), "b".into(), "c".into()]));
        assert!(rows.next().is_none());
    }

    #[test]
    fn object_mode_with_normalized_header() {
        let mut rows = CsvReaderBuilder::new()
            .mode(CsvMode::Object)
            .build(b"name,age\nAlice,30\nBob,40\n")
            .unwrap();

        let first = rows.next().unwrap().unwrap();
        assert_eq!(
            first,
            CsvRow::Object(vec![
                ("name".to_string(), Some("Alice".to_string())),
                ("age".to_string(), Some("30".to_string())),
            ])
        );
        let second = rows.next().unwrap().unwrap();
        assert_eq!(
            second,
            CsvRow::Object(vec![
                ("name".to_string(), Some("Bob".to_string())),
                ("age".to_string(), Some("40".to_string())),
            ])
        );
        assert!(rows.next().is_none());
    }

    #[test]
    fn duplicate_headers_are_disambiguated_on_read() {
        let mut rows = CsvReaderBuilder::new()
            .normalize_keys(true)
            .build(b"Full Name,Full Name,Age\n1,2,3\n")
            .unwrap();
        assert_eq!(rows.header(), Some(&["full_name".to_string(), "full_name_2".to_string(), "age".to_string()][..]));
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row, CsvRow::Array(vec!["1".into(), "2".into(), "3".into()]));
    }

    #[test]
    fn quote_aware_column_scan() {
        let mut rows = CsvReaderBuilder::new()
            .header(false)
            .build(b"\"a,b\",c\n")
            .unwrap();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row, CsvRow::Array(vec!["\"a,b\"".into(), "c".into()]));
    }

    #[test]
    fn object_mode_never_emits_a_key_outside_the_header_and_pads_short_rows() {
        let mut rows = CsvReaderBuilder::new()
            .mode(CsvMode::Object)
            .build(b"a,b,c\n1,2\n")
            .unwrap();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(
            row,
            CsvRow::Object(vec![
                ("a".to_string(), Some("1".to_string())),
                ("b".to_string(), Some("2".to_string())),
                ("c".to_string(), None),
            ])
        );
    }

    #[test]
    fn object_mode_drops_columns_past_the_end_of_the_header() {
        let mut rows = CsvReaderBuilder::new()
            .mode(CsvMode::Object)
            .build(b"a,b\n1,2,3,4\n")
            .unwrap();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(
            row,
            CsvRow::Object(vec![
                ("a".to_string(), Some("1".to_string())),
                ("b".to_string(), Some("2".to_string())),
            ])
        );
    }

    #[test]
    fn entries_mode_pads_short_rows_and_drops_extra_columns() {
        let mut rows = CsvReaderBuilder::new()
            .mode(CsvMode::Entries)
            .build(b"a,b,c\n1,2\n")
            .unwrap();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(
            row,
            CsvRow::Entries(vec![
                Entry { key: "a".to_string(), value: Some("1".to_string()), index: 0 },
                Entry { key: "b".to_string(), value: Some("2".to_string()), index: 1 },
                Entry { key: "c".to_string(), value: None, index: 2 },
            ])
        );
    }

    #[test]
    fn transformers_apply_by_header_name() {
        let mut transformers: HashMap<String, Transformer> = HashMap::new();
        transformers.insert("age".to_string(), Box::new(|v: &str| v.trim().to_string()));
        let mut rows = CsvReaderBuilder::new()
            .mode(CsvMode::Object)
            .transformers_by_name(transformers)
            .build(b"name,age\nAlice, 30 \n")
            .unwrap();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(
            row,
            CsvRow::Object(vec![
                ("name".to_string(), Some("Alice".to_string())),
                ("age".to_string(), Some("30".to_string())),
            ])
        );
    }

    #[test]
    fn drop_and_take_are_counted_after_the_header_row() {
        let mut rows = CsvReaderBuilder::new()
            .header(true)
            .drop(1)
            .take(Some(1))
            .build(b"h\na\nb\nc\n")
            .unwrap();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row, CsvRow::Array(vec!["b".into()]));
        assert!(rows.next().is_none());
    }
}
