use std::collections::HashMap;

use unicode_segmentation::UnicodeSegmentation;

/// Canonicalizes a list of CSV header strings to snake_case-ish identifiers, disambiguating
/// duplicates. Idempotent: normalizing an already-normalized list returns it unchanged.
///
/// Each header is canonicalized independently (see [`canonicalize_one`]), then duplicates are
/// suffixed `_2`, `_3`, ... keyed by the already-canonicalized name, counting from the second
/// occurrence.
pub fn normalize_column_names(headers: &[String]) -> Vec<String> {
    let canonical: Vec<String> = headers.iter().map(|h| canonicalize_one(h)).collect();
    let mut seen: HashMap<String, usize> = HashMap::new();
    canonical
        .into_iter()
        .map(|name| {
            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                name
            } else {
                format!("{}_{}", name, count)
            }
        })
        .collect()
}

/// Canonicalizes a single header. Headers that are uniformly uppercase (after collapsing
/// abbreviation periods, e.g. `U.S.A.` -> `USA`) have their non-word runs collapsed to a single
/// `_` and otherwise keep their case; everything else is converted to snake_case.
fn canonicalize_one(header: &str) -> String {
    let collapsed = collapse_abbreviation_periods(header);
    if is_uniformly_uppercase(&collapsed) {
        collapse_non_word_runs(&collapsed)
    } else {
        to_snake_case(header)
    }
}

/// Drops a `.` that immediately follows an uppercase letter, so `U.S.A.` becomes `USA` before the
/// uppercase/snake_case branch is decided.
fn collapse_abbreviation_periods(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_upper = false;
    for c in s.chars() {
        if c == '.' && prev_upper {
            continue;
        }
        out.push(c);
        prev_upper = c.is_uppercase();
    }
    out
}

fn is_uniformly_uppercase(s: &str) -> bool {
    let mut has_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            has_alpha = true;
            if c.is_lowercase() {
                return false;
            }
        }
    }
    has_alpha
}

fn collapse_non_word_runs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if c.is_alphanumeric() || c == '_' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// Converts an arbitrary header (`"Full Name"`, `"fullName"`, `"full-name"`, ...) to snake_case.
///
/// Splits on Unicode word boundaries first, then further splits each chunk at lower-to-upper and
/// acronym-to-word transitions (`"FullName"` -> `["Full", "Name"]`, `"HTTPServer"` ->
/// `["HTTP", "Server"]`), and lowercases and joins the result with `_`.
fn to_snake_case(s: &str) -> String {
    let mut words = Vec::new();
    for chunk in s.unicode_words() {
        split_camel_case(chunk, &mut words);
    }
    words.join("_").to_lowercase()
}

fn split_camel_case(chunk: &str, out: &mut Vec<String>) {
    let chars: Vec<char> = chunk.chars().collect();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let lower_to_upper = prev.is_lowercase() && c.is_uppercase();
            let acronym_to_word =
                prev.is_uppercase() && c.is_uppercase() && next.map_or(false, |n| n.is_lowercase());
            if (lower_to_upper || acronym_to_word) && !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        out.push(current);
    }
}

/// Pairwise-iterates two sources, padding whichever is shorter with `None` so the iterator runs
/// as long as either side still has items.
pub fn zip_padded<A, B>(a: A, b: B) -> ZipPadded<A, B>
where
    A: Iterator,
    B: Iterator,
{
    ZipPadded { a, b }
}

pub struct ZipPadded<A, B> {
    a: A,
    b: B,
}

impl<A, B> Iterator for ZipPadded<A, B>
where
    A: Iterator,
    B: Iterator,
{
    type Item = (Option<A::Item>, Option<B::Item>);

    fn next(&mut self) -> Option<Self::Item> {
        match (self.a.next(), self.b.next()) {
            (None, None) => None,
            pair => Some(pair),
        }
    }
}
