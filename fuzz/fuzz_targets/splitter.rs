#![no_main]

use libfuzzer_sys::fuzz_target;

use spliterator::{Needle, Spliterator};

fuzz_target!(|data: &[u8]| {
    let skip_empty = data.first().map(|b| b & 1 == 1).unwrap_or(false);
    let mut splitter = Spliterator::builder()
        .skip_empty(skip_empty)
        .build(data, Needle::from_byte(b'\n'));

    // No crash, no infinite loop, no out-of-bounds span: that is the whole property here.
    while let Some(span) = splitter.next() {
        let _ = span.as_bytes();
    }
});
