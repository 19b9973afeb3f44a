#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;

use spliterator::{plan_chunks, Needle};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let desired = (data[0] as usize % 16) + 1;
    let mut cursor = Cursor::new(&data[1..]);
    let needle = Needle::from_byte(b'\n');
    let Ok(ranges) = plan_chunks(&mut cursor, &needle, desired) else {
        return;
    };

    let total_len = data.len() - 1;
    assert_eq!(ranges.first().unwrap().start, 0);
    assert_eq!(ranges.last().unwrap().end, total_len);
    for range in &ranges {
        assert!(range.start <= range.end);
        assert!(range.end <= total_len);
    }
    // Gaps between consecutive ranges hold exactly one delimiter occurrence, never a fragment of
    // a record.
    for pair in ranges.windows(2) {
        assert!(pair[1].start > pair[0].end);
    }
});
