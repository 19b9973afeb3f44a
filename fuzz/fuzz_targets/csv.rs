#![no_main]

use libfuzzer_sys::fuzz_target;

use spliterator::{CsvMode, CsvReaderBuilder};

fuzz_target!(|data: &[u8]| {
    for mode in [CsvMode::Array, CsvMode::Object, CsvMode::Entries] {
        let mut builder = CsvReaderBuilder::new();
        builder.mode(mode);
        let Ok(rows) = builder.build(data) else {
            continue;
        };
        for row in rows {
            let _ = row;
        }
    }
});
