#![no_main]

use libfuzzer_sys::fuzz_target;
use tripvault_restore::{read_archive, ReadLimits, RestoreValidator, ValidatorOptions};

fuzz_target!(|data: &[u8]| {
    let limits = ReadLimits {
        max_archive_bytes: 1 << 20,
        max_decode_bytes: 4 << 20,
        max_payload_bytes: 1 << 20,
        max_entries: 256,
        max_path_len: 256,
    };
    if let Ok(contents) = read_archive(data, limits) {
        let _ = contents.validate(&RestoreValidator::new(ValidatorOptions::default()));
    }
});
