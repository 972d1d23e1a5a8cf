#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use tripvault_restore::{validate, ParsedFiles};

// Input: four newline-separated chunks (meta, trip, entries, entry list).
// The entry list is split on commas.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut parts = text.splitn(4, '\n');
    let meta = parts.next().and_then(|s| serde_json::from_str::<Value>(s).ok());
    let trip = parts.next().and_then(|s| serde_json::from_str::<Value>(s).ok());
    let entries = parts.next().and_then(|s| serde_json::from_str::<Value>(s).ok());
    let listed: Vec<&str> = parts.next().map(|s| s.split(',').collect()).unwrap_or_default();

    let files = ParsedFiles {
        meta,
        trip,
        entries,
    };
    // Any RestoreError is fine; panics and nondeterminism are not.
    let first = validate(&listed, &files);
    let second = validate(&listed, &files);
    assert_eq!(first, second);
});
