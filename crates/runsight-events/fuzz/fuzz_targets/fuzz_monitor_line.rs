#![no_main]

use libfuzzer_sys::fuzz_target;
use runsight_events::{DEFAULT_MARKER, parse_monitor_line};

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        let _ = std::hint::black_box(parse_monitor_line(line, DEFAULT_MARKER));
    }
});
