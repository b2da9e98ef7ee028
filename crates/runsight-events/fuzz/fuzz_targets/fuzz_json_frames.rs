#![no_main]

use libfuzzer_sys::fuzz_target;
use runsight_events::framing::{JsonFrameDecoder, decode_events};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes, chunked arbitrarily, must never panic the decoder.
    let mut decoder = JsonFrameDecoder::new();
    let mut frames = Vec::new();
    for chunk in data.chunks(7) {
        frames.extend(decoder.push(chunk));
    }
    let _ = std::hint::black_box(decode_events(&frames));
});
