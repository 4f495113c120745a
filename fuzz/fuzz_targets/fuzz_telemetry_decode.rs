//! Fuzz target: `telemetry::codec::decode`
//!
//! Drives arbitrary byte sequences through the frame decoder and asserts
//! it never panics and never accepts an over-long frame.
//!
//! cargo fuzz run fuzz_telemetry_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use tanksentry::telemetry::codec::{decode, ASK_MAX_MESSAGE_LEN};

fuzz_target!(|data: &[u8]| {
    if let Ok(_frame) = decode(data) {
        // An accepted frame always came from a bounded, non-empty input.
        assert!(!data.is_empty());
        assert!(data.len() <= ASK_MAX_MESSAGE_LEN);
    }
});
