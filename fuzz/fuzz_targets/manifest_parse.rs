//! Fuzz target for COCO manifest parsing.
//!
//! Run with:
//!   cargo +nightly fuzz run manifest_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use yoloprep::ir::io_coco_json::from_manifest_slice;

fuzz_target!(|data: &[u8]| {
    // 10MB cap keeps libFuzzer away from OOM on huge inputs.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_manifest_slice(data);
});
