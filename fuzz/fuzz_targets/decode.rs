#![no_main]

use libfuzzer_sys::fuzz_target;

use etca_core::prelude::*;

fuzz_target!(|data: &[u8]| {
    let mut ctx = ParseContext::from_bytes(data);
    let _ = decode(&mut ctx);
});
