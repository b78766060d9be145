#![no_main]

use libfuzzer_sys::fuzz_target;

use etca_core::prelude::*;

#[derive(arbitrary::Arbitrary, Debug)]
struct FuzzInput {
    bytes: Vec<u8>,
    start_address: u16,
}

fuzz_target!(|input: FuzzInput| {
    let mut ctx = ParseContext::from_bytes(&input.bytes);
    if let Ok(blocks) = nonlinear_disassemble(&mut ctx, input.start_address as u64) {
        for block in &blocks {
            let _ = block.instructions.len();
            let _ = &block.successors;
        }
    }
});
