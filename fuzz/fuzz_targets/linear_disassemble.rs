#![no_main]

use libfuzzer_sys::fuzz_target;

use etca_core::prelude::*;

fuzz_target!(|data: &[u8]| {
    let mut ctx = ParseContext::from_bytes(data);
    if let Ok(instructions) = linear_disassemble(&mut ctx, 0) {
        for instr in &instructions {
            let _ = instr.render(&RenderContext::new());
        }
    }
});
