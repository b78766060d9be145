//! Top-level decoder operations: enumerate every parse of `inst` at the
//! current cursor, and walk a buffer linearly.

use crate::context::ParseContext;
use crate::decoded::{DecodedPart, Instruction};
use crate::error::{DecodeError, DecodeResult};
use crate::registry::REGISTRY;

/// Enumerates every successful parse of category `inst` at the context's
/// current cursor. Signals [`DecodeError::NotEnoughBits`] if the cursor
/// already sits at the end of the buffer (clean end-of-input), and
/// [`DecodeError::UnknownInstruction`] if no registered rule produced
/// anything.
pub fn decode(ctx: &mut ParseContext) -> DecodeResult<Vec<Instruction>> {
    if ctx.cursor() >= ctx.len() {
        return Err(DecodeError::NotEnoughBits {
            needed: 1,
            cursor: ctx.cursor(),
            len: ctx.len(),
        });
    }

    let mut results = Vec::new();
    let matched = REGISTRY.resolve("inst", ctx, &mut |_ctx, part| {
        match part {
            DecodedPart::Instruction(instr) => results.push(instr),
            other => panic!("category 'inst' produced a non-Instruction part: {other:?}"),
        }
        Ok(())
    })?;

    if !matched {
        return Err(DecodeError::UnknownInstruction {
            cursor: ctx.cursor(),
            reason: "no registered rule matched 'inst'".to_string(),
        });
    }

    Ok(results)
}

/// Walks the buffer from `start_bit`, repeatedly taking the first result
/// of `decode` and advancing the cursor past it. Stops cleanly when the
/// cursor lands exactly at the buffer's end; any other failure from
/// `decode` propagates.
pub fn linear_disassemble(ctx: &mut ParseContext, start_bit: usize) -> DecodeResult<Vec<Instruction>> {
    ctx.seek(start_bit);
    let mut instructions = Vec::new();
    loop {
        if ctx.cursor() == ctx.len() {
            break;
        }
        let mut results = decode(ctx)?;
        let first = results.remove(0);
        let end = first
            .end_bit()
            .expect("a matched 'inst' parse has a nonempty bit section");
        instructions.push(first);
        ctx.seek(end);
    }
    Ok(instructions)
}
