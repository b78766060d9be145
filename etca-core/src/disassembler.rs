//! Nonlinear (control-flow-following) disassembly: reconstructs basic
//! blocks by repeatedly linearly disassembling from worklist entries and
//! following the jump targets each instruction yields.

use std::collections::{BTreeSet, HashMap};

use crate::context::ParseContext;
use crate::decoded::{Condition, Instruction, InstructionKind};
use crate::driver::decode;
use crate::error::{DecodeError, DecodeResult};

/// A maximal run of instructions with a single entry point, reconstructed
/// by [`nonlinear_disassemble`].
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub start_address: u64,
    pub instructions: Vec<Instruction>,
    /// Byte addresses of blocks control may transfer to from this block's
    /// last instruction.
    pub successors: Vec<u64>,
}

/// Reconstructs the set of basic blocks reachable from `start_address`.
///
/// Maintains a worklist of not-yet-decoded block start addresses (always
/// processing the smallest first) and an ownership map from
/// every claimed byte address to the id (its own start address) of the
/// block that owns it. When a block's straight-line walk reaches an
/// address already reserved by a different, not-yet-started block, that
/// placeholder is absorbed into the growing block rather than kept
/// separate — "splitting is resolved by always growing the lower-address
/// block through the collision."
///
/// If a pending block's start address instead falls strictly inside an
/// already-decoded instruction (not at an instruction boundary), the
/// source leaves this undefined; per the documented resolution this
/// refuses with [`DecodeError::IllegalInstruction`] rather than silently
/// corrupting either block.
pub fn nonlinear_disassemble(
    ctx: &mut ParseContext,
    start_address: u64,
) -> DecodeResult<Vec<BasicBlock>> {
    let mut pending: BTreeSet<u64> = BTreeSet::new();
    let mut owner: HashMap<u64, u64> = HashMap::new();
    let mut done: HashMap<u64, BasicBlock> = HashMap::new();

    pending.insert(start_address);
    owner.insert(start_address, start_address);

    while let Some(&addr) = pending.iter().next() {
        pending.remove(&addr);
        let block_id = addr;
        let mut instructions = Vec::new();
        let mut successors = Vec::new();
        let mut cursor_bit = addr as usize * 8;

        loop {
            if cursor_bit == ctx.len() {
                break;
            }
            ctx.seek(cursor_bit);
            let mut results = decode(ctx)?;
            let instr = results.remove(0);
            let instr_start_bit = instr
                .start_bit()
                .expect("decoded instruction has a nonempty bit section");
            let instr_end_bit = instr
                .end_bit()
                .expect("decoded instruction has a nonempty bit section");
            let instr_addr = (instr_start_bit / 8) as u64;

            if let Some(&mid_collision) = pending
                .iter()
                .find(|&&p| {
                    let pending_bit = p as usize * 8;
                    pending_bit > instr_start_bit && pending_bit < instr_end_bit
                })
            {
                return Err(DecodeError::IllegalInstruction {
                    start: instr_start_bit,
                    end: instr_end_bit,
                    reason: format!(
                        "jump target 0x{mid_collision:x} lands mid-instruction at 0x{instr_addr:x}; block splitting is undefined for this input"
                    ),
                });
            }

            match owner.get(&instr_addr) {
                Some(&owner_id) if owner_id != block_id => {
                    if done.contains_key(&owner_id) {
                        return Err(DecodeError::IllegalInstruction {
                            start: instr_start_bit,
                            end: instr_end_bit,
                            reason: format!(
                                "address 0x{instr_addr:x} is already claimed by completed block 0x{owner_id:x}; block splitting is undefined for this input"
                            ),
                        });
                    }
                    pending.remove(&instr_addr);
                    owner.insert(instr_addr, block_id);
                }
                _ => {
                    owner.insert(instr_addr, block_id);
                }
            }

            for target in jump_targets(&instr, instr_addr) {
                owner.entry(target).or_insert_with(|| {
                    pending.insert(target);
                    target
                });
                successors.push(target);
            }

            let terminates = matches!(instr.kind, InstructionKind::Halt)
                || (instr.kind == InstructionKind::ConditionalJump
                    && instr.condition == Some(Condition::Always));
            cursor_bit = instr_end_bit;
            instructions.push(instr);
            if terminates {
                break;
            }
        }

        done.insert(
            block_id,
            BasicBlock {
                start_address: block_id,
                instructions,
                successors,
            },
        );
    }

    let mut blocks: Vec<BasicBlock> = done.into_values().collect();
    blocks.sort_by_key(|b| b.start_address);
    Ok(blocks)
}

fn jump_targets(instr: &Instruction, instr_addr: u64) -> Vec<u64> {
    match instr.kind {
        InstructionKind::Halt | InstructionKind::Call | InstructionKind::Plain => Vec::new(),
        InstructionKind::ConditionalJump => {
            if instr.condition == Some(Condition::Never) {
                Vec::new()
            } else {
                instr
                    .jump_target
                    .as_ref()
                    .map(|t| vec![t.resolve(instr_addr)])
                    .unwrap_or_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_from_start_zero_yields_empty_block() {
        let mut ctx = ParseContext::from_bytes(&[]);
        let blocks = nonlinear_disassemble(&mut ctx, 0).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_address, 0);
        assert!(blocks[0].instructions.is_empty());
    }

    // Two `addx` instructions at addresses 0 and 2, followed at address 4 by
    // an unconditional `jmp -4` back to address 0. Starting the walk at
    // address 4 finishes that one-instruction block first; the worklist then
    // picks address 0 next and its straight-line walk runs forward straight
    // into address 4, which is by then already in `done`.
    fn backward_branch_converging_on_a_done_block() -> Vec<u8> {
        vec![
            0b00_01_0000,
            0b000_001_00,
            0b00_01_0000,
            0b000_001_00,
            0b1001_1110, // D=1, always, disp hi bit set
            0b1111_1100, // disp lo byte -> 9-bit signed displacement -4
        ]
    }

    #[test]
    fn colliding_with_a_completed_block_is_rejected() {
        let bytes = backward_branch_converging_on_a_done_block();
        let mut ctx = ParseContext::from_bytes(&bytes);
        let err = nonlinear_disassemble(&mut ctx, 4).unwrap_err();
        assert!(matches!(err, DecodeError::IllegalInstruction { .. }));
    }
}
