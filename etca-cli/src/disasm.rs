//! Runs the core decoder over a configured byte buffer and renders its
//! output in a cstool-style layout: a byte offset, the instruction's raw
//! bytes, and its rendered text.

use etca_core::prelude::*;

use crate::config::DisasmConfig;
use crate::error::Result;

/// One line of disassembly output, ready to print.
pub struct RenderedInstruction {
    pub offset: usize,
    pub bytes: Vec<u8>,
    pub text: String,
    pub requirement: ExtensionRequirement,
}

fn render_one(data: &[u8], instr: &Instruction, rc: &RenderContext) -> RenderedInstruction {
    let start_bit = instr.start_bit().expect("decoded instruction has bits");
    let end_bit = instr.end_bit().expect("decoded instruction has bits");
    assert_eq!(start_bit % 8, 0, "instruction does not start on a byte boundary");
    assert_eq!(end_bit % 8, 0, "instruction does not end on a byte boundary");
    let start_byte = start_bit / 8;
    let end_byte = end_bit / 8;

    RenderedInstruction {
        offset: start_byte,
        bytes: data[start_byte..end_byte].to_vec(),
        text: instr.render(rc),
        requirement: instr.total_requirement(),
    }
}

fn bytes_as_pairs(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs a plain linear scan from `config.start_address` and renders every
/// decoded instruction.
pub fn run_linear(config: &DisasmConfig) -> Result<Vec<RenderedInstruction>> {
    let mut ctx = ParseContext::from_bytes(&config.bytes);
    let instructions = linear_disassemble(&mut ctx, config.start_address as usize * 8)?;
    let rc = RenderContext::new();
    Ok(instructions
        .iter()
        .map(|instr| render_one(&config.bytes, instr, &rc))
        .collect())
}

/// A reconstructed basic block, rendered for display.
pub struct RenderedBlock {
    pub start_address: u64,
    pub instructions: Vec<RenderedInstruction>,
    pub successors: Vec<u64>,
}

/// Follows control flow from `config.start_address` and renders each
/// resulting basic block.
pub fn run_blocks(config: &DisasmConfig) -> Result<Vec<RenderedBlock>> {
    let mut ctx = ParseContext::from_bytes(&config.bytes);
    let blocks = nonlinear_disassemble(&mut ctx, config.start_address)?;
    let rc = RenderContext::new();
    Ok(blocks
        .into_iter()
        .map(|block| RenderedBlock {
            start_address: block.start_address,
            instructions: block
                .instructions
                .iter()
                .map(|instr| render_one(&config.bytes, instr, &rc))
                .collect(),
            successors: block.successors,
        })
        .collect())
}

/// Prints a rendered instruction in the `{offset:04X}: {bytes}   {asm}`
/// layout, optionally appending its required extensions.
pub fn print_instruction(rendered: &RenderedInstruction, detailed: bool) {
    let bytes_str = bytes_as_pairs(&rendered.bytes);
    print!("{:04X}: {bytes_str:>9}   {}", rendered.offset, rendered.text);
    if detailed && !rendered.requirement.is_empty() {
        let exts: Vec<String> = rendered
            .requirement
            .hard()
            .iter()
            .map(|e| e.to_string())
            .collect();
        print!("  ; requires {}", exts.join(", "));
    }
    println!();
}

pub fn print_block(block: &RenderedBlock, detailed: bool) {
    println!("blk {:#06x}:", block.start_address);
    for rendered in &block.instructions {
        print!("  ");
        print_instruction(rendered, detailed);
    }
    if !block.successors.is_empty() {
        let targets: Vec<String> = block.successors.iter().map(|s| format!("{s:#06x}")).collect();
        println!("  -> {}", targets.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(bytes: Vec<u8>) -> DisasmConfig {
        DisasmConfig {
            bytes,
            start_address: 0,
            blocks: false,
            detailed: false,
        }
    }

    #[test]
    fn run_linear_renders_two_instructions() {
        // addx %rx0, %rx1 ; hlt
        let config = config_for(vec![0b00_01_0000, 0b000_001_00, 0b1000_1110, 0b0000_0000]);
        let rendered = run_linear(&config).unwrap();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].offset, 0);
        assert_eq!(rendered[0].bytes, vec![0b00_01_0000, 0b000_001_00]);
        assert_eq!(rendered[0].text, "addx %rx0, %rx1");
        assert_eq!(rendered[1].text, "hlt");
    }

    #[test]
    fn run_blocks_reconstructs_a_single_terminating_block() {
        let config = config_for(vec![0b00_01_0000, 0b000_001_00, 0b1000_1110, 0b0000_0000]);
        let blocks = run_blocks(&config).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_address, 0);
        assert_eq!(blocks[0].instructions.len(), 2);
        assert!(blocks[0].successors.is_empty());
    }
}
