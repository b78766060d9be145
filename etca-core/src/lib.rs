//! etca-core – the ETCa bit-pattern decoder engine.
//!
//! The engine is deliberately ISA-agnostic: [`bitvector`], [`context`],
//! [`pattern`], [`registry`], [`decoded`], [`requirement`], [`driver`], and
//! [`disassembler`] together implement a CPS-style backtracking grammar over
//! bit strings, with no built-in notion of what a "register" or "opcode" is.
//! [`etca`] is the one module that turns that engine into something that can
//! actually decode ETCa, by registering the concrete catalog of rules the
//! engine dispatches to.
//!
//! # Example
//!
//! ```
//! use etca_core::prelude::*;
//!
//! let mut ctx = ParseContext::from_bytes(&[0b0001_0000, 0b0000_0100]);
//! let instructions = linear_disassemble(&mut ctx, 0).unwrap();
//! assert_eq!(instructions[0].render(&RenderContext::new()), "addx %rx0, %rx1");
//! ```

pub mod bitvector;
pub mod context;
pub mod decoded;
pub mod disassembler;
pub mod driver;
pub mod error;
pub mod etca;
pub mod pattern;
pub mod registry;
pub mod requirement;

/// Re-exports frequently used types for convenient importing.
pub mod prelude {
    pub use crate::bitvector::BitVector;
    pub use crate::context::ParseContext;
    pub use crate::decoded::{
        Atom, Condition, DecodedPart, Instruction, InstructionKind, JumpTarget, Register,
        RenderContext,
    };
    pub use crate::disassembler::{nonlinear_disassemble, BasicBlock};
    pub use crate::driver::{decode, linear_disassemble};
    pub use crate::error::{DecodeError, DecodeResult};
    pub use crate::etca::extensions::all as all_extensions;
    pub use crate::requirement::{Extension, ExtensionRequirement};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn linear_disassemble_decodes_a_short_program() {
        // addx %rx0, %rx1 ; hlt
        let mut ctx = ParseContext::from_bytes(&[
            0b00_01_0000,
            0b000_001_00,
            0b1000_1110,
            0b0000_0000,
        ]);
        let instrs = linear_disassemble(&mut ctx, 0).unwrap();
        assert_eq!(instrs.len(), 2);
        assert_eq!(instrs[0].render(&RenderContext::new()), "addx %rx0, %rx1");
        assert_eq!(instrs[1].mnemonic, "hlt");
    }

    #[test]
    fn decoding_a_truncated_buffer_fails_with_not_enough_bits() {
        let mut ctx = ParseContext::from_bytes(&[0b0000_0000]);
        let err = decode(&mut ctx).unwrap_err();
        assert!(matches!(err, DecodeError::NotEnoughBits { .. }));
    }

    /// Dropping a registered extension module can only remove decodings of
    /// a given bit sequence, never add any. Exercised directly by building
    /// two registries from the catalog's own
    /// per-module `register()` functions rather than the process-wide
    /// `REGISTRY`, since that singleton always carries the full catalog.
    #[test]
    fn removing_a_catalog_module_only_shrinks_decodings() {
        use crate::pattern::CategoryResolver;
        use crate::registry::PatternRegistry;

        // "111 0 C5=00000 0 SS=01(x) C4=0000(adc) a=000 b=001 00" — only
        // matches a rule registered by `etca::expanded`.
        let bytes = [0b1110_0000u8, 0b0001_0000, 0b0000_0100];

        let mut full = PatternRegistry::new();
        crate::etca::register_all(&mut full);

        let mut without_expanded = PatternRegistry::new();
        crate::etca::conditions::register(&mut without_expanded);
        crate::etca::operands::register(&mut without_expanded);
        crate::etca::base::register(&mut without_expanded);
        crate::etca::jumps::register(&mut without_expanded);

        let count = |registry: &PatternRegistry| {
            let mut ctx = ParseContext::from_bytes(&bytes);
            let mut results = Vec::new();
            registry
                .resolve("inst", &mut ctx, &mut |_ctx, part| {
                    results.push(part);
                    Ok(())
                })
                .unwrap();
            results.len()
        };

        let full_count = count(&full);
        let partial_count = count(&without_expanded);
        assert_eq!(partial_count, 0);
        assert!(full_count >= partial_count);
    }
}
