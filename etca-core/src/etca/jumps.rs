//! The conditional-jump family (`hlt`/`nop`/`j<cond>`, always present in the
//! base ISA), the `cp` conditional-prefix extension that wraps an arbitrary
//! inner instruction behind a condition, and the `saf` extension's relative
//! `call`.
//!
//! Grounded on `base_isa.py`'s `ConditionalJump`/`Hlt` pattern and
//! `conditional_prefix.py`; the displacement width (8 raw bits, concatenated
//! with the leading `D` bit into a 9-bit signed value) follows
//! `base_isa.py`'s literal `{d:8}` field rather than the ambiguous
//! `ddddddddd` run written out in prose. `call_rel` below follows
//! `stack_and_functions.py`'s `call_rel`, an always-taken relative call
//! distinct from that module's register-indirect `call`/`jmp` forms.

use std::collections::HashMap;

use crate::context::Binding;
use crate::decoded::{Condition, DecodedPart, Instruction, InstructionKind, JumpTarget};
use crate::error::{DecodeError, DecodeResult};
use crate::etca::conditions::bound_condition;
use crate::etca::extensions::{CONDITIONAL_PREFIX, STACK_AND_FUNCTIONS};
use crate::registry::{PatternRegistry, Rule};
use crate::requirement::ExtensionRequirement;

fn conditional_jump_produce(
    bindings: &HashMap<String, Binding>,
    other: &[usize],
) -> DecodeResult<Vec<DecodedPart>> {
    let d_hi = bindings["D"].as_raw().unwrap();
    let d_lo = bindings["d"].as_raw().unwrap();
    let (condition, cond_bits) = bound_condition(bindings, "c");
    let displacement = d_hi.concat(d_lo);
    let disp_value = displacement.signed(9);

    let mut general_bits = other.to_vec();
    general_bits.extend(cond_bits);

    let mnemonic;
    let kind;
    let mut jump_target = None;
    match condition {
        Condition::Always if disp_value == 0 => {
            general_bits.extend(displacement.bit_section().iter().copied());
            mnemonic = "hlt".to_string();
            kind = InstructionKind::Halt;
        }
        Condition::Never if disp_value == 0 => {
            general_bits.extend(displacement.bit_section().iter().copied());
            mnemonic = "nop".to_string();
            kind = InstructionKind::ConditionalJump;
        }
        _ => {
            jump_target = Some(JumpTarget {
                relative: true,
                value: displacement.clone(),
                bit_section: displacement.bit_section().to_vec(),
                required_extensions: ExtensionRequirement::none(),
            });
            mnemonic = match condition {
                Condition::Never => "nop".to_string(),
                other_cond => format!("j{}", other_cond.mnemonic_suffix()),
            };
            kind = InstructionKind::ConditionalJump;
        }
    }

    let mut args = HashMap::new();
    let format = if let Some(jt) = &jump_target {
        args.insert("target".to_string(), DecodedPart::JumpTarget(jt.clone()));
        format!("{mnemonic} {{target}}")
    } else {
        mnemonic.clone()
    };

    Ok(vec![DecodedPart::Instruction(Instruction {
        mnemonic,
        format,
        args,
        general_bit_section: general_bits,
        general_requirement: ExtensionRequirement::none(),
        kind,
        condition: Some(condition),
        jump_target,
        inner: None,
        size_letter: None,
    })])
}

fn conditional_prefix_produce(
    bindings: &HashMap<String, Binding>,
    other: &[usize],
) -> DecodeResult<Vec<DecodedPart>> {
    let (condition, cond_bits) = bound_condition(bindings, "c");
    if matches!(condition, Condition::Always | Condition::Never) {
        return Err(DecodeError::UnknownInstruction {
            cursor: 0,
            reason: "conditional prefix cannot name always/never".to_string(),
        });
    }

    let inner = match bindings["inner"].as_decoded() {
        Some(DecodedPart::Instruction(instr)) => instr.clone(),
        other => panic!("expected an Instruction binding for 'inner', got {other:?}"),
    };
    if inner.condition.is_some() {
        let start = inner.start_bit().unwrap_or(0);
        let end = inner.end_bit().unwrap_or(start);
        return Err(DecodeError::IllegalInstruction {
            start,
            end,
            reason: "conditional prefix cannot wrap an already-conditional instruction".to_string(),
        });
    }

    let mnemonic = format!("if{}", condition.mnemonic_suffix());
    let format = format!("{mnemonic} {{inner}}");
    let mut general_bits = other.to_vec();
    general_bits.extend(cond_bits);

    Ok(vec![DecodedPart::Instruction(Instruction {
        mnemonic,
        format,
        args: HashMap::new(),
        general_bit_section: general_bits,
        general_requirement: ExtensionRequirement::single(&CONDITIONAL_PREFIX),
        kind: InstructionKind::Plain,
        condition: None,
        jump_target: None,
        inner: Some(Box::new(inner)),
        size_letter: None,
    })])
}

fn call_rel_produce(
    bindings: &HashMap<String, Binding>,
    other: &[usize],
) -> DecodeResult<Vec<DecodedPart>> {
    let dest = bindings["dest"].as_raw().unwrap();
    let jump_target = JumpTarget {
        relative: true,
        value: dest.clone(),
        bit_section: dest.bit_section().to_vec(),
        required_extensions: ExtensionRequirement::none(),
    };

    let mut args = HashMap::new();
    args.insert("target".to_string(), DecodedPart::JumpTarget(jump_target.clone()));

    Ok(vec![DecodedPart::Instruction(Instruction {
        mnemonic: "call".to_string(),
        format: "call {target}".to_string(),
        args,
        general_bit_section: other.to_vec(),
        general_requirement: ExtensionRequirement::single(&STACK_AND_FUNCTIONS),
        kind: InstructionKind::Call,
        condition: None,
        jump_target: Some(jump_target),
        inner: None,
        size_letter: None,
    })])
}

pub fn register(registry: &mut PatternRegistry) {
    registry.register(Rule::new(
        "inst",
        "10 0 D {c:cond} {d:8}",
        conditional_jump_produce,
    ));
    registry.register(Rule::new(
        "inst",
        "1010 {c:cond} {inner:inst}",
        conditional_prefix_produce,
    ));
    registry.register(Rule::new("inst", "10 1 1 {dest:12}", call_rel_produce));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParseContext;
    use crate::decoded::RenderContext;
    use crate::etca::{base, conditions, operands};
    use crate::pattern::CategoryResolver;
    use crate::registry::PatternRegistry as Registry;

    fn full_registry() -> Registry {
        let mut registry = Registry::new();
        conditions::register(&mut registry);
        operands::register(&mut registry);
        base::register(&mut registry);
        register(&mut registry);
        registry
    }

    fn decode_one(bytes: &[u8]) -> Instruction {
        let registry = full_registry();
        let mut ctx = ParseContext::from_bytes(bytes);
        let mut results = Vec::new();
        registry
            .resolve("inst", &mut ctx, &mut |_ctx, part| {
                results.push(part);
                Ok(())
            })
            .unwrap();
        assert_eq!(results.len(), 1, "expected exactly one match for {bytes:?}");
        match results.remove(0) {
            DecodedPart::Instruction(i) => i,
            other => panic!("expected Instruction, got {other:?}"),
        }
    }

    #[test]
    fn always_with_zero_displacement_is_halt() {
        // "10" "0" D=0 CCCC=1110(always) | dddddddd=00000000
        let instr = decode_one(&[0b1000_1110, 0b0000_0000]);
        assert_eq!(instr.mnemonic, "hlt");
        assert_eq!(instr.kind, InstructionKind::Halt);
        assert_eq!(instr.render(&RenderContext::new()), "hlt");
    }

    #[test]
    fn always_with_nonzero_displacement_is_jmp() {
        // "10" "0" D=0 CCCC=1110(always) | dddddddd=00000100 (disp=4)
        let instr = decode_one(&[0b1000_1110, 0b0000_0100]);
        assert_eq!(instr.mnemonic, "jmp");
        assert_eq!(instr.kind, InstructionKind::ConditionalJump);
        assert_eq!(instr.condition, Some(Condition::Always));
        let target = instr.jump_target.as_ref().unwrap();
        assert_eq!(target.resolve(0x100), 0x104);
    }

    #[test]
    fn never_with_zero_displacement_is_bare_nop() {
        // "10" "0" D=0 CCCC=1111(never) | dddddddd=00000000
        let instr = decode_one(&[0b1000_1111, 0b0000_0000]);
        assert_eq!(instr.render(&RenderContext::new()), "nop");
        assert!(instr.jump_target.is_none());
    }

    #[test]
    fn jz_carries_a_jump_target() {
        // "10" "0" D=0 CCCC=0000(z) | dddddddd=00000010 (disp=2)
        let instr = decode_one(&[0b1000_0000, 0b0000_0010]);
        assert_eq!(instr.mnemonic, "jz");
        let target = instr.jump_target.as_ref().unwrap();
        assert_eq!(target.resolve(0x10), 0x12);
    }

    #[test]
    fn conditional_prefix_wraps_a_plain_instruction() {
        // ifz addx %rx0, %rx0:
        // 1010 cccc=0000(z) then inner "00 SS CCCC a b 00"
        let mut bits = vec![0b1010_0000u8];
        // inner: 00 01(SS=x) 0000(add) 000(a=0) 000(b=0) 00
        bits.push(0b00_01_0000);
        bits.push(0b000_000_00);
        let instr = decode_one(&bits);
        assert_eq!(instr.mnemonic, "ifz");
        assert_eq!(instr.render(&RenderContext::new()), "ifz addx %rx0, %rx0");
    }

    #[test]
    fn call_rel_carries_a_signed_relative_target_and_requires_saf() {
        // "10" "1" "1" dest=000000000001 (=1)
        let instr = decode_one(&[0b1011_0000, 0b0000_0001]);
        assert_eq!(instr.mnemonic, "call");
        assert_eq!(instr.kind, InstructionKind::Call);
        assert_eq!(instr.condition, None);
        let target = instr.jump_target.as_ref().unwrap();
        assert!(target.relative);
        assert_eq!(target.resolve(0x100), 0x101);
        assert_eq!(
            instr.total_requirement(),
            ExtensionRequirement::single(&STACK_AND_FUNCTIONS)
        );
    }

    #[test]
    fn conditional_prefix_rejects_always_and_never() {
        let mut registry = Registry::new();
        conditions::register(&mut registry);
        register(&mut registry);
        // 1010 cccc=1110(always), inner bits irrelevant since rejected before parsing
        let mut ctx = ParseContext::from_bytes(&[0b1010_1110, 0, 0]);
        let mut results = Vec::new();
        let matched = registry
            .resolve("inst", &mut ctx, &mut |_ctx, part| {
                results.push(part);
                Ok(())
            })
            .unwrap();
        assert!(!matched);
    }
}
