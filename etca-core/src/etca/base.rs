//! The base ISA: the sixteen two-operand opcodes shared by the
//! register/register and register/immediate addressing forms, including
//! the stack-and-functions `push`/`pop` and their arbitrary-stack-pointer
//! variants.
//!
//! Grounded on `base_isa.py`'s `BASE_OPCODES` table together with
//! `stack_and_functions.py` and `arbitrary_stack_pointer.py`, which both
//! populate slots 12 and 13 of that same table rather than defining a
//! separate grammar.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::context::Binding;
use crate::decoded::{Atom, DecodedPart, Instruction, InstructionKind};
use crate::error::DecodeResult;
use crate::etca::extensions::{ARBITRARY_STACK_POINTER, STACK_AND_FUNCTIONS};
use crate::etca::operands::bound_register;
use crate::etca::sizes::size_entry;
use crate::registry::{PatternRegistry, Rule};
use crate::requirement::ExtensionRequirement;

/// How a variant's operands render once its mnemonic and size letter are
/// known.
#[derive(Clone, Copy)]
enum Shape {
    /// `mnemonic arg1, arg2`
    TwoArg,
    /// `mnemonic arg1` — the destination register only (`pop`).
    Arg1Only,
    /// `mnemonic arg2` — the source operand only (`push`).
    Arg2Only,
    /// `mnemonic-using arg1, arg2` — the arbitrary-stack-pointer variants,
    /// which additionally name the register used as the stack pointer.
    TwoArgUsing,
}

impl Shape {
    fn format(self, mnemonic: &str) -> String {
        match self {
            Shape::TwoArg => format!("{mnemonic} {{arg1}}, {{arg2}}"),
            Shape::Arg1Only => format!("{mnemonic} {{arg1}}"),
            Shape::Arg2Only => format!("{mnemonic} {{arg2}}"),
            Shape::TwoArgUsing => format!("{mnemonic}-using {{arg1}}, {{arg2}}"),
        }
    }
}

/// One semantic variant occupying a base opcode slot. Most slots hold a
/// single variant valid in both addressing modes; the stack slots hold two
/// mutually exclusive variants distinguished by `extra_check`.
struct Variant {
    name: &'static str,
    reg_reg: bool,
    reg_imm: bool,
    sign_extend: bool,
    /// Gates this variant on the register-index operands: `(arg1 index,
    /// arg2 index or 0 in immediate mode)`. `None` means unconditional.
    extra_check: Option<fn(u8, u8) -> bool>,
    requirement: fn() -> ExtensionRequirement,
    shape: Shape,
}

fn plain(name: &'static str, sign_extend: bool) -> Variant {
    Variant {
        name,
        reg_reg: true,
        reg_imm: true,
        sign_extend,
        extra_check: None,
        requirement: ExtensionRequirement::none,
        shape: Shape::TwoArg,
    }
}

lazy_static! {
    /// Indexed by the 4-bit `CCCC` opcode field. Slots 12 and 13 each hold
    /// two variants — the plain stack-and-functions form (gated to the
    /// canonical stack-pointer register, index 6) and the
    /// arbitrary-stack-pointer form (any other register).
    static ref BASE_OPCODES: Vec<Vec<Variant>> = vec![
        vec![plain("add", true)],
        vec![plain("sub", true)],
        vec![plain("rsub", true)],
        vec![plain("cmp", true)],
        vec![plain("or", true)],
        vec![plain("xor", true)],
        vec![plain("and", true)],
        vec![plain("test", true)],
        vec![plain("movz", false)],
        vec![plain("movs", true)],
        vec![plain("load", true)],
        vec![plain("store", true)],
        vec![
            Variant {
                name: "pop",
                reg_reg: true,
                reg_imm: false,
                sign_extend: false,
                extra_check: Some(|_a, b| b == 6),
                requirement: || ExtensionRequirement::single(&STACK_AND_FUNCTIONS),
                shape: Shape::Arg1Only,
            },
            Variant {
                name: "pop",
                reg_reg: true,
                reg_imm: false,
                sign_extend: false,
                extra_check: Some(|_a, b| b != 6),
                requirement: || {
                    ExtensionRequirement::single(&STACK_AND_FUNCTIONS)
                        .union(&ExtensionRequirement::single(&ARBITRARY_STACK_POINTER))
                },
                shape: Shape::TwoArgUsing,
            },
        ],
        vec![
            Variant {
                name: "push",
                reg_reg: true,
                reg_imm: true,
                sign_extend: false,
                extra_check: Some(|a, _b| a == 6),
                requirement: || ExtensionRequirement::single(&STACK_AND_FUNCTIONS),
                shape: Shape::Arg2Only,
            },
            Variant {
                name: "push",
                reg_reg: true,
                reg_imm: true,
                sign_extend: false,
                extra_check: Some(|a, _b| a != 6),
                requirement: || {
                    ExtensionRequirement::single(&STACK_AND_FUNCTIONS)
                        .union(&ExtensionRequirement::single(&ARBITRARY_STACK_POINTER))
                },
                shape: Shape::TwoArgUsing,
            },
        ],
        vec![Variant {
            name: "readcr",
            reg_reg: false,
            reg_imm: true,
            sign_extend: false,
            extra_check: None,
            requirement: ExtensionRequirement::none,
            shape: Shape::TwoArg,
        }],
        vec![Variant {
            name: "writecr",
            reg_reg: false,
            reg_imm: true,
            sign_extend: false,
            extra_check: None,
            requirement: ExtensionRequirement::none,
            shape: Shape::TwoArg,
        }],
    ];
}

fn reg_reg_produce(
    bindings: &HashMap<String, Binding>,
    other: &[usize],
) -> DecodeResult<Vec<DecodedPart>> {
    let ss = bindings["SS"].as_raw().unwrap();
    let cccc = bindings["CCCC"].as_raw().unwrap();
    let a = bound_register(bindings, "a");
    let b = bound_register(bindings, "b");
    let size = size_entry(ss.value() as u8).expect("SS is a 2-bit field");

    let mut general_bits = other.to_vec();
    general_bits.extend(ss.bit_section());
    general_bits.extend(cccc.bit_section());

    let mut out = Vec::new();
    for variant in &BASE_OPCODES[cccc.value() as usize] {
        if !variant.reg_reg {
            continue;
        }
        if let Some(check) = variant.extra_check {
            if !check(a.index, b.index) {
                continue;
            }
        }
        let mnemonic = format!("{}{}", variant.name, size.letter);
        let mut args = HashMap::new();
        args.insert("arg1".to_string(), DecodedPart::Register(a.clone()));
        args.insert("arg2".to_string(), DecodedPart::Register(b.clone()));
        out.push(DecodedPart::Instruction(Instruction {
            mnemonic: mnemonic.clone(),
            format: variant.shape.format(&mnemonic),
            args,
            general_bit_section: general_bits.clone(),
            general_requirement: (size.requirement)().union(&(variant.requirement)()),
            kind: InstructionKind::Plain,
            condition: None,
            jump_target: None,
            inner: None,
            size_letter: Some(size.letter),
        }));
    }
    Ok(out)
}

fn reg_imm_produce(
    bindings: &HashMap<String, Binding>,
    other: &[usize],
) -> DecodeResult<Vec<DecodedPart>> {
    let ss = bindings["SS"].as_raw().unwrap();
    let cccc = bindings["CCCC"].as_raw().unwrap();
    let imm = bindings["IIIII"].as_raw().unwrap();
    let a = bound_register(bindings, "a");
    let size = size_entry(ss.value() as u8).expect("SS is a 2-bit field");

    let mut general_bits = other.to_vec();
    general_bits.extend(ss.bit_section());
    general_bits.extend(cccc.bit_section());

    let mut out = Vec::new();
    for variant in &BASE_OPCODES[cccc.value() as usize] {
        if !variant.reg_imm {
            continue;
        }
        if let Some(check) = variant.extra_check {
            if !check(a.index, 0) {
                continue;
            }
        }
        let imm_value = if variant.sign_extend {
            imm.signed(5)
        } else {
            imm.unsigned(5) as i64
        };
        let mnemonic = format!("{}{}", variant.name, size.letter);
        let mut args = HashMap::new();
        args.insert("arg1".to_string(), DecodedPart::Register(a.clone()));
        args.insert(
            "arg2".to_string(),
            DecodedPart::Atom(Atom {
                name: "imm".to_string(),
                display: imm_value.to_string(),
                bit_section: imm.bit_section().to_vec(),
                required_extensions: ExtensionRequirement::none(),
            }),
        );
        out.push(DecodedPart::Instruction(Instruction {
            mnemonic: mnemonic.clone(),
            format: variant.shape.format(&mnemonic),
            args,
            general_bit_section: general_bits.clone(),
            general_requirement: (size.requirement)().union(&(variant.requirement)()),
            kind: InstructionKind::Plain,
            condition: None,
            jump_target: None,
            inner: None,
            size_letter: Some(size.letter),
        }));
    }
    Ok(out)
}

pub fn register(registry: &mut PatternRegistry) {
    registry.register(Rule::new(
        "inst",
        "00 SS CCCC {a:reg} {b:reg} 00",
        reg_reg_produce,
    ));
    registry.register(Rule::new(
        "inst",
        "01 SS CCCC {a:reg} IIIII",
        reg_imm_produce,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParseContext;
    use crate::pattern::CategoryResolver;
    use crate::registry::PatternRegistry as Registry;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        crate::etca::operands::register(&mut registry);
        register(&mut registry);
        registry
    }

    fn decode_one(bytes: &[u8]) -> Instruction {
        let registry = registry();
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
    fn add_reg_reg_native_size_renders() {
        // 00 01(SS=x) 0000(add) 000(a) 001(b) 00
        let instr = decode_one(&[0b00_01_0000, 0b000_001_00]);
        assert_eq!(instr.mnemonic, "addx");
        assert_eq!(instr.render(&Default::default()), "addx %rx0, %rx1");
        assert!(instr.total_requirement().is_empty());
    }

    #[test]
    fn store_reg_imm_sign_extends() {
        // 01 01(SS=x) 1011(store) 010(a) 11111(imm=-1)
        let instr = decode_one(&[0b01_01_1011, 0b010_11111]);
        assert_eq!(instr.mnemonic, "storex");
        assert_eq!(instr.render(&Default::default()), "storex %rx2, -1");
    }

    #[test]
    fn movz_reg_imm_zero_extends() {
        // 01 01(SS=x) 1000(movz) 000(a) 11111(imm=31 unsigned)
        let instr = decode_one(&[0b01_01_1000, 0b000_11111]);
        assert_eq!(instr.render(&Default::default()), "movzx %rx0, 31");
    }

    #[test]
    fn pop_canonical_stack_pointer_uses_saf_only() {
        // 00 01 1100(pop=12) 000(a) 110(b=6) 00
        let instr = decode_one(&[0b00_01_1100, 0b000_110_00]);
        assert_eq!(instr.mnemonic, "popx");
        assert_eq!(instr.render(&Default::default()), "popx %rx0");
        assert_eq!(instr.total_requirement().hard().len(), 1);
    }

    #[test]
    fn pop_arbitrary_stack_pointer_requires_asp_too() {
        // 00 01 1100(pop=12) 000(a) 010(b=2, not 6) 00
        let instr = decode_one(&[0b00_01_1100, 0b000_010_00]);
        assert_eq!(instr.render(&Default::default()), "popx-using %rx0, %rx2");
        assert_eq!(instr.total_requirement().hard().len(), 2);
    }

    #[test]
    fn push_canonical_stack_pointer_shows_source_only() {
        // 00 01 1101(push=13) 110(a=6) 011(b) 00
        let instr = decode_one(&[0b00_01_1101, 0b110_011_00]);
        assert_eq!(instr.render(&Default::default()), "pushx %rx3");
    }

    #[test]
    fn readcr_has_no_reg_reg_form() {
        // 00 01 1110(readcr=14) 000 000 00 — readcr is immediate-only
        let mut ctx = ParseContext::from_bytes(&[0b00_01_1110, 0b000_000_00]);
        let registry = registry();
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
