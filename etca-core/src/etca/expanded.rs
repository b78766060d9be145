//! The `eoc` (expanded opcodes) extension: a second two-operand opcode
//! space reached via a `111 0 ...` escape, carrying `adc`/`sbb`/`rsbb`, plus
//! the absolute/relative jump and call family that occupies the
//! neighbouring `111 1 ...` escape.
//!
//! Grounded on `expanded_opcodes.py`. The jump/call family's displacement
//! width is `8 * 2^SS` bits; rather than model that as a single rule with a
//! computed field width, each of the four `SS` values is registered as its
//! own concrete rule (matching the project's resolution for variable-width
//! braced fields elsewhere in the catalog), which also means each needs its
//! own producer `fn` — the registry's `Producer` alias is a bare function
//! pointer, so the width can't be closed over.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::context::Binding;
use crate::decoded::{Atom, Condition, DecodedPart, Instruction, InstructionKind, JumpTarget};
use crate::error::DecodeResult;
use crate::etca::extensions::{
    DOUBLE_WORD_ADDRESS_SPACE, EXPANDED_OPCODES, QUAD_WORD_ADDRESS_SPACE, STACK_AND_FUNCTIONS,
};
use crate::etca::operands::bound_register;
use crate::etca::sizes::size_entry;
use crate::registry::{PatternRegistry, Producer, Rule};
use crate::requirement::ExtensionRequirement;

struct ExpandedVariant {
    name: &'static str,
}

lazy_static! {
    /// Indexed by the 9-bit `C5 ∥ C4` opcode field. Only slots 0..3 are
    /// populated; every other value is reserved.
    static ref EXPANDED_OPCODES_TABLE: HashMap<u16, ExpandedVariant> = {
        let mut m = HashMap::new();
        m.insert(0, ExpandedVariant { name: "adc" });
        m.insert(1, ExpandedVariant { name: "sbb" });
        m.insert(2, ExpandedVariant { name: "rsbb" });
        m
    };
}

fn expanded_reg_reg_produce(
    bindings: &HashMap<String, Binding>,
    other: &[usize],
) -> DecodeResult<Vec<DecodedPart>> {
    let c5 = bindings["C5"].as_raw().unwrap();
    let c4 = bindings["C4"].as_raw().unwrap();
    let ss = bindings["SS"].as_raw().unwrap();
    let a = bound_register(bindings, "a");
    let b = bound_register(bindings, "b");

    let opcode = c5.concat(c4).value() as u16;
    let variant = match EXPANDED_OPCODES_TABLE.get(&opcode) {
        Some(v) => v,
        None => return Ok(Vec::new()),
    };
    let size = size_entry(ss.value() as u8).expect("SS is a 2-bit field");

    let mut general_bits = other.to_vec();
    general_bits.extend(c5.bit_section());
    general_bits.extend(c4.bit_section());
    general_bits.extend(ss.bit_section());

    let mnemonic = format!("{}{}", variant.name, size.letter);
    let mut args = HashMap::new();
    args.insert("arg1".to_string(), DecodedPart::Register(a));
    args.insert("arg2".to_string(), DecodedPart::Register(b));

    Ok(vec![DecodedPart::Instruction(Instruction {
        mnemonic: mnemonic.clone(),
        format: format!("{mnemonic} {{arg1}}, {{arg2}}"),
        args,
        general_bit_section: general_bits,
        general_requirement: (size.requirement)().union(&ExtensionRequirement::single(&EXPANDED_OPCODES)),
        kind: InstructionKind::Plain,
        condition: None,
        jump_target: None,
        inner: None,
        size_letter: Some(size.letter),
    })])
}

fn expanded_reg_imm_produce(
    bindings: &HashMap<String, Binding>,
    other: &[usize],
) -> DecodeResult<Vec<DecodedPart>> {
    let c5 = bindings["C5"].as_raw().unwrap();
    let c4 = bindings["C4"].as_raw().unwrap();
    let ss = bindings["SS"].as_raw().unwrap();
    let imm = bindings["IIIII"].as_raw().unwrap();
    let a = bound_register(bindings, "a");

    let opcode = c5.concat(c4).value() as u16;
    let variant = match EXPANDED_OPCODES_TABLE.get(&opcode) {
        Some(v) => v,
        None => return Ok(Vec::new()),
    };
    let size = size_entry(ss.value() as u8).expect("SS is a 2-bit field");

    let mut general_bits = other.to_vec();
    general_bits.extend(c5.bit_section());
    general_bits.extend(c4.bit_section());
    general_bits.extend(ss.bit_section());

    let mnemonic = format!("{}{}", variant.name, size.letter);
    let mut args = HashMap::new();
    args.insert("arg1".to_string(), DecodedPart::Register(a));
    args.insert(
        "arg2".to_string(),
        DecodedPart::Atom(Atom {
            name: "imm".to_string(),
            display: imm.signed(5).to_string(),
            bit_section: imm.bit_section().to_vec(),
            required_extensions: ExtensionRequirement::none(),
        }),
    );

    Ok(vec![DecodedPart::Instruction(Instruction {
        mnemonic: mnemonic.clone(),
        format: format!("{mnemonic} {{arg1}}, {{arg2}}"),
        args,
        general_bit_section: general_bits,
        general_requirement: (size.requirement)().union(&ExtensionRequirement::single(&EXPANDED_OPCODES)),
        kind: InstructionKind::Plain,
        condition: None,
        jump_target: None,
        inner: None,
        size_letter: Some(size.letter),
    })])
}

/// The requirement a jump/call of address-space size `ss` carries beyond
/// `eoc` itself: nothing extra for a half-word/native-word displacement,
/// either of the two address-space extensions for a double-word one, and
/// specifically `qwas` for a quad-word one.
fn address_space_requirement(ss: u8) -> ExtensionRequirement {
    let extra = match ss {
        0 | 1 => ExtensionRequirement::none(),
        2 => ExtensionRequirement::any_of(vec![&DOUBLE_WORD_ADDRESS_SPACE, &QUAD_WORD_ADDRESS_SPACE]),
        3 => ExtensionRequirement::single(&QUAD_WORD_ADDRESS_SPACE),
        _ => unreachable!("SS is a 2-bit field"),
    };
    ExtensionRequirement::single(&EXPANDED_OPCODES).union(&extra)
}

fn width_bits(ss: u8) -> usize {
    8usize * (1usize << ss)
}

fn ss_literal(ss: u8) -> &'static str {
    match ss {
        0 => "00",
        1 => "01",
        2 => "10",
        3 => "11",
        _ => unreachable!("SS is a 2-bit field"),
    }
}

fn produce_jump_or_call(
    bindings: &HashMap<String, Binding>,
    other: &[usize],
    field: &str,
    relative: bool,
    is_call: bool,
    ss: u8,
) -> DecodeResult<Vec<DecodedPart>> {
    let bv = bindings[field].as_raw().unwrap();
    let jump_target = JumpTarget {
        relative,
        value: bv.clone(),
        bit_section: bv.bit_section().to_vec(),
        required_extensions: ExtensionRequirement::none(),
    };

    let mnemonic = if is_call { "call" } else { "jump" }.to_string();
    let mut args = HashMap::new();
    args.insert("target".to_string(), DecodedPart::JumpTarget(jump_target.clone()));

    let mut requirement = address_space_requirement(ss);
    if is_call {
        requirement = requirement.union(&ExtensionRequirement::single(&STACK_AND_FUNCTIONS));
    }

    Ok(vec![DecodedPart::Instruction(Instruction {
        mnemonic: mnemonic.clone(),
        format: format!("{mnemonic} {{target}}"),
        args,
        general_bit_section: other.to_vec(),
        general_requirement: requirement,
        kind: if is_call {
            InstructionKind::Call
        } else {
            InstructionKind::ConditionalJump
        },
        condition: if is_call { None } else { Some(Condition::Always) },
        jump_target: Some(jump_target),
        inner: None,
        size_letter: None,
    })])
}

macro_rules! define_jump_or_call {
    ($name:ident, $field:literal, $relative:expr, $is_call:expr, $ss:expr) => {
        fn $name(bindings: &HashMap<String, Binding>, other: &[usize]) -> DecodeResult<Vec<DecodedPart>> {
            produce_jump_or_call(bindings, other, $field, $relative, $is_call, $ss)
        }
    };
}

define_jump_or_call!(rel_jump_0, "disp", true, false, 0u8);
define_jump_or_call!(rel_jump_1, "disp", true, false, 1u8);
define_jump_or_call!(rel_jump_2, "disp", true, false, 2u8);
define_jump_or_call!(rel_jump_3, "disp", true, false, 3u8);
define_jump_or_call!(abs_jump_0, "target", false, false, 0u8);
define_jump_or_call!(abs_jump_1, "target", false, false, 1u8);
define_jump_or_call!(abs_jump_2, "target", false, false, 2u8);
define_jump_or_call!(abs_jump_3, "target", false, false, 3u8);
define_jump_or_call!(rel_call_0, "disp", true, true, 0u8);
define_jump_or_call!(rel_call_1, "disp", true, true, 1u8);
define_jump_or_call!(rel_call_2, "disp", true, true, 2u8);
define_jump_or_call!(rel_call_3, "disp", true, true, 3u8);
define_jump_or_call!(abs_call_0, "target", false, true, 0u8);
define_jump_or_call!(abs_call_1, "target", false, true, 1u8);
define_jump_or_call!(abs_call_2, "target", false, true, 2u8);
define_jump_or_call!(abs_call_3, "target", false, true, 3u8);

const REL_JUMP: [Producer; 4] = [rel_jump_0, rel_jump_1, rel_jump_2, rel_jump_3];
const ABS_JUMP: [Producer; 4] = [abs_jump_0, abs_jump_1, abs_jump_2, abs_jump_3];
const REL_CALL: [Producer; 4] = [rel_call_0, rel_call_1, rel_call_2, rel_call_3];
const ABS_CALL: [Producer; 4] = [abs_call_0, abs_call_1, abs_call_2, abs_call_3];

fn register_jump_or_call(registry: &mut PatternRegistry, is_call: bool, relative: bool) {
    let call_bit = if is_call { "1" } else { "0" };
    let abs_bit = if relative { "0" } else { "1" };
    let field = if relative { "disp" } else { "target" };
    let producers: &[Producer; 4] = match (is_call, relative) {
        (false, true) => &REL_JUMP,
        (false, false) => &ABS_JUMP,
        (true, true) => &REL_CALL,
        (true, false) => &ABS_CALL,
    };
    for ss in 0..4u8 {
        let pattern = format!(
            "111 1 {call_bit} {abs_bit} {} {{{field}:{}}}",
            ss_literal(ss),
            width_bits(ss)
        );
        registry.register(Rule::new("inst", &pattern, producers[ss as usize]));
    }
}

pub fn register(registry: &mut PatternRegistry) {
    registry.register(Rule::new(
        "inst",
        "111 0 {C5:5} 0 SS {C4:4} {a:reg} {b:reg} 00",
        expanded_reg_reg_produce,
    ));
    registry.register(Rule::new(
        "inst",
        "111 0 {C5:5} 1 SS {C4:4} {a:reg} IIIII",
        expanded_reg_imm_produce,
    ));

    register_jump_or_call(registry, false, true);
    register_jump_or_call(registry, false, false);
    register_jump_or_call(registry, true, true);
    register_jump_or_call(registry, true, false);
}
