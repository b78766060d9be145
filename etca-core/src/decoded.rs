//! The decoded-part algebra: the sum type of everything a rule's producer
//! can yield, and the rendering of that algebra into assembly text.

use std::collections::HashMap;

use crate::requirement::ExtensionRequirement;

/// One of the sixteen condition codes ETCa's condition field can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Zero,
    NotZero,
    Negative,
    NotNegative,
    Carry,
    NotCarry,
    Overflow,
    NotOverflow,
    BelowOrEqual,
    Above,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    Greater,
    /// `mp` — always true.
    Always,
    /// Never true.
    Never,
}

impl Condition {
    /// The four-bit code assigned to this condition by the base ISA.
    pub fn code(self) -> u8 {
        use Condition::*;
        match self {
            Zero => 0,
            NotZero => 1,
            Negative => 2,
            NotNegative => 3,
            Carry => 4,
            NotCarry => 5,
            Overflow => 6,
            NotOverflow => 7,
            BelowOrEqual => 8,
            Above => 9,
            Less => 10,
            GreaterOrEqual => 11,
            LessOrEqual => 12,
            Greater => 13,
            Always => 14,
            Never => 15,
        }
    }

    /// The condition assigned to a four-bit code, if any (all 16 are
    /// assigned, so this never fails given an in-range code).
    pub fn from_code(code: u8) -> Option<Condition> {
        use Condition::*;
        Some(match code {
            0 => Zero,
            1 => NotZero,
            2 => Negative,
            3 => NotNegative,
            4 => Carry,
            5 => NotCarry,
            6 => Overflow,
            7 => NotOverflow,
            8 => BelowOrEqual,
            9 => Above,
            10 => Less,
            11 => GreaterOrEqual,
            12 => LessOrEqual,
            13 => Greater,
            14 => Always,
            15 => Never,
            _ => return None,
        })
    }

    /// Mnemonic suffix used when rendering `j<cond>`/`if<cond>`.
    pub fn mnemonic_suffix(self) -> &'static str {
        use Condition::*;
        match self {
            Zero => "z",
            NotZero => "nz",
            Negative => "n",
            NotNegative => "nn",
            Carry => "c",
            NotCarry => "nc",
            Overflow => "v",
            NotOverflow => "nv",
            BelowOrEqual => "be",
            Above => "a",
            Less => "l",
            GreaterOrEqual => "ge",
            LessOrEqual => "le",
            Greater => "g",
            Always => "mp",
            Never => "never",
        }
    }
}

/// A leaf decoded part carrying no further structure: a name, a display
/// string, its bit section, and the extensions it requires.
#[derive(Debug, Clone)]
pub struct Atom {
    pub name: String,
    pub display: String,
    pub bit_section: Vec<usize>,
    pub required_extensions: ExtensionRequirement,
}

/// A relative or absolute jump/call target.
#[derive(Debug, Clone)]
pub struct JumpTarget {
    pub relative: bool,
    pub value: crate::bitvector::BitVector,
    pub bit_section: Vec<usize>,
    pub required_extensions: ExtensionRequirement,
}

impl JumpTarget {
    /// Resolves this target to an absolute byte address given the address
    /// of the instruction it belongs to.
    pub fn resolve(&self, instruction_start_address: u64) -> u64 {
        if self.relative {
            instruction_start_address.wrapping_add(
                self.value.signed(self.value.bit_size()) as u64,
            )
        } else {
            self.value.unsigned(self.value.bit_size())
        }
    }
}

/// A register operand: an index in `0..n`, its bit section, and an
/// optional override of its operand size (used when a register's width is
/// pinned by the encoding rather than by the ambient size scope).
#[derive(Debug, Clone)]
pub struct Register {
    pub index: u8,
    pub bit_section: Vec<usize>,
    pub known_size: Option<char>,
}

/// What role an [`Instruction`] plays in control flow. Not part of the
/// source algebra directly — the original Python distinguishes `Hlt`,
/// `CondJump`, and `Call` as separate dataclasses; this tag lets the
/// nonlinear disassembler dispatch on instruction role without matching on
/// mnemonic strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    /// An ordinary, non-terminating instruction.
    Plain,
    /// `hlt` — always terminates, no successor.
    Halt,
    /// `nop`/`j<cond>` family arising from the conditional-jump pattern.
    /// Carries its own condition and (when not `never`) jump target.
    ConditionalJump,
    /// A call: does not terminate the block, and yields no successor (flow
    /// continues to the following instruction).
    Call,
}

/// The composite decoder output: a format template, named sub-parts, the
/// rule's own "other bits" (the literal-matched bits not inside any bound
/// argument), and the rule's own extension requirement.
///
/// Instructions may wrap other instructions (conditional prefix); the
/// wrapped instruction, if any, is carried in `inner`.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub mnemonic: String,
    /// Template string with `{name}` placeholders referencing `args`.
    pub format: String,
    pub args: HashMap<String, DecodedPart>,
    pub general_bit_section: Vec<usize>,
    pub general_requirement: ExtensionRequirement,
    pub kind: InstructionKind,
    pub condition: Option<Condition>,
    pub jump_target: Option<JumpTarget>,
    pub inner: Option<Box<Instruction>>,
    /// Size-code letter this instruction's own operands render under, if
    /// it carries an `SS` field. Overrides whatever the caller's
    /// `RenderContext` says, but only for this instruction's own args —
    /// `inner` renders under its own scope, not this one's.
    pub size_letter: Option<char>,
}

impl Instruction {
    /// The full bit section: this instruction's own bits, plus every
    /// transitively-contained part's bits.
    pub fn full_bit_section(&self) -> Vec<usize> {
        let mut bits = self.general_bit_section.clone();
        for part in self.args.values() {
            bits.extend(part.bit_section());
        }
        if let Some(inner) = &self.inner {
            bits.extend(inner.full_bit_section());
        }
        bits
    }

    /// Byte-aligned start address (in bits) of this instruction: the
    /// smallest bit position across its full bit section.
    pub fn start_bit(&self) -> Option<usize> {
        self.full_bit_section().into_iter().min()
    }

    /// One past the last bit of this instruction.
    pub fn end_bit(&self) -> Option<usize> {
        self.full_bit_section().into_iter().max().map(|m| m + 1)
    }

    /// Byte length of the instruction, derived from its full bit section.
    pub fn byte_len(&self) -> usize {
        match (self.start_bit(), self.end_bit()) {
            (Some(start), Some(end)) => (end - start) / 8,
            _ => 0,
        }
    }

    /// Union of this instruction's own requirement with every contained
    /// part's requirement (args and, recursively, `inner`).
    pub fn total_requirement(&self) -> ExtensionRequirement {
        let mut req = self.general_requirement.clone();
        for part in self.args.values() {
            req = req.union(&part.required_extensions());
        }
        if let Some(inner) = &self.inner {
            req = req.union(&inner.total_requirement());
        }
        req
    }

    /// Renders this instruction to an assembly-style string.
    pub fn render(&self, ctx: &RenderContext) -> String {
        if let Some(inner) = &self.inner {
            let inner_text = inner.render(ctx);
            return self.format.replace("{inner}", &inner_text);
        }
        let local_ctx = RenderContext {
            size_letter: self.size_letter.or(ctx.size_letter),
        };
        let mut out = self.format.clone();
        for (name, part) in &self.args {
            out = out.replace(&format!("{{{name}}}"), &part.render(&local_ctx));
        }
        out
    }
}

/// The sum type of everything a rule's producer can yield.
///
/// `Condition` carries its own bit section (the bits of the `cond`
/// sub-parse) alongside the value — unlike the other leaf variants there is
/// no dedicated struct for it, since a condition has no further fields of
/// its own.
#[derive(Debug, Clone)]
pub enum DecodedPart {
    Atom(Atom),
    JumpTarget(JumpTarget),
    Register(Register),
    Condition(Condition, Vec<usize>),
    Instruction(Instruction),
}

impl DecodedPart {
    pub fn bit_section(&self) -> Vec<usize> {
        match self {
            DecodedPart::Atom(a) => a.bit_section.clone(),
            DecodedPart::JumpTarget(j) => j.bit_section.clone(),
            DecodedPart::Register(r) => r.bit_section.clone(),
            DecodedPart::Condition(_, bits) => bits.clone(),
            DecodedPart::Instruction(i) => i.full_bit_section(),
        }
    }

    pub fn required_extensions(&self) -> ExtensionRequirement {
        match self {
            DecodedPart::Atom(a) => a.required_extensions.clone(),
            DecodedPart::JumpTarget(j) => j.required_extensions.clone(),
            DecodedPart::Register(_) | DecodedPart::Condition(_, _) => ExtensionRequirement::none(),
            DecodedPart::Instruction(i) => i.total_requirement(),
        }
    }

    /// Renders this part given the active [`RenderContext`].
    pub fn render(&self, ctx: &RenderContext) -> String {
        match self {
            DecodedPart::Atom(a) => a.display.clone(),
            DecodedPart::JumpTarget(j) => format!("{:#x}", j.value.value()),
            DecodedPart::Register(r) => {
                let size = r.known_size.unwrap_or(ctx.size_letter.unwrap_or('x'));
                format!("%r{size}{}", r.index)
            }
            DecodedPart::Condition(c, _) => c.mnemonic_suffix().to_string(),
            DecodedPart::Instruction(i) => i.render(ctx),
        }
    }
}

/// Threads the active operand-size-code letter into the rendering of
/// sub-parts, so a register operand renders as `%r<size><index>` relative
/// to its enclosing instruction's declared size.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext {
    pub size_letter: Option<char>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(size_letter: char) -> Self {
        Self {
            size_letter: Some(size_letter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_code_round_trips() {
        for code in 0..16u8 {
            let cond = Condition::from_code(code).unwrap();
            assert_eq!(cond.code(), code);
        }
    }

    #[test]
    fn jump_target_resolves_relative_with_sign_extension() {
        let target = JumpTarget {
            relative: true,
            value: crate::bitvector::BitVector::new(0b1_1111_1100, 9, vec![]),
            bit_section: vec![],
            required_extensions: ExtensionRequirement::none(),
        };
        // -4 relative to 0x100
        assert_eq!(target.resolve(0x100), 0xfc);
    }

    #[test]
    fn jump_target_resolves_absolute_unsigned() {
        let target = JumpTarget {
            relative: false,
            value: crate::bitvector::BitVector::new(0x1000, 16, vec![]),
            bit_section: vec![],
            required_extensions: ExtensionRequirement::none(),
        };
        assert_eq!(target.resolve(0x9999), 0x1000);
    }

    #[test]
    fn register_renders_with_context_size() {
        let reg = Register {
            index: 3,
            bit_section: vec![],
            known_size: None,
        };
        let part = DecodedPart::Register(reg);
        let ctx = RenderContext::with_size('d');
        assert_eq!(part.render(&ctx), "%rd3");
    }

    #[test]
    fn register_known_size_overrides_context() {
        let reg = Register {
            index: 0,
            bit_section: vec![],
            known_size: Some('q'),
        };
        let part = DecodedPart::Register(reg);
        let ctx = RenderContext::with_size('x');
        assert_eq!(part.render(&ctx), "%rq0");
    }
}
