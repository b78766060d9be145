//! The four bit-grammar primitives and their parsing against a
//! [`ParseContext`].

use crate::context::{Binding, ParseContext};
use crate::decoded::DecodedPart;
use crate::error::{DecodeError, DecodeResult};

/// A single bit-grammar production: a literal bit string, a bound
/// fixed-size slice, a bound recursive reference to a named category, or a
/// sequence of the above.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches an exact bit sequence; contributes to "other bits", binds no
    /// name.
    Literal { value: u64, len: usize },
    /// Always succeeds given enough input; binds `name` to the read slice.
    BoundFixedSize { name: String, len: usize },
    /// Recursively parses `category`; binds `name` to each yielded result.
    BoundSubPattern { name: String, category: String },
    /// Tries each child pattern in order; any failure reverts the whole
    /// sequence's checkpoint.
    Sequence(Vec<Pattern>),
}

/// How a [`Pattern::BoundSubPattern`] token asks the engine to recursively
/// parse a named category. Implemented by the pattern registry; kept as a
/// trait here so `pattern.rs` does not need to depend on `registry.rs`.
pub trait CategoryResolver {
    /// Attempts every registered rule for `category` in registration order.
    /// For each producer result, invokes `emit(ctx, part)` with the cursor
    /// positioned just past the sub-parse. Returns whether at least one
    /// rule produced anything.
    fn resolve(
        &self,
        category: &str,
        ctx: &mut ParseContext,
        emit: &mut dyn FnMut(&mut ParseContext, DecodedPart) -> DecodeResult<()>,
    ) -> DecodeResult<bool>;
}

impl Pattern {
    /// Parses a whitespace-separated token string into a `Pattern`. A
    /// single token is returned directly; more than one becomes a
    /// [`Pattern::Sequence`].
    ///
    /// # Panics
    ///
    /// Panics on a malformed token (not a bit run, not alphabetic, and not
    /// a well-formed `{name:spec}` brace) — catalog-authoring errors are
    /// programmer errors, caught at registration time.
    pub fn from_str(pattern: &str) -> Pattern {
        let tokens: Vec<Pattern> = pattern
            .split_whitespace()
            .map(Self::parse_token)
            .collect();
        match tokens.len() {
            1 => tokens.into_iter().next().unwrap(),
            _ => Pattern::Sequence(tokens),
        }
    }

    fn parse_token(token: &str) -> Pattern {
        if !token.is_empty() && token.chars().all(|c| c == '0' || c == '1') {
            let len = token.len();
            let value = u64::from_str_radix(token, 2)
                .unwrap_or_else(|_| panic!("literal token '{token}' too wide"));
            return Pattern::Literal { value, len };
        }
        if !token.is_empty() && token.chars().all(|c| c.is_ascii_alphabetic()) {
            return Pattern::BoundFixedSize {
                name: token.to_string(),
                len: token.len(),
            };
        }
        if let Some(inner) = token.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
            let (name, spec) = inner
                .split_once(':')
                .unwrap_or_else(|| panic!("malformed braced token '{token}'"));
            if let Ok(len) = spec.parse::<usize>() {
                return Pattern::BoundFixedSize {
                    name: name.to_string(),
                    len,
                };
            }
            return Pattern::BoundSubPattern {
                name: name.to_string(),
                category: spec.to_string(),
            };
        }
        panic!("malformed pattern token '{token}'");
    }

    /// Attempts this pattern against `ctx` at the current cursor. On
    /// success, calls `emit` once per successful branch with the cursor
    /// and bindings in place; `emit`'s own success/failure propagates.
    /// Fails with [`DecodeError::UnknownInstruction`] if the pattern itself
    /// does not match (a literal mismatch, or no registered rule for a
    /// sub-pattern category).
    pub fn parse(
        &self,
        ctx: &mut ParseContext,
        resolver: &dyn CategoryResolver,
        emit: &mut dyn FnMut(&mut ParseContext) -> DecodeResult<()>,
    ) -> DecodeResult<()> {
        match self {
            Pattern::Literal { value, len } => {
                let bv = ctx.read_literal(*len)?;
                if bv.value() != *value {
                    return Err(DecodeError::UnknownInstruction {
                        cursor: ctx.cursor(),
                        reason: format!("literal mismatch: expected {value:#b}, got {:#b}", bv.value()),
                    });
                }
                emit(ctx)
            }
            Pattern::BoundFixedSize { name, len } => {
                let bv = ctx.read(*len)?;
                ctx.bind(name, Binding::Raw(bv));
                emit(ctx)
            }
            Pattern::BoundSubPattern { name, category } => {
                let mut any = false;
                let emit_ref = &mut any;
                let result = resolver.resolve(category, ctx, &mut |ctx, part| {
                    *emit_ref = true;
                    let cp = ctx.checkpoint();
                    ctx.bind(name, Binding::Decoded(part));
                    let r = emit(ctx);
                    ctx.revert(cp);
                    r
                })?;
                if !result {
                    return Err(DecodeError::UnknownInstruction {
                        cursor: ctx.cursor(),
                        reason: format!("no rule matched category '{category}'"),
                    });
                }
                Ok(())
            }
            Pattern::Sequence(children) => {
                let checkpoint = ctx.checkpoint();
                let result = Self::parse_sequence(children, ctx, resolver, emit);
                if result.is_err() {
                    ctx.revert(checkpoint);
                }
                result
            }
        }
    }

    fn parse_sequence(
        children: &[Pattern],
        ctx: &mut ParseContext,
        resolver: &dyn CategoryResolver,
        emit: &mut dyn FnMut(&mut ParseContext) -> DecodeResult<()>,
    ) -> DecodeResult<()> {
        match children.split_first() {
            None => emit(ctx),
            Some((first, rest)) => {
                first.parse(ctx, resolver, &mut |ctx| {
                    Self::parse_sequence(rest, ctx, resolver, emit)
                })
            }
        }
    }
}
