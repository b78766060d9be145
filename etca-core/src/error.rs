//! Errors produced by the bit-pattern decoder engine.

use thiserror::Error;

/// Errors that can propagate out of a parse.
///
/// `UnknownInstruction` is a soft failure the driver absorbs while trying
/// other rules; `IllegalInstruction` and `NotEnoughBits` are hard failures
/// that abort the enclosing top-level parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No registered rule accepted the bits at the current cursor, or a
    /// producer deliberately rejected its own match (e.g. a reserved field
    /// value). Absorbed by the driver while other rules remain untried.
    #[error("unknown instruction at bit {cursor}: {reason}")]
    UnknownInstruction {
        /// Cursor position (bit index) where the failure was observed.
        cursor: usize,
        /// Human-readable reason, e.g. the rejected field value.
        reason: String,
    },

    /// A rule matched but its semantic check rejected the match (e.g.
    /// conditional-prefix wrapping an already-conditional instruction).
    /// Aborts enumeration for the current top-level `inst` parse.
    #[error("illegal instruction at bits [{start}, {end}): {reason}")]
    IllegalInstruction {
        /// First bit of the offending slice.
        start: usize,
        /// One past the last bit of the offending slice.
        end: usize,
        /// Human-readable reason.
        reason: String,
    },

    /// The cursor ran past the end of the buffer during a `read`.
    #[error("not enough bits: needed {needed} more, cursor at {cursor} of {len}")]
    NotEnoughBits {
        /// Bits requested.
        needed: usize,
        /// Cursor at the time of the failed read.
        cursor: usize,
        /// Total buffer length in bits.
        len: usize,
    },
}

impl DecodeError {
    /// True when the cursor sits exactly at the end of the buffer, i.e.
    /// this is a clean end-of-input rather than a mid-instruction
    /// truncation.
    pub fn is_clean_eof(&self) -> bool {
        matches!(self, DecodeError::NotEnoughBits { cursor, len, .. } if cursor == len)
    }
}

/// Convenience alias used throughout the engine.
pub type DecodeResult<T> = Result<T, DecodeError>;
