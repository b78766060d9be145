//! The mutable parse context: bit buffer, cursor, and the chained binding
//! and global-context environments the grammar operates over.

use std::collections::HashMap;

use crate::bitvector::BitVector;
use crate::decoded::DecodedPart;
use crate::error::{DecodeError, DecodeResult};

/// What a name can be bound to: either a raw bit-field (from a
/// single-letter or `{name:N}` token) or the result of recursively parsing
/// a category (from a `{name:category}` bound sub-pattern).
#[derive(Debug, Clone)]
pub enum Binding {
    Raw(BitVector),
    Decoded(DecodedPart),
}

impl Binding {
    pub fn as_raw(&self) -> Option<&BitVector> {
        match self {
            Binding::Raw(bv) => Some(bv),
            Binding::Decoded(_) => None,
        }
    }

    pub fn as_decoded(&self) -> Option<&DecodedPart> {
        match self {
            Binding::Decoded(part) => Some(part),
            Binding::Raw(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct Frame {
    bindings: HashMap<String, Binding>,
    other_bits: Vec<usize>,
}

/// A handle returned by [`ParseContext::checkpoint`], opaque to callers
/// beyond passing it back to [`ParseContext::revert`].
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    depth: usize,
    cursor: usize,
}

/// The input bit buffer, cursor, and chained binding/global-context
/// environments that a single top-level `inst` parse operates over.
///
/// Name lookup scans frames newest-to-oldest. `checkpoint`/`revert` push
/// and pop frames on both the binding and global-context stacks together,
/// and additionally snapshot/restore the cursor, so a failed rule attempt
/// leaves no trace.
#[derive(Debug)]
pub struct ParseContext {
    bits: Vec<bool>,
    cursor: usize,
    frames: Vec<Frame>,
    global_frames: Vec<HashMap<String, u64>>,
}

impl ParseContext {
    /// Builds a context over a raw bit vector (one bool per bit, MSB-first
    /// within each byte if constructed via [`ParseContext::from_bytes`]).
    pub fn new(bits: Vec<bool>) -> Self {
        Self {
            bits,
            cursor: 0,
            frames: vec![Frame::default()],
            global_frames: vec![HashMap::new()],
        }
    }

    /// Builds a context from a byte sequence interpreted big-endian-per-byte
    /// (each byte's bit 7 first).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut bits = Vec::with_capacity(bytes.len() * 8);
        for byte in bytes {
            for shift in (0..8).rev() {
                bits.push((byte >> shift) & 1 == 1);
            }
        }
        Self::new(bits)
    }

    /// Total number of bits in the buffer.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Current cursor position (`__i` in the spec).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Repositions the cursor directly, without touching the binding or
    /// global-context stacks. Used by the driver to step between
    /// independent top-level `inst` parses, each of which leaves the
    /// stacks clean via its own internal checkpoint/revert discipline.
    pub fn seek(&mut self, pos: usize) {
        self.cursor = pos;
    }

    /// Advances the cursor by `n` bits, returning a [`BitVector`] tagged
    /// with the absolute positions `[cursor - n, cursor)`.
    pub fn read(&mut self, n: usize) -> DecodeResult<BitVector> {
        if self.cursor + n > self.bits.len() {
            return Err(DecodeError::NotEnoughBits {
                needed: self.cursor + n - self.bits.len(),
                cursor: self.cursor,
                len: self.bits.len(),
            });
        }
        let start = self.cursor;
        let mut value: u64 = 0;
        let mut positions = Vec::with_capacity(n);
        for i in 0..n {
            value = (value << 1) | (self.bits[start + i] as u64);
            positions.push(start + i);
        }
        self.cursor += n;
        Ok(BitVector::new(value, n as u32, positions))
    }

    /// Reads `n` bits and records their positions as literal-matched
    /// ("other") bits in the current frame, without binding a name.
    pub fn read_literal(&mut self, n: usize) -> DecodeResult<BitVector> {
        let bv = self.read(n)?;
        self.record_other(bv.bit_section());
        Ok(bv)
    }

    /// Appends bit positions to the current frame's "other bits" record.
    pub fn record_other(&mut self, positions: &[usize]) {
        self.current_frame_mut().other_bits.extend_from_slice(positions);
    }

    /// The current frame's accumulated "other bits" (`__other`).
    pub fn other_bits(&self) -> &[usize] {
        &self.current_frame().other_bits
    }

    /// Binds `name` in the current (newest) frame.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already bound in the current frame — the grammar
    /// guarantees distinct names within one rule's tokens, so a collision
    /// here is an engine or catalog bug, not a data-dependent failure.
    pub fn bind(&mut self, name: &str, binding: Binding) {
        let frame = self.current_frame_mut();
        assert!(
            !frame.bindings.contains_key(name),
            "name '{name}' already bound in current frame"
        );
        frame.bindings.insert(name.to_string(), binding);
    }

    /// Looks up `name`, scanning frames newest-to-oldest.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name))
    }

    /// All names bound anywhere in the live stack (newest shadows oldest),
    /// excluding names beginning with `_`, in frame order. Used by the
    /// driver to assemble a rule's producer keyword arguments.
    pub fn visible_bindings(&self) -> HashMap<String, Binding> {
        let mut out: HashMap<String, Binding> = HashMap::new();
        for frame in &self.frames {
            for (name, binding) in &frame.bindings {
                if !name.starts_with('_') {
                    out.insert(name.clone(), binding.clone());
                }
            }
        }
        out
    }

    /// Writes `key -> value` into the current global-context frame.
    pub fn set_context(&mut self, key: &str, value: u64) {
        self.global_frames
            .last_mut()
            .expect("global frame stack never empty")
            .insert(key.to_string(), value);
    }

    /// Whether `key`'s current value (scanning newest-to-oldest) is among
    /// `allowed`. Unbound keys never satisfy a requirement.
    pub fn req_context(&self, key: &str, allowed: &[u64]) -> bool {
        self.global_frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(key))
            .is_some_and(|value| allowed.contains(value))
    }

    /// Pushes a fresh, empty frame onto both the binding and global-context
    /// stacks, and snapshots the cursor. Returns a handle for
    /// [`ParseContext::revert`].
    pub fn checkpoint(&mut self) -> Checkpoint {
        let depth = self.frames.len();
        let cursor = self.cursor;
        self.frames.push(Frame::default());
        self.global_frames.push(HashMap::new());
        Checkpoint { depth, cursor }
    }

    /// Truncates both stacks back to the checkpoint's depth and restores
    /// the cursor, undoing everything since the matching `checkpoint` call.
    pub fn revert(&mut self, checkpoint: Checkpoint) {
        self.frames.truncate(checkpoint.depth);
        self.global_frames.truncate(checkpoint.depth);
        self.cursor = checkpoint.cursor;
    }

    fn current_frame(&self) -> &Frame {
        self.frames.last().expect("frame stack never empty")
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack never empty")
    }
}
