//! The named ISA extensions ETCa's base encoding and families can require.

use crate::requirement::Extension;

pub static HALF_WORD: Extension = Extension {
    name: "half-word operations",
    short_name: "hw",
    version: (1, 3),
};

pub static DOUBLE_WORD: Extension = Extension {
    name: "double-word operations",
    short_name: "dw",
    version: (1, 14),
};

pub static QUAD_WORD: Extension = Extension {
    name: "quad-word operations",
    short_name: "qw",
    version: (0, 15),
};

pub static STACK_AND_FUNCTIONS: Extension = Extension {
    name: "stack and functions",
    short_name: "saf",
    version: (1, 1),
};

pub static ARBITRARY_STACK_POINTER: Extension = Extension {
    name: "arbitrary stack pointer",
    short_name: "asp",
    version: (1, 0),
};

pub static CONDITIONAL_PREFIX: Extension = Extension {
    name: "conditional prefix",
    short_name: "cp",
    version: (1, 0),
};

pub static EXPANDED_OPCODES: Extension = Extension {
    name: "expanded opcodes",
    short_name: "eoc",
    version: (1, 0),
};

pub static DOUBLE_WORD_ADDRESS_SPACE: Extension = Extension {
    name: "32-bit address space",
    short_name: "dwas",
    version: (1, 0),
};

pub static QUAD_WORD_ADDRESS_SPACE: Extension = Extension {
    name: "64-bit address space",
    short_name: "qwas",
    version: (1, 0),
};

/// Every extension this build's catalog recognizes, in registration order.
pub fn all() -> Vec<&'static Extension> {
    vec![
        &HALF_WORD,
        &DOUBLE_WORD,
        &QUAD_WORD,
        &STACK_AND_FUNCTIONS,
        &ARBITRARY_STACK_POINTER,
        &CONDITIONAL_PREFIX,
        &EXPANDED_OPCODES,
        &DOUBLE_WORD_ADDRESS_SPACE,
        &QUAD_WORD_ADDRESS_SPACE,
    ]
}
