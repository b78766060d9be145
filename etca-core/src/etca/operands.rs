//! The `reg` category: a 3-bit field naming one of the eight general
//! registers.

use std::collections::HashMap;

use crate::context::Binding;
use crate::decoded::{DecodedPart, Register};
use crate::error::DecodeResult;
use crate::registry::{PatternRegistry, Rule};

fn produce(
    bindings: &HashMap<String, Binding>,
    _other: &[usize],
) -> DecodeResult<Vec<DecodedPart>> {
    let bv = bindings["rrr"].as_raw().unwrap();
    Ok(vec![DecodedPart::Register(Register {
        index: bv.value() as u8,
        bit_section: bv.bit_section().to_vec(),
        known_size: None,
    })])
}

pub fn register(registry: &mut PatternRegistry) {
    registry.register(Rule::new("reg", "rrr", produce));
}

/// Pulls the bound `Register` back out of a `reg` sub-pattern binding.
pub fn bound_register(bindings: &HashMap<String, Binding>, name: &str) -> Register {
    match bindings[name].as_decoded() {
        Some(DecodedPart::Register(r)) => r.clone(),
        other => panic!("expected a Register binding for '{name}', got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParseContext;
    use crate::pattern::CategoryResolver;

    #[test]
    fn reg_category_resolves_all_eight_indices() {
        let mut registry = PatternRegistry::new();
        register(&mut registry);
        for index in 0..8u8 {
            let mut ctx = ParseContext::from_bytes(&[index << 5]);
            let mut results = Vec::new();
            registry
                .resolve("reg", &mut ctx, &mut |_ctx, part| {
                    results.push(part);
                    Ok(())
                })
                .unwrap();
            assert_eq!(results.len(), 1);
            match &results[0] {
                DecodedPart::Register(r) => assert_eq!(r.index, index),
                _ => panic!("expected Register"),
            }
        }
    }
}
