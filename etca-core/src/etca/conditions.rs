//! The `cond` category: a 4-bit field naming one of the sixteen condition
//! codes.

use std::collections::HashMap;

use crate::context::Binding;
use crate::decoded::{Condition, DecodedPart};
use crate::error::{DecodeError, DecodeResult};
use crate::registry::{PatternRegistry, Rule};

fn produce(
    bindings: &HashMap<String, Binding>,
    _other: &[usize],
) -> DecodeResult<Vec<DecodedPart>> {
    let bv = bindings["cccc"].as_raw().unwrap();
    let code = bv.value() as u8;
    let condition = Condition::from_code(code).ok_or_else(|| DecodeError::UnknownInstruction {
        cursor: 0,
        reason: format!("condition code {code} out of range"),
    })?;
    Ok(vec![DecodedPart::Condition(condition, bv.bit_section().to_vec())])
}

pub fn register(registry: &mut PatternRegistry) {
    registry.register(Rule::new("cond", "cccc", produce));
}

/// Convenience used by sibling catalog modules: pulls the bound `Condition`
/// back out of a `cond` sub-pattern binding, along with the bit positions it
/// was read from (for the caller's own bit-section accounting).
pub fn bound_condition(bindings: &HashMap<String, Binding>, name: &str) -> (Condition, Vec<usize>) {
    match bindings[name].as_decoded() {
        Some(DecodedPart::Condition(c, bits)) => (*c, bits.clone()),
        other => panic!("expected a Condition binding for '{name}', got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParseContext;

    #[test]
    fn cond_category_resolves_all_sixteen_codes() {
        let mut registry = PatternRegistry::new();
        register(&mut registry);
        for code in 0..16u8 {
            let mut ctx = ParseContext::from_bytes(&[code << 4]);
            let mut results = Vec::new();
            let matched = {
                use crate::pattern::CategoryResolver;
                registry
                    .resolve("cond", &mut ctx, &mut |_ctx, part| {
                        results.push(part);
                        Ok(())
                    })
                    .unwrap()
            };
            assert!(matched);
            assert_eq!(results.len(), 1);
        }
    }
}
