//! The process-wide pattern registry: a category name maps to an ordered
//! list of (pattern, producer) rules, populated once by extension modules
//! and read-only thereafter.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::context::{Binding, ParseContext};
use crate::decoded::DecodedPart;
use crate::error::{DecodeError, DecodeResult};
use crate::pattern::{CategoryResolver, Pattern};

/// A rule's producer: given the names bound by its pattern (excluding
/// those beginning with `_`) and the rule's "other bits", yields zero or
/// more decoded parts, or signals rejection/illegality.
///
/// Every producer in the catalog yields a statically bounded number of
/// alternatives, so results are collected eagerly into a `Vec` rather than
/// modeled as a lazy iterator.
pub type Producer = fn(&HashMap<String, Binding>, &[usize]) -> DecodeResult<Vec<DecodedPart>>;

/// A registered (pattern, producer) pair, with its optional context
/// modifiers.
pub struct Rule {
    pub category: &'static str,
    pub pattern: Pattern,
    pub producer: Producer,
    /// Written into the current global-context frame once the pattern
    /// matches, before the producer runs.
    pub set_context: Vec<(&'static str, u64)>,
    /// Must all hold against the global context before this rule is even
    /// attempted.
    pub req_context: Vec<(&'static str, Vec<u64>)>,
}

impl Rule {
    /// A rule with no context modifiers.
    pub fn new(category: &'static str, pattern: &str, producer: Producer) -> Self {
        Self {
            category,
            pattern: Pattern::from_str(pattern),
            producer,
            set_context: Vec::new(),
            req_context: Vec::new(),
        }
    }

    pub fn with_set_context(mut self, key: &'static str, value: u64) -> Self {
        self.set_context.push((key, value));
        self
    }

    pub fn with_req_context(mut self, key: &'static str, allowed: Vec<u64>) -> Self {
        self.req_context.push((key, allowed));
        self
    }
}

/// A category name to ordered rule list mapping. Populated once at
/// startup; read-only thereafter, so no locking is required once built.
#[derive(Default)]
pub struct PatternRegistry {
    categories: HashMap<&'static str, Vec<Rule>>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `rule` under its own category, preserving registration
    /// order within that category.
    pub fn register(&mut self, rule: Rule) {
        self.categories.entry(rule.category).or_default().push(rule);
    }

    /// Rules registered for `category`, in registration order.
    pub fn rules_for(&self, category: &str) -> &[Rule] {
        self.categories
            .get(category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

impl CategoryResolver for PatternRegistry {
    fn resolve(
        &self,
        category: &str,
        ctx: &mut ParseContext,
        emit: &mut dyn FnMut(&mut ParseContext, DecodedPart) -> DecodeResult<()>,
    ) -> DecodeResult<bool> {
        let mut any = false;
        for rule in self.rules_for(category) {
            if !rule
                .req_context
                .iter()
                .all(|(key, allowed)| ctx.req_context(key, allowed))
            {
                continue;
            }

            let checkpoint = ctx.checkpoint();
            let outcome = rule.pattern.parse(ctx, self, &mut |ctx| {
                for (key, value) in &rule.set_context {
                    ctx.set_context(key, *value);
                }
                let bindings = ctx.visible_bindings();
                let other = ctx.other_bits().to_vec();
                match (rule.producer)(&bindings, &other) {
                    Ok(parts) => {
                        for part in parts {
                            any = true;
                            emit(ctx, part)?;
                        }
                        Ok(())
                    }
                    Err(DecodeError::UnknownInstruction { .. }) => Ok(()),
                    Err(e) => Err(e),
                }
            });
            ctx.revert(checkpoint);

            match outcome {
                Ok(()) => {}
                Err(DecodeError::UnknownInstruction { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(any)
    }
}

lazy_static! {
    /// The process-wide registry, built exactly once from every extension
    /// module's `register` function.
    pub static ref REGISTRY: PatternRegistry = {
        let mut registry = PatternRegistry::new();
        crate::etca::register_all(&mut registry);
        registry
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoded::{Atom, DecodedPart};
    use crate::requirement::ExtensionRequirement;

    fn atom_producer(
        bindings: &HashMap<String, Binding>,
        _other: &[usize],
    ) -> DecodeResult<Vec<DecodedPart>> {
        let value = bindings["x"].as_raw().unwrap().value();
        Ok(vec![DecodedPart::Atom(Atom {
            name: "x".to_string(),
            display: format!("x={value}"),
            bit_section: vec![],
            required_extensions: ExtensionRequirement::none(),
        })])
    }

    #[test]
    fn registry_tries_rules_in_registration_order() {
        let mut registry = PatternRegistry::new();
        registry.register(Rule::new("test", "00 x", atom_producer));
        registry.register(Rule::new("test", "01 x", atom_producer));

        let mut ctx = ParseContext::from_bytes(&[0b0110_0000]);
        let mut results = Vec::new();
        let matched = registry
            .resolve("test", &mut ctx, &mut |_ctx, part| {
                results.push(part);
                Ok(())
            })
            .unwrap();
        assert!(matched);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn registry_reports_no_match_for_unregistered_category() {
        let registry = PatternRegistry::new();
        let mut ctx = ParseContext::from_bytes(&[0x00]);
        let matched = registry.resolve("nothing", &mut ctx, &mut |_, _| Ok(())).unwrap();
        assert!(!matched);
    }
}
