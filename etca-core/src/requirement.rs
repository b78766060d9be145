//! Extensions and the extension-requirement algebra.

use std::fmt;

/// A static descriptor for an ISA extension: long name, short name, and a
/// `(major, minor)` version pair.
///
/// Extension values are defined once by each extension module (typically
/// as `static` items) and compared by identity of their short name, which
/// is unique across the catalog.
#[derive(Debug, Clone, Copy)]
pub struct Extension {
    /// Human-readable long name, e.g. "half-word operations".
    pub name: &'static str,
    /// Short identifier used in rendered output, e.g. `"hw"`.
    pub short_name: &'static str,
    /// `(major, minor)` version.
    pub version: (u32, u32),
}

impl PartialEq for Extension {
    fn eq(&self, other: &Self) -> bool {
        self.short_name == other.short_name
    }
}

impl Eq for Extension {}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} v{}.{}",
            self.short_name, self.version.0, self.version.1
        )
    }
}

/// A requirement expressed as a conjunction of disjunctions: every hard
/// requirement must be met, and for each disjunctive set at least one
/// member must be met.
///
/// Canonical form: `hard` holds extensions required outright (each
/// equivalent to a singleton disjunction); `disjunctions` holds sets of two
/// or more alternatives. [`ExtensionRequirement::union`] keeps this form
/// canonical by folding singleton disjunctions into `hard` and dropping any
/// disjunction that is already satisfied by a hard requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionRequirement {
    hard: Vec<&'static Extension>,
    disjunctions: Vec<Vec<&'static Extension>>,
}

impl ExtensionRequirement {
    /// No requirements at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// A single hard requirement.
    pub fn single(ext: &'static Extension) -> Self {
        Self {
            hard: vec![ext],
            disjunctions: Vec::new(),
        }
    }

    /// A disjunctive requirement: any one of `exts` suffices. A one-element
    /// disjunction is normalized to a hard requirement.
    pub fn any_of(exts: Vec<&'static Extension>) -> Self {
        if exts.len() <= 1 {
            Self {
                hard: exts,
                disjunctions: Vec::new(),
            }
        } else {
            Self {
                hard: Vec::new(),
                disjunctions: vec![exts],
            }
        }
    }

    /// Whether this requirement names no extensions at all.
    pub fn is_empty(&self) -> bool {
        self.hard.is_empty() && self.disjunctions.is_empty()
    }

    /// Hard-required extensions.
    pub fn hard(&self) -> &[&'static Extension] {
        &self.hard
    }

    /// Disjunctive alternative sets.
    pub fn disjunctions(&self) -> &[Vec<&'static Extension>] {
        &self.disjunctions
    }

    /// Union of `self` and `other`: flattens hard requirements first, then
    /// keeps each disjunction only if none of its members is already hard.
    pub fn union(&self, other: &ExtensionRequirement) -> ExtensionRequirement {
        let mut hard: Vec<&'static Extension> = Vec::new();
        for ext in self.hard.iter().chain(other.hard.iter()) {
            if !hard.contains(ext) {
                hard.push(ext);
            }
        }

        let mut disjunctions: Vec<Vec<&'static Extension>> = Vec::new();
        for disjunction in self.disjunctions.iter().chain(other.disjunctions.iter()) {
            if disjunction.iter().any(|e| hard.contains(e)) {
                continue;
            }
            if !disjunctions.contains(disjunction) {
                disjunctions.push(disjunction.clone());
            }
        }

        ExtensionRequirement { hard, disjunctions }
    }

    /// Whether `available` (by short name) satisfies this requirement:
    /// every hard extension is present, and every disjunction has at least
    /// one member present.
    pub fn is_satisfied_by(&self, available: &[&'static Extension]) -> bool {
        let present = |ext: &&'static Extension| available.iter().any(|a| a == ext);
        self.hard.iter().all(present)
            && self
                .disjunctions
                .iter()
                .all(|set| set.iter().any(present))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static HW: Extension = Extension {
        name: "half-word operations",
        short_name: "hw",
        version: (1, 3),
    };
    static DWAS: Extension = Extension {
        name: "32-bit address space",
        short_name: "dwas",
        version: (1, 0),
    };
    static QWAS: Extension = Extension {
        name: "64-bit address space",
        short_name: "qwas",
        version: (1, 0),
    };

    #[test]
    fn union_dedupes_hard_requirements() {
        let a = ExtensionRequirement::single(&HW);
        let b = ExtensionRequirement::single(&HW);
        let u = a.union(&b);
        assert_eq!(u.hard().len(), 1);
    }

    #[test]
    fn union_drops_disjunction_satisfied_by_hard() {
        let disjunction = ExtensionRequirement::any_of(vec![&DWAS, &QWAS]);
        let hard = ExtensionRequirement::single(&DWAS);
        let u = disjunction.union(&hard);
        assert!(u.disjunctions().is_empty());
        assert_eq!(u.hard(), &[&DWAS]);
    }

    #[test]
    fn satisfaction_requires_one_member_of_each_disjunction() {
        let req = ExtensionRequirement::any_of(vec![&DWAS, &QWAS]);
        assert!(!req.is_satisfied_by(&[&HW]));
        assert!(req.is_satisfied_by(&[&HW, &QWAS]));
    }

    #[test]
    fn empty_requirement_is_always_satisfied() {
        let req = ExtensionRequirement::none();
        assert!(req.is_empty());
        assert!(req.is_satisfied_by(&[]));
    }
}
