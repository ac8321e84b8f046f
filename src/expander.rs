// src/expander.rs
use std::collections::BTreeSet;

/// An input identity together with its derived variations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    input: String,
    variations: BTreeSet<String>,
}

impl Identity {
    pub fn new(input: impl Into<String>) -> Self {
        let input = input.into();
        let variations = expand(&input);
        Self { input, variations }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn variations(&self) -> &BTreeSet<String> {
        &self.variations
    }
}

/// Derive the variation set for `input`.
///
/// The set always contains `input` itself. Separator swaps are applied to
/// the original string only; lowercase forms are added for everything
/// accumulated before the final step.
pub fn expand(input: &str) -> BTreeSet<String> {
    let mut variations = BTreeSet::new();
    variations.insert(input.to_string());

    let stripped: String = input.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if stripped != input {
        variations.insert(stripped);
    }

    if input.contains(' ') {
        for sep in [".", "_", "-", ""] {
            variations.insert(input.replace(' ', sep));
        }
    }

    if input.contains('.') {
        for sep in ["", "_", "-", " "] {
            variations.insert(input.replace('.', sep));
        }
    }

    let lowered: Vec<String> = variations.iter().map(|v| v.to_lowercase()).collect();
    variations.extend(lowered);

    variations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_input() {
        for input in ["octocat", "John Doe", "j.doe", "", "  ", "Ünïcode"] {
            let variations = expand(input);
            assert!(!variations.is_empty());
            assert!(variations.contains(input));
        }
    }

    #[test]
    fn test_space_substitutions() {
        let variations = expand("A B");
        for expected in ["A B", "A.B", "A_B", "A-B", "AB"] {
            assert!(variations.contains(expected), "missing {}", expected);
        }
        for expected in ["a b", "a.b", "a_b", "a-b", "ab"] {
            assert!(variations.contains(expected), "missing {}", expected);
        }
        assert!(variations.len() >= 6);
    }

    #[test]
    fn test_dot_substitutions() {
        let variations = expand("j.doe");
        for expected in ["j.doe", "jdoe", "j_doe", "j-doe", "j doe"] {
            assert!(variations.contains(expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_plain_name_is_singleton_plus_lowercase() {
        assert_eq!(expand("octocat").len(), 1);
        let variations = expand("OctoCat");
        assert_eq!(variations.len(), 2);
        assert!(variations.contains("octocat"));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(expand("Jane.Q Public"), expand("Jane.Q Public"));
        let identity = Identity::new("Jane Doe");
        assert_eq!(identity.input(), "Jane Doe");
        assert_eq!(identity.variations(), &expand("Jane Doe"));
    }
}
