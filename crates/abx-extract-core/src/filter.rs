//! Antimicrobial classification by ATC code.
//!
//! Antibiotics are listed by exact code, antifungals by code-group prefix
//! (e.g. `J02` covers `J02AC01`).

use std::collections::HashSet;

use crate::source::{CodeRepository, SourceResult};

/// Immutable antibiotic and antifungal code lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AntimicrobialCodeSet {
    antibiotics: HashSet<String>,
    antifungal_groups: Vec<String>,
}

impl AntimicrobialCodeSet {
    /// Build a code set from explicit lists.
    pub fn new<A, F>(antibiotics: A, antifungal_groups: F) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            antibiotics: antibiotics.into_iter().map(Into::into).collect(),
            antifungal_groups: antifungal_groups.into_iter().map(Into::into).collect(),
        }
    }

    /// Load both lists from a code repository.
    pub fn load(repository: &dyn CodeRepository) -> SourceResult<Self> {
        let set = Self::new(
            repository.antibiotic_codes()?,
            repository.antifungal_group_codes()?,
        );
        tracing::debug!(
            antibiotics = set.antibiotics.len(),
            antifungal_groups = set.antifungal_groups.len(),
            "Loaded antimicrobial code set"
        );
        Ok(set)
    }

    /// Check whether an ATC code denotes an antibiotic or antifungal.
    pub fn is_antimicrobial(&self, atc_code: &str) -> bool {
        if atc_code.is_empty() {
            return false;
        }
        self.antibiotics.contains(atc_code)
            || self
                .antifungal_groups
                .iter()
                .any(|group| atc_code.starts_with(group.as_str()))
    }

    pub fn antibiotic_count(&self) -> usize {
        self.antibiotics.len()
    }

    pub fn antifungal_group_count(&self) -> usize {
        self.antifungal_groups.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn code_set() -> AntimicrobialCodeSet {
        AntimicrobialCodeSet::new(["J01CA04", "J01DC02"], ["J02"])
    }

    #[test]
    fn test_exact_antibiotic_match() {
        let codes = code_set();
        assert!(codes.is_antimicrobial("J01CA04"));
        // Antibiotics are exact, not prefixes
        assert!(!codes.is_antimicrobial("J01CA"));
        assert!(!codes.is_antimicrobial("J01CA041"));
    }

    #[test]
    fn test_antifungal_prefix_match() {
        let codes = code_set();
        assert!(codes.is_antimicrobial("J02AC01"));
        assert!(codes.is_antimicrobial("J02"));
        assert!(!codes.is_antimicrobial("J05AB01"));
    }

    #[test]
    fn test_empty_code_rejected() {
        let codes = code_set();
        assert!(!codes.is_antimicrobial(""));
    }

    #[test]
    fn test_empty_sets_reject_everything() {
        let codes = AntimicrobialCodeSet::default();
        assert!(!codes.is_antimicrobial("J01CA04"));
    }

    proptest! {
        #[test]
        fn prop_matches_definition(
            antibiotics in prop::collection::vec("[A-Z][0-9]{2}[A-Z]{0,2}[0-9]{0,2}", 0..6),
            groups in prop::collection::vec("[A-Z][0-9]{2}[A-Z]?", 0..4),
            code in "[A-Z]?[0-9]{0,2}[A-Z]{0,2}[0-9]{0,2}",
        ) {
            let codes = AntimicrobialCodeSet::new(antibiotics.clone(), groups.clone());
            let expected = !code.is_empty()
                && (antibiotics.contains(&code) || groups.iter().any(|g| code.starts_with(g.as_str())));
            prop_assert_eq!(codes.is_antimicrobial(&code), expected);
        }
    }
}
