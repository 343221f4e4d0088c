//! Ontological category keyword table
//!
//! The single source for the category→keywords mapping. Both the ESS-02
//! check in the validator and the category guidance in the generation
//! prompts read from here; the lists must not be duplicated elsewhere.

use crate::rules::OntologicalCategory;

/// Keyword sets per ontological category, in deterministic category order.
///
/// A definition text "matches" a category when at least one of its keywords
/// occurs in the text. Matching is done on NFC-normalized, lowercased text.
pub fn category_keywords() -> &'static [(OntologicalCategory, &'static [&'static str])] {
    &[
        (
            OntologicalCategory::Type,
            &["soort", "type", "categorie", "klasse", "vorm van"],
        ),
        (
            OntologicalCategory::Exemplaar,
            &[
                "exemplaar",
                "individueel",
                "afzonderlijk geval",
                "concreet geval",
                "specifieke instantie",
            ],
        ),
        (
            OntologicalCategory::Proces,
            &[
                "proces",
                "procedure",
                "activiteit",
                "handeling",
                "werkwijze",
                "verrichting",
            ],
        ),
        (
            OntologicalCategory::Resultaat,
            &[
                "resultaat",
                "uitkomst",
                "besluit",
                "beschikking",
                "vastlegging",
                "opbrengst",
            ],
        ),
    ]
}

/// Keywords for one category, used by prompt guidance.
pub fn keywords_for(categorie: OntologicalCategory) -> &'static [&'static str] {
    category_keywords()
        .iter()
        .find(|(cat, _)| *cat == categorie)
        .map(|(_, words)| *words)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_keywords() {
        for cat in OntologicalCategory::all() {
            assert!(
                !keywords_for(*cat).is_empty(),
                "category {} has no keywords",
                cat
            );
        }
    }

    #[test]
    fn test_keywords_are_lowercase() {
        for (_, words) in category_keywords() {
            for w in *words {
                assert_eq!(*w, w.to_lowercase(), "keyword '{}' must be lowercase", w);
            }
        }
    }

    #[test]
    fn test_no_keyword_shared_between_categories() {
        let mut seen = std::collections::HashSet::new();
        for (_, words) in category_keywords() {
            for w in *words {
                assert!(seen.insert(*w), "keyword '{}' appears in two categories", w);
            }
        }
    }
}
