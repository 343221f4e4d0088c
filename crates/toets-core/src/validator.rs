//! Rule interpreter
//!
//! Evaluates a candidate definition text against the full toetsregel set and
//! produces a scored `ValidationResult`. The validator never raises for bad
//! content: empty or malformed text comes back as violations with dedicated
//! codes. Only rule-compilation problems are errors.
//!
//! Patterns are compiled once at construction; the validator is cheap to
//! call repeatedly and shares the rule store immutably.

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::error::{RuleStoreError, RuleStoreResult};
use crate::keywords::category_keywords;
use crate::rules::{OntologicalCategory, RuleCheck, Severity, StructureCheck};
use crate::store::RuleStore;
use crate::validation::{ValidationContext, ValidationResult, Violation};
use crate::{CODE_EMPTY, CODE_TOO_LONG, CODE_TOO_SHORT};

/// Minimum word count before VAL-LEN-001 is raised.
const MIN_WORDS: usize = 3;
/// Maximum character count before VAL-LEN-002 is raised.
const MAX_CHARS: usize = 500;

enum CompiledCheck {
    /// (original pattern, compiled matcher) pairs in declared order
    Forbidden(Vec<(String, Regex)>),
    Required(Vec<Regex>),
    Structure(StructureCheck),
    CategoryExplicit,
}

struct CompiledRule {
    rule_index: usize,
    check: CompiledCheck,
}

/// Evaluates definition texts against a shared rule store.
pub struct Validator {
    store: Arc<RuleStore>,
    compiled: Vec<CompiledRule>,
    category_matchers: Vec<(OntologicalCategory, Vec<Regex>)>,
}

impl Validator {
    /// Compile all rule patterns against the given store.
    pub fn new(store: Arc<RuleStore>) -> RuleStoreResult<Self> {
        let mut compiled = Vec::with_capacity(store.rules().len());
        for (rule_index, rule) in store.rules().iter().enumerate() {
            let check = match &rule.check {
                RuleCheck::ForbiddenPattern { patterns } => {
                    let mut matchers = Vec::with_capacity(patterns.len());
                    for pattern in patterns {
                        matchers.push((pattern.clone(), compile_phrase(&rule.code, pattern)?));
                    }
                    CompiledCheck::Forbidden(matchers)
                }
                RuleCheck::RequiredElement { indicators } => {
                    let mut matchers = Vec::with_capacity(indicators.len());
                    for indicator in indicators {
                        matchers.push(compile_phrase(&rule.code, indicator)?);
                    }
                    CompiledCheck::Required(matchers)
                }
                RuleCheck::Structure { check } => CompiledCheck::Structure(check.clone()),
                RuleCheck::CategoryExplicit => CompiledCheck::CategoryExplicit,
            };
            compiled.push(CompiledRule { rule_index, check });
        }

        let mut category_matchers = Vec::new();
        for (categorie, words) in category_keywords() {
            let mut matchers = Vec::with_capacity(words.len());
            for word in *words {
                matchers.push(compile_phrase("ESS-02", word)?);
            }
            category_matchers.push((*categorie, matchers));
        }

        Ok(Self {
            store,
            compiled,
            category_matchers,
        })
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Validate one definition text.
    ///
    /// Deterministic: identical (context, text, rule set) always yields the
    /// same result with violations sorted by rule code.
    pub fn validate(&self, ctx: &ValidationContext, text: &str) -> ValidationResult {
        let normalized = normalize(text);
        let trimmed = normalized.trim();

        if trimmed.is_empty() {
            // Nothing to evaluate; every category fails outright.
            let category_scores = self
                .store
                .categories()
                .into_iter()
                .map(|c| (c, 0.0))
                .collect();
            return ValidationResult {
                overall_score: 0.0,
                category_scores,
                violations: vec![Violation::new(
                    CODE_EMPTY,
                    None,
                    Severity::Error,
                    "Definitietekst is leeg.",
                )],
            };
        }

        let mut violations = Vec::new();

        let word_count = trimmed.split_whitespace().count();
        if word_count < MIN_WORDS {
            violations.push(
                Violation::new(
                    CODE_TOO_SHORT,
                    None,
                    Severity::Error,
                    "Definitietekst is te kort om een begrip af te bakenen.",
                )
                .with_detail(format!("{} woorden, minimaal {}", word_count, MIN_WORDS)),
            );
        }
        if text.chars().count() > MAX_CHARS {
            violations.push(
                Violation::new(
                    CODE_TOO_LONG,
                    None,
                    Severity::High,
                    "Definitietekst is te lang; beperk de definitie tot de kern.",
                )
                .with_detail(format!(
                    "{} tekens, maximaal {}",
                    text.chars().count(),
                    MAX_CHARS
                )),
            );
        }

        for compiled in &self.compiled {
            let rule = &self.store.rules()[compiled.rule_index];
            let violation = match &compiled.check {
                CompiledCheck::Forbidden(matchers) => {
                    let matched: Vec<&str> = matchers
                        .iter()
                        .filter(|(_, re)| re.is_match(trimmed))
                        .map(|(pattern, _)| pattern.as_str())
                        .collect();
                    if matched.is_empty() {
                        None
                    } else {
                        Some(
                            Violation::new(
                                &rule.code,
                                Some(rule.categorie),
                                rule.severity,
                                &rule.beschrijving,
                            )
                            .with_detail(format!("aangetroffen: {}", matched.join(", "))),
                        )
                    }
                }
                CompiledCheck::Required(matchers) => {
                    if matchers.iter().any(|re| re.is_match(trimmed)) {
                        None
                    } else {
                        Some(Violation::new(
                            &rule.code,
                            Some(rule.categorie),
                            rule.severity,
                            &rule.beschrijving,
                        ))
                    }
                }
                CompiledCheck::Structure(check) => {
                    self.check_structure(check, ctx, trimmed, word_count).map(|detail| {
                        Violation::new(
                            &rule.code,
                            Some(rule.categorie),
                            rule.severity,
                            &rule.beschrijving,
                        )
                        .with_detail(detail)
                    })
                }
                CompiledCheck::CategoryExplicit => self.check_category(ctx, trimmed, rule),
            };
            if let Some(v) = violation {
                violations.push(v);
            }
        }

        violations.sort_by(|a, b| a.code.cmp(&b.code));
        debug!(
            begrip = %ctx.begrip,
            violations = violations.len(),
            "validated definition text"
        );
        self.score(violations)
    }

    fn check_structure(
        &self,
        check: &StructureCheck,
        ctx: &ValidationContext,
        trimmed: &str,
        word_count: usize,
    ) -> Option<String> {
        match check {
            StructureCheck::SingleSentence { min_words } => {
                let sentences = sentence_count(trimmed);
                if sentences != 1 {
                    Some(format!("{} zinnen aangetroffen", sentences))
                } else if word_count < *min_words {
                    Some(format!("{} woorden, minimaal {}", word_count, min_words))
                } else {
                    None
                }
            }
            StructureCheck::ForbiddenStart { words } => {
                let first = trimmed.split_whitespace().next().unwrap_or("");
                let first = first.trim_matches(|c: char| !c.is_alphanumeric());
                if words.iter().any(|w| w == first) {
                    Some(format!("begint met '{}'", first))
                } else {
                    None
                }
            }
            StructureCheck::NotCircular => {
                let begrip = normalize(&ctx.begrip);
                let begrip = begrip.trim();
                if begrip.is_empty() {
                    return None;
                }
                match compile_phrase("SAM-01", begrip) {
                    Ok(re) if re.is_match(trimmed) => {
                        Some(format!("begrip '{}' komt voor in de definitie", begrip))
                    }
                    _ => None,
                }
            }
        }
    }

    /// ESS-02: an explicit marker short-circuits to pass; otherwise exactly
    /// one category keyword set must match.
    fn check_category(
        &self,
        ctx: &ValidationContext,
        trimmed: &str,
        rule: &crate::rules::ValidationRule,
    ) -> Option<Violation> {
        if ctx.categorie_marker.is_some() {
            return None;
        }

        let matched: Vec<OntologicalCategory> = self
            .category_matchers
            .iter()
            .filter(|(_, matchers)| matchers.iter().any(|re| re.is_match(trimmed)))
            .map(|(categorie, _)| *categorie)
            .collect();

        match matched.len() {
            1 => None,
            0 => Some(Violation::new(
                &rule.code,
                Some(rule.categorie),
                rule.severity,
                &rule.beschrijving,
            )),
            _ => {
                let names: Vec<&str> = matched.iter().map(|c| c.as_str()).collect();
                Some(
                    Violation::new(
                        &rule.code,
                        Some(rule.categorie),
                        Severity::High,
                        "De definitie wijst op meerdere ontologische categorieën tegelijk.",
                    )
                    .with_detail(format!("kandidaten: {}", names.join(", "))),
                )
            }
        }
    }

    fn score(&self, violations: Vec<Violation>) -> ValidationResult {
        let mut overall: f64 = 1.0;
        let mut category_scores: BTreeMap<_, f64> = self
            .store
            .categories()
            .into_iter()
            .map(|c| (c, 1.0))
            .collect();

        for violation in &violations {
            overall -= violation.severity.weight();
            if let Some(categorie) = violation.categorie {
                if let Some(score) = category_scores.get_mut(&categorie) {
                    *score -= violation.severity.weight();
                }
            }
        }

        for score in category_scores.values_mut() {
            *score = score.clamp(0.0, 1.0);
        }

        ValidationResult {
            overall_score: overall.clamp(0.0, 1.0),
            category_scores,
            violations,
        }
    }
}

/// NFC-normalize and lowercase; all matching runs on this form.
fn normalize(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}

/// Count sentences by terminator; consecutive terminators count once.
fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|segment| !segment.trim().is_empty())
        .count()
}

/// Compile a phrase into a word-bounded, whitespace-tolerant matcher.
fn compile_phrase(code: &str, phrase: &str) -> RuleStoreResult<Regex> {
    let words: Vec<String> = phrase
        .trim()
        .split_whitespace()
        .map(regex::escape)
        .collect();
    let mut pattern = words.join(r"\s+");
    let starts_word = phrase
        .trim()
        .chars()
        .next()
        .map(|c| c.is_alphanumeric())
        .unwrap_or(false);
    let ends_word = phrase
        .trim()
        .chars()
        .last()
        .map(|c| c.is_alphanumeric())
        .unwrap_or(false);
    if starts_word {
        pattern = format!(r"\b{}", pattern);
    }
    if ends_word {
        pattern = format!(r"{}\b", pattern);
    }
    Regex::new(&pattern).map_err(|e| RuleStoreError::Pattern {
        code: code.to_string(),
        source: Box::new(e),
    })
}
