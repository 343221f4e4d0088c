//! Contract tests for the validator: empty input, forbidden goal-phrasing,
//! marker override, determinism, and the acceptance gate.

use std::sync::Arc;

use toets_core::{
    OntologicalCategory, RuleStore, Severity, ValidationContext, Validator, CODE_EMPTY,
};

fn validator() -> Validator {
    Validator::new(Arc::new(RuleStore::builtin())).unwrap()
}

#[test]
fn empty_text_yields_zero_score_and_emp_violation() {
    let v = validator();
    let ctx = ValidationContext::for_begrip("vergunning");

    let result = v.validate(&ctx, "");

    assert_eq!(result.overall_score, 0.0);
    let emp = result
        .violations
        .iter()
        .find(|vi| vi.code == CODE_EMPTY)
        .expect("VAL-EMP-001 expected");
    assert_eq!(emp.severity, Severity::Error);
}

#[test]
fn goal_phrasing_triggers_critical_ess01_and_lowers_category_score() {
    let v = validator();
    let ctx = ValidationContext::for_begrip("vergunning");

    let result = v.validate(
        &ctx,
        "besluit om te identificeren welke specifieke gedraging is toegestaan",
    );

    let ess01 = result
        .violations
        .iter()
        .find(|vi| vi.code == "ESS-01")
        .expect("ESS-01 expected");
    assert_eq!(ess01.severity, Severity::Critical);
    assert!(result.overall_score < 1.0);
    let ess_score = result
        .category_scores
        .get(&toets_core::RuleCategory::Ess)
        .unwrap();
    assert!(*ess_score < 1.0);
    // A critical violation blocks the gate no matter the score.
    assert!(!result.is_acceptable(0.0, 0.0));
}

#[test]
fn marker_override_passes_ess02_without_keywords() {
    let v = validator();
    let ctx = ValidationContext::for_begrip("inspectie")
        .with_marker(OntologicalCategory::Proces);

    // No category keyword appears anywhere in this text.
    let result = v.validate(
        &ctx,
        "controle waarbij een toezichthouder de naleving van specifieke voorschriften beoordeelt",
    );

    assert!(!result
        .violations
        .iter()
        .any(|vi| vi.code == "ESS-02"));
}

#[test]
fn without_marker_the_same_text_fails_ess02() {
    let v = validator();
    let ctx = ValidationContext::for_begrip("inspectie");

    let result = v.validate(
        &ctx,
        "controle waarbij een toezichthouder de naleving van specifieke voorschriften beoordeelt",
    );

    let ess02 = result
        .violations
        .iter()
        .find(|vi| vi.code == "ESS-02")
        .expect("ESS-02 expected without marker");
    assert_eq!(ess02.severity, Severity::Critical);
}

#[test]
fn repeated_validation_is_byte_identical() {
    let v = validator();
    let ctx = ValidationContext::for_begrip("vergunning");
    let text = "de toestemming om te bouwen zoals wij die momenteel verlenen";

    let first = v.validate(&ctx, text);
    let first_json = serde_json::to_string(&first).unwrap();
    for _ in 0..10 {
        let next = v.validate(&ctx, text);
        assert_eq!(serde_json::to_string(&next).unwrap(), first_json);
    }
}

#[test]
fn clean_definition_clears_the_gate() {
    let v = validator();
    let ctx = ValidationContext::for_begrip("vergunning");

    let result = v.validate(
        &ctx,
        "besluit waarmee een bevoegd gezag een specifieke gedraging van een aanvrager toestaat",
    );

    assert!(result.violations.is_empty(), "{:?}", result.violations);
    assert_eq!(result.overall_score, 1.0);
    assert!(result.is_acceptable(0.80, 0.75));
}
