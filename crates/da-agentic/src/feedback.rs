//! Feedback Builder
//!
//! Translates validator violations into a short, prioritized list of
//! instructions for the next generation attempt. At most five items per
//! round, deduplicated against a FIFO history of the last ten issued
//! messages, with phrasing that escalates as rounds go by.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use toets_core::{Severity, Violation};

/// Maximum number of feedback items per round.
pub const MAX_FEEDBACK_ITEMS: usize = 5;
/// Maximum number of previously-issued messages remembered for dedup.
pub const MAX_HISTORY: usize = 10;

/// Kind of feedback, in priority order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Critical,
    Suggestion,
    Improvement,
}

impl FeedbackKind {
    fn from_severity(severity: Severity) -> Self {
        match severity {
            Severity::Error | Severity::Critical => FeedbackKind::Critical,
            Severity::High => FeedbackKind::Suggestion,
            Severity::Medium | Severity::Low => FeedbackKind::Improvement,
        }
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackKind::Critical => write!(f, "critical"),
            FeedbackKind::Suggestion => write!(f, "suggestion"),
            FeedbackKind::Improvement => write!(f, "improvement"),
        }
    }
}

/// One feedback item for the next generation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub kind: FeedbackKind,
    /// The originating violation code
    pub code: String,
    pub message: String,
}

/// Fixed instruction per rule code. Unmapped codes fall back to the
/// violation's own message.
fn instruction_for(code: &str) -> Option<&'static str> {
    Some(match code {
        "ESS-01" => "Beschrijf WAT het begrip is, niet waarvoor het dient.",
        "ESS-02" => "Maak expliciet of het begrip een type, exemplaar, proces of resultaat is.",
        "ESS-03" => "Noem het kenmerk dat het begrip onderscheidt van verwante begrippen.",
        "STR-01" => "Begin de definitie met het kernzelfstandignaamwoord.",
        "STR-02" => "Verplaats voorbeelden en opsommingen naar de toelichting.",
        "CON-01" => "Formuleer organisatie-onafhankelijk, zonder 'wij' of 'onze'.",
        "CON-02" => "Vermijd tijdgebonden formuleringen als 'momenteel' of 'huidige'.",
        "INT-01" => "Formuleer de definitie als één volzin van ten minste vijf woorden.",
        "INT-03" => "Vervang onbepaalde verwijswoorden door een expliciete benoeming.",
        "SAM-01" => "Gebruik het begrip zelf niet in de definitietekst.",
        "SAM-02" => "Vervang 'en/of' door een eenduidige formulering.",
        "ARAI-01" => "Beschrijf het begrip zonder voorschrijvende bewoordingen.",
        "VER-01" => "Laat verwijzingen naar artikelen of documenten weg.",
        "VAL-EMP-001" => "Lever een niet-lege definitietekst.",
        "VAL-LEN-001" => "Werk de definitie uit tot een volwaardige volzin.",
        "VAL-LEN-002" => "Kort de definitie in tot de kern van het begrip.",
        _ => return None,
    })
}

/// Escalate phrasing by feedback round: a direct instruction first, an
/// alternative framing the second time, restructure advice from then on.
fn escalate(instruction: &str, round: usize) -> String {
    match round {
        0 | 1 => instruction.to_string(),
        2 => format!(
            "Het punt is nog steeds aanwezig. Probeer een andere formulering: {}",
            instruction
        ),
        _ => format!(
            "Overweeg de definitie volledig te herstructureren. {}",
            instruction
        ),
    }
}

/// Builds prioritized feedback across iteration rounds.
///
/// One builder instance lives for the duration of one iteration loop; the
/// history does not survive the loop.
#[derive(Debug, Default)]
pub struct FeedbackBuilder {
    history: VecDeque<String>,
}

impl FeedbackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build at most [`MAX_FEEDBACK_ITEMS`] items from the violations of the
    /// previous candidate. `round` is 1 for the first feedback round.
    pub fn build(&mut self, violations: &[Violation], round: usize) -> Vec<FeedbackItem> {
        let mut ordered: Vec<&Violation> = violations.iter().collect();
        // Most severe first; code order breaks ties deterministically.
        ordered.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.code.cmp(&b.code)));

        let mut items = Vec::new();
        for violation in ordered {
            if items.len() == MAX_FEEDBACK_ITEMS {
                break;
            }

            let instruction = match instruction_for(&violation.code) {
                Some(text) => escalate(text, round),
                None => format!(
                    "Los schending {} op: {}",
                    violation.code, violation.message
                ),
            };

            // A message surfaced in a recent round is suppressed; the
            // escalated rephrasing naturally re-admits persistent issues.
            if self.history.contains(&instruction) {
                continue;
            }

            self.remember(instruction.clone());
            items.push(FeedbackItem {
                kind: FeedbackKind::from_severity(violation.severity),
                code: violation.code.clone(),
                message: instruction,
            });
        }

        items
    }

    fn remember(&mut self, message: String) {
        if self.history.len() == MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(message);
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toets_core::RuleCategory;

    fn violation(code: &str, severity: Severity) -> Violation {
        Violation::new(code, Some(RuleCategory::Ess), severity, "msg")
    }

    #[test]
    fn test_cap_at_five_items() {
        let mut builder = FeedbackBuilder::new();
        let violations: Vec<Violation> = [
            ("ESS-01", Severity::Critical),
            ("ESS-02", Severity::Critical),
            ("ESS-03", Severity::High),
            ("STR-01", Severity::High),
            ("STR-02", Severity::Medium),
            ("CON-01", Severity::Medium),
            ("CON-02", Severity::Medium),
            ("INT-03", Severity::Medium),
        ]
        .iter()
        .map(|(c, s)| violation(c, *s))
        .collect();

        let items = builder.build(&violations, 1);
        assert_eq!(items.len(), MAX_FEEDBACK_ITEMS);
    }

    #[test]
    fn test_critical_first() {
        let mut builder = FeedbackBuilder::new();
        let violations = vec![
            violation("VER-01", Severity::Low),
            violation("ESS-01", Severity::Critical),
            violation("STR-01", Severity::High),
        ];
        let items = builder.build(&violations, 1);
        assert_eq!(items[0].code, "ESS-01");
        assert_eq!(items[0].kind, FeedbackKind::Critical);
        assert_eq!(items[1].code, "STR-01");
        assert_eq!(items[1].kind, FeedbackKind::Suggestion);
        assert_eq!(items[2].kind, FeedbackKind::Improvement);
    }

    #[test]
    fn test_same_round_phrasing_deduplicated() {
        let mut builder = FeedbackBuilder::new();
        let violations = vec![violation("ESS-01", Severity::Critical)];

        let first = builder.build(&violations, 1);
        assert_eq!(first.len(), 1);

        // Round 2 escalates, so the item returns with different phrasing.
        let second = builder.build(&violations, 2);
        assert_eq!(second.len(), 1);
        assert_ne!(first[0].message, second[0].message);

        // Rounds 3 and 4 share tier-3 phrasing; round 4 is suppressed.
        let third = builder.build(&violations, 3);
        assert_eq!(third.len(), 1);
        let fourth = builder.build(&violations, 4);
        assert!(fourth.is_empty());
    }

    #[test]
    fn test_unmapped_code_falls_back_to_message() {
        let mut builder = FeedbackBuilder::new();
        let violations = vec![Violation::new(
            "XXX-99",
            Some(RuleCategory::Con),
            Severity::Medium,
            "onbekende regel",
        )];
        let items = builder.build(&violations, 1);
        assert_eq!(items.len(), 1);
        assert!(items[0].message.contains("XXX-99"));
        assert!(items[0].message.contains("onbekende regel"));
    }

    #[test]
    fn test_history_is_fifo_bounded() {
        let mut builder = FeedbackBuilder::new();
        // Twelve distinct unmapped codes across rounds.
        for i in 0..12 {
            let violations = vec![Violation::new(
                format!("GEN-{:02}", i),
                None,
                Severity::Medium,
                format!("melding {}", i),
            )];
            builder.build(&violations, 1);
        }
        assert_eq!(builder.history_len(), MAX_HISTORY);
    }

    #[test]
    fn test_escalation_tiers() {
        let base = instruction_for("ESS-01").unwrap();
        assert_eq!(escalate(base, 1), base);
        assert!(escalate(base, 2).contains("andere formulering"));
        assert!(escalate(base, 3).contains("herstructureren"));
        assert_eq!(escalate(base, 3), escalate(base, 7));
    }
}
