//! End-to-end iteration loop tests against a scripted LLM client: the
//! stagnation stop, the iteration bound, and feedback propagation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use definitie_agent::agentic::{
    IterationConfig, IterationController, IterationOutcome, LlmClient,
};
use da_agentic::{ChatResponse, DefinitionGenerator, TokenUsage};
use toets_core::{RuleStore, ValidationContext, Validator};

struct ScriptedClient {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl ScriptedClient {
    fn new(texts: &[&str]) -> Arc<Self> {
        let responses = texts
            .iter()
            .map(|text| {
                serde_json::json!({ "definitie": text, "voorbeelden": [] }).to_string()
            })
            .collect();
        Arc::new(Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(0),
        })
    }

    fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn pop(&self) -> Result<ChatResponse> {
        *self.calls.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .map(|text| ChatResponse {
                text,
                usage: TokenUsage {
                    input_tokens: 200,
                    output_tokens: 60,
                },
            })
            .ok_or_else(|| anyhow!("script exhausted"))
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat(&self, _system: &str, _user: &str) -> Result<ChatResponse> {
        self.pop()
    }

    async fn chat_json(&self, _system: &str, _user: &str) -> Result<ChatResponse> {
        self.pop()
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

fn controller_with(client: Arc<ScriptedClient>, config: IterationConfig) -> IterationController {
    let validator = Validator::new(Arc::new(RuleStore::builtin())).unwrap();
    IterationController::new(DefinitionGenerator::with_client(client), validator, config)
}

// Misses the category keyword, the distinguishing indicator, and contains a
// time-bound word: 1.0 - 0.40 - 0.25 - 0.15 = 0.20.
const FIRST: &str = "schriftelijke toestemming van het bevoegd gezag die momenteel geldt";
// Same minus the time-bound word: 0.35. Improvement 0.15.
const SECOND: &str = "schriftelijke toestemming van het bevoegd gezag voor een gedraging";

#[tokio::test]
async fn stagnation_stops_after_two_iterations_and_returns_the_better_candidate() {
    let client = ScriptedClient::new(&[FIRST, SECOND, SECOND]);
    // Threshold chosen above the 0.15 improvement so iteration 2 stagnates.
    let config = IterationConfig {
        improvement_threshold: 0.2,
        ..Default::default()
    };
    let controller = controller_with(client.clone(), config);

    let report = controller
        .run(&ValidationContext::for_begrip("vergunning"))
        .await
        .unwrap();

    assert_eq!(report.outcome, IterationOutcome::Stagnated);
    assert_eq!(report.iterations.len(), 2);
    assert_eq!(client.call_count(), 2);
    // The second candidate scored higher and is returned as best.
    assert_eq!(report.definitie.definitie, SECOND);
    assert!(report.validation.overall_score >= report.iterations[0].overall_score);
    assert!(!report.accepted);
}

#[tokio::test]
async fn loop_never_runs_more_than_max_iterations() {
    let client = ScriptedClient::new(&[FIRST, SECOND, FIRST, SECOND, FIRST]);
    let config = IterationConfig {
        max_iterations: 3,
        improvement_threshold: -1.0,
        ..Default::default()
    };
    let controller = controller_with(client.clone(), config);

    let report = controller
        .run(&ValidationContext::for_begrip("vergunning"))
        .await
        .unwrap();

    assert_eq!(report.outcome, IterationOutcome::MaxIterationsReached);
    assert_eq!(client.call_count(), 3);
    assert_eq!(report.iterations.len(), 3);
}

#[tokio::test]
async fn feedback_for_the_next_round_is_attached_and_capped() {
    let client = ScriptedClient::new(&[FIRST, SECOND]);
    let config = IterationConfig {
        improvement_threshold: 0.2,
        ..Default::default()
    };
    let controller = controller_with(client, config);

    let report = controller
        .run(&ValidationContext::for_begrip("vergunning"))
        .await
        .unwrap();

    let first_trace = &report.iterations[0];
    assert!(!first_trace.feedback.is_empty());
    assert!(first_trace.feedback.len() <= 5);
    // Critical issues lead the list.
    assert_eq!(
        first_trace.feedback[0].kind,
        definitie_agent::agentic::FeedbackKind::Critical
    );
    // Token usage accumulates across both calls.
    assert_eq!(report.total_usage.input_tokens, 400);
}
