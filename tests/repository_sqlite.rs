#![cfg(feature = "database")]

//! SQLite repository tests on an in-memory database: duplicate policy,
//! soft-delete archiving, version bumps, and the generation audit log.

use std::collections::BTreeMap;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use definitie_agent::database::{DefinitionRepository, GenerationLogRepository};
use definitie_agent::error::RepositoryError;
use definitie_agent::models::{DefinitionStatus, NewDefinition};
use da_agentic::{
    GeneratedDefinition, IterationOutcome, IterationReport, IterationTrace, TokenUsage,
};
use toets_core::{OntologicalCategory, ValidationResult};

async fn pool() -> SqlitePool {
    // A single connection keeps every query on the same in-memory database.
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

fn new_definition(begrip: &str) -> NewDefinition {
    NewDefinition {
        begrip: begrip.to_string(),
        definitie: "besluit waarmee een bevoegd gezag een specifieke gedraging toestaat"
            .to_string(),
        categorie: Some(OntologicalCategory::Resultaat),
        organisatorische_context: "Gemeente Utrecht".to_string(),
        juridische_context: Some("Omgevingswet".to_string()),
        voorbeelden: vec!["kapvergunning".to_string()],
    }
}

#[tokio::test]
async fn create_and_get_roundtrip() {
    let repo = DefinitionRepository::new(pool().await);
    repo.init_schema().await.unwrap();

    let created = repo.create(new_definition("vergunning"), false).await.unwrap();
    assert_eq!(created.status, DefinitionStatus::Draft);
    assert_eq!(created.version_number, 1);
    assert_eq!(created.voorbeelden, vec!["kapvergunning"]);

    let fetched = repo.get(created.id).await.unwrap();
    assert_eq!(fetched.begrip, "vergunning");
    assert_eq!(fetched.categorie, Some(OntologicalCategory::Resultaat));
}

#[tokio::test]
async fn duplicate_create_raises_then_succeeds_with_flag() {
    let repo = DefinitionRepository::new(pool().await);
    repo.init_schema().await.unwrap();

    let first = repo.create(new_definition("vergunning"), false).await.unwrap();

    // Identical key without the flag: recoverable duplicate error.
    let err = repo
        .create(new_definition("vergunning"), false)
        .await
        .unwrap_err();
    match err {
        RepositoryError::DuplicateDefinition { begrip, existing_id } => {
            assert_eq!(begrip, "vergunning");
            assert_eq!(existing_id, first.id);
        }
        other => panic!("expected DuplicateDefinition, got {other:?}"),
    }

    // With the flag both rows coexist: no UNIQUE constraint underneath.
    let second = repo.create(new_definition("vergunning"), true).await.unwrap();
    assert_ne!(first.id, second.id);

    let duplicates = repo
        .find_duplicates(
            "Vergunning",
            "Gemeente Utrecht",
            Some("Omgevingswet"),
            Some(OntologicalCategory::Resultaat),
        )
        .await
        .unwrap();
    assert_eq!(duplicates.len(), 2);
}

#[tokio::test]
async fn differing_context_is_not_a_duplicate() {
    let repo = DefinitionRepository::new(pool().await);
    repo.init_schema().await.unwrap();

    repo.create(new_definition("vergunning"), false).await.unwrap();

    let mut other_context = new_definition("vergunning");
    other_context.juridische_context = None;
    // Different juridische_context: allowed without the flag.
    repo.create(other_context, false).await.unwrap();
}

#[tokio::test]
async fn archived_rows_leave_duplicate_detection() {
    let repo = DefinitionRepository::new(pool().await);
    repo.init_schema().await.unwrap();

    let first = repo.create(new_definition("vergunning"), false).await.unwrap();
    repo.archive(first.id).await.unwrap();

    // The archived row no longer blocks creation.
    repo.create(new_definition("vergunning"), false).await.unwrap();

    let archived = repo.get(first.id).await.unwrap();
    assert!(archived.is_archived());
}

#[tokio::test]
async fn update_bumps_version_and_clears_validation() {
    let repo = DefinitionRepository::new(pool().await);
    repo.init_schema().await.unwrap();

    let created = repo.create(new_definition("vergunning"), false).await.unwrap();
    repo.attach_validation(created.id, &sample_validation(0.9))
        .await
        .unwrap();
    assert_eq!(
        repo.get(created.id).await.unwrap().validation_score,
        Some(0.9)
    );

    let updated = repo
        .update_definition(created.id, "besluit met een aangepaste omschrijving van de gedraging")
        .await
        .unwrap();
    assert_eq!(updated.version_number, 2);
    assert_eq!(updated.validation_score, None);
}

#[tokio::test]
async fn missing_definition_is_not_found() {
    let repo = DefinitionRepository::new(pool().await);
    repo.init_schema().await.unwrap();

    let err = repo.get(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(_)));
}

#[tokio::test]
async fn generation_log_roundtrip_and_stats() {
    let shared = pool().await;
    let log = GenerationLogRepository::new(shared.clone());
    log.init_schema().await.unwrap();

    let log_id = log.start_log("vergunning", Some("gpt-4o")).await.unwrap();
    let open = log.get_by_id(log_id).await.unwrap().unwrap();
    assert!(open.completed_at.is_none());

    log.complete(log_id, &sample_report(), None).await.unwrap();

    let completed = log.get_by_id(log_id).await.unwrap().unwrap();
    assert!(completed.success);
    assert_eq!(completed.outcome.as_deref(), Some("accepted"));
    assert_eq!(completed.total_iterations, 1);
    assert_eq!(completed.iterations.len(), 1);
    assert_eq!(completed.total_input_tokens, 200);

    let stats = log.stats_summary().await.unwrap().unwrap();
    assert_eq!(stats.total_runs, 1);
    assert_eq!(stats.accepted, Some(1));

    let recent = log.list_recent(10).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].begrip, "vergunning");
}

fn sample_validation(score: f64) -> ValidationResult {
    ValidationResult {
        overall_score: score,
        category_scores: BTreeMap::new(),
        violations: Vec::new(),
    }
}

fn sample_report() -> IterationReport {
    let usage = TokenUsage {
        input_tokens: 200,
        output_tokens: 80,
    };
    IterationReport {
        definitie: GeneratedDefinition {
            definitie: "besluit waarmee een bevoegd gezag een specifieke gedraging toestaat"
                .to_string(),
            voorbeelden: vec!["kapvergunning".to_string()],
            usage,
        },
        validation: sample_validation(1.0),
        accepted: true,
        outcome: IterationOutcome::Accepted,
        iterations: vec![IterationTrace {
            iteration: 1,
            timestamp: chrono::Utc::now(),
            overall_score: 1.0,
            critical_violations: 0,
            high_violations: 0,
            medium_violations: 0,
            low_violations: 0,
            feedback: Vec::new(),
            usage,
        }],
        total_usage: usage,
    }
}
