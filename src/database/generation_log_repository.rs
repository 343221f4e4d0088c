//! Generation Log Repository
//!
//! Audit trail of iteration-loop runs: one row per orchestrated generation,
//! carrying the per-iteration trace as JSON. Feeds the statistics view and
//! later analysis of prompt effectiveness.

use chrono::{DateTime, Utc};
use da_agentic::{IterationReport, IterationTrace};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::{RepositoryError, RepositoryResult};

/// Raw database row.
#[derive(Debug, Clone, FromRow)]
struct LogRow {
    log_id: String,
    begrip: String,
    definition_id: Option<String>,
    success: bool,
    outcome: Option<String>,
    total_iterations: i64,
    final_score: Option<f64>,
    iterations: String,
    model_used: Option<String>,
    total_input_tokens: i64,
    total_output_tokens: i64,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

/// One generation run as stored.
#[derive(Debug, Clone)]
pub struct GenerationLogRow {
    pub log_id: Uuid,
    pub begrip: String,
    pub definition_id: Option<Uuid>,
    pub success: bool,
    pub outcome: Option<String>,
    pub total_iterations: i64,
    pub final_score: Option<f64>,
    pub iterations: Vec<IterationTrace>,
    pub model_used: Option<String>,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<LogRow> for GenerationLogRow {
    type Error = RepositoryError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        let log_id = Uuid::parse_str(&row.log_id)
            .map_err(|e| RepositoryError::InvalidRow(format!("log_id '{}': {}", row.log_id, e)))?;
        let definition_id = row
            .definition_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| RepositoryError::InvalidRow(format!("definition_id: {}", e)))?;
        let iterations = serde_json::from_str(&row.iterations)?;

        Ok(GenerationLogRow {
            log_id,
            begrip: row.begrip,
            definition_id,
            success: row.success,
            outcome: row.outcome,
            total_iterations: row.total_iterations,
            final_score: row.final_score,
            iterations,
            model_used: row.model_used,
            total_input_tokens: row.total_input_tokens,
            total_output_tokens: row.total_output_tokens,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

/// Summary statistics over completed runs.
#[derive(Debug, Clone, FromRow)]
pub struct GenerationStatsSummary {
    pub total_runs: i64,
    /// NULL when no completed runs exist yet
    pub accepted: Option<i64>,
    pub avg_iterations: Option<f64>,
    pub avg_final_score: Option<f64>,
    pub total_input_tokens: Option<i64>,
    pub total_output_tokens: Option<i64>,
}

const SELECT_COLUMNS: &str = "log_id, begrip, definition_id, success, outcome, total_iterations, \
     final_score, iterations, model_used, total_input_tokens, total_output_tokens, \
     created_at, completed_at";

/// Repository for generation log operations
pub struct GenerationLogRepository {
    pool: SqlitePool,
}

impl GenerationLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS generatie_log (
                log_id TEXT PRIMARY KEY,
                begrip TEXT NOT NULL,
                definition_id TEXT,
                success INTEGER NOT NULL DEFAULT 0,
                outcome TEXT,
                total_iterations INTEGER NOT NULL DEFAULT 0,
                final_score REAL,
                iterations TEXT NOT NULL DEFAULT '[]',
                model_used TEXT,
                total_input_tokens INTEGER NOT NULL DEFAULT 0,
                total_output_tokens INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                completed_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Open a log entry before the loop starts; returns the log id.
    pub async fn start_log(
        &self,
        begrip: &str,
        model_used: Option<&str>,
    ) -> RepositoryResult<Uuid> {
        let log_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO generatie_log (log_id, begrip, model_used, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(log_id.to_string())
        .bind(begrip)
        .bind(model_used)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(log_id)
    }

    /// Record the finished run on an open log entry.
    pub async fn complete(
        &self,
        log_id: Uuid,
        report: &IterationReport,
        definition_id: Option<Uuid>,
    ) -> RepositoryResult<()> {
        let iterations = serde_json::to_string(&report.iterations)?;
        let outcome = serde_json::to_value(report.outcome)?
            .as_str()
            .unwrap_or("unknown")
            .to_string();

        sqlx::query(
            r#"
            UPDATE generatie_log
            SET success = ?2,
                outcome = ?3,
                total_iterations = ?4,
                final_score = ?5,
                iterations = ?6,
                definition_id = ?7,
                total_input_tokens = ?8,
                total_output_tokens = ?9,
                completed_at = ?10
            WHERE log_id = ?1
            "#,
        )
        .bind(log_id.to_string())
        .bind(report.accepted)
        .bind(outcome)
        .bind(report.iterations.len() as i64)
        .bind(report.validation.overall_score)
        .bind(iterations)
        .bind(definition_id.map(|id| id.to_string()))
        .bind(i64::from(report.total_usage.input_tokens))
        .bind(i64::from(report.total_usage.output_tokens))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Close a log entry for a run that produced no candidate at all.
    pub async fn mark_failed(&self, log_id: Uuid) -> RepositoryResult<()> {
        sqlx::query(
            "UPDATE generatie_log SET success = 0, completed_at = ?2 WHERE log_id = ?1",
        )
        .bind(log_id.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, log_id: Uuid) -> RepositoryResult<Option<GenerationLogRow>> {
        let row: Option<LogRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM generatie_log WHERE log_id = ?1"
        ))
        .bind(log_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(GenerationLogRow::try_from).transpose()
    }

    pub async fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<GenerationLogRow>> {
        let rows: Vec<LogRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM generatie_log ORDER BY created_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(GenerationLogRow::try_from).collect()
    }

    pub async fn stats_summary(&self) -> RepositoryResult<Option<GenerationStatsSummary>> {
        let summary: Option<GenerationStatsSummary> = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) as total_runs,
                SUM(CASE WHEN success THEN 1 ELSE 0 END) as accepted,
                AVG(total_iterations * 1.0) as avg_iterations,
                AVG(final_score) as avg_final_score,
                SUM(total_input_tokens) as total_input_tokens,
                SUM(total_output_tokens) as total_output_tokens
            FROM generatie_log
            WHERE completed_at IS NOT NULL
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(summary)
    }
}
