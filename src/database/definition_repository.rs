//! Definition Repository
//!
//! Persists definitions with status and version fields. Duplicate detection
//! is an application-level advisory lookup: the former UNIQUE index on
//! (begrip, organisatorische_context, juridische_context, categorie) was
//! dropped, so duplicates can coexist once explicitly allowed.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use toets_core::{OntologicalCategory, ValidationResult};

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{Definition, DefinitionStatus, NewDefinition};

/// Raw database row; enums and JSON columns are stored as TEXT.
#[derive(Debug, Clone, FromRow)]
struct DefinitionRow {
    id: String,
    begrip: String,
    definitie: String,
    categorie: Option<String>,
    organisatorische_context: String,
    juridische_context: Option<String>,
    status: String,
    version_number: i64,
    validation_score: Option<f64>,
    validation_issues: Option<String>,
    voorbeelden: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DefinitionRow> for Definition {
    type Error = RepositoryError;

    fn try_from(row: DefinitionRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| RepositoryError::InvalidRow(format!("id '{}': {}", row.id, e)))?;
        let categorie = row
            .categorie
            .as_deref()
            .map(|s| {
                s.parse::<OntologicalCategory>()
                    .map_err(RepositoryError::InvalidRow)
            })
            .transpose()?;
        let status = row
            .status
            .parse::<DefinitionStatus>()
            .map_err(RepositoryError::InvalidRow)?;
        let validation_issues = row
            .validation_issues
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?
            .unwrap_or_default();
        let voorbeelden = row
            .voorbeelden
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?
            .unwrap_or_default();

        Ok(Definition {
            id,
            begrip: row.begrip,
            definitie: row.definitie,
            categorie,
            organisatorische_context: row.organisatorische_context,
            juridische_context: row.juridische_context,
            status,
            version_number: row.version_number,
            validation_score: row.validation_score,
            validation_issues,
            voorbeelden,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, begrip, definitie, categorie, organisatorische_context, \
     juridische_context, status, version_number, validation_score, validation_issues, \
     voorbeelden, created_at, updated_at";

/// Repository for definition CRUD operations
pub struct DefinitionRepository {
    pool: SqlitePool,
}

impl DefinitionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the table if it does not exist.
    ///
    /// Deliberately no UNIQUE index on the duplicate key: duplicate
    /// detection is advisory and enforced in [`Self::create`].
    pub async fn init_schema(&self) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS definities (
                id TEXT PRIMARY KEY,
                begrip TEXT NOT NULL,
                definitie TEXT NOT NULL,
                categorie TEXT,
                organisatorische_context TEXT NOT NULL DEFAULT '',
                juridische_context TEXT,
                status TEXT NOT NULL DEFAULT 'draft',
                version_number INTEGER NOT NULL DEFAULT 1,
                validation_score REAL,
                validation_issues TEXT,
                voorbeelden TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_definities_begrip ON definities (begrip)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new definition.
    ///
    /// Without `allow_duplicate`, an existing non-archived definition with
    /// the same (begrip, organisatorische_context, juridische_context,
    /// categorie) raises [`RepositoryError::DuplicateDefinition`]; the
    /// caller presents a confirm/override choice and may retry with the
    /// flag set.
    pub async fn create(
        &self,
        new: NewDefinition,
        allow_duplicate: bool,
    ) -> RepositoryResult<Definition> {
        if !allow_duplicate {
            let duplicates = self
                .find_duplicates(
                    &new.begrip,
                    &new.organisatorische_context,
                    new.juridische_context.as_deref(),
                    new.categorie,
                )
                .await?;
            if let Some(existing) = duplicates.first() {
                return Err(RepositoryError::DuplicateDefinition {
                    begrip: new.begrip,
                    existing_id: existing.id,
                });
            }
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let voorbeelden = serde_json::to_string(&new.voorbeelden)?;

        sqlx::query(
            r#"
            INSERT INTO definities
            (id, begrip, definitie, categorie, organisatorische_context,
             juridische_context, status, version_number, voorbeelden,
             created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'draft', 1, ?7, ?8, ?8)
            "#,
        )
        .bind(id.to_string())
        .bind(&new.begrip)
        .bind(&new.definitie)
        .bind(new.categorie.map(|c| c.as_str().to_string()))
        .bind(&new.organisatorische_context)
        .bind(&new.juridische_context)
        .bind(voorbeelden)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    /// Advisory duplicate lookup over non-archived rows, begrip matched
    /// case-insensitively.
    pub async fn find_duplicates(
        &self,
        begrip: &str,
        organisatorische_context: &str,
        juridische_context: Option<&str>,
        categorie: Option<OntologicalCategory>,
    ) -> RepositoryResult<Vec<Definition>> {
        let rows: Vec<DefinitionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM definities
            WHERE LOWER(begrip) = LOWER(?1)
              AND organisatorische_context = ?2
              AND juridische_context IS ?3
              AND categorie IS ?4
              AND status != 'archived'
            ORDER BY created_at ASC
            "#
        ))
        .bind(begrip)
        .bind(organisatorische_context)
        .bind(juridische_context)
        .bind(categorie.map(|c| c.as_str().to_string()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Definition::try_from).collect()
    }

    pub async fn get(&self, id: Uuid) -> RepositoryResult<Definition> {
        let row: Option<DefinitionRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM definities WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Definition::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound(id))
    }

    pub async fn list_by_status(
        &self,
        status: DefinitionStatus,
    ) -> RepositoryResult<Vec<Definition>> {
        let rows: Vec<DefinitionRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM definities WHERE status = ?1 ORDER BY begrip ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Definition::try_from).collect()
    }

    /// Replace the definition text, bumping the version number.
    pub async fn update_definition(
        &self,
        id: Uuid,
        definitie: &str,
    ) -> RepositoryResult<Definition> {
        let result = sqlx::query(
            r#"
            UPDATE definities
            SET definitie = ?2,
                version_number = version_number + 1,
                validation_score = NULL,
                validation_issues = NULL,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id.to_string())
        .bind(definitie)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        self.get(id).await
    }

    pub async fn set_status(
        &self,
        id: Uuid,
        status: DefinitionStatus,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE definities SET status = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id.to_string())
        .bind(status.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    /// Soft delete: archived definitions stay queryable by id but no longer
    /// participate in duplicate detection.
    pub async fn archive(&self, id: Uuid) -> RepositoryResult<()> {
        self.set_status(id, DefinitionStatus::Archived).await
    }

    /// Write a validation outcome onto a stored definition.
    pub async fn attach_validation(
        &self,
        id: Uuid,
        validation: &ValidationResult,
    ) -> RepositoryResult<()> {
        let issues = serde_json::to_string(&validation.violations)?;
        let result = sqlx::query(
            r#"
            UPDATE definities
            SET validation_score = ?2, validation_issues = ?3, updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id.to_string())
        .bind(validation.overall_score)
        .bind(issues)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }
}
