//! Database operations for `projects`, `competitors`, `prompts` and
//! `project_backends`.

use aivis_core::ProjectStatus;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::types::{BackendSelection, CompetitorRecord, NewProject, ProjectRecord, PromptRecord};
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: i64,
    pub name: String,
    pub company_name: String,
    pub description: Option<String>,
    pub area_of_work: Option<String>,
    pub status: String,
    pub is_competitor_view: bool,
    pub competitor_brand_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for ProjectRecord {
    type Error = DbError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            company_name: row.company_name,
            description: row.description,
            area_of_work: row.area_of_work,
            status: row.status.parse()?,
            is_competitor_view: row.is_competitor_view,
            competitor_brand_id: row.competitor_brand_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompetitorRow {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<CompetitorRow> for CompetitorRecord {
    fn from(row: CompetitorRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PromptRow {
    pub id: i64,
    pub project_id: i64,
    pub text: String,
    pub is_selected: bool,
}

impl From<PromptRow> for PromptRecord {
    fn from(row: PromptRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            text: row.text,
            is_selected: row.is_selected,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BackendSelectionRow {
    pub backend_name: String,
    pub display_name: String,
    pub weight: f64,
}

const PROJECT_COLUMNS: &str = "id, name, company_name, description, area_of_work, status, \
                               is_competitor_view, competitor_brand_id, created_at";

// ---------------------------------------------------------------------------
// projects
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::NotFound`] if no project has the given id.
pub async fn get_project(pool: &PgPool, project_id: i64) -> Result<ProjectRecord, DbError> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
    ))
    .bind(project_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DbError::not_found("project", project_id))?;

    row.try_into()
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_projects(pool: &PgPool) -> Result<Vec<ProjectRecord>, DbError> {
    let rows = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ProjectRecord::try_from).collect()
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_project(pool: &PgPool, project: &NewProject) -> Result<ProjectRecord, DbError> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        "INSERT INTO projects \
             (name, company_name, description, area_of_work, status, \
              is_competitor_view, competitor_brand_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(&project.name)
    .bind(&project.company_name)
    .bind(project.description.as_deref())
    .bind(project.area_of_work.as_deref())
    .bind(project.status.as_str())
    .bind(project.is_competitor_view)
    .bind(project.competitor_brand_id)
    .fetch_one(pool)
    .await?;

    row.try_into()
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no project has the given id.
pub async fn set_project_status(
    pool: &PgPool,
    project_id: i64,
    status: ProjectStatus,
) -> Result<(), DbError> {
    let result =
        sqlx::query("UPDATE projects SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(project_id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("project", project_id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// competitors
// ---------------------------------------------------------------------------

/// Inserts a competitor; a case-insensitive duplicate name is a conflict.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] on a duplicate name, or [`DbError::Sqlx`].
pub async fn add_competitor(
    pool: &PgPool,
    project_id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<CompetitorRecord, DbError> {
    let row = sqlx::query_as::<_, CompetitorRow>(
        "INSERT INTO competitors (project_id, name, description) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (project_id, lower(name)) DO NOTHING \
         RETURNING id, project_id, name, description",
    )
    .bind(project_id)
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DbError::conflict("competitor", name))?;

    Ok(row.into())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_competitors(
    pool: &PgPool,
    project_id: i64,
) -> Result<Vec<CompetitorRecord>, DbError> {
    let rows = sqlx::query_as::<_, CompetitorRow>(
        "SELECT id, project_id, name, description \
         FROM competitors WHERE project_id = $1 ORDER BY id",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CompetitorRecord::from).collect())
}

// ---------------------------------------------------------------------------
// prompts
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn add_prompt(
    pool: &PgPool,
    project_id: i64,
    text: &str,
    is_selected: bool,
) -> Result<PromptRecord, DbError> {
    let row = sqlx::query_as::<_, PromptRow>(
        "INSERT INTO prompts (project_id, text, is_selected) \
         VALUES ($1, $2, $3) \
         RETURNING id, project_id, text, is_selected",
    )
    .bind(project_id)
    .bind(text)
    .bind(is_selected)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_prompts(
    pool: &PgPool,
    project_id: i64,
    selected_only: bool,
) -> Result<Vec<PromptRecord>, DbError> {
    let rows = sqlx::query_as::<_, PromptRow>(
        "SELECT id, project_id, text, is_selected \
         FROM prompts \
         WHERE project_id = $1 AND (NOT $2 OR is_selected) \
         ORDER BY id",
    )
    .bind(project_id)
    .bind(selected_only)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PromptRecord::from).collect())
}

// ---------------------------------------------------------------------------
// project_backends
// ---------------------------------------------------------------------------

/// Upserts the selection flag for a catalog backend.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the backend is not in the catalog.
pub async fn select_backend(
    pool: &PgPool,
    project_id: i64,
    backend_name: &str,
    is_selected: bool,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "INSERT INTO project_backends (project_id, backend_name, is_selected) \
         SELECT $1, name, $3 FROM backends WHERE name = $2 \
         ON CONFLICT (project_id, backend_name) DO UPDATE SET \
             is_selected = EXCLUDED.is_selected",
    )
    .bind(project_id)
    .bind(backend_name)
    .bind(is_selected)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("backend", backend_name));
    }
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_selected_backends(
    pool: &PgPool,
    project_id: i64,
) -> Result<Vec<BackendSelection>, DbError> {
    let rows = sqlx::query_as::<_, BackendSelectionRow>(
        "SELECT b.name AS backend_name, b.display_name, b.weight \
         FROM project_backends pb \
         JOIN backends b ON b.name = pb.backend_name \
         WHERE pb.project_id = $1 AND pb.is_selected AND b.is_active \
         ORDER BY b.name",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| BackendSelection {
            backend_name: row.backend_name,
            display_name: row.display_name,
            weight: row.weight,
        })
        .collect())
}
