//! Database operations for the `responses` table.

use sqlx::PgPool;

use crate::types::ResponseRecord;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResponseRow {
    pub id: i64,
    pub project_id: i64,
    pub prompt_id: i64,
    pub backend_name: String,
    pub raw_response: Option<String>,
    pub status: String,
    pub retry_count: i32,
    pub error_message: Option<String>,
}

impl TryFrom<ResponseRow> for ResponseRecord {
    type Error = DbError;

    fn try_from(row: ResponseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            project_id: row.project_id,
            prompt_id: row.prompt_id,
            backend_name: row.backend_name,
            raw_response: row.raw_response,
            status: row.status.parse()?,
            retry_count: row.retry_count,
            error_message: row.error_message,
        })
    }
}

const RESPONSE_COLUMNS: &str =
    "id, project_id, prompt_id, backend_name, raw_response, status, retry_count, error_message";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns the response for `(project, prompt, backend)`, creating a
/// `pending` row if none exists.
///
/// The no-op `DO UPDATE` makes `RETURNING` yield the existing row on conflict.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn get_or_create_response(
    pool: &PgPool,
    project_id: i64,
    prompt_id: i64,
    backend_name: &str,
) -> Result<ResponseRecord, DbError> {
    let row = sqlx::query_as::<_, ResponseRow>(&format!(
        "INSERT INTO responses (project_id, prompt_id, backend_name) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (project_id, prompt_id, backend_name) DO UPDATE SET \
             backend_name = EXCLUDED.backend_name \
         RETURNING {RESPONSE_COLUMNS}"
    ))
    .bind(project_id)
    .bind(prompt_id)
    .bind(backend_name)
    .fetch_one(pool)
    .await?;

    row.try_into()
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the response does not exist.
pub async fn complete_response(pool: &PgPool, response_id: i64, text: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE responses \
         SET raw_response = $1, status = 'success', error_message = NULL, updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(text)
    .bind(response_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("response", response_id));
    }
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the response does not exist.
pub async fn fail_response(pool: &PgPool, response_id: i64, error: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE responses \
         SET status = 'failed', error_message = $1, retry_count = retry_count + 1, \
             updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(error)
    .bind(response_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("response", response_id));
    }
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_successful_responses(
    pool: &PgPool,
    project_id: i64,
) -> Result<Vec<ResponseRecord>, DbError> {
    let rows = sqlx::query_as::<_, ResponseRow>(&format!(
        "SELECT {RESPONSE_COLUMNS} FROM responses \
         WHERE project_id = $1 AND status = 'success' \
         ORDER BY id"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ResponseRecord::try_from).collect()
}
