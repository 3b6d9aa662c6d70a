//! Database operations for the append-only `execution_logs` table.

use aivis_core::LogLevel;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::types::LogEntry;
use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LogRow {
    pub id: i64,
    pub project_id: i64,
    pub module: String,
    pub level: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<LogRow> for LogEntry {
    type Error = DbError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            project_id: row.project_id,
            module: row.module,
            level: row.level.parse()?,
            message: row.message,
            created_at: row.created_at,
        })
    }
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn append_log(
    pool: &PgPool,
    project_id: i64,
    module: &str,
    level: LogLevel,
    message: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO execution_logs (project_id, module, level, message) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(project_id)
    .bind(module)
    .bind(level.as_str())
    .bind(message)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns the newest `limit` entries in chronological order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_logs(pool: &PgPool, project_id: i64, limit: i64) -> Result<Vec<LogEntry>, DbError> {
    let rows = sqlx::query_as::<_, LogRow>(
        "SELECT id, project_id, module, level, message, created_at \
         FROM ( \
             SELECT id, project_id, module, level, message, created_at \
             FROM execution_logs \
             WHERE project_id = $1 \
             ORDER BY id DESC \
             LIMIT $2 \
         ) recent \
         ORDER BY id",
    )
    .bind(project_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(LogEntry::try_from).collect()
}
