//! Best-effort writes to the operator-visible execution log.

use aivis_core::LogLevel;
use aivis_db::VisibilityStore;

pub const MODULE_VISIBILITY: &str = "visibility_check";
pub const MODULE_ANALYSIS: &str = "analysis";
pub const MODULE_PIPELINE: &str = "pipeline";

/// Appends one execution-log entry. A failed write is reported through
/// `tracing` and otherwise ignored; the log never decides a run's outcome.
pub async fn record<S>(store: &S, project_id: i64, module: &str, level: LogLevel, message: &str)
where
    S: VisibilityStore + ?Sized,
{
    if let Err(e) = store.append_log(project_id, module, level, message).await {
        tracing::error!(
            project_id,
            module,
            error = %e,
            "failed to append execution log entry"
        );
    }
}
