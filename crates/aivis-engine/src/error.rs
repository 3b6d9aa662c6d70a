use aivis_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("project not found: {0}")]
    ProjectNotFound(i64),

    #[error("a run is already in progress for project {0}")]
    AlreadyRunning(i64),

    #[error("competitor {competitor_id} does not belong to project {project_id}")]
    CompetitorNotFound { project_id: i64, competitor_id: i64 },

    /// A backend name that does not map to a supported backend.
    #[error("validation error: {0}")]
    Validation(#[from] aivis_core::CoreError),

    #[error("brand pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("store error: {0}")]
    Store(#[from] DbError),
}

impl EngineError {
    /// Maps a store `NotFound` for the project itself onto
    /// [`EngineError::ProjectNotFound`].
    pub(crate) fn from_project_lookup(project_id: i64, err: DbError) -> Self {
        if err.is_not_found() {
            Self::ProjectNotFound(project_id)
        } else {
            Self::Store(err)
        }
    }
}
