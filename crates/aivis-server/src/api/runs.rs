use aivis_core::ProjectStatus;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_engine_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct RunAccepted {
    pub project_id: i64,
    /// Status at submission time; poll `/status` for progress.
    pub status: ProjectStatus,
    pub queued: bool,
}

/// Queues a pipeline run and returns immediately with 202.
pub(super) async fn trigger_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(project_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<RunAccepted>>), ApiError> {
    let status = state
        .runner
        .status(project_id)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    // The background task owns the run; the handle is not awaited.
    let _handle = state
        .runner
        .submit(project_id)
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: RunAccepted {
                project_id,
                status,
                queued: true,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
