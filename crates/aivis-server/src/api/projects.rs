use aivis_core::{AnalysisReport, LogLevel, ProjectStatus};
use aivis_db::{ProjectRecord, VisibilityStore};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_db_error, map_engine_error, normalize_limit, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Serialize)]
pub(super) struct ProjectItem {
    pub id: i64,
    pub name: String,
    pub company_name: String,
    pub status: ProjectStatus,
    pub is_competitor_view: bool,
    pub competitor_brand_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<ProjectRecord> for ProjectItem {
    fn from(row: ProjectRecord) -> Self {
        Self {
            id: row.id,
            name: row.name,
            company_name: row.company_name,
            status: row.status,
            is_competitor_view: row.is_competitor_view,
            competitor_brand_id: row.competitor_brand_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct StatusItem {
    pub project_id: i64,
    pub status: ProjectStatus,
    /// A run is queued or executing in this process.
    pub in_flight: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct LogItem {
    pub module: String,
    pub level: LogLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LogsQuery {
    pub limit: Option<i64>,
}

pub(super) async fn list_projects(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ProjectItem>>>, ApiError> {
    let rows = state
        .runner
        .store()
        .list_projects()
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ProjectItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(project_id): Path<i64>,
) -> Result<Json<ApiResponse<StatusItem>>, ApiError> {
    let status = state
        .runner
        .status(project_id)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: StatusItem {
            project_id,
            status,
            in_flight: state.runner.is_in_flight(project_id),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(project_id): Path<i64>,
) -> Result<Json<ApiResponse<AnalysisReport>>, ApiError> {
    state
        .runner
        .status(project_id)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    let report = state
        .runner
        .store()
        .get_report(project_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("no report for project {project_id}; trigger a run first"),
            )
        })?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_logs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(project_id): Path<i64>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<ApiResponse<Vec<LogItem>>>, ApiError> {
    let rows = state
        .runner
        .logs(project_id, normalize_limit(query.limit))
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| LogItem {
            module: row.module,
            level: row.level,
            message: row.message,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn impersonate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((project_id, competitor_id)): Path<(i64, i64)>,
) -> Result<(StatusCode, Json<ApiResponse<ProjectItem>>), ApiError> {
    let view = aivis_engine::impersonate_competitor(
        state.runner.store().as_ref(),
        project_id,
        competitor_id,
    )
    .await
    .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ProjectItem::from(view),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
