use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use reviewlens_core::{resolve_app_name, PipelineResult, ReviewBatch};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_pipeline_error, ApiError, ApiResponse, AppState};

const MAX_APP_ID_LEN: usize = 256;

#[derive(Debug, Deserialize)]
pub(super) struct AnalysisQuery {
    pub insights: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AppNameItem {
    pub app_id: String,
    pub app_name: String,
}

fn validate_app_id(request_id: &str, app_id: &str) -> Result<(), ApiError> {
    if app_id.trim().is_empty() {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "app_id must not be blank",
        ));
    }
    if app_id.len() > MAX_APP_ID_LEN {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            format!("app_id must be at most {MAX_APP_ID_LEN} bytes"),
        ));
    }
    Ok(())
}

pub(super) async fn get_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(app_id): Path<String>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<ApiResponse<PipelineResult>>, ApiError> {
    validate_app_id(&req_id.0, &app_id)?;
    let generate_insights = query.insights.unwrap_or(true);

    let cancel = state.shutdown.child_token();
    let result = state
        .pipeline
        .run(&app_id, generate_insights, &cancel)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(result, req_id.0)))
}

pub(super) async fn get_reviews(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(app_id): Path<String>,
) -> Result<Json<ApiResponse<ReviewBatch>>, ApiError> {
    validate_app_id(&req_id.0, &app_id)?;

    let cancel = state.shutdown.child_token();
    let batch = state
        .pipeline
        .reviews(&app_id, &cancel)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(batch, req_id.0)))
}

pub(super) async fn get_app_name(
    Extension(req_id): Extension<RequestId>,
    Path(app_id): Path<String>,
) -> Result<Json<ApiResponse<AppNameItem>>, ApiError> {
    validate_app_id(&req_id.0, &app_id)?;
    let app_name = resolve_app_name(&app_id);
    Ok(Json(ApiResponse::new(AppNameItem { app_id, app_name }, req_id.0)))
}
