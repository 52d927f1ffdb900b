use axum::{
    extract::{Path, State},
    Extension, Json,
};
use clipdb_core::JobStatusReport;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_job_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// `GET /api/v1/scrape-jobs/{job_id}`: reconciles once, then reports
/// `{status, resultCount?, errorMessage?}`.
pub(super) async fn get_scrape_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(job_id): Path<String>,
) -> Result<Json<ApiResponse<JobStatusReport>>, ApiError> {
    let job_id = Uuid::parse_str(&job_id).map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            format!("invalid job id: {job_id}"),
        )
    })?;

    let report = state
        .service
        .job_status(job_id)
        .await
        .map_err(|e| map_job_error(&state, req_id.0.clone(), e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}
