use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use clipdb_core::{Platform, ProfileSummary, ScrapeJob, StoredVideo};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::analyses::ProfileItem;
use super::{map_job_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ListQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProfileOverviewItem {
    profile: ProfileItem,
    stored_videos: u64,
    summary: ProfileSummary,
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeJobItem {
    job_id: Uuid,
    status: String,
    remote_job_id: Option<String>,
    requested_result_limit: u32,
    result_count: Option<u32>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<ScrapeJob> for ScrapeJobItem {
    fn from(job: ScrapeJob) -> Self {
        Self {
            job_id: job.id,
            status: job.status.as_str().to_string(),
            remote_job_id: job.remote_job_id,
            requested_result_limit: job.requested_result_limit,
            result_count: job.result_count,
            error_message: job.error_message,
            created_at: job.created_at,
            completed_at: job.completed_at,
        }
    }
}

fn parse_platform(request_id: &str, raw: &str) -> Result<Platform, ApiError> {
    raw.parse()
        .map_err(|e: clipdb_core::CoreError| {
            ApiError::new(request_id, "validation_error", e.to_string())
        })
}

/// `GET /api/v1/profiles/{platform}/{username}`
pub(super) async fn get_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((platform, username)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ProfileOverviewItem>>, ApiError> {
    let platform = parse_platform(&req_id.0, &platform)?;
    let overview = state
        .service
        .profile_overview(platform, &username)
        .await
        .map_err(|e| map_job_error(&state, req_id.0.clone(), e))?;

    Ok(Json(ApiResponse {
        data: ProfileOverviewItem {
            profile: overview.profile.into(),
            stored_videos: overview.stored_videos,
            summary: overview.summary,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /api/v1/profiles/{platform}/{username}/videos?limit=`
pub(super) async fn list_profile_videos(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((platform, username)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<StoredVideo>>>, ApiError> {
    let platform = parse_platform(&req_id.0, &platform)?;
    let videos = state
        .service
        .profile_videos(platform, &username, normalize_limit(query.limit))
        .await
        .map_err(|e| map_job_error(&state, req_id.0.clone(), e))?;

    Ok(Json(ApiResponse {
        data: videos,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /api/v1/profiles/{platform}/{username}/jobs?limit=`
pub(super) async fn list_profile_jobs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((platform, username)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<ScrapeJobItem>>>, ApiError> {
    let platform = parse_platform(&req_id.0, &platform)?;
    let jobs = state
        .service
        .profile_jobs(platform, &username, normalize_limit(query.limit))
        .await
        .map_err(|e| map_job_error(&state, req_id.0.clone(), e))?;

    Ok(Json(ApiResponse {
        data: jobs.into_iter().map(ScrapeJobItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
