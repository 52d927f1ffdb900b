use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use clipdb_core::{CanonicalVideo, CreatorProfile, JobStatusReport, Platform};
use clipdb_jobs::{AnalyticsOutcome, AnalyticsRequest};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_job_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CreateAnalysisBody {
    pub platform: String,
    /// Handle, `@handle`, or profile URL.
    #[serde(alias = "username")]
    pub identifier: String,
    pub result_limit: Option<u32>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ProfileItem {
    pub id: uuid::Uuid,
    pub username: String,
    pub platform: Platform,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub follower_count: Option<u64>,
    pub last_scraped_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<CreatorProfile> for ProfileItem {
    fn from(p: CreatorProfile) -> Self {
        Self {
            id: p.id,
            username: p.username,
            platform: p.platform,
            display_name: p.display_name,
            avatar_url: p.avatar_url,
            follower_count: p.follower_count,
            last_scraped_at: p.last_scraped_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub(super) enum AnalysisData {
    /// Served from stored results.
    Cache {
        profile: ProfileItem,
        videos: Vec<CanonicalVideo>,
    },
    /// A remote run was started; poll `/api/v1/scrape-jobs/{job_id}`.
    Job {
        profile: ProfileItem,
        job: JobStatusReport,
    },
}

/// `POST /api/v1/analyses`: 200 with cached videos, or 202 with a job to poll.
pub(super) async fn create_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateAnalysisBody>,
) -> Result<Response, ApiError> {
    let platform: Platform = body
        .platform
        .parse()
        .map_err(|e: clipdb_core::CoreError| {
            ApiError::new(req_id.0.clone(), "validation_error", e.to_string())
        })?;

    let outcome = state
        .service
        .request_analytics(AnalyticsRequest {
            platform,
            identifier: body.identifier,
            result_limit: body.result_limit,
            user_id: body.user_id,
            force_refresh: body.force_refresh,
        })
        .await
        .map_err(|e| map_job_error(&state, req_id.0.clone(), e))?;

    let (status, data) = match outcome {
        AnalyticsOutcome::Cached { profile, videos } => (
            StatusCode::OK,
            AnalysisData::Cache {
                profile: profile.into(),
                videos,
            },
        ),
        AnalyticsOutcome::Started { job, profile } => (
            StatusCode::ACCEPTED,
            AnalysisData::Job {
                profile: profile.into(),
                job,
            },
        ),
    };

    Ok((
        status,
        Json(ApiResponse {
            data,
            meta: ResponseMeta::new(req_id.0),
        }),
    )
        .into_response())
}
