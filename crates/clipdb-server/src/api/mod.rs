mod analyses;
mod profiles;
mod scrape_jobs;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use clipdb_jobs::{AnalyticsService, JobError};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub service: AnalyticsService,
    /// Probed by the health endpoint; `None` when running on the in-memory
    /// store.
    pub pool: Option<PgPool>,
    /// Production replaces internal error text with a generic message.
    pub expose_internal_errors: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "remote_launch_failed" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(50).clamp(1, 200)
}

/// Maps a lifecycle error onto the API error envelope.
pub(super) fn map_job_error(state: &AppState, request_id: String, error: JobError) -> ApiError {
    match error {
        JobError::InvalidInput(reason) => ApiError::new(request_id, "validation_error", reason),
        JobError::JobNotFound(_) | JobError::ProfileNotFound(_) => {
            ApiError::new(request_id, "not_found", error.to_string())
        }
        JobError::Launch { job_id, message } => {
            tracing::warn!(%job_id, error = %message, "remote launch failed");
            let message = if state.expose_internal_errors {
                format!("scrape job {job_id} could not be launched: {message}")
            } else {
                format!("scrape job {job_id} could not be launched")
            };
            ApiError::new(request_id, "remote_launch_failed", message)
        }
        JobError::Scraper(_) | JobError::Store(_) => {
            tracing::error!(error = %error, "request failed");
            let message = if state.expose_internal_errors {
                error.to_string()
            } else {
                "internal server error".to_string()
            };
            ApiError::new(request_id, "internal_error", message)
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: Option<RateLimitState>) -> Router<AppState> {
    let router = Router::new()
        .route("/api/v1/analyses", post(analyses::create_analysis))
        .route(
            "/api/v1/scrape-jobs/{job_id}",
            get(scrape_jobs::get_scrape_job),
        )
        .route(
            "/api/v1/profiles/{platform}/{username}",
            get(profiles::get_profile),
        )
        .route(
            "/api/v1/profiles/{platform}/{username}/videos",
            get(profiles::list_profile_videos),
        )
        .route(
            "/api/v1/profiles/{platform}/{username}/jobs",
            get(profiles::list_profile_jobs),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ));

    match rate_limit {
        Some(rate_limit) => router.layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        )),
        None => router,
    }
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: Option<RateLimitState>) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    let Some(pool) = state.pool.as_ref() else {
        return (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "not_configured",
                },
                meta,
            }),
        );
    };

    match clipdb_db::ping(pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
