mod export;
mod posts;
mod runs;
mod sentiment;
mod topics;
mod trends;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use trendwatch_db::StoreCounts;
use trendwatch_pipeline::{PipelineConfig, PipelineError};

use crate::middleware::{request_id, RequestId};

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 200;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub pipeline: Arc<PipelineConfig>,
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

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    counts: Option<StoreCounts>,
}

/// `page` / `per_page` query parameters shared by the listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub(super) struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Page {
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    pub(super) fn offset(self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub(super) fn new(page: Page, total: i64) -> Self {
        Self {
            page: page.page,
            per_page: page.per_page,
            total,
            pages: (total + page.per_page - 1) / page.per_page,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
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
            "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Page defaults to 1 and is at least 1; `per_page` defaults to 20 and is
/// clamped to 1..=200.
pub(super) fn normalize_page(query: &PageQuery) -> Page {
    Page {
        page: query.page.unwrap_or(1).max(1),
        per_page: query
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE),
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, MAX_PER_PAGE)
}

/// Parse an optional sentiment filter, rejecting unknown labels.
pub(super) fn parse_sentiment_filter(
    request_id: &str,
    raw: Option<&str>,
) -> Result<Option<&'static str>, ApiError> {
    raw.map(|s| {
        s.parse::<trendwatch_core::SentimentLabel>()
            .map(trendwatch_core::SentimentLabel::as_str)
            .map_err(|e| ApiError::new(request_id, "validation_error", e.to_string()))
    })
    .transpose()
}

/// Canonical platform name for an optional filter.
pub(super) fn normalize_platform_filter(raw: Option<&str>) -> Option<String> {
    raw.map(|p| trendwatch_core::Platform::from(p).to_string())
}

pub(super) fn map_db_error(request_id: String, error: &trendwatch_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_pipeline_error(request_id: String, error: &PipelineError) -> ApiError {
    match error {
        PipelineError::Db(e) => map_db_error(request_id, e),
        PipelineError::InvalidInput(message) => {
            ApiError::new(request_id, "validation_error", message.clone())
        }
        other => {
            tracing::error!(error = %other, "pipeline operation failed");
            ApiError::new(request_id, "internal_error", "pipeline operation failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/posts", get(posts::list_posts))
        .route("/api/v1/trends", get(trends::list_trends))
        .route("/api/v1/topics", get(topics::list_topics))
        .route("/api/v1/sentiment/stats", get(sentiment::sentiment_stats))
        .route("/api/v1/pipeline/runs", get(runs::list_pipeline_runs))
        .route("/api/v1/export", get(export::export))
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

    match trendwatch_db::count_store(&state.pool).await {
        Ok(counts) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                    counts: Some(counts),
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
                        counts: None,
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
