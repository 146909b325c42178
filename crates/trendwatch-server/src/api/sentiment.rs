use axum::{extract::State, Extension, Json};
use trendwatch_analysis::SentimentSummary;
use trendwatch_db::SentimentBreakdownRow;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Fold per-label rows into overall stats. `None` when no posts were
/// analyzed.
fn summarize(rows: &[SentimentBreakdownRow]) -> Option<SentimentSummary> {
    SentimentSummary::from_groups(rows.iter().filter_map(SentimentBreakdownRow::as_group))
}

pub(super) async fn sentiment_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<SentimentSummary>>, ApiError> {
    let rows = trendwatch_db::sentiment_breakdown(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let stats = summarize(&rows).ok_or_else(|| {
        ApiError::new(req_id.0.clone(), "not_found", "no sentiment data available")
    })?;

    Ok(Json(ApiResponse {
        data: stats,
        meta: ResponseMeta::new(req_id.0),
    }))
}
