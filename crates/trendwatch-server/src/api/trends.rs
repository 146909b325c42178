use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use trendwatch_db::{TrendListFilters, TrendRow};

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_page, normalize_platform_filter, parse_sentiment_filter, ApiError,
    ApiResponse, AppState, PageQuery, Paginated, Pagination, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct TrendsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub platform: Option<String>,
    pub sentiment: Option<String>,
}

/// Current trend set, most anomalous first.
pub(super) async fn list_trends(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<TrendsQuery>,
) -> Result<Json<ApiResponse<Paginated<TrendRow>>>, ApiError> {
    let page = normalize_page(&PageQuery {
        page: query.page,
        per_page: query.per_page,
    });
    let sentiment = parse_sentiment_filter(&req_id.0, query.sentiment.as_deref())?;
    let platform = normalize_platform_filter(query.platform.as_deref());

    let (items, total) = trendwatch_db::list_trends_page(
        &state.pool,
        TrendListFilters {
            platform: platform.as_deref(),
            sentiment,
            limit: Some(page.per_page),
            offset: page.offset(),
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: Paginated {
            items,
            pagination: Pagination::new(page, total),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
