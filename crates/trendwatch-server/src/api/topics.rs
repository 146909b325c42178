use axum::{extract::State, Extension, Json};
use serde::Serialize;
use trendwatch_analysis::{ModelOutcome, Topic};

use crate::middleware::RequestId;

use super::{map_pipeline_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct TopicsData {
    status: &'static str,
    topics: Vec<Topic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    documents_required: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    documents_found: Option<usize>,
}

impl From<ModelOutcome<Vec<Topic>>> for TopicsData {
    fn from(outcome: ModelOutcome<Vec<Topic>>) -> Self {
        match outcome {
            ModelOutcome::Fitted(topics) => Self {
                status: "fitted",
                topics,
                documents_required: None,
                documents_found: None,
            },
            ModelOutcome::InsufficientData { required, found } => Self {
                status: "insufficient_data",
                topics: Vec::new(),
                documents_required: Some(required),
                documents_found: Some(found),
            },
        }
    }
}

/// Fit the topic model over the stored corpus and return its topics.
pub(super) async fn list_topics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<TopicsData>>, ApiError> {
    let outcome = trendwatch_pipeline::train_topics(&state.pool, &state.pipeline)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: outcome.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
