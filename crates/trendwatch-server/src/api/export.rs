//! `GET /api/v1/export`: trends, posts or the trend report as JSON or CSV.
//!
//! JSON responses use the usual envelope; CSV responses are `text/csv`
//! attachments named after the export kind and time.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use trendwatch_db::{PostListFilters, ProcessedPostRow, TrendRow};
use trendwatch_pipeline::{ExportFormat, TrendReport};

use crate::middleware::RequestId;

use super::{map_db_error, map_pipeline_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(super) enum ExportKind {
    #[default]
    Trends,
    Posts,
    Report,
}

#[derive(Debug, Deserialize)]
pub(super) struct ExportQuery {
    #[serde(default)]
    pub kind: ExportKind,
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(super) enum ExportPayload {
    Trends(Vec<TrendRow>),
    Posts(Vec<ProcessedPostRow>),
    Report(Box<TrendReport>),
}

impl ExportPayload {
    fn write_csv(&self) -> Result<Vec<u8>, trendwatch_pipeline::PipelineError> {
        let mut out = Vec::new();
        match self {
            Self::Trends(trends) => {
                trendwatch_pipeline::write_trends(&mut out, trends, ExportFormat::Csv)?;
            }
            Self::Posts(posts) => {
                trendwatch_pipeline::write_posts(&mut out, posts, ExportFormat::Csv)?;
            }
            Self::Report(report) => {
                trendwatch_pipeline::write_report(&mut out, report, ExportFormat::Csv)?;
            }
        }
        Ok(out)
    }
}

fn attachment_name(kind: ExportKind, format: ExportFormat) -> String {
    let now = Utc::now();
    match kind {
        ExportKind::Report => trendwatch_pipeline::default_report_filename(now, format),
        ExportKind::Trends => format!("trends_{}.{}", now.format("%Y%m%d_%H%M%S"), format),
        ExportKind::Posts => format!("posts_{}.{}", now.format("%Y%m%d_%H%M%S"), format),
    }
}

pub(super) async fn export(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let format = match query.format.as_deref() {
        None => ExportFormat::Json,
        Some(raw) => raw
            .parse::<ExportFormat>()
            .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?,
    };

    let payload = match query.kind {
        ExportKind::Trends => ExportPayload::Trends(
            trendwatch_db::list_trends(&state.pool, None)
                .await
                .map_err(|e| map_db_error(req_id.0.clone(), &e))?,
        ),
        ExportKind::Posts => {
            let (posts, _) =
                trendwatch_db::list_posts_page(&state.pool, PostListFilters::default())
                    .await
                    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
            ExportPayload::Posts(posts)
        }
        ExportKind::Report => ExportPayload::Report(Box::new(
            trendwatch_pipeline::build_report(&state.pool, &state.pipeline)
                .await
                .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?,
        )),
    };

    match format {
        ExportFormat::Json => Ok(Json(ApiResponse {
            data: payload,
            meta: ResponseMeta::new(req_id.0),
        })
        .into_response()),
        ExportFormat::Csv => {
            let body = payload
                .write_csv()
                .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;
            let disposition = format!(
                "attachment; filename=\"{}\"",
                attachment_name(query.kind, format)
            );
            let mut response = body.into_response();
            let headers = response.headers_mut();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            );
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            Ok(response)
        }
    }
}
