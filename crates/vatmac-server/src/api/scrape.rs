use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use vatmac_catalog::{ScrapeSummary, ScrapeTrigger};

use crate::middleware::RequestId;

use super::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeSuccess {
    success: bool,
    message: &'static str,
    timestamp: DateTime<Utc>,
    duration: String,
    summary: Option<ScrapeSummary>,
    file_updated: Option<DateTime<Utc>>,
    output: ScrapeOutput,
}

#[derive(Debug, Serialize)]
struct ScrapeOutput {
    stdout: String,
    stderr: Option<String>,
}

#[derive(Debug, Serialize)]
struct ScrapeFailure {
    success: bool,
    error: String,
    timestamp: DateTime<Utc>,
    duration: String,
    details: Option<String>,
}

/// `GET|POST /api/scrape`: runs the external scraper once and reports the
/// refreshed catalog's summary. Auth is enforced by middleware.
pub(super) async fn trigger_scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Response {
    let started = Instant::now();
    tracing::info!(request_id = %req_id.0, "scrape triggered");

    match state.scraper.trigger_scrape().await {
        Ok(outcome) => Json(ScrapeSuccess {
            success: true,
            message: "Price scraper completed successfully",
            timestamp: Utc::now(),
            duration: format_duration(started),
            summary: outcome.summary,
            file_updated: outcome.file_updated,
            output: ScrapeOutput {
                stdout: outcome.stdout_tail,
                stderr: outcome.stderr,
            },
        })
        .into_response(),
        Err(e) => {
            tracing::error!(request_id = %req_id.0, error = %e, "scrape trigger failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ScrapeFailure {
                    success: false,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                    duration: format_duration(started),
                    details: e.details().map(str::to_owned),
                }),
            )
                .into_response()
        }
    }
}

/// Seconds with two decimals and an `s` suffix, e.g. `"12.34s"`.
fn format_duration(started: Instant) -> String {
    format!("{:.2}s", started.elapsed().as_secs_f64())
}
