//! REST API handlers for the scoring and tracking engines.

use crate::state::AppState;
use adpulse_core::types::ReportingPeriod;
use adpulse_scoring::ScoreOutcome;
use adpulse_tracking::{AlertFeed, DetectionRun, DetectionSummary, FeedEntry, ResolveOutcome};
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

fn not_found(error: &str, message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: error.to_string(),
            message,
        }),
    )
}

fn bad_request(error: &str, message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
            message,
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct DetectionScope {
    /// Restrict the run to one company's creatives.
    pub company_id: Option<Uuid>,
}

/// POST /v1/detection/run — run the UTM discrepancy detector.
pub async fn run_detection(
    State(state): State<AppState>,
    Query(scope): Query<DetectionScope>,
) -> Json<DetectionSummary> {
    let summary = DetectionRun::new(&state.alerts).execute(&*state.ops, scope.company_id);
    info!(
        company_id = ?scope.company_id,
        analyzed = summary.creatives_analyzed,
        found = summary.discrepancies_found,
        "Detection run triggered via API"
    );
    Json(summary)
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub status: ResolveOutcome,
}

/// POST /v1/alerts/{id}/resolve — mark an alert resolved (idempotent).
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<ResolveResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.alerts.resolve(alert_id) {
        ResolveOutcome::NotFound => {
            warn!(alert_id = %alert_id, "Resolve requested for unknown alert");
            metrics::counter!("api.unknown_alert").increment(1);
            Err(not_found(
                "unknown_alert",
                format!("no alert with id {alert_id}"),
            ))
        }
        status => Ok(Json(ResolveResponse { status })),
    }
}

/// GET /v1/alerts — the unified alert feed (unresolved UTM alerts plus
/// live threshold breaches).
pub async fn alert_feed(State(state): State<AppState>) -> Json<Vec<FeedEntry>> {
    let companies = state.ops.company_periods();
    Json(AlertFeed::assemble(&state.alerts, &companies))
}

#[derive(Debug, Deserialize)]
pub struct ScorePeriod {
    /// Reporting window start, RFC 3339. Given with `to` or not at all.
    pub from: Option<DateTime<Utc>>,
    /// Reporting window end, RFC 3339.
    pub to: Option<DateTime<Utc>>,
}

impl ScorePeriod {
    fn resolve(&self) -> Result<Option<ReportingPeriod>, String> {
        match (self.from, self.to) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) if start < end => {
                Ok(Some(ReportingPeriod { start, end }))
            }
            (Some(_), Some(_)) => Err("'from' must precede 'to'".to_string()),
            _ => Err("'from' and 'to' must be given together".to_string()),
        }
    }
}

/// GET /v1/campaigns/{id}/score — health score for a campaign over a
/// reporting period (the latest one when none is given). A period with no
/// activity gets the no-data outcome, not a 0.
pub async fn campaign_score(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Query(query): Query<ScorePeriod>,
) -> Result<Json<ScoreOutcome>, (StatusCode, Json<ErrorResponse>)> {
    let period = query
        .resolve()
        .map_err(|message| bad_request("invalid_period", message))?;

    let Some(campaign) = state.ops.get_campaign(campaign_id) else {
        metrics::counter!("api.unknown_campaign").increment(1);
        return Err(not_found(
            "unknown_campaign",
            format!("no campaign with id {campaign_id}"),
        ));
    };

    let metrics_row = state
        .ops
        .get_campaign_metrics(campaign_id, period)
        .unwrap_or_default();
    let outcome = state.scorer.score(&metrics_row.normalized(), campaign.stage);
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health — liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
