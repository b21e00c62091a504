use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CertificationId, DateRange, RawResponse, Theme, UnitId};
use super::eligibility::DenialReason;
use super::repository::{NotificationSink, PulseRepository, RepositoryError};
use super::service::{IssuanceOutcome, PulseScoreService, PulseServiceError};
use super::statistics::{IndustryBenchmark, StatsQuery};

/// Router builder exposing the scoring and certification endpoints.
pub fn pulse_router<R, N>(service: Arc<PulseScoreService<R, N>>) -> Router
where
    R: PulseRepository + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route("/api/v1/pulse/responses", post(submit_response_handler::<R, N>))
        .route("/api/v1/pulse/units/:unit/stats", get(unit_stats_handler::<R, N>))
        .route(
            "/api/v1/pulse/units/:unit/eligibility",
            get(eligibility_handler::<R, N>),
        )
        .route(
            "/api/v1/pulse/units/:unit/certifications",
            post(issue_handler::<R, N>).get(history_handler::<R, N>),
        )
        .route(
            "/api/v1/pulse/certifications/:certificate_id/notify",
            post(resend_handler::<R, N>),
        )
        .with_state(service)
}

/// Raw query string for the statistics endpoint; validated into a [`StatsQuery`].
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatsParams {
    pub(crate) theme: Option<String>,
    pub(crate) from: Option<String>,
    pub(crate) to: Option<String>,
    pub(crate) benchmark: Option<f64>,
}

impl StatsParams {
    fn into_query(self) -> Result<(StatsQuery, Option<f64>), String> {
        let theme = match self.theme.as_deref() {
            None | Some("") => None,
            Some(raw) => {
                Some(Theme::parse(raw).ok_or_else(|| format!("unknown theme filter '{raw}'"))?)
            }
        };
        let from = self
            .from
            .as_deref()
            .map(|raw| parse_bound(raw, NaiveTime::MIN))
            .transpose()?;
        let to = self
            .to
            .as_deref()
            .map(|raw| parse_bound(raw, end_of_day()))
            .transpose()?;

        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err("date range 'from' must not be after 'to'".to_string());
            }
        }

        Ok((
            StatsQuery {
                theme,
                range: DateRange { from, to },
            },
            self.benchmark,
        ))
    }
}

/// Last representable instant of a day, so a date-only `to` covers all of it.
fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates.
fn parse_bound(raw: &str, time_of_day: NaiveTime) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(time_of_day).and_utc())
        .map_err(|err| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD ({err})"))
}

pub(crate) async fn submit_response_handler<R, N>(
    State(service): State<Arc<PulseScoreService<R, N>>>,
    axum::Json(response): axum::Json<RawResponse>,
) -> Response
where
    R: PulseRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.process_response(response) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(PulseServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({
                "error": "response already recorded",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn unit_stats_handler<R, N>(
    State(service): State<Arc<PulseScoreService<R, N>>>,
    Path(unit): Path<String>,
    Query(params): Query<StatsParams>,
) -> Response
where
    R: PulseRepository + 'static,
    N: NotificationSink + 'static,
{
    let (query, benchmark) = match params.into_query() {
        Ok(parsed) => parsed,
        Err(reason) => {
            let payload = json!({ "error": reason });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };

    let unit = UnitId(unit);
    match service.unit_stats(&unit, &query) {
        Ok(stats) => {
            let benchmark = benchmark
                .map(IndustryBenchmark::overall)
                .unwrap_or_else(|| service.benchmark().clone());
            let deviations = stats.compare(&benchmark);
            let payload = json!({
                "unit": unit,
                "theme_filter": query.theme,
                "stats": stats,
                "deviations": deviations,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn eligibility_handler<R, N>(
    State(service): State<Arc<PulseScoreService<R, N>>>,
    Path(unit): Path<String>,
) -> Response
where
    R: PulseRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.evaluate_certification(&UnitId(unit)) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome.view())).into_response(),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn issue_handler<R, N>(
    State(service): State<Arc<PulseScoreService<R, N>>>,
    Path(unit): Path<String>,
) -> Response
where
    R: PulseRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.issue_certification(&UnitId(unit)) {
        Ok(outcome) => {
            let status = match &outcome {
                IssuanceOutcome::Issued(_) => StatusCode::CREATED,
                IssuanceOutcome::Denied(DenialReason::RecentlyCertified { .. }) => {
                    StatusCode::CONFLICT
                }
                IssuanceOutcome::Denied(_) => StatusCode::UNPROCESSABLE_ENTITY,
            };
            (status, axum::Json(outcome.view())).into_response()
        }
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn history_handler<R, N>(
    State(service): State<Arc<PulseScoreService<R, N>>>,
    Path(unit): Path<String>,
) -> Response
where
    R: PulseRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.certification_history(&UnitId(unit)) {
        Ok(history) => (StatusCode::OK, axum::Json(history)).into_response(),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn resend_handler<R, N>(
    State(service): State<Arc<PulseScoreService<R, N>>>,
    Path(certificate_id): Path<String>,
) -> Response
where
    R: PulseRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.resend_notification(&CertificationId(certificate_id.clone())) {
        Ok(status) => (StatusCode::OK, axum::Json(status)).into_response(),
        Err(PulseServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "success": false,
                "error": format!("certification {certificate_id} not found"),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => service_error_response(other),
    }
}

fn service_error_response(error: PulseServiceError) -> Response {
    let status = match &error {
        PulseServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        PulseServiceError::Notification(_) => StatusCode::BAD_GATEWAY,
        PulseServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "success": false,
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
