// =============================================================================
// REST API Endpoints: Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`.  Every endpoint is a read-only
// analysis view, so none require authentication.  CORS is configured
// permissively for development; tighten `allowed_origins` in production.
//
// The analyze endpoint is the whole product surface: one request, one
// synchronous batch pass over the fetched series, one JSON report back.
// Undefined indicator values cross the wire as `null` so the dashboard
// renders gaps, never zeros.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analyzer::{analyze, AnalysisReport};
use crate::app_state::AppState;
use crate::errors::AnalysisError;
use crate::market_data::rate_limit::RequestPacerSnapshot;
use crate::market_data::{ProviderError, SeriesKey};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/analyze", get(analyze_ticker))
        .route("/api/v1/recent", get(recent))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
    upstream: RequestPacerSnapshot,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
        upstream: state.provider.pacer_snapshot(),
    };
    Json(resp)
}

// =============================================================================
// Analyze
// =============================================================================

#[derive(Debug, Deserialize)]
struct AnalyzeParams {
    ticker: String,
    #[serde(default)]
    start: Option<NaiveDate>,
    #[serde(default)]
    end: Option<NaiveDate>,
}

async fn analyze_ticker(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyzeParams>,
) -> Response {
    let ticker = params.ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "ticker must not be empty");
    }

    let lookback = state.runtime_config.read().default_lookback_days;
    let today = chrono::Utc::now().date_naive();
    let (start, end) = match resolve_range(params.start, params.end, today, lookback) {
        Ok(range) => range,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    // Cache first; the provider is only hit for ranges we have not seen.
    let key = SeriesKey {
        ticker: ticker.clone(),
        start,
        end,
    };
    let series = match state.series_cache.get(&key) {
        Some(series) => series,
        None => match state.provider.fetch_daily(&ticker, start, end).await {
            Ok(series) => {
                state.series_cache.insert(key, series.clone());
                series
            }
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "fetch failed");
                return error_response(provider_status(&e), &e.to_string());
            }
        },
    };

    match analyze(&series) {
        Ok(analysis) => {
            let report = AnalysisReport::new(ticker, series, analysis);
            state.push_summary(report.summary());
            info!(ticker = %report.ticker, id = %report.id, bars = report.bar_count, "analysis served");
            Json(report).into_response()
        }
        Err(e) => {
            warn!(ticker = %ticker, error = %e, "analysis rejected");
            error_response(analysis_status(&e), &e.to_string())
        }
    }
}

/// Fill in the default date range: `end` defaults to today, `start` to
/// `lookback_days` before `end`.
fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
    lookback_days: i64,
) -> Result<(NaiveDate, NaiveDate), String> {
    let end = end.unwrap_or(today);
    let start = start.unwrap_or(end - chrono::Duration::days(lookback_days));
    if start > end {
        return Err(format!("start {start} is after end {end}"));
    }
    Ok((start, end))
}

// =============================================================================
// Recent analyses
// =============================================================================

async fn recent(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.recent())
}

// =============================================================================
// Error mapping
// =============================================================================

/// Analysis failures are structural problems with the requested input, so
/// they all map to 400 for direct display.
fn analysis_status(_err: &AnalysisError) -> StatusCode {
    StatusCode::BAD_REQUEST
}

fn provider_status(err: &ProviderError) -> StatusCode {
    match err {
        ProviderError::Empty(_) => StatusCode::NOT_FOUND,
        ProviderError::Throttled => StatusCode::TOO_MANY_REQUESTS,
        ProviderError::Http(_) | ProviderError::Status(_) | ProviderError::Decode(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message });
    (status, Json(body)).into_response()
}
