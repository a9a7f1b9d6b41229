use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::analytics::{AnalyticsSnapshot, TimeWindow};
use crate::config::EngineConfig;
use crate::engine::MatchEngine;
use crate::error::EngineError;
use crate::ranking::RankedMatch;
use crate::scoring::CompatibilityScore;
use crate::suggestions::InsightReport;

const DEFAULT_RANK_LIMIT: usize = 20;

#[derive(Clone)]
struct ApiState {
    engine: Arc<MatchEngine>,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        let status = match &error {
            err if err.is_not_found() => StatusCode::NOT_FOUND,
            EngineError::DependencyTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

#[derive(Debug, Clone, Deserialize)]
struct ScoreRequest {
    profile: String,
    opportunity: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RankOpportunitiesRequest {
    profile: String,
    limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
struct RankProfilesRequest {
    opportunity: String,
    limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
struct SuggestionsRequest {
    profile: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AnalyticsRequest {
    profile: String,
    window: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct RankResponse {
    matches: Vec<RankedMatch>,
}

pub async fn run_server(engine: Arc<MatchEngine>, bind: SocketAddr) -> Result<()> {
    let state = ApiState { engine };
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/score", post(score))
        .route("/v1/rank/opportunities", post(rank_opportunities))
        .route("/v1/rank/profiles", post(rank_profiles))
        .route("/v1/suggestions", post(suggestions))
        .route("/v1/analytics", post(analytics))
        .route("/v1/config", get(show_config))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("match engine API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<EngineConfig>> {
    ok(state.engine.config().clone())
}

async fn score(
    State(state): State<ApiState>,
    Json(request): Json<ScoreRequest>,
) -> ApiResult<CompatibilityScore> {
    let score = state
        .engine
        .score(&request.profile, &request.opportunity, Utc::now())
        .await?;
    Ok(ok(score))
}

async fn rank_opportunities(
    State(state): State<ApiState>,
    Json(request): Json<RankOpportunitiesRequest>,
) -> ApiResult<RankResponse> {
    let limit = request.limit.unwrap_or(DEFAULT_RANK_LIMIT);
    let matches = state
        .engine
        .rank_opportunities(&request.profile, limit, Utc::now())
        .await?;
    Ok(ok(RankResponse { matches }))
}

async fn rank_profiles(
    State(state): State<ApiState>,
    Json(request): Json<RankProfilesRequest>,
) -> ApiResult<RankResponse> {
    let limit = request.limit.unwrap_or(DEFAULT_RANK_LIMIT);
    let matches = state
        .engine
        .rank_profiles(&request.opportunity, limit, Utc::now())
        .await?;
    Ok(ok(RankResponse { matches }))
}

async fn suggestions(
    State(state): State<ApiState>,
    Json(request): Json<SuggestionsRequest>,
) -> ApiResult<InsightReport> {
    let report = state.engine.insights(&request.profile, Utc::now()).await?;
    Ok(ok(report))
}

async fn analytics(
    State(state): State<ApiState>,
    Json(request): Json<AnalyticsRequest>,
) -> ApiResult<AnalyticsSnapshot> {
    let window = parse_window(request.window.as_deref())?;
    let snapshot = state
        .engine
        .analytics(&request.profile, window, Utc::now())
        .await?;
    Ok(ok(snapshot))
}

fn parse_window(raw: Option<&str>) -> std::result::Result<TimeWindow, ApiError> {
    match raw {
        None => Ok(TimeWindow::Month),
        Some(raw) => {
            TimeWindow::from_str(raw).map_err(|error| ApiError::bad_request(error.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn window_defaults_to_month() {
        assert_eq!(parse_window(None).unwrap(), TimeWindow::Month);
        assert_eq!(parse_window(Some("week")).unwrap(), TimeWindow::Week);
        assert!(parse_window(Some("fortnight")).is_err());
    }

    #[test]
    fn engine_errors_map_to_statuses() {
        let not_found: ApiError = EngineError::ProfileNotFound("p1".to_string()).into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);

        let timeout: ApiError = EngineError::DependencyTimeout(Duration::from_secs(2)).into();
        assert_eq!(timeout.status, StatusCode::GATEWAY_TIMEOUT);

        let config: ApiError = EngineError::Config("bad weights".to_string()).into();
        assert_eq!(config.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
