// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All data endpoints live under `/api/v1/` and answer with the same envelope:
//
//   { "success": true,  "data": ..., "timestamp": <ms> }
//   { "success": false, "error": "...", "timestamp": <ms> }
//
// Engine failures map to 500, a bad `type` query to 400, unknown routes to
// 404 and rate-limited requests to 429.
//
// CORS is configured permissively.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::analytics::models::{
    ConcentrationRisk, LiquidityOpportunity, MarketAnalytics, MarketOverview, MomentumSignal,
    OrderbookDepth, VolatilityAlert,
};
use crate::analytics::AnalyticsError;
use crate::api::middleware::{enforce_rate_limit, log_requests};
use crate::api::rate_limit::RateLimitSnapshot;
use crate::app_state::AppState;
use crate::cache::CacheStatus;
use crate::types::MarketKind;

const SERVICE_NAME: &str = "Injective Market Intelligence API";

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Service ─────────────────────────────────────────────────
        .route("/", get(service_info))
        .route("/api/v1/health", get(health))
        // ── Markets ─────────────────────────────────────────────────
        .route("/api/v1/markets/overview", get(market_overview))
        .route("/api/v1/markets/concentration-risk", get(concentration_risk))
        .route("/api/v1/markets/:market_id/analytics", get(market_analytics))
        .route("/api/v1/markets/:market_id/orderbook-depth", get(orderbook_depth))
        // ── Signals ─────────────────────────────────────────────────
        .route("/api/v1/signals/momentum", get(momentum_signals))
        .route("/api/v1/signals/volatility-alerts", get(volatility_alerts))
        .route(
            "/api/v1/signals/liquidity-opportunities",
            get(liquidity_opportunities),
        )
        // ── Cache ───────────────────────────────────────────────────
        .route("/api/v1/cache/status", get(cache_status))
        .route("/api/v1/cache/clear", post(clear_cache))
        .fallback(not_found)
        // ── Middleware & State ───────────────────────────────────────
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_rate_limit,
        ))
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Envelope
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// A failed request: status plus the message placed in the envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        error!(error = %err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

/// `?type=spot|derivative`, defaulting to spot.
#[derive(Debug, Deserialize)]
struct MarketQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl MarketQuery {
    fn kind(&self) -> Result<MarketKind, ApiError> {
        match self.kind.as_deref() {
            None => Ok(MarketKind::default()),
            Some(raw) => raw.parse().map_err(ApiError::bad_request),
        }
    }
}

// =============================================================================
// Service
// =============================================================================

async fn service_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "description": "Market analytics, trading signals and risk metrics for Injective markets",
        "endpoints": {
            "health": "/api/v1/health",
            "markets": "/api/v1/markets",
            "signals": "/api/v1/signals",
            "cache": "/api/v1/cache",
        },
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
    uptime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_limit: Option<RateLimitSnapshot>,
}

async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    Ok(ApiResponse::ok(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime: state.uptime_secs(),
        rate_limit: state.rate_limiter.as_ref().map(|l| l.snapshot()),
    }))
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Endpoint not found")
}

// =============================================================================
// Markets
// =============================================================================

async fn market_overview(State(state): State<Arc<AppState>>) -> ApiResult<Arc<MarketOverview>> {
    Ok(ApiResponse::ok(state.engine.market_overview().await?))
}

async fn market_analytics(
    State(state): State<Arc<AppState>>,
    Path(market_id): Path<String>,
    Query(query): Query<MarketQuery>,
) -> ApiResult<Arc<MarketAnalytics>> {
    let kind = query.kind()?;
    Ok(ApiResponse::ok(
        state.engine.market_analytics(&market_id, kind).await?,
    ))
}

async fn orderbook_depth(
    State(state): State<Arc<AppState>>,
    Path(market_id): Path<String>,
    Query(query): Query<MarketQuery>,
) -> ApiResult<Arc<OrderbookDepth>> {
    let kind = query.kind()?;
    Ok(ApiResponse::ok(
        state.engine.orderbook_depth(&market_id, kind).await?,
    ))
}

async fn concentration_risk(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Arc<ConcentrationRisk>> {
    Ok(ApiResponse::ok(state.engine.concentration_risk().await?))
}

// =============================================================================
// Signals
// =============================================================================

async fn momentum_signals(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Arc<Vec<MomentumSignal>>> {
    Ok(ApiResponse::ok(state.engine.momentum_signals().await?))
}

async fn volatility_alerts(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Arc<Vec<VolatilityAlert>>> {
    Ok(ApiResponse::ok(state.engine.volatility_alerts().await?))
}

async fn liquidity_opportunities(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Arc<Vec<LiquidityOpportunity>>> {
    Ok(ApiResponse::ok(state.engine.liquidity_opportunities().await?))
}

// =============================================================================
// Cache
// =============================================================================

async fn cache_status(State(state): State<Arc<AppState>>) -> ApiResult<CacheStatus> {
    Ok(ApiResponse::ok(state.engine.cache_status()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClearResponse {
    cleared_entries: usize,
}

async fn clear_cache(State(state): State<Arc<AppState>>) -> ApiResult<ClearResponse> {
    Ok(ApiResponse::ok(ClearResponse {
        cleared_entries: state.engine.clear_cache(),
    }))
}
