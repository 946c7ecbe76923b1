//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db;
use crate::errors::Result;
use crate::events::{EscrowSummary, EventRecord};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventsResponse {
    pub contract_id: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// All API routes, without middleware.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(get_all_events))
        .route("/escrows/:contract_id/events", get(get_escrow_events))
        .route("/escrows/:contract_id/summary", get(get_escrow_summary))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /escrows/:contract_id/events`
///
/// Returns all indexed events for one escrow contract.
pub async fn get_escrow_events(
    State(state): State<Arc<ApiState>>,
    Path(contract_id): Path<String>,
) -> Result<Json<EventsResponse>> {
    let events = db::get_events_for_contract(&state.pool, &contract_id).await?;
    Ok(Json(EventsResponse {
        contract_id,
        count: events.len(),
        events,
    }))
}

/// `GET /escrows/:contract_id/summary`
///
/// Funded, released and outstanding amounts derived from indexed events.
pub async fn get_escrow_summary(
    State(state): State<Arc<ApiState>>,
    Path(contract_id): Path<String>,
) -> Result<Json<EscrowSummary>> {
    let events = db::get_events_for_contract(&state.pool, &contract_id).await?;
    Ok(Json(EscrowSummary::from_events(&contract_id, &events)?))
}

/// `GET /events`
///
/// Returns all indexed events across all escrows.
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> Result<Json<AllEventsResponse>> {
    let events = db::get_all_events(&state.pool).await?;
    Ok(Json(AllEventsResponse {
        count: events.len(),
        events,
    }))
}
