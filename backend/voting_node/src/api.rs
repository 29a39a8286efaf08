//! Axum REST API handlers.
//!
//! The API is read-only: it serves what the indexer has stored. Every
//! state change goes through a signed transaction against the contract.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db;
use crate::errors::{NodeError, Result};
use crate::events::{EventRecord, VotingRecord};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(get_all_events))
        .route("/votings", get(list_votings))
        .route("/votings/due", get(due_votings))
        .route("/votings/:id", get(get_voting))
        .route("/votings/:id/events", get(get_voting_events))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Ledger the next poll starts from.
    pub last_ledger: i64,
    pub votings: usize,
    pub last_event_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
pub struct VotingsResponse {
    pub count: usize,
    pub votings: Vec<VotingRecord>,
}

#[derive(Serialize, Deserialize)]
pub struct DueVotingsResponse {
    /// Clock the deadlines were compared against.
    pub now: DateTime<Utc>,
    pub count: usize,
    pub votings: Vec<VotingRecord>,
}

#[derive(Serialize, Deserialize)]
pub struct EventsResponse {
    pub voting_id: i64,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize, Deserialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health(State(state): State<Arc<ApiState>>) -> Result<Json<HealthResponse>> {
    let (last_ledger, _) = db::get_cursor(&state.pool).await?;
    let votings = db::get_votings(&state.pool).await?.len();
    let last_event_at = db::latest_event_timestamp(&state.pool)
        .await?
        .and_then(|secs| DateTime::from_timestamp(secs, 0));

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        last_ledger,
        votings,
        last_event_at,
    }))
}

/// `GET /votings`
pub async fn list_votings(State(state): State<Arc<ApiState>>) -> Result<Json<VotingsResponse>> {
    let votings = db::get_votings(&state.pool).await?;
    Ok(Json(VotingsResponse {
        count: votings.len(),
        votings,
    }))
}

/// `GET /votings/due`
///
/// Votings past their deadline that nobody has closed yet.
pub async fn due_votings(State(state): State<Arc<ApiState>>) -> Result<Json<DueVotingsResponse>> {
    let now = Utc::now();
    let votings = db::get_due_votings(&state.pool, now.timestamp()).await?;
    Ok(Json(DueVotingsResponse {
        now,
        count: votings.len(),
        votings,
    }))
}

/// `GET /votings/:id`
pub async fn get_voting(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<Json<VotingRecord>> {
    db::get_voting(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| NodeError::NotFound(format!("voting {id}")))
}

/// `GET /votings/:id/events`
///
/// Returns all indexed events for the given voting.
pub async fn get_voting_events(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<Json<EventsResponse>> {
    if db::get_voting(&state.pool, id).await?.is_none() {
        return Err(NodeError::NotFound(format!("voting {id}")));
    }
    let events = db::get_events_for_voting(&state.pool, id).await?;
    Ok(Json(EventsResponse {
        voting_id: id,
        count: events.len(),
        events,
    }))
}

/// `GET /events`
///
/// Returns all indexed events across all votings.
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> Result<Json<AllEventsResponse>> {
    let events = db::get_all_events(&state.pool).await?;
    Ok(Json(AllEventsResponse {
        count: events.len(),
        events,
    }))
}
