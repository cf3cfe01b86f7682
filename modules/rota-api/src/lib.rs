//! HTTP + realtime surface over the chore domain.
//!
//! The binary wires a Postgres-backed store into the command handlers,
//! spawns the fanout relay, and serves the REST routes plus the `/ws`
//! realtime endpoint.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

pub mod jwt;
pub mod registry;
pub mod relay;
pub mod rest;
pub mod ws;

use jwt::AuthService;
use registry::ConnectionRegistry;
use rota_core::ChoreService;

pub struct AppState {
    pub service: ChoreService,
    pub registry: Arc<ConnectionRegistry>,
    pub auth: Arc<dyn AuthService>,
}

/// All routes, REST and realtime, over the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Realtime
        .route("/ws", get(ws::ws_handler))
        // REST API
        .route(
            "/api/chores",
            get(rest::chores::list_chores).post(rest::chores::create_chore),
        )
        .route(
            "/api/chores/{id}",
            get(rest::chores::get_chore).delete(rest::chores::delete_chore),
        )
        .route("/api/chores/{id}/join", post(rest::chores::join_chore))
        .route("/api/chores/{id}/people", post(rest::chores::add_person))
        .route(
            "/api/chores/{id}/people/{person_id}",
            delete(rest::chores::remove_person),
        )
        .route("/api/chores/{id}/advance", post(rest::chores::advance_queue))
        .with_state(state)
}
