//! Authentication service built with Rust.
//!
//! Exposes `POST /signup` and `POST /signin` as explicit pipelines: ordered checks
//! that may answer early, followed by a terminal handler.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod routes;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;
pub use routes::{auth_route_table, RouteTable};

use axum::routing::get;
use handlers::http;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Prefix the auth route table is mounted under.
pub const AUTH_PREFIX: &str = "/api/auth";

/// Build the API router (health, auth routes). Used by main and by integration tests.
pub fn create_app(state: AppState, routes: &RouteTable) -> axum::Router {
    axum::Router::new()
        .route("/health", get(http::health))
        .nest(AUTH_PREFIX, routes.router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
