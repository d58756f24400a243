pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

pub use state::{AppState, ServiceSettings};

/// Builds the full HTTP surface over `state`.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        // Account routes
        .route("/register", post(handlers::handle_register))
        .route("/refill", post(handlers::handle_refill))
        .route("/users", get(handlers::list_users))

        // Metered routes
        .route("/classify", post(handlers::classify_url))
        .route("/classify-image", post(handlers::classify_upload))

        .route("/health", get(handlers::health))

        .layer(from_fn(middleware::log_requests))

        // Upload limits from config
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))

        .with_state(state)
}
