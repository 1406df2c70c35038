//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! POST /users/sync    - Run a sync request, returns the report
//! GET  /health        - Liveness
//! GET  /health/ready  - Readiness (database reachable)
//! ```

pub mod health;
pub mod sync;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/sync", post(sync::sync_users))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}
