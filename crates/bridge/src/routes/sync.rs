//! `POST /users/sync`.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::sync::SyncRequest;

/// Run a sync request and return its report.
///
/// The body is parsed by hand so a malformed body or an invalid email is a
/// plain 400 with the parse error as message. Per-user failures are part of
/// the report and never fail the request.
#[instrument(skip_all)]
pub async fn sync_users(State(state): State<AppState>, body: String) -> Result<Response> {
    let request: SyncRequest = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid sync request: {e}")))?;

    tracing::info!(
        users = request.users.len(),
        force = request.force,
        "Sync request received"
    );
    let report = state.run_sync(&request).await;

    let body = serde_json::to_string(&report)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
