use std::sync::Arc;
use std::time::Instant;

use axum::extract::Extension;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::health::{health, health_detailed};
use crate::middleware::protect;
use crate::protection::{Protection, Session};
use crate::request_id::RequestId;

pub struct AppState {
    pub protection: Arc<Protection>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(protection: Arc<Protection>) -> Self {
        Self {
            protection,
            started_at: Instant::now(),
        }
    }
}

/// Current caller's claims.
async fn current_session(session: Session) -> Json<Value> {
    Json(json!({
        "success": true,
        "user": {
            "userId": session.claims.user_id,
            "email": session.claims.email,
            "role": session.claims.role,
        },
        "issuedAt": session.claims.issued_at,
        "expiresAt": session.claims.expires_at,
        "verified": session.verified,
    }))
}

/// Return the (already decrypted) request body.
async fn echo(
    session: Session,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<Value>,
) -> Json<Value> {
    info!(user_id = %session.claims.user_id, request_id = %request_id, "echo");
    Json(json!({ "success": true, "data": body }))
}

/// Built-in routes with the protection layer applied.
pub fn router(state: Arc<AppState>) -> Router {
    let protection = state.protection.clone();
    protect(build_routes(Router::new()), protection).with_state(state)
}

/// Mount the built-in routes on `routes` (which may carry application routes)
/// before the protection layer is applied.
pub fn build_routes(routes: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    routes
        .route("/api/health", get(health))
        .route("/api/health/detailed", get(health_detailed))
        .route("/api/session", get(current_session))
        .route("/api/echo", post(echo))
}
