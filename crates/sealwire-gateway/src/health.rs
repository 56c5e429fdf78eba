use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::app::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "status": "healthy",
        "service": "sealwire-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "uptime": state.started_at.elapsed().as_secs(),
    }))
}

/// Crypto self-test plus secret checks. 503 when anything fails.
pub async fn health_detailed(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = state.protection.self_test(Utc::now().timestamp_millis());
    let healthy = report.healthy();
    let settings = state.protection.settings();

    if healthy {
        info!(crypto_test = report.crypto_test, "detailed health check");
    } else {
        warn!(
            crypto_test = report.crypto_test,
            jwt_secret_valid = report.jwt_secret_valid,
            error = report.error.as_deref().unwrap_or(""),
            "detailed health check degraded"
        );
    }

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = json!({
        "success": healthy,
        "status": if healthy { "healthy" } else { "degraded" },
        "timestamp": Utc::now().to_rfc3339(),
        "services": {
            "crypto": {
                "status": if healthy { "healthy" } else { "unhealthy" },
                "report": report,
                "verificationEnabled": settings.verification_enabled,
                "encryptionEnabled": settings.encryption_enabled,
                "replayWindowMs": settings.replay_window.window_ms(),
            },
        },
        "system": {
            "uptime": state.started_at.elapsed().as_secs(),
            "version": env!("CARGO_PKG_VERSION"),
        },
    });
    (status, Json(body))
}
