use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use sealwire_auth::{AuthError, RejectReason};
use sealwire_envelope::EnvelopeError;

/// Every way a protected request can fail.
///
/// `detail` fields are for logs only and never reach the client.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing bearer credential")]
    MissingToken,

    #[error("credential rejected ({reason}): {detail}")]
    InvalidToken { reason: RejectReason, detail: String },

    #[error("envelope outside replay window: {detail}")]
    ReplayRejected { detail: String },

    #[error("envelope failed to decrypt: {detail}")]
    CryptoFailure { detail: String },

    #[error("decrypted payload unusable: {detail}")]
    MalformedPayload { detail: String },

    #[error("response encryption failed: {detail}")]
    EncryptionFailed { detail: String },

    #[error("internal error: {detail}")]
    Internal { detail: String },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

impl GatewayError {
    pub fn internal(detail: impl Into<String>) -> Self {
        GatewayError::Internal {
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingToken | GatewayError::InvalidToken { .. } => StatusCode::UNAUTHORIZED,
            GatewayError::ReplayRejected { .. }
            | GatewayError::CryptoFailure { .. }
            | GatewayError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            GatewayError::EncryptionFailed { .. } | GatewayError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::MissingToken => "MISSING_TOKEN",
            GatewayError::InvalidToken { .. } => "INVALID_TOKEN",
            GatewayError::ReplayRejected { .. } => "INVALID_TIMESTAMP",
            GatewayError::CryptoFailure { .. } => "DECRYPTION_FAILED",
            GatewayError::MalformedPayload { .. } => "PARSE_ERROR",
            GatewayError::EncryptionFailed { .. } => "ENCRYPTION_FAILED",
            GatewayError::Internal { .. } => "MIDDLEWARE_ERROR",
        }
    }

    /// Generic client-facing message.
    pub fn message(&self) -> &'static str {
        match self {
            GatewayError::MissingToken => "Authentication required",
            GatewayError::InvalidToken { .. } => "Invalid or expired token",
            GatewayError::ReplayRejected { .. } => "Request expired or invalid timestamp",
            GatewayError::CryptoFailure { .. } => "Invalid encrypted payload",
            GatewayError::MalformedPayload { .. } => "Invalid payload format",
            GatewayError::EncryptionFailed { .. } => "Response encryption failed",
            GatewayError::Internal { .. } => "Internal server error",
        }
    }

    fn reason(&self) -> Option<&'static str> {
        match self {
            GatewayError::InvalidToken { reason, .. } => Some(reason.as_str()),
            _ => None,
        }
    }

    fn log(&self) {
        let code = self.code();
        match self {
            GatewayError::EncryptionFailed { .. } | GatewayError::Internal { .. } => {
                error!(code, error = %self, "request failed")
            }
            _ => warn!(code, error = %self, "request rejected"),
        }
    }
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        match err.reason() {
            RejectReason::Missing => GatewayError::MissingToken,
            reason => GatewayError::InvalidToken {
                reason,
                detail: err.to_string(),
            },
        }
    }
}

impl From<EnvelopeError> for GatewayError {
    fn from(err: EnvelopeError) -> Self {
        let detail = err.to_string();
        match err {
            EnvelopeError::InvalidTimestamp { .. } => GatewayError::ReplayRejected { detail },
            EnvelopeError::Decryption(_) => GatewayError::CryptoFailure { detail },
            EnvelopeError::Parse(_) => GatewayError::MalformedPayload { detail },
            EnvelopeError::Encryption(_) => GatewayError::EncryptionFailed { detail },
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.log();
        let body = ErrorBody {
            success: false,
            error: self.message(),
            code: self.code(),
            reason: self.reason(),
        };
        (self.status(), Json(body)).into_response()
    }
}
