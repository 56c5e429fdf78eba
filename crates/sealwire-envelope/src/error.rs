use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Envelope timestamp {timestamp} outside replay window of {window_ms}ms (now {now})")]
    InvalidTimestamp {
        timestamp: i64,
        now: i64,
        window_ms: i64,
    },

    #[error("Envelope decryption failed: {0}")]
    Decryption(String),

    #[error("Decrypted payload is not JSON: {0}")]
    Parse(String),

    #[error("Envelope encryption failed: {0}")]
    Encryption(String),
}

impl EnvelopeError {
    /// Client-facing error code.
    pub fn code(&self) -> &'static str {
        match self {
            EnvelopeError::InvalidTimestamp { .. } => "INVALID_TIMESTAMP",
            EnvelopeError::Decryption(_) => "DECRYPTION_FAILED",
            EnvelopeError::Parse(_) => "PARSE_ERROR",
            EnvelopeError::Encryption(_) => "ENCRYPTION_FAILED",
        }
    }
}
