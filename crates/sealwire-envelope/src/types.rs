use serde::{Deserialize, Serialize};

/// Default maximum envelope age, in milliseconds.
pub const DEFAULT_REPLAY_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Body field that asks for a response to be sent in plaintext.
pub const SKIP_ENCRYPTION_FIELD: &str = "skipEncryption";

/// Wire form of an encrypted JSON body.
///
/// Byte fields are lowercase hex; `timestamp` is Unix milliseconds at sealing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub data: String,
    pub iv: String,
    #[serde(rename = "authTag")]
    pub auth_tag: String,
    pub timestamp: i64,
}
