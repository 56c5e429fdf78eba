use crate::error::EnvelopeError;
use crate::types::DEFAULT_REPLAY_WINDOW_MS;

/// Stateless timestamp check for inbound envelopes.
///
/// Accepts iff `timestamp > 0` and `|now - timestamp| <= window`. No record of
/// previously seen envelopes is kept, so a captured envelope can be replayed
/// while it is inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayWindow {
    window_ms: i64,
}

impl ReplayWindow {
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms: window_ms.max(0),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    pub fn accepts(&self, timestamp: i64, now_ms: i64) -> bool {
        timestamp > 0 && now_ms.abs_diff(timestamp) <= self.window_ms.unsigned_abs()
    }

    pub fn check(&self, timestamp: i64, now_ms: i64) -> Result<(), EnvelopeError> {
        if self.accepts(timestamp, now_ms) {
            Ok(())
        } else {
            Err(EnvelopeError::InvalidTimestamp {
                timestamp,
                now: now_ms,
                window_ms: self.window_ms,
            })
        }
    }
}

impl Default for ReplayWindow {
    fn default() -> Self {
        Self::new(DEFAULT_REPLAY_WINDOW_MS)
    }
}
