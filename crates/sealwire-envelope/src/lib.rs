//! JSON body envelopes for the sealwire gateway.
//!
//! An envelope carries an AES-256-GCM sealed JSON body as hex, plus the
//! sealing time used for the replay window.

pub mod envelope;
pub mod error;
pub mod replay;
pub mod transport;
pub mod types;

pub use envelope::{decode_parts, detect_envelope, envelope_from_sealed, take_skip_flag, DecodedParts};
pub use error::EnvelopeError;
pub use replay::ReplayWindow;
pub use transport::{decrypt_inbound, encrypt_outbound};
pub use types::{Envelope, DEFAULT_REPLAY_WINDOW_MS, SKIP_ENCRYPTION_FIELD};
