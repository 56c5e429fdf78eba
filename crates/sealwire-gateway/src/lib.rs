//! Per-session authenticated encryption for JSON HTTP APIs.
//!
//! Protected requests are verified against an HS256 bearer credential. A key
//! derived from that credential opens enveloped request bodies and seals every
//! successful JSON response.

pub mod app;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod protection;
pub mod request_id;
pub mod sealer;
pub mod skip;

pub use app::{build_routes, router, AppState};
pub use config::{GatewayConfig, LogFormat};
pub use error::GatewayError;
pub use middleware::{protect, protect_request};
pub use protection::{
    Classification, Protection, ProtectionSettings, SelfTestReport, Session, UnprotectedPaths,
    DEFAULT_UNPROTECTED_PATHS,
};
pub use request_id::{RequestId, REQUEST_ID_HEADER};
pub use sealer::{strip_skip_flag, ResponseSealer, SealedBody};
pub use skip::{skip_response_encryption, SkipEncryption, Unsealed};
