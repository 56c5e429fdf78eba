use clap::{ArgAction, Parser, ValueEnum};

use sealwire_envelope::{ReplayWindow, DEFAULT_REPLAY_WINDOW_MS};

use crate::protection::{ProtectionSettings, UnprotectedPaths, DEFAULT_UNPROTECTED_PATHS};

/// Log output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Gateway command line. Every flag falls back to an environment variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "sealwire-gateway", author, version, about, long_about = None)]
pub struct GatewayConfig {
    /// Bind host.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Bind port.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Log level used when RUST_LOG is unset (e.g. info, debug, trace).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// HS256 secret shared with the token issuer.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Verify bearer credentials on protected routes.
    #[arg(long, env = "JWT_VERIFICATION_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub jwt_verification_enabled: bool,

    /// 64 hex characters. A random key is generated when absent or invalid.
    #[arg(long, env = "MASTER_ENCRYPTION_KEY", hide_env_values = true)]
    pub master_encryption_key: Option<String>,

    /// Encrypt JSON bodies on protected routes.
    #[arg(long, env = "ENCRYPTION_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub encryption_enabled: bool,

    /// Maximum envelope age in milliseconds.
    #[arg(long, env = "REPLAY_WINDOW_MS", default_value_t = DEFAULT_REPLAY_WINDOW_MS)]
    pub replay_window_ms: i64,

    /// Comma-separated paths served without protection.
    #[arg(
        long,
        env = "UNPROTECTED_PATHS",
        value_delimiter = ',',
        default_value = DEFAULT_UNPROTECTED_PATHS
    )]
    pub unprotected_paths: Vec<String>,

    /// Memoized session keys (0 disables).
    #[arg(long, env = "KEY_CACHE_CAPACITY", default_value_t = 256)]
    pub key_cache_capacity: usize,

    /// Largest request body read by the middleware.
    #[arg(long, env = "BODY_LIMIT_BYTES", default_value_t = 1024 * 1024)]
    pub body_limit_bytes: usize,
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn protection_settings(&self) -> ProtectionSettings {
        ProtectionSettings {
            verification_enabled: self.jwt_verification_enabled,
            encryption_enabled: self.encryption_enabled,
            replay_window: ReplayWindow::new(self.replay_window_ms),
            unprotected: UnprotectedPaths::new(&self.unprotected_paths),
            body_limit: self.body_limit_bytes,
        }
    }
}
