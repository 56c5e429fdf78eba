use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use sealwire_auth::CredentialVerifier;
use sealwire_crypto::{KeyDeriver, MasterKey, MasterKeySource};
use sealwire_gateway::{logging, router, AppState, GatewayConfig, Protection};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::parse();
    logging::init(&config.log_level, config.log_format)?;

    if config.jwt_secret.is_empty() {
        bail!("JWT_SECRET must not be empty");
    }
    let verifier = CredentialVerifier::new(&config.jwt_secret).context("loading JWT_SECRET")?;
    if !verifier.is_strong() {
        warn!(
            secret_len = verifier.secret_len(),
            "JWT_SECRET is shorter than 32 bytes; detailed health will report degraded"
        );
    }

    let (master, source) = MasterKey::load_or_generate(config.master_encryption_key.as_deref())
        .context("loading MASTER_ENCRYPTION_KEY")?;
    match &source {
        MasterKeySource::Configured => {
            info!(fingerprint = %master.fingerprint(), "master key loaded from MASTER_ENCRYPTION_KEY")
        }
        MasterKeySource::GeneratedMissing => warn!(
            generated_key = %master.to_hex(),
            "MASTER_ENCRYPTION_KEY not set; generated a key. Set MASTER_ENCRYPTION_KEY to this value to keep sessions decryptable across restarts"
        ),
        MasterKeySource::GeneratedInvalid(reason) => warn!(
            %reason,
            generated_key = %master.to_hex(),
            "MASTER_ENCRYPTION_KEY invalid; generated a key. Set MASTER_ENCRYPTION_KEY to this value to keep sessions decryptable across restarts"
        ),
    }

    let settings = config.protection_settings();
    if !settings.verification_enabled {
        warn!("JWT verification disabled; protected routes serve anonymous sessions");
    }
    if !settings.encryption_enabled {
        warn!("body encryption disabled; protected routes exchange plaintext JSON");
    }
    info!(
        unprotected = ?settings.unprotected.iter().collect::<Vec<_>>(),
        replay_window_ms = settings.replay_window.window_ms(),
        key_cache_capacity = config.key_cache_capacity,
        "protection configured"
    );

    let keys = KeyDeriver::new(master, config.key_cache_capacity);
    let protection = Arc::new(Protection::new(verifier, keys, source, settings));
    let app = router(Arc::new(AppState::new(protection)));

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;
    info!("sealwire gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
