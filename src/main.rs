//! Wallet SSO Server
//!
//! Boots the HTTP API for wallet challenge-response sign-in.

use anyhow::Context;
use std::sync::Arc;
use tokio::signal;

use wallet_sso::auth::AuthService;
use wallet_sso::config::Config;
use wallet_sso::routes::create_router;
use wallet_sso::state::AppState;
use wallet_sso::wallet::WalletVerifiers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        wallets = ?config.enabled_wallets,
        "Starting wallet SSO server"
    );

    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set, using development secret");
    }

    let verifiers = WalletVerifiers::from_endpoints(
        &config.enabled_wallets,
        &config.evm_rpc_urls,
        &config.polkadot_rpc_urls,
    )
    .context("Failed to build wallet verifiers")?;

    let auth_service = Arc::new(AuthService::new(config.auth_config(), verifiers));
    let addr = config.socket_addr();
    let app = create_router(AppState::new(auth_service, Arc::new(config)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
