//! vaultgate - Policy gate for wallet-enclave signing intents
//!
//! A self-hosted service that gates signing requests by key ref:
//! - Loads an allow/deny policy document at startup
//! - Exposes a gRPC interface for checking signing intents
//! - Emits an audit record for every decision
//!
//! # Security
//!
//! - Deny-listed key refs are blocked even if still allow-listed
//! - Key refs in neither list are blocked (default-deny)
//! - Malformed policy documents refuse startup instead of degrading open
//!
//! # Usage
//!
//! ```bash
//! # Start the server
//! vaultgate
//!
//! # Or with a config file
//! vaultgate --config /etc/vaultgate/config.toml
//! ```

use std::env;
use std::sync::Arc;
use tonic::transport::Server;
use tracing::{error, info, warn};
use vaultgate::api::grpc::SignPolicyServer;
use vaultgate::api::{AppState, AuthService, SignPolicyService};
use vaultgate::audit::TracingAuditSink;
use vaultgate::config::Config;
use vaultgate::errors::Result;
use vaultgate::policy::PolicyEngine;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting vaultgate v{}", VERSION);

    // Load configuration
    let config_path = env::args().nth(2); // --config path
    let config = Config::load(config_path.as_deref())?;
    config.validate()?;

    info!("Configuration loaded");

    // Initialize policy engine
    let policy_engine = match &config.policy.rules_path {
        Some(rules_path) if rules_path.exists() => {
            match PolicyEngine::load_from_file(rules_path) {
                Ok(engine) => engine,
                Err(e) => {
                    // A malformed policy must not degrade to allow or to a
                    // guessed deny set; refuse to start.
                    error!("Failed to load policy document: {}", e);
                    return Err(e);
                }
            }
        }
        _ => {
            warn!("No policy document found, starting default-deny");
            PolicyEngine::default()
        }
    };
    let policy_engine = Arc::new(policy_engine);

    // Initialize auth service
    let auth_service = Arc::new(AuthService::new(config.security.require_auth));
    for token in &config.security.api_tokens {
        auth_service.add_token(token);
    }

    // Create application state
    let state = Arc::new(AppState::new(
        policy_engine,
        auth_service,
        Arc::new(TracingAuditSink),
    ));

    // Build gRPC server
    let addr = config.server_addr().parse().map_err(|e| {
        vaultgate::errors::VaultGateError::ConfigError(format!("Invalid address: {}", e))
    })?;

    info!("Starting gRPC server on {}", addr);

    let service = SignPolicyService::new(state);

    Server::builder()
        .add_service(SignPolicyServer::new(service))
        .serve_with_shutdown(addr, shutdown_signal())
        .await
        .map_err(|e| vaultgate::errors::VaultGateError::InternalError(e.to_string()))?;

    info!("Server shut down gracefully");
    Ok(())
}

/// Initialize logging
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
