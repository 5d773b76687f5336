//! Startup helpers for the relay bot server.

use std::process::ExitCode;

use crate::server::{self, AppState};

/// Run the server until shutdown.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("starting relay bot v{}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            tracing::error!("failed to create runtime: {err}");
            return ExitCode::from(1);
        }
    };

    let state = match rt.block_on(AppState::from_env()) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!("failed to create state: {err}");
            return ExitCode::from(1);
        }
    };

    if let Err(err) = rt.block_on(server::run_server(state, get_port())) {
        tracing::error!("server error: {err}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Get the configured server port.
#[must_use]
pub fn get_port() -> u16 {
    std::env::var("RELAY_PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(server::DEFAULT_PORT)
}
