//! procontext binary entry point.
//!
//! Sequences: load config -> init logging -> build `AppState` -> spawn the
//! maintenance task -> bind the configured transport. Any failure before
//! "bind transport" is a startup failure: print to stderr, exit non-zero,
//! serve no MCP traffic.

use std::process::ExitCode;
use std::sync::Arc;

use procontext_types::{Config, LogFormat, LogLevel, Transport};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match procontext_config::load() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("procontext: failed to load configuration: {error}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config);

    let state = match procontext_core::build_app_state(config).await {
        Ok(state) => Arc::new(state),
        Err(error) => {
            eprintln!("procontext: startup failed: {error}");
            return ExitCode::FAILURE;
        }
    };

    let maintenance = procontext_core::maintenance::spawn(
        state.cache.clone(),
        state.config.cache.cleanup_interval_hours,
    );

    let transport_result = run_transport(Arc::clone(&state)).await;

    maintenance.abort();

    match transport_result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("procontext: transport error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run_transport(state: Arc<procontext_core::AppState>) -> anyhow::Result<()> {
    match state.config.server.transport {
        Transport::Stdio => procontext_engine::stdio::run(state).await,
        Transport::Http => run_http(state).await,
    }
}

#[cfg(feature = "http")]
async fn run_http(state: Arc<procontext_core::AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.host/server.port: {e}"))?;
    procontext_engine::http::run(state, addr).await
}

#[cfg(not(feature = "http"))]
async fn run_http(_state: Arc<procontext_core::AppState>) -> anyhow::Result<()> {
    anyhow::bail!(
        "server.transport=http requires building procontext with the \"http\" feature enabled"
    )
}

/// Structured logging via `tracing`, leveled and formatted per config, with
/// an `EnvFilter` override available for local debugging.
fn init_tracing(config: &Config) {
    let default_directive = match config.logging.level {
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warning => "warn",
        LogLevel::Error => "error",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(env_filter)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(env_filter)
                .init();
        }
    }
}
