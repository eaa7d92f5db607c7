// SPDX-License-Identifier: Apache-2.0

//! Portfolio API Service
//!
//! Backend for an academic personal site. The public surface is a
//! contact form gateway with a persistent sliding-window rate limit:
//!
//! - 5 submissions per source address per hour (default)
//! - quota ledger stored in SurrealDB, so restarts keep open windows
//! - expired ledger rows pruned by a background sweep
//!
//! Content reads (profile, publications, research projects, students,
//! gallery) are public; message triage and content editing sit behind
//! a bearer token.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `DATABASE_PATH`: SurrealDB path, or "memory" (default: memory)
//! - `RATE_LIMIT_MAX_SUBMISSIONS`: Submissions per window (default: 5)
//! - `RATE_LIMIT_WINDOW_SECS`: Window length in seconds (default: 3600)
//! - `RATE_LIMIT_SWEEP_INTERVAL_SECS`: Sweep cadence (default: 600)
//! - `ADMIN_TOKEN`: Bearer token for /api/admin (unset disables admin)
//! - `METRICS_ENABLED` / `METRICS_PATH`: Prometheus endpoint toggle

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use portfolio_api::{
    config::Config,
    db::Database,
    handlers::{self, AppState},
    limiter::SubmissionLimiter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        database_path = %config.database.path,
        max_submissions = config.rate_limit.max_submissions,
        window_secs = config.rate_limit.window_secs,
        "Starting portfolio API"
    );

    if config.admin.token.is_none() {
        warn!("ADMIN_TOKEN is not set; the admin API will reject every request");
    }

    // Connect storage and create application state
    let db = Database::connect(&config.database.path).await?;
    let limiter = SubmissionLimiter::new(db.clone(), config.rate_limit.clone());

    let state = Arc::new(AppState {
        db,
        limiter,
        config: config.clone(),
    });

    // Spawn the ledger sweep task
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_state.config.rate_limit.sweep_interval());
        loop {
            interval.tick().await;
            if let Err(err) = sweep_state.limiter.sweep().await {
                warn!(error = %err, "Ledger sweep failed");
            }
        }
    });

    // Build router
    let app = handlers::router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
