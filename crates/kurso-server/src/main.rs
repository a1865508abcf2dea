// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Kurso Server - Course Lifecycle Backend
//!
//! An HTTP server responsible for:
//! - Course lifecycle (create, update, nested content reconciliation)
//! - Section position allocation
//! - Periodic status flag recomputation

use tracing::{info, warn};

use kurso_server::config::Config;
use kurso_server::migrations;
use kurso_server::runtime::ServerRuntime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kurso_server=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config = Config::from_env()?;

    info!(
        http_addr = %config.http_addr,
        status_poll_interval_secs = config.status_poll_interval.as_secs(),
        "Starting Kurso Server"
    );

    // Connect to database
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    info!("Connected to database");

    // Apply migrations
    migrations::run(&pool).await?;

    info!("Database schema verified");

    // Start the runtime
    let running = ServerRuntime::builder()
        .pool(pool)
        .bind_addr(config.http_addr)
        .status_poll_interval(config.status_poll_interval)
        .build()?
        .start()
        .await?;

    info!(addr = %running.local_addr(), "Kurso Server ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    // Graceful shutdown
    running.shutdown().await;

    info!("Kurso Server shut down");

    Ok(())
}
