// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Embeddable runtime for kurso-server.
//!
//! [`ServerRuntime`] owns the process's long-lived pieces — the status
//! scheduler task and the HTTP server — and starts and stops them
//! explicitly. Nothing here runs as an import-time side effect: the binary
//! (or a test) builds a runtime, starts it, and shuts it down.
//!
//! # Example
//!
//! ```rust,ignore
//! use kurso_server::runtime::ServerRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = sqlx::PgPool::connect("postgres://...").await?;
//!
//!     let running = ServerRuntime::builder()
//!         .pool(pool)
//!         .bind_addr("0.0.0.0:8080".parse()?)
//!         .build()?
//!         .start()
//!         .await?;
//!
//!     // ... run your application ...
//!
//!     running.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::PgPool;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use kurso_core::clock::{Clock, SystemClock};

use crate::handlers::AppState;
use crate::http;
use crate::lifecycle::CourseLifecycleService;
use crate::scheduler::{StatusScheduler, StatusSchedulerConfig};

/// Builder for creating a [`ServerRuntime`].
pub struct ServerRuntimeBuilder {
    pool: Option<PgPool>,
    clock: Arc<dyn Clock>,
    bind_addr: SocketAddr,
    status_poll_interval: Duration,
}

impl Default for ServerRuntimeBuilder {
    fn default() -> Self {
        Self {
            pool: None,
            clock: Arc::new(SystemClock),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            status_poll_interval: Duration::from_secs(60),
        }
    }
}

impl ServerRuntimeBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database pool (required).
    pub fn pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Inject a clock. Defaults to the system clock; tests pin a fixed one.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the HTTP listen address.
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the status scheduler's poll interval.
    pub fn status_poll_interval(mut self, interval: Duration) -> Self {
        self.status_poll_interval = interval;
        self
    }

    /// Build the runtime.
    pub fn build(self) -> Result<ServerRuntime> {
        let pool = self
            .pool
            .ok_or_else(|| anyhow::anyhow!("ServerRuntime requires a database pool"))?;

        Ok(ServerRuntime {
            pool,
            clock: self.clock,
            bind_addr: self.bind_addr,
            status_poll_interval: self.status_poll_interval,
        })
    }
}

/// A configured but not yet started runtime.
pub struct ServerRuntime {
    pool: PgPool,
    clock: Arc<dyn Clock>,
    bind_addr: SocketAddr,
    status_poll_interval: Duration,
}

impl ServerRuntime {
    /// Create a builder.
    pub fn builder() -> ServerRuntimeBuilder {
        ServerRuntimeBuilder::new()
    }

    /// Start the scheduler task and the HTTP server.
    pub async fn start(self) -> Result<RunningServer> {
        let lifecycle = Arc::new(CourseLifecycleService::new(self.pool, self.clock));

        let scheduler = StatusScheduler::new(
            lifecycle.clone(),
            StatusSchedulerConfig {
                poll_interval: self.status_poll_interval,
            },
        );
        let scheduler_shutdown = scheduler.shutdown_handle();
        let scheduler_handle = tokio::spawn(scheduler.run());

        let app = http::router(AppState { lifecycle });
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;
        let local_addr = listener.local_addr()?;

        let http_shutdown = Arc::new(Notify::new());
        let notify = http_shutdown.clone();
        let http_handle = tokio::spawn(async move {
            let shutdown = async move { notify.notified().await };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "HTTP server error");
            }
        });

        info!(addr = %local_addr, "Server started");

        Ok(RunningServer {
            local_addr,
            scheduler_shutdown,
            scheduler_handle,
            http_shutdown,
            http_handle,
        })
    }
}

/// Handle to a started runtime.
pub struct RunningServer {
    local_addr: SocketAddr,
    scheduler_shutdown: Arc<Notify>,
    scheduler_handle: JoinHandle<()>,
    http_shutdown: Arc<Notify>,
    http_handle: JoinHandle<()>,
}

impl RunningServer {
    /// The address the HTTP server is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signal both tasks to stop and wait for them to finish.
    pub async fn shutdown(self) {
        info!("Shutting down");

        self.scheduler_shutdown.notify_one();
        self.http_shutdown.notify_one();

        if let Err(e) = self.scheduler_handle.await {
            warn!(error = %e, "Scheduler task panicked during shutdown");
        }
        if let Err(e) = self.http_handle.await {
            warn!(error = %e, "HTTP task panicked during shutdown");
        }

        info!("Shutdown complete");
    }
}
