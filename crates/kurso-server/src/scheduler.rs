// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Status scheduler for course lifecycle flags.
//!
//! Periodically recomputes every course's `{active, visible, enrollment_open}`
//! triple from the rule table. Runs once immediately at startup (cold-start
//! catch-up: flags may be stale after downtime) and then on a fixed interval.
//!
//! Ticks never overlap: the next sleep only starts after the previous tick
//! finished, so a slow tick delays but never interleaves with the next one.
//! All tick errors are handled inside the service; the scheduler itself has
//! no caller to propagate failures to.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::info;

use crate::lifecycle::CourseLifecycleService;

/// Status scheduler configuration.
#[derive(Debug, Clone)]
pub struct StatusSchedulerConfig {
    /// How often to recompute course status flags
    pub poll_interval: Duration,
}

impl Default for StatusSchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
        }
    }
}

/// Status scheduler that runs as a background task.
pub struct StatusScheduler {
    service: Arc<CourseLifecycleService>,
    config: StatusSchedulerConfig,
    shutdown: Arc<Notify>,
}

impl StatusScheduler {
    /// Create a new status scheduler.
    pub fn new(service: Arc<CourseLifecycleService>, config: StatusSchedulerConfig) -> Self {
        Self {
            service,
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a handle that can be used to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Run the scheduler loop.
    pub async fn run(self) {
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "Status scheduler started"
        );

        // Cold-start catch-up before the periodic loop.
        self.service.recompute_status().await;

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    info!("Status scheduler received shutdown signal");
                    break;
                }

                _ = tokio::time::sleep(self.config.poll_interval) => {
                    self.service.recompute_status().await;
                }
            }
        }

        info!("Status scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = StatusSchedulerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_config_custom_interval() {
        let config = StatusSchedulerConfig {
            poll_interval: Duration::from_secs(5),
        };
        assert_eq!(config.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_config_debug_and_clone() {
        let config = StatusSchedulerConfig::default();
        let cloned = config.clone();
        assert_eq!(config.poll_interval, cloned.poll_interval);
        assert!(format!("{config:?}").contains("poll_interval"));
    }
}
