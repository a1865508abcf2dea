// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Database migrations for kurso-server.
//!
//! Migrations are embedded at compile time from the `migrations/` directory.
//!
//! # Example
//!
//! ```ignore
//! use sqlx::PgPool;
//! use kurso_server::migrations;
//!
//! let pool = PgPool::connect(&database_url).await?;
//! migrations::run(&pool).await?;
//! ```

use sqlx::migrate::{MigrateError, Migration, Migrator};

/// All migrations, embedded at compile time.
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run all pending migrations.
///
/// Safe to call multiple times; already-applied migrations are skipped.
pub async fn run(pool: &sqlx::PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Iterate over the embedded migrations, sorted by version.
pub fn iter() -> impl Iterator<Item = &'static Migration> {
    MIGRATOR.iter()
}
