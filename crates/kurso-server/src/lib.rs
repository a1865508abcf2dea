// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Kurso Server - Course Lifecycle Backend
//!
//! This crate is the I/O half of the kurso training-course backend: the
//! PostgreSQL persistence layer, the course lifecycle engine, the periodic
//! status scheduler, and the HTTP boundary.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP clients                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 kurso-server (This Crate)                   │
//! │  ┌────────────┐  ┌───────────────┐  ┌───────────────────┐   │
//! │  │   HTTP     │  │   Lifecycle   │  │      Status       │   │
//! │  │  handlers  │──│    service    │◄─│     scheduler     │   │
//! │  └────────────┘  └───────┬───────┘  └───────────────────┘   │
//! │                  ┌───────┴───────┐                          │
//! │                  │  Reconciler   │                          │
//! │                  │  + Allocator  │                          │
//! │                  └───────────────┘                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        PostgreSQL                           │
//! │           (courses, course_sections, section_resources)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Write ownership
//!
//! The status scheduler writes only the three derived course flags; the
//! reconciler writes only scalar fields, sections, and resources. The two
//! never touch the same column, so they need no cross-component locking.
//! Concurrent edits of the *same* course are serialized by a `FOR UPDATE`
//! row lock taken at the top of every content-mutating transaction.
//!
//! # HTTP API
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /health` | Database connectivity probe |
//! | `POST /courses` | Create a course |
//! | `GET /courses/{id}` | A course with its nested sections/resources |
//! | `PATCH /courses/{id}` | Update scalar fields, optionally reconcile content |
//! | `POST /courses/{id}/sections` | Create a section (position allocated if absent) |
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `KURSO_DATABASE_URL` | Yes* | - | PostgreSQL connection string |
//! | `DATABASE_URL` | Yes* | - | Fallback if above not set |
//! | `KURSO_HTTP_PORT` | No | `8080` | HTTP listen port |
//! | `KURSO_STATUS_POLL_INTERVAL_SECS` | No | `60` | Scheduler tick interval |
//! | `KURSO_DB_MAX_CONNECTIONS` | No | `10` | Database pool size |
//!
//! # Modules
//!
//! - [`config`]: Server configuration from environment variables
//! - [`db`]: PostgreSQL persistence for courses, sections, and resources
//! - [`error`]: Error taxonomy for lifecycle operations
//! - [`handlers`]: HTTP request handlers
//! - [`http`]: Router and error-to-response mapping
//! - [`lifecycle`]: The course lifecycle façade
//! - [`migrations`]: Embedded schema migrations
//! - [`order`]: Section position allocation
//! - [`reconcile`]: Transactional content reconciliation
//! - [`runtime`]: Embeddable runtime (builder, start/shutdown)
//! - [`scheduler`]: Periodic status flag recomputation

#![deny(missing_docs)]

/// Server configuration loaded from environment variables.
pub mod config;

/// PostgreSQL database operations for courses, sections, and resources.
pub mod db;

/// Error types for lifecycle operations.
pub mod error;

/// HTTP request handlers.
pub mod handlers;

/// HTTP router and error-to-response mapping.
pub mod http;

/// Course lifecycle façade.
pub mod lifecycle;

/// Embedded database migrations.
pub mod migrations;

/// Section position allocation.
pub mod order;

/// Transactional content reconciliation.
pub mod reconcile;

/// Embeddable runtime for kurso-server.
pub mod runtime;

/// Periodic status flag recomputation.
pub mod scheduler;

pub use config::Config;
pub use error::Error;
