// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Kurso Core - Domain Model and Lifecycle Rules
//!
//! This crate holds the pure domain layer of the kurso training-course
//! backend: the course/section/resource model, the status rule table that
//! derives a course's visibility flags from its type and date window, the
//! desired-tree types accepted by the content reconciliation boundary, and
//! the pre-write validation checks. Nothing in this crate performs I/O.
//!
//! # Status Rule Table
//!
//! A course's `{active, visible, enrollment_open}` triple is a pure function
//! of its type and where the current date falls relative to its date window:
//!
//! | type  | window  | active | visible | enrollment_open |
//! |-------|---------|--------|---------|-----------------|
//! | sync  | ended   | false  | true    | false           |
//! | sync  | ongoing | true   | true    | false           |
//! | sync  | future  | false  | true    | true            |
//! | async | ended   | false  | false   | false           |
//! | async | ongoing | true   | true    | true            |
//! | async | future  | false  | true    | true            |
//!
//! Windows are evaluated against `tomorrow = today + 1 day` so the boundary
//! day counts as ongoing under a day-granularity clock. See [`status`].
//!
//! # Modules
//!
//! - [`clock`]: Injectable date source for the status scheduler
//! - [`error`]: Field-level validation error type
//! - [`model`]: Course, section, and resource types plus desired-tree types
//! - [`status`]: Date-window classification and the status rule table
//! - [`validate`]: Pre-write validation checks

#![deny(missing_docs)]

/// Injectable date source.
pub mod clock;

/// Validation error types.
pub mod error;

/// Course, section, and resource domain types.
pub mod model;

/// Date-window classification and the status rule table.
pub mod status;

/// Pre-write validation checks.
pub mod validate;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::ValidationError;
pub use model::{
    Course, CourseTree, CourseType, DesiredResource, DesiredSection, Resource, ResourcePayload,
    Section, SectionStatus, SectionTree, StatusFlags,
};
pub use status::{DateWindow, classify, flags_for};
