// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Domain types for courses, sections, and resources.
//!
//! Persisted entities ([`Course`], [`Section`], [`Resource`]) mirror the
//! relational schema. The desired-tree types ([`DesiredSection`],
//! [`DesiredResource`], [`ResourcePayload`]) describe the nested structure a
//! client submits to the content reconciliation boundary; they are tagged so
//! ambiguous payloads are rejected at deserialization rather than deep inside
//! a transaction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::UnknownVariant;

/// Course delivery type. Fixed at creation, never updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseType {
    /// Instructor-led course with a live schedule.
    Synchronous,
    /// Self-paced course consumed on the student's own time.
    Asynchronous,
}

impl CourseType {
    /// Database/wire representation of this variant.
    pub const fn as_str(self) -> &'static str {
        match self {
            CourseType::Synchronous => "synchronous",
            CourseType::Asynchronous => "asynchronous",
        }
    }
}

impl FromStr for CourseType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synchronous" => Ok(CourseType::Synchronous),
            "asynchronous" => Ok(CourseType::Asynchronous),
            other => Err(UnknownVariant::new("course type", other)),
        }
    }
}

/// Section visibility status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    /// Visible to enrolled students.
    #[default]
    Enabled,
    /// Hidden from students, visible to editors.
    Disabled,
}

impl SectionStatus {
    /// Database/wire representation of this variant.
    pub const fn as_str(self) -> &'static str {
        match self {
            SectionStatus::Enabled => "enabled",
            SectionStatus::Disabled => "disabled",
        }
    }
}

impl FromStr for SectionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(SectionStatus::Enabled),
            "disabled" => Ok(SectionStatus::Disabled),
            other => Err(UnknownVariant::new("section status", other)),
        }
    }
}

/// Derived course status triple.
///
/// Owned exclusively by the status scheduler; never client-writable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlags {
    /// The course is currently running.
    pub active: bool,
    /// The course appears in listings.
    pub visible: bool,
    /// New enrollments are accepted.
    pub enrollment_open: bool,
}

/// A course as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Unique identifier.
    pub id: i64,
    /// Course title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Delivery type; immutable after creation.
    pub course_type: CourseType,
    /// First day of the course. Invariant: `start_date <= end_date`.
    pub start_date: NaiveDate,
    /// Last day of the course (inclusive).
    pub end_date: NaiveDate,
    /// Derived status flags.
    #[serde(flatten)]
    pub flags: StatusFlags,
    /// When the course was created.
    pub created_at: DateTime<Utc>,
    /// When the course row was last written.
    pub updated_at: DateTime<Utc>,
}

/// A section as persisted. Belongs to exactly one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Unique identifier.
    pub id: i64,
    /// Owning course.
    pub course_id: i64,
    /// Section title.
    pub title: String,
    /// Visibility status.
    pub status: SectionStatus,
    /// Position within the course. Unique per course.
    pub position: i32,
}

/// A resource as persisted. Belongs to exactly one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier.
    pub id: i64,
    /// Owning section.
    pub section_id: i64,
    /// Resource title.
    pub title: String,
    /// Reference into the resource-type lookup table.
    pub type_id: i64,
    /// The resource's single payload.
    #[serde(flatten)]
    pub payload: ResourcePayload,
    /// Position within the section.
    pub position: i32,
}

/// A resource's payload: exactly one of a stored file reference, an external
/// link, or inline text.
///
/// Externally tagged, so a payload carrying zero or multiple variants is
/// rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourcePayload {
    /// Reference to an uploaded file (storage is an external collaborator).
    File(String),
    /// External URL.
    Link(String),
    /// Inline text content.
    Text(String),
}

impl ResourcePayload {
    /// Database discriminator for this variant.
    pub const fn kind(&self) -> &'static str {
        match self {
            ResourcePayload::File(_) => "file",
            ResourcePayload::Link(_) => "link",
            ResourcePayload::Text(_) => "text",
        }
    }

    /// The payload value, whatever the variant.
    pub fn value(&self) -> &str {
        match self {
            ResourcePayload::File(v) | ResourcePayload::Link(v) | ResourcePayload::Text(v) => v,
        }
    }

    /// Rebuild a payload from its database discriminator and value.
    pub fn from_parts(kind: &str, value: String) -> Result<Self, UnknownVariant> {
        match kind {
            "file" => Ok(ResourcePayload::File(value)),
            "link" => Ok(ResourcePayload::Link(value)),
            "text" => Ok(ResourcePayload::Text(value)),
            other => Err(UnknownVariant::new("payload kind", other)),
        }
    }
}

/// One desired section in a content reconciliation payload.
///
/// Untagged on the wire: a section carrying an `id` references a persisted
/// section, one without is created fresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DesiredSection {
    /// References a persisted section of the course being edited.
    Existing {
        /// Identifier of the persisted section.
        id: i64,
        /// Desired title.
        title: String,
        /// Desired visibility status.
        #[serde(default)]
        status: SectionStatus,
        /// Desired position. `None` keeps the current position.
        #[serde(default)]
        position: Option<i32>,
        /// Desired resources for this section.
        #[serde(default)]
        resources: Vec<DesiredResource>,
    },
    /// A section not yet persisted.
    New {
        /// Title for the new section.
        title: String,
        /// Visibility status for the new section.
        #[serde(default)]
        status: SectionStatus,
        /// Explicit position. `None` lets the allocator pick the next one.
        #[serde(default)]
        position: Option<i32>,
        /// Resources for the new section.
        #[serde(default)]
        resources: Vec<DesiredResource>,
    },
}

impl DesiredSection {
    /// Identifier of the referenced persisted section, if any.
    pub fn id(&self) -> Option<i64> {
        match self {
            DesiredSection::Existing { id, .. } => Some(*id),
            DesiredSection::New { .. } => None,
        }
    }

    /// Desired title.
    pub fn title(&self) -> &str {
        match self {
            DesiredSection::Existing { title, .. } | DesiredSection::New { title, .. } => title,
        }
    }

    /// Desired visibility status.
    pub fn status(&self) -> SectionStatus {
        match self {
            DesiredSection::Existing { status, .. } | DesiredSection::New { status, .. } => *status,
        }
    }

    /// Explicit desired position, if any.
    pub fn position(&self) -> Option<i32> {
        match self {
            DesiredSection::Existing { position, .. } | DesiredSection::New { position, .. } => {
                *position
            }
        }
    }

    /// Desired resources.
    pub fn resources(&self) -> &[DesiredResource] {
        match self {
            DesiredSection::Existing { resources, .. } | DesiredSection::New { resources, .. } => {
                resources
            }
        }
    }
}

/// One desired resource in a content reconciliation payload.
///
/// A resource carrying an `id` is kept as-is; one without is created. No
/// in-place update exists: replacing a resource means dropping its `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredResource {
    /// Identifier of a persisted resource to keep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Resource title.
    pub title: String,
    /// Reference into the resource-type lookup table.
    pub type_id: i64,
    /// The single payload.
    #[serde(flatten)]
    pub payload: ResourcePayload,
    /// Position within the section. `None` uses the list index.
    #[serde(default)]
    pub position: Option<i32>,
}

/// A course with its full nested content, as returned by edit operations for
/// confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseTree {
    /// The course itself.
    #[serde(flatten)]
    pub course: Course,
    /// Sections ordered by position.
    pub sections: Vec<SectionTree>,
}

/// A section with its resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTree {
    /// The section itself.
    #[serde(flatten)]
    pub section: Section,
    /// Resources ordered by position.
    pub resources: Vec<Resource>,
}
