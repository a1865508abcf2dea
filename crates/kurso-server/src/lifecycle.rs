// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Course lifecycle service.
//!
//! The façade over the lifecycle engine: course creation and edits (with
//! optional content reconciliation), section creation (with position
//! allocation), and the status recomputation the scheduler runs on its tick.
//!
//! Every content-mutating operation is one transaction that starts by taking
//! the course row lock, so concurrent edits of the same course serialize and
//! the allocator's max-position read stays atomic with its insert. The status
//! recomputation never touches sections or resources, and edits never touch
//! the derived flags; the two sides share no writable columns.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error, info, warn};

use kurso_core::clock::Clock;
use kurso_core::model::{
    Course, CourseTree, CourseType, DesiredSection, Section, SectionStatus, SectionTree,
};
use kurso_core::status::{STATUS_BUCKETS, current_flags, flags_for};
use kurso_core::validate;

use crate::db;
use crate::error::{Error, Result, map_storage_error};
use crate::order;
use crate::reconcile;

/// Fields for creating a course.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    /// Course title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Delivery type; immutable afterwards.
    pub course_type: CourseType,
    /// First day of the course.
    pub start_date: NaiveDate,
    /// Last day of the course (inclusive).
    pub end_date: NaiveDate,
}

/// Scalar field updates for a course. Absent fields keep their value.
///
/// The derived flags and the course type are deliberately unrepresentable
/// here: the former belong to the scheduler, the latter is immutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourseFields {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New first day.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// New last day.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Fields for creating a single section outside reconciliation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSection {
    /// Section title.
    pub title: String,
    /// Visibility status; defaults to enabled.
    #[serde(default)]
    pub status: SectionStatus,
    /// Explicit position; the allocator picks the next one when absent.
    #[serde(default)]
    pub position: Option<i32>,
}

/// The course lifecycle façade.
pub struct CourseLifecycleService {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl CourseLifecycleService {
    /// Create a new lifecycle service.
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Create a course.
    ///
    /// Initial flags come from the rule table evaluated against the current
    /// clock, so a course is never observable in a state the table forbids.
    pub async fn create_course(&self, new: NewCourse) -> Result<CourseTree> {
        validate::validate_title("title", &new.title)?;
        validate::validate_date_range(new.start_date, new.end_date)?;

        let flags = current_flags(
            new.course_type,
            new.start_date,
            new.end_date,
            self.clock.today(),
        );

        let row = db::insert_course(
            &self.pool,
            new.title.trim(),
            &new.description,
            new.course_type,
            new.start_date,
            new.end_date,
            flags,
        )
        .await?;

        info!(course_id = row.id, course_type = %new.course_type.as_str(), "Created course");

        Ok(CourseTree {
            course: row.into_course()?,
            sections: Vec::new(),
        })
    }

    /// Load a course with its full nested content.
    pub async fn get_course(&self, course_id: i64) -> Result<CourseTree> {
        let row = db::get_course(&self.pool, course_id)
            .await?
            .ok_or(Error::CourseNotFound(course_id))?;

        let sections = db::list_sections(&self.pool, course_id).await?;
        let resources = db::list_course_resources(&self.pool, course_id).await?;
        assemble_tree(row.into_course()?, sections, resources)
    }

    /// Update a course's scalar fields and, when a sections payload is
    /// supplied, reconcile its content — all in one transaction.
    ///
    /// Absence of the payload leaves existing content untouched. Returns the
    /// fully reloaded course for confirmation.
    pub async fn update_course(
        &self,
        course_id: i64,
        fields: UpdateCourseFields,
        desired_sections: Option<&[DesiredSection]>,
    ) -> Result<CourseTree> {
        if let Some(title) = &fields.title {
            validate::validate_title("title", title)?;
        }
        if let Some(desired) = desired_sections {
            validate::validate_desired_sections(desired)?;
        }

        let mut tx = self.pool.begin().await?;

        let row = db::get_course_for_update(&mut tx, course_id)
            .await?
            .ok_or(Error::CourseNotFound(course_id))?;

        let title = fields.title.as_deref().unwrap_or(&row.title).trim();
        let description = fields.description.as_deref().unwrap_or(&row.description);
        let start_date = fields.start_date.unwrap_or(row.start_date);
        let end_date = fields.end_date.unwrap_or(row.end_date);

        // The merged window must satisfy the invariant even when only one
        // bound was supplied.
        validate::validate_date_range(start_date, end_date)?;

        let affected =
            db::update_course_fields(&mut tx, course_id, title, description, start_date, end_date)
                .await?;
        if affected == 0 {
            return Err(Error::CourseNotFound(course_id));
        }

        if let Some(desired) = desired_sections {
            let summary = reconcile::apply_content(&mut tx, course_id, desired).await?;
            info!(
                course_id,
                sections_created = summary.sections_created,
                sections_updated = summary.sections_updated,
                sections_deleted = summary.sections_deleted,
                resources_created = summary.resources_created,
                resources_deleted = summary.resources_deleted,
                resources_skipped = summary.resources_skipped,
                "Reconciled course content"
            );
        } else {
            debug!(course_id, "No sections payload, content untouched");
        }

        let tree = load_tree_in_tx(&mut tx, course_id).await?;

        tx.commit()
            .await
            .map_err(|e| map_storage_error(e, "commit course update"))?;

        Ok(tree)
    }

    /// Create a single section, allocating the next position when the caller
    /// supplied none.
    pub async fn create_section(&self, course_id: i64, new: NewSection) -> Result<Section> {
        validate::validate_title("title", &new.title)?;
        if let Some(position) = new.position
            && position < 1
        {
            return Err(Error::Validation {
                field: "position".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        let mut tx = self.pool.begin().await?;

        // Row lock: the allocator read and the insert below must be atomic
        // with respect to concurrent creations on this course.
        if db::get_course_for_update(&mut tx, course_id).await?.is_none() {
            return Err(Error::CourseNotFound(course_id));
        }

        let position = match new.position {
            Some(position) => position,
            None => order::next_position(&mut tx, course_id).await?,
        };

        let row = db::insert_section(&mut tx, course_id, new.title.trim(), new.status, position)
            .await
            .map_err(|e| map_storage_error(e, "create section"))?;

        tx.commit()
            .await
            .map_err(|e| map_storage_error(e, "commit section create"))?;

        info!(course_id, section_id = row.id, position, "Created section");
        Ok(row.into_section()?)
    }

    /// Recompute every course's status flags from the rule table.
    ///
    /// One bulk update per bucket; a bucket failure is logged and does not
    /// abort the remaining buckets (the next tick heals it). Never fails:
    /// the scheduler has no caller to propagate to.
    pub async fn recompute_status(&self) {
        let today = self.clock.today();
        let Some(tomorrow) = today.succ_opt() else {
            warn!(%today, "Clock at end of representable time, skipping recompute");
            return;
        };

        for (course_type, window) in STATUS_BUCKETS {
            let flags = flags_for(course_type, window);
            match db::apply_status_bucket(&self.pool, course_type, window, tomorrow, flags).await {
                Ok(0) => debug!(
                    course_type = course_type.as_str(),
                    window = window.as_str(),
                    "Status bucket already consistent"
                ),
                Ok(updated) => info!(
                    course_type = course_type.as_str(),
                    window = window.as_str(),
                    updated,
                    "Applied status bucket"
                ),
                Err(e) => error!(
                    course_type = course_type.as_str(),
                    window = window.as_str(),
                    error = %e,
                    "Failed to apply status bucket"
                ),
            }
        }
    }

    /// The connection pool this service runs on.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn load_tree_in_tx(conn: &mut PgConnection, course_id: i64) -> Result<CourseTree> {
    let row = db::get_course(&mut *conn, course_id)
        .await?
        .ok_or(Error::CourseNotFound(course_id))?;
    let sections = db::list_sections(&mut *conn, course_id).await?;
    let resources = db::list_course_resources(&mut *conn, course_id).await?;
    assemble_tree(row.into_course()?, sections, resources)
}

fn assemble_tree(
    course: Course,
    sections: Vec<db::SectionRow>,
    resources: Vec<db::ResourceRow>,
) -> Result<CourseTree> {
    let mut trees: Vec<SectionTree> = Vec::with_capacity(sections.len());
    for row in sections {
        trees.push(SectionTree {
            section: row.into_section()?,
            resources: Vec::new(),
        });
    }

    for row in resources {
        let section_id = row.section_id;
        let resource = row.into_resource()?;
        if let Some(tree) = trees.iter_mut().find(|t| t.section.id == section_id) {
            tree.resources.push(resource);
        }
    }

    Ok(CourseTree {
        course,
        sections: trees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kurso_core::StatusFlags;

    fn section_row(id: i64, position: i32) -> db::SectionRow {
        db::SectionRow {
            id,
            course_id: 1,
            title: format!("Section {id}"),
            status: "enabled".to_string(),
            position,
        }
    }

    fn resource_row(id: i64, section_id: i64) -> db::ResourceRow {
        db::ResourceRow {
            id,
            section_id,
            title: format!("Resource {id}"),
            type_id: 1,
            payload_kind: "text".to_string(),
            payload: "body".to_string(),
            position: 1,
        }
    }

    fn course() -> Course {
        Course {
            id: 1,
            title: "Rust 101".to_string(),
            description: String::new(),
            course_type: CourseType::Synchronous,
            start_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(),
            flags: StatusFlags {
                active: true,
                visible: true,
                enrollment_open: false,
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_assemble_tree_groups_resources_under_their_section() {
        let sections = vec![section_row(10, 1), section_row(11, 2)];
        let resources = vec![resource_row(100, 10), resource_row(101, 11), resource_row(102, 10)];

        let tree = assemble_tree(course(), sections, resources).unwrap();
        assert_eq!(tree.sections.len(), 2);
        assert_eq!(tree.sections[0].resources.len(), 2);
        assert_eq!(tree.sections[1].resources.len(), 1);
    }

    #[test]
    fn test_assemble_tree_empty_course() {
        let tree = assemble_tree(course(), Vec::new(), Vec::new()).unwrap();
        assert!(tree.sections.is_empty());
    }

    #[test]
    fn test_update_fields_default_changes_nothing() {
        let fields = UpdateCourseFields::default();
        assert!(fields.title.is_none());
        assert!(fields.description.is_none());
        assert!(fields.start_date.is_none());
        assert!(fields.end_date.is_none());
    }
}
