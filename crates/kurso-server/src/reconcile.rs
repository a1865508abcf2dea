// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Transactional content reconciliation.
//!
//! Given a course's desired nested structure (ordered sections, each with
//! ordered resources), [`apply_content`] computes and applies the minimal set
//! of creates/updates/deletes that makes persisted state match the desired
//! state. It runs entirely on the caller's transaction: any non-tolerated
//! failure rolls the whole edit back.
//!
//! The one ordering subtlety is the safe batch reorder. `(course_id,
//! position)` is unique and the constraint is checked per statement, so a
//! row-at-a-time reorder can collide with a row that has not moved yet (or
//! with a row that is about to be deleted). The reorder therefore parks every
//! section of the course in the negative range in a single statement, then
//! assigns final positions; the invariant holds after every statement.
//!
//! Resource creation is the one tolerated partial failure: a single resource
//! that fails to persist is logged and skipped (under a savepoint, so the
//! surrounding transaction stays healthy) and the rest of the edit proceeds.

use std::collections::{HashMap, HashSet};

use sqlx::PgConnection;
use tracing::{debug, warn};

use kurso_core::model::{DesiredResource, DesiredSection};

use crate::db;
use crate::error::{Error, Result, map_storage_error};
use crate::order;

/// Counters describing what one reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Sections created this pass.
    pub sections_created: u64,
    /// Sections updated (fields and/or position) this pass.
    pub sections_updated: u64,
    /// Sections deleted because the desired tree dropped them.
    pub sections_deleted: u64,
    /// Resources created this pass.
    pub resources_created: u64,
    /// Resources deleted because the desired tree dropped them.
    pub resources_deleted: u64,
    /// Resources skipped after a tolerated creation failure.
    pub resources_skipped: u64,
}

/// Reconcile a course's persisted section/resource tree to `desired`.
///
/// Runs on the caller's open transaction; the caller must already hold the
/// course row lock (see [`db::get_course_for_update`]) and must have run
/// payload validation. An empty `desired` list is a content no-op: nothing is
/// created and nothing is deleted.
pub async fn apply_content(
    conn: &mut PgConnection,
    course_id: i64,
    desired: &[DesiredSection],
) -> Result<ReconcileSummary> {
    let mut summary = ReconcileSummary::default();

    if desired.is_empty() {
        debug!(course_id, "Empty desired tree, content untouched");
        return Ok(summary);
    }

    let existing = db::list_sections(&mut *conn, course_id).await?;
    let existing_by_id: HashMap<i64, i32> = existing
        .iter()
        .map(|row| (row.id, row.position))
        .collect();

    // Every referenced section must belong to this course.
    for section in desired {
        if let Some(id) = section.id()
            && !existing_by_id.contains_key(&id)
        {
            return Err(Error::SectionNotFound(id));
        }
    }

    // Final positions for existing sections: the explicit value when given,
    // the current one otherwise. Explicit values are pairwise distinct
    // (payload validation); they must also not land on the current position
    // of a section that is not moving.
    let implicit: HashSet<i32> = desired
        .iter()
        .filter(|s| s.position().is_none())
        .filter_map(|s| s.id())
        .filter_map(|id| existing_by_id.get(&id).copied())
        .collect();

    let mut assignments: Vec<(i64, i32)> = Vec::new();
    for (i, section) in desired.iter().enumerate() {
        let Some(id) = section.id() else { continue };
        let current = existing_by_id[&id];
        match section.position() {
            Some(position) => {
                if position != current && implicit.contains(&position) {
                    return Err(Error::Validation {
                        field: format!("sections[{i}].position"),
                        message: format!(
                            "position {position} is held by a section the payload does not move"
                        ),
                    });
                }
                assignments.push((id, position));
            }
            None => assignments.push((id, current)),
        }
    }

    // Safe batch reorder, pass 1: park the whole course in the negative
    // range. Pass 2 below can then never collide with an unplaced row or
    // with a row the desired tree is about to drop.
    db::shift_sections_negative(&mut *conn, course_id).await?;

    for (id, position) in &assignments {
        db::set_section_position(&mut *conn, *id, *position)
            .await
            .map_err(|e| map_storage_error(e, "reorder section"))?;
    }

    // Mutable fields, independent of order.
    for section in desired {
        if let Some(id) = section.id() {
            db::update_section_fields(&mut *conn, id, section.title(), section.status()).await?;
            summary.sections_updated += 1;
        }
    }

    // New sections: client position when free, allocator otherwise.
    let mut occupied: HashSet<i32> = assignments.iter().map(|(_, p)| *p).collect();
    let mut section_ids: Vec<i64> = Vec::with_capacity(desired.len());
    for section in desired {
        match section.id() {
            Some(id) => section_ids.push(id),
            None => {
                let position = match section.position() {
                    Some(p) if !occupied.contains(&p) => p,
                    _ => order::next_position(&mut *conn, course_id).await?,
                };
                occupied.insert(position);

                let row = db::insert_section(
                    &mut *conn,
                    course_id,
                    section.title(),
                    section.status(),
                    position,
                )
                .await
                .map_err(|e| map_storage_error(e, "create section"))?;

                debug!(course_id, section_id = row.id, position, "Created section");
                summary.sections_created += 1;
                section_ids.push(row.id);
            }
        }
    }

    // Resources: keep the ones referenced by id, create the rest, then drop
    // whatever the desired tree no longer mentions.
    for (section, &section_id) in desired.iter().zip(&section_ids) {
        let is_existing = section.id().is_some();

        let persisted: HashSet<i64> = if is_existing {
            db::list_section_resource_ids(&mut *conn, section_id)
                .await?
                .into_iter()
                .collect()
        } else {
            HashSet::new()
        };

        let mut keep: Vec<i64> = Vec::with_capacity(section.resources().len());
        for (j, resource) in section.resources().iter().enumerate() {
            match resource.id {
                Some(resource_id) => {
                    if !persisted.contains(&resource_id) {
                        return Err(Error::ResourceNotFound(resource_id));
                    }
                    keep.push(resource_id);
                }
                None => {
                    if let Some(id) =
                        create_resource_tolerant(&mut *conn, section_id, resource, j).await?
                    {
                        keep.push(id);
                        summary.resources_created += 1;
                    } else {
                        summary.resources_skipped += 1;
                    }
                }
            }
        }

        if is_existing {
            summary.resources_deleted +=
                db::delete_resources_except(&mut *conn, section_id, &keep).await?;
        }
    }

    // Sections the desired tree dropped; cascades their resources.
    summary.sections_deleted =
        db::delete_sections_except(&mut *conn, course_id, &section_ids).await?;

    debug!(course_id, ?summary, "Reconciled course content");
    Ok(summary)
}

/// Create one resource under a savepoint.
///
/// Returns `Ok(Some(id))` on success and `Ok(None)` when the insert failed
/// and was skipped; a failure to manage the savepoint itself is not
/// tolerated (the transaction is no longer healthy) and propagates.
async fn create_resource_tolerant(
    conn: &mut PgConnection,
    section_id: i64,
    resource: &DesiredResource,
    index: usize,
) -> Result<Option<i64>> {
    let position = resource.position.unwrap_or(index as i32 + 1);

    sqlx::query("SAVEPOINT create_resource")
        .execute(&mut *conn)
        .await?;

    match db::insert_resource(
        &mut *conn,
        section_id,
        &resource.title,
        resource.type_id,
        &resource.payload,
        position,
    )
    .await
    {
        Ok(id) => {
            sqlx::query("RELEASE SAVEPOINT create_resource")
                .execute(&mut *conn)
                .await?;
            Ok(Some(id))
        }
        Err(e) => {
            warn!(
                section_id,
                title = %resource.title,
                type_id = resource.type_id,
                error = %e,
                "Skipping resource that failed to persist"
            );
            sqlx::query("ROLLBACK TO SAVEPOINT create_resource")
                .execute(&mut *conn)
                .await?;
            Ok(None)
        }
    }
}
