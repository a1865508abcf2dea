// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pre-write validation checks.
//!
//! Every check here runs before a transaction begins and returns a typed
//! [`ValidationError`] with field-level detail. Checks that need persisted
//! state (section ownership, position collisions with unmoved rows) live in
//! the reconciler, inside the transaction.

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::error::ValidationError;
use crate::model::DesiredSection;

/// Reject an empty or whitespace-only title.
pub fn validate_title(field: &str, title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

/// Enforce the date-window invariant `start_date <= end_date`.
pub fn validate_date_range(
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<(), ValidationError> {
    if start_date > end_date {
        return Err(ValidationError::new(
            "start_date",
            "must not be after end_date",
        ));
    }
    Ok(())
}

/// Validate a desired-sections payload before any writes.
///
/// Rejects:
/// - empty section or resource titles,
/// - explicit positions below 1,
/// - two sections claiming the same explicit position (covers the case of
///   two existing sections both reassigned to one position),
/// - the same persisted section referenced twice,
/// - a resource id supplied under a section that does not exist yet.
pub fn validate_desired_sections(sections: &[DesiredSection]) -> Result<(), ValidationError> {
    let mut seen_positions = HashSet::new();
    let mut seen_ids = HashSet::new();

    for (i, section) in sections.iter().enumerate() {
        validate_title(&format!("sections[{i}].title"), section.title())?;

        if let Some(id) = section.id()
            && !seen_ids.insert(id)
        {
            return Err(ValidationError::new(
                format!("sections[{i}].id"),
                format!("section {id} referenced more than once"),
            ));
        }

        if let Some(position) = section.position() {
            if position < 1 {
                return Err(ValidationError::new(
                    format!("sections[{i}].position"),
                    "must be a positive integer",
                ));
            }
            if !seen_positions.insert(position) {
                return Err(ValidationError::new(
                    format!("sections[{i}].position"),
                    format!("position {position} assigned to more than one section"),
                ));
            }
        }

        for (j, resource) in section.resources().iter().enumerate() {
            validate_title(&format!("sections[{i}].resources[{j}].title"), &resource.title)?;

            if resource.id.is_some() && section.id().is_none() {
                return Err(ValidationError::new(
                    format!("sections[{i}].resources[{j}].id"),
                    "resource id supplied for a section that does not exist yet",
                ));
            }

            if let Some(position) = resource.position
                && position < 1
            {
                return Err(ValidationError::new(
                    format!("sections[{i}].resources[{j}].position"),
                    "must be a positive integer",
                ));
            }
        }
    }

    Ok(())
}
