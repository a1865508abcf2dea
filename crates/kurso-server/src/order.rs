// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Section position allocation.
//!
//! Positions are dense-enough positive integers, unique per course. The next
//! position is `max + 1` over the course's sections. The read MUST run on the
//! same transaction as the insert it services, under the course row lock, or
//! two concurrent creations could allocate the same position.

use sqlx::PgConnection;

/// Next free position for a new section of `course_id`.
///
/// Only positive positions count: during a reconciliation pass, rows parked
/// in the negative range by the safe reorder are not candidates.
pub async fn next_position(conn: &mut PgConnection, course_id: i64) -> Result<i32, sqlx::Error> {
    let max: i32 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(MAX(position), 0)
        FROM course_sections
        WHERE course_id = $1 AND position > 0
        "#,
    )
    .bind(course_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(max + 1)
}
