// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Database operations for kurso-server.
//!
//! Row structs mirror the relational schema with enum columns read as TEXT;
//! conversion into the typed domain model happens at the edges. Functions
//! that must run inside the caller's transaction take `&mut PgConnection`
//! (what `&mut *tx` derefs to); reads that work anywhere take any executor.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool};
use std::str::FromStr;

use kurso_core::model::{Course, CourseType, Resource, ResourcePayload, Section, SectionStatus};
use kurso_core::status::DateWindow;
use kurso_core::StatusFlags;

/// Course record from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CourseRow {
    /// Unique identifier.
    pub id: i64,
    /// Course title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Delivery type (synchronous, asynchronous).
    pub course_type: String,
    /// First day of the course.
    pub start_date: NaiveDate,
    /// Last day of the course (inclusive).
    pub end_date: NaiveDate,
    /// Derived: the course is currently running.
    pub active: bool,
    /// Derived: the course appears in listings.
    pub visible: bool,
    /// Derived: new enrollments are accepted.
    pub enrollment_open: bool,
    /// When the course was created.
    pub created_at: DateTime<Utc>,
    /// When the course row was last written.
    pub updated_at: DateTime<Utc>,
}

/// Section record from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SectionRow {
    /// Unique identifier.
    pub id: i64,
    /// Owning course.
    pub course_id: i64,
    /// Section title.
    pub title: String,
    /// Visibility status (enabled, disabled).
    pub status: String,
    /// Position within the course.
    pub position: i32,
}

/// Resource record from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResourceRow {
    /// Unique identifier.
    pub id: i64,
    /// Owning section.
    pub section_id: i64,
    /// Resource title.
    pub title: String,
    /// Reference into the resource-type lookup.
    pub type_id: i64,
    /// Payload discriminator (file, link, text).
    pub payload_kind: String,
    /// Payload value.
    pub payload: String,
    /// Position within the section.
    pub position: i32,
}

fn decode_enum<T>(value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse::<T>().map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

impl CourseRow {
    /// Convert into the typed domain model.
    pub fn into_course(self) -> Result<Course, sqlx::Error> {
        let course_type: CourseType = decode_enum(&self.course_type)?;
        Ok(Course {
            id: self.id,
            title: self.title,
            description: self.description,
            course_type,
            start_date: self.start_date,
            end_date: self.end_date,
            flags: StatusFlags {
                active: self.active,
                visible: self.visible,
                enrollment_open: self.enrollment_open,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl SectionRow {
    /// Convert into the typed domain model.
    pub fn into_section(self) -> Result<Section, sqlx::Error> {
        let status: SectionStatus = decode_enum(&self.status)?;
        Ok(Section {
            id: self.id,
            course_id: self.course_id,
            title: self.title,
            status,
            position: self.position,
        })
    }
}

impl ResourceRow {
    /// Convert into the typed domain model.
    pub fn into_resource(self) -> Result<Resource, sqlx::Error> {
        let payload = ResourcePayload::from_parts(&self.payload_kind, self.payload)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Resource {
            id: self.id,
            section_id: self.section_id,
            title: self.title,
            type_id: self.type_id,
            payload,
            position: self.position,
        })
    }
}

// ============================================================================
// Courses
// ============================================================================

/// Insert a new course with its initial derived flags.
pub async fn insert_course(
    executor: impl PgExecutor<'_>,
    title: &str,
    description: &str,
    course_type: CourseType,
    start_date: NaiveDate,
    end_date: NaiveDate,
    flags: StatusFlags,
) -> Result<CourseRow, sqlx::Error> {
    sqlx::query_as::<_, CourseRow>(
        r#"
        INSERT INTO courses (title, description, course_type, start_date, end_date,
                             active, visible, enrollment_open)
        VALUES ($1, $2, $3::course_type, $4, $5, $6, $7, $8)
        RETURNING id, title, description, course_type::TEXT as course_type,
                  start_date, end_date, active, visible, enrollment_open,
                  created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(course_type.as_str())
    .bind(start_date)
    .bind(end_date)
    .bind(flags.active)
    .bind(flags.visible)
    .bind(flags.enrollment_open)
    .fetch_one(executor)
    .await
}

/// Get a course by ID.
pub async fn get_course(
    executor: impl PgExecutor<'_>,
    course_id: i64,
) -> Result<Option<CourseRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseRow>(
        r#"
        SELECT id, title, description, course_type::TEXT as course_type,
               start_date, end_date, active, visible, enrollment_open,
               created_at, updated_at
        FROM courses
        WHERE id = $1
        "#,
    )
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

/// Get a course by ID and take a row lock on it.
///
/// Every content-mutating transaction starts here: the lock serializes
/// concurrent edits of the same course, making the max-position read and the
/// dependent insert atomic with respect to other editors.
pub async fn get_course_for_update(
    conn: &mut PgConnection,
    course_id: i64,
) -> Result<Option<CourseRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseRow>(
        r#"
        SELECT id, title, description, course_type::TEXT as course_type,
               start_date, end_date, active, visible, enrollment_open,
               created_at, updated_at
        FROM courses
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(course_id)
    .fetch_optional(&mut *conn)
    .await
}

/// Update a course's scalar fields. Returns the number of affected rows.
///
/// Never touches `course_type` or the derived flags: the former is immutable,
/// the latter belong to the status scheduler.
pub async fn update_course_fields(
    conn: &mut PgConnection,
    course_id: i64,
    title: &str,
    description: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE courses
        SET title = $2, description = $3, start_date = $4, end_date = $5,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(course_id)
    .bind(title)
    .bind(description)
    .bind(start_date)
    .bind(end_date)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Apply one status bucket: a single bulk update setting the rule-table flag
/// triple on every course of `course_type` whose date window matches.
///
/// The flags-differ guard keeps the write idempotent in the observable sense:
/// re-running the same bucket with an unchanged clock affects zero rows.
/// Returns the number of courses whose flags actually changed.
pub async fn apply_status_bucket(
    pool: &PgPool,
    course_type: CourseType,
    window: DateWindow,
    tomorrow: NaiveDate,
    flags: StatusFlags,
) -> Result<u64, sqlx::Error> {
    let window_predicate = match window {
        DateWindow::Ended => "end_date < $5",
        DateWindow::Ongoing => "start_date < $5 AND end_date >= $5",
        DateWindow::Future => "start_date >= $5",
    };

    let query = format!(
        r#"
        UPDATE courses
        SET active = $2, visible = $3, enrollment_open = $4, updated_at = NOW()
        WHERE course_type = $1::course_type
          AND {window_predicate}
          AND (active IS DISTINCT FROM $2
               OR visible IS DISTINCT FROM $3
               OR enrollment_open IS DISTINCT FROM $4)
        "#
    );

    let result = sqlx::query(&query)
        .bind(course_type.as_str())
        .bind(flags.active)
        .bind(flags.visible)
        .bind(flags.enrollment_open)
        .bind(tomorrow)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

// ============================================================================
// Sections
// ============================================================================

/// List a course's sections ordered by position.
pub async fn list_sections(
    executor: impl PgExecutor<'_>,
    course_id: i64,
) -> Result<Vec<SectionRow>, sqlx::Error> {
    sqlx::query_as::<_, SectionRow>(
        r#"
        SELECT id, course_id, title, status::TEXT as status, position
        FROM course_sections
        WHERE course_id = $1
        ORDER BY position
        "#,
    )
    .bind(course_id)
    .fetch_all(executor)
    .await
}

/// Insert a section at an explicit position.
pub async fn insert_section(
    conn: &mut PgConnection,
    course_id: i64,
    title: &str,
    status: SectionStatus,
    position: i32,
) -> Result<SectionRow, sqlx::Error> {
    sqlx::query_as::<_, SectionRow>(
        r#"
        INSERT INTO course_sections (course_id, title, status, position)
        VALUES ($1, $2, $3::section_status, $4)
        RETURNING id, course_id, title, status::TEXT as status, position
        "#,
    )
    .bind(course_id)
    .bind(title)
    .bind(status.as_str())
    .bind(position)
    .fetch_one(&mut *conn)
    .await
}

/// Update a section's mutable fields (title, status), leaving order alone.
pub async fn update_section_fields(
    conn: &mut PgConnection,
    section_id: i64,
    title: &str,
    status: SectionStatus,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE course_sections
        SET title = $2, status = $3::section_status
        WHERE id = $1
        "#,
    )
    .bind(section_id)
    .bind(title)
    .bind(status.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// First pass of the safe batch reorder: move every section of the course
/// into the negative range in one statement.
///
/// Negating a set of distinct positive positions yields distinct negatives,
/// so `(course_id, position)` holds after this statement, and the final
/// assignment pass can never collide with a row that has not been placed yet.
pub async fn shift_sections_negative(
    conn: &mut PgConnection,
    course_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE course_sections
        SET position = -position
        WHERE course_id = $1 AND position > 0
        "#,
    )
    .bind(course_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Second pass of the safe batch reorder: assign a section's final position.
pub async fn set_section_position(
    conn: &mut PgConnection,
    section_id: i64,
    position: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE course_sections
        SET position = $2
        WHERE id = $1
        "#,
    )
    .bind(section_id)
    .bind(position)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Delete every section of the course not named in `keep_ids`.
///
/// Cascades to the sections' resources via the schema's ON DELETE CASCADE.
/// Returns the number of sections removed.
pub async fn delete_sections_except(
    conn: &mut PgConnection,
    course_id: i64,
    keep_ids: &[i64],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM course_sections
        WHERE course_id = $1 AND NOT (id = ANY($2))
        "#,
    )
    .bind(course_id)
    .bind(keep_ids)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

// ============================================================================
// Resources
// ============================================================================

/// List a course's resources ordered by section, then position.
pub async fn list_course_resources(
    executor: impl PgExecutor<'_>,
    course_id: i64,
) -> Result<Vec<ResourceRow>, sqlx::Error> {
    sqlx::query_as::<_, ResourceRow>(
        r#"
        SELECT r.id, r.section_id, r.title, r.type_id,
               r.payload_kind::TEXT as payload_kind, r.payload, r.position
        FROM section_resources r
        JOIN course_sections s ON r.section_id = s.id
        WHERE s.course_id = $1
        ORDER BY s.position, r.position
        "#,
    )
    .bind(course_id)
    .fetch_all(executor)
    .await
}

/// List the resource IDs currently persisted under a section.
pub async fn list_section_resource_ids(
    conn: &mut PgConnection,
    section_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id FROM section_resources WHERE section_id = $1
        "#,
    )
    .bind(section_id)
    .fetch_all(&mut *conn)
    .await
}

/// Insert a resource. Returns the new resource ID.
pub async fn insert_resource(
    conn: &mut PgConnection,
    section_id: i64,
    title: &str,
    type_id: i64,
    payload: &ResourcePayload,
    position: i32,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO section_resources (section_id, title, type_id, payload_kind, payload, position)
        VALUES ($1, $2, $3, $4::resource_payload_kind, $5, $6)
        RETURNING id
        "#,
    )
    .bind(section_id)
    .bind(title)
    .bind(type_id)
    .bind(payload.kind())
    .bind(payload.value())
    .bind(position)
    .fetch_one(&mut *conn)
    .await
}

/// Delete every resource of a section not named in `keep_ids`.
/// Returns the number of resources removed.
pub async fn delete_resources_except(
    conn: &mut PgConnection,
    section_id: i64,
    keep_ids: &[i64],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM section_resources
        WHERE section_id = $1 AND NOT (id = ANY($2))
        "#,
    )
    .bind(section_id)
    .bind(keep_ids)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

// ============================================================================
// Health
// ============================================================================

/// Health check for database connectivity.
pub async fn health_check(pool: &PgPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| true)
}
