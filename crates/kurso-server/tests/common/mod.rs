// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared helpers for kurso-server integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use sqlx::PgPool;

use kurso_core::StatusFlags;
use kurso_core::model::CourseType;
use kurso_server::db;

/// Get a database pool for testing, with migrations applied.
pub async fn get_test_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("KURSO_DATABASE_URL"))
        .ok()?;
    let pool = PgPool::connect(&database_url).await.ok()?;
    kurso_server::migrations::run(&pool).await.ok()?;
    Some(pool)
}

/// Shorthand for building a date.
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Create a course directly in the database, with all flags cleared.
pub async fn create_test_course(
    pool: &PgPool,
    course_type: CourseType,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> i64 {
    let flags = StatusFlags {
        active: false,
        visible: false,
        enrollment_open: false,
    };
    db::insert_course(
        pool,
        "Test course",
        "Created by integration tests",
        course_type,
        start_date,
        end_date,
        flags,
    )
    .await
    .expect("Failed to create test course")
    .id
}

/// Delete a course; sections and resources cascade.
pub async fn cleanup_course(pool: &PgPool, course_id: i64) {
    sqlx::query("DELETE FROM courses WHERE id = $1")
        .bind(course_id)
        .execute(pool)
        .await
        .ok();
}

/// The id of some seeded resource type.
pub async fn any_resource_type(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT id FROM resource_types ORDER BY id LIMIT 1")
        .fetch_one(pool)
        .await
        .expect("resource_types should be seeded by migrations")
}

/// Positions of a course's sections, ordered.
pub async fn section_positions(pool: &PgPool, course_id: i64) -> Vec<(i64, i32)> {
    db::list_sections(pool, course_id)
        .await
        .expect("Failed to list sections")
        .into_iter()
        .map(|s| (s.id, s.position))
        .collect()
}
