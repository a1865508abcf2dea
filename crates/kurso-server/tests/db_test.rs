// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tests for the database layer: row round-trips, the safe-reorder
//! primitives, and the bucket update's flags-differ guard.

mod common;

use kurso_core::StatusFlags;
use kurso_core::model::{CourseType, ResourcePayload, SectionStatus};
use kurso_core::status::DateWindow;
use kurso_server::db;
use kurso_server::order;

use common::{cleanup_course, create_test_course, date, get_test_pool};

/// Helper macro to skip tests if database URL is not set.
macro_rules! skip_if_no_db {
    () => {
        if std::env::var("TEST_DATABASE_URL").is_err()
            && std::env::var("KURSO_DATABASE_URL").is_err()
        {
            eprintln!("Skipping test: TEST_DATABASE_URL or KURSO_DATABASE_URL not set");
            return;
        }
    };
}

#[tokio::test]
async fn test_insert_and_get_course() {
    skip_if_no_db!();
    let Some(pool) = get_test_pool().await else {
        eprintln!("Skipping test: could not connect to database");
        return;
    };

    let flags = StatusFlags {
        active: false,
        visible: true,
        enrollment_open: true,
    };
    let row = db::insert_course(
        &pool,
        "Persisted",
        "desc",
        CourseType::Asynchronous,
        date(2025, 5, 1),
        date(2025, 5, 10),
        flags,
    )
    .await
    .unwrap();

    let fetched = db::get_course(&pool, row.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "Persisted");
    assert_eq!(fetched.course_type, "asynchronous");
    assert_eq!(fetched.start_date, date(2025, 5, 1));
    assert!(!fetched.active);
    assert!(fetched.visible);
    assert!(fetched.enrollment_open);

    let course = fetched.into_course().unwrap();
    assert_eq!(course.course_type, CourseType::Asynchronous);

    cleanup_course(&pool, row.id).await;
}

#[tokio::test]
async fn test_update_course_fields_reports_zero_for_missing_row() {
    skip_if_no_db!();
    let Some(pool) = get_test_pool().await else {
        eprintln!("Skipping test: could not connect to database");
        return;
    };

    let mut tx = pool.begin().await.unwrap();
    let affected = db::update_course_fields(
        &mut tx,
        999_999_999,
        "Ghost",
        "",
        date(2025, 1, 1),
        date(2025, 1, 2),
    )
    .await
    .unwrap();
    assert_eq!(affected, 0);
    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn test_date_window_check_constraint() {
    skip_if_no_db!();
    let Some(pool) = get_test_pool().await else {
        eprintln!("Skipping test: could not connect to database");
        return;
    };

    // The schema backs up the validation layer.
    let flags = StatusFlags {
        active: false,
        visible: false,
        enrollment_open: false,
    };
    let result = db::insert_course(
        &pool,
        "Inverted",
        "",
        CourseType::Synchronous,
        date(2025, 5, 10),
        date(2025, 5, 1),
        flags,
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_safe_reorder_primitives() {
    skip_if_no_db!();
    let Some(pool) = get_test_pool().await else {
        eprintln!("Skipping test: could not connect to database");
        return;
    };

    let course_id =
        create_test_course(&pool, CourseType::Synchronous, date(2025, 4, 1), date(2025, 4, 10))
            .await;

    let mut tx = pool.begin().await.unwrap();
    let a = db::insert_section(&mut tx, course_id, "A", SectionStatus::Enabled, 1)
        .await
        .unwrap();
    let b = db::insert_section(&mut tx, course_id, "B", SectionStatus::Enabled, 2)
        .await
        .unwrap();

    // Park, then swap: the unique constraint holds after every statement.
    let shifted = db::shift_sections_negative(&mut tx, course_id).await.unwrap();
    assert_eq!(shifted, 2);

    db::set_section_position(&mut tx, a.id, 2).await.unwrap();
    db::set_section_position(&mut tx, b.id, 1).await.unwrap();
    tx.commit().await.unwrap();

    let sections = db::list_sections(&pool, course_id).await.unwrap();
    let ordered: Vec<(i64, i32)> = sections.iter().map(|s| (s.id, s.position)).collect();
    assert_eq!(ordered, vec![(b.id, 1), (a.id, 2)]);

    cleanup_course(&pool, course_id).await;
}

#[tokio::test]
async fn test_next_position_ignores_parked_rows() {
    skip_if_no_db!();
    let Some(pool) = get_test_pool().await else {
        eprintln!("Skipping test: could not connect to database");
        return;
    };

    let course_id =
        create_test_course(&pool, CourseType::Synchronous, date(2025, 4, 1), date(2025, 4, 10))
            .await;

    let mut tx = pool.begin().await.unwrap();
    assert_eq!(order::next_position(&mut tx, course_id).await.unwrap(), 1);

    db::insert_section(&mut tx, course_id, "A", SectionStatus::Enabled, 1)
        .await
        .unwrap();
    db::insert_section(&mut tx, course_id, "B", SectionStatus::Enabled, 2)
        .await
        .unwrap();
    assert_eq!(order::next_position(&mut tx, course_id).await.unwrap(), 3);

    // Mid-reorder, parked rows must not poison the allocator.
    db::shift_sections_negative(&mut tx, course_id).await.unwrap();
    assert_eq!(order::next_position(&mut tx, course_id).await.unwrap(), 1);

    tx.rollback().await.unwrap();
    cleanup_course(&pool, course_id).await;
}

#[tokio::test]
async fn test_delete_except_keeps_named_rows() {
    skip_if_no_db!();
    let Some(pool) = get_test_pool().await else {
        eprintln!("Skipping test: could not connect to database");
        return;
    };

    let course_id =
        create_test_course(&pool, CourseType::Synchronous, date(2025, 4, 1), date(2025, 4, 10))
            .await;

    let mut tx = pool.begin().await.unwrap();
    let a = db::insert_section(&mut tx, course_id, "A", SectionStatus::Enabled, 1)
        .await
        .unwrap();
    let b = db::insert_section(&mut tx, course_id, "B", SectionStatus::Enabled, 2)
        .await
        .unwrap();
    let c = db::insert_section(&mut tx, course_id, "C", SectionStatus::Enabled, 3)
        .await
        .unwrap();

    let deleted = db::delete_sections_except(&mut tx, course_id, &[a.id, c.id])
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    tx.commit().await.unwrap();

    let remaining: Vec<i64> = db::list_sections(&pool, course_id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(remaining, vec![a.id, c.id]);
    assert!(!remaining.contains(&b.id));

    cleanup_course(&pool, course_id).await;
}

#[tokio::test]
async fn test_resource_round_trip_and_delete_except() {
    skip_if_no_db!();
    let Some(pool) = get_test_pool().await else {
        eprintln!("Skipping test: could not connect to database");
        return;
    };

    let type_id = common::any_resource_type(&pool).await;
    let course_id =
        create_test_course(&pool, CourseType::Synchronous, date(2025, 4, 1), date(2025, 4, 10))
            .await;

    let mut tx = pool.begin().await.unwrap();
    let section = db::insert_section(&mut tx, course_id, "S", SectionStatus::Enabled, 1)
        .await
        .unwrap();

    let kept = db::insert_resource(
        &mut tx,
        section.id,
        "Kept",
        type_id,
        &ResourcePayload::Text("body".to_string()),
        1,
    )
    .await
    .unwrap();
    db::insert_resource(
        &mut tx,
        section.id,
        "Dropped",
        type_id,
        &ResourcePayload::Link("https://example.com".to_string()),
        2,
    )
    .await
    .unwrap();

    let deleted = db::delete_resources_except(&mut tx, section.id, &[kept])
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    tx.commit().await.unwrap();

    let resources = db::list_course_resources(&pool, course_id).await.unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].title, "Kept");
    assert_eq!(resources[0].payload_kind, "text");

    let resource = resources.into_iter().next().unwrap().into_resource().unwrap();
    assert_eq!(resource.payload, ResourcePayload::Text("body".to_string()));

    cleanup_course(&pool, course_id).await;
}

#[tokio::test]
async fn test_bucket_update_only_touches_matching_window() {
    skip_if_no_db!();
    let Some(pool) = get_test_pool().await else {
        eprintln!("Skipping test: could not connect to database");
        return;
    };

    // Dates far from every other test's windows, so parallel tests cannot
    // land in this bucket and perturb the rows_affected assertions.
    let ongoing =
        create_test_course(&pool, CourseType::Synchronous, date(2031, 4, 1), date(2031, 4, 10))
            .await;
    let future =
        create_test_course(&pool, CourseType::Synchronous, date(2031, 6, 1), date(2031, 6, 10))
            .await;

    let tomorrow = date(2031, 4, 6);
    let flags = kurso_core::status::flags_for(CourseType::Synchronous, DateWindow::Ongoing);
    db::apply_status_bucket(&pool, CourseType::Synchronous, DateWindow::Ongoing, tomorrow, flags)
        .await
        .unwrap();

    let ongoing_row = db::get_course(&pool, ongoing).await.unwrap().unwrap();
    assert!(ongoing_row.active);

    // The future course sits in a different bucket and stays untouched.
    let future_row = db::get_course(&pool, future).await.unwrap().unwrap();
    assert!(!future_row.active);
    assert!(!future_row.visible);

    // Re-running the same bucket with the same clock is a no-op.
    let updated =
        db::apply_status_bucket(&pool, CourseType::Synchronous, DateWindow::Ongoing, tomorrow, flags)
            .await
            .unwrap();
    assert_eq!(updated, 0);

    cleanup_course(&pool, ongoing).await;
    cleanup_course(&pool, future).await;
}

#[tokio::test]
async fn test_health_check() {
    skip_if_no_db!();
    let Some(pool) = get_test_pool().await else {
        eprintln!("Skipping test: could not connect to database");
        return;
    };

    let result = db::health_check(&pool)
        .await
        .expect("Health check should succeed");
    assert!(result);
}
