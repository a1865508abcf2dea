// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Date-window classification and the status rule table.
//!
//! The scheduler recomputes every course's status flags on each tick by
//! classifying the course into one of six disjoint buckets: its type crossed
//! with where the clock falls relative to its date window. Comparisons use
//! `tomorrow = today + 1 day` so the boundary day is consistently ongoing
//! under a day-granularity clock.

use chrono::NaiveDate;

use crate::model::{CourseType, StatusFlags};

/// Where the current date falls relative to a course's date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateWindow {
    /// `end_date < tomorrow`: the course has ended.
    Ended,
    /// `start_date < tomorrow <= end_date`: the course is running.
    Ongoing,
    /// `start_date >= tomorrow`: the course has not started.
    Future,
}

impl DateWindow {
    /// Short name for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            DateWindow::Ended => "ended",
            DateWindow::Ongoing => "ongoing",
            DateWindow::Future => "future",
        }
    }
}

/// All six `(type, window)` buckets, in the order the scheduler applies them.
pub const STATUS_BUCKETS: [(CourseType, DateWindow); 6] = [
    (CourseType::Synchronous, DateWindow::Ended),
    (CourseType::Synchronous, DateWindow::Ongoing),
    (CourseType::Synchronous, DateWindow::Future),
    (CourseType::Asynchronous, DateWindow::Ended),
    (CourseType::Asynchronous, DateWindow::Ongoing),
    (CourseType::Asynchronous, DateWindow::Future),
];

/// Classify a date window against `today`.
///
/// A window with `start_date > end_date` never reaches this function (the
/// range invariant is validated before persistence); if it did, the
/// ended-first ordering classifies it as ended.
pub fn classify(start_date: NaiveDate, end_date: NaiveDate, today: NaiveDate) -> DateWindow {
    let Some(tomorrow) = today.succ_opt() else {
        // Clock at the end of representable time: everything has ended.
        return DateWindow::Ended;
    };

    if end_date < tomorrow {
        DateWindow::Ended
    } else if start_date < tomorrow {
        DateWindow::Ongoing
    } else {
        DateWindow::Future
    }
}

/// The status rule table: one flag triple per `(type, window)` bucket.
pub const fn flags_for(course_type: CourseType, window: DateWindow) -> StatusFlags {
    use CourseType::{Asynchronous, Synchronous};
    use DateWindow::{Ended, Future, Ongoing};

    match (course_type, window) {
        (Synchronous, Ended) => StatusFlags {
            active: false,
            visible: true,
            enrollment_open: false,
        },
        (Synchronous, Ongoing) => StatusFlags {
            active: true,
            visible: true,
            enrollment_open: false,
        },
        (Synchronous, Future) => StatusFlags {
            active: false,
            visible: true,
            enrollment_open: true,
        },
        (Asynchronous, Ended) => StatusFlags {
            active: false,
            visible: false,
            enrollment_open: false,
        },
        (Asynchronous, Ongoing) => StatusFlags {
            active: true,
            visible: true,
            enrollment_open: true,
        },
        (Asynchronous, Future) => StatusFlags {
            active: false,
            visible: true,
            enrollment_open: true,
        },
    }
}

/// Convenience: flags for a course given its window and `today`.
pub fn current_flags(
    course_type: CourseType,
    start_date: NaiveDate,
    end_date: NaiveDate,
    today: NaiveDate,
) -> StatusFlags {
    flags_for(course_type, classify(start_date, end_date, today))
}
