// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Injectable date source.
//!
//! The status scheduler derives flags from the current date only. Abstracting
//! the clock behind a trait keeps the scheduler testable without real time;
//! the runtime injects [`SystemClock`], tests inject [`FixedClock`].

use chrono::{NaiveDate, Utc};
use std::sync::Mutex;

/// Supplies the current date, truncated to day granularity.
pub trait Clock: Send + Sync {
    /// The current date.
    fn today(&self) -> NaiveDate;
}

/// Wall-clock date in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock pinned to a settable date.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    /// Create a clock pinned to `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    /// Move the clock to a new date.
    pub fn set(&self, today: NaiveDate) {
        *self.today.lock().expect("clock lock poisoned") = today;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().expect("clock lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_returns_pinned_date() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 5).unwrap();
        let clock = FixedClock::new(date);
        assert_eq!(clock.today(), date);
    }

    #[test]
    fn test_fixed_clock_set_advances() {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2025, 4, 5).unwrap());
        let later = NaiveDate::from_ymd_opt(2025, 4, 11).unwrap();
        clock.set(later);
        assert_eq!(clock.today(), later);
    }

    #[test]
    fn test_system_clock_is_day_granular() {
        let clock = SystemClock;
        assert_eq!(clock.today(), Utc::now().date_naive());
    }
}
