//! Wall-clock source for timestamps and "not in the future" checks.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt::Debug;

pub trait Clock: Debug {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date used to reject future dates.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The host system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
