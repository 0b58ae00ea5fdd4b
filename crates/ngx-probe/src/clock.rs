//! Injectable "today" for deterministic date selection.
//!
//! The resolver and the simulated showcase both ask a [`TimeSource`] for the
//! current date instead of reading the wall clock, so tests can pin "today".

use crate::result::{ProbeError, ProbeResult};
use chrono::{Local, NaiveDate};
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// Source of the current calendar date
pub trait TimeSource: Send + Sync + fmt::Debug {
    /// Current local date
    fn today(&self) -> NaiveDate;
}

/// Shared handle to a time source
pub type SharedClock = Arc<dyn TimeSource>;

/// Wall-clock time source (local timezone)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Time source pinned to one date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    date: NaiveDate,
}

impl FixedClock {
    /// Pin "today" to `date`
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Parse a `YYYY-MM-DD` date
    ///
    /// # Errors
    ///
    /// Returns a config error if the string is not a valid date
    pub fn from_iso(iso: &str) -> ProbeResult<Self> {
        parse_iso_date(iso).map(Self::new)
    }
}

impl TimeSource for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }
}

/// Fake clock that tests can move forward or back
#[derive(Debug)]
pub struct FakeClock {
    /// Days since 0001-01-01 (CE)
    days_from_ce: AtomicI32,
}

impl FakeClock {
    /// Create a fake clock starting at `date`
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            days_from_ce: AtomicI32::new(chrono::Datelike::num_days_from_ce(&date)),
        }
    }

    /// Set the current date
    pub fn set(&self, date: NaiveDate) {
        self.days_from_ce
            .store(chrono::Datelike::num_days_from_ce(&date), Ordering::SeqCst);
    }

    /// Move the current date by `days` (may be negative)
    pub fn advance_days(&self, days: i32) {
        let _ = self.days_from_ce.fetch_add(days, Ordering::SeqCst);
    }
}

impl TimeSource for FakeClock {
    fn today(&self) -> NaiveDate {
        NaiveDate::from_num_days_from_ce_opt(self.days_from_ce.load(Ordering::SeqCst))
            .unwrap_or_default()
    }
}

/// Parse a `YYYY-MM-DD` date string
///
/// # Errors
///
/// Returns a config error if the string is not a valid date
pub fn parse_iso_date(iso: &str) -> ProbeResult<NaiveDate> {
    NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d")
        .map_err(|e| ProbeError::config(format!("invalid date '{iso}': {e}")))
}
