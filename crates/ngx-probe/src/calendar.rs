//! Calendar date resolution for paginated month-view date pickers.
//!
//! Given a day offset from "today", the resolver pages the calendar forward
//! until the header shows the target month, then clicks the one day cell
//! whose text is exactly the target day, and returns the label the picker
//! input is expected to show (`"Feb 14, 2024"`).
//!
//! ## Header matching
//!
//! The widget renders its header as free text with incidental whitespace
//! (`" February 2024 "`). Both sides are normalized with
//! [`normalize_header`]: split on Unicode whitespace, rejoined with single
//! spaces. The expectation then has to appear as a whole run of tokens, so
//! `"February 2024"` matches `"\n February\t2024 "` but not
//! `"February 20245"`.

use crate::clock::SharedClock;
use crate::driver::PageDriver;
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult, SelectionRole};
use crate::wait::{BudgetStop, NavigationBudget};
use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// English month names as rendered by the widget header
pub const LONG_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// =============================================================================
// MONTH / DATE VALUES
// =============================================================================

/// A calendar month. Orders chronologically.
///
/// The month is always within 1-12; deserialization goes through
/// [`MonthYear::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMonthYear")]
pub struct MonthYear {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawMonthYear {
    year: i32,
    month: u32,
}

impl TryFrom<RawMonthYear> for MonthYear {
    type Error = String;

    fn try_from(raw: RawMonthYear) -> Result<Self, Self::Error> {
        Self::new(raw.year, raw.month)
            .ok_or_else(|| format!("month {} is outside 1-12", raw.month))
    }
}

impl MonthYear {
    /// Create a month; `None` when `month` is outside 1-12
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if matches!(month, 1..=12) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Four-digit year
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month, 1-12
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Month containing `date`
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Following month
    #[must_use]
    pub const fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Preceding month
    #[must_use]
    pub const fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Long English month name
    #[must_use]
    pub const fn long_name(self) -> &'static str {
        match self.month.checked_sub(1) {
            Some(index) if (index as usize) < LONG_MONTHS.len() => LONG_MONTHS[index as usize],
            _ => "",
        }
    }

    /// First day of the month
    #[must_use]
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Number of days in the month
    #[must_use]
    pub fn days_in_month(self) -> u32 {
        match (self.first_day(), self.next().first_day()) {
            (Some(first), Some(next)) => (next - first).num_days() as u32,
            _ => 0,
        }
    }

    /// Forward activations needed to get from `self` to `target`, if reachable
    #[must_use]
    pub fn steps_to(self, target: Self) -> Option<u32> {
        let from = i64::from(self.year) * 12 + i64::from(self.month);
        let to = i64::from(target.year) * 12 + i64::from(target.month);
        u32::try_from(to - from).ok()
    }

    /// Find a `"{LongMonth} {year}"` token pair in header text
    #[must_use]
    pub fn parse_header(text: &str) -> Option<Self> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        tokens.windows(2).find_map(|pair| {
            let month = LONG_MONTHS.iter().position(|m| *m == pair[0])?;
            if pair[1].len() != 4 {
                return None;
            }
            let year = pair[1].parse::<i32>().ok()?;
            Self::new(year, month as u32 + 1)
        })
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.long_name(), self.year)
    }
}

/// Date a selection is aiming for: today plus an offset in days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDate {
    date: NaiveDate,
}

impl TargetDate {
    /// Wrap an absolute date
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// `today + offset` days, with month and year rollover
    ///
    /// # Errors
    ///
    /// Returns a config error if the result is outside chrono's date range
    pub fn from_offset(today: NaiveDate, offset: i64) -> ProbeResult<Self> {
        TimeDelta::try_days(offset)
            .and_then(|delta| today.checked_add_signed(delta))
            .map(Self::new)
            .ok_or_else(|| {
                ProbeError::config(format!("day offset {offset} from {today} is out of range"))
            })
    }

    /// Underlying date
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Day of month without leading zero ("5")
    #[must_use]
    pub fn day(&self) -> String {
        self.date.day().to_string()
    }

    /// Short month name ("Jan")
    #[must_use]
    pub fn short_month(&self) -> String {
        self.date.format("%b").to_string()
    }

    /// Long month name ("January")
    #[must_use]
    pub fn long_month(&self) -> String {
        self.date.format("%B").to_string()
    }

    /// Four-digit year
    #[must_use]
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Month the calendar has to display before the day can be clicked
    #[must_use]
    pub fn month_year(&self) -> MonthYear {
        MonthYear::of(self.date)
    }

    /// Label the picker input shows once this date is selected
    #[must_use]
    pub fn label(&self) -> ExpectedLabel {
        ExpectedLabel(format!(
            "{} {}, {}",
            self.short_month(),
            self.day(),
            self.year()
        ))
    }
}

/// Value a picker input must hold after selection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpectedLabel(String);

impl ExpectedLabel {
    /// Join two single-date labels into a range label
    #[must_use]
    pub fn range(start: &Self, end: &Self) -> Self {
        Self(format!("{} - {}", start.0, end.0))
    }

    /// Label text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the label text
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ExpectedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ExpectedLabel {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ExpectedLabel {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// =============================================================================
// HEADER NORMALIZATION
// =============================================================================

/// Collapse all whitespace runs to one space and trim both ends
#[must_use]
pub fn normalize_header(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether header text shows `expected` as a contiguous token pair
#[must_use]
pub fn header_matches(header: &str, expected: MonthYear) -> bool {
    let year = expected.year().to_string();
    let tokens: Vec<&str> = header.split_whitespace().collect();
    tokens
        .windows(2)
        .any(|pair| pair[0] == expected.long_name() && pair[1] == year)
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Selectors the resolver drives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSelectors {
    /// Element whose text is the displayed month and year
    pub header: Selector,
    /// Control that pages one month forward
    pub forward: Selector,
    /// Container of the selectable day cells
    pub day_cells: Selector,
}

impl CalendarSelectors {
    /// Nebular calendar as used by the ngx-admin showcase
    #[must_use]
    pub fn nebular() -> Self {
        Self {
            header: Selector::css("nb-calendar-view-mode"),
            forward: Selector::css(
                r#"nb-calendar-pageable-navigation [data-name="chevron-right"]"#,
            ),
            day_cells: Selector::css(
                ".day-cell.ng-star-inserted:not(.bounding-month):not(.disabled)",
            ),
        }
    }
}

impl Default for CalendarSelectors {
    fn default() -> Self {
        Self::nebular()
    }
}

/// Result of one successful selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOutcome {
    /// Expected input label
    pub label: ExpectedLabel,
    /// Date that was clicked
    pub date: NaiveDate,
    /// Forward activations performed
    pub steps: u32,
}

/// Result of a range selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOutcome {
    /// Combined `"start - end"` label
    pub label: ExpectedLabel,
    /// Start half
    pub start: ResolverOutcome,
    /// End half
    pub end: ResolverOutcome,
}

/// Pages a calendar forward to a target date and selects it
#[derive(Debug, Clone)]
pub struct CalendarDateResolver {
    clock: SharedClock,
    selectors: CalendarSelectors,
    budget: NavigationBudget,
    header_rereads: u32,
    header_poll: Duration,
}

/// Extra header reads after a forward click that seemed to have no effect
pub const DEFAULT_HEADER_REREADS: u32 = 5;

/// Pause between those reads
pub const DEFAULT_HEADER_POLL: Duration = Duration::from_millis(100);

impl CalendarDateResolver {
    /// Resolver for the Nebular calendar with the default budget
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            selectors: CalendarSelectors::nebular(),
            budget: NavigationBudget::default(),
            header_rereads: DEFAULT_HEADER_REREADS,
            header_poll: DEFAULT_HEADER_POLL,
        }
    }

    /// Use other selectors
    #[must_use]
    pub fn with_selectors(mut self, selectors: CalendarSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Use another navigation budget
    #[must_use]
    pub fn with_budget(mut self, budget: NavigationBudget) -> Self {
        self.budget = budget;
        self
    }

    /// How often to re-read an unchanged header before treating the
    /// forward control as disabled
    #[must_use]
    pub const fn with_header_settle(mut self, rereads: u32, poll: Duration) -> Self {
        self.header_rereads = rereads;
        self.header_poll = poll;
        self
    }

    /// Selectors in use
    #[must_use]
    pub const fn selectors(&self) -> &CalendarSelectors {
        &self.selectors
    }

    /// Budget in use
    #[must_use]
    pub const fn budget(&self) -> &NavigationBudget {
        &self.budget
    }

    /// Select `today + day_offset` and return the expected input label
    pub async fn resolve_and_select<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        day_offset: i64,
    ) -> ProbeResult<ExpectedLabel> {
        self.resolve_and_select_with_report(driver, day_offset)
            .await
            .map(|outcome| outcome.label)
    }

    /// Like [`Self::resolve_and_select`], also reporting the step count
    pub async fn resolve_and_select_with_report<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        day_offset: i64,
    ) -> ProbeResult<ResolverOutcome> {
        let today = self.clock.today();
        let target = TargetDate::from_offset(today, day_offset)?;
        self.select_target(driver, target, SelectionRole::Single)
            .await
    }

    /// Select a start and an end date in the same calendar view
    pub async fn resolve_range_and_select<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        start_offset: i64,
        end_offset: i64,
    ) -> ProbeResult<ExpectedLabel> {
        self.resolve_range_and_select_with_report(driver, start_offset, end_offset)
            .await
            .map(|outcome| outcome.label)
    }

    /// Like [`Self::resolve_range_and_select`], also reporting both halves.
    ///
    /// "Today" is read once, so both halves use the same reference date.
    pub async fn resolve_range_and_select_with_report<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        start_offset: i64,
        end_offset: i64,
    ) -> ProbeResult<RangeOutcome> {
        let today = self.clock.today();
        let start_target = TargetDate::from_offset(today, start_offset)?;
        let end_target = TargetDate::from_offset(today, end_offset)?;

        let start = self
            .select_target(driver, start_target, SelectionRole::RangeStart)
            .await?;
        let end = self
            .select_target(driver, end_target, SelectionRole::RangeEnd)
            .await?;

        Ok(RangeOutcome {
            label: ExpectedLabel::range(&start.label, &end.label),
            start,
            end,
        })
    }

    /// Page forward until `target`'s month shows, then click its day cell
    pub async fn select_target<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        target: TargetDate,
        role: SelectionRole,
    ) -> ProbeResult<ResolverOutcome> {
        let expected = target.month_year();
        let mut tracker = self.budget.start();
        let mut header = normalize_header(&driver.read_text(&self.selectors.header).await?);
        debug!(%role, target = %target.date(), %expected, header = %header, "resolving calendar date");

        while !header_matches(&header, expected) {
            if let Some(displayed) = MonthYear::parse_header(&header) {
                if displayed > expected {
                    warn!(%role, %expected, %displayed, "target month precedes displayed month");
                    return Err(ProbeError::CalendarBoundsExceeded {
                        role,
                        expected: expected.to_string(),
                        displayed: displayed.to_string(),
                    });
                }
            }

            if let Err(stop) = tracker.next_step() {
                let steps = tracker.steps();
                warn!(%role, %expected, steps, ?stop, header = %header, "calendar navigation stopped");
                return Err(match stop {
                    BudgetStop::Cancelled => ProbeError::Cancelled { role, steps },
                    BudgetStop::StepsExhausted | BudgetStop::DeadlineExpired => {
                        ProbeError::CalendarNavigationTimeout {
                            role,
                            expected: expected.to_string(),
                            steps,
                            last_header: header,
                        }
                    }
                });
            }

            driver.click(&self.selectors.forward).await?;
            let mut next = normalize_header(&driver.read_text(&self.selectors.header).await?);
            let mut rereads = 0;
            while next == header && rereads < self.header_rereads {
                driver.pause(self.header_poll).await?;
                next = normalize_header(&driver.read_text(&self.selectors.header).await?);
                rereads += 1;
            }
            debug!(%role, step = tracker.steps(), rereads, header = %next, "advanced calendar");

            if next == header && MonthYear::parse_header(&next).is_some() {
                warn!(%role, %expected, header = %next, "forward navigation had no effect");
                return Err(ProbeError::CalendarBoundsExceeded {
                    role,
                    expected: expected.to_string(),
                    displayed: next,
                });
            }
            header = next;
        }

        let day = target.day();
        let mut cells = driver.find_exact(&self.selectors.day_cells, &day).await?;
        let cell = match cells.len() {
            0 => {
                warn!(%role, %day, %expected, "no day cell");
                return Err(ProbeError::InvalidCalendarDate {
                    role,
                    day,
                    month_year: expected.to_string(),
                });
            }
            1 => cells.remove(0),
            matches => {
                warn!(%role, %day, matches, "ambiguous day cells");
                return Err(ProbeError::AmbiguousDayMatch { role, day, matches });
            }
        };
        driver.click_element(&cell).await?;

        let label = target.label();
        info!(%role, label = %label, steps = tracker.steps(), "selected calendar date");
        Ok(ResolverOutcome {
            label,
            date: target.date(),
            steps: tracker.steps(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FakeClock, FixedClock, TimeSource};
    use crate::page_object::DatePicker;
    use crate::sim::{HeaderFormat, ShowcasePage, ShowcaseSim};
    use crate::wait::CancelToken;
    use std::sync::Arc;
    use std::time::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(y: i32, m: u32) -> MonthYear {
        MonthYear::new(y, m).unwrap()
    }

    mod target_date_tests {
        use super::*;

        #[test]
        fn test_offset_within_month() {
            let target = TargetDate::from_offset(date(2024, 1, 15), 30).unwrap();
            assert_eq!(target.date(), date(2024, 2, 14));
            assert_eq!(target.label(), "Feb 14, 2024");
            assert_eq!(target.long_month(), "February");
            assert_eq!(target.short_month(), "Feb");
        }

        #[test]
        fn test_offset_crosses_year() {
            let target = TargetDate::from_offset(date(2024, 12, 20), 40).unwrap();
            assert_eq!(target.date(), date(2025, 1, 29));
            assert_eq!(target.month_year(), month(2025, 1));
            assert_eq!(target.label(), "Jan 29, 2025");
        }

        #[test]
        fn test_day_has_no_leading_zero() {
            let target = TargetDate::from_offset(date(2024, 12, 20), 20).unwrap();
            assert_eq!(target.day(), "9");
            assert_eq!(target.label(), "Jan 9, 2025");
        }

        #[test]
        fn test_negative_and_zero_offsets() {
            assert_eq!(
                TargetDate::from_offset(date(2024, 3, 1), -1).unwrap().date(),
                date(2024, 2, 29)
            );
            assert_eq!(
                TargetDate::from_offset(date(2024, 3, 1), 0).unwrap().date(),
                date(2024, 3, 1)
            );
        }

        #[test]
        fn test_absurd_offset_is_an_error() {
            let err = TargetDate::from_offset(date(2024, 1, 1), i64::MAX).unwrap_err();
            assert!(matches!(err, ProbeError::Config { .. }));
        }

        #[test]
        fn test_range_label() {
            let start = TargetDate::new(date(2024, 6, 2)).label();
            let end = TargetDate::new(date(2024, 6, 5)).label();
            assert_eq!(
                ExpectedLabel::range(&start, &end),
                "Jun 2, 2024 - Jun 5, 2024"
            );
        }
    }

    mod month_year_tests {
        use super::*;

        #[test]
        fn test_next_and_prev_wrap_year() {
            assert_eq!(month(2024, 12).next(), month(2025, 1));
            assert_eq!(month(2025, 1).prev(), month(2024, 12));
        }

        #[test]
        fn test_days_in_month() {
            assert_eq!(month(2024, 2).days_in_month(), 29);
            assert_eq!(month(2023, 2).days_in_month(), 28);
            assert_eq!(month(2024, 12).days_in_month(), 31);
            assert_eq!(month(2024, 4).days_in_month(), 30);
        }

        #[test]
        fn test_steps_to() {
            assert_eq!(month(2024, 12).steps_to(month(2025, 1)), Some(1));
            assert_eq!(month(2024, 1).steps_to(month(2024, 1)), Some(0));
            assert_eq!(month(2024, 3).steps_to(month(2024, 2)), None);
        }

        #[test]
        fn test_ordering_is_chronological() {
            assert!(month(2024, 12) < month(2025, 1));
            assert!(month(2024, 2) > month(2024, 1));
        }

        #[test]
        fn test_parse_header() {
            assert_eq!(MonthYear::parse_header(" February 2024 "), Some(month(2024, 2)));
            assert_eq!(MonthYear::parse_header("2024-02"), None);
            assert_eq!(MonthYear::parse_header("Februar 2024"), None);
            assert_eq!(MonthYear::parse_header("May 20245"), None);
        }

        #[test]
        fn test_invalid_month_rejected() {
            assert!(MonthYear::new(2024, 0).is_none());
            assert!(MonthYear::new(2024, 13).is_none());
        }

        #[test]
        fn test_deserialize_checks_month_range() {
            let ok: MonthYear = serde_json::from_str(r#"{"year":2024,"month":12}"#).unwrap();
            assert_eq!(ok, month(2024, 12));
            assert_eq!(ok.to_string(), "December 2024");
            assert_eq!((ok.year(), ok.month()), (2024, 12));

            for bad in [r#"{"year":2024,"month":0}"#, r#"{"year":2024,"month":13}"#] {
                let err = serde_json::from_str::<MonthYear>(bad).unwrap_err();
                assert!(err.to_string().contains("outside 1-12"));
            }
        }
    }

    mod header_tests {
        use super::*;

        #[test]
        fn test_normalize_collapses_whitespace() {
            assert_eq!(normalize_header("\n  February\t2024  "), "February 2024");
            assert_eq!(normalize_header(""), "");
        }

        #[test]
        fn test_matches_with_framing_whitespace() {
            assert!(header_matches(" February 2024 ", month(2024, 2)));
            assert!(header_matches("February 2024", month(2024, 2)));
        }

        #[test]
        fn test_rejects_partial_tokens() {
            assert!(!header_matches("February 20245", month(2024, 2)));
            assert!(!header_matches("February 2025", month(2024, 2)));
            assert!(!header_matches("2024 February", month(2024, 2)));
        }
    }

    mod resolver_tests {
        use super::*;

        async fn datepicker(today: NaiveDate) -> (ShowcaseSim, CalendarDateResolver) {
            let clock: SharedClock = Arc::new(FixedClock::new(today));
            let mut sim = ShowcaseSim::new(clock.clone()).on_page(ShowcasePage::Datepicker);
            sim.click(&DatePicker::Common.input()).await.unwrap();
            (sim, CalendarDateResolver::new(clock))
        }

        #[tokio::test]
        async fn test_plus_thirty_from_mid_january() {
            let (mut sim, resolver) = datepicker(date(2024, 1, 15)).await;
            let outcome = resolver
                .resolve_and_select_with_report(&mut sim, 30)
                .await
                .unwrap();
            assert_eq!(outcome.label, "Feb 14, 2024");
            assert_eq!(outcome.steps, 1);
            assert_eq!(sim.forward_clicks(), 1);
            assert_eq!(sim.picker_value(DatePicker::Common), "Feb 14, 2024");
        }

        #[tokio::test]
        async fn test_year_boundary_single_step() {
            let (mut sim, resolver) = datepicker(date(2024, 12, 20)).await;
            let outcome = resolver
                .resolve_and_select_with_report(&mut sim, 20)
                .await
                .unwrap();
            assert_eq!(outcome.label, "Jan 9, 2025");
            assert_eq!(outcome.steps, 1);
        }

        #[tokio::test]
        async fn test_plus_forty_from_december_twentieth() {
            let (mut sim, resolver) = datepicker(date(2024, 12, 20)).await;
            let label = resolver.resolve_and_select(&mut sim, 40).await.unwrap();
            assert_eq!(label, "Jan 29, 2025");
        }

        #[tokio::test]
        async fn test_zero_offset_selects_today() {
            let (mut sim, resolver) = datepicker(date(2024, 3, 7)).await;
            let outcome = resolver
                .resolve_and_select_with_report(&mut sim, 0)
                .await
                .unwrap();
            assert_eq!(outcome.label, "Mar 7, 2024");
            assert_eq!(outcome.date, date(2024, 3, 7));
            assert_eq!(outcome.steps, 0);
        }

        #[tokio::test]
        async fn test_day_one_never_selects_eleven() {
            let (mut sim, resolver) = datepicker(date(2024, 5, 20)).await;
            // 2024-06-01: both "1" and "11" are on screen
            let label = resolver.resolve_and_select(&mut sim, 12).await.unwrap();
            assert_eq!(label, "Jun 1, 2024");
            assert_eq!(sim.clicked_elements(), vec!["day-2024-06-01".to_string()]);
        }

        #[tokio::test]
        async fn test_range_in_same_month() {
            let (mut sim, resolver) = {
                let clock: SharedClock = Arc::new(FixedClock::new(date(2024, 6, 1)));
                let mut sim = ShowcaseSim::new(clock.clone()).on_page(ShowcasePage::Datepicker);
                sim.click(&DatePicker::Range.input()).await.unwrap();
                (sim, CalendarDateResolver::new(clock))
            };
            let outcome = resolver
                .resolve_range_and_select_with_report(&mut sim, 1, 4)
                .await
                .unwrap();
            assert_eq!(outcome.label, "Jun 2, 2024 - Jun 5, 2024");
            assert_eq!(outcome.start.label, "Jun 2, 2024");
            assert_eq!(outcome.end.label, "Jun 5, 2024");
            assert_eq!(sim.picker_value(DatePicker::Range), "Jun 2, 2024 - Jun 5, 2024");
        }

        #[tokio::test]
        async fn test_range_spanning_months_continues_forward() {
            let clock: SharedClock = Arc::new(FixedClock::new(date(2024, 1, 25)));
            let mut sim = ShowcaseSim::new(clock.clone()).on_page(ShowcasePage::Datepicker);
            sim.click(&DatePicker::Range.input()).await.unwrap();
            let resolver = CalendarDateResolver::new(clock);

            let outcome = resolver
                .resolve_range_and_select_with_report(&mut sim, 10, 45)
                .await
                .unwrap();
            assert_eq!(outcome.start.steps, 1);
            assert_eq!(outcome.end.steps, 1);
            assert_eq!(outcome.label, "Feb 4, 2024 - Mar 10, 2024");
        }

        /// Moves one day forward every time it is read
        #[derive(Debug)]
        struct TickingClock(FakeClock);

        impl TimeSource for TickingClock {
            fn today(&self) -> NaiveDate {
                let today = self.0.today();
                self.0.advance_days(1);
                today
            }
        }

        #[tokio::test]
        async fn test_range_reads_today_once() {
            let clock: SharedClock = Arc::new(TickingClock(FakeClock::new(date(2024, 6, 29))));
            let mut sim = ShowcaseSim::new(clock.clone()).on_page(ShowcasePage::Datepicker);
            sim.click(&DatePicker::Range.input()).await.unwrap();
            let resolver = CalendarDateResolver::new(clock);

            // the sim consumed Jun 29 when opening; the resolver sees Jun 30 for both halves
            let label = resolver
                .resolve_range_and_select(&mut sim, 0, 1)
                .await
                .unwrap();
            assert_eq!(label, "Jun 30, 2024 - Jul 1, 2024");
        }

        #[tokio::test]
        async fn test_locale_change_times_out_at_budget() {
            let clock: SharedClock = Arc::new(FixedClock::new(date(2024, 1, 15)));
            let mut sim = ShowcaseSim::new(clock.clone())
                .on_page(ShowcasePage::Datepicker)
                .with_header_format(HeaderFormat::Numeric);
            sim.click(&DatePicker::Common.input()).await.unwrap();
            let resolver = CalendarDateResolver::new(clock)
                .with_budget(NavigationBudget::new().with_max_steps(5));

            let err = resolver.resolve_and_select(&mut sim, 30).await.unwrap_err();
            match err {
                ProbeError::CalendarNavigationTimeout {
                    role,
                    steps,
                    expected,
                    ..
                } => {
                    assert_eq!(role, SelectionRole::Single);
                    assert_eq!(steps, 5);
                    assert_eq!(expected, "February 2024");
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(sim.forward_clicks(), 5);
        }

        #[tokio::test]
        async fn test_far_target_exhausts_default_budget() {
            let (mut sim, resolver) = datepicker(date(2024, 1, 1)).await;
            let err = resolver.resolve_and_select(&mut sim, 1000).await.unwrap_err();
            assert!(matches!(
                err,
                ProbeError::CalendarNavigationTimeout { steps: 16, .. }
            ));
        }

        #[tokio::test]
        async fn test_max_date_is_bounds_exceeded() {
            let clock: SharedClock = Arc::new(FixedClock::new(date(2024, 1, 15)));
            let mut sim = ShowcaseSim::new(clock.clone())
                .on_page(ShowcasePage::Datepicker)
                .with_max_month(month(2024, 2));
            sim.click(&DatePicker::Common.input()).await.unwrap();
            let resolver = CalendarDateResolver::new(clock);

            let err = resolver.resolve_and_select(&mut sim, 60).await.unwrap_err();
            match err {
                ProbeError::CalendarBoundsExceeded {
                    expected, displayed, ..
                } => {
                    assert_eq!(expected, "March 2024");
                    assert_eq!(displayed, "February 2024");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_slow_header_is_reread_before_giving_up() {
            let clock: SharedClock = Arc::new(FixedClock::new(date(2024, 1, 15)));
            let mut sim = ShowcaseSim::new(clock.clone())
                .on_page(ShowcasePage::Datepicker)
                .with_header_lag(2);
            sim.click(&DatePicker::Common.input()).await.unwrap();
            let resolver = CalendarDateResolver::new(clock);

            let outcome = resolver
                .resolve_and_select_with_report(&mut sim, 30)
                .await
                .unwrap();
            assert_eq!(outcome.label, "Feb 14, 2024");
            assert_eq!(outcome.steps, 1);
            assert_eq!(sim.forward_clicks(), 1);
            let pauses = sim.history().iter().filter(|c| *c == "pause:100ms").count();
            assert_eq!(pauses, 2);
        }

        #[tokio::test]
        async fn test_header_slower_than_rereads_is_bounds_exceeded() {
            let clock: SharedClock = Arc::new(FixedClock::new(date(2024, 1, 15)));
            let mut sim = ShowcaseSim::new(clock.clone())
                .on_page(ShowcasePage::Datepicker)
                .with_header_lag(3);
            sim.click(&DatePicker::Common.input()).await.unwrap();
            let resolver = CalendarDateResolver::new(clock)
                .with_header_settle(1, Duration::from_millis(10));

            let err = resolver.resolve_and_select(&mut sim, 30).await.unwrap_err();
            assert!(matches!(err, ProbeError::CalendarBoundsExceeded { .. }));
        }

        #[tokio::test]
        async fn test_past_month_is_bounds_exceeded_without_clicking() {
            let (mut sim, resolver) = datepicker(date(2024, 3, 5)).await;
            let err = resolver.resolve_and_select(&mut sim, -10).await.unwrap_err();
            assert!(matches!(err, ProbeError::CalendarBoundsExceeded { .. }));
            assert_eq!(sim.forward_clicks(), 0);
        }

        #[tokio::test]
        async fn test_past_day_in_same_month_is_selectable() {
            let (mut sim, resolver) = datepicker(date(2024, 3, 20)).await;
            let label = resolver.resolve_and_select(&mut sim, -10).await.unwrap();
            assert_eq!(label, "Mar 10, 2024");
        }

        #[tokio::test]
        async fn test_duplicated_cells_are_ambiguous() {
            let clock: SharedClock = Arc::new(FixedClock::new(date(2024, 1, 15)));
            let mut sim = ShowcaseSim::new(clock.clone())
                .on_page(ShowcasePage::Datepicker)
                .with_duplicate_day_cells(true);
            sim.click(&DatePicker::Common.input()).await.unwrap();
            let resolver = CalendarDateResolver::new(clock);

            let err = resolver.resolve_and_select(&mut sim, 1).await.unwrap_err();
            assert!(matches!(
                err,
                ProbeError::AmbiguousDayMatch { matches: 2, .. }
            ));
            assert!(sim.clicked_elements().is_empty());
        }

        #[tokio::test]
        async fn test_disabled_cell_is_invalid_date() {
            let clock: SharedClock = Arc::new(FixedClock::new(date(2024, 2, 10)));
            let mut sim = ShowcaseSim::new(clock.clone())
                .on_page(ShowcasePage::Datepicker)
                .with_min_date(date(2024, 2, 12));
            sim.click(&DatePicker::Common.input()).await.unwrap();
            let resolver = CalendarDateResolver::new(clock);

            let err = resolver.resolve_and_select(&mut sim, 0).await.unwrap_err();
            match err {
                ProbeError::InvalidCalendarDate {
                    day, month_year, ..
                } => {
                    assert_eq!(day, "10");
                    assert_eq!(month_year, "February 2024");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_cancelled_before_first_step() {
            let token = CancelToken::new();
            token.cancel();
            let clock: SharedClock = Arc::new(FixedClock::new(date(2024, 1, 15)));
            let mut sim = ShowcaseSim::new(clock.clone()).on_page(ShowcasePage::Datepicker);
            sim.click(&DatePicker::Common.input()).await.unwrap();
            let resolver = CalendarDateResolver::new(clock)
                .with_budget(NavigationBudget::new().with_cancel_token(token));

            let err = resolver.resolve_and_select(&mut sim, 30).await.unwrap_err();
            assert!(matches!(err, ProbeError::Cancelled { steps: 0, .. }));
            assert_eq!(sim.forward_clicks(), 0);
        }

        #[tokio::test]
        async fn test_expired_deadline_is_timeout() {
            let (mut sim, resolver) = datepicker(date(2024, 1, 15)).await;
            let resolver =
                resolver.with_budget(NavigationBudget::new().with_deadline(Duration::ZERO));
            let err = resolver.resolve_and_select(&mut sim, 30).await.unwrap_err();
            assert!(matches!(
                err,
                ProbeError::CalendarNavigationTimeout { steps: 0, .. }
            ));
        }

        #[tokio::test]
        async fn test_range_error_names_end_role() {
            let clock: SharedClock = Arc::new(FixedClock::new(date(2024, 1, 15)));
            let mut sim = ShowcaseSim::new(clock.clone())
                .on_page(ShowcasePage::Datepicker)
                .with_max_month(month(2024, 1));
            sim.click(&DatePicker::Range.input()).await.unwrap();
            let resolver = CalendarDateResolver::new(clock);

            let err = resolver
                .resolve_range_and_select(&mut sim, 1, 40)
                .await
                .unwrap_err();
            assert_eq!(err.role(), Some(SelectionRole::RangeEnd));
            assert!(err.to_string().contains("range end"));
        }

        #[tokio::test]
        async fn test_closed_calendar_surfaces_driver_error() {
            let clock: SharedClock = Arc::new(FixedClock::new(date(2024, 1, 15)));
            let mut sim = ShowcaseSim::new(clock.clone()).on_page(ShowcasePage::Datepicker);
            let resolver = CalendarDateResolver::new(clock);
            let err = resolver.resolve_and_select(&mut sim, 1).await.unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotFound { .. }));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn prop_any_offset_in_a_year_terminates_within_budget(
                offset in -365i64..=365,
                start in 0i64..3650
            ) {
                let today = date(2020, 1, 1) + TimeDelta::days(start);
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                let result = runtime.block_on(async {
                    let clock: SharedClock = Arc::new(FixedClock::new(today));
                    let mut sim = ShowcaseSim::new(clock.clone()).on_page(ShowcasePage::Datepicker);
                    sim.click(&DatePicker::Common.input()).await.unwrap();
                    let resolver = CalendarDateResolver::new(clock);
                    let result = resolver.resolve_and_select_with_report(&mut sim, offset).await;
                    (result, sim.forward_clicks())
                });

                let (result, clicks) = result;
                prop_assert!(clicks <= crate::wait::DEFAULT_MAX_FORWARD_STEPS as usize);
                let target = TargetDate::from_offset(today, offset).unwrap();
                match result {
                    Ok(outcome) => {
                        prop_assert!(offset >= 0 || MonthYear::of(today) == target.month_year());
                        prop_assert_eq!(outcome.label, target.label());
                        prop_assert_eq!(
                            Some(outcome.steps),
                            MonthYear::of(today).steps_to(target.month_year())
                        );
                    }
                    Err(ProbeError::CalendarBoundsExceeded { .. }) => {
                        prop_assert!(target.month_year() < MonthYear::of(today));
                        prop_assert_eq!(clicks, 0);
                    }
                    Err(other) => prop_assert!(false, "unexpected error: {}", other),
                }
            }
        }
    }
}
