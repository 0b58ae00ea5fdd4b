//! ngx-probe: page objects and a bounded calendar date resolver for
//! end-to-end tests of the ngx-admin showcase.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    NGX-PROBE Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────────────┐    │
//! │   │ Fixtures & │    │ Calendar   │    │ PageDriver         │    │
//! │   │ Page       │───►│ Date       │───►│  ShowcaseSim       │    │
//! │   │ Objects    │    │ Resolver   │    │  ChromiumDriver    │    │
//! │   └────────────┘    └────────────┘    └────────────────────┘    │
//! │         ▲                 ▲                                      │
//! │   HarnessConfig     TimeSource + NavigationBudget                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The resolver pages a Nebular calendar forward until its header shows the
//! target month, then clicks the one day cell whose text is exactly the
//! target day. Navigation is bounded: it fails with a typed error instead of
//! spinning when the header never matches.

#![warn(missing_docs)]

#[cfg(feature = "browser")]
mod browser;
mod calendar;
mod clock;
mod config;
mod driver;
mod fixture;
mod locator;
/// Tracing subscriber setup
pub mod logging;
mod page_object;
mod result;
mod sim;
mod wait;

#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use calendar::{
    header_matches, normalize_header, CalendarDateResolver, CalendarSelectors, ExpectedLabel,
    MonthYear, RangeOutcome, ResolverOutcome, TargetDate, DEFAULT_HEADER_POLL,
    DEFAULT_HEADER_REREADS,
};
pub use clock::{parse_iso_date, FakeClock, FixedClock, SharedClock, SystemClock, TimeSource};
pub use config::{Credentials, DeviceProfile, Environment, HarnessConfig, Timeouts};
pub use driver::{DeviceDescriptor, DriverConfig, ElementHandle, PageDriver};
pub use fixture::{Fixture, FixtureManager, FixtureState, FormLayoutsFixture};
pub use locator::{Role, Selector};
pub use page_object::{
    DatePicker, DatepickerPage, FormCard, FormLayoutsPage, MenuGroup, MenuItem, NavigationPage,
    PageManager, PageObject,
};
pub use result::{ProbeError, ProbeResult, SelectionRole};
pub use sim::{GridSubmission, HeaderFormat, InlineSubmission, ShowcasePage, ShowcaseSim};
pub use wait::{
    steps_for_horizon, BudgetStop, CancelToken, NavigationBudget, StepTracker,
    DEFAULT_HORIZON_DAYS, DEFAULT_MAX_FORWARD_STEPS,
};

/// Prelude for convenient imports
pub mod prelude {
    #[cfg(feature = "browser")]
    pub use super::browser::ChromiumDriver;
    pub use super::calendar::*;
    pub use super::clock::*;
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::fixture::*;
    pub use super::locator::*;
    pub use super::page_object::*;
    pub use super::result::*;
    pub use super::sim::*;
    pub use super::wait::*;
}
