//! Result and error types for ngx-probe.

use std::fmt;
use thiserror::Error;

/// Result type for ngx-probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Which date of a selection a calendar error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionRole {
    /// A single-date picker selection
    Single,
    /// First date of a range selection
    RangeStart,
    /// Second date of a range selection
    RangeEnd,
}

impl fmt::Display for SelectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single"),
            Self::RangeStart => f.write_str("range start"),
            Self::RangeEnd => f.write_str("range end"),
        }
    }
}

/// Errors that can occur in ngx-probe
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The calendar header never showed the target month within the budget
    #[error(
        "Calendar navigation timed out ({role} date): expected '{expected}' after {steps} forward steps, last header was '{last_header}'"
    )]
    CalendarNavigationTimeout {
        /// Selection the failure belongs to
        role: SelectionRole,
        /// Expected month and year, e.g. "February 2024"
        expected: String,
        /// Forward activations performed before giving up
        steps: u32,
        /// Normalized header text at the time of failure
        last_header: String,
    },

    /// The target day has no selectable cell in the resolved month
    #[error("Invalid calendar date ({role} date): no cell '{day}' in {month_year}")]
    InvalidCalendarDate {
        /// Selection the failure belongs to
        role: SelectionRole,
        /// Day-of-month text that was searched for
        day: String,
        /// Month and year that was displayed
        month_year: String,
    },

    /// More than one day cell carries the exact target text
    #[error("Ambiguous day match ({role} date): {matches} cells read '{day}'")]
    AmbiguousDayMatch {
        /// Selection the failure belongs to
        role: SelectionRole,
        /// Day-of-month text that was searched for
        day: String,
        /// Number of matching cells
        matches: usize,
    },

    /// The target lies outside the months the widget can reach going forward
    #[error(
        "Calendar bounds exceeded ({role} date): cannot reach '{expected}' from '{displayed}'"
    )]
    CalendarBoundsExceeded {
        /// Selection the failure belongs to
        role: SelectionRole,
        /// Expected month and year
        expected: String,
        /// Month and year the widget is stuck on
        displayed: String,
    },

    /// Navigation was cancelled through a cancel token
    #[error("Calendar navigation cancelled ({role} date) after {steps} forward steps")]
    Cancelled {
        /// Selection the failure belongs to
        role: SelectionRole,
        /// Forward activations performed before cancellation
        steps: u32,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// No element matched a selector
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Selector description
        selector: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Fixture error (setup/teardown failed)
    #[error("Fixture error: {message}")]
    FixtureError {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Whether this error came out of calendar resolution
    #[must_use]
    pub const fn is_calendar_error(&self) -> bool {
        matches!(
            self,
            Self::CalendarNavigationTimeout { .. }
                | Self::InvalidCalendarDate { .. }
                | Self::AmbiguousDayMatch { .. }
                | Self::CalendarBoundsExceeded { .. }
                | Self::Cancelled { .. }
        )
    }

    /// Selection role of a calendar error, if any
    #[must_use]
    pub const fn role(&self) -> Option<SelectionRole> {
        match self {
            Self::CalendarNavigationTimeout { role, .. }
            | Self::InvalidCalendarDate { role, .. }
            | Self::AmbiguousDayMatch { role, .. }
            | Self::CalendarBoundsExceeded { role, .. }
            | Self::Cancelled { role, .. } => Some(*role),
            _ => None,
        }
    }

    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }
}
