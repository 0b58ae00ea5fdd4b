//! Bounded navigation budgets.
//!
//! Calendar navigation is a "retry until the condition holds" loop. A
//! [`NavigationBudget`] caps that loop by step count, by elapsed time, and by
//! an external [`CancelToken`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Horizon in days the default budget must cover
pub const DEFAULT_HORIZON_DAYS: u32 = 365;

/// Default forward-step cap: enough for [`DEFAULT_HORIZON_DAYS`]
pub const DEFAULT_MAX_FORWARD_STEPS: u32 = steps_for_horizon(DEFAULT_HORIZON_DAYS);

/// Forward steps needed to cover `days` with the shortest month, plus slack
#[must_use]
pub const fn steps_for_horizon(days: u32) -> u32 {
    days.div_ceil(28) + 2
}

// =============================================================================
// CANCELLATION
// =============================================================================

/// Cloneable cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; visible to every clone
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// =============================================================================
// BUDGET
// =============================================================================

/// Why a budgeted loop has to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStop {
    /// `max_steps` activations already performed
    StepsExhausted,
    /// The deadline elapsed
    DeadlineExpired,
    /// The cancel token fired
    Cancelled,
}

/// Limits for one calendar navigation
#[derive(Debug, Clone)]
pub struct NavigationBudget {
    /// Maximum forward activations
    pub max_steps: u32,
    /// Wall-clock limit measured from the start of the loop
    pub deadline: Option<Duration>,
    /// External cancellation
    pub cancel: Option<CancelToken>,
}

impl Default for NavigationBudget {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_FORWARD_STEPS,
            deadline: None,
            cancel: None,
        }
    }
}

impl NavigationBudget {
    /// Create a budget with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the forward-step cap
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set a wall-clock deadline
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a cancel token
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Start tracking one loop against this budget
    #[must_use]
    pub fn start(&self) -> StepTracker<'_> {
        StepTracker {
            budget: self,
            started: Instant::now(),
            steps: 0,
        }
    }
}

/// Step counter for one budgeted loop
#[derive(Debug)]
pub struct StepTracker<'a> {
    budget: &'a NavigationBudget,
    started: Instant,
    steps: u32,
}

impl StepTracker<'_> {
    /// Reserve the next step, or report why the loop must stop
    pub fn next_step(&mut self) -> Result<(), BudgetStop> {
        if self
            .budget
            .cancel
            .as_ref()
            .is_some_and(CancelToken::is_cancelled)
        {
            return Err(BudgetStop::Cancelled);
        }
        if self
            .budget
            .deadline
            .is_some_and(|deadline| self.started.elapsed() >= deadline)
        {
            return Err(BudgetStop::DeadlineExpired);
        }
        if self.steps >= self.budget.max_steps {
            return Err(BudgetStop::StepsExhausted);
        }
        self.steps += 1;
        Ok(())
    }

    /// Steps reserved so far
    #[must_use]
    pub const fn steps(&self) -> u32 {
        self.steps
    }

    /// Time since the loop started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
