//! Fixture management.
//!
//! Fixtures prepare the page before a test body runs and clean up after it.
//! [`FixtureManager`] sets fixtures up in descending priority and tears them
//! down in reverse setup order; a failed setup tears down whatever was
//! already set up before reporting the error. Teardown failures during that
//! rollback are logged, the setup error is what gets returned.

use crate::driver::PageDriver;
use crate::locator::Selector;
use crate::page_object::MenuItem;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use tracing::{info, warn};

/// A setup/teardown pair run against a page
#[async_trait]
pub trait Fixture: Send {
    /// Prepare the page
    async fn setup(&mut self, driver: &mut dyn PageDriver) -> ProbeResult<()>;

    /// Undo [`Fixture::setup`]
    async fn teardown(&mut self, driver: &mut dyn PageDriver) -> ProbeResult<()>;

    /// Name for logging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Higher = set up first, torn down last
    fn priority(&self) -> i32 {
        0
    }
}

/// State of a fixture in the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Registered but not set up
    Registered,
    /// Set up successfully
    SetUp,
    /// Torn down
    TornDown,
    /// Setup or teardown failed
    Failed,
}

struct FixtureEntry {
    fixture: Box<dyn Fixture>,
    state: FixtureState,
}

/// Ordered fixture setup and teardown
#[derive(Default)]
pub struct FixtureManager {
    fixtures: Vec<FixtureEntry>,
    setup_order: Vec<usize>,
}

impl std::fmt::Debug for FixtureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureManager")
            .field("fixture_count", &self.fixtures.len())
            .field("setup_order", &self.setup_order)
            .finish()
    }
}

impl FixtureManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture
    pub fn register<F: Fixture + 'static>(&mut self, fixture: F) {
        self.fixtures.push(FixtureEntry {
            fixture: Box::new(fixture),
            state: FixtureState::Registered,
        });
    }

    /// Number of registered fixtures
    #[must_use]
    pub fn count(&self) -> usize {
        self.fixtures.len()
    }

    /// State of the fixture registered under `name`
    #[must_use]
    pub fn state(&self, name: &str) -> Option<FixtureState> {
        self.fixtures
            .iter()
            .find(|entry| entry.fixture.name() == name)
            .map(|entry| entry.state)
    }

    /// Names in the order of the last setup
    #[must_use]
    pub fn setup_order(&self) -> Vec<&str> {
        self.setup_order
            .iter()
            .map(|&i| self.fixtures[i].fixture.name())
            .collect()
    }

    /// Set up every fixture, highest priority first
    ///
    /// # Errors
    ///
    /// Returns a fixture error naming the first fixture that failed; fixtures
    /// set up before it are torn down first.
    pub async fn setup_all(&mut self, driver: &mut dyn PageDriver) -> ProbeResult<()> {
        let mut ordered: Vec<usize> = (0..self.fixtures.len()).collect();
        // stable: equal priorities keep registration order
        ordered.sort_by_key(|&i| std::cmp::Reverse(self.fixtures[i].fixture.priority()));

        self.setup_order.clear();
        for index in ordered {
            let entry = &mut self.fixtures[index];
            if !matches!(entry.state, FixtureState::Registered | FixtureState::TornDown) {
                continue;
            }
            match entry.fixture.setup(driver).await {
                Ok(()) => {
                    entry.state = FixtureState::SetUp;
                    self.setup_order.push(index);
                }
                Err(e) => {
                    let name = entry.fixture.name().to_string();
                    entry.state = FixtureState::Failed;
                    warn!(fixture = %name, error = %e, "fixture setup failed");
                    if let Err(rollback) = self.teardown_setup_order(driver).await {
                        warn!(fixture = %name, error = %rollback, "rollback after failed setup");
                    }
                    return Err(ProbeError::FixtureError {
                        message: format!("Fixture '{name}' setup failed: {e}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Tear down every set-up fixture in reverse setup order
    ///
    /// # Errors
    ///
    /// Every fixture is attempted; the first failure is returned.
    pub async fn teardown_all(&mut self, driver: &mut dyn PageDriver) -> ProbeResult<()> {
        self.teardown_setup_order(driver).await
    }

    async fn teardown_setup_order(&mut self, driver: &mut dyn PageDriver) -> ProbeResult<()> {
        let mut first_error: Option<ProbeError> = None;

        for &index in self.setup_order.iter().rev() {
            let entry = &mut self.fixtures[index];
            if entry.state != FixtureState::SetUp {
                continue;
            }
            if let Err(e) = entry.fixture.teardown(driver).await {
                warn!(fixture = entry.fixture.name(), error = %e, "fixture teardown failed");
                entry.state = FixtureState::Failed;
                if first_error.is_none() {
                    first_error = Some(ProbeError::FixtureError {
                        message: format!("Fixture '{}' teardown failed: {e}", entry.fixture.name()),
                    });
                }
            } else {
                entry.state = FixtureState::TornDown;
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

/// Opens Forms / Form Layouts from the landing page
#[derive(Debug, Clone, Default)]
pub struct FormLayoutsFixture;

impl FormLayoutsFixture {
    /// Create the fixture
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Fixture for FormLayoutsFixture {
    async fn setup(&mut self, driver: &mut dyn PageDriver) -> ProbeResult<()> {
        driver.navigate("/").await?;
        driver.click(&Selector::text("Forms")).await?;
        driver.click(&MenuItem::FormLayouts.selector()).await?;
        info!(fixture = self.name(), "setup");
        Ok(())
    }

    async fn teardown(&mut self, _driver: &mut dyn PageDriver) -> ProbeResult<()> {
        info!(fixture = self.name(), "teardown");
        Ok(())
    }

    fn name(&self) -> &str {
        "form-layouts"
    }

    fn priority(&self) -> i32 {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, SharedClock};
    use crate::sim::{ShowcasePage, ShowcaseSim};
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    fn sim() -> ShowcaseSim {
        let clock: SharedClock = Arc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        ));
        ShowcaseSim::new(clock)
    }

    /// Records setup/teardown into a shared journal
    struct Recording {
        name: &'static str,
        priority: i32,
        fail_setup: bool,
        fail_teardown: bool,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl Recording {
        fn new(name: &'static str, priority: i32, journal: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                priority,
                fail_setup: false,
                fail_teardown: false,
                journal: Arc::clone(journal),
            }
        }

        fn failing(mut self) -> Self {
            self.fail_setup = true;
            self
        }

        fn failing_teardown(mut self) -> Self {
            self.fail_teardown = true;
            self
        }
    }

    #[async_trait]
    impl Fixture for Recording {
        async fn setup(&mut self, _driver: &mut dyn PageDriver) -> ProbeResult<()> {
            if self.fail_setup {
                return Err(ProbeError::page("boom"));
            }
            self.journal.lock().unwrap().push(format!("setup:{}", self.name));
            Ok(())
        }

        async fn teardown(&mut self, _driver: &mut dyn PageDriver) -> ProbeResult<()> {
            if self.fail_teardown {
                return Err(ProbeError::page("teardown boom"));
            }
            self.journal.lock().unwrap().push(format!("teardown:{}", self.name));
            Ok(())
        }

        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }
    }

    #[tokio::test]
    async fn test_priority_order_and_reverse_teardown() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut manager = FixtureManager::new();
        manager.register(Recording::new("low", 1, &journal));
        manager.register(Recording::new("high", 5, &journal));
        manager.register(Recording::new("mid", 3, &journal));

        let mut driver = sim();
        manager.setup_all(&mut driver).await.unwrap();
        assert_eq!(manager.setup_order(), vec!["high", "mid", "low"]);
        manager.teardown_all(&mut driver).await.unwrap();

        assert_eq!(
            *journal.lock().unwrap(),
            vec![
                "setup:high",
                "setup:mid",
                "setup:low",
                "teardown:low",
                "teardown:mid",
                "teardown:high",
            ]
        );
        assert_eq!(manager.state("mid"), Some(FixtureState::TornDown));
    }

    #[tokio::test]
    async fn test_failed_setup_rolls_back() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut manager = FixtureManager::new();
        manager.register(Recording::new("first", 2, &journal));
        manager.register(Recording::new("broken", 1, &journal).failing());
        manager.register(Recording::new("never", 0, &journal));

        let mut driver = sim();
        let err = manager.setup_all(&mut driver).await.unwrap_err();
        assert!(err.to_string().contains("'broken' setup failed"));
        assert_eq!(*journal.lock().unwrap(), vec!["setup:first", "teardown:first"]);
        assert_eq!(manager.state("broken"), Some(FixtureState::Failed));
        assert_eq!(manager.state("never"), Some(FixtureState::Registered));
    }

    #[tokio::test]
    async fn test_failed_rollback_still_reports_setup_failure() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut manager = FixtureManager::new();
        manager.register(Recording::new("first", 5, &journal).failing_teardown());
        manager.register(Recording::new("second", 1, &journal).failing());

        let mut driver = sim();
        let err = manager.setup_all(&mut driver).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'second' setup failed"), "{message}");
        assert!(!message.contains("teardown"), "{message}");
        assert_eq!(manager.state("first"), Some(FixtureState::Failed));
        assert_eq!(manager.state("second"), Some(FixtureState::Failed));
    }

    #[tokio::test]
    async fn test_form_layouts_fixture_opens_page() {
        let mut manager = FixtureManager::new();
        manager.register(FormLayoutsFixture::new());
        assert_eq!(manager.count(), 1);

        let mut driver = sim().on_page(ShowcasePage::Toastr);
        manager.setup_all(&mut driver).await.unwrap();
        assert_eq!(driver.page(), ShowcasePage::FormLayouts);
        assert!(driver.was_called("navigate:/"));
        assert_eq!(manager.state("form-layouts"), Some(FixtureState::SetUp));

        manager.teardown_all(&mut driver).await.unwrap();
        assert_eq!(manager.state("form-layouts"), Some(FixtureState::TornDown));
    }
}
