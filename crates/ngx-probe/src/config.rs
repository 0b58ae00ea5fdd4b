//! Harness configuration.
//!
//! Defaults mirror the showcase suite: a local dev server on port 4200,
//! 5 s actions, 50 s navigations, a 2 s expect window and a 10 s test budget.
//! [`HarnessConfig::from_env`] applies the `DEV`, `STAGING`, `CI`, `USERNAME`
//! and `PASSWORD` overrides; YAML files are read with `serde_yaml_ng`.

use crate::driver::{DeviceDescriptor, DriverConfig};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{NavigationBudget, DEFAULT_MAX_FORWARD_STEPS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Deployment the harness talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// `http://localhost:4200/`
    #[default]
    Local,
    /// `http://localhost:4201/`
    Dev,
    /// `http://localhost:4202/`
    Staging,
}

impl Environment {
    /// Base URL served by this environment
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Local => "http://localhost:4200/",
            Self::Dev => "http://localhost:4201/",
            Self::Staging => "http://localhost:4202/",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Dev => f.write_str("dev"),
            Self::Staging => f.write_str("staging"),
        }
    }
}

/// Emulated device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceProfile {
    /// Desktop Chrome, 1920x1080
    #[default]
    DesktopChrome,
    /// iPhone 13 Pro (mobile project)
    Iphone13Pro,
}

impl DeviceProfile {
    /// Descriptor used to build the driver config
    #[must_use]
    pub const fn descriptor(self) -> DeviceDescriptor {
        match self {
            Self::DesktopChrome => DeviceDescriptor::DESKTOP_CHROME,
            Self::Iphone13Pro => DeviceDescriptor::IPHONE_13_PRO,
        }
    }
}

/// Timeouts in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Single action (click, fill, ...)
    pub action_ms: u64,
    /// Page navigation
    pub navigation_ms: u64,
    /// Assertion retry window
    pub expect_ms: u64,
    /// Whole test
    pub test_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action_ms: 5_000,
            navigation_ms: 50_000,
            expect_ms: 2_000,
            test_ms: 10_000,
        }
    }
}

impl Timeouts {
    /// Action timeout
    #[must_use]
    pub const fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    /// Navigation timeout
    #[must_use]
    pub const fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    /// Expect timeout
    #[must_use]
    pub const fn expect(&self) -> Duration {
        Duration::from_millis(self.expect_ms)
    }

    /// Test timeout
    #[must_use]
    pub const fn test(&self) -> Duration {
        Duration::from_millis(self.test_ms)
    }
}

/// Login used by the form flows
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// User name or email
    pub username: String,
    /// Never written back out
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Configuration for one harness run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Target deployment
    pub environment: Environment,
    /// Base URL; follows `environment` unless set explicitly
    pub base_url: String,
    /// Run the browser headless
    pub headless: bool,
    /// Emulated device
    pub device: DeviceProfile,
    /// Timeouts
    pub timeouts: Timeouts,
    /// Credentials for the grid form
    pub credentials: Option<Credentials>,
    /// Wait after opening Form Layouts, in milliseconds
    pub settle_delay_ms: u64,
    /// Forward-step cap for calendar navigation
    pub max_forward_steps: u32,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            base_url: Environment::Local.base_url().to_string(),
            headless: false,
            device: DeviceProfile::DesktopChrome,
            timeouts: Timeouts::default(),
            credentials: None,
            settle_delay_ms: 2_000,
            max_forward_steps: DEFAULT_MAX_FORWARD_STEPS,
        }
    }
}

impl HarnessConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    #[must_use]
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| lookup(key).is_some_and(|v| v == "1");

        if flag("DEV") {
            self = self.with_environment(Environment::Dev);
        } else if flag("STAGING") {
            self = self.with_environment(Environment::Staging);
        }
        if lookup("CI").is_some_and(|v| !v.is_empty()) {
            self.headless = true;
        }
        if let Some(username) = lookup("USERNAME") {
            self.credentials = Some(Credentials {
                username,
                password: lookup("PASSWORD").unwrap_or_default(),
            });
        }
        self
    }

    /// Parse a YAML document; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Serialize to YAML (password omitted)
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject values the harness cannot run with
    pub fn validate(&self) -> ProbeResult<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ProbeError::config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.timeouts.action_ms == 0 || self.timeouts.navigation_ms == 0 {
            return Err(ProbeError::config("timeouts must be positive"));
        }
        Ok(())
    }

    /// Switch environment and its base URL
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self.base_url = environment.base_url().to_string();
        self
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the emulated device
    #[must_use]
    pub const fn with_device(mut self, device: DeviceProfile) -> Self {
        self.device = device;
        self
    }

    /// Set the calendar forward-step cap
    #[must_use]
    pub const fn with_max_forward_steps(mut self, steps: u32) -> Self {
        self.max_forward_steps = steps;
        self
    }

    /// Set the Form Layouts settle delay
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Settle delay as a duration
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Navigation budget for the calendar resolver
    #[must_use]
    pub fn navigation_budget(&self) -> NavigationBudget {
        NavigationBudget::new()
            .with_max_steps(self.max_forward_steps)
            .with_deadline(self.timeouts.test())
    }

    /// Driver settings for the configured device
    #[must_use]
    pub fn driver_config(&self) -> DriverConfig {
        self.device
            .descriptor()
            .to_config()
            .headless(self.headless)
            .navigation_timeout(self.timeouts.navigation())
            .action_timeout(self.timeouts.action())
    }
}
