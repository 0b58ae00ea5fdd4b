//! PageDriver - abstract browser automation capability
//!
//! Everything above this trait (calendar resolver, page objects, fixtures)
//! is written against [`PageDriver`] only, so the same scenario runs against
//! the in-memory [`ShowcaseSim`](crate::ShowcaseSim) or a real Chromium page.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PageDriver (async trait)                                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────────────────┐     ┌──────────────────────────┐ │
//! │  │  ShowcaseSim           │     │  ChromiumDriver          │ │
//! │  │  deterministic model   │     │  CDP via chromiumoxide   │ │
//! │  │  (tests, dry runs)     │     │  (feature = "browser")   │ │
//! │  └────────────────────────┘     └──────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::locator::Selector;
use crate::result::ProbeResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Element handle for DOM interactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-specific identifier for the element
    pub id: String,
    /// Element tag name
    pub tag_name: String,
    /// Element text content
    pub text_content: Option<String>,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            text_content: None,
        }
    }

    /// Attach text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }
}

/// Browser configuration for drivers
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Device scale factor
    pub device_scale_factor: f64,
    /// Emulate a mobile viewport (meta viewport, overlay scrollbars)
    pub is_mobile: bool,
    /// Emulate touch input
    pub has_touch: bool,
    /// User agent string
    pub user_agent: Option<String>,
    /// Timeout for navigation
    pub navigation_timeout: Duration,
    /// Timeout for single actions (click, fill, ...)
    pub action_timeout: Duration,
    /// Executable path override
    pub executable_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            device_scale_factor: 1.0,
            is_mobile: false,
            has_touch: false,
            user_agent: None,
            navigation_timeout: Duration::from_secs(50),
            action_timeout: Duration::from_secs(5),
            executable_path: None,
            sandbox: true,
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set device scale factor
    #[must_use]
    pub const fn scale_factor(mut self, factor: f64) -> Self {
        self.device_scale_factor = factor;
        self
    }

    /// Emulate a mobile device
    #[must_use]
    pub const fn mobile(mut self, mobile: bool) -> Self {
        self.is_mobile = mobile;
        self
    }

    /// Emulate touch input
    #[must_use]
    pub const fn touch(mut self, touch: bool) -> Self {
        self.has_touch = touch;
        self
    }

    /// Whether the page needs device emulation beyond the window size
    #[must_use]
    pub fn needs_emulation(&self) -> bool {
        self.is_mobile || self.has_touch || (self.device_scale_factor - 1.0).abs() > f64::EPSILON
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set navigation timeout
    #[must_use]
    pub const fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Set action timeout
    #[must_use]
    pub const fn action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Set chromium executable path
    #[must_use]
    pub fn executable_path(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Device descriptor for emulation
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    /// Device name
    pub name: &'static str,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Device scale factor
    pub device_scale_factor: f64,
    /// Is mobile device
    pub is_mobile: bool,
    /// Has touch support
    pub has_touch: bool,
    /// Default user agent
    pub user_agent: &'static str,
}

impl DeviceDescriptor {
    /// Desktop Chrome at 1080p
    pub const DESKTOP_CHROME: Self = Self {
        name: "Desktop Chrome",
        viewport_width: 1920,
        viewport_height: 1080,
        device_scale_factor: 1.0,
        is_mobile: false,
        has_touch: false,
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    };

    /// iPhone 13 Pro
    pub const IPHONE_13_PRO: Self = Self {
        name: "iPhone 13 Pro",
        viewport_width: 390,
        viewport_height: 664,
        device_scale_factor: 3.0,
        is_mobile: true,
        has_touch: true,
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Mobile/15E148 Safari/604.1",
    };

    /// Convert to driver config
    #[must_use]
    pub fn to_config(&self) -> DriverConfig {
        DriverConfig::default()
            .viewport(self.viewport_width, self.viewport_height)
            .scale_factor(self.device_scale_factor)
            .mobile(self.is_mobile)
            .touch(self.has_touch)
            .user_agent(self.user_agent)
    }
}

/// Abstract driver trait for browser automation
///
/// Mutating actions take `&mut self`; a driver is bound to one page and is
/// never shared between concurrent callers.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate to a URL or a path relative to the base URL
    async fn navigate(&mut self, url: &str) -> ProbeResult<()>;

    /// Click the first element matching the selector
    async fn click(&mut self, selector: &Selector) -> ProbeResult<()>;

    /// Hover over the first element matching the selector
    async fn hover(&mut self, selector: &Selector) -> ProbeResult<()>;

    /// Replace the value of an input
    async fn fill(&mut self, selector: &Selector, text: &str) -> ProbeResult<()>;

    /// Check a checkbox or radio (no-op when already checked)
    async fn check(&mut self, selector: &Selector) -> ProbeResult<()>;

    /// Rendered text content of the first matching element
    async fn read_text(&self, selector: &Selector) -> ProbeResult<String>;

    /// Attribute value of the first matching element
    async fn attribute(&self, selector: &Selector, name: &str) -> ProbeResult<Option<String>>;

    /// Current value of an input
    async fn input_value(&self, selector: &Selector) -> ProbeResult<String>;

    /// All elements inside `container` whose trimmed text equals `text`
    async fn find_exact(&self, container: &Selector, text: &str)
        -> ProbeResult<Vec<ElementHandle>>;

    /// Click an element previously returned by [`PageDriver::find_exact`]
    async fn click_element(&mut self, element: &ElementHandle) -> ProbeResult<()>;

    /// Get current URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Wait for a fixed duration
    async fn pause(&mut self, duration: Duration) -> ProbeResult<()> {
        tokio::time::sleep(duration).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod element_handle_tests {
        use super::*;

        #[test]
        fn test_element_handle_creation() {
            let elem = ElementHandle::new("cell-14", "nb-calendar-day-cell").with_text("14");
            assert_eq!(elem.id, "cell-14");
            assert_eq!(elem.tag_name, "nb-calendar-day-cell");
            assert_eq!(elem.text_content.as_deref(), Some("14"));
        }
    }

    mod driver_config_tests {
        use super::*;

        #[test]
        fn test_config_default() {
            let config = DriverConfig::default();
            assert!(config.headless);
            assert_eq!(config.viewport_width, 1920);
            assert_eq!(config.navigation_timeout, Duration::from_secs(50));
            assert_eq!(config.action_timeout, Duration::from_secs(5));
            assert!(!config.needs_emulation());
        }

        #[test]
        fn test_config_builder() {
            let config = DriverConfig::new()
                .headless(false)
                .viewport(800, 600)
                .user_agent("test-agent")
                .no_sandbox();

            assert!(!config.headless);
            assert_eq!(config.viewport_width, 800);
            assert_eq!(config.viewport_height, 600);
            assert_eq!(config.user_agent, Some("test-agent".to_string()));
            assert!(!config.sandbox);
        }
    }

    mod device_descriptor_tests {
        use super::*;

        #[test]
        fn test_iphone_13_pro() {
            let device = DeviceDescriptor::IPHONE_13_PRO;
            assert_eq!(device.viewport_width, 390);
            assert!(device.is_mobile);
            assert!(device.has_touch);
        }

        #[test]
        fn test_device_to_config() {
            let config = DeviceDescriptor::IPHONE_13_PRO.to_config();
            assert_eq!(config.viewport_width, 390);
            assert_eq!(config.viewport_height, 664);
            assert!(config.is_mobile);
            assert!(config.has_touch);
            assert!(config.needs_emulation());
            assert!(config.user_agent.unwrap().contains("iPhone"));
        }
    }
}
