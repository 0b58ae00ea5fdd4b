//! Chromium-backed [`PageDriver`].
//!
//! Launches Chromium through chromiumoxide and drives the page with small
//! JavaScript snippets built from [`Selector::to_query`] and
//! [`Selector::to_query_all`]. Element-level actions poll until the element
//! exists or the action timeout elapses.

use crate::driver::{DriverConfig, ElementHandle, PageDriver};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetTouchEmulationEnabledParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const HANDLE_ATTR: &str = "data-ngx-probe-id";
const MAX_TOUCH_POINTS: i64 = 5;

/// Element description returned by the find script
#[derive(Debug, Deserialize)]
struct FoundElement {
    id: String,
    tag: String,
    text: String,
}

/// Attribute lookup result; `found` distinguishes a missing element from a
/// missing attribute
#[derive(Debug, Deserialize)]
struct AttributeLookup {
    found: bool,
    value: Option<String>,
}

/// Real browser driver over CDP
#[derive(Debug)]
pub struct ChromiumDriver {
    browser: Mutex<Browser>,
    page: Page,
    handler: tokio::task::JoinHandle<()>,
    base_url: String,
    config: DriverConfig,
    next_handle: AtomicU64,
}

impl ChromiumDriver {
    /// Launch Chromium and open a blank page
    ///
    /// # Errors
    ///
    /// Returns a launch error if Chromium cannot be started
    pub async fn launch(config: DriverConfig, base_url: impl Into<String>) -> ProbeResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .request_timeout(config.navigation_timeout);

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.executable_path {
            builder = builder.chrome_executable(path);
        }
        if let Some(ref ua) = config.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }

        let cdp_config = builder
            .build()
            .map_err(|message| ProbeError::BrowserLaunchError { message })?;

        let (browser, mut handler) =
            Browser::launch(cdp_config)
                .await
                .map_err(|e| ProbeError::BrowserLaunchError {
                    message: e.to_string(),
                })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ProbeError::page(e.to_string()))?;

        if config.needs_emulation() {
            let (metrics, touch) = emulation_params(&config)?;
            page.execute(metrics)
                .await
                .map_err(|e| ProbeError::page(e.to_string()))?;
            page.execute(touch)
                .await
                .map_err(|e| ProbeError::page(e.to_string()))?;
        }

        debug!(
            headless = config.headless,
            mobile = config.is_mobile,
            touch = config.has_touch,
            "chromium launched"
        );
        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            base_url: base_url.into(),
            config,
            next_handle: AtomicU64::new(0),
        })
    }

    /// Driver settings in use
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Close the browser and stop the CDP handler
    pub async fn close(self) -> ProbeResult<()> {
        let result = self
            .browser
            .lock()
            .await
            .close()
            .await
            .map(|_| ())
            .map_err(|e| ProbeError::page(e.to_string()));
        self.handler.abort();
        result
    }

    fn absolute_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("about:") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> ProbeResult<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ProbeError::page(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| ProbeError::page(e.to_string()))
    }

    /// Run `body` against the first match of `selector`, polling until the
    /// element exists or the action timeout elapses
    async fn on_element<T: DeserializeOwned>(
        &self,
        selector: &Selector,
        body: &str,
    ) -> ProbeResult<T> {
        let script = element_script(selector, body);
        let started = Instant::now();
        loop {
            let value: Option<T> = self.eval(script.clone()).await?;
            if let Some(value) = value {
                return Ok(value);
            }
            if started.elapsed() >= self.config.action_timeout {
                return Err(ProbeError::ElementNotFound {
                    selector: selector.to_string(),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// CDP commands emulating the configured device on a page
fn emulation_params(
    config: &DriverConfig,
) -> ProbeResult<(SetDeviceMetricsOverrideParams, SetTouchEmulationEnabledParams)> {
    let metrics = SetDeviceMetricsOverrideParams::builder()
        .width(i64::from(config.viewport_width))
        .height(i64::from(config.viewport_height))
        .device_scale_factor(config.device_scale_factor)
        .mobile(config.is_mobile)
        .build()
        .map_err(|message| ProbeError::BrowserLaunchError { message })?;
    let mut touch = SetTouchEmulationEnabledParams::builder().enabled(config.has_touch);
    if config.has_touch {
        touch = touch.max_touch_points(MAX_TOUCH_POINTS);
    }
    let touch = touch
        .build()
        .map_err(|message| ProbeError::BrowserLaunchError { message })?;
    Ok((metrics, touch))
}

/// Wrap `body` so it runs with `el` bound to the first match; evaluates to
/// `null` when nothing matches
fn element_script(selector: &Selector, body: &str) -> String {
    format!(
        "(() => {{ const el = {}; if (!el) return null; {body} }})()",
        selector.to_query()
    )
}

/// Innermost elements under `container` whose trimmed text is exactly `text`,
/// tagged with a handle attribute
fn find_exact_script(container: &Selector, text: &str, prefix: &str) -> String {
    let t = serde_json::Value::from(text).to_string();
    format!(
        "(() => {{ \
            const exact = el => el.textContent.trim() === {t}; \
            const found = {all}.flatMap(scope => exact(scope) && !Array.from(scope.children).some(exact) \
                ? [scope] \
                : Array.from(scope.querySelectorAll('*')).filter(el => exact(el) && !Array.from(el.children).some(exact))); \
            return Array.from(new Set(found)).map((el, i) => {{ \
                const id = '{prefix}-' + i; \
                el.setAttribute('{HANDLE_ATTR}', id); \
                return {{ id, tag: el.tagName.toLowerCase(), text: el.textContent.trim() }}; \
            }}); \
        }})()",
        all = container.to_query_all(),
    )
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        let target = self.absolute_url(url);
        let navigation = async {
            match self.page.goto(target.as_str()).await {
                Ok(page) => page.wait_for_navigation().await.map(|_| ()),
                Err(e) => Err(e),
            }
        };
        let outcome = tokio::time::timeout(self.config.navigation_timeout, navigation).await;
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ProbeError::NavigationError {
                url: target,
                message: e.to_string(),
            }),
            Err(_) => Err(ProbeError::NavigationError {
                url: target,
                message: format!("timed out after {:?}", self.config.navigation_timeout),
            }),
        }
    }

    async fn click(&mut self, selector: &Selector) -> ProbeResult<()> {
        self.on_element::<bool>(
            selector,
            "el.scrollIntoView({ block: 'center' }); el.click(); return true;",
        )
        .await
        .map(|_| ())
    }

    async fn hover(&mut self, selector: &Selector) -> ProbeResult<()> {
        self.on_element::<bool>(
            selector,
            "for (const type of ['mouseover', 'mouseenter', 'mousemove']) { \
                el.dispatchEvent(new MouseEvent(type, { bubbles: true })); \
            } return true;",
        )
        .await
        .map(|_| ())
    }

    async fn fill(&mut self, selector: &Selector, text: &str) -> ProbeResult<()> {
        let body = format!(
            "el.focus(); el.value = {}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true;",
            serde_json::Value::from(text)
        );
        self.on_element::<bool>(selector, &body).await.map(|_| ())
    }

    async fn check(&mut self, selector: &Selector) -> ProbeResult<()> {
        self.on_element::<bool>(selector, "if (!el.checked) { el.click(); } return true;")
            .await
            .map(|_| ())
    }

    async fn read_text(&self, selector: &Selector) -> ProbeResult<String> {
        self.on_element(selector, "return el.textContent || '';")
            .await
    }

    async fn attribute(&self, selector: &Selector, name: &str) -> ProbeResult<Option<String>> {
        let script = format!(
            "(() => {{ const el = {}; return el ? {{ found: true, value: el.getAttribute({}) }} : {{ found: false, value: null }}; }})()",
            selector.to_query(),
            serde_json::Value::from(name)
        );
        let lookup: AttributeLookup = self.eval(script).await?;
        if lookup.found {
            Ok(lookup.value)
        } else {
            Err(ProbeError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }

    async fn input_value(&self, selector: &Selector) -> ProbeResult<String> {
        self.on_element(selector, "return el.value ?? '';").await
    }

    async fn find_exact(
        &self,
        container: &Selector,
        text: &str,
    ) -> ProbeResult<Vec<ElementHandle>> {
        let generation = self.next_handle.fetch_add(1, Ordering::Relaxed);
        let prefix = format!("h{generation}");
        let found: Vec<FoundElement> = self
            .eval(find_exact_script(container, text, &prefix))
            .await?;
        Ok(found
            .into_iter()
            .map(|el| ElementHandle::new(el.id, el.tag).with_text(el.text))
            .collect())
    }

    async fn click_element(&mut self, element: &ElementHandle) -> ProbeResult<()> {
        let selector = Selector::css(format!(r#"[{HANDLE_ATTR}="{}"]"#, element.id));
        self.click(&selector).await
    }

    async fn current_url(&self) -> ProbeResult<String> {
        self.page
            .url()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| ProbeError::page(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DeviceDescriptor;

    #[test]
    fn test_element_script_guards_missing_element() {
        let script = element_script(&Selector::css("nb-card"), "return true;");
        assert!(script.contains("if (!el) return null;"));
        assert!(script.contains("querySelectorAll(\"nb-card\")"));
    }

    #[test]
    fn test_find_exact_script_tags_handles() {
        let script = find_exact_script(&Selector::css(".day-cell"), "1", "h3");
        assert!(script.contains("=== \"1\""));
        assert!(script.contains("'h3-' + i"));
        assert!(script.contains(HANDLE_ATTR));
    }

    #[test]
    fn test_iphone_emulation_params() {
        let config = DeviceDescriptor::IPHONE_13_PRO.to_config();
        let (metrics, touch) = emulation_params(&config).unwrap();
        assert_eq!(metrics.width, 390);
        assert_eq!(metrics.height, 664);
        assert!(metrics.mobile);
        assert!((metrics.device_scale_factor - 3.0).abs() < f64::EPSILON);
        assert!(touch.enabled);
        assert_eq!(touch.max_touch_points, Some(MAX_TOUCH_POINTS));
    }

    #[tokio::test]
    #[ignore = "requires a Chromium installation"]
    async fn test_launch_and_navigate() {
        let mut driver = ChromiumDriver::launch(DriverConfig::default().no_sandbox(), "about:blank")
            .await
            .unwrap();
        driver.navigate("about:blank").await.unwrap();
        assert_eq!(driver.current_url().await.unwrap(), "about:blank");
        driver.close().await.unwrap();
    }
}
