//! Page objects for the ngx-admin showcase.
//!
//! Each page object borrows a [`PageDriver`] for the duration of one flow and
//! encapsulates the selectors of its page. [`PageManager`] owns the driver and
//! hands the page objects out, so a test reads as
//! `pm.navigate_to().datepicker_page().await?`.

use crate::calendar::{CalendarDateResolver, RangeOutcome, ResolverOutcome};
use crate::config::HarnessConfig;
use crate::driver::PageDriver;
use crate::locator::{Role, Selector};
use crate::result::{ProbeError, ProbeResult};
use std::time::Duration;
use tracing::{debug, info};

// =============================================================================
// PAGE OBJECT TRAIT
// =============================================================================

/// A page or component of the UI under test
pub trait PageObject {
    /// URL pattern that matches this page (e.g., "/pages/forms/datepicker")
    fn url_pattern(&self) -> &str;

    /// Page name for logging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// How long the page may take to become interactive
    fn load_timeout(&self) -> Duration {
        Duration::from_secs(50)
    }
}

// =============================================================================
// SHOWCASE VOCABULARY
// =============================================================================

/// Collapsible sidebar groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MenuGroup {
    /// "Forms"
    Forms,
    /// "Tables & Data"
    TablesAndData,
    /// "Modal & Overlays"
    ModalAndOverlays,
}

impl MenuGroup {
    /// All groups in sidebar order
    pub const ALL: [Self; 3] = [Self::Forms, Self::TablesAndData, Self::ModalAndOverlays];

    /// Title attribute of the group's menu entry
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Forms => "Forms",
            Self::TablesAndData => "Tables & Data",
            Self::ModalAndOverlays => "Modal & Overlays",
        }
    }

    /// Look a group up by its title
    #[must_use]
    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.title() == title)
    }

    /// Selector of the group's menu entry
    #[must_use]
    pub fn selector(self) -> Selector {
        Selector::title(self.title())
    }
}

/// Sidebar items the page objects navigate to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuItem {
    /// Forms / Form Layouts
    FormLayouts,
    /// Forms / Datepicker
    Datepicker,
    /// Tables & Data / Smart Table
    SmartTable,
    /// Modal & Overlays / Toastr
    Toastr,
    /// Modal & Overlays / Tooltip
    Tooltip,
}

impl MenuItem {
    /// All items in sidebar order
    pub const ALL: [Self; 5] = [
        Self::FormLayouts,
        Self::Datepicker,
        Self::SmartTable,
        Self::Toastr,
        Self::Tooltip,
    ];

    /// Visible text of the item
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FormLayouts => "Form Layouts",
            Self::Datepicker => "Datepicker",
            Self::SmartTable => "Smart Table",
            Self::Toastr => "Toastr",
            Self::Tooltip => "Tooltip",
        }
    }

    /// Group the item lives in
    #[must_use]
    pub const fn group(self) -> MenuGroup {
        match self {
            Self::FormLayouts | Self::Datepicker => MenuGroup::Forms,
            Self::SmartTable => MenuGroup::TablesAndData,
            Self::Toastr | Self::Tooltip => MenuGroup::ModalAndOverlays,
        }
    }

    /// Route of the page behind the item
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::FormLayouts => "/pages/forms/layouts",
            Self::Datepicker => "/pages/forms/datepicker",
            Self::SmartTable => "/pages/tables/smart-table",
            Self::Toastr => "/pages/modal-overlays/toastr",
            Self::Tooltip => "/pages/modal-overlays/tooltip",
        }
    }

    /// Look an item up by its visible text
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.label() == label)
    }

    /// Selector of the item's menu entry
    #[must_use]
    pub fn selector(self) -> Selector {
        Selector::text(self.label())
    }
}

/// The two date pickers on the Datepicker page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatePicker {
    /// Single-date picker
    Common,
    /// Start/end range picker
    Range,
}

impl DatePicker {
    /// Placeholder of the picker's input
    #[must_use]
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Common => "Form Picker",
            Self::Range => "Range Picker",
        }
    }

    /// Look a picker up by its input placeholder
    #[must_use]
    pub fn from_placeholder(placeholder: &str) -> Option<Self> {
        [Self::Common, Self::Range]
            .into_iter()
            .find(|picker| picker.placeholder() == placeholder)
    }

    /// Selector of the picker's input
    #[must_use]
    pub fn input(self) -> Selector {
        Selector::placeholder(self.placeholder())
    }
}

/// Cards on the Form Layouts page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormCard {
    /// "Using the Grid"
    UsingTheGrid,
    /// "Inline form"
    InlineForm,
}

impl FormCard {
    /// Heading text of the card
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::UsingTheGrid => "Using the Grid",
            Self::InlineForm => "Inline form",
        }
    }

    /// Look a card up by its heading
    #[must_use]
    pub fn from_title(title: &str) -> Option<Self> {
        [Self::UsingTheGrid, Self::InlineForm]
            .into_iter()
            .find(|card| card.title() == title)
    }

    /// `nb-card` containing the heading
    #[must_use]
    pub fn selector(self) -> Selector {
        Selector::css_with_text("nb-card", self.title())
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

/// Sidebar navigation
#[derive(Debug)]
pub struct NavigationPage<'a, D: PageDriver + ?Sized> {
    driver: &'a mut D,
    settle_delay: Duration,
}

impl<'a, D: PageDriver + ?Sized> NavigationPage<'a, D> {
    /// Wrap a driver; `settle_delay` is waited after opening Form Layouts
    pub fn new(driver: &'a mut D, settle_delay: Duration) -> Self {
        Self {
            driver,
            settle_delay,
        }
    }

    /// Open Forms / Form Layouts
    pub async fn form_layouts_page(&mut self) -> ProbeResult<()> {
        self.open(MenuItem::FormLayouts).await?;
        self.driver.pause(self.settle_delay).await
    }

    /// Open Forms / Datepicker
    pub async fn datepicker_page(&mut self) -> ProbeResult<()> {
        self.open(MenuItem::Datepicker).await
    }

    /// Open Tables & Data / Smart Table
    pub async fn smart_table_page(&mut self) -> ProbeResult<()> {
        self.open(MenuItem::SmartTable).await
    }

    /// Open Modal & Overlays / Toastr
    pub async fn toastr_page(&mut self) -> ProbeResult<()> {
        self.open(MenuItem::Toastr).await
    }

    /// Open Modal & Overlays / Tooltip
    pub async fn tooltip_page(&mut self) -> ProbeResult<()> {
        self.open(MenuItem::Tooltip).await
    }

    async fn open(&mut self, item: MenuItem) -> ProbeResult<()> {
        self.expand_group(item.group()).await?;
        self.driver.click(&item.selector()).await?;
        debug!(item = item.label(), "opened menu item");
        Ok(())
    }

    async fn expand_group(&mut self, group: MenuGroup) -> ProbeResult<()> {
        let selector = group.selector();
        let expanded = self.driver.attribute(&selector, "aria-expanded").await?;
        if expanded.as_deref() == Some("false") {
            self.driver.click(&selector).await?;
        }
        Ok(())
    }
}

impl<D: PageDriver + ?Sized> PageObject for NavigationPage<'_, D> {
    fn url_pattern(&self) -> &str {
        "/pages/*"
    }

    fn page_name(&self) -> &str {
        "navigation"
    }
}

// =============================================================================
// FORM LAYOUTS
// =============================================================================

/// Forms / Form Layouts
#[derive(Debug)]
pub struct FormLayoutsPage<'a, D: PageDriver + ?Sized> {
    driver: &'a mut D,
}

impl<'a, D: PageDriver + ?Sized> FormLayoutsPage<'a, D> {
    /// Wrap a driver already on the Form Layouts page
    pub fn new(driver: &'a mut D) -> Self {
        Self { driver }
    }

    /// Fill and submit the "Using the Grid" card
    pub async fn submit_using_grid_form(
        &mut self,
        email: &str,
        password: &str,
        option: &str,
    ) -> ProbeResult<()> {
        let card = FormCard::UsingTheGrid.selector();
        self.driver
            .fill(&card.clone().within(Selector::role_named(Role::Textbox, "Email")), email)
            .await?;
        self.driver
            .fill(
                &card.clone().within(Selector::role_named(Role::Textbox, "Password")),
                password,
            )
            .await?;
        self.driver
            .check(&card.clone().within(Selector::role_named(Role::Radio, option)))
            .await?;
        self.driver.click(&card.within(Selector::role(Role::Button))).await
    }

    /// Fill and submit the "Inline form" card
    ///
    /// `name` is a first and last name; the checkbox saves the session.
    pub async fn submit_inline_form(
        &mut self,
        name: &str,
        email: &str,
        remember: bool,
    ) -> ProbeResult<()> {
        let card = FormCard::InlineForm.selector();
        self.driver
            .fill(&card.clone().within(Selector::role_named(Role::Textbox, "Jane Doe")), name)
            .await?;
        self.driver
            .fill(&card.clone().within(Selector::role_named(Role::Textbox, "Email")), email)
            .await?;
        if remember {
            self.driver
                .check(&card.clone().within(Selector::role(Role::Checkbox)))
                .await?;
        }
        self.driver.click(&card.within(Selector::role(Role::Button))).await
    }
}

impl<D: PageDriver + ?Sized> PageObject for FormLayoutsPage<'_, D> {
    fn url_pattern(&self) -> &str {
        MenuItem::FormLayouts.path()
    }

    fn page_name(&self) -> &str {
        "form-layouts"
    }
}

// =============================================================================
// DATEPICKER
// =============================================================================

/// Forms / Datepicker
#[derive(Debug)]
pub struct DatepickerPage<'a, D: PageDriver + ?Sized> {
    driver: &'a mut D,
    resolver: &'a CalendarDateResolver,
}

impl<'a, D: PageDriver + ?Sized> DatepickerPage<'a, D> {
    /// Wrap a driver already on the Datepicker page
    pub fn new(driver: &'a mut D, resolver: &'a CalendarDateResolver) -> Self {
        Self { driver, resolver }
    }

    /// Pick `today + offset` in the single-date picker and verify the input
    pub async fn select_common_datepicker_date_from_today(
        &mut self,
        offset: i64,
    ) -> ProbeResult<ResolverOutcome> {
        let input = DatePicker::Common.input();
        self.driver.click(&input).await?;
        let outcome = self
            .resolver
            .resolve_and_select_with_report(&mut *self.driver, offset)
            .await?;
        self.expect_value(&input, outcome.label.as_str()).await?;
        Ok(outcome)
    }

    /// Pick `today + start ..= today + end` in the range picker and verify the input
    pub async fn select_datepicker_with_range_from_today(
        &mut self,
        start: i64,
        end: i64,
    ) -> ProbeResult<RangeOutcome> {
        let input = DatePicker::Range.input();
        self.driver.click(&input).await?;
        let outcome = self
            .resolver
            .resolve_range_and_select_with_report(&mut *self.driver, start, end)
            .await?;
        self.expect_value(&input, outcome.label.as_str()).await?;
        Ok(outcome)
    }

    async fn expect_value(&self, input: &Selector, expected: &str) -> ProbeResult<()> {
        let actual = self.driver.input_value(input).await?;
        if actual != expected {
            return Err(ProbeError::assertion(format!(
                "expected {input} to have value '{expected}', got '{actual}'"
            )));
        }
        info!(value = expected, "datepicker input verified");
        Ok(())
    }
}

impl<D: PageDriver + ?Sized> PageObject for DatepickerPage<'_, D> {
    fn url_pattern(&self) -> &str {
        MenuItem::Datepicker.path()
    }

    fn page_name(&self) -> &str {
        "datepicker"
    }
}

// =============================================================================
// PAGE MANAGER
// =============================================================================

/// Owns the driver and hands out page objects
#[derive(Debug)]
pub struct PageManager<D: PageDriver> {
    driver: D,
    config: HarnessConfig,
    resolver: CalendarDateResolver,
}

impl<D: PageDriver> PageManager<D> {
    /// Build a manager; the resolver is used by the Datepicker page
    pub fn new(driver: D, config: HarnessConfig, resolver: CalendarDateResolver) -> Self {
        Self {
            driver,
            config,
            resolver,
        }
    }

    /// Sidebar navigation
    pub fn navigate_to(&mut self) -> NavigationPage<'_, D> {
        NavigationPage::new(&mut self.driver, self.config.settle_delay())
    }

    /// Form Layouts page
    pub fn on_form_layouts_page(&mut self) -> FormLayoutsPage<'_, D> {
        FormLayoutsPage::new(&mut self.driver)
    }

    /// Datepicker page
    pub fn on_datepicker_page(&mut self) -> DatepickerPage<'_, D> {
        DatepickerPage::new(&mut self.driver, &self.resolver)
    }

    /// Open the base URL
    pub async fn open_home(&mut self) -> ProbeResult<()> {
        self.driver.navigate("/").await
    }

    /// Harness configuration
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Borrow the driver
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Borrow the driver mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Give the driver back
    pub fn into_driver(self) -> D {
        self.driver
    }
}
