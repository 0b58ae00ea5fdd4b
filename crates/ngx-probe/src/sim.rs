//! In-memory model of the ngx-admin showcase.
//!
//! [`ShowcaseSim`] implements [`PageDriver`] for the handful of widgets the
//! page objects touch: the sidebar menu, the two Form Layouts cards and the
//! Nebular date pickers. It answers selectors structurally instead of
//! evaluating CSS, records every action, and exposes knobs for the widget
//! misbehaviours the calendar resolver has to survive (locale change, max
//! date, duplicated or leaking day cells).

use crate::calendar::{CalendarSelectors, MonthYear, TargetDate};
use crate::clock::SharedClock;
use crate::driver::{ElementHandle, PageDriver};
use crate::locator::{Role, Selector};
use crate::page_object::{DatePicker, FormCard, MenuGroup, MenuItem};
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, TimeDelta};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Default base URL of the simulated app
pub const SIM_BASE_URL: &str = "http://localhost:4200";

/// Pages reachable from the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShowcasePage {
    /// IoT dashboard landing page
    Home,
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

impl From<MenuItem> for ShowcasePage {
    fn from(item: MenuItem) -> Self {
        match item {
            MenuItem::FormLayouts => Self::FormLayouts,
            MenuItem::Datepicker => Self::Datepicker,
            MenuItem::SmartTable => Self::SmartTable,
            MenuItem::Toastr => Self::Toastr,
            MenuItem::Tooltip => Self::Tooltip,
        }
    }
}

/// How the calendar header renders the displayed month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderFormat {
    /// `" February 2024 "` as Nebular renders it
    #[default]
    Nebular,
    /// `"2024-02"`, a format the resolver cannot parse
    Numeric,
}

/// Values submitted through the "Using the Grid" card
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GridSubmission {
    /// Email field
    pub email: String,
    /// Password field
    pub password: String,
    /// Checked radio option
    pub option: Option<String>,
}

/// Values submitted through the "Inline form" card
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineSubmission {
    /// "Jane Doe" name field
    pub name: String,
    /// Email field
    pub email: String,
    /// "Remember me" checkbox
    pub remember: bool,
}

#[derive(Debug, Clone, Copy)]
struct CalendarOverlay {
    picker: DatePicker,
    displayed: MonthYear,
    range_start: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default)]
struct SimOptions {
    header_format: HeaderFormat,
    max_month: Option<MonthYear>,
    min_date: Option<NaiveDate>,
    duplicate_day_cells: bool,
    leak_bounding_cells: bool,
    header_lag_reads: u32,
}

#[derive(Debug, Clone, Copy)]
enum FieldSlot {
    GridEmail,
    GridPassword,
    InlineName,
    InlineEmail,
}

impl FieldSlot {
    fn resolve(card: FormCard, inner: &Selector) -> Option<Self> {
        let Selector::Role {
            role: Role::Textbox,
            name: Some(name),
        } = inner
        else {
            return None;
        };
        match (card, name.as_str()) {
            (FormCard::UsingTheGrid, "Email") => Some(Self::GridEmail),
            (FormCard::UsingTheGrid, "Password") => Some(Self::GridPassword),
            (FormCard::InlineForm, "Jane Doe") => Some(Self::InlineName),
            (FormCard::InlineForm, "Email") => Some(Self::InlineEmail),
            _ => None,
        }
    }
}

/// Deterministic in-memory showcase driver
#[derive(Debug)]
pub struct ShowcaseSim {
    clock: SharedClock,
    base_url: String,
    url: String,
    page: ShowcasePage,
    expanded: BTreeSet<MenuGroup>,
    grid: GridSubmission,
    inline: InlineSubmission,
    grid_submissions: Vec<GridSubmission>,
    inline_submissions: Vec<InlineSubmission>,
    common_value: String,
    range_value: String,
    calendar: Option<CalendarOverlay>,
    calendar_selectors: CalendarSelectors,
    options: SimOptions,
    stale_header: Option<MonthYear>,
    stale_reads: AtomicU32,
    history: Vec<String>,
}

impl ShowcaseSim {
    /// Create a sim on the landing page with every menu group collapsed
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            base_url: SIM_BASE_URL.to_string(),
            url: format!("{SIM_BASE_URL}/"),
            page: ShowcasePage::Home,
            expanded: BTreeSet::new(),
            grid: GridSubmission::default(),
            inline: InlineSubmission::default(),
            grid_submissions: Vec::new(),
            inline_submissions: Vec::new(),
            common_value: String::new(),
            range_value: String::new(),
            calendar: None,
            calendar_selectors: CalendarSelectors::nebular(),
            options: SimOptions::default(),
            stale_header: None,
            stale_reads: AtomicU32::new(0),
            history: Vec::new(),
        }
    }

    /// Serve under another base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self.url = format!("{}/", self.base_url);
        self
    }

    /// Start on a given page
    #[must_use]
    pub fn on_page(mut self, page: ShowcasePage) -> Self {
        self.page = page;
        self
    }

    /// Render the calendar header differently
    #[must_use]
    pub const fn with_header_format(mut self, format: HeaderFormat) -> Self {
        self.options.header_format = format;
        self
    }

    /// Disable forward navigation past `month`
    #[must_use]
    pub const fn with_max_month(mut self, month: MonthYear) -> Self {
        self.options.max_month = Some(month);
        self
    }

    /// Disable day cells before `date`
    #[must_use]
    pub const fn with_min_date(mut self, date: NaiveDate) -> Self {
        self.options.min_date = Some(date);
        self
    }

    /// Render every day cell twice
    #[must_use]
    pub const fn with_duplicate_day_cells(mut self, enabled: bool) -> Self {
        self.options.duplicate_day_cells = enabled;
        self
    }

    /// Let adjacent-month cells match the day-cell selector
    #[must_use]
    pub const fn with_bounding_cells_leaking(mut self, enabled: bool) -> Self {
        self.options.leak_bounding_cells = enabled;
        self
    }

    /// Keep showing the previous month for `reads` header reads after each
    /// forward click
    #[must_use]
    pub const fn with_header_lag(mut self, reads: u32) -> Self {
        self.options.header_lag_reads = reads;
        self
    }

    /// Current page
    #[must_use]
    pub const fn page(&self) -> ShowcasePage {
        self.page
    }

    /// Whether a sidebar group is expanded
    #[must_use]
    pub fn is_group_expanded(&self, group: MenuGroup) -> bool {
        self.expanded.contains(&group)
    }

    /// Month shown by the open calendar
    #[must_use]
    pub fn displayed_month(&self) -> Option<MonthYear> {
        self.calendar.map(|overlay| overlay.displayed)
    }

    /// Whether a calendar overlay is open
    #[must_use]
    pub const fn is_calendar_open(&self) -> bool {
        self.calendar.is_some()
    }

    /// Current value of a picker input
    #[must_use]
    pub fn picker_value(&self, picker: DatePicker) -> &str {
        match picker {
            DatePicker::Common => &self.common_value,
            DatePicker::Range => &self.range_value,
        }
    }

    /// Everything submitted through the grid card
    #[must_use]
    pub fn grid_submissions(&self) -> &[GridSubmission] {
        &self.grid_submissions
    }

    /// Everything submitted through the inline card
    #[must_use]
    pub fn inline_submissions(&self) -> &[InlineSubmission] {
        &self.inline_submissions
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Check if an action with this prefix was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.history.iter().any(|c| c.starts_with(prefix))
    }

    /// Number of activations of the calendar's forward control
    #[must_use]
    pub fn forward_clicks(&self) -> usize {
        let entry = format!("click:{}", self.calendar_selectors.forward);
        self.history.iter().filter(|c| **c == entry).count()
    }

    /// Ids of elements clicked through [`PageDriver::click_element`]
    #[must_use]
    pub fn clicked_elements(&self) -> Vec<String> {
        self.history
            .iter()
            .filter_map(|c| c.strip_prefix("click_element:"))
            .map(str::to_string)
            .collect()
    }

    fn not_found(selector: &Selector) -> ProbeError {
        ProbeError::ElementNotFound {
            selector: selector.to_string(),
        }
    }

    fn open_overlay(&self, selector: &Selector) -> ProbeResult<CalendarOverlay> {
        self.calendar.ok_or_else(|| Self::not_found(selector))
    }

    fn render_header(&self, month: MonthYear) -> String {
        match self.options.header_format {
            HeaderFormat::Nebular => format!(" {month} "),
            HeaderFormat::Numeric => format!("{}-{:02}", month.year(), month.month()),
        }
    }

    fn menu_item_visible(&self, item: MenuItem) -> bool {
        self.expanded.contains(&item.group())
    }

    fn toggle_group(&mut self, group: MenuGroup) {
        if !self.expanded.remove(&group) {
            let _ = self.expanded.insert(group);
        }
    }

    fn card_on_page(&self, container: &Selector) -> Option<FormCard> {
        if self.page != ShowcasePage::FormLayouts {
            return None;
        }
        match container {
            Selector::CssWithText { css, text } if css == "nb-card" => {
                FormCard::from_title(text.trim())
            }
            _ => None,
        }
    }

    fn picker_on_page(&self, selector: &Selector) -> Option<DatePicker> {
        if self.page != ShowcasePage::Datepicker {
            return None;
        }
        match selector {
            Selector::Placeholder(value) => DatePicker::from_placeholder(value),
            _ => None,
        }
    }

    fn field_mut(&mut self, slot: FieldSlot) -> &mut String {
        match slot {
            FieldSlot::GridEmail => &mut self.grid.email,
            FieldSlot::GridPassword => &mut self.grid.password,
            FieldSlot::InlineName => &mut self.inline.name,
            FieldSlot::InlineEmail => &mut self.inline.email,
        }
    }

    fn field(&self, slot: FieldSlot) -> &str {
        match slot {
            FieldSlot::GridEmail => &self.grid.email,
            FieldSlot::GridPassword => &self.grid.password,
            FieldSlot::InlineName => &self.inline.name,
            FieldSlot::InlineEmail => &self.inline.email,
        }
    }

    fn select_date(&mut self, date: NaiveDate) -> ProbeResult<()> {
        let Some(mut overlay) = self.calendar else {
            return Err(ProbeError::page("calendar is not open"));
        };
        let label = TargetDate::new(date).label();
        match overlay.picker {
            DatePicker::Common => {
                self.common_value = label.into_string();
                self.calendar = None;
            }
            DatePicker::Range => match overlay.range_start.take() {
                None => {
                    overlay.range_start = Some(date);
                    self.range_value = label.into_string();
                    self.calendar = Some(overlay);
                }
                Some(start) => {
                    let start_label = TargetDate::new(start).label();
                    self.range_value = format!("{start_label} - {label}");
                    self.calendar = None;
                }
            },
        }
        Ok(())
    }

    fn day_cells(&self, overlay: CalendarOverlay, text: &str) -> Vec<ElementHandle> {
        let month = overlay.displayed;
        let mut cells = Vec::new();

        for day in 1..=month.days_in_month() {
            let Some(date) = NaiveDate::from_ymd_opt(month.year(), month.month(), day) else {
                continue;
            };
            if self.options.min_date.is_some_and(|min| date < min) {
                continue;
            }
            if day.to_string() == text {
                cells.push(day_handle("day", date, ""));
                if self.options.duplicate_day_cells {
                    cells.push(day_handle("day", date, "-dup"));
                }
            }
        }

        if self.options.leak_bounding_cells {
            cells.extend(
                bounding_dates(month)
                    .into_iter()
                    .filter(|date| date.day().to_string() == text)
                    .map(|date| day_handle("bounding", date, "")),
            );
        }
        cells
    }
}

fn day_handle(kind: &str, date: NaiveDate, suffix: &str) -> ElementHandle {
    ElementHandle::new(
        format!("{kind}-{}{suffix}", date.format("%Y-%m-%d")),
        "nb-calendar-day-cell",
    )
    .with_text(date.day().to_string())
}

/// Adjacent-month dates filling a six-week, Sunday-first grid
fn bounding_dates(month: MonthYear) -> Vec<NaiveDate> {
    let Some(first) = month.first_day() else {
        return Vec::new();
    };
    let leading = i64::from(first.weekday().num_days_from_sunday());
    let trailing = 42 - leading - i64::from(month.days_in_month());

    let before = (1..=leading)
        .rev()
        .filter_map(|n| first.checked_sub_signed(TimeDelta::days(n)));
    let after = month.next().first_day().into_iter().flat_map(move |next| {
        (0..trailing).filter_map(move |n| next.checked_add_signed(TimeDelta::days(n)))
    });
    before.chain(after).collect()
}

fn parse_cell_id(id: &str) -> Option<NaiveDate> {
    let rest = id
        .strip_prefix("day-")
        .or_else(|| id.strip_prefix("bounding-"))?;
    let rest = rest.strip_suffix("-dup").unwrap_or(rest);
    NaiveDate::parse_from_str(rest, "%Y-%m-%d").ok()
}

#[async_trait]
impl PageDriver for ShowcaseSim {
    async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        self.history.push(format!("navigate:{url}"));
        let path = url.strip_prefix(&self.base_url).unwrap_or(url);
        if !path.starts_with('/') && !path.is_empty() {
            return Err(ProbeError::NavigationError {
                url: url.to_string(),
                message: format!("outside {}", self.base_url),
            });
        }
        self.url = format!("{}{}", self.base_url, if path.is_empty() { "/" } else { path });
        self.page = ShowcasePage::Home;
        self.calendar = None;
        Ok(())
    }

    async fn click(&mut self, selector: &Selector) -> ProbeResult<()> {
        self.history.push(format!("click:{selector}"));

        if *selector == self.calendar_selectors.forward {
            let mut overlay = self.open_overlay(selector)?;
            let at_max = self
                .options
                .max_month
                .is_some_and(|max| overlay.displayed >= max);
            if !at_max {
                self.stale_header = Some(overlay.displayed);
                *self.stale_reads.get_mut() = self.options.header_lag_reads;
                overlay.displayed = overlay.displayed.next();
                self.calendar = Some(overlay);
            }
            return Ok(());
        }

        if let Some(picker) = self.picker_on_page(selector) {
            let displayed = MonthYear::of(self.clock.today());
            self.calendar = Some(CalendarOverlay {
                picker,
                displayed,
                range_start: None,
            });
            return Ok(());
        }

        match selector {
            Selector::Title(title) => {
                let group = MenuGroup::from_title(title).ok_or_else(|| Self::not_found(selector))?;
                self.toggle_group(group);
                Ok(())
            }
            Selector::Text(text) => {
                if let Some(group) = MenuGroup::from_title(text) {
                    self.toggle_group(group);
                    return Ok(());
                }
                match MenuItem::from_label(text) {
                    Some(item) if self.menu_item_visible(item) => {
                        self.page = item.into();
                        self.url = format!("{}{}", self.base_url, item.path());
                        self.calendar = None;
                        Ok(())
                    }
                    _ => Err(Self::not_found(selector)),
                }
            }
            Selector::Within { container, inner } => {
                let card = self
                    .card_on_page(container)
                    .ok_or_else(|| Self::not_found(selector))?;
                if **inner != Selector::role(Role::Button) {
                    return Err(Self::not_found(selector));
                }
                match card {
                    FormCard::UsingTheGrid => self.grid_submissions.push(self.grid.clone()),
                    FormCard::InlineForm => self.inline_submissions.push(self.inline.clone()),
                }
                Ok(())
            }
            _ => Err(Self::not_found(selector)),
        }
    }

    async fn hover(&mut self, selector: &Selector) -> ProbeResult<()> {
        self.history.push(format!("hover:{selector}"));
        Ok(())
    }

    async fn fill(&mut self, selector: &Selector, text: &str) -> ProbeResult<()> {
        self.history.push(format!("fill:{selector}={text}"));
        let Selector::Within { container, inner } = selector else {
            return Err(Self::not_found(selector));
        };
        let card = self
            .card_on_page(container)
            .ok_or_else(|| Self::not_found(selector))?;
        let slot = FieldSlot::resolve(card, inner).ok_or_else(|| Self::not_found(selector))?;
        *self.field_mut(slot) = text.to_string();
        Ok(())
    }

    async fn check(&mut self, selector: &Selector) -> ProbeResult<()> {
        self.history.push(format!("check:{selector}"));
        let Selector::Within { container, inner } = selector else {
            return Err(Self::not_found(selector));
        };
        let card = self
            .card_on_page(container)
            .ok_or_else(|| Self::not_found(selector))?;
        match (card, &**inner) {
            (
                FormCard::UsingTheGrid,
                Selector::Role {
                    role: Role::Radio,
                    name: Some(name),
                },
            ) if name == "Option 1" || name == "Option 2" => {
                self.grid.option = Some(name.clone());
                Ok(())
            }
            (
                FormCard::InlineForm,
                Selector::Role {
                    role: Role::Checkbox,
                    ..
                },
            ) => {
                self.inline.remember = true;
                Ok(())
            }
            _ => Err(Self::not_found(selector)),
        }
    }

    async fn read_text(&self, selector: &Selector) -> ProbeResult<String> {
        if *selector == self.calendar_selectors.header {
            let overlay = self.open_overlay(selector)?;
            let lagging = self
                .stale_reads
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
                .is_ok();
            let shown = match self.stale_header {
                Some(previous) if lagging => previous,
                _ => overlay.displayed,
            };
            return Ok(self.render_header(shown));
        }
        Err(Self::not_found(selector))
    }

    async fn attribute(&self, selector: &Selector, name: &str) -> ProbeResult<Option<String>> {
        match selector {
            Selector::Title(title) => {
                let group = MenuGroup::from_title(title).ok_or_else(|| Self::not_found(selector))?;
                Ok((name == "aria-expanded").then(|| self.is_group_expanded(group).to_string()))
            }
            Selector::Placeholder(_) => {
                let picker = self
                    .picker_on_page(selector)
                    .ok_or_else(|| Self::not_found(selector))?;
                Ok((name == "placeholder").then(|| picker.placeholder().to_string()))
            }
            _ => Err(Self::not_found(selector)),
        }
    }

    async fn input_value(&self, selector: &Selector) -> ProbeResult<String> {
        if let Some(picker) = self.picker_on_page(selector) {
            return Ok(self.picker_value(picker).to_string());
        }
        if let Selector::Within { container, inner } = selector {
            let slot = self
                .card_on_page(container)
                .and_then(|card| FieldSlot::resolve(card, inner));
            if let Some(slot) = slot {
                return Ok(self.field(slot).to_string());
            }
        }
        Err(Self::not_found(selector))
    }

    async fn find_exact(
        &self,
        container: &Selector,
        text: &str,
    ) -> ProbeResult<Vec<ElementHandle>> {
        if *container != self.calendar_selectors.day_cells {
            return Err(Self::not_found(container));
        }
        let overlay = self.open_overlay(container)?;
        Ok(self.day_cells(overlay, text))
    }

    async fn click_element(&mut self, element: &ElementHandle) -> ProbeResult<()> {
        self.history.push(format!("click_element:{}", element.id));
        let date = parse_cell_id(&element.id).ok_or_else(|| ProbeError::ElementNotFound {
            selector: element.id.clone(),
        })?;
        self.select_date(date)
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.url.clone())
    }

    async fn pause(&mut self, duration: Duration) -> ProbeResult<()> {
        self.history.push(format!("pause:{}ms", duration.as_millis()));
        Ok(())
    }
}
