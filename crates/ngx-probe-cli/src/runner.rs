//! Command handlers
//!
//! Handlers write their report to any [`Write`] so tests can capture it.

use crate::commands::{ConfigArgs, OffsetArgs, ResolveArgs, SelectArgs};
use crate::error::{CliError, CliResult};
use console::style;
use ngx_probe::{
    CalendarDateResolver, ExpectedLabel, FixedClock, HarnessConfig, PageDriver, PageManager,
    SharedClock, ShowcaseSim, SystemClock, TargetDate,
};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Label and step count of a completed selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Value the picker input shows
    pub label: ExpectedLabel,
    /// Forward activations across both halves of a range
    pub steps: u32,
}

/// Clock pinned to `today` when given, the local clock otherwise
pub fn clock_for(today: Option<&str>) -> CliResult<SharedClock> {
    match today {
        Some(iso) => Ok(Arc::new(FixedClock::from_iso(iso)?)),
        None => Ok(Arc::new(SystemClock)),
    }
}

/// Harness config from a YAML file, or from the environment
pub fn load_harness(file: Option<&Path>) -> CliResult<HarnessConfig> {
    match file {
        Some(path) => Ok(HarnessConfig::from_file(path)?),
        None => Ok(HarnessConfig::from_env()),
    }
}

/// `ngx-probe resolve`
pub fn run_resolve(args: &ResolveArgs, out: &mut dyn Write) -> CliResult<()> {
    let offsets = &args.offsets;
    let today = clock_for(offsets.today.as_deref())?.today();
    let start = TargetDate::from_offset(today, offsets.offset)?;

    writeln!(out, "today:  {today}")?;
    match offsets.end {
        None => {
            writeln!(out, "target: {}", start.date())?;
            writeln!(out, "header: {}", start.month_year())?;
            writeln!(out, "label:  {}", style(start.label()).bold())?;
        }
        Some(end_offset) => {
            let end = TargetDate::from_offset(today, end_offset)?;
            let label = ExpectedLabel::range(&start.label(), &end.label());
            writeln!(out, "start:  {} ({})", start.date(), start.month_year())?;
            writeln!(out, "end:    {} ({})", end.date(), end.month_year())?;
            writeln!(out, "label:  {}", style(label).bold())?;
        }
    }
    Ok(())
}

/// `ngx-probe select`
pub fn run_select(args: &SelectArgs, out: &mut dyn Write) -> CliResult<()> {
    if args.browser && args.offsets.today.is_some() {
        return Err(CliError::invalid_argument(
            "--today cannot be combined with --browser; the page reads the real clock",
        ));
    }

    let mut harness = load_harness(args.config.as_deref())?;
    if let Some(ref base_url) = args.base_url {
        harness = harness.with_base_url(base_url.clone());
    }
    if let Some(steps) = args.max_steps {
        harness = harness.with_max_forward_steps(steps);
    }
    harness.validate()?;

    let clock = clock_for(args.offsets.today.as_deref())?;
    let resolver = CalendarDateResolver::new(Arc::clone(&clock))
        .with_budget(harness.navigation_budget());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let (driver_name, selection) = if args.browser {
        ("chromium", runtime.block_on(select_in_browser(harness, resolver, &args.offsets))?)
    } else {
        let sim = ShowcaseSim::new(clock).with_base_url(harness.base_url.clone());
        let mut pm = PageManager::new(sim, harness, resolver);
        ("sim", runtime.block_on(select_flow(&mut pm, &args.offsets))?)
    };

    info!(driver = driver_name, label = %selection.label, steps = selection.steps, "selection complete");
    writeln!(out, "driver: {driver_name}")?;
    writeln!(out, "label:  {}", style(&selection.label).green().bold())?;
    writeln!(out, "steps:  {}", selection.steps)?;
    Ok(())
}

/// `ngx-probe config`
pub fn run_config(args: &ConfigArgs, out: &mut dyn Write) -> CliResult<()> {
    let harness = load_harness(args.file.as_deref())?;
    write!(out, "{}", harness.to_yaml()?)?;
    Ok(())
}

/// Open the Datepicker page and select the offsets
pub async fn select_flow<D: PageDriver>(
    pm: &mut PageManager<D>,
    offsets: &OffsetArgs,
) -> CliResult<Selection> {
    pm.open_home().await?;
    pm.navigate_to().datepicker_page().await?;

    let selection = match offsets.end {
        None => {
            let outcome = pm
                .on_datepicker_page()
                .select_common_datepicker_date_from_today(offsets.offset)
                .await?;
            Selection {
                label: outcome.label,
                steps: outcome.steps,
            }
        }
        Some(end) => {
            let outcome = pm
                .on_datepicker_page()
                .select_datepicker_with_range_from_today(offsets.offset, end)
                .await?;
            Selection {
                label: outcome.label,
                steps: outcome.start.steps + outcome.end.steps,
            }
        }
    };
    Ok(selection)
}

#[cfg(feature = "browser")]
async fn select_in_browser(
    harness: HarnessConfig,
    resolver: CalendarDateResolver,
    offsets: &OffsetArgs,
) -> CliResult<Selection> {
    let driver =
        ngx_probe::ChromiumDriver::launch(harness.driver_config(), harness.base_url.clone())
            .await?;
    let mut pm = PageManager::new(driver, harness, resolver);
    let result = select_flow(&mut pm, offsets).await;
    pm.into_driver().close().await?;
    result
}

#[cfg(not(feature = "browser"))]
async fn select_in_browser(
    _harness: HarnessConfig,
    _resolver: CalendarDateResolver,
    _offsets: &OffsetArgs,
) -> CliResult<Selection> {
    Err(CliError::FeatureDisabled { feature: "browser" })
}
