use chrono::{Days, NaiveDate};
use log::{debug, info};
use serde::Serialize;

use crate::error::{HarvestError, Result};

use super::client::GitHubClient;
use super::types::WorkflowRun;

/// Time window a harvest covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// `[today - days, today]`
    LookbackDays(u32),
    /// Inclusive calendar range.
    Range { since: NaiveDate, until: NaiveDate },
}

/// A resolved, inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(skip)]
    open_ended: bool,
}

impl TimeWindow {
    /// Picks the explicit range when both bounds are given, otherwise the
    /// lookback.
    pub fn from_parts(days: u32, since: Option<NaiveDate>, until: Option<NaiveDate>, today: NaiveDate) -> Result<Self> {
        match (since, until) {
            (Some(since), Some(until)) => Ok(Self::Range { since, until }),
            (Some(since), None) => Ok(Self::Range { since, until: today }),
            (None, Some(_)) => Err(HarvestError::Config(
                "--until requires --since".to_string(),
            )),
            (None, None) => Ok(Self::LookbackDays(days)),
        }
    }

    /// Resolves the window against `today`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an inverted range or a lookback that
    /// underflows the calendar.
    pub fn resolve(self, today: NaiveDate) -> Result<DateRange> {
        match self {
            Self::LookbackDays(days) => {
                let start = today
                    .checked_sub_days(Days::new(u64::from(days)))
                    .ok_or_else(|| HarvestError::Config(format!("Lookback of {days} days is out of range")))?;
                Ok(DateRange {
                    start,
                    end: today,
                    open_ended: true,
                })
            }
            Self::Range { since, until } => {
                if since > until {
                    return Err(HarvestError::Config(format!(
                        "Invalid date range: {since} is after {until}"
                    )));
                }
                Ok(DateRange {
                    start: since,
                    end: until,
                    open_ended: false,
                })
            }
        }
    }
}

impl DateRange {
    /// GitHub `created` search qualifier for this range.
    pub fn created_filter(&self) -> String {
        if self.open_ended {
            format!(">={}", self.start.format("%Y-%m-%d"))
        } else {
            format!(
                "{}..{}",
                self.start.format("%Y-%m-%d"),
                self.end.format("%Y-%m-%d")
            )
        }
    }

    pub fn contains(&self, run: &WorkflowRun) -> bool {
        let day = run.created_at.date_naive();
        self.start <= day && day <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Pagination settings for run discovery.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryOptions {
    pub page_size: usize,
    /// Maximum number of listing requests, whether or not more data exists.
    pub max_pages: u32,
}

/// Collects every run of `workflow_id` created inside `range`.
///
/// Pages are requested one after another starting at page 1; discovery stops at
/// the first page holding no records or after `max_pages` requests. Provider
/// order is preserved. Records failing normalization or falling outside the
/// range are dropped.
///
/// # Errors
///
/// Any failed page aborts discovery; no partial list is returned.
pub async fn discover_runs(
    client: &GitHubClient,
    workflow_id: &str,
    range: &DateRange,
    options: DiscoveryOptions,
) -> Result<Vec<WorkflowRun>> {
    if options.page_size == 0 {
        return Err(HarvestError::Config("Page size must be at least 1".to_string()));
    }

    let created = range.created_filter();
    let mut runs = Vec::new();
    let mut page = 1;

    while page <= options.max_pages {
        let raw_runs = client
            .fetch_runs_page(workflow_id, &created, options.page_size, page)
            .await?;

        if raw_runs.is_empty() {
            debug!("Page {page} is empty, stopping discovery");
            break;
        }

        let fetched = raw_runs.len();
        let before = runs.len();
        runs.extend(
            raw_runs
                .into_iter()
                .filter_map(WorkflowRun::from_raw)
                .filter(|run| range.contains(run)),
        );

        info!(
            "Page {page}: {fetched} runs returned, {} inside {range}",
            runs.len() - before
        );

        page += 1;
    }

    if page > options.max_pages {
        debug!("Reached page-depth cap of {}", options.max_pages);
    }

    info!(
        "There are {} runs of workflow {workflow_id} created {range} (filter: {created})",
        runs.len()
    );

    Ok(runs)
}
