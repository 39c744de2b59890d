use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

/// Name given to jobs the API returns without one.
pub const UNNAMED_JOB: &str = "unnamed-job";

/// Workflow run record as returned by `GET .../workflows/{id}/runs`.
///
/// Every field is optional; validation happens in [`WorkflowRun::from_raw`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWorkflowRun {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One page of the workflow runs listing.
#[derive(Debug, Deserialize)]
pub struct RawRunsPage {
    pub workflow_runs: Option<Vec<RawWorkflowRun>>,
}

/// Job record as returned by `GET .../runs/{run_id}/jobs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJob {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One page of the jobs listing for a run.
#[derive(Debug, Deserialize)]
pub struct RawJobsPage {
    #[serde(default)]
    pub total_count: Option<u64>,
    pub jobs: Option<Vec<RawJob>>,
}

#[derive(Debug, Deserialize)]
pub struct RawWorkflow {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawWorkflowsPage {
    #[serde(default)]
    pub workflows: Vec<RawWorkflow>,
}

/// GitHub Actions workflow run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowRun {
    /// Unique identifier for the workflow run
    pub id: u64,
    /// Status of the run (queued, in_progress, completed)
    pub status: Option<String>,
    /// Conclusion of the run (success, failure, etc.)
    pub conclusion: Option<String>,
    /// When the run was created
    pub created_at: DateTime<Utc>,
}

impl WorkflowRun {
    /// Normalizes a raw API record.
    ///
    /// Returns `None` when the id or creation timestamp is missing, or when the
    /// timestamp cannot be parsed (logged as a warning).
    pub fn from_raw(raw: RawWorkflowRun) -> Option<Self> {
        let (Some(id), Some(created_at)) = (raw.id, raw.created_at) else {
            return None;
        };

        let created_at = match DateTime::parse_from_rfc3339(&created_at) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                warn!("Skipping run {id}: malformed created_at '{created_at}' ({e})");
                return None;
            }
        };

        Some(Self {
            id,
            status: raw.status,
            conclusion: raw.conclusion,
            created_at,
        })
    }
}

/// Job within a GitHub Actions workflow run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    /// Unique identifier for the job
    pub id: u64,
    /// Name of the job
    pub name: String,
    /// Run the job belongs to
    pub run_id: u64,
}

impl Job {
    /// Normalizes a raw API record; jobs without an id are dropped.
    pub fn from_raw(raw: RawJob, run_id: u64) -> Option<Self> {
        let id = raw.id?;
        let name = raw
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNNAMED_JOB.to_string());

        Some(Self { id, name, run_id })
    }
}
