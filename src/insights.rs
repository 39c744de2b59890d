use std::path::PathBuf;

use serde::Serialize;

use crate::providers::github::{DateRange, DispatchReport, JobEnumeration};

/// Failure counts extracted from one job log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureMetrics {
    pub job_name: String,
    pub total_runs: usize,
    pub logged_attempt_total: usize,
    pub logged_attempt_count: usize,
    /// Capped at 3
    pub failures: usize,
    pub test_failure_count: usize,
    pub attempt_failure_count: usize,
    pub final_attempt_failure_count: usize,
    /// Percentage with two decimals
    pub failure_rate: f64,
}

impl FailureMetrics {
    pub fn zero(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            total_runs: 0,
            logged_attempt_total: 0,
            logged_attempt_count: 0,
            failures: 0,
            test_failure_count: 0,
            attempt_failure_count: 0,
            final_attempt_failure_count: 0,
            failure_rate: 0.0,
        }
    }
}

/// Metrics for every job log in one run directory.
#[derive(Debug, Clone, Serialize)]
pub struct LogDirectoryReport {
    pub directory: PathBuf,
    pub jobs: Vec<FailureMetrics>,
}

/// Failures of one job name summed over all analyzed logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobFailureSummary {
    pub job_name: String,
    pub failures: usize,
    pub test_failure_count: usize,
    pub attempt_failure_count: usize,
    pub final_attempt_failure_count: usize,
}

/// Outcome of a `download` invocation.
#[derive(Debug, Serialize)]
pub struct HarvestSummary {
    pub repository: String,
    pub workflow_id: String,
    pub window: DateRange,
    pub runs_considered: usize,
    pub enumeration: JobEnumeration,
    pub dispatch: DispatchReport,
}

impl HarvestSummary {
    pub fn jobs_attempted(&self) -> usize {
        self.dispatch.submitted
    }

    pub fn logs_saved(&self) -> usize {
        self.dispatch.succeeded
    }
}
