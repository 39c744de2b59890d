use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{HarvestError, Result};

use super::client::GitHubClient;
use super::logs::fetch_job_log;
use super::types::Job;

/// Bounds applied to one dispatch.
#[derive(Debug, Clone, Copy)]
pub struct DispatchLimits {
    /// Hard ceiling on downloads per invocation; the rest is discarded.
    pub max_jobs: usize,
    /// Number of downloads in flight at once.
    pub concurrency: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct DispatchReport {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub discarded: usize,
    pub saved: Vec<PathBuf>,
}

/// Downloads the logs of `jobs` with at most `limits.concurrency` requests in
/// flight.
///
/// Jobs beyond `limits.max_jobs` are dropped before anything is sent. Results
/// are gathered in completion order; a failed or panicked download is logged
/// and counted, never propagated.
///
/// # Errors
///
/// Only for a zero-width pool.
pub async fn dispatch_log_downloads(
    client: &GitHubClient,
    mut jobs: Vec<Job>,
    output_root: &Path,
    limits: DispatchLimits,
) -> Result<DispatchReport> {
    if limits.concurrency == 0 {
        return Err(HarvestError::Config(
            "Download concurrency must be at least 1".to_string(),
        ));
    }

    let mut report = DispatchReport::default();

    if jobs.len() > limits.max_jobs {
        report.discarded = jobs.len() - limits.max_jobs;
        warn!(
            "{} jobs exceed the dispatch limit of {}; discarding {} jobs",
            jobs.len(),
            limits.max_jobs,
            report.discarded
        );
        jobs.truncate(limits.max_jobs);
    }

    report.submitted = jobs.len();
    info!(
        "Processing {} jobs with {} concurrent downloads...",
        report.submitted, limits.concurrency
    );

    let sem = Arc::new(Semaphore::new(limits.concurrency));
    let mut set = JoinSet::new();

    for job in jobs {
        let sem = sem.clone();
        let client = client.clone();
        let output_root = output_root.to_path_buf();
        set.spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return (job.id, None);
            };
            let path = fetch_job_log(&client, &job, &output_root).await;
            (job.id, path)
        });
    }

    while let Some(join_result) = set.join_next().await {
        match join_result {
            Ok((_, Some(path))) => {
                report.succeeded += 1;
                report.saved.push(path);
            }
            Ok((job_id, None)) => {
                warn!("No log saved for job {job_id}");
                report.failed += 1;
            }
            Err(e) => {
                error!("Job processing failed: {e}");
                report.failed += 1;
            }
        }
    }

    info!(
        "Successfully downloaded {} of {} log files to {}/",
        report.succeeded,
        report.submitted,
        output_root.display()
    );

    Ok(report)
}
