use std::path::{Path, PathBuf};

use log::{error, info};

use crate::error::Result;

use super::client::GitHubClient;
use super::jobs::run_dir;
use super::types::Job;

/// Deterministic location of a job's log:
/// `{output_root}/run-{run_id}/{job_id}-{job_name}.log`.
///
/// Path separators in the job name are replaced with `_`.
pub fn log_path(output_root: &Path, job: &Job) -> PathBuf {
    let name = job.name.replace(['/', '\\'], "_");
    run_dir(output_root, job.run_id).join(format!("{}-{name}.log", job.id))
}

async fn download_log(client: &GitHubClient, job: &Job, output_root: &Path) -> Result<PathBuf> {
    let path = log_path(output_root, job);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let bytes = client.fetch_job_log(job.id).await?;
    tokio::fs::write(&path, &bytes).await?;

    Ok(path)
}

/// Downloads one job's log and returns where it was written.
///
/// Failures are logged with the job id and reported as `None`; they never
/// propagate. Running twice for the same job overwrites the same file.
pub async fn fetch_job_log(client: &GitHubClient, job: &Job, output_root: &Path) -> Option<PathBuf> {
    match download_log(client, job, output_root).await {
        Ok(path) => {
            info!("Log saved to: {}", path.display());
            Some(path)
        }
        Err(e) => {
            error!(
                "Error downloading log for job {} (run {}): {e}",
                job.id, job.run_id
            );
            None
        }
    }
}
