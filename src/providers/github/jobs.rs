use std::path::{Path, PathBuf};

use log::{error, info, warn};
use serde::Serialize;

use crate::error::{HarvestError, Result};

use super::client::GitHubClient;
use super::types::{Job, WorkflowRun};

const JOBS_PAGE_SIZE: usize = 100;

/// Directory that holds the logs of one run.
pub fn run_dir(output_root: &Path, run_id: u64) -> PathBuf {
    output_root.join(format!("run-{run_id}"))
}

/// Outcome of enumerating jobs across a batch of runs.
#[derive(Debug, Default, Serialize)]
pub struct JobEnumeration {
    pub jobs: Vec<Job>,
    /// Runs whose listing was attempted, in discovery order.
    pub processed_runs: Vec<u64>,
    /// Runs never attempted because the job cap was exceeded.
    pub skipped_runs: Vec<u64>,
    /// Subset of `processed_runs` whose listing failed.
    pub failed_runs: Vec<u64>,
}

/// Lists every job of `run_id`.
///
/// Creates the run's output directory first. Jobs without an id are dropped;
/// the listing is paged until the reported `total_count` is reached.
///
/// # Errors
///
/// Transport errors, HTTP errors, a response without a `jobs` collection, and
/// failure to create the run directory.
pub async fn list_run_jobs(client: &GitHubClient, run_id: u64, output_root: &Path) -> Result<Vec<Job>> {
    tokio::fs::create_dir_all(run_dir(output_root, run_id)).await?;

    info!("Fetching jobs for run ID: {run_id}...");

    let mut jobs = Vec::new();
    let mut seen = 0usize;
    let mut page = 1;

    loop {
        let response = client.fetch_jobs_page(run_id, JOBS_PAGE_SIZE, page).await?;
        let raw_jobs = response.jobs.ok_or_else(|| HarvestError::MalformedResponse {
            endpoint: format!("runs/{run_id}/jobs"),
            reason: "'jobs' key not found".to_string(),
        })?;

        if raw_jobs.is_empty() {
            break;
        }

        let page_len = raw_jobs.len();
        seen += page_len;
        let before = jobs.len();
        jobs.extend(raw_jobs.into_iter().filter_map(|raw| Job::from_raw(raw, run_id)));

        let dropped = page_len - (jobs.len() - before);
        if dropped > 0 {
            warn!("Run {run_id}: skipped {dropped} job records without an id");
        }

        let total = response
            .total_count
            .and_then(|t| usize::try_from(t).ok())
            .unwrap_or(seen);
        if seen >= total {
            break;
        }

        page += 1;
    }

    Ok(jobs)
}

/// Enumerates jobs run by run until more than `max_jobs` have accumulated.
///
/// A run whose listing fails is logged, recorded in `failed_runs`, and does not
/// stop the remaining runs. Once the running total exceeds `max_jobs` the
/// remaining runs are reported in `skipped_runs` without being requested.
pub async fn enumerate_jobs(
    client: &GitHubClient,
    runs: &[WorkflowRun],
    output_root: &Path,
    max_jobs: usize,
) -> JobEnumeration {
    let mut result = JobEnumeration::default();

    for (index, run) in runs.iter().enumerate() {
        match list_run_jobs(client, run.id, output_root).await {
            Ok(jobs) => {
                info!("Run {}: {} jobs", run.id, jobs.len());
                result.jobs.extend(jobs);
            }
            Err(e) => {
                error!("Error fetching jobs for run {}: {e}", run.id);
                result.failed_runs.push(run.id);
            }
        }
        result.processed_runs.push(run.id);

        if result.jobs.len() > max_jobs {
            result.skipped_runs = runs[index + 1..].iter().map(|r| r.id).collect();
            warn!(
                "Job count {} exceeds the safety limit of {max_jobs}; stopping after {} of {} runs, skipped runs: {:?}",
                result.jobs.len(),
                result.processed_runs.len(),
                runs.len(),
                result.skipped_runs
            );
            break;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Token;
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;
    use tempfile::TempDir;

    fn client_for(server: &mockito::ServerGuard) -> GitHubClient {
        GitHubClient::new(&server.url(), "acme", "widgets", Some(Token::from("t0ken"))).unwrap()
    }

    fn run(id: u64) -> WorkflowRun {
        WorkflowRun {
            id,
            status: Some("completed".to_string()),
            conclusion: Some("failure".to_string()),
            created_at: Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap(),
        }
    }

    fn jobs_body(ids: std::ops::Range<u64>) -> String {
        let items: Vec<String> = ids
            .clone()
            .map(|id| format!(r#"{{"id": {id}, "name": "e2e-{id}"}}"#))
            .collect();
        format!(
            r#"{{"total_count": {}, "jobs": [{}]}}"#,
            ids.count(),
            items.join(",")
        )
    }

    async fn mock_jobs(server: &mut mockito::ServerGuard, run_id: u64, status: usize, body: String) -> mockito::Mock {
        server
            .mock("GET", format!("/repos/acme/widgets/actions/runs/{run_id}/jobs").as_str())
            .match_query(Matcher::Any)
            .with_status(status)
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_list_run_jobs_creates_run_dir_and_skips_malformed() {
        let mut server = mockito::Server::new_async().await;
        mock_jobs(
            &mut server,
            10,
            200,
            r#"{"total_count": 3, "jobs": [
                {"id": 1, "name": "e2e (ubuntu)"},
                {"name": "no id"},
                {"id": 3}
            ]}"#
            .to_string(),
        )
        .await;

        let out = TempDir::new().unwrap();
        let jobs = list_run_jobs(&client_for(&server), 10, out.path()).await.unwrap();

        assert!(out.path().join("run-10").is_dir());
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name, "e2e (ubuntu)");
        assert_eq!(jobs[1].name, "unnamed-job");
        assert!(jobs.iter().all(|j| j.run_id == 10));
    }

    #[tokio::test]
    async fn test_list_run_jobs_follows_total_count() {
        let mut server = mockito::Server::new_async().await;
        let first: Vec<String> = (0..100).map(|id| format!(r#"{{"id": {id}}}"#)).collect();
        let page1 = server
            .mock("GET", "/repos/acme/widgets/actions/runs/10/jobs")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_body(format!(r#"{{"total_count": 101, "jobs": [{}]}}"#, first.join(",")))
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/repos/acme/widgets/actions/runs/10/jobs")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_body(r#"{"total_count": 101, "jobs": [{"id": 100}]}"#)
            .create_async()
            .await;

        let out = TempDir::new().unwrap();
        let jobs = list_run_jobs(&client_for(&server), 10, out.path()).await.unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
        assert_eq!(jobs.len(), 101);
    }

    #[tokio::test]
    async fn test_missing_jobs_key_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        mock_jobs(&mut server, 10, 200, r#"{"total_count": 0}"#.to_string()).await;

        let out = TempDir::new().unwrap();
        let result = list_run_jobs(&client_for(&server), 10, out.path()).await;
        assert!(matches!(result, Err(HarvestError::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_failing_run_does_not_stop_siblings() {
        let mut server = mockito::Server::new_async().await;
        mock_jobs(&mut server, 1, 200, jobs_body(100..102)).await;
        mock_jobs(&mut server, 2, 502, "Bad Gateway".to_string()).await;
        mock_jobs(&mut server, 3, 200, jobs_body(300..303)).await;

        let out = TempDir::new().unwrap();
        let runs = vec![run(1), run(2), run(3)];
        let result = enumerate_jobs(&client_for(&server), &runs, out.path(), 900).await;

        assert_eq!(result.jobs.len(), 5);
        assert_eq!(result.processed_runs, vec![1, 2, 3]);
        assert_eq!(result.failed_runs, vec![2]);
        assert!(result.skipped_runs.is_empty());
    }

    #[tokio::test]
    async fn test_job_cap_halts_enumeration() {
        let mut server = mockito::Server::new_async().await;
        mock_jobs(&mut server, 1, 200, jobs_body(0..4)).await;
        mock_jobs(&mut server, 2, 200, jobs_body(10..14)).await;
        let untouched = server
            .mock("GET", "/repos/acme/widgets/actions/runs/3/jobs")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let out = TempDir::new().unwrap();
        let runs = vec![run(1), run(2), run(3), run(4)];
        let result = enumerate_jobs(&client_for(&server), &runs, out.path(), 5).await;

        untouched.assert_async().await;
        assert_eq!(result.jobs.len(), 8);
        assert_eq!(result.processed_runs, vec![1, 2]);
        assert_eq!(result.skipped_runs, vec![3, 4]);

        let mut all: Vec<u64> = result.processed_runs.clone();
        all.extend(&result.skipped_runs);
        assert_eq!(all, runs.iter().map(|r| r.id).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_cap_equal_to_total_does_not_skip() {
        let mut server = mockito::Server::new_async().await;
        mock_jobs(&mut server, 1, 200, jobs_body(0..3)).await;
        mock_jobs(&mut server, 2, 200, jobs_body(3..5)).await;

        let out = TempDir::new().unwrap();
        let result = enumerate_jobs(&client_for(&server), &[run(1), run(2)], out.path(), 5).await;

        assert_eq!(result.jobs.len(), 5);
        assert!(result.skipped_runs.is_empty());
    }
}
