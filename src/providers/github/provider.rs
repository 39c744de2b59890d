use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use log::{info, warn};

use crate::auth::Token;
use crate::error::{HarvestError, Result};
use crate::insights::HarvestSummary;
use crate::output::PhaseProgress;

use super::client::GitHubClient;
use super::discovery::{discover_runs, DiscoveryOptions, TimeWindow};
use super::dispatch::{dispatch_log_downloads, DispatchLimits, DispatchReport};
use super::jobs::{enumerate_jobs, JobEnumeration};

/// Parameters of one harvest.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub workflow: String,
    pub window: TimeWindow,
    pub output_dir: PathBuf,
    pub discovery: DiscoveryOptions,
    /// Enumeration stops once more jobs than this have been listed.
    pub max_jobs: usize,
    pub dispatch: DispatchLimits,
}

/// Provider for harvesting job logs from GitHub Actions.
pub struct GitHubProvider {
    /// GitHub API client
    client: GitHubClient,
    /// Repository owner
    owner: String,
    /// Repository name
    repo: String,
}

impl GitHubProvider {
    /// Create a new GitHub Actions provider.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitHub API base URL
    /// * `repo_path` - Repository path in format "owner/repo"
    /// * `token` - Optional GitHub personal access token
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a malformed repository path or base URL.
    pub fn new(base_url: &str, repo_path: &str, token: Option<Token>) -> Result<Self> {
        let parts: Vec<&str> = repo_path.split('/').collect();
        let [owner, repo] = parts.as_slice() else {
            return Err(HarvestError::Config(format!(
                "Repository must be in format 'owner/repo', got '{repo_path}'"
            )));
        };
        if owner.is_empty() || repo.is_empty() {
            return Err(HarvestError::Config(format!(
                "Repository must be in format 'owner/repo', got '{repo_path}'"
            )));
        }

        let client = GitHubClient::new(base_url, owner, repo, token)?;

        Ok(Self {
            client,
            owner: (*owner).to_string(),
            repo: (*repo).to_string(),
        })
    }

    /// Harvest job logs for the configured workflow.
    ///
    /// Progress is displayed in three phases:
    /// 1. Discovering runs inside the time window
    /// 2. Enumerating jobs (bounded by `max_jobs`)
    /// 3. Downloading logs (bounded by the dispatch limits)
    ///
    /// An empty window ends the harvest early with an all-zero summary.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The workflow cannot be resolved
    /// - Any page of the run listing fails
    /// - The options are invalid (empty pages, zero concurrency, inverted range)
    ///
    /// Failures of individual runs or jobs are logged and reflected in the
    /// summary instead.
    pub async fn harvest(&self, options: &HarvestOptions) -> Result<HarvestSummary> {
        self.harvest_on(options, Utc::now().date_naive()).await
    }

    async fn harvest_on(&self, options: &HarvestOptions, today: NaiveDate) -> Result<HarvestSummary> {
        info!(
            "Starting log harvest for GitHub repository: {}/{}",
            self.owner, self.repo
        );

        let range = options.window.resolve(today)?;
        tokio::fs::create_dir_all(&options.output_dir).await?;

        let workflow_id = self.client.resolve_workflow_id(&options.workflow).await?;

        // Phase 1: Discovering runs
        let progress = PhaseProgress::start_phase_1();
        let runs = discover_runs(&self.client, &workflow_id, &range, options.discovery).await?;

        let mut summary = HarvestSummary {
            repository: self.client.repository(),
            workflow_id,
            window: range,
            runs_considered: runs.len(),
            enumeration: JobEnumeration::default(),
            dispatch: DispatchReport::default(),
        };

        if runs.is_empty() {
            progress.abandon("No runs found in the requested window");
            warn!(
                "No runs of workflow {} found between {}",
                summary.workflow_id, summary.window
            );
            return Ok(summary);
        }

        // Phase 2: Enumerating jobs
        let progress = progress.finish_phase_1_start_phase_2(runs.len());
        summary.enumeration =
            enumerate_jobs(&self.client, &runs, &options.output_dir, options.max_jobs).await;

        // Phase 3: Downloading logs
        let progress = progress.finish_phase_2_start_phase_3(summary.enumeration.jobs.len());
        summary.dispatch = dispatch_log_downloads(
            &self.client,
            summary.enumeration.jobs.clone(),
            &options.output_dir,
            options.dispatch,
        )
        .await?;

        progress.finish_phase_3(summary.dispatch.succeeded);

        info!(
            "Runs considered: {}, jobs attempted: {}, logs saved: {}",
            summary.runs_considered,
            summary.jobs_attempted(),
            summary.logs_saved()
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn options(output_dir: PathBuf) -> HarvestOptions {
        HarvestOptions {
            workflow: "E2E".to_string(),
            window: TimeWindow::LookbackDays(7),
            output_dir,
            discovery: DiscoveryOptions {
                page_size: 100,
                max_pages: 5,
            },
            max_jobs: 900,
            dispatch: DispatchLimits {
                max_jobs: 900,
                concurrency: 4,
            },
        }
    }

    async fn mock_workflows(server: &mut mockito::ServerGuard) {
        server
            .mock("GET", "/repos/acme/widgets/actions/workflows")
            .match_query(Matcher::Any)
            .with_body(r#"{"workflows": [{"id": 42, "name": "E2E", "path": ".github/workflows/e2e.yml"}]}"#)
            .create_async()
            .await;
    }

    async fn mock_runs_page(server: &mut mockito::ServerGuard, page: &str, body: &str) {
        server
            .mock("GET", "/repos/acme/widgets/actions/workflows/42/runs")
            .match_query(Matcher::UrlEncoded("page".into(), page.into()))
            .with_body(body)
            .create_async()
            .await;
    }

    #[test]
    fn test_github_provider_creation() {
        let provider = GitHubProvider::new(
            "https://api.github.com",
            "owner/repo",
            Some(Token::from("test-token")),
        )
        .unwrap();

        assert_eq!(provider.owner, "owner");
        assert_eq!(provider.repo, "repo");
        assert_eq!(provider.client.repository(), "owner/repo");
    }

    #[test]
    fn test_github_provider_invalid_repo_path() {
        for path in ["invalid-path", "owner/repo/extra", "/repo", "owner/"] {
            let result = GitHubProvider::new("https://api.github.com", path, None);
            assert!(result.is_err(), "{path} should be rejected");
        }

        let err = GitHubProvider::new("https://api.github.com", "invalid-path", None)
            .err()
            .unwrap();
        assert!(err.to_string().contains("owner/repo"));
    }

    #[tokio::test]
    async fn test_harvest_skips_failing_run_and_saves_the_rest() {
        let mut server = mockito::Server::new_async().await;
        mock_workflows(&mut server).await;
        mock_runs_page(
            &mut server,
            "1",
            r#"{"workflow_runs": [
                {"id": 1, "status": "completed", "conclusion": "failure", "created_at": "2026-10-17T08:00:00Z"},
                {"id": 2, "status": "completed", "conclusion": "success", "created_at": "2026-10-16T08:00:00Z"}
            ]}"#,
        )
        .await;
        mock_runs_page(&mut server, "2", r#"{"workflow_runs": []}"#).await;
        server
            .mock("GET", "/repos/acme/widgets/actions/runs/1/jobs")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/acme/widgets/actions/runs/2/jobs")
            .match_query(Matcher::Any)
            .with_body(r#"{"total_count": 2, "jobs": [{"id": 20, "name": "e2e (ubuntu)"}, {"id": 21, "name": "e2e (macos)"}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", Matcher::Regex(r"^/repos/acme/widgets/actions/jobs/2[01]/logs$".to_string()))
            .with_body("Run nick-fields/retry\nAttempt 1\n")
            .expect(2)
            .create_async()
            .await;

        let out = TempDir::new().unwrap();
        let provider = GitHubProvider::new(&server.url(), "acme/widgets", None).unwrap();
        let summary = provider
            .harvest_on(&options(out.path().to_path_buf()), today())
            .await
            .unwrap();

        assert_eq!(summary.workflow_id, "42");
        assert_eq!(summary.runs_considered, 2);
        assert_eq!(summary.enumeration.failed_runs, vec![1]);
        assert_eq!(summary.jobs_attempted(), 2);
        assert_eq!(summary.logs_saved(), 2);
        assert!(out.path().join("run-2/20-e2e (ubuntu).log").is_file());
        assert!(out.path().join("run-2/21-e2e (macos).log").is_file());
        assert!(out.path().join("run-1").is_dir());
    }

    #[tokio::test]
    async fn test_harvest_with_no_runs_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        mock_workflows(&mut server).await;
        mock_runs_page(&mut server, "1", r#"{"workflow_runs": []}"#).await;

        let out = TempDir::new().unwrap();
        let provider = GitHubProvider::new(&server.url(), "acme/widgets", None).unwrap();
        let summary = provider
            .harvest_on(&options(out.path().to_path_buf()), today())
            .await
            .unwrap();

        assert_eq!(summary.runs_considered, 0);
        assert_eq!(summary.logs_saved(), 0);
        assert!(summary.enumeration.processed_runs.is_empty());
    }

    #[tokio::test]
    async fn test_harvest_fails_when_discovery_fails() {
        let mut server = mockito::Server::new_async().await;
        mock_workflows(&mut server).await;
        server
            .mock("GET", "/repos/acme/widgets/actions/workflows/42/runs")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"message": "API rate limit exceeded"}"#)
            .create_async()
            .await;

        let out = TempDir::new().unwrap();
        let provider = GitHubProvider::new(&server.url(), "acme/widgets", None).unwrap();
        let result = provider
            .harvest_on(&options(out.path().to_path_buf()), today())
            .await;

        assert!(matches!(result, Err(HarvestError::Api { status: 403, .. })));
    }
}
