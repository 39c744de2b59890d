use bytes::Bytes;
use log::{debug, info, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{HarvestError, Result};

use super::types::{RawJobsPage, RawRunsPage, RawWorkflowRun, RawWorkflowsPage};

const API_VERSION: &str = "2022-11-28";
const WORKFLOWS_PAGE_SIZE: usize = 100;

/// GitHub REST client scoped to a single repository.
///
/// Exposes the three capabilities the harvester depends on (runs page, jobs
/// page, job log) plus the workflow listing used for name lookup. Cloning is
/// cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: Url,
    owner: String,
    repo: String,
    token: Option<Token>,
}

impl GitHubClient {
    /// Create a new GitHub API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitHub API base URL (e.g., "https://api.github.com")
    /// * `owner` - Repository owner/organization
    /// * `repo` - Repository name
    /// * `token` - Optional GitHub personal access token
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, owner: &str, repo: &str, token: Option<Token>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(API_VERSION),
        );

        let client = Client::builder()
            .user_agent(concat!("ci-log-processor/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| HarvestError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Url::join drops the last path segment unless it ends with a slash
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let api_url = Url::parse(&base)
            .map_err(|e| HarvestError::Config(format!("Invalid base URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            owner: owner.to_string(),
            repo: repo.to_string(),
            token,
        })
    }

    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    fn repo_url(&self, path: &str) -> Result<Url> {
        self.api_url
            .join(&format!("repos/{}/{}/{path}", self.owner, self.repo))
            .map_err(|e| HarvestError::Config(format!("Invalid repository URL: {e}")))
    }

    async fn get(&self, url: Url, query: &[(&str, String)]) -> Result<Response> {
        debug!("GET {url} {query:?}");
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = self.auth_request(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(HarvestError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T> {
        let body = self.get(url, query).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetch one page of workflow runs.
    ///
    /// `created` is passed through verbatim as GitHub's `created` search
    /// qualifier (`>=2026-10-01` or `2026-10-01..2026-10-07`). An empty vector
    /// means the listing is exhausted.
    ///
    /// # Errors
    ///
    /// Transport and HTTP errors, and a response without a `workflow_runs`
    /// collection.
    pub async fn fetch_runs_page(
        &self,
        workflow_id: &str,
        created: &str,
        per_page: usize,
        page: u32,
    ) -> Result<Vec<RawWorkflowRun>> {
        let url = self.repo_url(&format!("actions/workflows/{workflow_id}/runs"))?;
        let query = [
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            ("created", created.to_string()),
        ];

        let response: RawRunsPage = self.get_json(url, &query).await?;

        response
            .workflow_runs
            .ok_or_else(|| HarvestError::MalformedResponse {
                endpoint: format!("workflows/{workflow_id}/runs?page={page}"),
                reason: "'workflow_runs' key not found".to_string(),
            })
    }

    /// Fetch one page of jobs for a workflow run.
    pub async fn fetch_jobs_page(&self, run_id: u64, per_page: usize, page: u32) -> Result<RawJobsPage> {
        let url = self.repo_url(&format!("actions/runs/{run_id}/jobs"))?;
        let query = [("per_page", per_page.to_string()), ("page", page.to_string())];

        self.get_json(url, &query).await
    }

    /// Download the raw log text of a job.
    ///
    /// GitHub answers with a redirect to short-lived blob storage; reqwest
    /// follows it and drops the authorization header on the cross-host hop.
    pub async fn fetch_job_log(&self, job_id: u64) -> Result<Bytes> {
        let url = self.repo_url(&format!("actions/jobs/{job_id}/logs"))?;
        let bytes = self.get(url, &[]).await?.bytes().await?;
        Ok(bytes)
    }

    /// Resolve a workflow given by name, numeric id, or file name to the
    /// identifier used in run listings.
    ///
    /// Numeric ids and `.yml`/`.yaml` file names are accepted by the API as-is;
    /// anything else is matched against the display names of the repository's
    /// workflows, page by page until a short or empty page. Unnamed entries
    /// never match.
    pub async fn resolve_workflow_id(&self, workflow: &str) -> Result<String> {
        if workflow.parse::<u64>().is_ok()
            || workflow.ends_with(".yml")
            || workflow.ends_with(".yaml")
        {
            return Ok(workflow.to_string());
        }

        let mut page = 1u32;
        loop {
            let url = self.repo_url("actions/workflows")?;
            let query = [
                ("per_page", WORKFLOWS_PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ];
            let listing: RawWorkflowsPage = self.get_json(url, &query).await?;
            let page_len = listing.workflows.len();

            if let Some(found) = listing
                .workflows
                .into_iter()
                .find(|w| w.name.as_deref() == Some(workflow))
            {
                info!(
                    "Found workflow '{workflow}' with ID: {} ({})",
                    found.id,
                    found.path.as_deref().unwrap_or("unknown path")
                );
                return Ok(found.id.to_string());
            }

            if page_len < WORKFLOWS_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        warn!("No workflow found with name: {workflow}");
        Err(HarvestError::WorkflowNotFound(workflow.to_string()))
    }
}
