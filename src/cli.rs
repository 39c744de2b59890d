use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use crate::analysis::{aggregate_failures, process_directories};
use crate::auth::Token;
use crate::config::Config;
use crate::output;
use crate::providers::github::{DiscoveryOptions, DispatchLimits, HarvestOptions, TimeWindow};
use crate::providers::GitHubProvider;

#[derive(Parser)]
#[command(name = "ci-log-processor")]
#[command(author, version, about = "CI job log harvester and failure analyzer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./ci-log-processor.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download job logs for a workflow's recent runs
    Download(DownloadArgs),
    /// Extract failure metrics from downloaded run directories
    Analyze(AnalyzeArgs),
}

#[derive(Args)]
struct DownloadArgs {
    /// Repository in owner/repo format
    #[arg(short, long)]
    repo: Option<String>,

    /// Workflow name, numeric id, or file name
    #[arg(short, long)]
    workflow: Option<String>,

    /// Days to look back
    #[arg(short, long)]
    days: Option<u32>,

    /// Start of an explicit date range (YYYY-MM-DD), overrides --days
    #[arg(long)]
    since: Option<NaiveDate>,

    /// End of an explicit date range (YYYY-MM-DD), defaults to today
    #[arg(long, requires = "since")]
    until: Option<NaiveDate>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Workflow runs per page
    #[arg(long)]
    page_size: Option<usize>,

    /// Maximum number of run pages to request
    #[arg(long, conflicts_with = "single_page")]
    max_pages: Option<u32>,

    /// Only request the first page of runs
    #[arg(long, default_value_t = false)]
    single_page: bool,

    /// Stop enumerating jobs once more than this many are found
    #[arg(long)]
    max_jobs: Option<usize>,

    /// Hard ceiling on log downloads per invocation
    #[arg(long)]
    dispatch_limit: Option<usize>,

    /// Concurrent log downloads
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// GitHub API base URL
    #[arg(short, long)]
    url: Option<String>,

    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Print the harvest summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Run directories containing `{job_id}-{job_name}.log` files
    #[arg(required = true)]
    dirs: Vec<PathBuf>,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a failures-by-job table
    #[arg(short, long, default_value_t = false)]
    summary: bool,
}

impl DownloadArgs {
    fn harvest_options(&self, config: &Config, today: NaiveDate) -> Result<HarvestOptions> {
        let harvest = &config.harvest;

        let workflow = self
            .workflow
            .clone()
            .or_else(|| config.github.workflow.clone())
            .context("A workflow is required (--workflow or [github] workflow)")?;

        let window = TimeWindow::from_parts(
            self.days.unwrap_or(harvest.days),
            self.since,
            self.until,
            today,
        )?;

        let max_pages = if self.single_page {
            1
        } else {
            self.max_pages.unwrap_or(harvest.max_pages)
        };

        Ok(HarvestOptions {
            workflow,
            window,
            output_dir: self
                .output
                .clone()
                .unwrap_or_else(|| harvest.output_dir.clone()),
            discovery: DiscoveryOptions {
                page_size: self.page_size.unwrap_or(harvest.page_size),
                max_pages,
            },
            max_jobs: self.max_jobs.unwrap_or(harvest.max_jobs),
            dispatch: DispatchLimits {
                max_jobs: self.dispatch_limit.unwrap_or(harvest.dispatch_limit),
                concurrency: self.concurrency.unwrap_or(harvest.concurrency),
            },
        })
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

impl Cli {
    async fn execute_download(&self, args: &DownloadArgs, config: &Config) -> Result<()> {
        let repo = args
            .repo
            .as_deref()
            .or(config.github.repo.as_deref())
            .context("A repository is required (--repo or [github] repo)")?;
        let base_url = args.url.as_deref().unwrap_or(&config.github.base_url);
        let options = args.harvest_options(config, Utc::now().date_naive())?;

        info!(
            "Harvesting logs of workflow '{}' in {repo} into {}",
            options.workflow,
            options.output_dir.display()
        );

        let token = args.token.as_deref().map(Token::from);
        let provider = GitHubProvider::new(base_url, repo, token)?;
        let summary = provider.harvest(&options).await?;

        if args.json {
            println!("{}", to_json(&summary, config.output.pretty)?);
        } else {
            output::print_harvest_summary(&summary);
        }

        Ok(())
    }

    fn execute_analyze(&self, args: &AnalyzeArgs, config: &Config) -> Result<()> {
        let reports = process_directories(&args.dirs);
        info!(
            "Analyzed {} log files in {} directories",
            reports.iter().map(|r| r.jobs.len()).sum::<usize>(),
            reports.len()
        );

        let json_output = to_json(&reports, config.output.pretty)?;

        if let Some(output_path) = &args.output {
            std::fs::write(output_path, json_output)
                .with_context(|| format!("Failed to write report: {}", output_path.display()))?;
            info!("Report written to: {}", output_path.display());
        } else if !args.summary {
            println!("{json_output}");
        }

        if args.summary {
            output::print_failure_summary(&aggregate_failures(&reports));
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let mut config = Config::load(self.config.as_deref())?;
        config.output.pretty |= self.pretty;

        match &self.command {
            Commands::Download(args) => self.execute_download(args, &config).await,
            Commands::Analyze(args) => self.execute_analyze(args, &config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn download_args(argv: &[&str]) -> DownloadArgs {
        let mut full = vec!["ci-log-processor", "download"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Download(args) => args,
            Commands::Analyze(_) => panic!("expected download"),
        }
    }

    #[test]
    fn test_download_defaults_come_from_config() {
        let args = download_args(&["-r", "acme/widgets", "-w", "E2E"]);
        let options = args.harvest_options(&Config::default(), today()).unwrap();

        assert_eq!(options.workflow, "E2E");
        assert_eq!(options.window, TimeWindow::LookbackDays(7));
        assert_eq!(options.output_dir, PathBuf::from("logs"));
        assert_eq!(options.discovery.page_size, 100);
        assert_eq!(options.discovery.max_pages, 10);
        assert_eq!(options.max_jobs, 900);
        assert_eq!(options.dispatch.max_jobs, 900);
        assert_eq!(options.dispatch.concurrency, 8);
    }

    #[test]
    fn test_flags_override_config() {
        let args = download_args(&[
            "-w", "E2E", "-d", "3", "-o", "out", "--page-size", "20", "--max-jobs", "90",
            "--dispatch-limit", "100", "-c", "2", "--max-pages", "5",
        ]);
        let options = args.harvest_options(&Config::default(), today()).unwrap();

        assert_eq!(options.window, TimeWindow::LookbackDays(3));
        assert_eq!(options.output_dir, PathBuf::from("out"));
        assert_eq!(options.discovery.page_size, 20);
        assert_eq!(options.discovery.max_pages, 5);
        assert_eq!(options.max_jobs, 90);
        assert_eq!(options.dispatch.max_jobs, 100);
        assert_eq!(options.dispatch.concurrency, 2);
    }

    #[test]
    fn test_single_page_shorthand() {
        let args = download_args(&["-w", "E2E", "--single-page"]);
        let options = args.harvest_options(&Config::default(), today()).unwrap();
        assert_eq!(options.discovery.max_pages, 1);

        let conflict = Cli::try_parse_from([
            "ci-log-processor", "download", "-w", "E2E", "--single-page", "--max-pages", "3",
        ]);
        assert!(conflict.is_err());
    }

    #[test]
    fn test_explicit_range() {
        let args = download_args(&["-w", "E2E", "--since", "2026-09-01", "--until", "2026-09-30"]);
        let options = args.harvest_options(&Config::default(), today()).unwrap();
        assert_eq!(
            options.window,
            TimeWindow::Range {
                since: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                until: NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
            }
        );
    }

    #[test]
    fn test_until_requires_since() {
        let result = Cli::try_parse_from(["ci-log-processor", "download", "-w", "E2E", "--until", "2026-09-30"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_workflow_is_reported() {
        let args = download_args(&["-r", "acme/widgets"]);
        let err = args.harvest_options(&Config::default(), today()).err().unwrap();
        assert!(err.to_string().contains("workflow is required"));
    }

    #[test]
    fn test_analyze_requires_directories() {
        assert!(Cli::try_parse_from(["ci-log-processor", "analyze"]).is_err());
        assert!(Cli::try_parse_from(["ci-log-processor", "analyze", "logs/run-1", "logs/run-2"]).is_ok());
    }
}
