use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_STEM: &str = "ci-log-processor";

/// Configuration file structure.
///
/// Allows users to save common harvest settings and reuse them across runs.
/// Command-line flags always take precedence over values loaded here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub harvest: HarvestConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// GitHub API base URL
    #[serde(default = "default_github_base_url")]
    pub base_url: String,

    /// Repository path (e.g., 'owner/repo')
    pub repo: Option<String>,

    /// Workflow name, numeric id, or file name
    pub workflow: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HarvestConfig {
    /// Days to look back when no explicit range is given
    #[serde(default = "default_days")]
    pub days: u32,

    /// Root directory for downloaded logs
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Workflow runs requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum number of run pages requested
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Job enumeration stops once more jobs than this are listed
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,

    /// Hard ceiling on log downloads per invocation
    #[serde(default = "default_dispatch_limit")]
    pub dispatch_limit: usize,

    /// Concurrent log downloads
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: default_github_base_url(),
            repo: None,
            workflow: None,
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            days: default_days(),
            output_dir: default_output_dir(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            max_jobs: default_max_jobs(),
            dispatch_limit: default_dispatch_limit(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_github_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_days() -> u32 {
    7
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_page_size() -> usize {
    100
}

fn default_max_pages() -> u32 {
    10
}

fn default_max_jobs() -> usize {
    900
}

fn default_dispatch_limit() -> usize {
    900
}

fn default_concurrency() -> usize {
    8
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./ci-log-processor.{toml,json,yaml,yml}
    /// 3. `<config dir>/ci-log-processor/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let local = ["toml", "json", "yaml", "yml"]
            .iter()
            .map(|ext| PathBuf::from(format!("{CONFIG_STEM}.{ext}")));
        let global = dirs::config_dir().map(|dir| dir.join(CONFIG_STEM).join("config.toml"));

        for candidate in local.chain(global) {
            if candidate.exists() {
                log::debug!("Loading config from {}", candidate.display());
                return Self::load_from_path(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}
