use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use crate::error::Result;
use crate::insights::{FailureMetrics, LogDirectoryReport};

use super::failure_metrics::{extract_failure_metrics, job_name_from_path};

static JOB_LOG_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+-.*\.log").expect("log file pattern is valid"));

/// Reads one persisted log and extracts its metrics.
///
/// Returns `Ok(None)` when `path` is not a regular file. Invalid UTF-8 is
/// replaced rather than rejected.
pub fn process_log_file(path: &Path) -> Result<Option<FailureMetrics>> {
    if !path.is_file() {
        return Ok(None);
    }

    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);

    Ok(Some(extract_failure_metrics(&job_name_from_path(path), &content)))
}

/// Extracts metrics for every `{job_id}-{name}.log` file in `dir`, in file
/// name order. Rotated copies such as `12-e2e.log.1` are included.
pub fn process_directory(dir: &Path) -> Result<LogDirectoryReport> {
    let mut logs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| JOB_LOG_FILE.is_match(name))
        })
        .collect();
    logs.sort();

    let mut jobs = Vec::with_capacity(logs.len());
    for path in logs {
        match process_log_file(&path) {
            Ok(Some(metrics)) => jobs.push(metrics),
            Ok(None) => debug!("Skipping non-file entry {}", path.display()),
            Err(e) => warn!("Failed to read log {}: {e}", path.display()),
        }
    }

    Ok(LogDirectoryReport {
        directory: dir.to_path_buf(),
        jobs,
    })
}

/// Processes each directory in turn; entries that are not directories or
/// cannot be listed are skipped with a warning.
pub fn process_directories(dirs: &[PathBuf]) -> Vec<LogDirectoryReport> {
    dirs.iter()
        .filter_map(|dir| {
            if !dir.is_dir() {
                warn!("Not a directory, skipping: {}", dir.display());
                return None;
            }
            process_directory(dir)
                .inspect_err(|e| warn!("Failed to process {}: {e}", dir.display()))
                .ok()
        })
        .collect()
}
