use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::insights::FailureMetrics;

/// Substring that shows a job ran its tests through the retry action.
pub const RETRY_MARKER: &str = "Run nick-fields/retry";

/// The retry action is configured for at most this many attempts.
pub const MAX_ATTEMPTS: usize = 3;

/// A named textual pattern counted over a whole log.
pub struct PatternRule {
    pub name: &'static str,
    regex: LazyLock<Regex>,
}

impl PatternRule {
    /// Number of non-overlapping matches in `text`.
    pub fn count(&self, text: &str) -> usize {
        let count = self.regex.find_iter(text).count();
        log::trace!("{}: {count} matches", self.name);
        count
    }
}

macro_rules! rule {
    ($name:literal, $pattern:literal) => {
        PatternRule {
            name: $name,
            regex: LazyLock::new(|| Regex::new($pattern).expect("rule pattern is valid")),
        }
    };
}

/// "Command completed after N attempt(s)."
pub static COMPLETED_AFTER_ATTEMPTS: PatternRule =
    rule!("completed-after-attempts", r"Command completed after \d+ attempt");
/// A line ending in "Attempt N".
pub static ATTEMPT_MARKER: PatternRule = rule!("attempt-marker", r"(?m)Attempt \d+$");
pub static ATTEMPT_FAILED: PatternRule = rule!("attempt-failed", r"Attempt \d+ failed");
pub static FINAL_ATTEMPT_FAILED: PatternRule =
    rule!("final-attempt-failed", r"Final attempt failed");
/// Jest-style summary, e.g. "Tests:       2 failed, 14 passed, 16 total".
pub static TEST_SUMMARY_FAILED: PatternRule =
    rule!("test-summary-failed", r"Tests:\s+\d+ failed,");

static ORDERING_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+-").expect("prefix pattern is valid"));

/// Log file name without the leading job id (`123-e2e.log` -> `e2e.log`).
pub fn job_name_from_path(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    ORDERING_PREFIX.replace(&file_name, "").into_owned()
}

/// `100 * failures / total_runs` rounded to two decimals (ties to even),
/// `0.0` without runs, at most `100.0`.
pub fn compute_failure_rate(failures: usize, total_runs: usize) -> f64 {
    if total_runs == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let rate = (failures as f64 / total_runs as f64) * 100.0;
    ((rate * 100.0).round_ties_even() / 100.0).min(100.0)
}

/// Extracts failure metrics from one job's log text.
///
/// Logs without [`RETRY_MARKER`] yield the zero record.
pub fn extract_failure_metrics(job_name: &str, content: &str) -> FailureMetrics {
    if !content.contains(RETRY_MARKER) {
        return FailureMetrics::zero(job_name);
    }

    let logged_attempt_total = COMPLETED_AFTER_ATTEMPTS.count(content);
    let logged_attempt_count = ATTEMPT_MARKER.count(content);
    let total_runs = logged_attempt_total + logged_attempt_count;

    let attempt_failure_count = ATTEMPT_FAILED.count(content);
    let final_attempt_failure_count = FINAL_ATTEMPT_FAILED.count(content);
    let test_failure_count = TEST_SUMMARY_FAILED.count(content);

    // Several markers can describe the same failed attempt
    let failures = (attempt_failure_count + final_attempt_failure_count + test_failure_count)
        .min(MAX_ATTEMPTS);

    FailureMetrics {
        job_name: job_name.to_string(),
        total_runs,
        logged_attempt_total,
        logged_attempt_count,
        failures,
        test_failure_count,
        attempt_failure_count,
        final_attempt_failure_count,
        failure_rate: compute_failure_rate(failures, total_runs),
    }
}
