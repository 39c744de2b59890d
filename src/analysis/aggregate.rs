use indexmap::IndexMap;

use crate::insights::{JobFailureSummary, LogDirectoryReport};

/// Sums failure counts per job name across all reports.
///
/// Only jobs with at least one failure are included. Sorted by total failures,
/// highest first; ties are ordered by job name.
pub fn aggregate_failures(reports: &[LogDirectoryReport]) -> Vec<JobFailureSummary> {
    let mut by_name: IndexMap<&str, JobFailureSummary> = IndexMap::new();

    for job in reports.iter().flat_map(|r| &r.jobs).filter(|j| j.failures > 0) {
        let entry = by_name
            .entry(job.job_name.as_str())
            .or_insert_with(|| JobFailureSummary {
                job_name: job.job_name.clone(),
                failures: 0,
                test_failure_count: 0,
                attempt_failure_count: 0,
                final_attempt_failure_count: 0,
            });
        entry.failures += job.failures;
        entry.test_failure_count += job.test_failure_count;
        entry.attempt_failure_count += job.attempt_failure_count;
        entry.final_attempt_failure_count += job.final_attempt_failure_count;
    }

    let mut summaries: Vec<JobFailureSummary> = by_name.into_values().collect();
    summaries.sort_by(|a, b| a.job_name.cmp(&b.job_name));
    summaries.sort_by(|a, b| b.failures.cmp(&a.failures));
    summaries
}

/// Mean and median of the summed failure counts, rounded to whole failures
/// with ties going to the even number.
pub fn failure_thresholds(summaries: &[JobFailureSummary]) -> Option<(usize, usize)> {
    if summaries.is_empty() {
        return None;
    }

    let mut counts: Vec<usize> = summaries.iter().map(|s| s.failures).collect();
    counts.sort_unstable();

    #[allow(clippy::cast_precision_loss)]
    let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
    let mid = counts.len() / 2;
    #[allow(clippy::cast_precision_loss)]
    let median = if counts.len() % 2 == 0 {
        (counts[mid - 1] + counts[mid]) as f64 / 2.0
    } else {
        counts[mid] as f64
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some((mean.round_ties_even() as usize, median.round_ties_even() as usize))
}
