use std::fmt::Write;

use comfy_table::Cell;

use crate::analysis::failure_thresholds;
use crate::insights::{HarvestSummary, JobFailureSummary};

use super::styling::{bright, bright_green, bright_red, bright_yellow, cyan, dim};
use super::tables::{color_coded_failures_cell, count_cell, create_table, cyan_header};

/// Prints the outcome of a harvest to stdout.
///
/// Shows the repository, workflow and window, then one table with the run and
/// job counts at each stage, highlighting anything that was skipped, failed or
/// discarded by a safety limit.
pub fn print_harvest_summary(summary: &HarvestSummary) {
    println!("{}", render_harvest_summary(summary));
}

/// Prints per-job failure totals, worst first, to stdout.
pub fn print_failure_summary(summaries: &[JobFailureSummary]) {
    println!("{}", render_failure_summary(summaries));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn render_harvest_summary(summary: &HarvestSummary) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Harvest");
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n",
        dim("Repository:"),
        cyan(&summary.repository),
        dim("Workflow:"),
        cyan(&summary.workflow_id),
        dim("Window:"),
        dim(summary.window),
    );

    if summary.runs_considered == 0 {
        let _ = writeln!(output, "{}", bright_yellow("No runs found in the requested window."));
        return output;
    }

    let enumeration = &summary.enumeration;
    let dispatch = &summary.dispatch;

    let mut table = create_table();
    table.set_header(cyan_header(&["Stage", "Count"]));
    table.add_row(vec![Cell::new("Runs considered"), count_cell(summary.runs_considered, false)]);
    table.add_row(vec![Cell::new("Runs processed"), count_cell(enumeration.processed_runs.len(), false)]);
    table.add_row(vec![Cell::new("Runs skipped (job limit)"), count_cell(enumeration.skipped_runs.len(), true)]);
    table.add_row(vec![Cell::new("Runs with failed job listing"), count_cell(enumeration.failed_runs.len(), true)]);
    table.add_row(vec![Cell::new("Jobs enumerated"), count_cell(enumeration.jobs.len(), false)]);
    table.add_row(vec![Cell::new("Jobs discarded (dispatch limit)"), count_cell(dispatch.discarded, true)]);
    table.add_row(vec![Cell::new("Jobs attempted"), count_cell(summary.jobs_attempted(), false)]);
    table.add_row(vec![Cell::new("Downloads failed"), count_cell(dispatch.failed, true)]);
    table.add_row(vec![Cell::new("Logs saved"), count_cell(summary.logs_saved(), false)]);

    let _ = writeln!(output, "{table}");

    if !enumeration.skipped_runs.is_empty() {
        let ids: Vec<String> = enumeration.skipped_runs.iter().map(ToString::to_string).collect();
        let _ = writeln!(output, "\n  {} {}", dim("Skipped runs:"), ids.join(", "));
    }

    output
}

fn render_failure_summary(summaries: &[JobFailureSummary]) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🔥", "Failures by Job");

    let Some((mean, median)) = failure_thresholds(summaries) else {
        let _ = writeln!(output, "{}", bright_green("No failures found."));
        return output;
    };

    let mut table = create_table();
    table.set_header(cyan_header(&[
        "Job",
        "Failures",
        "Test Failures",
        "Attempt Failures",
        "Final Attempt Failures",
    ]));

    for job in summaries {
        table.add_row(vec![
            Cell::new(&job.job_name),
            color_coded_failures_cell(job.failures, mean),
            Cell::new(job.test_failure_count),
            Cell::new(job.attempt_failure_count),
            Cell::new(job.final_attempt_failure_count),
        ]);
    }

    let _ = writeln!(output, "{table}");
    let _ = writeln!(
        output,
        "  {} {}   {} {}",
        dim("Mean:"),
        bright_red(format!("{mean} failures")),
        dim("Median:"),
        bright_green(format!("{median} failures")),
    );

    output
}
