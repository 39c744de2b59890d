mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::PhaseProgress;
pub use styling::{dim, magenta_bold};
pub use summary::{print_failure_summary, print_harvest_summary};

/// Prints the banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🧪 ci-log-processor"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CI job log harvester and failure analyzer")
    );
}
