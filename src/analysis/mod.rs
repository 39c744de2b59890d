mod aggregate;
mod directory;
mod failure_metrics;

pub use aggregate::{aggregate_failures, failure_thresholds};
pub use directory::process_directories;
