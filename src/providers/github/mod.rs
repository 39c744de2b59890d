mod client;
mod discovery;
mod dispatch;
mod jobs;
mod logs;
mod provider;
mod types;

pub use discovery::{DateRange, DiscoveryOptions, TimeWindow};
pub use dispatch::{DispatchLimits, DispatchReport};
pub use jobs::JobEnumeration;
pub use provider::{GitHubProvider, HarvestOptions};
