mod registry;
mod service;
pub mod tasks;

pub use registry::SourceRegistry;
pub use service::{SchedulerService, API_CYCLE_SECS, FEED_CYCLE_SECS};
pub use tasks::{run_cycle, IngestReport};
