#![forbid(unsafe_code)]

pub mod metrics;
pub mod model;
pub mod time;

pub use metrics::{ActivityItem, Metrics, ModuleSummary};
pub use time::Clock;
