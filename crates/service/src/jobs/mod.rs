//! Background jobs.

mod pool_metrics;
mod scheduler;
mod waitlist_sweep;

pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use waitlist_sweep::WaitlistSweepJob;
