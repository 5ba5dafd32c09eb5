//! Wiring of the admission service and its background jobs.

use domain::services::RsvpService;
use persistence::{EventRepository, RsvpRepository};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::jobs::{JobScheduler, PoolMetricsJob, WaitlistSweepJob};

/// Build an [`RsvpService`] backed by PostgreSQL.
pub fn build_service(config: &Config, pool: &PgPool) -> RsvpService {
    RsvpService::new(
        Arc::new(EventRepository::new(pool.clone())),
        Arc::new(RsvpRepository::new(pool.clone())),
    )
    .with_retry_policy(config.admission.retry_policy())
    .with_admission_policy(config.admission.admission_policy())
}

/// Register background jobs. The scheduler is not started.
pub fn build_scheduler(config: &Config, service: &RsvpService, pool: Option<PgPool>) -> JobScheduler {
    let mut scheduler = JobScheduler::new();

    if config.waitlist_sweep.enabled {
        scheduler.register(WaitlistSweepJob::new(
            service.clone(),
            Duration::from_secs(config.waitlist_sweep.interval_secs),
        ));
    }
    if let Some(pool) = pool {
        scheduler.register(PoolMetricsJob::new(pool));
    }

    scheduler
}
