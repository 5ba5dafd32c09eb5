//! Periodic waitlist promotion.
//!
//! Promotion is an explicit operation; this job runs it for every event that
//! still holds waitlisted RSVPs so freed seats are eventually handed out even
//! when no caller triggered it (for example after a capacity increase).

use anyhow::bail;
use domain::services::RsvpService;
use std::time::Duration;
use tracing::{info, warn};

use super::scheduler::{Job, JobFrequency};

pub struct WaitlistSweepJob {
    service: RsvpService,
    interval: Duration,
}

impl WaitlistSweepJob {
    pub fn new(service: RsvpService, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// One pass over all events with a waitlist. Returns the number promoted.
    ///
    /// A failing event does not stop the pass; the error is reported after
    /// every event has been tried.
    pub async fn sweep(&self) -> anyhow::Result<u32> {
        let event_ids = self.service.events_with_waitlist().await?;
        let mut promoted = 0u32;
        let mut failed = 0usize;

        for event_id in &event_ids {
            match self.service.process_waitlist(*event_id).await {
                Ok(count) => promoted += count,
                Err(e) => {
                    failed += 1;
                    warn!(event_id = %event_id, error = %e, "Waitlist sweep failed for event");
                }
            }
        }

        info!(
            events = event_ids.len(),
            promoted,
            failed,
            "Waitlist sweep finished"
        );

        if failed > 0 {
            bail!("{} of {} events failed", failed, event_ids.len());
        }
        Ok(promoted)
    }
}

#[async_trait::async_trait]
impl Job for WaitlistSweepJob {
    fn name(&self) -> &'static str {
        "waitlist_sweep"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Millis(self.interval.as_millis() as u64)
    }

    async fn execute(&self) -> anyhow::Result<()> {
        self.sweep().await.map(|_| ())
    }
}
