//! Read-only RSVP queries and aggregates.
//!
//! Nothing here takes part in admission. Results may be stale by the time the
//! caller sees them.

use uuid::Uuid;

use super::capacity::{committed_headcount, spots_remaining, waitlist_headcount};
use super::rsvp::RsvpService;
use crate::error::RsvpError;
use crate::models::{CapacityInfo, EventSettings, Rsvp, RsvpStatus, RsvpSummary};

/// Counts per status and headcounts.
pub fn summarize(event_id: Uuid, rsvps: &[Rsvp]) -> RsvpSummary {
    let mut summary = RsvpSummary {
        event_id,
        ..Default::default()
    };

    for rsvp in rsvps {
        match rsvp.status {
            RsvpStatus::Yes => summary.yes += 1,
            RsvpStatus::No => summary.no += 1,
            RsvpStatus::Maybe => summary.maybe += 1,
            RsvpStatus::Waitlist => summary.waitlist += 1,
        }
    }

    summary.total_responses = rsvps.len() as u32;
    summary.committed_headcount = committed_headcount(rsvps, None);
    summary.waitlist_headcount = waitlist_headcount(rsvps);
    summary
}

/// Capacity snapshot for display.
pub fn capacity_info(event: &EventSettings, rsvps: &[Rsvp]) -> CapacityInfo {
    let current_attendance = committed_headcount(rsvps, None);
    let spots = event
        .capacity
        .map(|capacity| spots_remaining(capacity, current_attendance));

    CapacityInfo {
        event_id: event.id,
        capacity: event.capacity,
        current_attendance,
        spots_remaining: spots,
        is_at_capacity: spots == Some(0),
        waitlist_enabled: event.enable_waitlist,
        waitlist_count: rsvps.iter().filter(|r| r.is_waitlisted()).count() as u32,
    }
}

impl RsvpService {
    pub async fn get_rsvp_summary(&self, event_id: Uuid) -> Result<RsvpSummary, RsvpError> {
        self.require_event(event_id).await?;
        let rsvps = self.store.list_by_event(event_id, None).await?;
        Ok(summarize(event_id, &rsvps))
    }

    pub async fn get_capacity_info(&self, event_id: Uuid) -> Result<CapacityInfo, RsvpError> {
        let event = self.require_event(event_id).await?;
        let rsvps = self.store.list_by_event(event_id, None).await?;
        Ok(capacity_info(&event, &rsvps))
    }

    /// RSVPs of an event in arrival order, optionally filtered by status.
    pub async fn get_rsvps_by_event(
        &self,
        event_id: Uuid,
        status: Option<RsvpStatus>,
    ) -> Result<Vec<Rsvp>, RsvpError> {
        Ok(self.store.list_by_event(event_id, status).await?)
    }

    pub async fn get_rsvp_by_member(
        &self,
        event_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Rsvp>, RsvpError> {
        Ok(self.store.find_by_member(event_id, member_id).await?)
    }

    pub async fn get_rsvp(&self, event_id: Uuid, rsvp_id: Uuid) -> Result<Option<Rsvp>, RsvpError> {
        Ok(self.store.find_by_id(event_id, rsvp_id).await?)
    }

    /// A member's RSVPs across all events, newest first.
    pub async fn get_rsvps_for_member(&self, member_id: Uuid) -> Result<Vec<Rsvp>, RsvpError> {
        Ok(self.store.list_by_member(member_id).await?)
    }
}
