//! Waitlist ordering and promotion.
//!
//! Entries are ordered by their store-assigned `sequence` (ties broken by
//! `created_at`, then id). Promotion walks that order and stops at the first
//! party that does not fit, so a later, smaller party never jumps ahead.

use metrics::counter;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::capacity::{committed_headcount, spots_remaining};
use super::rsvp::RsvpService;
use crate::error::RsvpError;
use crate::models::{Rsvp, RsvpStatus, WaitlistEntry};

/// Waitlisted RSVPs in arrival order.
pub fn waitlist_queue(rsvps: &[Rsvp]) -> Vec<&Rsvp> {
    let mut queue: Vec<&Rsvp> = rsvps.iter().filter(|r| r.is_waitlisted()).collect();
    queue.sort_by_key(|r| (r.sequence, r.created_at, r.id));
    queue
}

/// Leading entries of `queue` that fit into `spots`, in order.
///
/// Stops at the first entry whose party does not fit.
pub fn plan_promotions<'a>(mut spots: u32, queue: &[&'a Rsvp]) -> Vec<&'a Rsvp> {
    let mut promoted = Vec::new();
    for entry in queue {
        let party = entry.party_size();
        if party > spots {
            break;
        }
        spots -= party;
        promoted.push(*entry);
    }
    promoted
}

/// 1-based rank of a member on the waitlist.
pub fn waitlist_position(rsvps: &[Rsvp], member_id: Uuid) -> Option<u32> {
    waitlist_queue(rsvps)
        .iter()
        .position(|r| r.member_id == member_id)
        .map(|index| index as u32 + 1)
}

/// The ordered waitlist with positions.
pub fn waitlist_entries(rsvps: &[Rsvp]) -> Vec<WaitlistEntry> {
    waitlist_queue(rsvps)
        .into_iter()
        .enumerate()
        .map(|(index, r)| WaitlistEntry {
            position: index as u32 + 1,
            rsvp_id: r.id,
            member_id: r.member_id,
            party_size: r.party_size(),
            sequence: r.sequence,
        })
        .collect()
}

impl RsvpService {
    /// Promote waitlisted RSVPs into freed capacity, in arrival order.
    ///
    /// Returns the number of RSVPs promoted. A no-op returning 0 for events
    /// without a capacity, without a waitlist, or no longer active. Calling it
    /// again with no capacity freed in between promotes nothing.
    #[instrument(skip_all, fields(event_id = %event_id))]
    pub async fn process_waitlist(&self, event_id: Uuid) -> Result<u32, RsvpError> {
        let promoted = self
            .retry_on_conflict("process_waitlist", event_id, || {
                self.try_process_waitlist(event_id)
            })
            .await?;

        if promoted > 0 {
            counter!("rsvp_waitlist_promotions_total").increment(u64::from(promoted));
            info!(promoted, "Waitlist processed");
        }
        Ok(promoted)
    }

    async fn try_process_waitlist(&self, event_id: Uuid) -> Result<u32, RsvpError> {
        let mut tx = self.store.begin(event_id).await?;
        let event = tx
            .load_event()
            .await?
            .ok_or(RsvpError::EventNotFound(event_id))?;
        let Some(capacity) = event.capacity else {
            return Ok(0);
        };
        if !event.enable_waitlist || !event.is_active {
            return Ok(0);
        }

        let rsvps = tx.load_rsvps().await?;

        let spots = spots_remaining(capacity, committed_headcount(&rsvps, None));
        if spots == 0 {
            return Ok(0);
        }

        let queue = waitlist_queue(&rsvps);
        let promotions = plan_promotions(spots, &queue);
        if promotions.is_empty() {
            return Ok(0);
        }

        let now = tx.timestamp();
        for entry in &promotions {
            let mut promoted = (*entry).clone();
            promoted.status = RsvpStatus::Yes;
            promoted.response_date = now;
            promoted.updated_at = now;
            tx.update(&promoted).await?;
            debug!(
                rsvp_id = %promoted.id,
                member_id = %promoted.member_id,
                party_size = promoted.party_size(),
                "Promoting waitlisted RSVP"
            );
        }
        tx.commit().await?;

        Ok(promotions.len() as u32)
    }

    /// A member's 1-based waitlist position, or `None` if not waitlisted.
    pub async fn get_waitlist_position(
        &self,
        event_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<u32>, RsvpError> {
        let waitlisted = self
            .store
            .list_by_event(event_id, Some(RsvpStatus::Waitlist))
            .await?;
        Ok(waitlist_position(&waitlisted, member_id))
    }

    /// Events that currently hold at least one waitlisted RSVP.
    pub async fn events_with_waitlist(&self) -> Result<Vec<Uuid>, RsvpError> {
        Ok(self.store.events_with_waitlist().await?)
    }

    /// The event's waitlist in promotion order.
    pub async fn get_waitlist(&self, event_id: Uuid) -> Result<Vec<WaitlistEntry>, RsvpError> {
        let waitlisted = self
            .store
            .list_by_event(event_id, Some(RsvpStatus::Waitlist))
            .await?;
        Ok(waitlist_entries(&waitlisted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn waitlisted(sequence: i64, guests: u32) -> Rsvp {
        let created = Utc::now() - Duration::minutes(100 - sequence);
        Rsvp {
            id: Uuid::new_v4(),
            event_id: Uuid::nil(),
            member_id: Uuid::new_v4(),
            status: RsvpStatus::Waitlist,
            number_of_guests: guests,
            notes: None,
            sequence,
            response_date: created,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_queue_orders_by_sequence_and_skips_other_statuses() {
        let mut confirmed = waitlisted(1, 0);
        confirmed.status = RsvpStatus::Yes;
        let rsvps = vec![waitlisted(4, 0), confirmed, waitlisted(2, 1), waitlisted(3, 0)];

        let sequences: Vec<i64> = waitlist_queue(&rsvps).iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![2, 3, 4]);
    }

    #[test]
    fn test_plan_promotions_fills_in_order() {
        let rsvps = vec![waitlisted(1, 0), waitlisted(2, 1), waitlisted(3, 0)];
        let queue = waitlist_queue(&rsvps);

        let promoted = plan_promotions(3, &queue);
        assert_eq!(promoted.len(), 2);
        assert_eq!(promoted[0].sequence, 1);
        assert_eq!(promoted[1].sequence, 2);
    }

    #[test]
    fn test_plan_promotions_stops_at_first_misfit() {
        // A party of 3 is first in line; a single behind it must not skip ahead.
        let rsvps = vec![waitlisted(1, 2), waitlisted(2, 0)];
        let queue = waitlist_queue(&rsvps);

        assert!(plan_promotions(2, &queue).is_empty());
        assert_eq!(plan_promotions(3, &queue).len(), 1);
        assert_eq!(plan_promotions(4, &queue).len(), 2);
    }

    #[test]
    fn test_plan_promotions_no_spots() {
        let rsvps = vec![waitlisted(1, 0)];
        assert!(plan_promotions(0, &waitlist_queue(&rsvps)).is_empty());
    }

    #[test]
    fn test_waitlist_position() {
        let rsvps = vec![waitlisted(7, 0), waitlisted(3, 0), waitlisted(5, 0)];
        assert_eq!(waitlist_position(&rsvps, rsvps[1].member_id), Some(1));
        assert_eq!(waitlist_position(&rsvps, rsvps[2].member_id), Some(2));
        assert_eq!(waitlist_position(&rsvps, rsvps[0].member_id), Some(3));
        assert_eq!(waitlist_position(&rsvps, Uuid::new_v4()), None);
    }

    #[test]
    fn test_waitlist_entries() {
        let rsvps = vec![waitlisted(2, 3), waitlisted(1, 0)];
        let entries = waitlist_entries(&rsvps);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].position, 1);
        assert_eq!(entries[0].rsvp_id, rsvps[1].id);
        assert_eq!(entries[1].position, 2);
        assert_eq!(entries[1].party_size, 4);
    }
}
