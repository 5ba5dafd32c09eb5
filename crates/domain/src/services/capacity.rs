//! Capacity evaluation.
//!
//! Committed headcount is always recomputed from the RSVP set handed in by the
//! caller (normally the rows read inside the admission transaction). There is
//! no cached counter to drift.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{EventSettings, Rsvp, RsvpStatus};

fn headcount<'a, I>(rsvps: I, status: RsvpStatus, exclude: Option<Uuid>) -> u32
where
    I: IntoIterator<Item = &'a Rsvp>,
{
    rsvps
        .into_iter()
        .filter(|r| r.status == status && Some(r.id) != exclude)
        .fold(0u32, |total, r| total.saturating_add(r.party_size()))
}

/// Sum of party sizes over `yes` RSVPs, skipping `exclude` if given.
pub fn committed_headcount<'a, I>(rsvps: I, exclude: Option<Uuid>) -> u32
where
    I: IntoIterator<Item = &'a Rsvp>,
{
    headcount(rsvps, RsvpStatus::Yes, exclude)
}

/// Sum of party sizes over `waitlist` RSVPs.
pub fn waitlist_headcount<'a, I>(rsvps: I) -> u32
where
    I: IntoIterator<Item = &'a Rsvp>,
{
    headcount(rsvps, RsvpStatus::Waitlist, None)
}

/// Free seats left under `capacity`; never negative.
pub fn spots_remaining(capacity: u32, committed: u32) -> u32 {
    capacity.saturating_sub(committed)
}

/// Result of checking a party against an event's capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityCheck {
    Fits,
    Exceeds { requested: u32, available: u32 },
}

impl CapacityCheck {
    pub fn fits(&self) -> bool {
        matches!(self, CapacityCheck::Fits)
    }
}

/// Check whether a party of `party_size` fits on top of the current `yes` set.
///
/// `exclude` removes the RSVP being updated from the sum so a member changing
/// their own party size is not counted twice. Events without a capacity always fit.
pub fn check_capacity(
    event: &EventSettings,
    rsvps: &[Rsvp],
    exclude: Option<Uuid>,
    party_size: u32,
) -> CapacityCheck {
    let Some(capacity) = event.capacity else {
        return CapacityCheck::Fits;
    };

    let committed = committed_headcount(rsvps, exclude);
    if committed.saturating_add(party_size) <= capacity {
        CapacityCheck::Fits
    } else {
        CapacityCheck::Exceeds {
            requested: party_size,
            available: spots_remaining(capacity, committed),
        }
    }
}

/// What to do with a `yes` request that does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowAction {
    /// Persist the RSVP as `waitlist` instead.
    Waitlist,
    /// Fail with `CapacityExceeded` and write nothing.
    Reject,
}

/// Policy applied when a request overflows capacity.
///
/// New RSVPs are waitlisted whenever the event has a waitlist. Upgrades of an
/// existing RSVP to `yes` are rejected unless `waitlist_on_upgrade` is set.
/// Growing an already confirmed party is always rejected: a confirmed party is
/// never demoted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdmissionPolicy {
    #[serde(default)]
    pub waitlist_on_upgrade: bool,
}

impl AdmissionPolicy {
    pub fn on_create_overflow(&self, event: &EventSettings) -> OverflowAction {
        if event.waitlist_applies() {
            OverflowAction::Waitlist
        } else {
            OverflowAction::Reject
        }
    }

    pub fn on_update_overflow(
        &self,
        event: &EventSettings,
        previous_status: RsvpStatus,
    ) -> OverflowAction {
        if previous_status != RsvpStatus::Yes && self.waitlist_on_upgrade && event.waitlist_applies()
        {
            OverflowAction::Waitlist
        } else {
            OverflowAction::Reject
        }
    }
}
