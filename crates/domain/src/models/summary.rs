//! Read-only aggregates over an event's RSVPs.
//!
//! These feed UI and reporting. They are computed outside the admission
//! transaction and must never be used to decide admission.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counts per status and headcounts for one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RsvpSummary {
    pub event_id: Uuid,
    pub yes: u32,
    pub no: u32,
    pub maybe: u32,
    pub waitlist: u32,
    pub total_responses: u32,
    /// Confirmed attendees including guests.
    pub committed_headcount: u32,
    /// Waitlisted attendees including guests.
    pub waitlist_headcount: u32,
}

/// Capacity snapshot for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CapacityInfo {
    pub event_id: Uuid,
    pub capacity: Option<u32>,
    pub current_attendance: u32,
    /// `None` when the event has no capacity limit.
    pub spots_remaining: Option<u32>,
    pub is_at_capacity: bool,
    pub waitlist_enabled: bool,
    /// Number of waitlisted RSVPs (not headcount).
    pub waitlist_count: u32,
}

/// One entry of an event's ordered waitlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WaitlistEntry {
    /// 1-based rank.
    pub position: u32,
    pub rsvp_id: Uuid,
    pub member_id: Uuid,
    pub party_size: u32,
    pub sequence: i64,
}
