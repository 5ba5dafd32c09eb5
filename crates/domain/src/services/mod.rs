//! Domain services for event attendance.
//!
//! Services contain business logic that operates on domain models.

pub mod capacity;
pub mod rsvp;
pub mod summary;
pub mod waitlist;

pub use capacity::{
    check_capacity, committed_headcount, spots_remaining, waitlist_headcount, AdmissionPolicy,
    CapacityCheck, OverflowAction,
};
pub use rsvp::RsvpService;
pub use summary::{capacity_info, summarize};
pub use waitlist::{plan_promotions, waitlist_entries, waitlist_position, waitlist_queue};
