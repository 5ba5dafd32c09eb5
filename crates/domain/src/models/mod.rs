//! Domain models for event attendance.

pub mod event;
pub mod rsvp;
pub mod summary;

pub use event::EventSettings;
pub use rsvp::{CreateRsvpRequest, Rsvp, RsvpStatus, UpdateRsvpRequest, MAX_GUESTS, MAX_NOTES_LENGTH};
pub use summary::{CapacityInfo, RsvpSummary, WaitlistEntry};
