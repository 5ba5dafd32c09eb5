//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod event;
pub mod rsvp;

pub use event::EventEntity;
pub use rsvp::{RsvpEntity, RsvpStatusDb};

/// Counts are `INTEGER` columns. Values beyond `i32::MAX` are refused
/// rather than clamped.
pub fn count_to_db(value: u32) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Table constraints keep counts non-negative; anything else reads as zero.
pub fn count_from_db(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}
