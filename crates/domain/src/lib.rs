//! Domain layer for event attendance admission control.
//!
//! This crate contains:
//! - Domain models (EventSettings, Rsvp, summaries)
//! - Store seams (EventLookup, RsvpStore) and an in-memory store
//! - Business logic services (capacity evaluation, admission, waitlist)
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::RsvpError;
