//! Storage seams for admission control.
//!
//! Two collaborators sit behind traits:
//! - [`EventLookup`] resolves event settings (owned by an external directory).
//! - [`RsvpStore`] persists RSVPs and hands out [`RsvpTransaction`]s, each of
//!   which is serialized against every other writer of the same event.
//!
//! Admission decisions read event settings through the transaction, not
//! through [`EventLookup`], so a capacity change races like any other write.
//!
//! A transaction that cannot be serialized fails with [`StoreError::Conflict`],
//! either on a write or on commit. Dropping a transaction without committing
//! discards its writes.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{EventSettings, Rsvp, RsvpStatus};

pub use memory::{InMemoryEventLookup, InMemoryRsvpStore};

/// Unique constraint guarding one RSVP per member and event.
pub const MEMBER_UNIQUE_CONSTRAINT: &str = "event_rsvps_event_member_key";

/// Store-level failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The transaction lost a race with a concurrent writer and must be re-run.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// A unique constraint rejected the write.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The row targeted by an update does not exist.
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(code) = db_err.code() {
                match code.as_ref() {
                    // serialization_failure, deadlock_detected
                    "40001" | "40P01" => return StoreError::Conflict(db_err.message().to_string()),
                    // unique_violation
                    "23505" => {
                        let constraint = db_err.constraint().unwrap_or("unique").to_string();
                        return StoreError::UniqueViolation(constraint);
                    }
                    _ => {}
                }
            }
        }
        StoreError::Database(err)
    }
}

/// Read-only access to event settings.
#[async_trait]
pub trait EventLookup: Send + Sync {
    /// Fetch capacity and waitlist settings for an event.
    async fn get_event(&self, event_id: Uuid) -> Result<Option<EventSettings>, StoreError>;
}

/// Durable per-event RSVP collection.
#[async_trait]
pub trait RsvpStore: Send + Sync {
    /// Open a transaction scoped to one event.
    async fn begin(&self, event_id: Uuid) -> Result<Box<dyn RsvpTransaction>, StoreError>;

    async fn find_by_id(&self, event_id: Uuid, rsvp_id: Uuid) -> Result<Option<Rsvp>, StoreError>;

    async fn find_by_member(
        &self,
        event_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Rsvp>, StoreError>;

    /// RSVPs of an event in arrival order, optionally filtered by status.
    async fn list_by_event(
        &self,
        event_id: Uuid,
        status: Option<RsvpStatus>,
    ) -> Result<Vec<Rsvp>, StoreError>;

    /// All RSVPs of a member across events, newest first.
    async fn list_by_member(&self, member_id: Uuid) -> Result<Vec<Rsvp>, StoreError>;

    /// Hard delete. Returns false if nothing was deleted.
    async fn delete(&self, event_id: Uuid, rsvp_id: Uuid) -> Result<bool, StoreError>;

    /// Ids of events that currently have at least one waitlisted RSVP.
    async fn events_with_waitlist(&self) -> Result<Vec<Uuid>, StoreError>;
}

/// A read-modify-write unit of work on one event's RSVPs.
#[async_trait]
pub trait RsvpTransaction: Send {
    fn event_id(&self) -> Uuid;

    /// Store-assigned timestamp for every record written by this transaction.
    fn timestamp(&self) -> DateTime<Utc>;

    /// The event's admission settings as seen by this transaction.
    ///
    /// A concurrent change to these settings conflicts with this transaction
    /// if it writes.
    async fn load_event(&mut self) -> Result<Option<EventSettings>, StoreError>;

    /// All RSVPs of the event as seen by this transaction, including its own writes.
    async fn load_rsvps(&mut self) -> Result<Vec<Rsvp>, StoreError>;

    async fn insert(&mut self, rsvp: &Rsvp) -> Result<(), StoreError>;

    async fn update(&mut self, rsvp: &Rsvp) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
