//! RSVP entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Rsvp, RsvpStatus};
use sqlx::FromRow;
use uuid::Uuid;

use super::count_from_db;

/// Database enum for RSVP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "rsvp_status", rename_all = "lowercase")]
pub enum RsvpStatusDb {
    Yes,
    No,
    Maybe,
    Waitlist,
}

impl From<RsvpStatusDb> for RsvpStatus {
    fn from(db_status: RsvpStatusDb) -> Self {
        match db_status {
            RsvpStatusDb::Yes => RsvpStatus::Yes,
            RsvpStatusDb::No => RsvpStatus::No,
            RsvpStatusDb::Maybe => RsvpStatus::Maybe,
            RsvpStatusDb::Waitlist => RsvpStatus::Waitlist,
        }
    }
}

impl From<RsvpStatus> for RsvpStatusDb {
    fn from(status: RsvpStatus) -> Self {
        match status {
            RsvpStatus::Yes => RsvpStatusDb::Yes,
            RsvpStatus::No => RsvpStatusDb::No,
            RsvpStatus::Maybe => RsvpStatusDb::Maybe,
            RsvpStatus::Waitlist => RsvpStatusDb::Waitlist,
        }
    }
}

/// Database row mapping for the event_rsvps table.
#[derive(Debug, Clone, FromRow)]
pub struct RsvpEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub member_id: Uuid,
    pub status: RsvpStatusDb,
    pub number_of_guests: i32,
    pub notes: Option<String>,
    pub sequence: i64,
    pub response_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RsvpEntity> for Rsvp {
    fn from(entity: RsvpEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            member_id: entity.member_id,
            status: entity.status.into(),
            number_of_guests: count_from_db(entity.number_of_guests),
            notes: entity.notes,
            sequence: entity.sequence,
            response_date: entity.response_date,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
