//! RSVP domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Largest number of additional guests a member may bring.
pub const MAX_GUESTS: u32 = 50;

/// Maximum length of RSVP notes, in characters.
pub const MAX_NOTES_LENGTH: u64 = 2000;

/// Attendance response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Yes,
    No,
    Maybe,
    Waitlist,
}

impl RsvpStatus {
    /// All statuses, in display order.
    pub const ALL: [RsvpStatus; 4] = [
        RsvpStatus::Yes,
        RsvpStatus::No,
        RsvpStatus::Maybe,
        RsvpStatus::Waitlist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Yes => "yes",
            RsvpStatus::No => "no",
            RsvpStatus::Maybe => "maybe",
            RsvpStatus::Waitlist => "waitlist",
        }
    }
}

impl std::fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RsvpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" => Ok(RsvpStatus::Yes),
            "no" => Ok(RsvpStatus::No),
            "maybe" => Ok(RsvpStatus::Maybe),
            "waitlist" => Ok(RsvpStatus::Waitlist),
            _ => Err(format!("Invalid RSVP status: {}", s)),
        }
    }
}

/// A member's response to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Rsvp {
    pub id: Uuid,
    pub event_id: Uuid,
    pub member_id: Uuid,
    pub status: RsvpStatus,
    /// Additional attendees beyond the member.
    pub number_of_guests: u32,
    pub notes: Option<String>,
    /// Per-event arrival number assigned by the store; waitlist order key.
    pub sequence: i64,
    /// When the member last changed their answer.
    pub response_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rsvp {
    /// Headcount this RSVP represents: the member plus their guests.
    pub fn party_size(&self) -> u32 {
        self.number_of_guests.saturating_add(1)
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == RsvpStatus::Yes
    }

    pub fn is_waitlisted(&self) -> bool {
        self.status == RsvpStatus::Waitlist
    }
}

/// Request to create an RSVP.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateRsvpRequest {
    /// Requested status. An over-capacity `yes` may be stored as `waitlist`.
    pub status: RsvpStatus,

    #[serde(default)]
    #[validate(range(max = MAX_GUESTS))]
    pub number_of_guests: u32,

    #[validate(length(max = MAX_NOTES_LENGTH))]
    pub notes: Option<String>,
}

impl CreateRsvpRequest {
    pub fn new(status: RsvpStatus) -> Self {
        Self {
            status,
            number_of_guests: 0,
            notes: None,
        }
    }

    pub fn with_guests(mut self, number_of_guests: u32) -> Self {
        self.number_of_guests = number_of_guests;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn party_size(&self) -> u32 {
        self.number_of_guests.saturating_add(1)
    }
}

/// Partial update of an RSVP. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateRsvpRequest {
    pub status: Option<RsvpStatus>,

    #[validate(range(max = MAX_GUESTS))]
    pub number_of_guests: Option<u32>,

    #[validate(length(max = MAX_NOTES_LENGTH))]
    pub notes: Option<String>,
}

impl UpdateRsvpRequest {
    pub fn status(status: RsvpStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn guests(number_of_guests: u32) -> Self {
        Self {
            number_of_guests: Some(number_of_guests),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.number_of_guests.is_none() && self.notes.is_none()
    }
}
