//! Domain error types for admission control.

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Errors returned by RSVP operations.
///
/// Business-rule failures are distinct from infrastructure failures (`Store`).
#[derive(Debug, Error)]
pub enum RsvpError {
    #[error("Event not found: {0}")]
    EventNotFound(Uuid),

    #[error("Event is not active: {0}")]
    EventNotActive(Uuid),

    #[error("RSVP not found: {0}")]
    RsvpNotFound(Uuid),

    #[error("Member {member_id} already has an RSVP for event {event_id}")]
    DuplicateRsvp { event_id: Uuid, member_id: Uuid },

    #[error("Capacity exceeded for event {event_id}: requested {requested}, available {available}")]
    CapacityExceeded {
        event_id: Uuid,
        requested: u32,
        available: u32,
    },

    #[error("Event {0} has no waitlist")]
    WaitlistUnavailable(Uuid),

    #[error("Transaction on event {event_id} still conflicting after {attempts} attempts")]
    TransientConflict { event_id: Uuid, attempts: u32 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RsvpError {
    /// Whether the caller may retry the whole operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RsvpError::TransientConflict { .. })
    }

    /// Whether this is a business-rule outcome rather than an infrastructure failure.
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            RsvpError::Store(_) | RsvpError::TransientConflict { .. }
        )
    }
}

impl From<validator::ValidationErrors> for RsvpError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| describe(field, e))
                })
            })
            .collect();

        let message = if messages.len() == 1 {
            messages[0].clone()
        } else {
            format!("{} validation errors", messages.len())
        };

        RsvpError::Validation(message)
    }
}

/// Message for a validation failure that carries no custom message.
fn describe(field: &str, error: &validator::ValidationError) -> String {
    match (&*error.code, error.params.get("max")) {
        ("range", Some(max)) => format!("{} must be at most {}", field, max),
        ("length", Some(max)) => format!("{} must be at most {} characters", field, max),
        _ => format!("{} is invalid", field),
    }
}
