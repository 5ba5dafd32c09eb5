//! PostgreSQL implementations of the domain store traits.

pub mod event;
pub mod rsvp;

pub use event::EventRepository;
pub use rsvp::{PgRsvpTransaction, RsvpRepository};
