//! Event settings as seen by admission control.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of an event that admission control reads.
///
/// Events are owned by an external directory; this core never writes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EventSettings {
    pub id: Uuid,
    /// Hard ceiling on committed headcount. `None` means unlimited.
    ///
    /// The PostgreSQL column is `INTEGER`; writing a value above `i32::MAX`
    /// fails instead of clamping.
    pub capacity: Option<u32>,
    pub enable_waitlist: bool,
    /// False once the event is cancelled or archived.
    pub is_active: bool,
}

impl EventSettings {
    /// An active event with no capacity limit and no waitlist.
    pub fn unlimited(id: Uuid) -> Self {
        Self {
            id,
            capacity: None,
            enable_waitlist: false,
            is_active: true,
        }
    }

    /// An active event with the given capacity.
    pub fn with_capacity(id: Uuid, capacity: u32, enable_waitlist: bool) -> Self {
        Self {
            id,
            capacity: Some(capacity),
            enable_waitlist,
            is_active: true,
        }
    }

    /// Whether over-capacity requests can be queued instead of rejected.
    pub fn waitlist_applies(&self) -> bool {
        self.capacity.is_some() && self.enable_waitlist
    }
}
