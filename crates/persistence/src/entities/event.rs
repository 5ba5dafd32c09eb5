//! Event entity (database row mapping).

use domain::models::EventSettings;
use sqlx::FromRow;
use uuid::Uuid;

use super::count_from_db;

/// Admission-relevant columns of the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: Uuid,
    pub capacity: Option<i32>,
    pub enable_waitlist: bool,
    pub is_active: bool,
}

impl From<EventEntity> for EventSettings {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            capacity: entity.capacity.map(count_from_db),
            enable_waitlist: entity.enable_waitlist,
            is_active: entity.is_active,
        }
    }
}
