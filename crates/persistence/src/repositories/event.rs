//! Event repository for database operations.

use async_trait::async_trait;
use domain::models::EventSettings;
use domain::store::{EventLookup, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{count_to_db, EventEntity};
use crate::metrics::QueryTimer;

/// Repository for event settings.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert or overwrite the admission settings of an event.
    ///
    /// Used by seeding and tests; the event directory owns these rows in production.
    /// A capacity above `i32::MAX` fails with [`sqlx::Error::Encode`].
    pub async fn upsert_event(&self, event: &EventSettings) -> Result<(), sqlx::Error> {
        let capacity = event.capacity.map(count_to_db).transpose()?;
        let timer = QueryTimer::new("upsert_event");
        let result = sqlx::query(
            r#"
            INSERT INTO events (id, capacity, enable_waitlist, is_active)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET capacity = EXCLUDED.capacity,
                enable_waitlist = EXCLUDED.enable_waitlist,
                is_active = EXCLUDED.is_active,
                updated_at = NOW()
            "#,
        )
        .bind(event.id)
        .bind(capacity)
        .bind(event.enable_waitlist)
        .bind(event.is_active)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }
}

#[async_trait]
impl EventLookup for EventRepository {
    async fn get_event(&self, event_id: Uuid) -> Result<Option<EventSettings>, StoreError> {
        let timer = QueryTimer::new("get_event");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, capacity, enable_waitlist, is_active
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(EventSettings::from))
    }
}
