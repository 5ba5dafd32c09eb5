//! RSVP repository for database operations.
//!
//! Every [`PgRsvpTransaction`] runs at `SERIALIZABLE` isolation. Two
//! transactions that read the same event's RSVPs and both write are never
//! both committed; the loser fails with SQLSTATE `40001`, which surfaces as
//! [`StoreError::Conflict`] and is retried by the service. The event row is
//! read `FOR SHARE` inside the same transaction: a settings change committed
//! after the snapshot fails the read with `40001`, and one arriving later
//! waits for this transaction to finish.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{EventSettings, Rsvp, RsvpStatus};
use domain::store::{RsvpStore, RsvpTransaction, StoreError};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{count_to_db, EventEntity, RsvpEntity, RsvpStatusDb};
use crate::metrics::QueryTimer;

/// Repository for RSVP persistence.
#[derive(Clone)]
pub struct RsvpRepository {
    pool: PgPool,
}

impl RsvpRepository {
    /// Creates a new RsvpRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RsvpStore for RsvpRepository {
    async fn begin(&self, event_id: Uuid) -> Result<Box<dyn RsvpTransaction>, StoreError> {
        let timer = QueryTimer::new("begin_rsvp_transaction");
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        // now() is fixed for the lifetime of the transaction.
        let timestamp: DateTime<Utc> = sqlx::query_scalar("SELECT now()")
            .fetch_one(&mut *tx)
            .await?;
        timer.record();

        Ok(Box::new(PgRsvpTransaction {
            tx,
            event_id,
            timestamp,
        }))
    }

    async fn find_by_id(&self, event_id: Uuid, rsvp_id: Uuid) -> Result<Option<Rsvp>, StoreError> {
        let timer = QueryTimer::new("find_rsvp_by_id");
        let result = sqlx::query_as::<_, RsvpEntity>(
            r#"
            SELECT id, event_id, member_id, status, number_of_guests, notes, sequence,
                   response_date, created_at, updated_at
            FROM event_rsvps
            WHERE event_id = $1 AND id = $2
            "#,
        )
        .bind(event_id)
        .bind(rsvp_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Rsvp::from))
    }

    async fn find_by_member(
        &self,
        event_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Rsvp>, StoreError> {
        let timer = QueryTimer::new("find_rsvp_by_member");
        let result = sqlx::query_as::<_, RsvpEntity>(
            r#"
            SELECT id, event_id, member_id, status, number_of_guests, notes, sequence,
                   response_date, created_at, updated_at
            FROM event_rsvps
            WHERE event_id = $1 AND member_id = $2
            "#,
        )
        .bind(event_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Rsvp::from))
    }

    async fn list_by_event(
        &self,
        event_id: Uuid,
        status: Option<RsvpStatus>,
    ) -> Result<Vec<Rsvp>, StoreError> {
        let timer = QueryTimer::new("list_rsvps_by_event");
        let result = sqlx::query_as::<_, RsvpEntity>(
            r#"
            SELECT id, event_id, member_id, status, number_of_guests, notes, sequence,
                   response_date, created_at, updated_at
            FROM event_rsvps
            WHERE event_id = $1
              AND ($2::rsvp_status IS NULL OR status = $2)
            ORDER BY sequence, created_at, id
            "#,
        )
        .bind(event_id)
        .bind(status.map(RsvpStatusDb::from))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Rsvp::from).collect())
    }

    async fn list_by_member(&self, member_id: Uuid) -> Result<Vec<Rsvp>, StoreError> {
        let timer = QueryTimer::new("list_rsvps_by_member");
        let result = sqlx::query_as::<_, RsvpEntity>(
            r#"
            SELECT id, event_id, member_id, status, number_of_guests, notes, sequence,
                   response_date, created_at, updated_at
            FROM event_rsvps
            WHERE member_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Rsvp::from).collect())
    }

    async fn delete(&self, event_id: Uuid, rsvp_id: Uuid) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("delete_rsvp");
        let result = sqlx::query(
            r#"
            DELETE FROM event_rsvps
            WHERE event_id = $1 AND id = $2
            "#,
        )
        .bind(event_id)
        .bind(rsvp_id)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    async fn events_with_waitlist(&self) -> Result<Vec<Uuid>, StoreError> {
        let timer = QueryTimer::new("events_with_waitlist");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT event_id
            FROM event_rsvps
            WHERE status = 'waitlist'
            ORDER BY event_id
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }
}

/// A serializable transaction over one event's RSVPs.
///
/// Dropping it without calling `commit` rolls back.
pub struct PgRsvpTransaction {
    tx: Transaction<'static, Postgres>,
    event_id: Uuid,
    timestamp: DateTime<Utc>,
}

#[async_trait]
impl RsvpTransaction for PgRsvpTransaction {
    fn event_id(&self) -> Uuid {
        self.event_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    async fn load_event(&mut self) -> Result<Option<EventSettings>, StoreError> {
        let timer = QueryTimer::new("load_event_settings");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, capacity, enable_waitlist, is_active
            FROM events
            WHERE id = $1
            FOR SHARE
            "#,
        )
        .bind(self.event_id)
        .fetch_optional(&mut *self.tx)
        .await;
        timer.record();
        Ok(result?.map(EventSettings::from))
    }

    async fn load_rsvps(&mut self) -> Result<Vec<Rsvp>, StoreError> {
        let timer = QueryTimer::new("load_event_rsvps");
        let result = sqlx::query_as::<_, RsvpEntity>(
            r#"
            SELECT id, event_id, member_id, status, number_of_guests, notes, sequence,
                   response_date, created_at, updated_at
            FROM event_rsvps
            WHERE event_id = $1
            ORDER BY sequence, created_at, id
            "#,
        )
        .bind(self.event_id)
        .fetch_all(&mut *self.tx)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Rsvp::from).collect())
    }

    async fn insert(&mut self, rsvp: &Rsvp) -> Result<(), StoreError> {
        let timer = QueryTimer::new("insert_rsvp");
        let result = sqlx::query(
            r#"
            INSERT INTO event_rsvps (
                id, event_id, member_id, status, number_of_guests, notes, sequence,
                response_date, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(rsvp.id)
        .bind(self.event_id)
        .bind(rsvp.member_id)
        .bind(RsvpStatusDb::from(rsvp.status))
        .bind(count_to_db(rsvp.number_of_guests)?)
        .bind(&rsvp.notes)
        .bind(rsvp.sequence)
        .bind(rsvp.response_date)
        .bind(rsvp.created_at)
        .bind(rsvp.updated_at)
        .execute(&mut *self.tx)
        .await;
        timer.record();
        result?;
        Ok(())
    }

    async fn update(&mut self, rsvp: &Rsvp) -> Result<(), StoreError> {
        let timer = QueryTimer::new("update_rsvp");
        let result = sqlx::query(
            r#"
            UPDATE event_rsvps
            SET status = $3,
                number_of_guests = $4,
                notes = $5,
                sequence = $6,
                response_date = $7,
                updated_at = $8
            WHERE event_id = $1 AND id = $2
            "#,
        )
        .bind(self.event_id)
        .bind(rsvp.id)
        .bind(RsvpStatusDb::from(rsvp.status))
        .bind(count_to_db(rsvp.number_of_guests)?)
        .bind(&rsvp.notes)
        .bind(rsvp.sequence)
        .bind(rsvp.response_date)
        .bind(rsvp.updated_at)
        .execute(&mut *self.tx)
        .await;
        timer.record();

        if result?.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let timer = QueryTimer::new("commit_rsvp_transaction");
        let PgRsvpTransaction { tx, event_id, .. } = *self;
        let result = tx.commit().await;
        timer.record();

        if let Err(err) = &result {
            debug!(event_id = %event_id, error = %err, "RSVP transaction commit failed");
        }
        Ok(result?)
    }
}
