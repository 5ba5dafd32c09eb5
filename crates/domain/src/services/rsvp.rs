//! RSVP admission service.
//!
//! Every capacity-affecting write runs as one store transaction scoped to the
//! event: read the event's settings and RSVPs, decide, write, commit. When the store aborts
//! the transaction because of a concurrent writer, the whole read-decide-write
//! is re-run under the configured [`RetryPolicy`]. No state read in a failed
//! attempt is reused.
//!
//! Waitlist promotion never happens implicitly here; see
//! [`RsvpService::process_waitlist`].

use metrics::counter;
use shared::RetryPolicy;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::capacity::{check_capacity, AdmissionPolicy, CapacityCheck, OverflowAction};
use crate::error::RsvpError;
use crate::models::{CreateRsvpRequest, EventSettings, Rsvp, RsvpStatus, UpdateRsvpRequest};
use crate::store::{EventLookup, RsvpStore, StoreError};

/// Admission-control entry point for RSVPs.
#[derive(Clone)]
pub struct RsvpService {
    pub(crate) events: Arc<dyn EventLookup>,
    pub(crate) store: Arc<dyn RsvpStore>,
    retry: RetryPolicy,
    policy: AdmissionPolicy,
}

impl RsvpService {
    /// Creates a new RsvpService with the default retry and admission policies.
    pub fn new(events: Arc<dyn EventLookup>, store: Arc<dyn RsvpStore>) -> Self {
        Self {
            events,
            store,
            retry: RetryPolicy::default(),
            policy: AdmissionPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_admission_policy(mut self, policy: AdmissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Create an RSVP for `member_id`.
    ///
    /// A `yes` that does not fit is stored as `waitlist` when the event has a
    /// waitlist, and rejected with `CapacityExceeded` otherwise. Asking for
    /// `waitlist` directly on an event without one fails with
    /// `WaitlistUnavailable`. The returned record carries the status actually
    /// persisted.
    #[instrument(skip_all, fields(event_id = %event_id, member_id = %member_id))]
    pub async fn create_rsvp(
        &self,
        event_id: Uuid,
        member_id: Uuid,
        request: CreateRsvpRequest,
    ) -> Result<Rsvp, RsvpError> {
        request.validate()?;

        let rsvp = self
            .retry_on_conflict("create_rsvp", event_id, || {
                self.try_create(event_id, member_id, &request)
            })
            .await
            .inspect_err(|err| {
                if matches!(err, RsvpError::CapacityExceeded { .. }) {
                    counter!("rsvp_admissions_total", "outcome" => "rejected").increment(1);
                }
            })?;

        counter!("rsvp_admissions_total", "outcome" => rsvp.status.as_str()).increment(1);

        info!(
            rsvp_id = %rsvp.id,
            requested = %request.status,
            status = %rsvp.status,
            party_size = rsvp.party_size(),
            "RSVP created"
        );
        Ok(rsvp)
    }

    async fn try_create(
        &self,
        event_id: Uuid,
        member_id: Uuid,
        request: &CreateRsvpRequest,
    ) -> Result<Rsvp, RsvpError> {
        let mut tx = self.store.begin(event_id).await?;
        let event = tx
            .load_event()
            .await?
            .ok_or(RsvpError::EventNotFound(event_id))?;
        if !event.is_active {
            return Err(RsvpError::EventNotActive(event_id));
        }
        if request.status == RsvpStatus::Waitlist && !event.waitlist_applies() {
            return Err(RsvpError::WaitlistUnavailable(event_id));
        }

        let existing = tx.load_rsvps().await?;

        if existing.iter().any(|r| r.member_id == member_id) {
            return Err(RsvpError::DuplicateRsvp {
                event_id,
                member_id,
            });
        }

        let mut status = request.status;
        if status == RsvpStatus::Yes {
            if let CapacityCheck::Exceeds {
                requested,
                available,
            } = check_capacity(&event, &existing, None, request.party_size())
            {
                match self.policy.on_create_overflow(&event) {
                    OverflowAction::Waitlist => status = RsvpStatus::Waitlist,
                    OverflowAction::Reject => {
                        return Err(RsvpError::CapacityExceeded {
                            event_id,
                            requested,
                            available,
                        })
                    }
                }
            }
        }

        let now = tx.timestamp();
        let rsvp = Rsvp {
            id: Uuid::new_v4(),
            event_id,
            member_id,
            status,
            number_of_guests: request.number_of_guests,
            notes: request.notes.clone(),
            sequence: next_sequence(&existing),
            response_date: now,
            created_at: now,
            updated_at: now,
        };

        tx.insert(&rsvp)
            .await
            .map_err(|e| duplicate_or(e, event_id, member_id))?;
        tx.commit()
            .await
            .map_err(|e| duplicate_or(e, event_id, member_id))?;
        Ok(rsvp)
    }

    /// Apply a partial update to an RSVP.
    ///
    /// Upgrading to `yes`, or adding guests to a `yes`, re-checks capacity with
    /// this RSVP excluded from the committed sum. Every other change is applied
    /// unconditionally. On overflow the record is left untouched and
    /// `CapacityExceeded` is returned, unless the admission policy waitlists
    /// upgrades. Moving into `waitlist` requires the event to have one.
    #[instrument(skip_all, fields(event_id = %event_id, rsvp_id = %rsvp_id))]
    pub async fn update_rsvp(
        &self,
        event_id: Uuid,
        rsvp_id: Uuid,
        request: UpdateRsvpRequest,
    ) -> Result<Rsvp, RsvpError> {
        request.validate()?;

        let (previous, rsvp) = self
            .retry_on_conflict("update_rsvp", event_id, || {
                self.try_update(event_id, rsvp_id, &request)
            })
            .await?;

        info!(
            member_id = %rsvp.member_id,
            from = %previous,
            status = %rsvp.status,
            party_size = rsvp.party_size(),
            "RSVP updated"
        );
        Ok(rsvp)
    }

    async fn try_update(
        &self,
        event_id: Uuid,
        rsvp_id: Uuid,
        request: &UpdateRsvpRequest,
    ) -> Result<(RsvpStatus, Rsvp), RsvpError> {
        let mut tx = self.store.begin(event_id).await?;
        let event = tx
            .load_event()
            .await?
            .ok_or(RsvpError::EventNotFound(event_id))?;
        let existing = tx.load_rsvps().await?;
        let current = existing
            .iter()
            .find(|r| r.id == rsvp_id)
            .cloned()
            .ok_or(RsvpError::RsvpNotFound(rsvp_id))?;

        let mut updated = current.clone();
        if let Some(status) = request.status {
            updated.status = status;
        }
        if let Some(guests) = request.number_of_guests {
            updated.number_of_guests = guests;
        }
        if let Some(notes) = &request.notes {
            updated.notes = Some(notes.clone());
        }

        if updated.status == RsvpStatus::Waitlist
            && current.status != RsvpStatus::Waitlist
            && !event.waitlist_applies()
        {
            return Err(RsvpError::WaitlistUnavailable(event_id));
        }

        let upgrading = updated.status == RsvpStatus::Yes && current.status != RsvpStatus::Yes;
        let growing = updated.status == RsvpStatus::Yes
            && current.status == RsvpStatus::Yes
            && updated.number_of_guests > current.number_of_guests;

        if upgrading || growing {
            if !event.is_active {
                return Err(RsvpError::EventNotActive(event_id));
            }

            if let CapacityCheck::Exceeds {
                requested,
                available,
            } = check_capacity(&event, &existing, Some(rsvp_id), updated.party_size())
            {
                match self.policy.on_update_overflow(&event, current.status) {
                    OverflowAction::Waitlist => updated.status = RsvpStatus::Waitlist,
                    OverflowAction::Reject => {
                        return Err(RsvpError::CapacityExceeded {
                            event_id,
                            requested,
                            available,
                        })
                    }
                }
            }
        }

        // Entering the waitlist puts the entry at the back of the queue.
        if updated.status == RsvpStatus::Waitlist && current.status != RsvpStatus::Waitlist {
            updated.sequence = next_sequence(&existing);
        }

        let now = tx.timestamp();
        if updated.status != current.status {
            updated.response_date = now;
        }
        updated.updated_at = now;

        tx.update(&updated).await.map_err(|e| match e {
            StoreError::NotFound => RsvpError::RsvpNotFound(rsvp_id),
            other => other.into(),
        })?;
        tx.commit().await?;
        Ok((current.status, updated))
    }

    /// Withdraw an RSVP by setting its status to `no`.
    ///
    /// The record is kept. Freed seats are not handed to the waitlist until
    /// [`RsvpService::process_waitlist`] is called.
    pub async fn withdraw_rsvp(&self, event_id: Uuid, rsvp_id: Uuid) -> Result<Rsvp, RsvpError> {
        self.update_rsvp(event_id, rsvp_id, UpdateRsvpRequest::status(RsvpStatus::No))
            .await
    }

    /// Administrative hard delete.
    #[instrument(skip_all, fields(event_id = %event_id, rsvp_id = %rsvp_id))]
    pub async fn delete_rsvp(&self, event_id: Uuid, rsvp_id: Uuid) -> Result<(), RsvpError> {
        if !self.store.delete(event_id, rsvp_id).await? {
            return Err(RsvpError::RsvpNotFound(rsvp_id));
        }
        info!("RSVP deleted");
        Ok(())
    }

    /// Event settings for read-only queries. Admission reads them through the
    /// transaction instead.
    pub(crate) async fn require_event(&self, event_id: Uuid) -> Result<EventSettings, RsvpError> {
        self.events
            .get_event(event_id)
            .await?
            .ok_or(RsvpError::EventNotFound(event_id))
    }

    /// Run `attempt` until it succeeds, fails with a non-conflict error, or the
    /// retry budget is spent.
    pub(crate) async fn retry_on_conflict<T, F, Fut>(
        &self,
        operation: &'static str,
        event_id: Uuid,
        mut attempt: F,
    ) -> Result<T, RsvpError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RsvpError>>,
    {
        let mut retries = 0u32;
        loop {
            match attempt().await {
                Err(RsvpError::Store(StoreError::Conflict(reason))) => {
                    if !self.retry.should_retry(retries) {
                        counter!("rsvp_conflicts_exhausted_total", "operation" => operation)
                            .increment(1);
                        warn!(
                            operation,
                            event_id = %event_id,
                            attempts = retries + 1,
                            reason = %reason,
                            "Transaction conflict persisted, giving up"
                        );
                        return Err(RsvpError::TransientConflict {
                            event_id,
                            attempts: retries + 1,
                        });
                    }

                    let delay = self.retry.delay_for_retry(retries);
                    debug!(
                        operation,
                        event_id = %event_id,
                        retry = retries + 1,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "Transaction conflict, retrying"
                    );
                    counter!("rsvp_conflict_retries_total", "operation" => operation).increment(1);
                    tokio::time::sleep(delay).await;
                    retries += 1;
                }
                other => return other,
            }
        }
    }
}

/// Next arrival number for an event: one past the highest seen.
pub(crate) fn next_sequence(rsvps: &[Rsvp]) -> i64 {
    rsvps.iter().map(|r| r.sequence).max().unwrap_or(0) + 1
}

fn duplicate_or(err: StoreError, event_id: Uuid, member_id: Uuid) -> RsvpError {
    match err {
        StoreError::UniqueViolation(_) => RsvpError::DuplicateRsvp {
            event_id,
            member_id,
        },
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryEventLookup, InMemoryRsvpStore};
    use std::time::Duration;

    struct Fixture {
        events: InMemoryEventLookup,
        store: InMemoryRsvpStore,
        service: RsvpService,
    }

    fn fixture(event: EventSettings) -> Fixture {
        let events = InMemoryEventLookup::new();
        events.upsert(event);
        let store = InMemoryRsvpStore::with_events(events.clone());
        let service = RsvpService::new(Arc::new(events.clone()), Arc::new(store.clone()))
            .with_retry_policy(
                RetryPolicy::default()
                    .with_delays(Duration::from_millis(1), Duration::from_millis(5))
                    .with_jitter(false),
            );
        Fixture {
            events,
            store,
            service,
        }
    }

    async fn fill(service: &RsvpService, event_id: Uuid, count: usize) -> Vec<Rsvp> {
        let mut created = Vec::new();
        for _ in 0..count {
            created.push(
                service
                    .create_rsvp(event_id, Uuid::new_v4(), CreateRsvpRequest::new(RsvpStatus::Yes))
                    .await
                    .unwrap(),
            );
        }
        created
    }

    #[test]
    fn test_next_sequence() {
        assert_eq!(next_sequence(&[]), 1);
    }

    #[tokio::test]
    async fn test_create_assigns_identity_and_timestamps() {
        let event = EventSettings::unlimited(Uuid::new_v4());
        let f = fixture(event.clone());
        let member_id = Uuid::new_v4();

        let rsvp = f
            .service
            .create_rsvp(
                event.id,
                member_id,
                CreateRsvpRequest::new(RsvpStatus::Maybe)
                    .with_guests(2)
                    .with_notes("bringing dessert"),
            )
            .await
            .unwrap();

        assert_eq!(rsvp.event_id, event.id);
        assert_eq!(rsvp.member_id, member_id);
        assert_eq!(rsvp.status, RsvpStatus::Maybe);
        assert_eq!(rsvp.number_of_guests, 2);
        assert_eq!(rsvp.notes.as_deref(), Some("bringing dessert"));
        assert_eq!(rsvp.sequence, 1);
        assert_eq!(rsvp.created_at, rsvp.updated_at);
        assert_eq!(rsvp.created_at, rsvp.response_date);
        assert_eq!(f.store.len(event.id), 1);
    }

    #[tokio::test]
    async fn test_create_unknown_event() {
        let f = fixture(EventSettings::unlimited(Uuid::new_v4()));
        let missing = Uuid::new_v4();
        let err = f
            .service
            .create_rsvp(missing, Uuid::new_v4(), CreateRsvpRequest::new(RsvpStatus::Yes))
            .await
            .unwrap_err();
        assert!(matches!(err, RsvpError::EventNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_create_inactive_event() {
        let mut event = EventSettings::unlimited(Uuid::new_v4());
        event.is_active = false;
        let f = fixture(event.clone());

        let err = f
            .service
            .create_rsvp(event.id, Uuid::new_v4(), CreateRsvpRequest::new(RsvpStatus::Yes))
            .await
            .unwrap_err();
        assert!(matches!(err, RsvpError::EventNotActive(_)));
        assert!(f.store.is_empty(event.id));
    }

    #[tokio::test]
    async fn test_create_duplicate_member() {
        let event = EventSettings::unlimited(Uuid::new_v4());
        let f = fixture(event.clone());
        let member_id = Uuid::new_v4();

        f.service
            .create_rsvp(event.id, member_id, CreateRsvpRequest::new(RsvpStatus::Maybe))
            .await
            .unwrap();
        let err = f
            .service
            .create_rsvp(event.id, member_id, CreateRsvpRequest::new(RsvpStatus::Yes))
            .await
            .unwrap_err();

        assert!(matches!(err, RsvpError::DuplicateRsvp { member_id: m, .. } if m == member_id));
        assert_eq!(f.store.len(event.id), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_request() {
        let event = EventSettings::unlimited(Uuid::new_v4());
        let f = fixture(event.clone());

        let err = f
            .service
            .create_rsvp(
                event.id,
                Uuid::new_v4(),
                CreateRsvpRequest::new(RsvpStatus::Yes).with_guests(51),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RsvpError::Validation(_)));
        assert!(f.store.is_empty(event.id));
    }

    #[tokio::test]
    async fn test_create_counts_guests_against_capacity() {
        let event = EventSettings::with_capacity(Uuid::new_v4(), 4, true);
        let f = fixture(event.clone());

        let family = f
            .service
            .create_rsvp(
                event.id,
                Uuid::new_v4(),
                CreateRsvpRequest::new(RsvpStatus::Yes).with_guests(2),
            )
            .await
            .unwrap();
        assert_eq!(family.status, RsvpStatus::Yes);

        let couple = f
            .service
            .create_rsvp(
                event.id,
                Uuid::new_v4(),
                CreateRsvpRequest::new(RsvpStatus::Yes).with_guests(1),
            )
            .await
            .unwrap();
        assert_eq!(couple.status, RsvpStatus::Waitlist);

        let single = f
            .service
            .create_rsvp(event.id, Uuid::new_v4(), CreateRsvpRequest::new(RsvpStatus::Yes))
            .await
            .unwrap();
        assert_eq!(single.status, RsvpStatus::Yes);
    }

    #[tokio::test]
    async fn test_create_non_yes_ignores_capacity() {
        let event = EventSettings::with_capacity(Uuid::new_v4(), 1, false);
        let f = fixture(event.clone());
        fill(&f.service, event.id, 1).await;

        for status in [RsvpStatus::Maybe, RsvpStatus::No] {
            let rsvp = f
                .service
                .create_rsvp(event.id, Uuid::new_v4(), CreateRsvpRequest::new(status))
                .await
                .unwrap();
            assert_eq!(rsvp.status, status);
        }
    }

    #[tokio::test]
    async fn test_update_applies_non_capacity_changes() {
        let event = EventSettings::with_capacity(Uuid::new_v4(), 1, false);
        let f = fixture(event.clone());
        fill(&f.service, event.id, 1).await;

        let maybe = f
            .service
            .create_rsvp(event.id, Uuid::new_v4(), CreateRsvpRequest::new(RsvpStatus::Maybe))
            .await
            .unwrap();

        let updated = f
            .service
            .update_rsvp(
                event.id,
                maybe.id,
                UpdateRsvpRequest {
                    status: None,
                    number_of_guests: Some(6),
                    notes: Some("might bring the kids".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, RsvpStatus::Maybe);
        assert_eq!(updated.number_of_guests, 6);
        assert_eq!(updated.response_date, maybe.response_date);
        assert!(updated.updated_at > maybe.updated_at);
    }

    #[tokio::test]
    async fn test_update_growing_confirmed_party_excludes_itself() {
        let event = EventSettings::with_capacity(Uuid::new_v4(), 5, true);
        let f = fixture(event.clone());
        let mine = fill(&f.service, event.id, 2).await.remove(0);

        // 1 other + (3 guests + 1) = 5 fits
        let grown = f
            .service
            .update_rsvp(event.id, mine.id, UpdateRsvpRequest::guests(3))
            .await
            .unwrap();
        assert_eq!(grown.status, RsvpStatus::Yes);
        assert_eq!(grown.number_of_guests, 3);

        let err = f
            .service
            .update_rsvp(event.id, mine.id, UpdateRsvpRequest::guests(4))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RsvpError::CapacityExceeded {
                requested: 5,
                available: 4,
                ..
            }
        ));

        let stored = f.store.find_by_id(event.id, mine.id).await.unwrap().unwrap();
        assert_eq!(stored, grown);
    }

    #[tokio::test]
    async fn test_update_upgrade_rejected_when_full() {
        let event = EventSettings::with_capacity(Uuid::new_v4(), 2, true);
        let f = fixture(event.clone());
        fill(&f.service, event.id, 2).await;

        let maybe = f
            .service
            .create_rsvp(event.id, Uuid::new_v4(), CreateRsvpRequest::new(RsvpStatus::Maybe))
            .await
            .unwrap();

        let err = f
            .service
            .update_rsvp(event.id, maybe.id, UpdateRsvpRequest::status(RsvpStatus::Yes))
            .await
            .unwrap_err();
        assert!(matches!(err, RsvpError::CapacityExceeded { .. }));

        let stored = f.store.find_by_id(event.id, maybe.id).await.unwrap().unwrap();
        assert_eq!(stored, maybe);
    }

    #[tokio::test]
    async fn test_update_upgrade_waitlisted_when_policy_allows() {
        let event = EventSettings::with_capacity(Uuid::new_v4(), 2, true);
        let f = fixture(event.clone());
        let service = f.service.clone().with_admission_policy(AdmissionPolicy {
            waitlist_on_upgrade: true,
        });
        fill(&service, event.id, 2).await;

        let maybe = service
            .create_rsvp(event.id, Uuid::new_v4(), CreateRsvpRequest::new(RsvpStatus::Maybe))
            .await
            .unwrap();
        let updated = service
            .update_rsvp(event.id, maybe.id, UpdateRsvpRequest::status(RsvpStatus::Yes))
            .await
            .unwrap();

        assert_eq!(updated.status, RsvpStatus::Waitlist);
        assert!(updated.sequence > maybe.sequence);
    }

    #[tokio::test]
    async fn test_update_upgrade_on_inactive_event() {
        let event = EventSettings::with_capacity(Uuid::new_v4(), 10, false);
        let f = fixture(event.clone());
        let maybe = f
            .service
            .create_rsvp(event.id, Uuid::new_v4(), CreateRsvpRequest::new(RsvpStatus::Maybe))
            .await
            .unwrap();

        let mut cancelled = event.clone();
        cancelled.is_active = false;
        f.events.upsert(cancelled);

        let err = f
            .service
            .update_rsvp(event.id, maybe.id, UpdateRsvpRequest::status(RsvpStatus::Yes))
            .await
            .unwrap_err();
        assert!(matches!(err, RsvpError::EventNotActive(_)));

        // Withdrawing from a cancelled event is still allowed.
        let withdrawn = f.service.withdraw_rsvp(event.id, maybe.id).await.unwrap();
        assert_eq!(withdrawn.status, RsvpStatus::No);
    }

    #[tokio::test]
    async fn test_update_missing_rsvp() {
        let event = EventSettings::unlimited(Uuid::new_v4());
        let f = fixture(event.clone());
        let missing = Uuid::new_v4();

        let err = f
            .service
            .update_rsvp(event.id, missing, UpdateRsvpRequest::status(RsvpStatus::No))
            .await
            .unwrap_err();
        assert!(matches!(err, RsvpError::RsvpNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_moving_into_waitlist_requeues_at_back() {
        let event = EventSettings::with_capacity(Uuid::new_v4(), 1, true);
        let f = fixture(event.clone());
        fill(&f.service, event.id, 1).await;

        let maybe = f
            .service
            .create_rsvp(event.id, Uuid::new_v4(), CreateRsvpRequest::new(RsvpStatus::Maybe))
            .await
            .unwrap();
        let waiting = f
            .service
            .create_rsvp(event.id, Uuid::new_v4(), CreateRsvpRequest::new(RsvpStatus::Yes))
            .await
            .unwrap();
        assert_eq!(waiting.status, RsvpStatus::Waitlist);

        let requeued = f
            .service
            .update_rsvp(event.id, maybe.id, UpdateRsvpRequest::status(RsvpStatus::Waitlist))
            .await
            .unwrap();
        assert!(requeued.sequence > waiting.sequence);
    }

    #[tokio::test]
    async fn test_withdraw_keeps_record() {
        let event = EventSettings::with_capacity(Uuid::new_v4(), 3, true);
        let f = fixture(event.clone());
        let rsvp = fill(&f.service, event.id, 1).await.remove(0);

        let withdrawn = f.service.withdraw_rsvp(event.id, rsvp.id).await.unwrap();
        assert_eq!(withdrawn.status, RsvpStatus::No);
        assert!(withdrawn.response_date > rsvp.response_date);
        assert_eq!(f.store.len(event.id), 1);
    }

    #[tokio::test]
    async fn test_delete_rsvp() {
        let event = EventSettings::unlimited(Uuid::new_v4());
        let f = fixture(event.clone());
        let rsvp = fill(&f.service, event.id, 1).await.remove(0);

        f.service.delete_rsvp(event.id, rsvp.id).await.unwrap();
        assert!(f.store.is_empty(event.id));

        let err = f.service.delete_rsvp(event.id, rsvp.id).await.unwrap_err();
        assert!(matches!(err, RsvpError::RsvpNotFound(_)));
    }

    #[tokio::test]
    async fn test_conflict_is_retried() {
        let event = EventSettings::with_capacity(Uuid::new_v4(), 5, false);
        let f = fixture(event.clone());
        f.store.fail_next_commits(2);

        let rsvp = f
            .service
            .create_rsvp(event.id, Uuid::new_v4(), CreateRsvpRequest::new(RsvpStatus::Yes))
            .await
            .unwrap();
        assert_eq!(rsvp.status, RsvpStatus::Yes);
        assert_eq!(f.store.len(event.id), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_transient_conflict() {
        let event = EventSettings::with_capacity(Uuid::new_v4(), 5, false);
        let f = fixture(event.clone());
        let service = f
            .service
            .clone()
            .with_retry_policy(RetryPolicy::no_retry().with_max_retries(2).with_jitter(false));
        f.store.fail_next_commits(10);

        let err = service
            .create_rsvp(event.id, Uuid::new_v4(), CreateRsvpRequest::new(RsvpStatus::Yes))
            .await
            .unwrap_err();

        assert!(matches!(err, RsvpError::TransientConflict { attempts: 3, .. }));
        assert!(err.is_retryable());
        assert!(f.store.is_empty(event.id));
    }
}
