//! In-memory store for tests and embedding.
//!
//! Each event is a partition with a version counter. A transaction snapshots
//! the partition and the event's settings at `begin`, buffers its writes, and
//! on commit fails with [`StoreError::Conflict`] if any other write landed on
//! the same event, or the event's settings changed, in the meantime.
//! Partitions never contend with each other.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::{EventLookup, RsvpStore, RsvpTransaction, StoreError, MEMBER_UNIQUE_CONSTRAINT};
use crate::models::{EventSettings, Rsvp, RsvpStatus};

#[derive(Debug, Default, Clone)]
struct Partition {
    version: u64,
    rsvps: Vec<Rsvp>,
    last_timestamp: Option<DateTime<Utc>>,
}

type Partitions = Arc<Mutex<HashMap<Uuid, Partition>>>;

fn lock(partitions: &Partitions) -> MutexGuard<'_, HashMap<Uuid, Partition>> {
    partitions.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory [`RsvpStore`] with per-event optimistic concurrency.
///
/// Transactions read event settings from the attached [`InMemoryEventLookup`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryRsvpStore {
    partitions: Partitions,
    events: InMemoryEventLookup,
    injected_conflicts: Arc<AtomicU32>,
}

impl InMemoryRsvpStore {
    /// A store with its own, initially empty, event directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose transactions read settings from `events`.
    pub fn with_events(events: InMemoryEventLookup) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn events(&self) -> &InMemoryEventLookup {
        &self.events
    }

    /// Make the next `count` committing transactions fail with a conflict.
    pub fn fail_next_commits(&self, count: u32) {
        self.injected_conflicts.store(count, Ordering::SeqCst);
    }

    /// Number of RSVPs stored for an event.
    pub fn len(&self, event_id: Uuid) -> usize {
        lock(&self.partitions)
            .get(&event_id)
            .map(|p| p.rsvps.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, event_id: Uuid) -> bool {
        self.len(event_id) == 0
    }
}

#[async_trait]
impl RsvpStore for InMemoryRsvpStore {
    async fn begin(&self, event_id: Uuid) -> Result<Box<dyn RsvpTransaction>, StoreError> {
        let guard = lock(&self.partitions);
        let partition = guard.get(&event_id).cloned().unwrap_or_default();
        let event = self.events.snapshot(event_id);

        let now = Utc::now();
        let timestamp = match partition.last_timestamp {
            Some(last) if last >= now => last + Duration::microseconds(1),
            _ => now,
        };

        Ok(Box::new(InMemoryTransaction {
            partitions: Arc::clone(&self.partitions),
            events: self.events.clone(),
            injected_conflicts: Arc::clone(&self.injected_conflicts),
            event_id,
            event,
            base_version: partition.version,
            view: partition.rsvps,
            writes: Vec::new(),
            timestamp,
        }))
    }

    async fn find_by_id(&self, event_id: Uuid, rsvp_id: Uuid) -> Result<Option<Rsvp>, StoreError> {
        Ok(lock(&self.partitions)
            .get(&event_id)
            .and_then(|p| p.rsvps.iter().find(|r| r.id == rsvp_id).cloned()))
    }

    async fn find_by_member(
        &self,
        event_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Rsvp>, StoreError> {
        Ok(lock(&self.partitions)
            .get(&event_id)
            .and_then(|p| p.rsvps.iter().find(|r| r.member_id == member_id).cloned()))
    }

    async fn list_by_event(
        &self,
        event_id: Uuid,
        status: Option<RsvpStatus>,
    ) -> Result<Vec<Rsvp>, StoreError> {
        let mut rsvps: Vec<Rsvp> = lock(&self.partitions)
            .get(&event_id)
            .map(|p| {
                p.rsvps
                    .iter()
                    .filter(|r| status.map_or(true, |s| r.status == s))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rsvps.sort_by_key(|r| (r.sequence, r.created_at, r.id));
        Ok(rsvps)
    }

    async fn list_by_member(&self, member_id: Uuid) -> Result<Vec<Rsvp>, StoreError> {
        let mut rsvps: Vec<Rsvp> = lock(&self.partitions)
            .values()
            .flat_map(|p| p.rsvps.iter().filter(|r| r.member_id == member_id).cloned())
            .collect();
        rsvps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rsvps)
    }

    async fn delete(&self, event_id: Uuid, rsvp_id: Uuid) -> Result<bool, StoreError> {
        let mut guard = lock(&self.partitions);
        let Some(partition) = guard.get_mut(&event_id) else {
            return Ok(false);
        };
        let before = partition.rsvps.len();
        partition.rsvps.retain(|r| r.id != rsvp_id);
        let deleted = partition.rsvps.len() != before;
        if deleted {
            partition.version += 1;
        }
        Ok(deleted)
    }

    async fn events_with_waitlist(&self) -> Result<Vec<Uuid>, StoreError> {
        let mut ids: Vec<Uuid> = lock(&self.partitions)
            .iter()
            .filter(|(_, p)| p.rsvps.iter().any(Rsvp::is_waitlisted))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// Transaction over one in-memory partition.
struct InMemoryTransaction {
    partitions: Partitions,
    events: InMemoryEventLookup,
    injected_conflicts: Arc<AtomicU32>,
    event_id: Uuid,
    /// Event settings as of begin.
    event: Option<EventSettings>,
    base_version: u64,
    /// Snapshot taken at begin with this transaction's writes applied.
    view: Vec<Rsvp>,
    writes: Vec<Rsvp>,
    timestamp: DateTime<Utc>,
}

impl InMemoryTransaction {
    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RsvpTransaction for InMemoryTransaction {
    fn event_id(&self) -> Uuid {
        self.event_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    async fn load_event(&mut self) -> Result<Option<EventSettings>, StoreError> {
        Ok(self.event.clone())
    }

    async fn load_rsvps(&mut self) -> Result<Vec<Rsvp>, StoreError> {
        Ok(self.view.clone())
    }

    async fn insert(&mut self, rsvp: &Rsvp) -> Result<(), StoreError> {
        if self
            .view
            .iter()
            .any(|r| r.member_id == rsvp.member_id || r.id == rsvp.id)
        {
            return Err(StoreError::UniqueViolation(
                MEMBER_UNIQUE_CONSTRAINT.to_string(),
            ));
        }
        self.view.push(rsvp.clone());
        self.writes.push(rsvp.clone());
        Ok(())
    }

    async fn update(&mut self, rsvp: &Rsvp) -> Result<(), StoreError> {
        let slot = self
            .view
            .iter_mut()
            .find(|r| r.id == rsvp.id)
            .ok_or(StoreError::NotFound)?;
        *slot = rsvp.clone();
        self.writes.push(rsvp.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if self.writes.is_empty() {
            return Ok(());
        }

        let mut guard = lock(&self.partitions);
        let partition = guard.entry(self.event_id).or_default();

        if partition.version != self.base_version {
            return Err(StoreError::Conflict(format!(
                "event {} changed since transaction began",
                self.event_id
            )));
        }
        if self.events.snapshot(self.event_id) != self.event {
            return Err(StoreError::Conflict(format!(
                "settings of event {} changed since transaction began",
                self.event_id
            )));
        }
        if self.take_injected_conflict() {
            return Err(StoreError::Conflict("injected conflict".to_string()));
        }

        for write in &self.writes {
            match partition.rsvps.iter_mut().find(|r| r.id == write.id) {
                Some(existing) => *existing = write.clone(),
                None => partition.rsvps.push(write.clone()),
            }
        }
        partition.version += 1;
        partition.last_timestamp = Some(self.timestamp);
        Ok(())
    }
}

/// In-memory [`EventLookup`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventLookup {
    events: Arc<Mutex<HashMap<Uuid, EventSettings>>>,
}

impl InMemoryEventLookup {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self, event_id: Uuid) -> Option<EventSettings> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event_id)
            .cloned()
    }

    /// Insert or replace an event.
    pub fn upsert(&self, event: EventSettings) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(event.id, event);
    }

    /// Change an event's capacity, returning false if the event is unknown.
    pub fn set_capacity(&self, event_id: Uuid, capacity: Option<u32>) -> bool {
        let mut guard = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.get_mut(&event_id) {
            Some(event) => {
                event.capacity = capacity;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, event_id: Uuid) -> Option<EventSettings> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&event_id)
    }
}

#[async_trait]
impl EventLookup for InMemoryEventLookup {
    async fn get_event(&self, event_id: Uuid) -> Result<Option<EventSettings>, StoreError> {
        Ok(self.snapshot(event_id))
    }
}
