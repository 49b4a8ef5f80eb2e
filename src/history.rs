//! Per-actor event history with bounded retention

use crate::{ActorId, Clock, IndicationRecord};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// History storage trait
pub trait HistoryStore: Send + Sync + 'static {
    /// Append one record and purge the actor's expired records.
    fn record(&self, actor_id: &ActorId, timestamp_millis: u64);

    /// Count records newer than `cutoff_millis`. Never mutates.
    fn count_since(&self, actor_id: &ActorId, cutoff_millis: u64) -> usize;

    /// Purge expired records for all actors, dropping empty logs.
    /// Returns the number of records removed.
    fn purge_expired(&self) -> usize;

    /// Number of actors with a retained log
    fn actor_count(&self) -> usize;

    /// Drop all history
    fn clear(&self);
}

/// Sharded in-memory history.
///
/// Each actor's log lives behind its shard's lock; the lock is only held for
/// the synchronous append/prune, so callers for different actors proceed
/// independently.
pub struct InMemoryHistory {
    logs: DashMap<ActorId, VecDeque<IndicationRecord>>,
    retention_millis: u64,
    clock: Arc<dyn Clock>,
}

impl InMemoryHistory {
    pub fn new(retention: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            logs: DashMap::new(),
            retention_millis: retention.as_millis() as u64,
            clock,
        }
    }

    /// Copy of an actor's retained records, in insertion order
    pub fn records(&self, actor_id: &ActorId) -> Vec<IndicationRecord> {
        self.logs
            .get(actor_id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn horizon(&self, now_millis: u64) -> u64 {
        now_millis.saturating_sub(self.retention_millis)
    }
}

impl HistoryStore for InMemoryHistory {
    fn record(&self, actor_id: &ActorId, timestamp_millis: u64) {
        let horizon = self.horizon(self.clock.now_millis());
        let mut log = self.logs.entry(actor_id.clone()).or_default();
        log.push_back(IndicationRecord::new(actor_id.clone(), timestamp_millis));
        // Timestamps are not assumed monotonic, so filter the whole log.
        log.retain(|r| r.timestamp_millis > horizon);
    }

    fn count_since(&self, actor_id: &ActorId, cutoff_millis: u64) -> usize {
        let cutoff = cutoff_millis.max(self.horizon(self.clock.now_millis()));
        self.logs
            .get(actor_id)
            .map(|log| log.iter().filter(|r| r.timestamp_millis > cutoff).count())
            .unwrap_or(0)
    }

    fn purge_expired(&self) -> usize {
        let horizon = self.horizon(self.clock.now_millis());
        let mut removed = 0;
        self.logs.retain(|_, log| {
            let before = log.len();
            log.retain(|r| r.timestamp_millis > horizon);
            removed += before - log.len();
            !log.is_empty()
        });
        removed
    }

    fn actor_count(&self) -> usize {
        self.logs.len()
    }

    fn clear(&self) {
        self.logs.clear();
    }
}
