//! Stock action dispatchers

use crate::{ActionDispatcher, ActorId, DispatchError, VelocityAction};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Dispatcher that only logs decisions
pub struct TracingDispatcher;

#[async_trait]
impl ActionDispatcher for TracingDispatcher {
    async fn block(&self, actor_id: &ActorId, reason: &str) -> Result<(), DispatchError> {
        tracing::warn!(actor_id = %actor_id, reason = %reason, "Block requested");
        Ok(())
    }

    async fn flag(&self, actor_id: &ActorId, reason: &str) -> Result<(), DispatchError> {
        tracing::info!(actor_id = %actor_id, reason = %reason, "Flag requested");
        Ok(())
    }
}

/// A dispatched decision
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchRecord {
    pub actor_id: ActorId,
    pub action: VelocityAction,
    pub reason: Box<str>,
}

/// In-memory dispatcher for testing
pub struct RecordingDispatcher {
    records: Mutex<Vec<DispatchRecord>>,
    fail: AtomicBool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Make subsequent calls record the attempt and then fail
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<DispatchRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn count(&self, action: VelocityAction) -> usize {
        self.records
            .lock()
            .map(|r| r.iter().filter(|d| d.action == action).count())
            .unwrap_or(0)
    }

    fn push(&self, actor_id: &ActorId, action: VelocityAction, reason: &str) -> Result<(), DispatchError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| DispatchError::Failed(e.to_string().into()))?;
        records.push(DispatchRecord {
            actor_id: actor_id.clone(),
            action,
            reason: reason.into(),
        });
        if self.fail.load(Ordering::SeqCst) {
            return Err(DispatchError::Failed("dispatcher unavailable".into()));
        }
        Ok(())
    }
}

impl Default for RecordingDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionDispatcher for RecordingDispatcher {
    async fn block(&self, actor_id: &ActorId, reason: &str) -> Result<(), DispatchError> {
        self.push(actor_id, VelocityAction::Block, reason)
    }

    async fn flag(&self, actor_id: &ActorId, reason: &str) -> Result<(), DispatchError> {
        self.push(actor_id, VelocityAction::Flag, reason)
    }
}
