//! Actor identity and history record types

use serde::{Deserialize, Serialize};

/// Opaque identifier of a rate-limited entity (an affiliate, a referrer, ...)
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub Box<str>);

impl ActorId {
    /// Create a new actor ID
    pub fn new(id: impl Into<Box<str>>) -> Self {
        Self(id.into())
    }

    /// Get the raw ID value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ActorId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Debug for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single observed event for an actor.
///
/// Records are created by the history store and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicationRecord {
    /// Actor the event belongs to
    pub actor_id: ActorId,
    /// When the event happened (millis since UNIX epoch)
    pub timestamp_millis: u64,
}

impl IndicationRecord {
    pub(crate) fn new(actor_id: ActorId, timestamp_millis: u64) -> Self {
        Self {
            actor_id,
            timestamp_millis,
        }
    }
}
