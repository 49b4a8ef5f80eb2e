//! Engine statistics

use crate::VelocityAction;
use std::sync::atomic::{AtomicU64, Ordering};

/// Engine-wide counters
pub struct EngineStats {
    pub events_recorded: AtomicU64,
    pub verdicts_allow: AtomicU64,
    pub verdicts_flag: AtomicU64,
    pub verdicts_block: AtomicU64,
    pub config_missing: AtomicU64,
    pub resolver_fallbacks: AtomicU64,
    pub dispatches: AtomicU64,
    pub dispatch_failures: AtomicU64,
    pub admissions_denied: AtomicU64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self {
            events_recorded: AtomicU64::new(0),
            verdicts_allow: AtomicU64::new(0),
            verdicts_flag: AtomicU64::new(0),
            verdicts_block: AtomicU64::new(0),
            config_missing: AtomicU64::new(0),
            resolver_fallbacks: AtomicU64::new(0),
            dispatches: AtomicU64::new(0),
            dispatch_failures: AtomicU64::new(0),
            admissions_denied: AtomicU64::new(0),
        }
    }

    pub(crate) fn count_verdict(&self, action: VelocityAction) {
        let counter = match action {
            VelocityAction::Allow => &self.verdicts_allow,
            VelocityAction::Flag => &self.verdicts_flag,
            VelocityAction::Block => &self.verdicts_block,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            events_recorded: self.events_recorded.load(Ordering::Relaxed),
            verdicts_allow: self.verdicts_allow.load(Ordering::Relaxed),
            verdicts_flag: self.verdicts_flag.load(Ordering::Relaxed),
            verdicts_block: self.verdicts_block.load(Ordering::Relaxed),
            config_missing: self.config_missing.load(Ordering::Relaxed),
            resolver_fallbacks: self.resolver_fallbacks.load(Ordering::Relaxed),
            dispatches: self.dispatches.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            admissions_denied: self.admissions_denied.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.events_recorded,
            &self.verdicts_allow,
            &self.verdicts_flag,
            &self.verdicts_block,
            &self.config_missing,
            &self.resolver_fallbacks,
            &self.dispatches,
            &self.dispatch_failures,
            &self.admissions_denied,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineStatsSnapshot {
    pub events_recorded: u64,
    pub verdicts_allow: u64,
    pub verdicts_flag: u64,
    pub verdicts_block: u64,
    pub config_missing: u64,
    pub resolver_fallbacks: u64,
    pub dispatches: u64,
    pub dispatch_failures: u64,
    pub admissions_denied: u64,
}
