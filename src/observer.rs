//! Engine observer trait

use crate::{ActorId, VelocityAction, VelocityVerdict};

/// Observer trait for external observability
pub trait VelocityObserver: Send + Sync + 'static {
    fn on_event_recorded(&self, actor_id: &ActorId, category: &str);
    fn on_verdict(&self, actor_id: &ActorId, category: &str, verdict: &VelocityVerdict);
    fn on_config_missing(&self, actor_id: &ActorId, category: &str);
    fn on_resolver_fallback(&self, actor_id: &ActorId, error: &str, fallback: &str);
    fn on_dispatched(&self, actor_id: &ActorId, action: VelocityAction, reason: &str);
    fn on_dispatch_failed(&self, actor_id: &ActorId, action: VelocityAction, error: &str);
    fn on_config_invalidated(&self, namespace: &str);
}

/// No-op observer
pub struct NoOpObserver;

impl VelocityObserver for NoOpObserver {
    fn on_event_recorded(&self, _actor_id: &ActorId, _category: &str) {}
    fn on_verdict(&self, _actor_id: &ActorId, _category: &str, _verdict: &VelocityVerdict) {}
    fn on_config_missing(&self, _actor_id: &ActorId, _category: &str) {}
    fn on_resolver_fallback(&self, _actor_id: &ActorId, _error: &str, _fallback: &str) {}
    fn on_dispatched(&self, _actor_id: &ActorId, _action: VelocityAction, _reason: &str) {}
    fn on_dispatch_failed(&self, _actor_id: &ActorId, _action: VelocityAction, _error: &str) {}
    fn on_config_invalidated(&self, _namespace: &str) {}
}

/// Tracing-based observer
pub struct TracingObserver;

impl VelocityObserver for TracingObserver {
    fn on_event_recorded(&self, actor_id: &ActorId, category: &str) {
        tracing::trace!(actor_id = %actor_id, category = %category, "Event recorded");
    }

    fn on_verdict(&self, actor_id: &ActorId, category: &str, verdict: &VelocityVerdict) {
        match verdict.action {
            VelocityAction::Allow => tracing::debug!(
                actor_id = %actor_id,
                category = %category,
                window_count = verdict.window_count,
                ceiling = verdict.ceiling,
                risk_tier = %verdict.risk_tier,
                "Velocity allowed"
            ),
            action => tracing::warn!(
                actor_id = %actor_id,
                category = %category,
                window_count = verdict.window_count,
                ceiling = verdict.ceiling,
                risk_tier = %verdict.risk_tier,
                action = %action,
                "Velocity threshold crossed"
            ),
        }
    }

    fn on_config_missing(&self, actor_id: &ActorId, category: &str) {
        tracing::error!(actor_id = %actor_id, category = %category, "No velocity limits configured");
    }

    fn on_resolver_fallback(&self, actor_id: &ActorId, error: &str, fallback: &str) {
        tracing::warn!(actor_id = %actor_id, error = %error, fallback = %fallback, "Category resolver unavailable");
    }

    fn on_dispatched(&self, actor_id: &ActorId, action: VelocityAction, reason: &str) {
        tracing::info!(actor_id = %actor_id, action = %action, reason = %reason, "Action dispatched");
    }

    fn on_dispatch_failed(&self, actor_id: &ActorId, action: VelocityAction, error: &str) {
        tracing::error!(actor_id = %actor_id, action = %action, error = %error, "Dispatch failed");
    }

    fn on_config_invalidated(&self, namespace: &str) {
        tracing::info!(namespace = %namespace, "Configuration invalidated");
    }
}
