//! Injected capabilities the engine consumes
//!
//! None of these are implemented by the core. Stock implementations live in
//! `config`, `resolver` and `dispatch`.

use crate::{ActorId, CategoryLimits, ConfigError, DispatchError, VelocityError};
use async_trait::async_trait;

/// Supplies per-category limits.
///
/// `Ok(None)` means the category is not configured. Callers decide whether
/// that fails open or closed.
#[async_trait]
pub trait ConfigurationProvider: Send + Sync + 'static {
    async fn category_limits(&self, category: &str) -> Result<Option<CategoryLimits>, ConfigError>;

    /// Force a refetch of `namespace` on next access
    async fn invalidate(&self, namespace: &str);

    /// Drop every cached namespace
    async fn reset(&self);
}

/// Maps an actor to its configuration category.
///
/// # Example
///
/// ```rust,ignore
/// struct AffiliateTierResolver { tiers: Arc<TierLookup> }
///
/// #[async_trait]
/// impl CategoryResolver for AffiliateTierResolver {
///     async fn resolve(&self, actor_id: &ActorId) -> Result<String, VelocityError> {
///         self.tiers
///             .tier_of(actor_id.as_str())
///             .await
///             .map_err(|e| VelocityError::ResolverUnavailable(e.to_string().into()))
///     }
/// }
/// ```
#[async_trait]
pub trait CategoryResolver: Send + Sync + 'static {
    async fn resolve(&self, actor_id: &ActorId) -> Result<String, VelocityError>;
}

/// Executes enforcement decisions.
///
/// Fire-and-forget from the engine's point of view: an `Err` is logged and
/// counted, never returned to the caller of the engine.
#[async_trait]
pub trait ActionDispatcher: Send + Sync + 'static {
    /// Disable the actor
    async fn block(&self, actor_id: &ActorId, reason: &str) -> Result<(), DispatchError>;

    /// Route the actor to manual review
    async fn flag(&self, actor_id: &ActorId, reason: &str) -> Result<(), DispatchError>;
}
