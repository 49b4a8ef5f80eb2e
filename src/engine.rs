//! Velocity engine: ties history, configuration and dispatch together

use crate::{
    ActionDispatcher, ActorId, CategoryLimits, CategoryResolver, Clock, ConfigError,
    ConfigurationProvider, DispatchError, EngineStats, EngineStatsSnapshot, HistoryStore,
    InMemoryHistory, StaticCategoryResolver, SystemClock, TracingDispatcher, TracingObserver,
    VelocityAction, VelocityError, VelocityObserver, VelocitySettings, VelocityVerdict,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Velocity-based fraud detection engine.
///
/// Shareable across tasks behind an `Arc`. History mutation happens under the
/// history store's per-shard lock, which is never held across a provider,
/// resolver or dispatcher call.
///
/// ```rust,ignore
/// let source = Arc::new(TomlLimitsSource::from_path("/etc/velocity/limits.toml"));
/// let engine = VelocityEngine::builder(Arc::new(CachedConfigProvider::new(source, "fraud_limits")))
///     .resolver(Arc::new(AffiliateTierResolver::new(db)))
///     .dispatcher(Arc::new(AccountActions::new(client)))
///     .build()?;
///
/// let verdict = engine.record_and_evaluate(&ActorId::from("aff-42")).await?;
/// ```
pub struct VelocityEngine {
    history: Arc<dyn HistoryStore>,
    config: Arc<dyn ConfigurationProvider>,
    resolver: Arc<dyn CategoryResolver>,
    dispatcher: Arc<dyn ActionDispatcher>,
    observer: Arc<dyn VelocityObserver>,
    stats: Arc<EngineStats>,
    clock: Arc<dyn Clock>,
    settings: VelocitySettings,
}

impl VelocityEngine {
    /// Start building an engine around `config`. Everything else defaults:
    /// in-memory history, a resolver returning the default category, a
    /// logging dispatcher and observer, and the wall clock.
    pub fn builder(config: Arc<dyn ConfigurationProvider>) -> VelocityEngineBuilder {
        VelocityEngineBuilder::new(config)
    }

    /// Analyze current history against `limits`. Read-only.
    pub fn analyze(&self, actor_id: &ActorId, limits: &CategoryLimits) -> VelocityVerdict {
        let window_count = self.window_count(actor_id);
        VelocityVerdict::evaluate(window_count, limits)
    }

    /// Read-only analysis for query clients. Fails closed when `category`
    /// has no limits; never records or dispatches.
    pub async fn analyze_category(
        &self,
        actor_id: &ActorId,
        category: &str,
    ) -> Result<VelocityVerdict, VelocityError> {
        let limits = self.required_limits(actor_id, category).await?;
        Ok(self.analyze(actor_id, &limits))
    }

    /// Record one event for `actor_id`, evaluate it and dispatch any
    /// enforcement action.
    ///
    /// The event is recorded before any suspension point, so it survives the
    /// caller dropping this future and is kept when configuration is missing.
    /// Dispatch failures are logged and do not change the returned verdict.
    pub async fn record_and_evaluate(
        &self,
        actor_id: &ActorId,
    ) -> Result<VelocityVerdict, VelocityError> {
        self.history.record(actor_id, self.clock.now_millis());
        self.stats.events_recorded.fetch_add(1, Ordering::Relaxed);

        let category = self.resolve_category(actor_id).await;
        self.observer.on_event_recorded(actor_id, &category);

        let limits = self.required_limits(actor_id, &category).await?;
        let verdict = self.analyze(actor_id, &limits);
        self.stats.count_verdict(verdict.action);
        self.observer.on_verdict(actor_id, &category, &verdict);

        self.dispatch(actor_id, &verdict).await;
        Ok(verdict)
    }

    /// Admission gate run before accepting an event. Never records.
    ///
    /// Fails open: an unconfigured category (or an unavailable provider)
    /// admits the event.
    pub async fn check_admission(&self, actor_id: &ActorId, category: &str) -> bool {
        let limits = match self.config.category_limits(category).await {
            Ok(Some(limits)) => limits,
            Ok(None) => return true,
            Err(error) => {
                tracing::warn!(
                    actor_id = %actor_id,
                    category = %category,
                    error = %error,
                    "Admission check without limits, admitting"
                );
                return true;
            }
        };

        let admitted = self.window_count(actor_id) <= limits.ceiling;
        if !admitted {
            self.stats.admissions_denied.fetch_add(1, Ordering::Relaxed);
        }
        admitted
    }

    /// Force the configuration provider to refetch `namespace` on next
    /// access. Verdicts already returned are unaffected.
    pub async fn invalidate_config(&self, namespace: &str) {
        self.config.invalidate(namespace).await;
        self.observer.on_config_invalidated(namespace);
    }

    /// Sweep expired records of all actors
    pub fn purge_expired(&self) -> usize {
        let removed = self.history.purge_expired();
        if removed > 0 {
            tracing::debug!(removed, actors = self.history.actor_count(), "Purged expired history");
        }
        removed
    }

    /// Drop all history, cached limits and counters
    pub async fn reset(&self) {
        self.history.clear();
        self.config.reset().await;
        self.stats.reset();
    }

    /// Number of events `actor_id` has inside the evaluation window
    pub fn window_count(&self, actor_id: &ActorId) -> u64 {
        let window_millis = self.settings.window().as_millis() as u64;
        let cutoff = self.clock.now_millis().saturating_sub(window_millis);
        self.history.count_since(actor_id, cutoff) as u64
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    pub fn settings(&self) -> &VelocitySettings {
        &self.settings
    }

    pub fn stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }

    async fn resolve_category(&self, actor_id: &ActorId) -> String {
        match self.resolver.resolve(actor_id).await {
            Ok(category) => category,
            Err(error) => {
                let fallback = self.settings.default_category.clone();
                self.stats.resolver_fallbacks.fetch_add(1, Ordering::Relaxed);
                self.observer
                    .on_resolver_fallback(actor_id, &error.to_string(), &fallback);
                fallback
            }
        }
    }

    async fn required_limits(
        &self,
        actor_id: &ActorId,
        category: &str,
    ) -> Result<CategoryLimits, VelocityError> {
        match self.config.category_limits(category).await? {
            Some(limits) => Ok(limits),
            None => {
                self.stats.config_missing.fetch_add(1, Ordering::Relaxed);
                self.observer.on_config_missing(actor_id, category);
                Err(VelocityError::ConfigNotFound {
                    category: category.into(),
                })
            }
        }
    }

    async fn dispatch(&self, actor_id: &ActorId, verdict: &VelocityVerdict) {
        if !verdict.requires_dispatch() {
            return;
        }
        let action = verdict.action;
        let reason = action.dispatch_reason().unwrap_or_default();

        let call = async {
            match action {
                VelocityAction::Block => self.dispatcher.block(actor_id, reason).await,
                VelocityAction::Flag => self.dispatcher.flag(actor_id, reason).await,
                VelocityAction::Allow => Ok(()),
            }
        };
        let result = match self.settings.dispatch_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(DispatchError::TimedOut(limit.as_millis() as u64))),
            None => call.await,
        };

        self.stats.dispatches.fetch_add(1, Ordering::Relaxed);
        match result {
            Ok(()) => self.observer.on_dispatched(actor_id, action, reason),
            Err(error) => {
                self.stats.dispatch_failures.fetch_add(1, Ordering::Relaxed);
                self.observer
                    .on_dispatch_failed(actor_id, action, &error.to_string());
            }
        }
    }
}

/// Builder for [`VelocityEngine`]
pub struct VelocityEngineBuilder {
    config: Arc<dyn ConfigurationProvider>,
    settings: VelocitySettings,
    history: Option<Arc<dyn HistoryStore>>,
    resolver: Option<Arc<dyn CategoryResolver>>,
    dispatcher: Arc<dyn ActionDispatcher>,
    observer: Arc<dyn VelocityObserver>,
    stats: Arc<EngineStats>,
    clock: Arc<dyn Clock>,
}

impl VelocityEngineBuilder {
    fn new(config: Arc<dyn ConfigurationProvider>) -> Self {
        Self {
            config,
            settings: VelocitySettings::default(),
            history: None,
            resolver: None,
            dispatcher: Arc::new(TracingDispatcher),
            observer: Arc::new(TracingObserver),
            stats: Arc::new(EngineStats::new()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn settings(mut self, settings: VelocitySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Custom history store. It must share the engine's clock.
    pub fn history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Defaults to a resolver returning the configured default category
    pub fn resolver(mut self, resolver: Arc<dyn CategoryResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn ActionDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn VelocityObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn stats(mut self, stats: Arc<EngineStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<VelocityEngine, ConfigError> {
        self.settings.validate()?;

        let history = match self.history {
            Some(history) => history,
            None => Arc::new(InMemoryHistory::new(
                self.settings.retention(),
                self.clock.clone(),
            )),
        };
        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None => Arc::new(StaticCategoryResolver::new(
                self.settings.default_category.clone(),
            )),
        };

        Ok(VelocityEngine {
            history,
            config: self.config,
            resolver,
            dispatcher: self.dispatcher,
            observer: self.observer,
            stats: self.stats,
            clock: self.clock,
            settings: self.settings,
        })
    }
}
