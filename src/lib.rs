//! Velocity-Based Fraud Detection
//!
//! Tracks per-actor event history in a sliding window, classifies risk against
//! per-category limits and recommends an enforcement action (allow / flag /
//! block). Configuration, category resolution and enforcement are injected
//! capabilities (`ConfigurationProvider`, `CategoryResolver`,
//! `ActionDispatcher`).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! // 1. Point the provider at a limits source
//! let source = Arc::new(TomlLimitsSource::parse(r#"
//!     [fraud_limits.default]
//!     ceiling = 100
//!     soft_flag_allowed = true
//! "#)?);
//! let config = Arc::new(CachedConfigProvider::new(source, "fraud_limits"));
//!
//! // 2. Build the engine with your resolver and dispatcher
//! let engine = VelocityEngine::builder(config)
//!     .dispatcher(Arc::new(MyAccountActions))
//!     .build()?;
//!
//! // 3. Gate and record events
//! if engine.check_admission(&actor, "default").await {
//!     let verdict = engine.record_and_evaluate(&actor).await?;
//! }
//! ```

// === Core Types ===
mod actor;
mod clock;
mod errors;
mod verdict;

// === Traits ===
mod traits;

// === Storage ===
mod history;

// === Configuration ===
mod config;
mod settings;

// === Capabilities ===
mod dispatch;
mod resolver;

// === Observability ===
mod observer;
mod stats;

// === Engine ===
mod engine;

#[cfg(any(test, feature = "test-harness"))]
mod harness;

// === Re-exports ===

// Types
pub use actor::{ActorId, IndicationRecord};
pub use clock::{Clock, ManualClock, SystemClock};
pub use verdict::{
    action, risk_tier, RiskTier, VelocityAction, VelocityVerdict, FLAG_RATIO, LOW_RISK_RATIO,
};

// Errors
pub use errors::{ConfigError, DispatchError, VelocityError};

// Traits
pub use traits::{ActionDispatcher, CategoryResolver, ConfigurationProvider};

// Storage
pub use history::{HistoryStore, InMemoryHistory};

// Configuration
pub use config::{
    CachedConfigProvider, CategoryLimits, LimitsSource, LimitsTable, StaticLimitsSource,
    TomlLimitsSource,
};
pub use settings::VelocitySettings;

// Capabilities
pub use dispatch::{DispatchRecord, RecordingDispatcher, TracingDispatcher};
pub use resolver::StaticCategoryResolver;

// Observability
pub use observer::{NoOpObserver, TracingObserver, VelocityObserver};
pub use stats::{EngineStats, EngineStatsSnapshot};

// Engine
pub use engine::{VelocityEngine, VelocityEngineBuilder};

#[cfg(any(test, feature = "test-harness"))]
pub use harness::init_test_tracing;
