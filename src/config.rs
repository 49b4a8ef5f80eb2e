//! Category limits and the cached configuration provider

use crate::{ConfigError, ConfigurationProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Limits table for one namespace, keyed by category
pub type LimitsTable = HashMap<String, CategoryLimits>;

/// Per-category velocity limits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLimits {
    /// Events allowed per rolling window
    pub ceiling: u64,
    /// Flag instead of block when the ceiling is exceeded
    #[serde(default)]
    pub soft_flag_allowed: bool,
}

impl CategoryLimits {
    pub fn new(ceiling: u64, soft_flag_allowed: bool) -> Result<Self, ConfigError> {
        let limits = Self {
            ceiling,
            soft_flag_allowed,
        };
        limits.validate()?;
        Ok(limits)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ceiling == 0 {
            return Err(ConfigError::Invalid("ceiling must be positive".into()));
        }
        Ok(())
    }
}

/// Backing source of limits tables
#[async_trait]
pub trait LimitsSource: Send + Sync + 'static {
    async fn fetch(&self, namespace: &str) -> Result<LimitsTable, ConfigError>;
}

/// Configuration provider that caches one limits table per namespace.
///
/// The table is fetched lazily on first lookup and kept until the namespace
/// is invalidated.
pub struct CachedConfigProvider {
    source: Arc<dyn LimitsSource>,
    namespace: Box<str>,
    cache: RwLock<HashMap<Box<str>, Arc<LimitsTable>>>,
    generation: AtomicU64,
}

impl CachedConfigProvider {
    pub fn new(source: Arc<dyn LimitsSource>, namespace: impl Into<Box<str>>) -> Self {
        Self {
            source,
            namespace: namespace.into(),
            cache: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Namespace lookups are served from
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whether a table for `namespace` is currently cached
    pub fn is_cached(&self, namespace: &str) -> bool {
        self.cache
            .read()
            .map(|c| c.contains_key(namespace))
            .unwrap_or(false)
    }

    async fn table(&self) -> Result<Arc<LimitsTable>, ConfigError> {
        let cached = self
            .cache
            .read()
            .map_err(|e| ConfigError::Source(e.to_string().into()))?
            .get(self.namespace.as_ref())
            .cloned();
        if let Some(table) = cached {
            return Ok(table);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let table = Arc::new(self.source.fetch(&self.namespace).await?);
        tracing::debug!(
            namespace = %self.namespace,
            categories = table.len(),
            "Fetched velocity limits"
        );

        let mut cache = self
            .cache
            .write()
            .map_err(|e| ConfigError::Source(e.to_string().into()))?;
        // An invalidation raced the fetch: serve the result but don't cache it
        if self.generation.load(Ordering::Acquire) == generation {
            cache.insert(self.namespace.clone(), table.clone());
        }
        Ok(table)
    }
}

#[async_trait]
impl ConfigurationProvider for CachedConfigProvider {
    async fn category_limits(&self, category: &str) -> Result<Option<CategoryLimits>, ConfigError> {
        Ok(self.table().await?.get(category).copied())
    }

    async fn invalidate(&self, namespace: &str) {
        if namespace == self.namespace.as_ref() {
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        let removed = self
            .cache
            .write()
            .map(|mut c| c.remove(namespace).is_some())
            .unwrap_or(false);
        tracing::debug!(namespace = %namespace, removed, "Invalidated velocity limits");
    }

    async fn reset(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        // A poisoned cache still has to come out empty
        self.cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        tracing::debug!(namespace = %self.namespace, "Reset velocity limits cache");
    }
}

/// In-memory limits source
pub struct StaticLimitsSource {
    tables: RwLock<HashMap<String, LimitsTable>>,
    fetches: AtomicU64,
}

impl StaticLimitsSource {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            fetches: AtomicU64::new(0),
        }
    }

    /// Builder-style insert
    pub fn with_limits(self, namespace: &str, category: &str, limits: CategoryLimits) -> Self {
        self.set(namespace, category, limits);
        self
    }

    pub fn set(&self, namespace: &str, category: &str, limits: CategoryLimits) {
        if let Ok(mut tables) = self.tables.write() {
            tables
                .entry(namespace.to_string())
                .or_default()
                .insert(category.to_string(), limits);
        }
    }

    pub fn remove(&self, namespace: &str, category: &str) {
        if let Ok(mut tables) = self.tables.write() {
            if let Some(table) = tables.get_mut(namespace) {
                table.remove(category);
            }
        }
    }

    /// Number of fetches served
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl Default for StaticLimitsSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LimitsSource for StaticLimitsSource {
    async fn fetch(&self, namespace: &str) -> Result<LimitsTable, ConfigError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let tables = self
            .tables
            .read()
            .map_err(|e| ConfigError::Source(e.to_string().into()))?;
        Ok(tables.get(namespace).cloned().unwrap_or_default())
    }
}

/// TOML limits source.
///
/// ```toml
/// [fraud_limits.affiliate]
/// ceiling = 50
/// soft_flag_allowed = true
/// ```
///
/// File-backed sources are re-read on every fetch, so invalidating the
/// namespace picks up edits.
pub struct TomlLimitsSource {
    origin: TomlOrigin,
}

enum TomlOrigin {
    Inline(String),
    File(PathBuf),
}

impl TomlLimitsSource {
    /// Parse eagerly so malformed documents are rejected up front
    pub fn parse(document: &str) -> Result<Self, ConfigError> {
        parse_tables(document)?;
        Ok(Self {
            origin: TomlOrigin::Inline(document.to_string()),
        })
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: TomlOrigin::File(path.into()),
        }
    }
}

#[async_trait]
impl LimitsSource for TomlLimitsSource {
    async fn fetch(&self, namespace: &str) -> Result<LimitsTable, ConfigError> {
        let mut tables = match &self.origin {
            TomlOrigin::Inline(document) => parse_tables(document)?,
            TomlOrigin::File(path) => {
                let path = path.clone();
                let document = tokio::task::spawn_blocking(move || std::fs::read_to_string(path))
                    .await
                    .map_err(|e| ConfigError::Source(e.to_string().into()))??;
                parse_tables(&document)?
            }
        };
        Ok(tables.remove(namespace).unwrap_or_default())
    }
}

fn parse_tables(document: &str) -> Result<HashMap<String, LimitsTable>, ConfigError> {
    let tables: HashMap<String, LimitsTable> = toml::from_str(document)?;
    for (namespace, table) in &tables {
        for (category, limits) in table {
            limits.validate().map_err(|_| {
                ConfigError::Invalid(
                    format!("{namespace}.{category}: ceiling must be positive").into(),
                )
            })?;
        }
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NS: &str = "fraud_limits";

    fn limits(ceiling: u64, soft_flag_allowed: bool) -> CategoryLimits {
        CategoryLimits {
            ceiling,
            soft_flag_allowed,
        }
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        assert!(CategoryLimits::new(0, false).is_err());
        assert_eq!(CategoryLimits::new(3, true).unwrap(), limits(3, true));
    }

    #[tokio::test]
    async fn test_absent_category_is_none() {
        let source = Arc::new(StaticLimitsSource::new().with_limits(NS, "default", limits(10, false)));
        let provider = CachedConfigProvider::new(source, NS);

        assert_eq!(provider.category_limits("default").await.unwrap(), Some(limits(10, false)));
        assert_eq!(provider.category_limits("unknown").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_table_is_cached_until_invalidated() {
        let source = Arc::new(StaticLimitsSource::new().with_limits(NS, "default", limits(10, false)));
        let provider = CachedConfigProvider::new(source.clone(), NS);

        provider.category_limits("default").await.unwrap();
        provider.category_limits("default").await.unwrap();
        assert_eq!(source.fetch_count(), 1);
        assert!(provider.is_cached(NS));

        source.set(NS, "default", limits(20, true));
        assert_eq!(provider.category_limits("default").await.unwrap(), Some(limits(10, false)));

        provider.invalidate(NS).await;
        assert!(!provider.is_cached(NS));
        assert_eq!(provider.category_limits("default").await.unwrap(), Some(limits(20, true)));
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_double_invalidate_same_as_once() {
        let source = Arc::new(StaticLimitsSource::new().with_limits(NS, "default", limits(10, false)));
        let provider = CachedConfigProvider::new(source.clone(), NS);
        provider.category_limits("default").await.unwrap();

        provider.invalidate(NS).await;
        provider.invalidate(NS).await;
        provider.category_limits("default").await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_reset_drops_every_namespace() {
        let source = Arc::new(StaticLimitsSource::new().with_limits("risk", "default", limits(10, false)));
        let provider = CachedConfigProvider::new(source.clone(), "risk");
        provider.category_limits("default").await.unwrap();
        assert!(provider.is_cached("risk"));

        provider.reset().await;
        assert!(!provider.is_cached("risk"));
        provider.category_limits("default").await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_unrelated_namespace_invalidation_is_noop() {
        let source = Arc::new(StaticLimitsSource::new().with_limits(NS, "default", limits(10, false)));
        let provider = CachedConfigProvider::new(source.clone(), NS);
        provider.category_limits("default").await.unwrap();

        provider.invalidate("catalog").await;
        assert!(provider.is_cached(NS));
        provider.category_limits("default").await.unwrap();
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_toml_inline_source() {
        let document = r#"
            [fraud_limits.affiliate]
            ceiling = 50
            soft_flag_allowed = true

            [fraud_limits.default]
            ceiling = 5

            [other.default]
            ceiling = 1000
        "#;
        let source = TomlLimitsSource::parse(document).unwrap();
        let table = source.fetch(NS).await.unwrap();
        assert_eq!(table.get("affiliate"), Some(&limits(50, true)));
        assert_eq!(table.get("default"), Some(&limits(5, false)));
        assert!(source.fetch("missing").await.unwrap().is_empty());
    }

    #[test]
    fn test_toml_rejects_zero_ceiling() {
        let err = TomlLimitsSource::parse("[fraud_limits.default]\nceiling = 0\n")
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("fraud_limits.default"));
    }

    #[test]
    fn test_toml_rejects_malformed() {
        let err = TomlLimitsSource::parse("[fraud_limits.default]\nceiling = \"lots\"\n")
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[tokio::test]
    async fn test_toml_file_source_rereads_after_invalidate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fraud_limits.default]\nceiling = 5").unwrap();
        file.flush().unwrap();

        let source = Arc::new(TomlLimitsSource::from_path(file.path()));
        let provider = CachedConfigProvider::new(source, NS);
        assert_eq!(provider.category_limits("default").await.unwrap(), Some(limits(5, false)));

        std::fs::write(file.path(), "[fraud_limits.default]\nceiling = 7\nsoft_flag_allowed = true\n").unwrap();
        assert_eq!(provider.category_limits("default").await.unwrap(), Some(limits(5, false)));

        provider.invalidate(NS).await;
        assert_eq!(provider.category_limits("default").await.unwrap(), Some(limits(7, true)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = TomlLimitsSource::from_path("/nonexistent/velocity-limits.toml");
        assert!(matches!(source.fetch(NS).await, Err(ConfigError::Io(_))));
    }
}
