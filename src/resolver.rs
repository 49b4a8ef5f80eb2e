//! Stock category resolvers

use crate::{ActorId, CategoryResolver, VelocityError};
use async_trait::async_trait;

/// Resolves every actor to the same category
pub struct StaticCategoryResolver {
    category: String,
}

impl StaticCategoryResolver {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
        }
    }
}

#[async_trait]
impl CategoryResolver for StaticCategoryResolver {
    async fn resolve(&self, _actor_id: &ActorId) -> Result<String, VelocityError> {
        Ok(self.category.clone())
    }
}
