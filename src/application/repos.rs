//! Repository traits describing persistence adapters.

use std::num::NonZeroU32;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::articles::ArticleCard;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("database timeout")]
    Timeout,
}

impl StoreError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Authoritative paginated read over the article collection.
///
/// Implementations are read-only and uncached: `count` reflects truth at
/// call time, and `page` applies the soft-delete filter, descending
/// `updated_at` order, and skip/limit math for a fixed page size chosen at
/// construction. Failures surface as-is; nothing here retries.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Number of non-deleted articles.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Display projections for 1-based page `n`, newest-updated first.
    ///
    /// A page past the end of the collection is an empty sequence, not an
    /// error.
    async fn page(&self, n: NonZeroU32) -> Result<Vec<ArticleCard>, StoreError>;
}
