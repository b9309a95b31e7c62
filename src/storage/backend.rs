//! Storage backend trait definition
//!
//! This module defines the core `ResultStore` trait that all
//! storage implementations must implement.

use async_trait::async_trait;

use super::error::StorageResult;
use super::schema::SummaryEntry;
use crate::{ResultKind, SiteResult};

/// Trait for result stores
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared by the
/// concurrently running collectors of one run. Appends for the same
/// (site, kind) must be serialized by the implementation so that two
/// writers never interleave partial writes to the same log.
///
/// ## Error Handling
///
/// Only `append` can fail. Read methods never fail: data that cannot be
/// read is logged by the implementation and reported as empty.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist a result to the latest snapshot, the daily log and the
    /// rolling site summary.
    ///
    /// An error means the result was not durably recorded and the run
    /// must be aborted.
    async fn append(&self, result: &SiteResult) -> StorageResult<()>;

    /// Get up to `limit` most recent results of one site and kind.
    ///
    /// Results are ordered oldest first (most recent last). Returns an
    /// empty list when nothing has been recorded yet.
    async fn history(&self, site: &str, kind: ResultKind, limit: usize) -> Vec<SiteResult>;

    /// Get the latest result of every site for one kind
    async fn latest(&self, kind: ResultKind) -> Vec<SiteResult>;

    /// Get the rolling summary of one site and kind (oldest first)
    async fn summary(&self, site: &str, kind: ResultKind) -> Vec<SummaryEntry>;

    /// Get backend-specific statistics
    ///
    /// Returns human-readable stats about the backend
    /// (e.g., "Files: ./data, 5 kinds, 12 daily logs").
    async fn get_stats(&self) -> String;
}

#[async_trait]
impl<S: ResultStore + ?Sized> ResultStore for Box<S> {
    async fn append(&self, result: &SiteResult) -> StorageResult<()> {
        (**self).append(result).await
    }

    async fn history(&self, site: &str, kind: ResultKind, limit: usize) -> Vec<SiteResult> {
        (**self).history(site, kind, limit).await
    }

    async fn latest(&self, kind: ResultKind) -> Vec<SiteResult> {
        (**self).latest(kind).await
    }

    async fn summary(&self, site: &str, kind: ResultKind) -> Vec<SummaryEntry> {
        (**self).summary(site, kind).await
    }

    async fn get_stats(&self) -> String {
        (**self).get_stats().await
    }
}
