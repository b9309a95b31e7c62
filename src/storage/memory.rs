//! In-memory storage backend (no persistence)
//!
//! Useful for:
//! - Testing without touching the filesystem
//! - Dry runs (`storage: { "backend": "none" }`)
//!
//! ## Limitations
//!
//! - **No persistence**: All data lost when the process exits
//! - **No daily rotation**: history is kept as one list per site and kind

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::backend::ResultStore;
use super::error::StorageResult;
use super::schema::SummaryEntry;
use crate::{ResultKind, SiteResult};

type Key = (String, ResultKind);

#[derive(Default)]
struct Inner {
    history: HashMap<Key, Vec<SiteResult>>,
    summaries: HashMap<Key, VecDeque<SummaryEntry>>,
    latest: HashMap<ResultKind, Vec<SiteResult>>,
}

/// In-memory result store
pub struct MemoryStore {
    summary_cap: usize,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new(summary_cap: usize) -> Self {
        Self {
            summary_cap,
            inner: RwLock::default(),
        }
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn append(&self, result: &SiteResult) -> StorageResult<()> {
        let key = (result.site.clone(), result.kind());
        let mut inner = self.inner.write().await;

        inner
            .history
            .entry(key.clone())
            .or_default()
            .push(result.clone());

        let latest = inner.latest.entry(result.kind()).or_default();
        match latest.iter_mut().find(|r| r.site == result.site) {
            Some(existing) => *existing = result.clone(),
            None => latest.push(result.clone()),
        }

        let summary = inner.summaries.entry(key).or_default();
        summary.push_back(SummaryEntry::from_result(result));
        while summary.len() > self.summary_cap {
            summary.pop_front();
        }

        debug!("stored {} result of {} in memory", result.kind(), result.site);
        Ok(())
    }

    async fn history(&self, site: &str, kind: ResultKind, limit: usize) -> Vec<SiteResult> {
        let inner = self.inner.read().await;
        inner
            .history
            .get(&(site.to_string(), kind))
            .map(|results| {
                let skip = results.len().saturating_sub(limit);
                results[skip..].to_vec()
            })
            .unwrap_or_default()
    }

    async fn latest(&self, kind: ResultKind) -> Vec<SiteResult> {
        let inner = self.inner.read().await;
        inner.latest.get(&kind).cloned().unwrap_or_default()
    }

    async fn summary(&self, site: &str, kind: ResultKind) -> Vec<SummaryEntry> {
        let inner = self.inner.read().await;
        inner
            .summaries
            .get(&(site.to_string(), kind))
            .map(|summary| summary.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn get_stats(&self) -> String {
        let inner = self.inner.read().await;
        let total: usize = inner.history.values().map(Vec::len).sum();
        format!(
            "In-Memory: {} results across {} site logs",
            total,
            inner.history.len()
        )
    }
}
