//! Collector adapters
//!
//! A collector turns one configured site into one [`SiteResult`] of its
//! kind. Collection never fails as a whole: a site that cannot be reached is
//! reported as an unsuccessful result so that the rest of the run goes on.

use async_trait::async_trait;

use crate::config::SiteConfig;
use crate::{ResultKind, SiteResult};

pub mod uptime;

pub use uptime::UptimeCollector;

#[async_trait]
pub trait Collector: Send + Sync {
    /// The kind of results this collector produces
    fn kind(&self) -> ResultKind;

    /// Collect one result for `site`
    async fn collect(&self, site: &SiteConfig) -> SiteResult;
}
