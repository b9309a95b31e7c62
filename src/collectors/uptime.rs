//! HTTP uptime collector
//!
//! Issues a single GET against the site URL and measures the time until the
//! body has been received. Any status other than 200, or a response slower
//! than the site's `uptime_threshold_ms`, makes the result unsuccessful.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{instrument, trace, warn};

use super::Collector;
use crate::config::SiteConfig;
use crate::{Metrics, ResultKind, SiteResult, UptimeMetrics};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct UptimeCollector {
    /// HTTP client (reused across sites)
    client: reqwest::Client,
}

impl UptimeCollector {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    async fn execute_request(&self, url: &str) -> Result<u16> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?;

        let status_code = response.status().as_u16();

        response
            .bytes()
            .await
            .context("Failed to read response body")?;

        Ok(status_code)
    }
}

#[async_trait]
impl Collector for UptimeCollector {
    fn kind(&self) -> ResultKind {
        ResultKind::Uptime
    }

    #[instrument(skip(self, site), fields(site = %site.name))]
    async fn collect(&self, site: &SiteConfig) -> SiteResult {
        trace!("checking {}", site.url);

        let start = Instant::now();
        let check_result = self.execute_request(&site.url).await;
        let response_ms = start.elapsed().as_millis() as u64;
        let threshold = site.budget.uptime_threshold_ms;

        match check_result {
            Ok(status_code) => {
                let metrics = Metrics::Uptime(UptimeMetrics {
                    status_code,
                    response_ms,
                });

                if status_code != 200 {
                    SiteResult::failed(&site.name, metrics, format!("HTTP {status_code}"))
                } else if response_ms > threshold {
                    SiteResult::failed(
                        &site.name,
                        metrics,
                        format!("Slow response: {response_ms}ms > {threshold}ms"),
                    )
                } else {
                    SiteResult::new(&site.name, metrics)
                }
            }
            Err(e) => {
                warn!("uptime check failed: {:#}", e);
                SiteResult::failed(
                    &site.name,
                    Metrics::Uptime(UptimeMetrics {
                        status_code: 0,
                        response_ms,
                    }),
                    format!("{e:#}"),
                )
            }
        }
    }
}
