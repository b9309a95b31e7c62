//! One evaluation run
//!
//! ```text
//! Collector ─┬─ site 1 ─┐
//!            ├─ site 2 ─┼─> fan-in ─> per result: history ─> append ─> budgets/anomalies ─> RunReport
//!            └─ site n ─┘                                                                      │
//!                                                                          render ─> Dispatcher ┘
//! ```
//!
//! Collection runs concurrently per site. Everything after the fan-in is
//! sequential: history is read before the new result is appended so that a
//! result is never compared against itself.

use std::sync::Arc;

use futures::future::join_all;
use tokio::spawn;
use tracing::{debug, error, info, instrument, warn};

use crate::alerts::{RunReport, SiteOutcome};
use crate::collectors::Collector;
use crate::config::{Config, SiteConfig};
use crate::dispatch::Dispatcher;
use crate::monitors::anomaly::{self, AnomalyThresholds, HistoryWindow};
use crate::monitors::{budget, security};
use crate::storage::{self, ResultStore, StorageResult};
use crate::{Metrics, ResultKind, SiteResult};

/// What `notify` sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyMode {
    /// Urgent alert, only if the classifier fires
    Alerts,
    /// Periodic status update
    Status,
}

pub struct Pipeline<S: ResultStore> {
    config: Config,
    store: S,
    dispatcher: Dispatcher,
    thresholds: AnomalyThresholds,
}

impl Pipeline<Box<dyn ResultStore>> {
    /// Open the configured store and build a pipeline on top of it
    pub async fn open(config: Config) -> StorageResult<Self> {
        let store = storage::open(&config.storage.clone().unwrap_or_default()).await?;
        Ok(Self::new(config, store))
    }
}

impl<S: ResultStore> Pipeline<S> {
    pub fn new(config: Config, store: S) -> Self {
        Self {
            dispatcher: Dispatcher::new(config.notifications.clone()),
            thresholds: config.thresholds(),
            config,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run `collector` for every configured site concurrently.
    ///
    /// Returns one result per site in registry order. A collector task that
    /// dies is reported as a failed result of its site.
    #[instrument(skip_all, fields(kind = %collector.kind()))]
    pub async fn collect<C: Collector + 'static>(&self, collector: Arc<C>) -> Vec<SiteResult> {
        let kind = collector.kind();
        let mut handles = vec![];
        for site in &self.config.sites {
            let site = site.clone();
            let collector = collector.clone();

            handles.push((
                site.name.clone(),
                spawn(async move { collector.collect(&site).await }),
            ));
        }

        let mut results = vec![];
        for (site, handle) in handles {
            match handle.await {
                Ok(result) => {
                    if let Some(error) = &result.error {
                        warn!("{site}: {error}");
                    }
                    results.push(result);
                }
                Err(e) => {
                    error!("{site}: collector task failed: {e}");
                    results.push(SiteResult::failed(
                        site,
                        Metrics::empty(kind),
                        format!("collector task failed: {e}"),
                    ));
                }
            }
        }

        debug!("collected {} results", results.len());
        results
    }

    /// Persist and evaluate the results of one kind.
    ///
    /// A failed store write aborts the run; every other per-site problem is
    /// logged and skipped.
    #[instrument(skip_all, fields(kind = %kind, results = results.len()))]
    pub async fn ingest(
        &self,
        kind: ResultKind,
        results: Vec<SiteResult>,
    ) -> StorageResult<RunReport> {
        let mut report = RunReport::new(kind);

        for mut result in results {
            if result.kind() != kind {
                warn!(
                    "ignoring {} result of '{}' in {} run",
                    result.kind(),
                    result.site,
                    kind
                );
                continue;
            }
            let Some(site) = self.config.site(&result.site) else {
                warn!("ignoring result of unknown site '{}'", result.site);
                continue;
            };

            let history = self
                .store
                .history(&result.site, kind, self.thresholds.window_size)
                .await;
            let window = HistoryWindow::from_results(self.thresholds.window_size, history);

            if let Metrics::Integrity(integrity) = &mut result.metrics {
                // a failed check proves nothing about the site
                integrity.security_score = if result.success {
                    security::score(&integrity.issues, (&integrity.checks).into())
                } else {
                    0
                };
            }

            self.store.append(&result).await?;

            report.outcomes.push(self.evaluate(site, result, &window));
        }

        info!(
            "ingested {} {} results ({} failing)",
            report.outcomes.len(),
            kind,
            report
                .outcomes
                .iter()
                .filter(|o| !o.result.success)
                .count()
        );

        Ok(report)
    }

    /// Rebuild the report of the latest stored results of `kind`.
    ///
    /// Each latest result is compared only against results strictly older
    /// than itself.
    #[instrument(skip(self))]
    pub async fn report_latest(&self, kind: ResultKind) -> RunReport {
        let mut report = RunReport::new(kind);

        for result in self.store.latest(kind).await {
            let Some(site) = self.config.site(&result.site) else {
                warn!("skipping latest result of unknown site '{}'", result.site);
                continue;
            };

            let older = self
                .store
                .history(&result.site, kind, self.thresholds.window_size + 1)
                .await
                .into_iter()
                .filter(|r| r.timestamp < result.timestamp);
            let window = HistoryWindow::from_results(self.thresholds.window_size, older);

            report.outcomes.push(self.evaluate(site, result, &window));
        }

        report
    }

    fn evaluate(&self, site: &SiteConfig, result: SiteResult, window: &HistoryWindow) -> SiteOutcome {
        let violations = budget::evaluate(&result, &site.budget);
        let anomalies = anomaly::detect(&result, window, &self.thresholds);

        for anomaly in &anomalies {
            info!(
                "{} anomaly on {}: {}",
                anomaly.severity, anomaly.site, anomaly.message
            );
        }

        SiteOutcome {
            url: site.url.clone(),
            result,
            violations,
            anomalies,
        }
    }

    /// Render a report and hand it to the dispatcher.
    ///
    /// Returns `false` when there was nothing to render.
    pub async fn notify(&self, report: &RunReport, mode: NotifyMode) -> bool {
        let rendered = match mode {
            NotifyMode::Alerts => report.render_alert(),
            NotifyMode::Status => report.render_status(),
        };

        match rendered {
            Some(alert) => {
                self.dispatcher.send(&alert).await;
                true
            }
            None => {
                debug!("nothing to notify for {}", report.kind);
                false
            }
        }
    }

    /// Notify all reports concurrently. Returns the number of payloads sent.
    pub async fn notify_all(&self, reports: &[RunReport], mode: NotifyMode) -> usize {
        join_all(reports.iter().map(|report| self.notify(report, mode)))
            .await
            .into_iter()
            .filter(|sent| *sent)
            .count()
    }
}
