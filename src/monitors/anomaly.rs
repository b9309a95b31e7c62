//! Baseline anomaly detection
//!
//! The baseline of a metric is the plain arithmetic mean over all successful
//! results in the trailing [`HistoryWindow`]. There is no outlier rejection
//! and no decay: a single extreme day moves the baseline as much as any other.
//!
//! The detector abstains (returns no anomalies) until the window holds at
//! least [`AnomalyThresholds::min_history`] successful points. Rules are
//! evaluated independently, so one result may fire several of them.
//!
//! | rule                | metric        | fires when                                   | severity |
//! |---------------------|---------------|----------------------------------------------|----------|
//! | `order_spike`       | orders_24h    | current > spike_factor × baseline            | high     |
//! | `revenue_spike`     | revenue_24h   | current > spike_factor × baseline            | high     |
//! | `order_drop`        | orders_24h    | current < drop_factor × baseline, baseline > drop_min_baseline | medium |
//! | `hourly_spike`      | orders_1h     | current > short_window_factor × baseline     | high     |
//! | `traffic_spike`     | visits        | current > spike_factor × baseline            | high     |
//! | `high_bounce_rate`  | bounce_rate   | current > rate_factor × baseline, current > rate_floor | medium |

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{AnalyticsMetrics, CommerceMetrics, Metrics, ResultKind, Severity, SiteResult};

/// Tunable detection parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnomalyThresholds {
    /// Minimum number of successful historical points before any rule fires
    pub min_history: usize,

    /// Capacity of the trailing history window
    pub window_size: usize,

    /// Volume spike multiplier
    pub spike_factor: f64,

    /// Volume drop multiplier
    pub drop_factor: f64,

    /// Baselines at or below this never report a drop
    pub drop_min_baseline: f64,

    /// Spike multiplier for the short (1h) window
    pub short_window_factor: f64,

    /// Rate anomaly multiplier
    pub rate_factor: f64,

    /// Absolute floor a rate has to exceed before it counts as anomalous
    pub rate_floor: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            min_history: 7,
            window_size: 30,
            spike_factor: 3.0,
            drop_factor: 0.5,
            drop_min_baseline: 1.0,
            short_window_factor: 5.0,
            rate_factor: 1.5,
            rate_floor: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub site: String,
    #[serde(rename = "type")]
    pub anomaly_type: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Trailing results of one (site, kind), most recent last.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    capacity: usize,
    results: VecDeque<SiteResult>,
}

impl HistoryWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            results: VecDeque::with_capacity(capacity),
        }
    }

    /// Build a window from an ordered sequence, keeping only the newest
    /// `capacity` entries.
    pub fn from_results(capacity: usize, results: impl IntoIterator<Item = SiteResult>) -> Self {
        let mut window = Self::new(capacity);
        for result in results {
            window.push(result);
        }
        window
    }

    pub fn push(&mut self, result: SiteResult) {
        self.results.push_back(result);
        while self.results.len() > self.capacity {
            self.results.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteResult> {
        self.results.iter()
    }

    fn successful(&self, kind: ResultKind) -> impl Iterator<Item = &SiteResult> {
        self.results
            .iter()
            .filter(move |r| r.success && r.kind() == kind)
    }
}

/// Compare `current` with the baseline derived from `window`.
pub fn detect(
    current: &SiteResult,
    window: &HistoryWindow,
    thresholds: &AnomalyThresholds,
) -> Vec<Anomaly> {
    if !current.success {
        return vec![];
    }

    let points = window.successful(current.kind()).count();
    if points < thresholds.min_history {
        trace!(
            "{}: insufficient history for anomaly detection ({points}/{})",
            current.site, thresholds.min_history
        );
        return vec![];
    }

    match &current.metrics {
        Metrics::Commerce(metrics) => {
            let history: Vec<_> = window
                .successful(ResultKind::Commerce)
                .filter_map(|r| match &r.metrics {
                    Metrics::Commerce(m) => Some(m),
                    _ => None,
                })
                .collect();
            detect_commerce(&current.site, metrics, &history, thresholds)
        }
        Metrics::Analytics(metrics) => {
            let history: Vec<_> = window
                .successful(ResultKind::Analytics)
                .filter_map(|r| match &r.metrics {
                    Metrics::Analytics(m) => Some(m),
                    _ => None,
                })
                .collect();
            detect_analytics(&current.site, metrics, &history, thresholds)
        }
        Metrics::Uptime(_) | Metrics::Performance(_) | Metrics::Integrity(_) => vec![],
    }
}

fn baseline<T>(history: &[&T], metric: impl Fn(&T) -> f64) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    history.iter().map(|&m| metric(m)).sum::<f64>() / history.len() as f64
}

fn detect_commerce(
    site: &str,
    current: &CommerceMetrics,
    history: &[&CommerceMetrics],
    thresholds: &AnomalyThresholds,
) -> Vec<Anomaly> {
    let mut anomalies = vec![];

    let avg_orders = baseline(history, |m| m.orders_24h as f64);
    let avg_revenue = baseline(history, |m| m.revenue_24h);
    let avg_orders_1h = baseline(history, |m| m.orders_1h as f64);

    let orders = current.orders_24h as f64;

    if orders > avg_orders * thresholds.spike_factor {
        anomalies.push(Anomaly {
            site: site.to_string(),
            anomaly_type: "order_spike",
            severity: Severity::High,
            message: format!(
                "Order spike detected: {} orders (avg: {})",
                current.orders_24h,
                avg_orders.round()
            ),
        });
    }

    if current.revenue_24h > avg_revenue * thresholds.spike_factor {
        anomalies.push(Anomaly {
            site: site.to_string(),
            anomaly_type: "revenue_spike",
            severity: Severity::High,
            message: format!(
                "Revenue spike detected: {:.2} (avg: {:.2})",
                current.revenue_24h, avg_revenue
            ),
        });
    }

    if orders < avg_orders * thresholds.drop_factor && avg_orders > thresholds.drop_min_baseline {
        anomalies.push(Anomaly {
            site: site.to_string(),
            anomaly_type: "order_drop",
            severity: Severity::Medium,
            message: format!(
                "Order drop detected: {} orders (avg: {})",
                current.orders_24h,
                avg_orders.round()
            ),
        });
    }

    if current.orders_1h as f64 > avg_orders_1h * thresholds.short_window_factor {
        anomalies.push(Anomaly {
            site: site.to_string(),
            anomaly_type: "hourly_spike",
            severity: Severity::High,
            message: format!(
                "Hourly order spike: {} orders in last hour (avg: {})",
                current.orders_1h,
                avg_orders_1h.round()
            ),
        });
    }

    anomalies
}

fn detect_analytics(
    site: &str,
    current: &AnalyticsMetrics,
    history: &[&AnalyticsMetrics],
    thresholds: &AnomalyThresholds,
) -> Vec<Anomaly> {
    let mut anomalies = vec![];

    let avg_visits = baseline(history, |m| m.visits as f64);
    let avg_bounce_rate = baseline(history, |m| m.bounce_rate);

    if current.visits as f64 > avg_visits * thresholds.spike_factor {
        anomalies.push(Anomaly {
            site: site.to_string(),
            anomaly_type: "traffic_spike",
            severity: Severity::High,
            message: format!(
                "Traffic spike: {} visits (avg: {})",
                current.visits,
                avg_visits.round()
            ),
        });
    }

    // the floor keeps near-zero baselines from flagging every ordinary rate
    if current.bounce_rate > avg_bounce_rate * thresholds.rate_factor
        && current.bounce_rate > thresholds.rate_floor
    {
        anomalies.push(Anomaly {
            site: site.to_string(),
            anomaly_type: "high_bounce_rate",
            severity: Severity::Medium,
            message: format!(
                "High bounce rate: {}% (avg: {}%)",
                current.bounce_rate,
                avg_bounce_rate.round()
            ),
        });
    }

    anomalies
}
