use serde::Serialize;

use crate::{Metrics, PerformanceMetrics, SiteResult, UptimeMetrics, config::Budget};

/// A single budget breach.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub metric_name: &'static str,
    pub observed: f64,
    pub threshold: f64,
    pub message: String,
}

/// Compare a result with the budget of its site.
///
/// Checks run in a fixed order (LCP, TBT, score, status, response time) and
/// each failing check yields exactly one violation. Unsuccessful performance
/// audits carry no metrics worth judging and produce no violations; uptime
/// results are always judged since a failed request is itself a breach.
pub fn evaluate(result: &SiteResult, budget: &Budget) -> Vec<Violation> {
    match &result.metrics {
        Metrics::Performance(metrics) if result.success => evaluate_performance(metrics, budget),
        Metrics::Uptime(metrics) => evaluate_uptime(metrics, budget),
        Metrics::Performance(_)
        | Metrics::Analytics(_)
        | Metrics::Commerce(_)
        | Metrics::Integrity(_) => vec![],
    }
}

fn evaluate_performance(metrics: &PerformanceMetrics, budget: &Budget) -> Vec<Violation> {
    let mut violations = vec![];

    if metrics.lcp_ms > budget.lcp_ms {
        violations.push(Violation {
            metric_name: "lcp_ms",
            observed: metrics.lcp_ms as f64,
            threshold: budget.lcp_ms as f64,
            message: format!("LCP: {}ms > {}ms", metrics.lcp_ms, budget.lcp_ms),
        });
    }

    if metrics.tbt_ms > budget.tbt_ms {
        violations.push(Violation {
            metric_name: "tbt_ms",
            observed: metrics.tbt_ms as f64,
            threshold: budget.tbt_ms as f64,
            message: format!("TBT: {}ms > {}ms", metrics.tbt_ms, budget.tbt_ms),
        });
    }

    // lower is worse
    if metrics.score < budget.perf_score {
        violations.push(Violation {
            metric_name: "perf_score",
            observed: metrics.score as f64,
            threshold: budget.perf_score as f64,
            message: format!("Performance: {} < {}", metrics.score, budget.perf_score),
        });
    }

    violations
}

fn evaluate_uptime(metrics: &UptimeMetrics, budget: &Budget) -> Vec<Violation> {
    if metrics.status_code != 200 {
        let message = match metrics.status_code {
            0 => "no response received".to_string(),
            code => format!("HTTP {code}"),
        };
        return vec![Violation {
            metric_name: "status_code",
            observed: metrics.status_code as f64,
            threshold: 200.0,
            message,
        }];
    }

    if metrics.response_ms > budget.uptime_threshold_ms {
        return vec![Violation {
            metric_name: "response_ms",
            observed: metrics.response_ms as f64,
            threshold: budget.uptime_threshold_ms as f64,
            message: format!(
                "slow response: {}ms > {}ms",
                metrics.response_ms, budget.uptime_threshold_ms
            ),
        }];
    }

    vec![]
}
