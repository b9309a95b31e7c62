//! Alert classification and rendering
//!
//! A [`RunReport`] holds everything one run learned about one result kind.
//! From it two payloads can be rendered:
//!
//! - an **alert**, only when the kind specific fire rule holds
//! - a **status update**, unconditionally (as long as there is something to
//!   report)
//!
//! Silence is a proper outcome: when nothing fires, `render_alert` returns
//! `None` instead of an empty payload.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::discord::{
    COLOR_BLUE, COLOR_GREEN, COLOR_ORANGE, COLOR_RED, COLOR_YELLOW, Embed, EmbedField,
    EmbedFooter, MAX_FIELDS,
};
use crate::monitors::anomaly::Anomaly;
use crate::monitors::budget::Violation;
use crate::{Issue, Metrics, ResultKind, Severity, SiteResult};

pub const FOOTER: &str = "SitePulse Monitoring";

/// Number of products listed per shop in commerce updates
const TOP_PRODUCTS: usize = 5;

/// Number of issues listed per site in integrity payloads
const TOP_ISSUES: usize = 3;

/// Medium issues of one site that together warrant an alert
const MEDIUM_ISSUES_ALERT: usize = 3;

pub fn severity_color(severity: Severity) -> u32 {
    match severity {
        Severity::High => COLOR_RED,
        Severity::Medium => COLOR_ORANGE,
        Severity::Low => COLOR_YELLOW,
    }
}

/// A rendered notification, independent of the sink it is sent to.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub title: String,
    pub description: Option<String>,
    /// `None` for status updates
    pub severity: Option<Severity>,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: String,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(title: impl ToString, severity: Severity) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            severity: Some(severity),
            color: severity_color(severity),
            fields: vec![],
            footer: FOOTER.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn status(title: impl ToString, color: u32) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            severity: None,
            color,
            fields: vec![],
            footer: FOOTER.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn description(mut self, description: impl ToString) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Append a field; fields beyond what a sink accepts are dropped.
    pub fn field(mut self, name: impl ToString, value: impl ToString, inline: bool) -> Self {
        if self.fields.len() < MAX_FIELDS {
            self.fields.push(EmbedField::new(name, value, inline));
        } else {
            debug!("dropping field '{}' of '{}'", name.to_string(), self.title);
        }
        self
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn to_embed(&self) -> Embed {
        Embed {
            title: self.title.clone(),
            description: self.description.clone(),
            color: self.color,
            fields: self.fields.clone(),
            footer: EmbedFooter {
                text: self.footer.clone(),
            },
            timestamp: self.created_at.to_rfc3339(),
        }
    }
}

/// Everything one run derived for one site.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteOutcome {
    pub url: String,
    pub result: SiteResult,
    pub violations: Vec<Violation>,
    pub anomalies: Vec<Anomaly>,
}

impl SiteOutcome {
    fn issues(&self) -> &[Issue] {
        match &self.result.metrics {
            Metrics::Integrity(integrity) => &integrity.issues,
            _ => &[],
        }
    }

    fn count_issues(&self, severity: Severity) -> usize {
        self.issues()
            .iter()
            .filter(|i| i.severity == severity)
            .count()
    }

    fn has_high_anomaly(&self) -> bool {
        self.anomalies.iter().any(|a| a.severity == Severity::High)
    }

    fn integrity_fires(&self) -> bool {
        self.count_issues(Severity::High) >= 1
            || self.count_issues(Severity::Medium) >= MEDIUM_ISSUES_ALERT
    }

    /// Whether this site on its own would trigger an alert of its kind
    fn fires(&self) -> bool {
        match self.result.kind() {
            ResultKind::Uptime => !self.result.success || !self.violations.is_empty(),
            ResultKind::Performance => !self.violations.is_empty(),
            ResultKind::Analytics | ResultKind::Commerce => self.has_high_anomaly(),
            ResultKind::Integrity => self.integrity_fires(),
        }
    }
}

/// Outcome of one run over one result kind
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub kind: ResultKind,
    pub outcomes: Vec<SiteOutcome>,
    pub created_at: DateTime<Utc>,
}

impl RunReport {
    pub fn new(kind: ResultKind) -> Self {
        Self {
            kind,
            outcomes: vec![],
            created_at: Utc::now(),
        }
    }

    /// Any unsuccessful result or any budget violation
    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| !o.result.success || !o.violations.is_empty())
    }

    pub fn should_alert(&self) -> bool {
        self.outcomes.iter().any(SiteOutcome::fires)
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &Anomaly> {
        self.outcomes.iter().flat_map(|o| o.anomalies.iter())
    }

    /// Render the urgent alert, or nothing if no fire rule holds.
    pub fn render_alert(&self) -> Option<Alert> {
        if !self.should_alert() {
            return None;
        }

        let firing = self.outcomes.iter().filter(|o| o.fires());
        let alert = match self.kind {
            ResultKind::Uptime => firing.fold(
                Alert::new("🚨 Site Uptime Alert", Severity::High),
                |alert, outcome| {
                    alert.field(
                        format!("{} ({})", outcome.result.site, outcome.url),
                        uptime_details(outcome),
                        false,
                    )
                },
            ),
            ResultKind::Performance => firing.fold(
                Alert::new("⚠️ Performance Budget Alert", Severity::Medium),
                |alert, outcome| {
                    let score = match &outcome.result.metrics {
                        Metrics::Performance(m) => or_na(m.score as u64, ""),
                        _ => "N/A".to_string(),
                    };
                    alert.field(
                        format!("{} ({})", outcome.result.site, outcome.url),
                        format!(
                            "**Performance Score:** {score}\n**Violations:**\n{}",
                            bullets(outcome.violations.iter().map(|v| v.message.as_str()))
                        ),
                        false,
                    )
                },
            ),
            ResultKind::Analytics => firing.fold(
                Alert::new("📈 Traffic Anomaly Alert", Severity::High),
                |alert, outcome| {
                    alert.field(
                        format!("{} ({})", outcome.result.site, outcome.url),
                        anomaly_lines(&outcome.anomalies),
                        false,
                    )
                },
            ),
            ResultKind::Commerce => firing.fold(
                Alert::new("🛒 Order Anomaly Alert", Severity::High),
                |alert, outcome| {
                    let sales = match &outcome.result.metrics {
                        Metrics::Commerce(m) => format!(
                            "**Orders (24h):** {}\n**Revenue (24h):** {:.2}\n",
                            m.orders_24h, m.revenue_24h
                        ),
                        _ => String::new(),
                    };
                    alert.field(
                        format!("{} ({})", outcome.result.site, outcome.url),
                        format!(
                            "{sales}**Anomalies:**\n{}",
                            anomaly_lines(&outcome.anomalies)
                        ),
                        false,
                    )
                },
            ),
            ResultKind::Integrity => {
                let severity = if self
                    .outcomes
                    .iter()
                    .any(|o| o.count_issues(Severity::High) > 0)
                {
                    Severity::High
                } else {
                    Severity::Medium
                };
                firing.fold(
                    Alert::new("🔒 Security Alert", severity),
                    |alert, outcome| {
                        alert.field(
                            format!("{} ({})", outcome.result.site, outcome.url),
                            integrity_details(outcome),
                            false,
                        )
                    },
                )
            }
        };

        Some(alert.at(self.created_at))
    }

    /// Render the periodic status update of this kind.
    ///
    /// Returns `None` when there is nothing to report (no results at all, or
    /// for analytics no successful result).
    pub fn render_status(&self) -> Option<Alert> {
        if self.outcomes.is_empty() {
            return None;
        }

        let status = match self.kind {
            ResultKind::Uptime => self.uptime_status(),
            ResultKind::Performance => self.performance_status(),
            ResultKind::Analytics => self.analytics_status()?,
            ResultKind::Commerce => self.commerce_status(),
            ResultKind::Integrity => self.integrity_status(),
        };

        Some(status.at(self.created_at))
    }

    fn uptime_status(&self) -> Alert {
        let (online, failed): (Vec<_>, Vec<_>) =
            self.outcomes.iter().partition(|o| !o.fires());

        let online_value = if online.is_empty() {
            "None".to_string()
        } else {
            online
                .iter()
                .map(|o| match &o.result.metrics {
                    Metrics::Uptime(m) => format!("**{}**: {}ms", o.result.site, m.response_ms),
                    _ => format!("**{}**", o.result.site),
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        let color = if failed.is_empty() {
            COLOR_GREEN
        } else {
            COLOR_ORANGE
        };

        let status = Alert::status("📊 Uptime Check Complete", color)
            .description(format!("Checked {} sites", self.outcomes.len()))
            .field("✅ Online Sites", online_value, true);

        if failed.is_empty() {
            status.field("📈 Status", "All systems operational", true)
        } else {
            status.field(
                "❌ Issues Detected",
                failed
                    .iter()
                    .map(|o| format!("**{}**: {}", o.result.site, failure_reason(o)))
                    .collect::<Vec<_>>()
                    .join("\n"),
                true,
            )
        }
    }

    fn performance_status(&self) -> Alert {
        let violated: Vec<_> = self
            .outcomes
            .iter()
            .filter(|o| !o.violations.is_empty())
            .collect();

        let color = if violated.is_empty() {
            COLOR_GREEN
        } else {
            COLOR_ORANGE
        };

        let mut status = Alert::status("🚀 Performance Audit Complete", color)
            .description(format!("Audited {} sites with Lighthouse", self.outcomes.len()));

        // keep one slot for the violation summary
        let site_slots = MAX_FIELDS - 1;
        for outcome in self.outcomes.iter().take(site_slots) {
            let value = match (&outcome.result.metrics, outcome.result.success) {
                (Metrics::Performance(m), true) => format!(
                    "**Performance:** {}\n**LCP:** {}\n**TBT:** {}\n**CLS:** {:.3}",
                    or_na(m.score as u64, "/100"),
                    or_na(m.lcp_ms, "ms"),
                    or_na(m.tbt_ms, "ms"),
                    m.cls
                ),
                _ => format!("**Error:** {}", failure_reason(outcome)),
            };
            status = status.field(format!("📈 {}", outcome.result.site), value, true);
        }

        if !violated.is_empty() {
            status = status.field(
                "⚠️ Budget Violations",
                violated
                    .iter()
                    .map(|o| {
                        let messages: Vec<_> =
                            o.violations.iter().map(|v| v.message.as_str()).collect();
                        format!("**{}:** {}", o.result.site, messages.join(", "))
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
                false,
            );
        }

        status
    }

    fn analytics_status(&self) -> Option<Alert> {
        let successful: Vec<_> = self
            .outcomes
            .iter()
            .filter(|o| o.result.success)
            .collect();
        if successful.is_empty() {
            return None;
        }

        let mut status = Alert::status("📊 Analytics Update", COLOR_BLUE)
            .description(format!("Visitor analytics for {} sites", self.outcomes.len()));

        for outcome in successful.iter().take(MAX_FIELDS - 1) {
            if let Metrics::Analytics(m) = &outcome.result.metrics {
                status = status.field(
                    format!("👥 {}", outcome.result.site),
                    format!(
                        "**Visits:** {}\n**Unique Visitors:** {}\n**Page Views:** {}\n**Bounce Rate:** {:.1}%\n**Online Now:** {}",
                        m.visits, m.unique_visitors, m.page_views, m.bounce_rate, m.visitors_online
                    ),
                    true,
                );
            }
        }

        let anomalies: Vec<_> = self.anomalies().cloned().collect();
        if !anomalies.is_empty() {
            status = status.field("⚠️ Anomalies", anomaly_lines(&anomalies), false);
        }

        Some(status)
    }

    fn commerce_status(&self) -> Alert {
        let anomalies: Vec<_> = self.anomalies().cloned().collect();
        let color = if anomalies.is_empty() {
            COLOR_GREEN
        } else {
            COLOR_ORANGE
        };

        let mut status = Alert::status("🛒 Commerce Update", color)
            .description(format!("Order activity for {} shops", self.outcomes.len()));

        for outcome in self.outcomes.iter().take(MAX_FIELDS - 1) {
            let value = match (&outcome.result.metrics, outcome.result.success) {
                (Metrics::Commerce(m), true) => {
                    let products = if m.top_products.is_empty() {
                        "N/A".to_string()
                    } else {
                        m.top_products
                            .iter()
                            .take(TOP_PRODUCTS)
                            .enumerate()
                            .map(|(i, p)| format!("{}. {} ({})", i + 1, p.product, p.quantity))
                            .collect::<Vec<_>>()
                            .join("\n")
                    };
                    format!(
                        "**Orders (24h):** {}\n**Revenue (24h):** {:.2}\n**Orders (1h):** {}\n**Avg Order Value:** {:.2}\n**Top Products:**\n{}",
                        m.orders_24h, m.revenue_24h, m.orders_1h, m.avg_order_value, products
                    )
                }
                _ => format!("**Error:** {}", failure_reason(outcome)),
            };
            status = status.field(format!("🛍️ {}", outcome.result.site), value, true);
        }

        if !anomalies.is_empty() {
            status = status.field("⚠️ Anomalies", anomaly_lines(&anomalies), false);
        }

        status
    }

    fn integrity_status(&self) -> Alert {
        let clean = self
            .outcomes
            .iter()
            .all(|o| o.result.success && o.issues().is_empty());
        let color = if clean { COLOR_GREEN } else { COLOR_ORANGE };

        let mut status = Alert::status("🔒 Security Check Complete", color)
            .description(format!("Checked {} sites", self.outcomes.len()));

        for outcome in &self.outcomes {
            let value = if outcome.result.success {
                integrity_details(outcome)
            } else {
                format!("**Error:** {}", failure_reason(outcome))
            };
            status = status.field(format!("🛡️ {}", outcome.result.site), value, true);
        }

        status
    }
}

fn uptime_details(outcome: &SiteOutcome) -> String {
    let (status, response_ms) = match &outcome.result.metrics {
        Metrics::Uptime(m) if m.status_code > 0 => (m.status_code.to_string(), m.response_ms),
        Metrics::Uptime(m) => ("Error".to_string(), m.response_ms),
        _ => ("Error".to_string(), 0),
    };

    format!(
        "**Status:** {status}\n**Response Time:** {response_ms}ms\n**Error:** {}",
        failure_reason(outcome)
    )
}

fn integrity_details(outcome: &SiteOutcome) -> String {
    let score = match &outcome.result.metrics {
        Metrics::Integrity(m) => m.security_score.to_string(),
        _ => "N/A".to_string(),
    };

    let mut issues: Vec<_> = outcome.issues().iter().collect();
    if issues.is_empty() {
        return format!("**Security Score:** {score}/100\nNo issues found");
    }
    issues.sort_by(|a, b| b.severity.cmp(&a.severity));

    format!(
        "**Security Score:** {score}/100\n**Issues:** {} high, {} medium, {} low\n{}",
        outcome.count_issues(Severity::High),
        outcome.count_issues(Severity::Medium),
        outcome.count_issues(Severity::Low),
        bullets(
            issues
                .iter()
                .take(TOP_ISSUES)
                .map(|i| format!("[{}] {}", i.severity, i.message))
        )
    )
}

/// Human readable reason why an outcome is considered failing
fn failure_reason(outcome: &SiteOutcome) -> String {
    if let Some(error) = &outcome.result.error {
        return error.clone();
    }

    let messages: Vec<_> = outcome
        .violations
        .iter()
        .map(|v| v.message.as_str())
        .collect();
    if messages.is_empty() {
        "N/A".to_string()
    } else {
        messages.join(", ")
    }
}

fn anomaly_lines(anomalies: &[Anomaly]) -> String {
    bullets(
        anomalies
            .iter()
            .map(|a| format!("[{}] {}: {}", a.severity, a.site, a.message)),
    )
}

fn bullets<S: AsRef<str>>(lines: impl Iterator<Item = S>) -> String {
    lines
        .map(|line| format!("• {}", line.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Zero means "not reported" for audit metrics
fn or_na(value: u64, unit: &str) -> String {
    if value == 0 {
        "N/A".to_string()
    } else {
        format!("{value}{unit}")
    }
}
