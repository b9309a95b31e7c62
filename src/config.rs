use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;
use tracing::trace;

use crate::monitors::anomaly::AnomalyThresholds;
use crate::storage::files::file_safe;

/// Storage backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// Flat JSON files below a data directory
    Files {
        /// Root of the data directory (one sub directory per result kind)
        #[serde(default = "default_data_path")]
        path: PathBuf,

        /// Maximum number of entries kept in each rolling site summary
        #[serde(default = "default_summary_cap")]
        summary_cap: usize,

        /// Number of daily logs consulted when building history
        #[serde(default = "default_history_days")]
        history_days: usize,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Files {
            path: default_data_path(),
            summary_cap: default_summary_cap(),
            history_days: default_history_days(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data")
}

pub fn default_summary_cap() -> usize {
    100
}

pub fn default_history_days() -> usize {
    30
}

/// The site registry plus everything a run needs to know.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sites: Vec<SiteConfig>,

    /// Storage configuration (optional - defaults to `./data`)
    pub storage: Option<StorageConfig>,

    /// Where notifications go; no sink means notifications are skipped
    pub notifications: Option<NotificationSink>,

    /// Anomaly detection thresholds (optional - defaults apply)
    pub anomaly: Option<AnomalyThresholds>,
}

impl Config {
    pub fn site(&self, name: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| site.name == name)
    }

    pub fn thresholds(&self) -> AnomalyThresholds {
        self.anomaly.clone().unwrap_or_default()
    }

    fn validate(&self) -> anyhow::Result<()> {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for site in &self.sites {
            // site names double as summary file names
            if let Some(other) = seen.insert(file_safe(&site.name), &site.name) {
                if other == site.name {
                    anyhow::bail!("duplicate site name in registry: {}", site.name);
                }
                anyhow::bail!(
                    "site names '{other}' and '{}' map to the same summary file",
                    site.name
                );
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub site_type: SiteType,
    #[serde(alias = "perf_budget", default)]
    pub budget: Budget,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteType {
    Wordpress,
    Shopify,
    #[default]
    Static,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Budget {
    #[serde(default = "default_lcp_ms")]
    pub lcp_ms: u64,
    #[serde(default = "default_tbt_ms")]
    pub tbt_ms: u64,
    #[serde(default = "default_perf_score")]
    pub perf_score: u8,
    #[serde(alias = "uptime_threshold", default = "default_uptime_threshold_ms")]
    pub uptime_threshold_ms: u64,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            lcp_ms: default_lcp_ms(),
            tbt_ms: default_tbt_ms(),
            perf_score: default_perf_score(),
            uptime_threshold_ms: default_uptime_threshold_ms(),
        }
    }
}

fn default_lcp_ms() -> u64 {
    2500
}

fn default_tbt_ms() -> u64 {
    300
}

fn default_perf_score() -> u8 {
    80
}

fn default_uptime_threshold_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "sink", rename_all = "snake_case")]
pub enum NotificationSink {
    Discord(Discord),
    Webhook(Webhook),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Webhook {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Discord {
    pub url: String,
    pub user_id: Option<String>,
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content =
        std::fs::read_to_string(path).with_context(|| format!("could not read registry {path}"))?;
    parse_config(&file_content).inspect(|config| trace!("loaded config: {config:?}"))
}

pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    let config: Config = serde_json::from_str(content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided! ({e})"))?;
    config.validate()?;
    Ok(config)
}
