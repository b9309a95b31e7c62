//! Flat file storage backend
//!
//! Layout below the data directory, one sub directory per result kind:
//!
//! ```text
//! data/
//! └── commerce/
//!     ├── commerce-latest.json              latest result of every site
//!     ├── commerce-2025-01-14.json          all results of that UTC day
//!     ├── commerce-2025-01-15.json
//!     └── commerce-summary-gelball-store.json   capped rolling summary
//! ```
//!
//! Files are JSON arrays written to a temporary sibling and renamed into
//! place, so readers never observe a half written file. Appends of one kind
//! hold that kind's lock for the whole read-modify-write cycle.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, instrument, trace, warn};

use super::backend::ResultStore;
use super::error::{StorageError, StorageResult};
use super::schema::SummaryEntry;
use crate::{ResultKind, SiteResult};

const LATEST: &str = "latest";

const SUMMARY: &str = "summary";

/// JSON file backed result store
pub struct FileStore {
    root: PathBuf,
    summary_cap: usize,
    history_days: usize,
    /// One write lock per result kind, indexed by discriminant
    locks: [Mutex<()>; ResultKind::ALL.len()],
}

impl FileStore {
    /// Create a store rooted at `root`, creating the directory tree if needed
    pub async fn new(
        root: impl AsRef<Path>,
        summary_cap: usize,
        history_days: usize,
    ) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();

        for kind in ResultKind::ALL {
            let dir = root.join(kind.as_str());
            fs::create_dir_all(&dir)
                .await
                .map_err(|source| StorageError::WriteFailed { path: dir, source })?;
        }

        debug!("file store ready at {}", root.display());

        Ok(Self {
            root,
            summary_cap,
            history_days,
            locks: std::array::from_fn(|_| Mutex::new(())),
        })
    }

    fn kind_dir(&self, kind: ResultKind) -> PathBuf {
        self.root.join(kind.as_str())
    }

    fn latest_path(&self, kind: ResultKind) -> PathBuf {
        self.kind_dir(kind).join(format!("{kind}-{LATEST}.json"))
    }

    fn daily_path(&self, kind: ResultKind, date: NaiveDate) -> PathBuf {
        self.kind_dir(kind)
            .join(format!("{kind}-{}.json", date.format("%Y-%m-%d")))
    }

    fn summary_path(&self, site: &str, kind: ResultKind) -> PathBuf {
        self.kind_dir(kind)
            .join(format!("{kind}-{SUMMARY}-{}.json", file_safe(site)))
    }

    /// Daily logs of one kind, oldest first, limited to the configured window
    async fn daily_logs(&self, kind: ResultKind) -> Vec<PathBuf> {
        let dir = self.kind_dir(kind);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("could not list {}: {}", dir.display(), e);
                return vec![];
            }
        };

        let prefix = format!("{kind}-");
        let mut logs = vec![];
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let name = entry.file_name().to_string_lossy().to_string();
                    let date = name
                        .strip_prefix(&prefix)
                        .and_then(|rest| rest.strip_suffix(".json"))
                        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok());
                    if let Some(date) = date {
                        logs.push((date, entry.path()));
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("error while listing {}: {}", dir.display(), e);
                    break;
                }
            }
        }

        logs.sort_by_key(|(date, _)| *date);
        let skip = logs.len().saturating_sub(self.history_days);
        logs.into_iter().skip(skip).map(|(_, path)| path).collect()
    }

    /// Read an array file for appending.
    ///
    /// A corrupt file is moved aside so the new record is not lost together
    /// with the unreadable ones.
    async fn read_for_append<T: DeserializeOwned>(&self, path: &Path) -> StorageResult<Vec<T>> {
        match read_json_array(path).await {
            Ok(items) => Ok(items),
            Err(e) if e.is_read_error() => {
                let aside = path.with_extension(format!("corrupt-{}", Utc::now().timestamp()));
                warn!("{e}, moving it to {}", aside.display());
                fs::rename(path, &aside)
                    .await
                    .map_err(|source| StorageError::WriteFailed {
                        path: aside,
                        source,
                    })?;
                Ok(vec![])
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ResultStore for FileStore {
    #[instrument(skip(self, result), fields(site = %result.site, kind = %result.kind()))]
    async fn append(&self, result: &SiteResult) -> StorageResult<()> {
        let kind = result.kind();
        let _guard = self.locks[kind as usize].lock().await;

        // daily log
        let daily = self.daily_path(kind, result.timestamp.date_naive());
        let mut log: Vec<SiteResult> = self.read_for_append(&daily).await?;
        log.push(result.clone());
        write_json(&daily, &log).await?;

        // latest snapshot
        let latest_path = self.latest_path(kind);
        let mut latest: Vec<SiteResult> = self.read_for_append(&latest_path).await?;
        match latest.iter_mut().find(|r| r.site == result.site) {
            Some(existing) => *existing = result.clone(),
            None => latest.push(result.clone()),
        }
        write_json(&latest_path, &latest).await?;

        // rolling summary
        let summary_path = self.summary_path(&result.site, kind);
        let mut summary: Vec<SummaryEntry> = self.read_for_append(&summary_path).await?;
        summary.push(SummaryEntry::from_result(result));
        if summary.len() > self.summary_cap {
            let excess = summary.len() - self.summary_cap;
            summary.drain(..excess);
        }
        write_json(&summary_path, &summary).await?;

        trace!("stored result in {}", daily.display());
        Ok(())
    }

    async fn history(&self, site: &str, kind: ResultKind, limit: usize) -> Vec<SiteResult> {
        let mut history = vec![];

        for path in self.daily_logs(kind).await {
            match read_json_array::<SiteResult>(&path).await {
                Ok(results) => history.extend(results.into_iter().filter(|r| r.site == site)),
                Err(e) => warn!("ignoring unreadable history: {e}"),
            }
        }

        let skip = history.len().saturating_sub(limit);
        history.drain(..skip);
        history
    }

    async fn latest(&self, kind: ResultKind) -> Vec<SiteResult> {
        read_json_array(&self.latest_path(kind))
            .await
            .unwrap_or_else(|e| {
                warn!("ignoring unreadable latest snapshot: {e}");
                vec![]
            })
    }

    async fn summary(&self, site: &str, kind: ResultKind) -> Vec<SummaryEntry> {
        read_json_array(&self.summary_path(site, kind))
            .await
            .unwrap_or_else(|e| {
                warn!("ignoring unreadable summary: {e}");
                vec![]
            })
    }

    async fn get_stats(&self) -> String {
        let mut logs = 0;
        for kind in ResultKind::ALL {
            logs += self.daily_logs(kind).await.len();
        }
        format!(
            "Files: {} ({} daily logs in window, summary cap {})",
            self.root.display(),
            logs,
            self.summary_cap
        )
    }
}

/// Read a JSON array, a missing file is an empty array
async fn read_json_array<T: DeserializeOwned>(path: &Path) -> StorageResult<Vec<T>> {
    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
        Err(source) => {
            return Err(StorageError::ReadFailed {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_slice(&content).map_err(|e| StorageError::Corrupt {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    let content = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");

    fs::write(&tmp, content)
        .await
        .map_err(|source| StorageError::WriteFailed {
            path: tmp.clone(),
            source,
        })?;
    fs::rename(&tmp, path)
        .await
        .map_err(|source| StorageError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// File name fragment used for the summary of site `name`
pub fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
