//! Result persistence
//!
//! Every appended result lands in three places:
//!
//! - a per-kind **latest** snapshot (most recent result of every site)
//! - a per-kind, per-UTC-date **daily log** (append-only, unbounded within the day)
//! - a per-site **rolling summary** with reduced fields, capped and FIFO evicted
//!
//! ## Design
//!
//! - **Trait-based**: `ResultStore` allows swapping implementations
//! - **Async**: All operations are async so collectors and stores share one runtime
//! - **Forgiving reads**: unreadable history is logged and treated as empty
//! - **Strict writes**: a failed write is returned to the caller and ends the run
//!
//! ## Backends
//!
//! - **Files** (default): flat JSON files below a data directory
//! - **In-Memory**: No persistence, for testing or dry runs
//!
//! ## Usage
//!
//! ```no_run
//! use site_pulse::storage::{ResultStore, files::FileStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = FileStore::new("./data", 100, 30).await?;
//!     let history = store.history("gelball-store", site_pulse::ResultKind::Commerce, 30).await;
//!     println!("{} historical results", history.len());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod files;
pub mod memory;
pub mod schema;

pub use backend::ResultStore;
pub use error::{StorageError, StorageResult};
pub use schema::SummaryEntry;

use crate::config::StorageConfig;

/// Open the store described by the configuration.
pub async fn open(config: &StorageConfig) -> StorageResult<Box<dyn ResultStore>> {
    match config {
        StorageConfig::None => Ok(Box::new(memory::MemoryStore::new(
            crate::config::default_summary_cap(),
        ))),
        StorageConfig::Files {
            path,
            summary_cap,
            history_days,
        } => Ok(Box::new(
            files::FileStore::new(path, *summary_cap, *history_days).await?,
        )),
    }
}
