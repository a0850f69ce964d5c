//! Club persistence.
//!
//! Defines the `ClubStore` trait and two implementations:
//! - SQLite via sqlx, the default
//! - an in-process store, used when the database is unavailable and in tests
//!
//! The backend is chosen once at startup from configuration.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{StorageBackend, StorageConfig};
use crate::types::{Club, LeagueError, NewClub};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Repository of club season records.
///
/// Implementations must serialize `add` against other writes so that two
/// concurrent submissions of the same name cannot both succeed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClubStore: Send + Sync {
    /// Validate and insert a club. Returns the assigned id.
    async fn add(&self, club: NewClub) -> Result<i64, LeagueError>;

    /// Delete a club by id. Returns whether a record was removed.
    async fn remove(&self, id: i64) -> Result<bool, LeagueError>;

    /// All clubs, points descending, insertion order on ties.
    async fn list(&self) -> Result<Vec<Club>, LeagueError>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// Shared handle to whichever backend was configured.
pub type SharedStore = Arc<dyn ClubStore>;

/// Open the configured backend.
///
/// When SQLite cannot be opened and `fallback_to_memory` is set, an
/// in-memory store is returned instead of an error.
pub async fn open_store(config: &StorageConfig) -> anyhow::Result<SharedStore> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory club store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Sqlite => {
            match SqliteStore::connect(&config.database_url, config.max_connections).await {
                Ok(store) => {
                    info!(url = %config.database_url, "Using SQLite club store");
                    Ok(Arc::new(store))
                }
                Err(e) if config.fallback_to_memory => {
                    warn!(
                        url = %config.database_url,
                        error = %e,
                        "SQLite unavailable, falling back to in-memory club store"
                    );
                    Ok(Arc::new(MemoryStore::new()))
                }
                Err(e) => Err(anyhow::Error::new(e)
                    .context(format!("Failed to open database: {}", config.database_url))),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
