//! SQLite club store (sqlx).
//!
//! One `clubs` table. Name uniqueness is enforced twice: by a check taken
//! under the store's write gate, and by a `UNIQUE COLLATE NOCASE` constraint
//! for writers outside this process.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::ClubStore;
use crate::types::{Club, LeagueError, NewClub};

const CREATE_CLUBS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS clubs (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        name           TEXT    NOT NULL UNIQUE COLLATE NOCASE,
        matches_played INTEGER NOT NULL DEFAULT 0 CHECK (matches_played BETWEEN 0 AND 38),
        wins           INTEGER NOT NULL DEFAULT 0 CHECK (wins >= 0),
        losses         INTEGER NOT NULL DEFAULT 0 CHECK (losses >= 0),
        draws          INTEGER NOT NULL DEFAULT 0 CHECK (draws >= 0),
        points         INTEGER NOT NULL DEFAULT 0,
        created_at     TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CHECK (wins + losses + draws <= matches_played)
    )";

const SELECT_CLUBS: &str = "
    SELECT id, name, matches_played, wins, losses, draws, points, created_at
    FROM clubs
    ORDER BY points DESC, id ASC";

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

pub struct SqliteStore {
    pool: SqlitePool,
    /// Serializes writes within this process.
    write_gate: Mutex<()>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and ensure the schema.
    ///
    /// An in-memory database lives only as long as its single connection, so
    /// for those URLs the pool is pinned to one connection that is never
    /// reaped, whatever `max_connections` says.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, LeagueError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool_options = if is_memory_url(url) {
            if max_connections > 1 {
                debug!(max_connections, "In-memory SQLite limited to one connection");
            }
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };
        let pool = pool_options.connect_with(options).await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the `clubs` table if missing.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, LeagueError> {
        sqlx::query(CREATE_CLUBS_TABLE).execute(&pool).await?;
        debug!("clubs table ready");
        Ok(Self {
            pool,
            write_gate: Mutex::new(()),
        })
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ClubStore for SqliteStore {
    async fn add(&self, club: NewClub) -> Result<i64, LeagueError> {
        let valid = club.validate()?;

        let _gate = self.write_gate.lock().await;

        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clubs WHERE name = ? COLLATE NOCASE")
                .bind(&valid.name)
                .fetch_one(&self.pool)
                .await?;
        if existing > 0 {
            return Err(LeagueError::DuplicateName(valid.name));
        }

        let result = sqlx::query(
            "INSERT INTO clubs (name, matches_played, wins, losses, draws, points, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&valid.name)
        .bind(valid.matches_played)
        .bind(valid.wins)
        .bind(valid.losses)
        .bind(valid.draws)
        .bind(valid.points)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(LeagueError::DuplicateName(valid.name));
            }
            Err(e) => return Err(e.into()),
        };

        info!(id, points = valid.points, backend = "sqlite", "Club added");
        Ok(id)
    }

    async fn remove(&self, id: i64) -> Result<bool, LeagueError> {
        let _gate = self.write_gate.lock().await;
        let done = sqlx::query("DELETE FROM clubs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let removed = done.rows_affected() > 0;
        if removed {
            info!(id, backend = "sqlite", "Club removed");
        } else {
            debug!(id, backend = "sqlite", "Remove requested for unknown club");
        }
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<Club>, LeagueError> {
        let clubs = sqlx::query_as::<_, Club>(SELECT_CLUBS)
            .fetch_all(&self.pool)
            .await?;
        Ok(clubs)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
