//! In-process club store.
//!
//! Holds clubs in insertion order behind a single lock. Used when SQLite is
//! not reachable, and as the backend for tests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::ClubStore;
use crate::types::{Club, LeagueError, NewClub};

#[derive(Debug)]
struct Inner {
    /// Insertion order.
    clubs: Vec<Club>,
    next_id: i64,
}

#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                clubs: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClubStore for MemoryStore {
    async fn add(&self, club: NewClub) -> Result<i64, LeagueError> {
        let valid = club.validate()?;

        // Held across the duplicate check and the push.
        let mut inner = self.inner.write().await;
        if inner
            .clubs
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(&valid.name))
        {
            return Err(LeagueError::DuplicateName(valid.name));
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.clubs.push(Club {
            id,
            name: valid.name,
            matches_played: valid.matches_played,
            wins: valid.wins,
            losses: valid.losses,
            draws: valid.draws,
            points: valid.points,
            created_at: Utc::now(),
        });

        info!(id, points = valid.points, backend = "memory", "Club added");
        Ok(id)
    }

    async fn remove(&self, id: i64) -> Result<bool, LeagueError> {
        let mut inner = self.inner.write().await;
        match inner.clubs.iter().position(|c| c.id == id) {
            Some(idx) => {
                let removed = inner.clubs.remove(idx);
                info!(id, name = %removed.name, backend = "memory", "Club removed");
                Ok(true)
            }
            None => {
                debug!(id, backend = "memory", "Remove requested for unknown club");
                Ok(false)
            }
        }
    }

    async fn list(&self) -> Result<Vec<Club>, LeagueError> {
        let mut clubs = self.inner.read().await.clubs.clone();
        // Stable, so equal points keep insertion order.
        clubs.sort_by(|a, b| b.points.cmp(&a.points));
        Ok(clubs)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
