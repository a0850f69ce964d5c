//! Shared types for the title-odds service.
//!
//! The data model used by the store, the estimator and the web layer.
//! Kept free of storage and HTTP concerns so every module can depend on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixtures per club in one season.
pub const SEASON_MATCHES: u32 = 38;

/// Longest accepted club name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Points awarded for a win.
pub const POINTS_PER_WIN: u32 = 3;

/// Points awarded for a draw.
pub const POINTS_PER_DRAW: u32 = 1;

// ---------------------------------------------------------------------------
// Club
// ---------------------------------------------------------------------------

/// A club's season record as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Club {
    pub id: i64,
    pub name: String,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// wins×3 + draws×1, computed once on creation.
    pub points: u32,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Club {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} (P{} W{} L{} D{} | {} pts)",
            self.id, self.name, self.matches_played, self.wins, self.losses, self.draws, self.points,
        )
    }
}

impl Club {
    /// Build a club record directly, bypassing validation. Test helper.
    #[cfg(test)]
    pub fn sample(id: i64, name: &str, matches_played: u32, wins: u32, losses: u32, draws: u32) -> Self {
        Club {
            id,
            name: name.to_string(),
            matches_played,
            wins,
            losses,
            draws,
            points: season_points(wins, draws),
            created_at: Utc::now(),
        }
    }
}

/// League points for a results line.
pub fn season_points(wins: u32, draws: u32) -> u32 {
    wins * POINTS_PER_WIN + draws * POINTS_PER_DRAW
}

// ---------------------------------------------------------------------------
// New club submissions
// ---------------------------------------------------------------------------

/// An unvalidated "add club" submission.
///
/// Counts are signed because form input is parsed leniently and may be
/// negative; [`NewClub::validate`] rejects that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClub {
    pub name: String,
    #[serde(default)]
    pub matches_played: i64,
    #[serde(default)]
    pub wins: i64,
    #[serde(default)]
    pub losses: i64,
    #[serde(default)]
    pub draws: i64,
}

/// A submission that passed every check that doesn't need the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidClub {
    pub name: String,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub points: u32,
}

impl NewClub {
    pub fn new(name: impl Into<String>, matches_played: i64, wins: i64, losses: i64, draws: i64) -> Self {
        Self {
            name: name.into(),
            matches_played,
            wins,
            losses,
            draws,
        }
    }

    /// Check the submission and compute its points.
    ///
    /// The duplicate-name rule is enforced by the store, which is the only
    /// place that can see the other names atomically.
    pub fn validate(&self) -> Result<ValidClub, LeagueError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LeagueError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(LeagueError::NameTooLong { max: MAX_NAME_LEN });
        }

        let counts = [self.matches_played, self.wins, self.losses, self.draws];
        if counts.iter().any(|&c| c < 0) {
            return Err(LeagueError::NegativeCount);
        }
        if self.matches_played > i64::from(SEASON_MATCHES) {
            return Err(LeagueError::TooManyMatches {
                played: self.matches_played,
                max: SEASON_MATCHES,
            });
        }

        let results = self.wins.saturating_add(self.losses).saturating_add(self.draws);
        if results > self.matches_played {
            return Err(LeagueError::InconsistentResults {
                results,
                played: self.matches_played,
            });
        }

        // Every count is now within 0..=38, so the narrowing casts are exact.
        let wins = self.wins as u32;
        let draws = self.draws as u32;
        Ok(ValidClub {
            name: name.to_string(),
            matches_played: self.matches_played as u32,
            wins,
            losses: self.losses as u32,
            draws,
            points: season_points(wins, draws),
        })
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// A club snapshot with its season-end estimates. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    #[serde(flatten)]
    pub club: Club,
    pub remaining_matches: u32,
    /// wins / matches_played, unrounded.
    pub win_probability: f64,
    pub expected_wins: f64,
    pub expected_total_points: f64,
    /// Share of all projected points, in percent.
    pub champion_probability: f64,
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | win={:.1}% left={} xPts={} title={}%",
            self.club.name,
            self.win_probability * 100.0,
            self.remaining_matches,
            self.expected_total_points,
            self.champion_probability,
        )
    }
}

// ---------------------------------------------------------------------------
// Status messages
// ---------------------------------------------------------------------------

/// Severity of a transient status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Success => write!(f, "success"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A one-shot message shown above the club table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub severity: Severity,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

impl From<&LeagueError> for StatusMessage {
    fn from(err: &LeagueError) -> Self {
        StatusMessage::error(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain errors. Every variant except `Storage` is the user's to fix.
#[derive(Debug, thiserror::Error)]
pub enum LeagueError {
    #[error("Club name must not be empty")]
    EmptyName,

    #[error("Club name must be at most {max} characters")]
    NameTooLong { max: usize },

    #[error("Match counts must not be negative")]
    NegativeCount,

    #[error("Matches played ({played}) cannot exceed {max} in a season")]
    TooManyMatches { played: i64, max: u32 },

    #[error("Wins + losses + draws ({results}) cannot exceed matches played ({played})")]
    InconsistentResults { results: i64, played: i64 },

    #[error("Club name '{0}' already exists")]
    DuplicateName(String),

    #[error("At least {required} clubs are required to calculate probabilities (have {available})")]
    InsufficientData { required: usize, available: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl LeagueError {
    /// Whether this is a rejected submission rather than a system fault.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LeagueError::EmptyName
                | LeagueError::NameTooLong { .. }
                | LeagueError::NegativeCount
                | LeagueError::TooManyMatches { .. }
                | LeagueError::InconsistentResults { .. }
                | LeagueError::DuplicateName(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
