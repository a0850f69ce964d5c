//! Form submissions from the dashboard page.
//!
//! Browsers send everything as text, and the page must never reject a
//! request just because a number field was blank or garbled, so integers
//! are read leniently: the leading integer prefix, else 0.

use serde::Deserialize;

use crate::types::NewClub;

/// Raw `POST /` body. Every field is optional; `action` selects the handler.
#[derive(Debug, Default, Deserialize)]
pub struct ActionForm {
    pub action: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub matches_played: Option<String>,
    pub wins: Option<String>,
    pub losses: Option<String>,
    pub draws: Option<String>,
}

/// A recognised form action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddClub(NewClub),
    DeleteClub(i64),
    CalculateProbability,
    /// Missing or unrecognised `action`; the page is simply re-rendered.
    None,
}

impl ActionForm {
    pub fn action(&self) -> Action {
        match self.action.as_deref() {
            Some("add_club") => Action::AddClub(NewClub {
                name: self.name.as_deref().unwrap_or("").trim().to_string(),
                matches_played: lenient_int(self.matches_played.as_deref()),
                wins: lenient_int(self.wins.as_deref()),
                losses: lenient_int(self.losses.as_deref()),
                draws: lenient_int(self.draws.as_deref()),
            }),
            Some("delete_club") => Action::DeleteClub(lenient_int(self.id.as_deref())),
            Some("calculate_probability") => Action::CalculateProbability,
            _ => Action::None,
        }
    }
}

/// Parse the leading integer of `raw`, ignoring leading whitespace.
///
/// `"12abc"` → 12, `"abc"` → 0, `"-3"` → -3. Out-of-range values saturate.
pub fn lenient_int(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return 0;
    };
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return 0;
    }

    match digits.parse::<i64>() {
        Ok(v) if negative => -v,
        Ok(v) => v,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    }
}
