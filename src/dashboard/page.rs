//! Server-rendered dashboard page.
//!
//! One page: the add-club form, the club table (raw records or projections)
//! and, after a calculation, an analysis summary. Styles and the small
//! client-side script are compiled in from `templates/`.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::estimator::MIN_CLUBS;
use crate::types::{Club, Projection, StatusMessage, MAX_NAME_LEN, SEASON_MATCHES};

const STYLE_CSS: &str = include_str!("templates/style.css");
const SCRIPT_JS: &str = include_str!("templates/script.js");

/// Everything one render needs.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    /// Current store contents, points order.
    pub clubs: &'a [Club],
    /// Set after a successful `calculate_probability`.
    pub projections: Option<&'a [Projection]>,
    pub message: Option<&'a StatusMessage>,
}

/// Render the full HTML document.
pub fn render(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(16 * 1024);

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Premier League Title Probability Analysis</title>
<style>{STYLE_CSS}</style>
</head>
<body>
<div class="container">
<header class="header">
<h1>Premier League Title Probability Analysis</h1>
<p class="subtitle">Predicting the champion with a binomial distribution</p>
</header>
"#
    ));

    if let Some(msg) = view.message {
        html.push_str(&format!(
            "<div class=\"message {}\">{}</div>\n",
            msg.severity,
            escape(&msg.text)
        ));
    }

    html.push_str("<div class=\"dashboard\">\n");
    html.push_str(&add_form());
    html.push_str(&club_card(view));
    html.push_str("</div>\n");

    html.push_str(&format!(
        r#"<footer class="footer">
<p>Premier League Title Probability Analysis</p>
<p>Champion prediction by binomial distribution</p>
</footer>
</div>
<script>{SCRIPT_JS}</script>
</body>
</html>
"#
    ));

    html
}

fn add_form() -> String {
    let number_input = |id: &str, label: &str| {
        format!(
            r#"<div class="form-group">
<label for="{id}">{label}</label>
<input type="number" id="{id}" name="{id}" min="0" max="{SEASON_MATCHES}" value="0" required>
</div>
"#
        )
    };

    format!(
        r#"<div class="card">
<h2>Add New Club</h2>
<form method="POST" action="/" class="form" id="clubForm">
<input type="hidden" name="action" value="add_club">
<div class="form-group">
<label for="name">Club Name</label>
<input type="text" id="name" name="name" required placeholder="e.g. Manchester United" maxlength="{MAX_NAME_LEN}">
</div>
<div class="form-row">
{played}{wins}</div>
<div class="form-row">
{losses}{draws}</div>
<div class="form-group">
<div class="points-display">
<span>Points: <strong id="pointsDisplay">0</strong></span>
<small>(3 per win, 1 per draw)</small>
</div>
</div>
<button type="submit" class="btn btn-primary">Save Club</button>
<button type="button" class="btn btn-secondary" id="clearForm">Clear Form</button>
</form>
</div>
"#,
        played = number_input("matches_played", "Played"),
        wins = number_input("wins", "Won"),
        losses = number_input("losses", "Lost"),
        draws = number_input("draws", "Drawn"),
    )
}

fn club_card(view: &PageView<'_>) -> String {
    let disabled = if view.clubs.len() < MIN_CLUBS { " disabled" } else { "" };
    let mut html = format!(
        r#"<div class="card">
<div class="card-header">
<h2>League Clubs</h2>
<form method="POST" action="/" class="inline-form">
<input type="hidden" name="action" value="calculate_probability">
<button type="submit" class="btn btn-success"{disabled}>Calculate Probability</button>
</form>
</div>
"#
    );

    if view.clubs.is_empty() {
        html.push_str(
            "<div class=\"empty-state\"><p>No clubs yet. Add a club to get started.</p></div>\n</div>\n",
        );
        return html;
    }

    html.push_str("<div class=\"table-container\">\n<table class=\"data-table\">\n<thead><tr>");
    html.push_str("<th>#</th><th>Club</th><th>P</th><th>W</th><th>L</th><th>D</th><th>Pts</th>");
    if view.projections.is_some() {
        html.push_str(
            "<th>Win Prob.</th><th>Remaining</th><th>Projected Pts</th><th>Title Probability</th>",
        );
    }
    html.push_str("<th></th></tr></thead>\n<tbody>\n");

    match view.projections {
        Some(projections) => {
            for (i, p) in projections.iter().enumerate() {
                let extra = format!(
                    "<td>{}%</td><td>{}</td><td>{}</td><td><div class=\"probability-bar\"><div class=\"probability-fill\" style=\"width: {}%\"></div><span>{}%</span></div></td>",
                    format_decimal(p.win_probability * 100.0, 1),
                    p.remaining_matches,
                    format_decimal(p.expected_total_points, 2),
                    format_decimal(p.champion_probability.clamp(0.0, 100.0), 2),
                    format_decimal(p.champion_probability, 2),
                );
                html.push_str(&club_row(i + 1, &p.club, &extra));
            }
        }
        None => {
            for (i, club) in view.clubs.iter().enumerate() {
                html.push_str(&club_row(i + 1, club, ""));
            }
        }
    }
    html.push_str("</tbody>\n</table>\n</div>\n");

    if let Some(leader) = view.projections.and_then(|p| p.first()) {
        html.push_str(&format!(
            r#"<div class="summary">
<h3>Analysis Summary</h3>
<p>Binomial distribution over {count} clubs:</p>
<ul>
<li>Most likely champion: <strong>{name}</strong> ({prob}%)</li>
<li>Matches per season: {SEASON_MATCHES}</li>
<li>Win probability is wins divided by matches played so far</li>
</ul>
</div>
"#,
            count = view.clubs.len(),
            name = escape(&leader.club.name),
            prob = format_decimal(leader.champion_probability, 2),
        ));
    }

    html.push_str("</div>\n");
    html
}

fn club_row(position: usize, club: &Club, extra_cells: &str) -> String {
    format!(
        r#"<tr><td>{position}</td><td class="club-name">{name}</td><td>{mp}</td><td>{w}</td><td>{l}</td><td>{d}</td><td><span class="badge">{pts}</span></td>{extra_cells}<td><form method="POST" action="/" class="delete-form"><input type="hidden" name="action" value="delete_club"><input type="hidden" name="id" value="{id}"><button type="submit" class="btn btn-danger btn-sm">Delete</button></form></td></tr>
"#,
        name = escape(&club.name),
        mp = club.matches_played,
        w = club.wins,
        l = club.losses,
        d = club.draws,
        pts = club.points,
        id = club.id,
    )
}

/// Round half away from zero to `places` and drop trailing zeros.
///
/// `62.0` → `"62"`, `89.670` → `"89.67"`.
pub fn format_decimal(value: f64, places: u32) -> String {
    match Decimal::from_f64(value) {
        Some(d) => d
            .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
            .to_string(),
        None => value.to_string(),
    }
}

/// Escape text for use in HTML content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}
