//! Champion probability estimator.
//!
//! Extrapolates each club's current win rate over its remaining fixtures,
//! then expresses every club's projected points as a share of the league's
//! projected total. The interface calls this a binomial model; the arithmetic
//! is a linear expectation and must stay that way.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::types::{Club, LeagueError, Projection, POINTS_PER_WIN, SEASON_MATCHES};

/// Fewest clubs a projection makes sense for.
pub const MIN_CLUBS: usize = 2;

/// Project every club to the end of the season and rank by title chance.
///
/// Order among equal champion probabilities is unspecified.
pub fn estimate(clubs: &[Club]) -> Result<Vec<Projection>, LeagueError> {
    if clubs.len() < MIN_CLUBS {
        return Err(LeagueError::InsufficientData {
            required: MIN_CLUBS,
            available: clubs.len(),
        });
    }

    let mut projections: Vec<Projection> = clubs.iter().map(project).collect();

    let total: f64 = projections.iter().map(|p| p.expected_total_points).sum();
    for p in &mut projections {
        p.champion_probability = if total > 0.0 {
            round2(p.expected_total_points / total * 100.0)
        } else {
            0.0
        };
    }

    projections.sort_by(|a, b| b.champion_probability.total_cmp(&a.champion_probability));

    debug!(
        clubs = projections.len(),
        total_expected_points = total,
        leader = projections.first().map(|p| p.club.name.as_str()).unwrap_or(""),
        "Champion probabilities computed"
    );

    Ok(projections)
}

/// Season-end projection for one club, before normalisation.
fn project(club: &Club) -> Projection {
    let remaining = SEASON_MATCHES.saturating_sub(club.matches_played);

    // A finished season (remaining == 0) keeps its actual points.
    let (win_probability, expected_wins, expected_total_points) =
        if club.matches_played > 0 && remaining > 0 {
            let p = f64::from(club.wins) / f64::from(club.matches_played);
            let wins = f64::from(remaining) * p;
            let total = f64::from(club.points) + wins * f64::from(POINTS_PER_WIN);
            (p, round2(wins), round2(total))
        } else {
            (0.0, 0.0, f64::from(club.points))
        };

    Projection {
        club: club.clone(),
        remaining_matches: remaining,
        win_probability,
        expected_wins,
        expected_total_points,
        champion_probability: 0.0,
    }
}

/// Round to two decimal places, halves away from zero.
///
/// Goes through `Decimal` so that values such as 1.005 round the way they
/// read rather than the way their binary approximation does.
pub fn round2(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rejects_empty_and_single() {
        let err = estimate(&[]).unwrap_err();
        assert!(matches!(err, LeagueError::InsufficientData { required: 2, available: 0 }));

        let one = [Club::sample(1, "Solo", 10, 5, 5, 0)];
        let err = estimate(&one).unwrap_err();
        assert!(matches!(err, LeagueError::InsufficientData { available: 1, .. }));
    }

    #[test]
    fn test_finished_season_vs_midseason() {
        let a = Club::sample(1, "A", 38, 32, 3, 3);
        let b = Club::sample(2, "B", 20, 10, 5, 5);
        assert_eq!(a.points, 99);
        assert_eq!(b.points, 35);

        let result = estimate(&[b, a]).unwrap();
        assert_eq!(result.len(), 2);

        let first = &result[0];
        assert_eq!(first.club.name, "A");
        assert_eq!(first.remaining_matches, 0);
        assert_eq!(first.win_probability, 0.0);
        assert_eq!(first.expected_wins, 0.0);
        assert!(close(first.expected_total_points, 99.0));
        assert!(close(first.champion_probability, 61.49));

        let second = &result[1];
        assert_eq!(second.club.name, "B");
        assert_eq!(second.remaining_matches, 18);
        assert!(close(second.win_probability, 0.5));
        assert!(close(second.expected_wins, 9.0));
        assert!(close(second.expected_total_points, 62.0));
        assert!(close(second.champion_probability, 38.51));
    }

    #[test]
    fn test_points_follow_results_not_a_stated_total() {
        // 30 wins and 3 draws is 93 points, so the shares are an even 60/40.
        let a = Club::sample(1, "A", 38, 30, 5, 3);
        let b = Club::sample(2, "B", 20, 10, 5, 5);
        assert_eq!(a.points, 93);

        let result = estimate(&[a, b]).unwrap();
        assert!(close(result[0].expected_total_points, 93.0));
        assert!(close(result[0].champion_probability, 60.0));
        assert!(close(result[1].expected_total_points, 62.0));
        assert!(close(result[1].champion_probability, 40.0));
    }

    #[test]
    fn test_no_matches_played() {
        let fresh = Club::sample(1, "Fresh", 0, 0, 0, 0);
        let other = Club::sample(2, "Other", 10, 4, 4, 2);
        let result = estimate(&[fresh, other]).unwrap();
        let fresh = result.iter().find(|p| p.club.name == "Fresh").unwrap();
        assert_eq!(fresh.remaining_matches, 38);
        assert_eq!(fresh.win_probability, 0.0);
        assert_eq!(fresh.expected_wins, 0.0);
        assert_eq!(fresh.expected_total_points, 0.0);
        assert_eq!(fresh.champion_probability, 0.0);
    }

    #[test]
    fn test_all_zero_points_gives_zero_probabilities() {
        let clubs = [
            Club::sample(1, "X", 0, 0, 0, 0),
            Club::sample(2, "Y", 0, 0, 0, 0),
        ];
        let result = estimate(&clubs).unwrap();
        assert!(result.iter().all(|p| p.champion_probability == 0.0));
    }

    #[test]
    fn test_expected_values_are_rounded() {
        // 7 wins in 9 matches: p = 0.777..., 29 remaining => 22.555... wins.
        let c = Club::sample(1, "R", 9, 7, 1, 1);
        let d = Club::sample(2, "S", 9, 1, 7, 1);
        let result = estimate(&[c, d]).unwrap();
        let r = result.iter().find(|p| p.club.name == "R").unwrap();
        assert!(close(r.expected_wins, 22.56));
        // 22 pts + 22.5555...*3 = 89.6666...
        assert!(close(r.expected_total_points, 89.67));
        assert!(close(r.win_probability, 7.0 / 9.0));
    }

    #[test]
    fn test_ranked_descending() {
        let clubs = [
            Club::sample(1, "Low", 10, 1, 9, 0),
            Club::sample(2, "High", 10, 9, 1, 0),
            Club::sample(3, "Mid", 10, 5, 5, 0),
        ];
        let result = estimate(&clubs).unwrap();
        let names: Vec<_> = result.iter().map(|p| p.club.name.as_str()).collect();
        assert_eq!(names, ["High", "Mid", "Low"]);
        assert!(result
            .windows(2)
            .all(|w| w[0].champion_probability >= w[1].champion_probability));
    }

    #[test]
    fn test_probabilities_sum_to_about_100() {
        let mut clubs = Vec::new();
        for i in 0..20u32 {
            let played = (i * 7) % 39;
            let wins = played / 2;
            let draws = (played - wins) / 3;
            let losses = played - wins - draws;
            clubs.push(Club::sample(i64::from(i) + 1, &format!("Club {i}"), played, wins, losses, draws));
        }
        let result = estimate(&clubs).unwrap();
        let sum: f64 = result.iter().map(|p| p.champion_probability).sum();
        // Each entry carries at most 0.005 of rounding error.
        assert!((sum - 100.0).abs() <= 0.005 * clubs.len() as f64, "sum = {sum}");
    }

    #[test]
    fn test_projection_keeps_club_snapshot() {
        let a = Club::sample(7, "Keep", 12, 6, 3, 3);
        let b = Club::sample(8, "Other", 12, 3, 6, 3);
        let result = estimate(&[a.clone(), b]).unwrap();
        let keep = result.iter().find(|p| p.club.id == 7).unwrap();
        assert_eq!(keep.club, a);
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert!(close(round2(61.4906), 61.49));
        assert!(close(round2(38.5093), 38.51));
        assert!(close(round2(2.346), 2.35));
        assert!(close(round2(-2.346), -2.35));
        assert!(close(round2(0.125), 0.13));
        assert!(close(round2(10.0), 10.0));
    }
}
