//! Historical z-scores and breakout scoring
//!
//! Expanding in-season baselines lagged one week, plus league-wide
//! prior-season baselines, combined into a composite breakout signal.
//! A week with no in-season history produces no output row at all.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::features::player_week::PlayerWeekRow;
use crate::features::policy;
use crate::{BreakoutWeights, PlayerId, Season};

/// Z-score and baseline features for one player-week
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakoutFeatures {
    pub points_mean_season: f64,
    pub points_std_season: f64,
    pub assists_mean_season: f64,
    pub assists_std_season: f64,
    pub plus_minus_mean_season: f64,
    pub plus_minus_std_season: f64,
    pub z_points: f64,
    pub z_assists: f64,
    pub z_plus_minus: f64,
    pub breakout_score: f64,
    pub league_z_points: f64,
    pub league_z_assists: f64,
    pub league_z_plus_minus: f64,
}

/// A player-week row with its breakout features
#[derive(Debug, Clone)]
pub struct ScoredWeek {
    pub week: PlayerWeekRow,
    pub breakout: BreakoutFeatures,
}

/// Scoring result
#[derive(Debug)]
pub struct ScoredWeeks {
    pub rows: Vec<ScoredWeek>,
    /// First-of-season weeks excluded for lack of history
    pub first_weeks_dropped: usize,
}

/// Expanding mean and population standard deviation (Welford form)
#[derive(Debug, Clone, Copy, Default)]
struct Expanding {
    n: u32,
    mean: f64,
    m2: f64,
}

impl Expanding {
    fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / f64::from(self.n);
        self.m2 += delta * (x - self.mean);
    }

    fn std(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            (self.m2 / f64::from(self.n)).max(0.0).sqrt()
        }
    }
}

/// League-wide per-season baseline (sample standard deviation)
#[derive(Debug, Clone, Copy)]
struct LeagueBaseline {
    points_mean: f64,
    points_std: f64,
    assists_mean: f64,
    assists_std: f64,
    plus_minus_mean: f64,
    plus_minus_std: f64,
}

fn sample_stats(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}

/// Score weekly rows.
///
/// `rows` must be sorted by (player, season, week_start), the order
/// `aggregate_weeks` produces. Output keeps that order, minus the dropped
/// first weeks.
pub fn score_weeks(rows: Vec<PlayerWeekRow>, weights: &BreakoutWeights) -> ScoredWeeks {
    // Pass 1: expanding in-season baselines, lagged one week
    let partitions = partition_ranges(&rows);
    let scored: Vec<Vec<(PlayerWeekRow, BreakoutFeatures)>> = partitions
        .into_par_iter()
        .map(|(start, end)| scan_partition(&rows[start..end], weights))
        .collect();
    let mut scored: Vec<(PlayerWeekRow, BreakoutFeatures)> =
        scored.into_iter().flatten().collect();
    let first_weeks_dropped = rows.len() - scored.len();

    // Pass 2: league baselines over the retained rows, attributed to the
    // following season
    let mut by_season: HashMap<Season, (Vec<f64>, Vec<f64>, Vec<f64>)> = HashMap::new();
    for (week, _) in &scored {
        let entry = by_season.entry(week.season).or_default();
        entry.0.push(f64::from(week.points));
        entry.1.push(f64::from(week.assists));
        entry.2.push(week.plus_minus as f64);
    }
    let baselines: HashMap<Season, LeagueBaseline> = by_season
        .into_iter()
        .map(|(season, (pts, ast, pm))| {
            let (points_mean, points_std) = sample_stats(&pts);
            let (assists_mean, assists_std) = sample_stats(&ast);
            let (plus_minus_mean, plus_minus_std) = sample_stats(&pm);
            (
                season.next(),
                LeagueBaseline {
                    points_mean,
                    points_std,
                    assists_mean,
                    assists_std,
                    plus_minus_mean,
                    plus_minus_std,
                },
            )
        })
        .collect();

    for (week, features) in &mut scored {
        match baselines.get(&week.season) {
            Some(base) => {
                features.league_z_points =
                    policy::zscore(f64::from(week.points), base.points_mean, base.points_std);
                features.league_z_assists =
                    policy::zscore(f64::from(week.assists), base.assists_mean, base.assists_std);
                features.league_z_plus_minus = policy::zscore(
                    week.plus_minus as f64,
                    base.plus_minus_mean,
                    base.plus_minus_std,
                );
            }
            None => {
                features.league_z_points = policy::NO_BASELINE_LEAGUE_Z;
                features.league_z_assists = policy::NO_BASELINE_LEAGUE_Z;
                features.league_z_plus_minus = policy::NO_BASELINE_LEAGUE_Z;
            }
        }
    }

    ScoredWeeks {
        rows: scored
            .into_iter()
            .map(|(week, breakout)| ScoredWeek { week, breakout })
            .collect(),
        first_weeks_dropped,
    }
}

fn partition_key(row: &PlayerWeekRow) -> (PlayerId, Season) {
    (row.player_id, row.season)
}

fn partition_ranges(rows: &[PlayerWeekRow]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for i in 1..=rows.len() {
        if i == rows.len() || partition_key(&rows[i]) != partition_key(&rows[start]) {
            ranges.push((start, i));
            start = i;
        }
    }
    ranges
}

fn scan_partition(
    partition: &[PlayerWeekRow],
    weights: &BreakoutWeights,
) -> Vec<(PlayerWeekRow, BreakoutFeatures)> {
    let mut points = Expanding::default();
    let mut assists = Expanding::default();
    let mut plus_minus = Expanding::default();
    let mut out = Vec::with_capacity(partition.len().saturating_sub(1));

    for week in partition {
        if points.n > 0 {
            let z_points =
                policy::zscore(f64::from(week.points), points.mean, points.std());
            let z_assists =
                policy::zscore(f64::from(week.assists), assists.mean, assists.std());
            let z_plus_minus =
                policy::zscore(week.plus_minus as f64, plus_minus.mean, plus_minus.std());

            out.push((
                week.clone(),
                BreakoutFeatures {
                    points_mean_season: points.mean,
                    points_std_season: points.std(),
                    assists_mean_season: assists.mean,
                    assists_std_season: assists.std(),
                    plus_minus_mean_season: plus_minus.mean,
                    plus_minus_std_season: plus_minus.std(),
                    z_points,
                    z_assists,
                    z_plus_minus,
                    breakout_score: weights.points * z_points
                        + weights.assists * z_assists
                        + weights.plus_minus * z_plus_minus,
                    league_z_points: policy::NO_BASELINE_LEAGUE_Z,
                    league_z_assists: policy::NO_BASELINE_LEAGUE_Z,
                    league_z_plus_minus: policy::NO_BASELINE_LEAGUE_Z,
                },
            ));
        }

        points.push(f64::from(week.points));
        assists.push(f64::from(week.assists));
        plus_minus.push(week.plus_minus as f64);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::player_week::{CarriedTeamPrior, TeamWeek, WeekBuckets};
    use crate::features::SeasonAwardFlags;
    use chrono::NaiveDate;

    fn weights() -> BreakoutWeights {
        BreakoutWeights {
            points: 0.5,
            assists: 0.3,
            plus_minus: 0.2,
        }
    }

    fn make_week(
        player: i64,
        season: i32,
        week_offset: u32,
        points: u32,
        assists: u32,
        plus_minus: i64,
    ) -> PlayerWeekRow {
        let base = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        PlayerWeekRow {
            player_id: PlayerId(player),
            full_name: "Test Player".to_string(),
            team_name: "Celtics".to_string(),
            season: Season(season),
            week_start: base + chrono::Duration::weeks(i64::from(week_offset)),
            conference: None,
            games_played: 3,
            minutes: 90.0,
            points,
            assists,
            blocks: 2,
            steals: 3,
            rebounds_total: 20,
            rebounds_offensive: 5,
            rebounds_defensive: 15,
            field_goals_attempted: 40,
            field_goals_made: 20,
            three_pointers_attempted: 10,
            three_pointers_made: 4,
            free_throws_attempted: 10,
            free_throws_made: 8,
            turnovers: 6,
            fouls_personal: 7,
            plus_minus,
            plus_minus_mean: plus_minus as f64 / 3.0,
            field_goals_pct: 0.5,
            three_pointers_pct: 0.4,
            free_throws_pct: 0.8,
            wins: 2,
            wins_vs_over_500: 1,
            wins_vs_team_with_all_nba_player: 0,
            games_vs_all_nba_opponent: 0,
            avg_opp_score: 100.0,
            avg_opp_winrate_prior: 0.5,
            avg_opp_wins_prior: 3.0,
            avg_opp_losses_prior: 3.0,
            buckets: WeekBuckets::default(),
            team_prior: CarriedTeamPrior::default(),
            team_week: TeamWeek::default(),
            season_awards: SeasonAwardFlags::default(),
            won_player_of_the_week: false,
            pow_winner_id: None,
            pow_winner_name: None,
        }
    }

    #[test]
    fn test_first_week_dropped_not_null_filled() {
        let rows = vec![
            make_week(1, 2024, 0, 10, 5, 2),
            make_week(1, 2024, 1, 20, 6, 3),
        ];
        let scored = score_weeks(rows, &weights());

        assert_eq!(scored.rows.len(), 1);
        assert_eq!(scored.first_weeks_dropped, 1);
        assert_eq!(scored.rows[0].week.points, 20);
    }

    #[test]
    fn test_z_score_determinism_example() {
        // Weekly points [10, 20, 30]: week 3's z must be
        // (30 - mean(10, 20)) / population_std(10, 20) = (30 - 15) / 5 = 3.0
        let rows = vec![
            make_week(1, 2024, 0, 10, 5, 2),
            make_week(1, 2024, 1, 20, 5, 2),
            make_week(1, 2024, 2, 30, 5, 2),
        ];
        let scored = score_weeks(rows, &weights());

        let third = &scored.rows[1];
        assert!((third.breakout.points_mean_season - 15.0).abs() < 1e-9);
        assert!((third.breakout.points_std_season - 5.0).abs() < 1e-9);
        assert!((third.breakout.z_points - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_std_scores_zero() {
        // Constant history: the second retained week sees std 0
        let rows = vec![
            make_week(1, 2024, 0, 10, 5, 2),
            make_week(1, 2024, 1, 10, 5, 2),
            make_week(1, 2024, 2, 10, 5, 2),
        ];
        let scored = score_weeks(rows, &weights());

        for row in &scored.rows {
            assert_eq!(row.breakout.z_points, 0.0);
            assert_eq!(row.breakout.breakout_score, 0.0);
        }
    }

    #[test]
    fn test_breakout_composite_weighting() {
        let rows = vec![
            make_week(1, 2024, 0, 10, 4, 0),
            make_week(1, 2024, 1, 20, 8, 4),
            make_week(1, 2024, 2, 30, 12, 8),
        ];
        let scored = score_weeks(rows, &weights());
        let third = &scored.rows[1];

        let expected = 0.5 * third.breakout.z_points
            + 0.3 * third.breakout.z_assists
            + 0.2 * third.breakout.z_plus_minus;
        assert!((third.breakout.breakout_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_partitions_reset_across_seasons() {
        let rows = vec![
            make_week(1, 2023, 0, 10, 5, 2),
            make_week(1, 2023, 1, 20, 5, 2),
            make_week(1, 2024, 0, 30, 5, 2),
            make_week(1, 2024, 1, 40, 5, 2),
        ];
        let scored = score_weeks(rows, &weights());

        // One week dropped per (player, season) partition
        assert_eq!(scored.first_weeks_dropped, 2);
        assert_eq!(scored.rows.len(), 2);
        // The 2024 retained week's baseline comes only from 2024 history
        let row_2024 = scored
            .rows
            .iter()
            .find(|r| r.week.season == Season(2024))
            .unwrap();
        assert!((row_2024.breakout.points_mean_season - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_league_z_defaults_to_zero_for_first_season() {
        let rows = vec![
            make_week(1, 2024, 0, 10, 5, 2),
            make_week(1, 2024, 1, 20, 5, 2),
        ];
        let scored = score_weeks(rows, &weights());

        // 2024 is the first observed season: no prior-season baseline
        assert_eq!(scored.rows[0].breakout.league_z_points, 0.0);
        assert_eq!(scored.rows[0].breakout.league_z_assists, 0.0);
        assert_eq!(scored.rows[0].breakout.league_z_plus_minus, 0.0);
    }

    #[test]
    fn test_league_baseline_attributed_to_following_season() {
        // Two players in 2023 establish a league baseline; a 2024 week is
        // normalized against it
        let rows = vec![
            make_week(1, 2023, 0, 10, 5, 2),
            make_week(1, 2023, 1, 20, 5, 2),
            make_week(2, 2023, 0, 10, 5, 2),
            make_week(2, 2023, 1, 40, 5, 2),
            make_week(1, 2024, 0, 10, 5, 2),
            make_week(1, 2024, 1, 30, 5, 2),
        ];
        let scored = score_weeks(rows, &weights());

        // Retained 2023 rows: points 20 and 40 -> mean 30, sample std ~14.14
        let row_2024 = scored
            .rows
            .iter()
            .find(|r| r.week.season == Season(2024))
            .unwrap();
        let expected = (30.0 - 30.0) / (2.0f64 * 100.0).sqrt().max(1e-12);
        assert!((row_2024.breakout.league_z_points - expected).abs() < 1e-9);
    }
}
