//! Prior-state aggregation
//!
//! Walks each sorted (team, season) partition and maintains running
//! counters, emitting every "prior" field from the state *before* the
//! current game is folded in. A record never sees its own outcome.

use chrono::Datelike;
use rayon::prelude::*;

use crate::features::normalizer::TeamGameRecord;
use crate::{Season, TeamId};

/// Running totals for one (team, season) partition
#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonState {
    games: u32,
    wins: u32,
    losses: u32,
    home_games: u32,
    home_wins: u32,
    home_losses: u32,
    away_games: u32,
    away_wins: u32,
    away_losses: u32,
    win_streak: u32,
    home_win_streak: u32,
    away_win_streak: u32,
}

/// Season-scoped prior fields for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamPrior {
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub record: String,
    pub home_games: u32,
    pub home_wins: u32,
    pub home_losses: u32,
    pub home_record: String,
    pub away_games: u32,
    pub away_wins: u32,
    pub away_losses: u32,
    pub away_record: String,
    pub win_streak: u32,
    pub home_win_streak: u32,
    pub away_win_streak: u32,
}

fn record_string(wins: u32, losses: u32) -> String {
    format!("{}-{}", wins, losses)
}

impl SeasonState {
    /// Prior fields visible to the next record, taken before `apply`.
    pub fn emit(&self) -> TeamPrior {
        TeamPrior {
            games: self.games,
            wins: self.wins,
            losses: self.losses,
            record: record_string(self.wins, self.losses),
            home_games: self.home_games,
            home_wins: self.home_wins,
            home_losses: self.home_losses,
            home_record: record_string(self.home_wins, self.home_losses),
            away_games: self.away_games,
            away_wins: self.away_wins,
            away_losses: self.away_losses,
            away_record: record_string(self.away_wins, self.away_losses),
            win_streak: self.win_streak,
            home_win_streak: self.home_win_streak,
            away_win_streak: self.away_win_streak,
        }
    }

    /// Fold one record's outcome into the running state.
    ///
    /// A win extends the overall streak and the matching home/away streak;
    /// a loss resets those two. The opposing streak is left untouched.
    pub fn apply(&mut self, rec: &TeamGameRecord) {
        self.games += 1;
        if rec.is_home {
            self.home_games += 1;
        } else {
            self.away_games += 1;
        }

        if rec.is_win {
            self.wins += 1;
            self.win_streak += 1;
            if rec.is_home {
                self.home_wins += 1;
                self.home_win_streak += 1;
            } else {
                self.away_wins += 1;
                self.away_win_streak += 1;
            }
        } else {
            self.losses += 1;
            self.win_streak = 0;
            if rec.is_home {
                self.home_losses += 1;
                self.home_win_streak = 0;
            } else {
                self.away_losses += 1;
                self.away_win_streak = 0;
            }
        }
    }
}

/// Week-scoped running totals, reset at each new ISO week
#[derive(Debug, Clone, Copy, Default)]
struct WeekState {
    games: u32,
    wins: u32,
    losses: u32,
}

/// Week-scoped prior fields for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekPrior {
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub record: String,
}

impl WeekState {
    fn emit(&self) -> WeekPrior {
        WeekPrior {
            games: self.games,
            wins: self.wins,
            losses: self.losses,
            record: record_string(self.wins, self.losses),
        }
    }

    fn apply(&mut self, rec: &TeamGameRecord) {
        self.games += 1;
        if rec.is_win {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }
}

fn iso_week_key(date: chrono::NaiveDate) -> (i32, u32) {
    let iso = date.iso_week();
    (iso.year(), iso.week())
}

/// Compute season- and week-scoped priors for every record.
///
/// `records` must be sorted by (team, season, date, game_id); partitions
/// are contiguous runs and are processed independently, so the scan is
/// parallelized per partition and reassembled in order.
pub fn compute_priors(records: &[TeamGameRecord]) -> Vec<(TeamPrior, WeekPrior)> {
    let per_partition: Vec<Vec<(TeamPrior, WeekPrior)>> = partition_slices(records)
        .into_par_iter()
        .map(scan_partition)
        .collect();
    per_partition.into_iter().flatten().collect()
}

fn partition_key(rec: &TeamGameRecord) -> (TeamId, Season) {
    (rec.team_id, rec.season)
}

/// Split sorted records into contiguous (team, season) runs
fn partition_slices(records: &[TeamGameRecord]) -> Vec<&[TeamGameRecord]> {
    let mut slices = Vec::new();
    let mut start = 0;
    for i in 1..=records.len() {
        if i == records.len() || partition_key(&records[i]) != partition_key(&records[start]) {
            slices.push(&records[start..i]);
            start = i;
        }
    }
    slices
}

fn scan_partition(partition: &[TeamGameRecord]) -> Vec<(TeamPrior, WeekPrior)> {
    let mut season_state = SeasonState::default();
    let mut week_state = WeekState::default();
    let mut current_week: Option<(i32, u32)> = None;

    partition
        .iter()
        .map(|rec| {
            let week = iso_week_key(rec.date);
            if current_week != Some(week) {
                week_state = WeekState::default();
                current_week = Some(week);
            }

            let priors = (season_state.emit(), week_state.emit());
            season_state.apply(rec);
            week_state.apply(rec);
            priors
        })
        .collect()
}

/// Cumulative prior count of wins against over-.500 opponents.
///
/// Runs after opponent enrichment: the per-game flag needs the opponent's
/// winrate at tipoff. Same emit-before-update contract, same partition
/// ordering as `compute_priors`.
pub fn wins_vs_over_500_prior(records: &[TeamGameRecord], flags: &[bool]) -> Vec<u32> {
    debug_assert_eq!(records.len(), flags.len());

    let mut out = vec![0u32; records.len()];
    let mut start = 0;
    for i in 1..=records.len() {
        if i == records.len() || partition_key(&records[i]) != partition_key(&records[start]) {
            let mut count = 0u32;
            for j in start..i {
                out[j] = count;
                if flags[j] {
                    count += 1;
                }
            }
            start = i;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::GameId;

    fn make_record(team: i64, day: u32, is_home: bool, is_win: bool) -> TeamGameRecord {
        let date = NaiveDate::from_ymd_opt(2024, 11, day).unwrap();
        TeamGameRecord {
            game_id: GameId(day as i64),
            date,
            team_id: TeamId(team),
            team_name: "Celtics".to_string(),
            opponent_id: TeamId(99),
            opponent_name: "Lakers".to_string(),
            is_home,
            team_score: if is_win { 100 } else { 90 },
            opp_score: if is_win { 90 } else { 100 },
            is_win,
            season: Season(2024),
        }
    }

    #[test]
    fn test_first_game_priors_are_zero() {
        let records = vec![make_record(1, 1, true, true)];
        let priors = compute_priors(&records);

        let (season, week) = &priors[0];
        assert_eq!(season.games, 0);
        assert_eq!(season.wins, 0);
        assert_eq!(season.losses, 0);
        assert_eq!(season.record, "0-0");
        assert_eq!(season.win_streak, 0);
        assert_eq!(week.games, 0);
        assert_eq!(week.record, "0-0");
    }

    #[test]
    fn test_wins_plus_losses_equals_games() {
        let records = vec![
            make_record(1, 1, true, true),
            make_record(1, 2, false, false),
            make_record(1, 3, true, false),
            make_record(1, 4, false, true),
            make_record(1, 5, true, true),
        ];
        let priors = compute_priors(&records);

        for (i, (season, week)) in priors.iter().enumerate() {
            assert_eq!(season.wins + season.losses, season.games);
            assert_eq!(season.games, i as u32);
            assert_eq!(season.home_games + season.away_games, season.games);
            assert_eq!(week.wins + week.losses, week.games);
        }
    }

    #[test]
    fn test_streak_reflects_state_before_game() {
        // win, win, loss, win: the prior streak on the last game must be
        // the value accumulated strictly before it (0, after the loss)
        let records = vec![
            make_record(1, 1, true, true),
            make_record(1, 2, true, true),
            make_record(1, 3, true, false),
            make_record(1, 4, true, true),
        ];
        let priors = compute_priors(&records);

        assert_eq!(priors[0].0.win_streak, 0);
        assert_eq!(priors[1].0.win_streak, 1);
        assert_eq!(priors[2].0.win_streak, 2);
        assert_eq!(priors[3].0.win_streak, 0);
    }

    #[test]
    fn test_opposing_streak_untouched_on_loss() {
        // Home wins build a home streak; an away loss must not reset it
        let records = vec![
            make_record(1, 1, true, true),
            make_record(1, 2, true, true),
            make_record(1, 3, false, false),
            make_record(1, 4, true, true),
        ];
        let priors = compute_priors(&records);

        assert_eq!(priors[3].0.home_win_streak, 2);
        // Overall streak was reset by the away loss
        assert_eq!(priors[3].0.win_streak, 0);
        assert_eq!(priors[3].0.away_win_streak, 0);
    }

    #[test]
    fn test_home_away_splits() {
        let records = vec![
            make_record(1, 1, true, true),
            make_record(1, 2, false, true),
            make_record(1, 3, true, false),
            make_record(1, 4, false, false),
        ];
        let priors = compute_priors(&records);
        let last = &priors[3].0;

        assert_eq!(last.home_games, 2);
        assert_eq!(last.home_wins, 1);
        assert_eq!(last.home_losses, 1);
        assert_eq!(last.home_record, "1-1");
        assert_eq!(last.away_games, 1);
        assert_eq!(last.away_wins, 1);
        assert_eq!(last.away_record, "1-0");
    }

    #[test]
    fn test_week_scope_resets_on_new_iso_week() {
        // 2024-11-04 is a Monday: days 1-3 fall in one ISO week, 4-5 in
        // the next
        let records = vec![
            make_record(1, 1, true, true),
            make_record(1, 2, true, true),
            make_record(1, 4, true, true),
            make_record(1, 5, true, false),
        ];
        let priors = compute_priors(&records);

        assert_eq!(priors[1].1.games, 1);
        assert_eq!(priors[1].1.wins, 1);
        // New week: prior counters start over
        assert_eq!(priors[2].1.games, 0);
        assert_eq!(priors[2].1.wins, 0);
        assert_eq!(priors[3].1.games, 1);
        assert_eq!(priors[3].1.wins, 1);
        // Season scope keeps accumulating across the boundary
        assert_eq!(priors[3].0.games, 3);
    }

    #[test]
    fn test_partitions_independent() {
        let mut records = vec![
            make_record(1, 1, true, true),
            make_record(1, 2, true, true),
            make_record(2, 1, true, true),
            make_record(2, 2, true, false),
        ];
        records.sort_by(|a, b| {
            (a.team_id, a.season, a.date, a.game_id).cmp(&(b.team_id, b.season, b.date, b.game_id))
        });
        let priors = compute_priors(&records);

        // Team 2's first game sees zero state despite team 1's history
        assert_eq!(priors[2].0.games, 0);
        assert_eq!(priors[3].0.games, 1);
    }

    #[test]
    fn test_wins_vs_over_500_prior_is_lagged() {
        let records = vec![
            make_record(1, 1, true, true),
            make_record(1, 2, true, true),
            make_record(1, 3, true, true),
        ];
        let flags = vec![true, false, true];
        let prior = wins_vs_over_500_prior(&records, &flags);

        assert_eq!(prior, vec![0, 1, 1]);
    }
}
