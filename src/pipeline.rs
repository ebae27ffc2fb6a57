//! Feature pipeline
//!
//! Runs the full-barrier stage DAG: Normalize → Prior-State →
//! Opponent-Enrich → Per-Game Assembly → Player-Week → Breakout. Each
//! stage consumes the previous stage's complete output; row-level
//! rejections are counted per stage and surfaced in the run report.

use std::collections::HashMap;

use log::info;

use crate::features::breakout::{score_weeks, ScoredWeek};
use crate::features::normalizer::normalize_games;
use crate::features::opponent::{enrich_opponents, is_win_vs_over_500};
use crate::features::player_week::{aggregate_weeks, week_start, PlayerGameFeatures};
use crate::features::prior_state::{compute_priors, wins_vs_over_500_prior};
use crate::features::{AwardTables, ConferenceTable, RosterIndex, TeamGameFeatures};
use crate::{Config, Game, GameId, PlayerGameRow, Result};

/// Everything the engine consumes: input tables plus reference tables
pub struct PipelineInputs {
    pub games: Vec<Game>,
    pub player_rows: Vec<PlayerGameRow>,
    pub awards: AwardTables,
    pub conferences: ConferenceTable,
}

/// Per-stage rejection and warning counts surfaced to the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub games_in: usize,
    pub games_filtered_pre_era: usize,
    pub team_game_rows: usize,
    pub opponent_join_unmatched: usize,
    pub player_rows_in: usize,
    pub player_rows_unmatched: usize,
    pub per_game_rows: usize,
    pub player_weeks: usize,
    pub first_weeks_dropped: usize,
    pub scored_weeks: usize,
}

/// Final output tables
pub struct PipelineOutput {
    /// Per-game player-feature table
    pub per_game: Vec<PlayerGameFeatures>,
    /// Per-player-week aggregate-feature table
    pub per_week: Vec<ScoredWeek>,
    pub report: RunReport,
}

/// Run the complete feature pipeline.
pub fn run(inputs: PipelineInputs, config: &Config) -> Result<PipelineOutput> {
    let mut report = RunReport {
        games_in: inputs.games.len(),
        player_rows_in: inputs.player_rows.len(),
        ..Default::default()
    };

    // Stage 1: normalize games to team-perspective rows
    let normalized = normalize_games(&inputs.games, config.features.first_season);
    report.games_filtered_pre_era = normalized.filtered_pre_era;
    report.team_game_rows = normalized.records.len();
    info!(
        "normalized {} games into {} team-game rows ({} pre-era filtered)",
        report.games_in, report.team_game_rows, report.games_filtered_pre_era
    );

    // Stage 2: season- and week-scoped prior state
    let priors = compute_priors(&normalized.records);

    // Stage 3: opponent enrichment (requires all priors to exist)
    let season_priors: Vec<_> = priors.iter().map(|(s, _)| s.clone()).collect();
    let enriched = enrich_opponents(&normalized.records, &season_priors)?;
    report.opponent_join_unmatched = enriched.unmatched;

    let flags: Vec<bool> = normalized
        .records
        .iter()
        .zip(&enriched.priors)
        .map(|(rec, opp)| is_win_vs_over_500(rec, opp))
        .collect();
    let over_500_priors = wins_vs_over_500_prior(&normalized.records, &flags);

    let team_games: Vec<TeamGameFeatures> = normalized
        .records
        .into_iter()
        .zip(priors)
        .zip(enriched.priors)
        .zip(flags.iter().zip(over_500_priors))
        .map(|(((rec, (prior, week_prior)), opponent), (flag, over_500))| TeamGameFeatures {
            rec,
            prior,
            week_prior,
            opponent,
            is_win_vs_over_500: *flag,
            wins_vs_over_500_prior: over_500,
        })
        .collect();

    // Stage 4: per-game assembly, joining box scores to team context and
    // attaching award labels
    let per_game = assemble_per_game(&inputs, team_games, &mut report);
    report.per_game_rows = per_game.len();
    info!(
        "assembled {} per-game player rows ({} box-score rows unmatched)",
        report.per_game_rows, report.player_rows_unmatched
    );

    // Stage 5: player-week aggregation
    let weeks = aggregate_weeks(&per_game, &config.features.buckets);
    report.player_weeks = weeks.len();

    // Stage 6: breakout scoring
    let scored = score_weeks(weeks, &config.features.breakout);
    report.first_weeks_dropped = scored.first_weeks_dropped;
    report.scored_weeks = scored.rows.len();
    info!(
        "scored {} player-weeks ({} first weeks dropped)",
        report.scored_weeks, report.first_weeks_dropped
    );

    Ok(PipelineOutput {
        per_game,
        per_week: scored.rows,
        report,
    })
}

fn assemble_per_game(
    inputs: &PipelineInputs,
    team_games: Vec<TeamGameFeatures>,
    report: &mut RunReport,
) -> Vec<PlayerGameFeatures> {
    let mut by_game_team: HashMap<(GameId, &str), &TeamGameFeatures> =
        HashMap::with_capacity(team_games.len());
    for tg in &team_games {
        by_game_team.insert((tg.rec.game_id, tg.rec.team_name.as_str()), tg);
    }

    let mut rosters = RosterIndex::new();
    for row in &inputs.player_rows {
        rosters.add(row.game_id, &row.team_name, row.player_id);
    }

    let mut per_game = Vec::with_capacity(inputs.player_rows.len());
    for player in &inputs.player_rows {
        let team_game = match by_game_team.get(&(player.game_id, player.team_name.as_str())) {
            Some(tg) => (*tg).clone(),
            None => {
                report.player_rows_unmatched += 1;
                continue;
            }
        };

        let season = team_game.rec.season;
        let conference = inputs.conferences.conference_of(&player.team_name);
        let season_awards = inputs.awards.season_flags(player.player_id, season);

        let winner = conference
            .and_then(|conf| inputs.awards.weekly_winner(team_game.rec.date, conf));
        let won_player_of_the_week = winner
            .map(|w| w.player_id == player.player_id)
            .unwrap_or(false);
        let (pow_winner_id, pow_winner_name) = match winner {
            Some(w) => (Some(w.player_id), Some(w.player_name.clone())),
            None => (None, None),
        };

        let opponent_has_all_nba = rosters.has_all_nba(
            player.game_id,
            &team_game.rec.opponent_name,
            &inputs.awards,
        );

        per_game.push(PlayerGameFeatures {
            week_start: week_start(team_game.rec.date),
            conference,
            season_awards,
            pow_winner_id,
            pow_winner_name,
            won_player_of_the_week,
            opponent_has_all_nba,
            wins_vs_team_with_all_nba_player: team_game.rec.is_win && opponent_has_all_nba,
            player: player.clone(),
            team_game,
        });
    }

    // Deterministic output order regardless of input row order
    per_game.sort_by(|a, b| {
        (
            a.team_game.rec.date,
            a.player.game_id,
            a.player.team_name.as_str(),
            a.player.player_id,
        )
            .cmp(&(
                b.team_game.rec.date,
                b.player.game_id,
                b.player.team_name.as_str(),
                b.player.player_id,
            ))
    });

    per_game
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::awards::TeamInfo;
    use crate::{Conference, PlayerId, Season, TeamId};
    use chrono::NaiveDate;

    fn make_game(id: i64, day: u32, home: i64, away: i64, home_wins: bool) -> Game {
        let names = |t: i64| match t {
            1 => "Celtics".to_string(),
            2 => "Lakers".to_string(),
            t => format!("Team{}", t),
        };
        Game {
            game_id: GameId(id),
            date: NaiveDate::from_ymd_opt(2024, 11, day).unwrap(),
            home_team_id: TeamId(home),
            home_team_name: names(home),
            away_team_id: TeamId(away),
            away_team_name: names(away),
            home_score: if home_wins { 100 } else { 90 },
            away_score: if home_wins { 90 } else { 100 },
            winner_team_id: Some(TeamId(if home_wins { home } else { away })),
            game_type: "Regular Season".to_string(),
        }
    }

    fn make_player_row(player: i64, game: i64, day: u32, team: &str, points: u32) -> PlayerGameRow {
        PlayerGameRow {
            player_id: PlayerId(player),
            first_name: "Test".to_string(),
            last_name: format!("Player{}", player),
            full_name: format!("Test Player{}", player),
            game_id: GameId(game),
            date: NaiveDate::from_ymd_opt(2024, 11, day).unwrap(),
            team_name: team.to_string(),
            minutes: 32.0,
            points,
            assists: 5,
            blocks: 1,
            steals: 1,
            field_goals_attempted: 18,
            field_goals_made: 9,
            three_pointers_attempted: 5,
            three_pointers_made: 2,
            free_throws_attempted: 4,
            free_throws_made: 4,
            rebounds_defensive: 5,
            rebounds_offensive: 2,
            rebounds_total: 7,
            fouls_personal: 2,
            turnovers: 2,
            plus_minus: 6,
        }
    }

    fn conferences() -> ConferenceTable {
        let mut table = ConferenceTable::new();
        table.insert(
            "Celtics".to_string(),
            TeamInfo {
                conference: Conference::East,
                nickname: "Celtics".to_string(),
            },
        );
        table.insert(
            "Lakers".to_string(),
            TeamInfo {
                conference: Conference::West,
                nickname: "Lakers".to_string(),
            },
        );
        table
    }

    fn small_inputs() -> PipelineInputs {
        // Two weeks of games between two teams
        let games = vec![
            make_game(1, 4, 1, 2, true),
            make_game(2, 6, 2, 1, false),
            make_game(3, 11, 1, 2, true),
            make_game(4, 13, 2, 1, true),
        ];
        let mut player_rows = Vec::new();
        for (game, day) in [(1i64, 4u32), (2, 6), (3, 11), (4, 13)] {
            player_rows.push(make_player_row(100, game, day, "Celtics", 20 + day));
            player_rows.push(make_player_row(200, game, day, "Lakers", 15 + day));
        }
        PipelineInputs {
            games,
            player_rows,
            awards: AwardTables::new(),
            conferences: conferences(),
        }
    }

    #[test]
    fn test_full_run_counts() {
        let config = Config::default();
        let out = run(small_inputs(), &config).unwrap();

        assert_eq!(out.report.games_in, 4);
        assert_eq!(out.report.team_game_rows, 8);
        assert_eq!(out.report.opponent_join_unmatched, 0);
        assert_eq!(out.report.per_game_rows, 8);
        assert_eq!(out.report.player_rows_unmatched, 0);
        // Two players x two weeks
        assert_eq!(out.report.player_weeks, 4);
        // Each (player, season) partition loses its first week
        assert_eq!(out.report.first_weeks_dropped, 2);
        assert_eq!(out.per_week.len(), 2);
    }

    #[test]
    fn test_idempotent_runs() {
        let config = Config::default();
        let a = run(small_inputs(), &config).unwrap();
        let b = run(small_inputs(), &config).unwrap();

        assert_eq!(a.report, b.report);
        assert_eq!(a.per_game.len(), b.per_game.len());
        for (x, y) in a.per_game.iter().zip(&b.per_game) {
            assert_eq!(x.player.player_id, y.player.player_id);
            assert_eq!(x.player.game_id, y.player.game_id);
            assert_eq!(x.team_game.prior, y.team_game.prior);
        }
        for (x, y) in a.per_week.iter().zip(&b.per_week) {
            assert_eq!(x.week.player_id, y.week.player_id);
            assert_eq!(x.week.week_start, y.week.week_start);
            assert_eq!(x.breakout, y.breakout);
        }
    }

    #[test]
    fn test_input_order_does_not_change_output() {
        let config = Config::default();
        let a = run(small_inputs(), &config).unwrap();

        let mut shuffled = small_inputs();
        shuffled.player_rows.reverse();
        let b = run(shuffled, &config).unwrap();

        let keys_a: Vec<_> = a
            .per_game
            .iter()
            .map(|r| (r.player.game_id, r.player.player_id))
            .collect();
        let keys_b: Vec<_> = b
            .per_game
            .iter()
            .map(|r| (r.player.game_id, r.player.player_id))
            .collect();
        assert_eq!(keys_a, keys_b);
    }

    #[test]
    fn test_unmatched_player_rows_counted() {
        let config = Config::default();
        let mut inputs = small_inputs();
        // A box-score row for a game the games table does not know
        inputs
            .player_rows
            .push(make_player_row(300, 999, 4, "Celtics", 10));

        let out = run(inputs, &config).unwrap();
        assert_eq!(out.report.player_rows_unmatched, 1);
    }

    #[test]
    fn test_weekly_award_label_attached() {
        let config = Config::default();
        let mut inputs = small_inputs();
        // Player 100 wins the East award for the week of Nov 4-10
        inputs.awards.add_weekly(
            PlayerId(100),
            "Test Player100".to_string(),
            NaiveDate::from_ymd_opt(2024, 11, 11).unwrap(),
            Conference::East,
        );

        let out = run(inputs, &config).unwrap();

        let winner_rows: Vec<_> = out
            .per_game
            .iter()
            .filter(|r| r.won_player_of_the_week)
            .collect();
        // Player 100 played twice in the awarded week
        assert_eq!(winner_rows.len(), 2);
        assert!(winner_rows
            .iter()
            .all(|r| r.player.player_id == PlayerId(100)));

        // The Lakers player is only compared against the West award
        assert!(out
            .per_game
            .iter()
            .filter(|r| r.player.player_id == PlayerId(200))
            .all(|r| !r.won_player_of_the_week && r.pow_winner_id.is_none()));
    }

    #[test]
    fn test_season_award_flags_attached() {
        let config = Config::default();
        let mut inputs = small_inputs();
        inputs.awards.add_mvp(PlayerId(100), Season(2024));
        inputs.awards.add_all_nba(PlayerId(200), Season(2024), 1);

        let out = run(inputs, &config).unwrap();

        for row in &out.per_game {
            if row.player.player_id == PlayerId(100) {
                assert!(row.season_awards.mvp);
                // Celtics face the Lakers, who roster an all-NBA player
                assert!(row.opponent_has_all_nba);
            }
            if row.player.player_id == PlayerId(200) {
                assert!(row.season_awards.all_nba_first_team);
                assert!(!row.opponent_has_all_nba);
            }
        }
    }

    #[test]
    fn test_prior_fields_leak_free_in_assembly() {
        let config = Config::default();
        let out = run(small_inputs(), &config).unwrap();

        // First game of the season: all priors zero for both sides
        let first = out
            .per_game
            .iter()
            .find(|r| r.player.game_id == GameId(1))
            .unwrap();
        assert_eq!(first.team_game.prior.games, 0);
        assert_eq!(first.team_game.opponent.wins, Some(0));
        assert_eq!(first.team_game.opponent.winrate, 0.5);

        // Game 3 (week 2): Celtics won both week-1 games, so they arrive
        // 2-0 and the Lakers 0-2
        let third = out
            .per_game
            .iter()
            .find(|r| r.player.game_id == GameId(3) && r.player.team_name == "Celtics")
            .unwrap();
        assert_eq!(third.team_game.prior.record, "2-0");
        assert_eq!(third.team_game.opponent.wins, Some(0));
        assert_eq!(third.team_game.opponent.losses, Some(2));
        // New ISO week: week-scoped priors reset
        assert_eq!(third.team_game.week_prior.games, 0);
    }
}
