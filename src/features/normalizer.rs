//! Game normalization
//!
//! Converts one row per game into two team-perspective rows, computing
//! win/loss, home/away, and season-of-record. The output ordering is
//! load-bearing: every downstream "prior" computation relies on position
//! within the sorted (team, season) partition.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Game, GameId, Season, TeamId};

/// One game seen from one team's perspective
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamGameRecord {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub team_id: TeamId,
    pub team_name: String,
    pub opponent_id: TeamId,
    pub opponent_name: String,
    pub is_home: bool,
    pub team_score: u32,
    pub opp_score: u32,
    pub is_win: bool,
    pub season: Season,
}

impl TeamGameRecord {
    pub fn outcome(&self) -> &'static str {
        if self.is_win {
            "win"
        } else {
            "loss"
        }
    }
}

/// Result of normalization
#[derive(Debug)]
pub struct NormalizedGames {
    /// Two records per game, sorted by (team, season, date, game_id)
    pub records: Vec<TeamGameRecord>,
    /// Games dropped by the era filter
    pub filtered_pre_era: usize,
}

/// Expand games into team-perspective records.
///
/// A game with a null or unknown winner is still emitted for both sides
/// with `is_win = false`; a non-determinable outcome never fails the batch.
pub fn normalize_games(games: &[Game], first_season: i32) -> NormalizedGames {
    let mut records = Vec::with_capacity(games.len() * 2);
    let mut filtered_pre_era = 0usize;

    for game in games {
        let season = game.season();
        if season.0 < first_season {
            filtered_pre_era += 1;
            continue;
        }

        records.push(perspective_row(game, season, true));
        records.push(perspective_row(game, season, false));
    }

    // Stable sort: games on the same date keep their ingestion order.
    records.sort_by(|a, b| {
        (a.team_id, a.season, a.date, a.game_id).cmp(&(b.team_id, b.season, b.date, b.game_id))
    });

    NormalizedGames {
        records,
        filtered_pre_era,
    }
}

fn perspective_row(game: &Game, season: Season, home: bool) -> TeamGameRecord {
    let (team_id, team_name, opponent_id, opponent_name, team_score, opp_score) = if home {
        (
            game.home_team_id,
            game.home_team_name.clone(),
            game.away_team_id,
            game.away_team_name.clone(),
            game.home_score,
            game.away_score,
        )
    } else {
        (
            game.away_team_id,
            game.away_team_name.clone(),
            game.home_team_id,
            game.home_team_name.clone(),
            game.away_score,
            game.home_score,
        )
    };

    TeamGameRecord {
        game_id: game.game_id,
        date: game.date,
        team_id,
        team_name,
        opponent_id,
        opponent_name,
        is_home: home,
        team_score,
        opp_score,
        is_win: game.did_win(team_id),
        season,
    }
}
