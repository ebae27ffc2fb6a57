//! Opponent enrichment
//!
//! Self-join of the prior-state output against itself: each team-game row
//! is matched to the opponent's row for the same game, attaching the
//! opponent's record strictly before that game. Both sides are "prior"
//! simultaneously; neither leaks the other's outcome.

use std::collections::HashMap;

use log::warn;

use crate::features::normalizer::TeamGameRecord;
use crate::features::policy;
use crate::features::prior_state::TeamPrior;
use crate::{GameId, HoopsError, Result, TeamId};

/// The opponent's record strictly before a shared game.
///
/// Wins/losses are None when the self-join found no opponent row; the
/// winrate falls back to the unplayed-opponent default either way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpponentPrior {
    pub wins: Option<u32>,
    pub losses: Option<u32>,
    pub winrate: f64,
}

/// Enrichment result, aligned index-for-index with the input records
#[derive(Debug)]
pub struct EnrichedOpponents {
    pub priors: Vec<OpponentPrior>,
    /// Rows degraded to nulled opponent fields (zero-match joins)
    pub unmatched: usize,
}

/// Attach each record's opponent prior record.
///
/// Exactly one opponent row is expected per (game, opponent): a duplicate
/// indicates corrupt input and fails the run; a missing row degrades to
/// nulled fields and is counted.
pub fn enrich_opponents(
    records: &[TeamGameRecord],
    priors: &[TeamPrior],
) -> Result<EnrichedOpponents> {
    debug_assert_eq!(records.len(), priors.len());

    let mut by_game_team: HashMap<(GameId, TeamId), (u32, u32)> =
        HashMap::with_capacity(records.len());
    for (rec, prior) in records.iter().zip(priors) {
        if by_game_team
            .insert((rec.game_id, rec.team_id), (prior.wins, prior.losses))
            .is_some()
        {
            return Err(HoopsError::JoinCardinality {
                game_id: rec.game_id,
                team_id: rec.team_id,
                matches: 2,
            });
        }
    }

    let mut unmatched = 0usize;
    let priors = records
        .iter()
        .map(|rec| match by_game_team.get(&(rec.game_id, rec.opponent_id)) {
            Some(&(wins, losses)) => OpponentPrior {
                wins: Some(wins),
                losses: Some(losses),
                winrate: policy::opponent_winrate(wins, losses),
            },
            None => {
                unmatched += 1;
                warn!(
                    "no opponent row for {} {} ({})",
                    rec.game_id, rec.opponent_id, rec.opponent_name
                );
                OpponentPrior {
                    wins: None,
                    losses: None,
                    winrate: policy::UNPLAYED_OPPONENT_WINRATE,
                }
            }
        })
        .collect();

    Ok(EnrichedOpponents { priors, unmatched })
}

/// A win counts against an over-.500 opponent only if the opponent's
/// prior winrate strictly exceeds one half (the unplayed default never
/// qualifies).
pub fn is_win_vs_over_500(rec: &TeamGameRecord, opp: &OpponentPrior) -> bool {
    rec.is_win && opp.winrate > 0.5
}
