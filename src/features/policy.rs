//! Named default policies
//!
//! Every fallback value the engine substitutes for missing or degenerate
//! input lives here, so each default is independently testable instead of
//! being an inline fill scattered through the stages.

/// Winrate attributed to an opponent that has played no games yet.
pub const UNPLAYED_OPPONENT_WINRATE: f64 = 0.5;

/// League-relative z-score for a season with no prior-season baseline.
pub const NO_BASELINE_LEAGUE_Z: f64 = 0.0;

/// Opponent winrate strictly before a game.
pub fn opponent_winrate(wins: u32, losses: u32) -> f64 {
    let games = wins + losses;
    if games == 0 {
        UNPLAYED_OPPONENT_WINRATE
    } else {
        f64::from(wins) / f64::from(games)
    }
}

/// Z-score with a zero-std guard: a degenerate distribution scores 0.0.
pub fn zscore(x: f64, mean: f64, std: f64) -> f64 {
    if std > 0.0 {
        (x - mean) / std
    } else {
        0.0
    }
}

/// Shooting percentage: 0.0 when nothing was attempted.
pub fn shooting_pct(made: u32, attempted: u32) -> f64 {
    if attempted > 0 {
        f64::from(made) / f64::from(attempted)
    } else {
        0.0
    }
}
