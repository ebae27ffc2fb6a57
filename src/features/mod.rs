//! Feature derivation
//!
//! Converts normalized game and box-score rows into leakage-free
//! team-game, player-game, and player-week feature rows.

pub mod awards;
pub mod breakout;
pub mod normalizer;
pub mod opponent;
pub mod player_week;
pub mod policy;
pub mod prior_state;

pub use awards::{AwardTables, ConferenceTable, RosterIndex, SeasonAwardFlags};
pub use normalizer::TeamGameRecord;
pub use opponent::OpponentPrior;
pub use player_week::{PlayerGameFeatures, PlayerWeekRow};
pub use prior_state::{TeamPrior, WeekPrior};

/// One team-game row with every prior-state feature attached
#[derive(Debug, Clone)]
pub struct TeamGameFeatures {
    pub rec: TeamGameRecord,
    pub prior: TeamPrior,
    pub week_prior: WeekPrior,
    pub opponent: OpponentPrior,
    pub is_win_vs_over_500: bool,
    pub wins_vs_over_500_prior: u32,
}
