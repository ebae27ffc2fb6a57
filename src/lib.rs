//! NBA award feature engineering
//!
//! Derives leakage-free temporal features from historical game and player
//! box-score tables for weekly and season award prediction.

pub mod data;
pub mod features;
pub mod pipeline;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique identifier for a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(pub i64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Game({})", self.0)
    }
}

/// Unique identifier for a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

/// Unique identifier for a player (already deduplicated upstream)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player({})", self.0)
    }
}

/// NBA season label: the calendar year the season started in.
///
/// A season spans two calendar years; games in July or later belong to the
/// season starting that year, earlier games to the season started the year
/// before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Season(pub i32);

impl Season {
    /// Season of record for a game date (July cutoff).
    pub fn of(date: NaiveDate) -> Season {
        if date.month() >= 7 {
            Season(date.year())
        } else {
            Season(date.year() - 1)
        }
    }

    /// The following season (league baselines are attributed forward).
    pub fn next(&self) -> Season {
        Season(self.0 + 1)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.0, (self.0 + 1).rem_euclid(100))
    }
}

/// NBA conference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conference {
    East,
    West,
}

impl Conference {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "east" | "eastern" => Some(Conference::East),
            "west" | "western" => Some(Conference::West),
            _ => None,
        }
    }
}

impl fmt::Display for Conference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conference::East => write!(f, "East"),
            Conference::West => write!(f, "West"),
        }
    }
}

/// A single game as ingested from the games table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub home_team_id: TeamId,
    pub home_team_name: String,
    pub away_team_id: TeamId,
    pub away_team_name: String,
    pub home_score: u32,
    pub away_score: u32,
    /// None when the source row carries no determinable outcome
    pub winner_team_id: Option<TeamId>,
    pub game_type: String,
}

impl Game {
    /// Check if the given team won this game
    pub fn did_win(&self, team: TeamId) -> bool {
        self.winner_team_id == Some(team)
    }

    /// Get the opponent for a given team
    pub fn opponent(&self, team: TeamId) -> Option<TeamId> {
        if team == self.home_team_id {
            Some(self.away_team_id)
        } else if team == self.away_team_id {
            Some(self.home_team_id)
        } else {
            None
        }
    }

    /// Season of record for this game
    pub fn season(&self) -> Season {
        Season::of(self.date)
    }
}

/// One player's box score for one game.
///
/// Did-not-play rows (null minutes) are rejected at the table layer and
/// never reach the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerGameRow {
    pub player_id: PlayerId,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub game_id: GameId,
    pub date: NaiveDate,
    pub team_name: String,
    pub minutes: f64,
    pub points: u32,
    pub assists: u32,
    pub blocks: u32,
    pub steals: u32,
    pub field_goals_attempted: u32,
    pub field_goals_made: u32,
    pub three_pointers_attempted: u32,
    pub three_pointers_made: u32,
    pub free_throws_attempted: u32,
    pub free_throws_made: u32,
    pub rebounds_defensive: u32,
    pub rebounds_offensive: u32,
    pub rebounds_total: u32,
    pub fouls_personal: u32,
    pub turnovers: u32,
    pub plus_minus: i32,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum HoopsError {
    #[error("{table}: required column `{column}` {reason}")]
    Schema {
        table: String,
        column: String,
        reason: String,
    },

    #[error("opponent join for {game_id} {team_id} matched {matches} rows, expected exactly 1")]
    JoinCardinality {
        game_id: GameId,
        team_id: TeamId,
        matches: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HoopsError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub features: FeatureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Earliest season included in feature derivation
    pub first_season: i32,
    pub breakout: BreakoutWeights,
    pub buckets: BucketConfig,
}

/// Weights for the composite breakout score.
///
/// A modeling choice carried over from the award model, not a correctness
/// requirement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BreakoutWeights {
    pub points: f64,
    pub assists: f64,
    pub plus_minus: f64,
}

/// Lower bucket boundaries for per-stat "games with N in range" counts.
///
/// Bucket i covers `[bound[i], bound[i+1])`; the last bucket is open-ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketConfig {
    pub points: Vec<u32>,
    pub assists: Vec<u32>,
    pub rebounds_total: Vec<u32>,
    pub rebounds_offensive: Vec<u32>,
    pub rebounds_defensive: Vec<u32>,
    pub steals: Vec<u32>,
    pub blocks: Vec<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                database_path: "data/hoops.db".to_string(),
                output_dir: "out".to_string(),
            },
            features: FeatureConfig {
                first_season: 1979,
                breakout: BreakoutWeights {
                    points: 0.5,
                    assists: 0.3,
                    plus_minus: 0.2,
                },
                buckets: BucketConfig {
                    points: vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100],
                    assists: vec![0, 10, 20, 30, 40],
                    rebounds_total: vec![0, 10, 20, 30, 40],
                    rebounds_offensive: vec![0, 10, 20, 30, 40],
                    rebounds_defensive: vec![0, 10, 20, 30, 40],
                    steals: vec![0, 3, 6, 10],
                    blocks: vec![0, 3, 6, 10, 13, 15],
                },
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HoopsError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| HoopsError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HoopsError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
