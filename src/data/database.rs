//! SQLite persistence for ingested input tables
//!
//! `data load` writes the games and box-score tables here so feature runs
//! can be repeated without re-supplying the CSVs.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::{Game, GameId, HoopsError, PlayerGameRow, PlayerId, Result, TeamId};

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                game_id INTEGER PRIMARY KEY,
                date TEXT NOT NULL,
                home_team_id INTEGER NOT NULL,
                home_team_name TEXT NOT NULL,
                away_team_id INTEGER NOT NULL,
                away_team_name TEXT NOT NULL,
                home_score INTEGER NOT NULL,
                away_score INTEGER NOT NULL,
                winner_team_id INTEGER,
                game_type TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS player_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player_id INTEGER NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                full_name TEXT NOT NULL,
                game_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                team_name TEXT NOT NULL,
                minutes REAL NOT NULL,
                points INTEGER NOT NULL,
                assists INTEGER NOT NULL,
                blocks INTEGER NOT NULL,
                steals INTEGER NOT NULL,
                field_goals_attempted INTEGER NOT NULL,
                field_goals_made INTEGER NOT NULL,
                three_pointers_attempted INTEGER NOT NULL,
                three_pointers_made INTEGER NOT NULL,
                free_throws_attempted INTEGER NOT NULL,
                free_throws_made INTEGER NOT NULL,
                rebounds_defensive INTEGER NOT NULL,
                rebounds_offensive INTEGER NOT NULL,
                rebounds_total INTEGER NOT NULL,
                fouls_personal INTEGER NOT NULL,
                turnovers INTEGER NOT NULL,
                plus_minus INTEGER NOT NULL,
                UNIQUE(player_id, game_id, team_name)
            );

            CREATE INDEX IF NOT EXISTS idx_games_date ON games(date);
            CREATE INDEX IF NOT EXISTS idx_player_stats_game ON player_stats(game_id);
            "#,
        )?;
        Ok(())
    }

    // ==================== Games ====================

    /// Insert games, replacing rows with the same game id
    pub fn insert_games(&mut self, games: &[Game]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO games
                 (game_id, date, home_team_id, home_team_name, away_team_id,
                  away_team_name, home_score, away_score, winner_team_id, game_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for game in games {
                stmt.execute(params![
                    game.game_id.0,
                    game.date.to_string(),
                    game.home_team_id.0,
                    game.home_team_name,
                    game.away_team_id.0,
                    game.away_team_name,
                    game.home_score,
                    game.away_score,
                    game.winner_team_id.map(|t| t.0),
                    game.game_type,
                ])?;
            }
        }
        tx.commit()?;
        Ok(games.len())
    }

    /// Load all games ordered by (date, game_id)
    pub fn load_games(&self) -> Result<Vec<Game>> {
        let mut stmt = self.conn.prepare(
            "SELECT game_id, date, home_team_id, home_team_name, away_team_id,
                    away_team_name, home_score, away_score, winner_team_id, game_type
             FROM games ORDER BY date, game_id",
        )?;
        let rows = stmt.query_map([], |row| {
            let date: String = row.get(1)?;
            let winner: Option<i64> = row.get(8)?;
            Ok((
                Game {
                    game_id: GameId(row.get(0)?),
                    date: NaiveDate::default(),
                    home_team_id: TeamId(row.get(2)?),
                    home_team_name: row.get(3)?,
                    away_team_id: TeamId(row.get(4)?),
                    away_team_name: row.get(5)?,
                    home_score: row.get(6)?,
                    away_score: row.get(7)?,
                    winner_team_id: winner.map(TeamId),
                    game_type: row.get(9)?,
                },
                date,
            ))
        })?;

        let mut games = Vec::new();
        for row in rows {
            let (mut game, date) = row?;
            game.date = parse_stored_date(&date)?;
            games.push(game);
        }
        Ok(games)
    }

    pub fn game_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ==================== Player box scores ====================

    pub fn insert_player_rows(&mut self, rows: &[PlayerGameRow]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO player_stats
                 (player_id, first_name, last_name, full_name, game_id, date,
                  team_name, minutes, points, assists, blocks, steals,
                  field_goals_attempted, field_goals_made,
                  three_pointers_attempted, three_pointers_made,
                  free_throws_attempted, free_throws_made,
                  rebounds_defensive, rebounds_offensive, rebounds_total,
                  fouls_personal, turnovers, plus_minus)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                         ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.player_id.0,
                    r.first_name,
                    r.last_name,
                    r.full_name,
                    r.game_id.0,
                    r.date.to_string(),
                    r.team_name,
                    r.minutes,
                    r.points,
                    r.assists,
                    r.blocks,
                    r.steals,
                    r.field_goals_attempted,
                    r.field_goals_made,
                    r.three_pointers_attempted,
                    r.three_pointers_made,
                    r.free_throws_attempted,
                    r.free_throws_made,
                    r.rebounds_defensive,
                    r.rebounds_offensive,
                    r.rebounds_total,
                    r.fouls_personal,
                    r.turnovers,
                    r.plus_minus,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Load all box-score rows ordered by (date, game_id, player_id)
    pub fn load_player_rows(&self) -> Result<Vec<PlayerGameRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT player_id, first_name, last_name, full_name, game_id, date,
                    team_name, minutes, points, assists, blocks, steals,
                    field_goals_attempted, field_goals_made,
                    three_pointers_attempted, three_pointers_made,
                    free_throws_attempted, free_throws_made,
                    rebounds_defensive, rebounds_offensive, rebounds_total,
                    fouls_personal, turnovers, plus_minus
             FROM player_stats ORDER BY date, game_id, player_id",
        )?;
        let rows = stmt.query_map([], |row| {
            let date: String = row.get(5)?;
            Ok((
                PlayerGameRow {
                    player_id: PlayerId(row.get(0)?),
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    full_name: row.get(3)?,
                    game_id: GameId(row.get(4)?),
                    date: NaiveDate::default(),
                    team_name: row.get(6)?,
                    minutes: row.get(7)?,
                    points: row.get(8)?,
                    assists: row.get(9)?,
                    blocks: row.get(10)?,
                    steals: row.get(11)?,
                    field_goals_attempted: row.get(12)?,
                    field_goals_made: row.get(13)?,
                    three_pointers_attempted: row.get(14)?,
                    three_pointers_made: row.get(15)?,
                    free_throws_attempted: row.get(16)?,
                    free_throws_made: row.get(17)?,
                    rebounds_defensive: row.get(18)?,
                    rebounds_offensive: row.get(19)?,
                    rebounds_total: row.get(20)?,
                    fouls_personal: row.get(21)?,
                    turnovers: row.get(22)?,
                    plus_minus: row.get(23)?,
                },
                date,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (mut record, date) = row?;
            record.date = parse_stored_date(&date)?;
            out.push(record);
        }
        Ok(out)
    }

    pub fn player_row_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM player_stats", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn parse_stored_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| HoopsError::Parse(format!("stored date `{}`: {}", s, e)))
}
