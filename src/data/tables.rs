//! CSV table layer
//!
//! Readers for the externally supplied input tables and writers for the
//! two output feature tables. Column resolution is by explicit name: a
//! missing required column fails the run before any aggregation, while a
//! row that cannot be converted is dropped and counted.

use std::io;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::debug;

use crate::features::breakout::ScoredWeek;
use crate::features::player_week::{bucket_labels, PlayerGameFeatures};
use crate::features::AwardTables;
use crate::{
    BucketConfig, Conference, Game, GameId, HoopsError, PlayerGameRow, PlayerId, Result, Season,
    TeamId,
};

/// A loaded table plus its per-row rejection count
#[derive(Debug)]
pub struct TableLoad<T> {
    pub rows: Vec<T>,
    pub rejected: usize,
}

/// Resolves required column names against a header row
struct ColumnMap {
    table: &'static str,
    header: StringRecord,
}

impl ColumnMap {
    fn new(table: &'static str, header: StringRecord) -> Self {
        ColumnMap { table, header }
    }

    fn require(&self, column: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(column))
            .ok_or_else(|| HoopsError::Schema {
                table: self.table.to_string(),
                column: column.to_string(),
                reason: "is missing".to_string(),
            })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(column))
    }
}

fn field<'a>(record: &'a StringRecord, idx: usize) -> &'a str {
    record.get(idx).unwrap_or("").trim()
}

/// Dates arrive as plain dates or datetime strings; anything with a
/// recognizable date prefix is accepted.
fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if s.len() >= 10 {
        if let Ok(d) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d") {
            return Some(d);
        }
    }
    NaiveDate::parse_from_str(s, "%m/%d/%Y").ok()
}

fn parse_i64(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
}

/// Stat columns are often serialized as floats ("25.0")
fn parse_u32(s: &str) -> Option<u32> {
    parse_i64(s).and_then(|v| u32::try_from(v).ok())
}

fn parse_i32(s: &str) -> Option<i32> {
    parse_i64(s).and_then(|v| i32::try_from(v).ok())
}

// ==================== Games ====================

pub fn read_games<R: io::Read>(reader: R) -> Result<TableLoad<Game>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnMap::new("games", rdr.headers()?.clone());

    let game_id = columns.require("gameId")?;
    let date = columns.require("gameDate")?;
    let home_name = columns.require("hometeamName")?;
    let home_id = columns.require("hometeamId")?;
    let away_name = columns.require("awayteamName")?;
    let away_id = columns.require("awayteamId")?;
    let home_score = columns.require("homeScore")?;
    let away_score = columns.require("awayScore")?;
    let winner = columns.require("winner")?;
    let game_type = columns.require("gameType")?;

    let mut rows = Vec::new();
    let mut rejected = 0usize;
    for record in rdr.records() {
        let record = record?;
        let parsed = (|| {
            Some(Game {
                game_id: GameId(parse_i64(field(&record, game_id))?),
                date: parse_date(field(&record, date))?,
                home_team_id: TeamId(parse_i64(field(&record, home_id))?),
                home_team_name: field(&record, home_name).to_string(),
                away_team_id: TeamId(parse_i64(field(&record, away_id))?),
                away_team_name: field(&record, away_name).to_string(),
                home_score: parse_u32(field(&record, home_score))?,
                away_score: parse_u32(field(&record, away_score))?,
                // A null or unparseable winner is a non-determinable
                // outcome, not a rejected row
                winner_team_id: parse_i64(field(&record, winner)).map(TeamId),
                game_type: field(&record, game_type).to_string(),
            })
        })();
        match parsed {
            Some(game) => rows.push(game),
            None => {
                rejected += 1;
                debug!("rejected games row: {:?}", record);
            }
        }
    }

    Ok(TableLoad { rows, rejected })
}

pub fn read_games_path(path: &Path) -> Result<TableLoad<Game>> {
    read_games(std::fs::File::open(path)?)
}

// ==================== Player box scores ====================

pub fn read_player_stats<R: io::Read>(reader: R) -> Result<TableLoad<PlayerGameRow>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnMap::new("player_statistics", rdr.headers()?.clone());

    let player_id = columns.require("player_id")?;
    let first_name = columns.require("firstName")?;
    let last_name = columns.require("lastName")?;
    let full_name = columns.optional("full_name");
    let game_id = columns.require("gameId")?;
    let date = columns.require("gameDate")?;
    let team_name = columns.require("playerteamName")?;
    let minutes = columns.require("numMinutes")?;
    let points = columns.require("points")?;
    let assists = columns.require("assists")?;
    let blocks = columns.require("blocks")?;
    let steals = columns.require("steals")?;
    let fga = columns.require("fieldGoalsAttempted")?;
    let fgm = columns.require("fieldGoalsMade")?;
    let tpa = columns.require("threePointersAttempted")?;
    let tpm = columns.require("threePointersMade")?;
    let fta = columns.require("freeThrowsAttempted")?;
    let ftm = columns.require("freeThrowsMade")?;
    let reb_def = columns.require("reboundsDefensive")?;
    let reb_off = columns.require("reboundsOffensive")?;
    let reb_total = columns.require("reboundsTotal")?;
    let fouls = columns.require("foulsPersonal")?;
    let turnovers = columns.require("turnovers")?;
    let plus_minus = columns.require("plusMinusPoints")?;

    let mut rows = Vec::new();
    let mut rejected = 0usize;
    for record in rdr.records() {
        let record = record?;

        // Did-not-play rows carry no minutes and are excluded here,
        // before any aggregation sees them
        let minutes_value = match field(&record, minutes).parse::<f64>() {
            Ok(m) => m,
            Err(_) => {
                rejected += 1;
                continue;
            }
        };

        let parsed = (|| {
            let first = field(&record, first_name).to_string();
            let last = field(&record, last_name).to_string();
            let full = full_name
                .map(|idx| field(&record, idx).to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| format!("{} {}", first, last));
            Some(PlayerGameRow {
                player_id: PlayerId(parse_i64(field(&record, player_id))?),
                first_name: first,
                last_name: last,
                full_name: full,
                game_id: GameId(parse_i64(field(&record, game_id))?),
                date: parse_date(field(&record, date))?,
                team_name: field(&record, team_name).to_string(),
                minutes: minutes_value,
                points: parse_u32(field(&record, points))?,
                assists: parse_u32(field(&record, assists))?,
                blocks: parse_u32(field(&record, blocks))?,
                steals: parse_u32(field(&record, steals))?,
                field_goals_attempted: parse_u32(field(&record, fga))?,
                field_goals_made: parse_u32(field(&record, fgm))?,
                three_pointers_attempted: parse_u32(field(&record, tpa))?,
                three_pointers_made: parse_u32(field(&record, tpm))?,
                free_throws_attempted: parse_u32(field(&record, fta))?,
                free_throws_made: parse_u32(field(&record, ftm))?,
                rebounds_defensive: parse_u32(field(&record, reb_def))?,
                rebounds_offensive: parse_u32(field(&record, reb_off))?,
                rebounds_total: parse_u32(field(&record, reb_total))?,
                fouls_personal: parse_u32(field(&record, fouls))?,
                turnovers: parse_u32(field(&record, turnovers))?,
                plus_minus: parse_i32(field(&record, plus_minus))?,
            })
        })();
        match parsed {
            Some(row) => rows.push(row),
            None => {
                rejected += 1;
                debug!("rejected player_statistics row: {:?}", record);
            }
        }
    }

    Ok(TableLoad { rows, rejected })
}

pub fn read_player_stats_path(path: &Path) -> Result<TableLoad<PlayerGameRow>> {
    read_player_stats(std::fs::File::open(path)?)
}

// ==================== Award reference tables ====================

/// Rejection counts for the award reference tables
#[derive(Debug, Default, Clone, Copy)]
pub struct AwardLoadReport {
    pub rejected: usize,
}

fn season_from_label(label: &str) -> Option<Season> {
    // Season labels look like "2003-04"; a plain year is accepted too
    let head = label.trim();
    let head = if head.len() >= 4 { &head[..4] } else { head };
    head.parse::<i32>().ok().map(Season)
}

pub fn read_all_stars<R: io::Read>(
    reader: R,
    awards: &mut AwardTables,
    report: &mut AwardLoadReport,
) -> Result<()> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnMap::new("all_stars", rdr.headers()?.clone());
    let player_id = columns.require("player_id")?;
    let selection_year = columns.require("Selection Year")?;

    for record in rdr.records() {
        let record = record?;
        match (
            parse_i64(field(&record, player_id)),
            parse_i32(field(&record, selection_year)),
        ) {
            (Some(player), Some(year)) => awards.add_all_star(PlayerId(player), year),
            _ => report.rejected += 1,
        }
    }
    Ok(())
}

pub fn read_mvps<R: io::Read>(
    reader: R,
    awards: &mut AwardTables,
    report: &mut AwardLoadReport,
) -> Result<()> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnMap::new("mvp", rdr.headers()?.clone());
    let player_id = columns.require("player_id")?;
    let season = columns.require("Season")?;

    for record in rdr.records() {
        let record = record?;
        match (
            parse_i64(field(&record, player_id)),
            season_from_label(field(&record, season)),
        ) {
            (Some(player), Some(season)) => awards.add_mvp(PlayerId(player), season),
            _ => report.rejected += 1,
        }
    }
    Ok(())
}

pub fn read_all_nba_team<R: io::Read>(
    reader: R,
    team_rank: u8,
    awards: &mut AwardTables,
    report: &mut AwardLoadReport,
) -> Result<()> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnMap::new("all_nba_team", rdr.headers()?.clone());
    let player_id = columns.require("player_id")?;
    let season = columns.require("Season")?;

    for record in rdr.records() {
        let record = record?;
        match (
            parse_i64(field(&record, player_id)),
            season_from_label(field(&record, season)),
        ) {
            (Some(player), Some(season)) => awards.add_all_nba(PlayerId(player), season, team_rank),
            _ => report.rejected += 1,
        }
    }
    Ok(())
}

pub fn read_weekly_awards<R: io::Read>(
    reader: R,
    awards: &mut AwardTables,
    report: &mut AwardLoadReport,
) -> Result<()> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnMap::new("player_of_the_week", rdr.headers()?.clone());
    let player_id = columns.require("player_id")?;
    let player = columns.require("player")?;
    let date = columns.require("date")?;
    let conference = columns.require("conference")?;

    for record in rdr.records() {
        let record = record?;
        let parsed = (
            parse_i64(field(&record, player_id)),
            parse_date(field(&record, date)),
            Conference::from_label(field(&record, conference)),
        );
        match parsed {
            (Some(id), Some(award_date), Some(conf)) => awards.add_weekly(
                PlayerId(id),
                field(&record, player).to_string(),
                award_date,
                conf,
            ),
            _ => report.rejected += 1,
        }
    }
    Ok(())
}

/// Load the whole award directory into reference tables.
///
/// File names follow the upstream export: nba-all-stars.csv, nba-mvp.csv,
/// all-nba-{first,second,third}-team.csv, player-of-the-week.csv.
pub fn load_award_dir(dir: &Path) -> Result<(AwardTables, AwardLoadReport)> {
    let mut awards = AwardTables::new();
    let mut report = AwardLoadReport::default();

    read_all_stars(
        std::fs::File::open(dir.join("nba-all-stars.csv"))?,
        &mut awards,
        &mut report,
    )?;
    read_mvps(
        std::fs::File::open(dir.join("nba-mvp.csv"))?,
        &mut awards,
        &mut report,
    )?;
    for (rank, name) in [
        (1u8, "all-nba-first-team.csv"),
        (2, "all-nba-second-team.csv"),
        (3, "all-nba-third-team.csv"),
    ] {
        read_all_nba_team(
            std::fs::File::open(dir.join(name))?,
            rank,
            &mut awards,
            &mut report,
        )?;
    }
    read_weekly_awards(
        std::fs::File::open(dir.join("player-of-the-week.csv"))?,
        &mut awards,
        &mut report,
    )?;

    Ok((awards, report))
}

// ==================== Output tables ====================

fn flag(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

fn opt_u32(v: Option<u32>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// Write the per-game player-feature table.
pub fn write_per_game<W: io::Write>(writer: W, rows: &[PlayerGameFeatures]) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);

    wtr.write_record([
        "game_id",
        "game_date",
        "week_start",
        "season",
        "team",
        "team_id",
        "opponent",
        "opponent_id",
        "outcome",
        "is_home",
        "team_score",
        "opp_score",
        "games_prior",
        "wins_prior",
        "losses_prior",
        "record_prior",
        "home_games_prior",
        "home_wins_prior",
        "home_losses_prior",
        "home_record_prior",
        "away_games_prior",
        "away_wins_prior",
        "away_losses_prior",
        "away_record_prior",
        "win_streak_prior",
        "home_win_streak_prior",
        "away_win_streak_prior",
        "opp_wins_prior",
        "opp_losses_prior",
        "opp_winrate_prior",
        "is_win_vs_over_500",
        "wins_vs_over_500_prior",
        "week_games_prior",
        "week_wins_prior",
        "week_losses_prior",
        "week_record_prior",
        "player_id",
        "first_name",
        "last_name",
        "full_name",
        "conference",
        "minutes",
        "points",
        "assists",
        "blocks",
        "steals",
        "field_goals_attempted",
        "field_goals_made",
        "three_pointers_attempted",
        "three_pointers_made",
        "free_throws_attempted",
        "free_throws_made",
        "rebounds_defensive",
        "rebounds_offensive",
        "rebounds_total",
        "fouls_personal",
        "turnovers",
        "plus_minus",
        "all_star_this_season",
        "mvp_this_season",
        "all_nba_first_team_this_season",
        "all_nba_second_team_this_season",
        "all_nba_third_team_this_season",
        "pow_player_id",
        "player_of_the_week",
        "won_player_of_the_week",
        "opponent_has_all_nba",
        "wins_vs_team_with_all_nba_player",
    ])?;

    for row in rows {
        let tg = &row.team_game;
        let p = &row.player;
        wtr.write_record([
            tg.rec.game_id.0.to_string(),
            tg.rec.date.to_string(),
            row.week_start.to_string(),
            tg.rec.season.0.to_string(),
            tg.rec.team_name.clone(),
            tg.rec.team_id.0.to_string(),
            tg.rec.opponent_name.clone(),
            tg.rec.opponent_id.0.to_string(),
            tg.rec.outcome().to_string(),
            flag(tg.rec.is_home).to_string(),
            tg.rec.team_score.to_string(),
            tg.rec.opp_score.to_string(),
            tg.prior.games.to_string(),
            tg.prior.wins.to_string(),
            tg.prior.losses.to_string(),
            tg.prior.record.clone(),
            tg.prior.home_games.to_string(),
            tg.prior.home_wins.to_string(),
            tg.prior.home_losses.to_string(),
            tg.prior.home_record.clone(),
            tg.prior.away_games.to_string(),
            tg.prior.away_wins.to_string(),
            tg.prior.away_losses.to_string(),
            tg.prior.away_record.clone(),
            tg.prior.win_streak.to_string(),
            tg.prior.home_win_streak.to_string(),
            tg.prior.away_win_streak.to_string(),
            opt_u32(tg.opponent.wins),
            opt_u32(tg.opponent.losses),
            tg.opponent.winrate.to_string(),
            flag(tg.is_win_vs_over_500).to_string(),
            tg.wins_vs_over_500_prior.to_string(),
            tg.week_prior.games.to_string(),
            tg.week_prior.wins.to_string(),
            tg.week_prior.losses.to_string(),
            tg.week_prior.record.clone(),
            p.player_id.0.to_string(),
            p.first_name.clone(),
            p.last_name.clone(),
            p.full_name.clone(),
            row.conference.map(|c| c.to_string()).unwrap_or_default(),
            p.minutes.to_string(),
            p.points.to_string(),
            p.assists.to_string(),
            p.blocks.to_string(),
            p.steals.to_string(),
            p.field_goals_attempted.to_string(),
            p.field_goals_made.to_string(),
            p.three_pointers_attempted.to_string(),
            p.three_pointers_made.to_string(),
            p.free_throws_attempted.to_string(),
            p.free_throws_made.to_string(),
            p.rebounds_defensive.to_string(),
            p.rebounds_offensive.to_string(),
            p.rebounds_total.to_string(),
            p.fouls_personal.to_string(),
            p.turnovers.to_string(),
            p.plus_minus.to_string(),
            flag(row.season_awards.all_star).to_string(),
            flag(row.season_awards.mvp).to_string(),
            flag(row.season_awards.all_nba_first_team).to_string(),
            flag(row.season_awards.all_nba_second_team).to_string(),
            flag(row.season_awards.all_nba_third_team).to_string(),
            row.pow_winner_id
                .map(|id| id.0.to_string())
                .unwrap_or_default(),
            row.pow_winner_name.clone().unwrap_or_default(),
            flag(row.won_player_of_the_week).to_string(),
            flag(row.opponent_has_all_nba).to_string(),
            flag(row.wins_vs_team_with_all_nba_player).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_per_game_path(path: &Path, rows: &[PlayerGameFeatures]) -> Result<()> {
    write_per_game(std::fs::File::create(path)?, rows)
}

/// Write the per-player-week aggregate-feature table. Bucket column
/// labels are generated from the configured boundaries.
pub fn write_per_week<W: io::Write>(
    writer: W,
    rows: &[ScoredWeek],
    buckets: &BucketConfig,
) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);

    let mut header: Vec<String> = [
        "player_id",
        "full_name",
        "team",
        "season",
        "week_start",
        "conference",
        "games_played_this_week",
        "minutes",
        "points",
        "assists",
        "blocks",
        "steals",
        "rebounds_total",
        "rebounds_offensive",
        "rebounds_defensive",
        "field_goals_attempted",
        "field_goals_made",
        "field_goals_pct",
        "three_pointers_attempted",
        "three_pointers_made",
        "three_pointers_pct",
        "free_throws_attempted",
        "free_throws_made",
        "free_throws_pct",
        "turnovers",
        "fouls_personal",
        "plus_minus",
        "plus_minus_mean",
        "wins_this_week",
        "wins_vs_over_500",
        "wins_vs_team_with_all_nba_player",
        "games_vs_all_nba_opponent",
        "avg_opp_score",
        "avg_opp_winrate_prior",
        "avg_opp_wins_prior",
        "avg_opp_losses_prior",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    header.extend(bucket_labels("points", &buckets.points));
    header.extend(bucket_labels("assists", &buckets.assists));
    header.extend(bucket_labels("rebounds_total", &buckets.rebounds_total));
    header.extend(bucket_labels(
        "rebounds_offensive",
        &buckets.rebounds_offensive,
    ));
    header.extend(bucket_labels(
        "rebounds_defensive",
        &buckets.rebounds_defensive,
    ));
    header.extend(bucket_labels("steals", &buckets.steals));
    header.extend(bucket_labels("blocks", &buckets.blocks));

    header.extend(
        [
            "games_prior",
            "wins_prior",
            "losses_prior",
            "win_streak_prior",
            "home_games_prior",
            "home_wins_prior",
            "home_losses_prior",
            "home_win_streak_prior",
            "away_games_prior",
            "away_wins_prior",
            "away_losses_prior",
            "away_win_streak_prior",
            "wins_vs_over_500_prior",
            "team_points",
            "team_assists",
            "team_blocks",
            "team_steals",
            "team_games",
            "all_star_this_season",
            "mvp_this_season",
            "all_nba_first_team_this_season",
            "all_nba_second_team_this_season",
            "all_nba_third_team_this_season",
            "won_player_of_the_week",
            "pow_player_id",
            "player_of_the_week",
            "points_mean_season",
            "points_std_season",
            "assists_mean_season",
            "assists_std_season",
            "plus_minus_mean_season",
            "plus_minus_std_season",
            "z_points",
            "z_assists",
            "z_plus_minus",
            "breakout_score",
            "league_z_points",
            "league_z_assists",
            "league_z_plus_minus",
        ]
        .iter()
        .map(|s| s.to_string()),
    );

    wtr.write_record(&header)?;

    for scored in rows {
        let w = &scored.week;
        let b = &scored.breakout;
        let mut record: Vec<String> = vec![
            w.player_id.0.to_string(),
            w.full_name.clone(),
            w.team_name.clone(),
            w.season.0.to_string(),
            w.week_start.to_string(),
            w.conference.map(|c| c.to_string()).unwrap_or_default(),
            w.games_played.to_string(),
            w.minutes.to_string(),
            w.points.to_string(),
            w.assists.to_string(),
            w.blocks.to_string(),
            w.steals.to_string(),
            w.rebounds_total.to_string(),
            w.rebounds_offensive.to_string(),
            w.rebounds_defensive.to_string(),
            w.field_goals_attempted.to_string(),
            w.field_goals_made.to_string(),
            w.field_goals_pct.to_string(),
            w.three_pointers_attempted.to_string(),
            w.three_pointers_made.to_string(),
            w.three_pointers_pct.to_string(),
            w.free_throws_attempted.to_string(),
            w.free_throws_made.to_string(),
            w.free_throws_pct.to_string(),
            w.turnovers.to_string(),
            w.fouls_personal.to_string(),
            w.plus_minus.to_string(),
            w.plus_minus_mean.to_string(),
            w.wins.to_string(),
            w.wins_vs_over_500.to_string(),
            w.wins_vs_team_with_all_nba_player.to_string(),
            w.games_vs_all_nba_opponent.to_string(),
            w.avg_opp_score.to_string(),
            w.avg_opp_winrate_prior.to_string(),
            w.avg_opp_wins_prior.to_string(),
            w.avg_opp_losses_prior.to_string(),
        ];

        for counts in [
            &w.buckets.points,
            &w.buckets.assists,
            &w.buckets.rebounds_total,
            &w.buckets.rebounds_offensive,
            &w.buckets.rebounds_defensive,
            &w.buckets.steals,
            &w.buckets.blocks,
        ] {
            record.extend(counts.iter().map(|c| c.to_string()));
        }

        let tp = &w.team_prior;
        record.extend([
            tp.games.to_string(),
            tp.wins.to_string(),
            tp.losses.to_string(),
            tp.win_streak.to_string(),
            tp.home_games.to_string(),
            tp.home_wins.to_string(),
            tp.home_losses.to_string(),
            tp.home_win_streak.to_string(),
            tp.away_games.to_string(),
            tp.away_wins.to_string(),
            tp.away_losses.to_string(),
            tp.away_win_streak.to_string(),
            tp.wins_vs_over_500.to_string(),
            w.team_week.points.to_string(),
            w.team_week.assists.to_string(),
            w.team_week.blocks.to_string(),
            w.team_week.steals.to_string(),
            w.team_week.games.to_string(),
            flag(w.season_awards.all_star).to_string(),
            flag(w.season_awards.mvp).to_string(),
            flag(w.season_awards.all_nba_first_team).to_string(),
            flag(w.season_awards.all_nba_second_team).to_string(),
            flag(w.season_awards.all_nba_third_team).to_string(),
            flag(w.won_player_of_the_week).to_string(),
            w.pow_winner_id
                .map(|id| id.0.to_string())
                .unwrap_or_default(),
            w.pow_winner_name.clone().unwrap_or_default(),
            b.points_mean_season.to_string(),
            b.points_std_season.to_string(),
            b.assists_mean_season.to_string(),
            b.assists_std_season.to_string(),
            b.plus_minus_mean_season.to_string(),
            b.plus_minus_std_season.to_string(),
            b.z_points.to_string(),
            b.z_assists.to_string(),
            b.z_plus_minus.to_string(),
            b.breakout_score.to_string(),
            b.league_z_points.to_string(),
            b.league_z_assists.to_string(),
            b.league_z_plus_minus.to_string(),
        ]);

        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_per_week_path(path: &Path, rows: &[ScoredWeek], buckets: &BucketConfig) -> Result<()> {
    write_per_week(std::fs::File::create(path)?, rows, buckets)
}
