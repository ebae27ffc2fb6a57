//! Award and honor reference tables
//!
//! All-star, MVP, all-NBA team, and weekly-award cohorts, joined onto the
//! per-game and per-week grains as binary labels. Reference data is never
//! mutated by the engine.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate};

use crate::{Conference, GameId, PlayerId, Season};

/// Season-scoped award membership flags for one player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeasonAwardFlags {
    pub all_star: bool,
    pub mvp: bool,
    pub all_nba_first_team: bool,
    pub all_nba_second_team: bool,
    pub all_nba_third_team: bool,
}

/// One week's award winner for one conference
#[derive(Debug, Clone)]
pub struct WeeklyAward {
    pub player_id: PlayerId,
    pub player_name: String,
    pub conference: Conference,
    /// Last date of the awarded week
    pub week_end: NaiveDate,
}

/// ISO week key used for weekly-award joins
pub fn iso_week_key(date: NaiveDate) -> (i32, u32) {
    let iso = date.iso_week();
    (iso.year(), iso.week())
}

/// Conference and nickname for a team display name
#[derive(Debug, Clone)]
pub struct TeamInfo {
    pub conference: Conference,
    pub nickname: String,
}

/// Reference table mapping team display names to conference info.
///
/// Franchise renames and relocations appear as distinct entries; lineages
/// are never merged. Ordered storage keeps the nickname fallback
/// deterministic when two franchises share a nickname.
#[derive(Debug, Default)]
pub struct ConferenceTable {
    by_name: BTreeMap<String, TeamInfo>,
}

/// (display name, conference, nickname) for every franchise identity in
/// the modeled era. Renames and relocations are separate entries.
const TEAM_CONFERENCES: &[(&str, Conference, &str)] = &[
    // Eastern Conference
    ("Boston Celtics", Conference::East, "Celtics"),
    ("Brooklyn Nets", Conference::East, "Nets"),
    ("New York Knicks", Conference::East, "Knicks"),
    ("Philadelphia 76ers", Conference::East, "76ers"),
    ("Philadelphia Sixers", Conference::East, "Sixers"),
    ("Toronto Raptors", Conference::East, "Raptors"),
    ("Chicago Bulls", Conference::East, "Bulls"),
    ("Cleveland Cavaliers", Conference::East, "Cavaliers"),
    ("Detroit Pistons", Conference::East, "Pistons"),
    ("Indiana Pacers", Conference::East, "Pacers"),
    ("Milwaukee Bucks", Conference::East, "Bucks"),
    ("Atlanta Hawks", Conference::East, "Hawks"),
    ("Charlotte Hornets", Conference::East, "Hornets"),
    ("Miami Heat", Conference::East, "Heat"),
    ("Orlando Magic", Conference::East, "Magic"),
    ("Washington Wizards", Conference::East, "Wizards"),
    ("Washington Bullets", Conference::East, "Bullets"),
    ("New Jersey Nets", Conference::East, "Nets"),
    ("Charlotte Bobcats", Conference::East, "Bobcats"),
    // Western Conference
    ("Denver Nuggets", Conference::West, "Nuggets"),
    ("Minnesota Timberwolves", Conference::West, "Timberwolves"),
    ("Oklahoma City Thunder", Conference::West, "Thunder"),
    ("Portland Trail Blazers", Conference::West, "Trail Blazers"),
    ("Utah Jazz", Conference::West, "Jazz"),
    ("Golden State Warriors", Conference::West, "Warriors"),
    ("Los Angeles Clippers", Conference::West, "Clippers"),
    ("LA Clippers", Conference::West, "Clippers"),
    ("Los Angeles Lakers", Conference::West, "Lakers"),
    ("Phoenix Suns", Conference::West, "Suns"),
    ("Sacramento Kings", Conference::West, "Kings"),
    ("Dallas Mavericks", Conference::West, "Mavericks"),
    ("Houston Rockets", Conference::West, "Rockets"),
    ("Memphis Grizzlies", Conference::West, "Grizzlies"),
    ("New Orleans Pelicans", Conference::West, "Pelicans"),
    ("San Antonio Spurs", Conference::West, "Spurs"),
    ("Seattle SuperSonics", Conference::West, "SuperSonics"),
    ("San Diego Clippers", Conference::West, "Clippers"),
    ("Kansas City Kings", Conference::West, "Kings"),
    ("New Orleans Hornets", Conference::West, "Hornets"),
    ("Vancouver Grizzlies", Conference::West, "Grizzlies"),
    ("Oklahoma City Hornets", Conference::West, "Hornets"),
    ("New Orleans Jazz", Conference::West, "Jazz"),
];

impl ConferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in reference table for the modeled era
    pub fn builtin() -> Self {
        let mut table = ConferenceTable::new();
        for (name, conference, nickname) in TEAM_CONFERENCES {
            table.insert(
                (*name).to_string(),
                TeamInfo {
                    conference: *conference,
                    nickname: (*nickname).to_string(),
                },
            );
        }
        table
    }

    pub fn insert(&mut self, team_name: String, info: TeamInfo) {
        self.by_name.insert(team_name, info);
    }

    /// Look up by display name, falling back to nickname match
    pub fn get(&self, team_name: &str) -> Option<&TeamInfo> {
        self.by_name.get(team_name).or_else(|| {
            self.by_name
                .values()
                .find(|info| info.nickname == team_name)
        })
    }

    pub fn conference_of(&self, team_name: &str) -> Option<Conference> {
        self.get(team_name).map(|info| info.conference)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// All award reference sets, keyed for O(1) label attachment
#[derive(Debug, Default)]
pub struct AwardTables {
    all_star: HashSet<(PlayerId, Season)>,
    mvp: HashSet<(PlayerId, Season)>,
    all_nba_first: HashSet<(PlayerId, Season)>,
    all_nba_second: HashSet<(PlayerId, Season)>,
    all_nba_third: HashSet<(PlayerId, Season)>,
    /// Every player ever selected to any all-NBA team
    all_nba_players: HashSet<PlayerId>,
    /// Weekly winners keyed by (iso year, iso week, conference)
    weekly: HashMap<(i32, u32, Conference), WeeklyAward>,
}

impl AwardTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// All-star selections are published with the calendar year of the
    /// game; the season of record is the year before.
    pub fn add_all_star(&mut self, player: PlayerId, selection_year: i32) {
        self.all_star.insert((player, Season(selection_year - 1)));
    }

    pub fn add_mvp(&mut self, player: PlayerId, season: Season) {
        self.mvp.insert((player, season));
    }

    pub fn add_all_nba(&mut self, player: PlayerId, season: Season, team_rank: u8) {
        match team_rank {
            1 => self.all_nba_first.insert((player, season)),
            2 => self.all_nba_second.insert((player, season)),
            _ => self.all_nba_third.insert((player, season)),
        };
        self.all_nba_players.insert(player);
    }

    /// Weekly awards are dated the Monday after the awarded week; the key
    /// is derived from the day before the award date.
    pub fn add_weekly(
        &mut self,
        player: PlayerId,
        player_name: String,
        award_date: NaiveDate,
        conference: Conference,
    ) {
        let week_end = award_date - Duration::days(1);
        let (year, week) = iso_week_key(week_end);
        self.weekly.insert(
            (year, week, conference),
            WeeklyAward {
                player_id: player,
                player_name,
                conference,
                week_end,
            },
        );
    }

    pub fn season_flags(&self, player: PlayerId, season: Season) -> SeasonAwardFlags {
        let key = (player, season);
        SeasonAwardFlags {
            all_star: self.all_star.contains(&key),
            mvp: self.mvp.contains(&key),
            all_nba_first_team: self.all_nba_first.contains(&key),
            all_nba_second_team: self.all_nba_second.contains(&key),
            all_nba_third_team: self.all_nba_third.contains(&key),
        }
    }

    /// The weekly winner a game date competes against, for one conference
    pub fn weekly_winner(&self, date: NaiveDate, conference: Conference) -> Option<&WeeklyAward> {
        let (year, week) = iso_week_key(date);
        self.weekly.get(&(year, week, conference))
    }

    /// Whether a player has ever been selected to an all-NBA team
    pub fn is_all_nba_player(&self, player: PlayerId) -> bool {
        self.all_nba_players.contains(&player)
    }

    pub fn weekly_count(&self) -> usize {
        self.weekly.len()
    }
}

/// Roster index: which players appeared for which team in which game.
///
/// Built from the box-score rows; used for the opponent-has-all-NBA flag.
#[derive(Debug, Default)]
pub struct RosterIndex {
    rosters: HashMap<(GameId, String), HashSet<PlayerId>>,
}

impl RosterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, game_id: GameId, team_name: &str, player: PlayerId) {
        self.rosters
            .entry((game_id, team_name.to_string()))
            .or_default()
            .insert(player);
    }

    /// Whether the named roster contains any all-NBA player
    pub fn has_all_nba(&self, game_id: GameId, team_name: &str, awards: &AwardTables) -> bool {
        self.rosters
            .get(&(game_id, team_name.to_string()))
            .map(|roster| roster.iter().any(|p| awards.is_all_nba_player(*p)))
            .unwrap_or(false)
    }
}
