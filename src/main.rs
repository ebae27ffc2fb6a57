//! NBA award feature engineering CLI
//!
//! Loads game and box-score tables, derives leakage-free temporal
//! features, and writes the per-game and per-week feature tables.

use clap::{Parser, Subcommand};
use hoops::{Config, Result};

#[derive(Parser)]
#[command(name = "hoops")]
#[command(about = "NBA award prediction feature engineering", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Run the feature pipeline and write the output tables
    Run {
        /// Directory containing the award reference CSVs
        #[arg(long)]
        awards_dir: String,
        /// Override the configured output directory
        #[arg(long)]
        out_dir: Option<String>,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Load input CSVs into the local database
    Load {
        /// Games table CSV
        #[arg(long)]
        games: String,
        /// Player box-score table CSV
        #[arg(long)]
        players: String,
    },
    /// Show database status
    Status,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Load { games, players } => commands::data_load(&config, &games, &players),
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Run { awards_dir, out_dir } => commands::run(&config, &awards_dir, out_dir),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use std::path::Path;

    use hoops::data::{tables, Database};
    use hoops::features::ConferenceTable;
    use hoops::pipeline::{self, PipelineInputs};
    use hoops::{Config, Result};
    use log::info;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("out")?;
        println!("Created data/ and out/ directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'hoops data load --games games.csv --players player-statistics.csv'");
        println!("  3. Run 'hoops run --awards-dir <dir>' to derive features");
        Ok(())
    }

    pub fn data_load(config: &Config, games_path: &str, players_path: &str) -> Result<()> {
        let games = tables::read_games_path(Path::new(games_path))?;
        info!(
            "read {} games from {} ({} rows rejected)",
            games.rows.len(),
            games_path,
            games.rejected
        );

        let players = tables::read_player_stats_path(Path::new(players_path))?;
        info!(
            "read {} box-score rows from {} ({} rejected, incl. did-not-play)",
            players.rows.len(),
            players_path,
            players.rejected
        );

        let mut db = Database::open(&config.data.database_path)?;
        let inserted_games = db.insert_games(&games.rows)?;
        let inserted_rows = db.insert_player_rows(&players.rows)?;

        println!(
            "Loaded {} games and {} box-score rows into {}",
            inserted_games, inserted_rows, config.data.database_path
        );
        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        println!("Database: {}", config.data.database_path);
        println!("  games:          {}", db.game_count()?);
        println!("  box-score rows: {}", db.player_row_count()?);
        Ok(())
    }

    pub fn run(config: &Config, awards_dir: &str, out_dir: Option<String>) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let games = db.load_games()?;
        let player_rows = db.load_player_rows()?;
        info!(
            "loaded {} games and {} box-score rows",
            games.len(),
            player_rows.len()
        );

        let (awards, award_report) = tables::load_award_dir(Path::new(awards_dir))?;
        info!(
            "loaded award tables ({} weekly awards, {} rows rejected)",
            awards.weekly_count(),
            award_report.rejected
        );

        let inputs = PipelineInputs {
            games,
            player_rows,
            awards,
            conferences: ConferenceTable::builtin(),
        };
        let output = pipeline::run(inputs, config)?;

        let out_dir = out_dir.unwrap_or_else(|| config.data.output_dir.clone());
        std::fs::create_dir_all(&out_dir)?;
        let per_game_path = Path::new(&out_dir).join("features-per-game.csv");
        let per_week_path = Path::new(&out_dir).join("features-weekly.csv");
        tables::write_per_game_path(&per_game_path, &output.per_game)?;
        tables::write_per_week_path(&per_week_path, &output.per_week, &config.features.buckets)?;

        let report = output.report;
        println!("Wrote {} per-game rows to {}", report.per_game_rows, per_game_path.display());
        println!("Wrote {} weekly rows to {}", report.scored_weeks, per_week_path.display());
        println!(
            "  games in: {} ({} pre-era filtered), team-game rows: {}",
            report.games_in, report.games_filtered_pre_era, report.team_game_rows
        );
        println!(
            "  opponent joins unmatched: {}, box-score rows unmatched: {}",
            report.opponent_join_unmatched, report.player_rows_unmatched
        );
        println!(
            "  player-weeks: {} ({} first weeks dropped)",
            report.player_weeks, report.first_weeks_dropped
        );
        Ok(())
    }
}
