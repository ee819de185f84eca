//! Trophy Fitness CLI
//!
//! Command-line client for Trophy Fitness:
//! - Keep an anonymous identity and city in a local store
//! - Log runs, rides and swims
//! - Show levels, dashboard, profile and leaderboards

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use trophy_fitness::config::{generate_default_config, Config};
use trophy_fitness::gamification::{
    ActivityLog, ActivityType, LeaderboardEntry, LeaderboardScope, Pace, SwimStyle,
};
use trophy_fitness::identity::{
    CookieJar, FileStore, FixedTimezone, IdentityCarrier, SystemTimezone, TimezoneSource,
};
use trophy_fitness::levels::{compute_level_info, LevelInfo};
use trophy_fitness::logging;
use trophy_fitness::relay::RelayClient;
use trophy_fitness::session::{ClientSession, SyncOutcome};
use trophy_fitness::views::{ActivityTotal, DashboardView, NextAchievement, ProfileView};

#[derive(Parser)]
#[command(name = "trophy-fitness")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Log workouts, keep streaks and climb the leaderboards")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Relay server URL (overrides the config file)
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Config file (default: search the standard locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Log at the configured level instead of warnings only
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show (and register) your anonymous identity
    Whoami,

    /// Change your display name
    Rename {
        name: String,
    },

    /// Show or change the city used for city leaderboards
    City {
        #[command(subcommand)]
        action: Option<CityAction>,
    },

    /// Show the level for an XP total
    Level {
        #[arg(allow_hyphen_values = true)]
        xp: i64,
    },

    /// Log a workout
    Log {
        /// run, cycle or swim
        activity: ActivityType,
        /// Distance in km (m for swims)
        #[arg(allow_hyphen_values = true)]
        distance: f64,
        /// Running pace: run or walk
        #[arg(long)]
        pace: Option<Pace>,
        /// Swimming style: freestyle or breaststroke
        #[arg(long)]
        style: Option<SwimStyle>,
        /// City to credit (default: your city)
        #[arg(long)]
        city: Option<String>,
    },

    /// Show this week's leaderboard for an activity
    Leaderboard {
        activity: ActivityType,
        /// Restrict to a city; without a value, your own city
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        city: Option<String>,
    },

    /// Show your level, streak and totals
    Dashboard,

    /// Show your full profile with achievements
    Profile,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum CityAction {
    /// Show the current city
    Show,
    /// Set the city
    Set { city: String },
    /// Go back to the city detected from your timezone
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.server_url {
        config.client.server_url = url.clone();
    }

    let mut logging_config = config.logging.clone();
    if !cli.verbose {
        logging_config.level = "warn".to_string();
    }
    logging::init(&logging_config);

    if let Commands::Config { output } = &cli.command {
        return write_config(output.as_ref());
    }
    if let Commands::Level { xp } = &cli.command {
        return print_level(&compute_level_info(*xp), &cli.format);
    }

    let store = Arc::new(
        FileStore::open(config.client.store_path()).context("Failed to open local store")?,
    );
    let carrier: Arc<dyn IdentityCarrier> =
        Arc::new(CookieJar::new(config.client.cookie_jar_path()));
    let timezone: Arc<dyn TimezoneSource> = match &config.client.timezone {
        Some(tz) => Arc::new(FixedTimezone::new(tz.clone())),
        None => Arc::new(SystemTimezone),
    };
    let relay = Arc::new(
        RelayClient::new(
            &config.client.server_url,
            config.client.request_timeout_ms,
            Arc::clone(&carrier),
        )
        .context("Failed to create relay client")?,
    );
    let session = ClientSession::new(store, carrier, timezone, relay.clone());

    match cli.command {
        Commands::Whoami => {
            let outcome = session.bootstrap().await?;
            let identity = session.identity();
            print_json_or(&cli.format, &whoami_json(&session, &outcome.value), || {
                println!("User ID: {}", outcome.value);
                println!(
                    "Name:    {}",
                    identity.get_user_name().unwrap_or_else(|| "-".to_string())
                );
                println!("City:    {}", session.city().resolve_city());
            })?;
            report_sync(&outcome);
        }

        Commands::Rename { name } => {
            let outcome = session.rename(&name).await?;
            println!("You are now {}", outcome.value);
            report_sync(&outcome);
        }

        Commands::City { action } => match action.unwrap_or(CityAction::Show) {
            CityAction::Show => {
                let city = session.city();
                match city.stored_city() {
                    Some(stored) => println!("{}", stored),
                    None => println!("{} (detected)", city.default_city_from_timezone()),
                }
            }
            CityAction::Set { city } => {
                let outcome = session.change_city(&city).await?;
                println!("City set to {}", outcome.value);
                report_sync(&outcome);
            }
            CityAction::Reset => {
                let outcome = session.reset_city().await?;
                println!("City reset to {}", outcome.value);
                report_sync(&outcome);
            }
        },

        Commands::Level { .. } | Commands::Config { .. } => {}

        Commands::Log {
            activity,
            distance,
            pace,
            style,
            city,
        } => {
            let mut log = ActivityLog::new(activity, distance);
            log.pace = pace;
            log.style = style;
            log.city = city;

            let response = session.log_activity(log).await?;
            println!("Logged {} {} {}", distance, activity.unit(), activity.verb());
            if let Some(total) = response.total {
                println!("Total: {} {}", total, activity.unit());
            }
            if let Some(length) = response.current_streak.as_ref().and_then(|s| s.length) {
                println!("Streak: {} day(s)", length);
            }
            for achievement in &response.achievements {
                println!(
                    "Achievement unlocked: {}",
                    achievement.name.as_deref().unwrap_or("New achievement")
                );
            }
            if let Some(added) = response.points.as_ref().and_then(|p| p.added) {
                println!("+{} XP", added);
            }
        }

        Commands::Leaderboard { activity, city } => {
            let scope = match city {
                None => LeaderboardScope::Global,
                Some(name) if name.trim().is_empty() => {
                    LeaderboardScope::City(session.city().resolve_city())
                }
                Some(name) => LeaderboardScope::City(name),
            };
            let entries = session.leaderboard(activity, &scope).await?;
            print_leaderboard(activity, &scope, &entries, &cli.format)?;
        }

        Commands::Dashboard => {
            session.user_id()?;
            let view = relay.dashboard().await.context("Failed to load dashboard")?;
            print_json_or(&cli.format, &view, || print_dashboard(&view))?;
        }

        Commands::Profile => {
            let user_id = session.user_id()?;
            let view = relay.profile().await.context("Failed to load profile")?;
            let name = session.identity().get_user_name().unwrap_or(user_id);
            print_json_or(&cli.format, &view, || print_profile(&name, &view))?;
        }
    }

    Ok(())
}

fn write_config(output: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = generate_default_config();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)?;
            println!("Config written to {:?}", path);
        }
        None => {
            print!("{}", config);
        }
    }
    Ok(())
}

fn report_sync<T>(outcome: &SyncOutcome<T>) {
    if let Some(error) = &outcome.sync_error {
        eprintln!("Saved locally, but the server could not be updated: {}", error);
    }
}

fn whoami_json(session: &ClientSession, user_id: &str) -> serde_json::Value {
    serde_json::json!({
        "user_id": user_id,
        "user_name": session.identity().get_user_name(),
        "city": session.city().resolve_city(),
    })
}

fn print_json_or<T: Serialize>(
    format: &str,
    value: &T,
    table: impl FnOnce(),
) -> anyhow::Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        table();
    }
    Ok(())
}

fn print_level(info: &LevelInfo, format: &str) -> anyhow::Result<()> {
    print_json_or(format, info, || {
        println!(
            "Level {} - {}",
            info.current_level.level, info.current_level.name
        );
        println!("{} {:.0}%", progress_bar(info.progress_to_next_level), info.progress_to_next_level);
        match &info.next_level {
            Some(next) => println!("{} XP to {}", info.xp_to_next_level(), next.name),
            None => println!("Max level reached"),
        }
    })
}

fn progress_bar(percent: f64) -> String {
    const WIDTH: usize = 20;
    let filled = ((percent / 100.0) * WIDTH as f64).round().clamp(0.0, WIDTH as f64) as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(WIDTH - filled))
}

fn print_totals(totals: &[ActivityTotal]) {
    for total in totals {
        println!(
            "  {:<8} {:>10.1} {}",
            total.activity.to_string(),
            total.total,
            total.unit
        );
    }
}

fn print_next(next: Option<&NextAchievement>) {
    if let Some(next) = next {
        match &next.requirement {
            Some(requirement) => println!("Next achievement: {} ({})", next.name, requirement),
            None => println!("Next achievement: {}", next.name),
        }
    }
}

fn print_dashboard(view: &DashboardView) {
    println!(
        "Level {} - {} ({} XP)",
        view.level.current_level.level, view.level.current_level.name, view.total_xp
    );
    println!(
        "{} {:.0}%",
        progress_bar(view.level.progress_to_next_level),
        view.level.progress_to_next_level
    );
    println!("Streak: {} day(s)", view.streak_length);
    println!();
    println!("Totals:");
    print_totals(&view.totals);
    println!();
    print_next(view.next_achievement.as_ref());
}

fn print_profile(name: &str, view: &ProfileView) {
    println!("{}", name);
    println!(
        "Level {} - {} ({} XP), streak {} day(s)",
        view.level.current_level.level,
        view.level.current_level.name,
        view.total_xp,
        view.streak_length
    );
    println!();
    println!("Totals:");
    print_totals(&view.totals);

    println!();
    println!("Achievements ({}/{}):", view.earned.len(), view.earned.len() + view.locked.len());
    for achievement in &view.earned {
        println!("  [x] {}", achievement.name.as_deref().unwrap_or("-"));
    }
    for achievement in &view.locked {
        let requirement = achievement.requirement().unwrap_or_default();
        println!(
            "  [ ] {} {}",
            achievement.name.as_deref().unwrap_or("-"),
            requirement
        );
    }
}

#[derive(Serialize)]
struct LeaderboardRow {
    rank: u32,
    name: String,
    value: f64,
    unit: &'static str,
}

fn print_leaderboard(
    activity: ActivityType,
    scope: &LeaderboardScope,
    entries: &[LeaderboardEntry],
    format: &str,
) -> anyhow::Result<()> {
    let rows: Vec<LeaderboardRow> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| LeaderboardRow {
            rank: entry.rank.unwrap_or(index as u32 + 1),
            name: entry.display_name(),
            value: entry.value.unwrap_or(0.0),
            unit: activity.unit(),
        })
        .collect();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
        "csv" => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        "table" => {
            let title = match scope {
                LeaderboardScope::Global => "everyone".to_string(),
                LeaderboardScope::City(city) => city.clone(),
            };
            println!("Weekly {} {} - {}", activity.unit(), activity.verb(), title);
            if rows.is_empty() {
                println!("No entries yet this week.");
                return Ok(());
            }
            println!("{:<6} {:<24} {:>12}", "Rank", "Name", "Distance");
            println!("{}", "-".repeat(44));
            for row in &rows {
                println!(
                    "{:<6} {:<24} {:>9.1} {}",
                    row.rank, row.name, row.value, row.unit
                );
            }
        }
        other => bail!("Unknown output format: {}", other),
    }
    Ok(())
}
