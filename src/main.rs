use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod blob;
mod coerce;
mod config;
mod models;
mod report;
mod stats;
mod store;

use blob::FileBlobStore;
use models::{Alliance, MatchNumber, Observation};
use store::MatchStore;

#[derive(Parser)]
#[command(name = "match-scouting")]
#[command(about = "Match scouting ledger with team statistics and event rankings", long_about = None)]
struct Cli {
    /// Directory holding the local scouting data
    #[arg(long, env = "SCOUTING_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remember which team is doing the scouting
    Login {
        #[arg(long)]
        team: String,
    },
    /// Record one match observation
    Add {
        #[arg(long)]
        team: i64,
        #[arg(long = "match")]
        match_number: String,
        #[arg(long)]
        alliance: Alliance,
        #[arg(long)]
        position: String,
        #[arg(long)]
        auto_fuel: Option<i64>,
        #[arg(long)]
        auto_cycle_time: Option<f64>,
        #[arg(long)]
        auto_climb: Option<String>,
        #[arg(long)]
        chassis: Option<String>,
        #[arg(long)]
        teleop_fuel: Option<i64>,
        #[arg(long)]
        teleop_cycle_time: Option<f64>,
        #[arg(long)]
        teleop_fuel_rate: Option<f64>,
        #[arg(long)]
        fuel_capacity: Option<i64>,
        #[arg(long)]
        shooter: Option<String>,
        #[arg(long)]
        hood: Option<String>,
        #[arg(long)]
        climb: Option<String>,
        #[arg(long, value_parser = clap::builder::PossibleValuesParser::new(["1", "2", "3", "4", "5"]))]
        defense: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Merge records exported by another scout
    Import {
        #[arg(long)]
        file: PathBuf,
    },
    /// Write every record to a dated JSON file
    Export {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Delete all stored records
    Clear {
        /// Confirm deleting all scouting data; this cannot be undone
        #[arg(long)]
        yes: bool,
    },
    /// List every scouted team
    Teams,
    /// Show statistics and match history for one team
    Team {
        #[arg(long)]
        team: i64,
    },
    /// Show event-wide rankings
    Rankings,
    /// Show your scouting activity and your own team's numbers
    MyTeam,
    /// Write the event rankings as a markdown report
    Report {
        #[arg(long, default_value = "event-report.md")]
        out: PathBuf,
    },
    /// Write per-team statistics as CSV
    StatsCsv {
        #[arg(long, default_value = "team-stats.csv")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let data_dir = config::resolve_data_dir(cli.data_dir)?;
    let mut store = MatchStore::open(FileBlobStore::new(data_dir));

    match cli.command {
        Commands::Login { team } => {
            store.set_scout_team(&team)?;
            println!("Logged in as Team {}.", team.trim());
        }
        Commands::Add {
            team,
            match_number,
            alliance,
            position,
            auto_fuel,
            auto_cycle_time,
            auto_climb,
            chassis,
            teleop_fuel,
            teleop_cycle_time,
            teleop_fuel_rate,
            fuel_capacity,
            shooter,
            hood,
            climb,
            defense,
            notes,
        } => {
            let observation = Observation {
                team_number: team,
                match_number: MatchNumber::Text(match_number),
                alliance,
                position,
                auto_fuel_scored: auto_fuel,
                auto_cycle_time,
                auto_tower_climb: auto_climb,
                chassis_type: chassis,
                teleop_fuel_scored: teleop_fuel,
                teleop_cycle_time,
                teleop_fuel_rate,
                fuel_capacity,
                shooter_mechanism: shooter,
                hood_adjustable: hood,
                climb,
                defense,
                notes,
            };
            let record = store.add_match(observation)?;
            println!("Match data saved for Team {}.", record.team_number);
        }
        Commands::Import { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let added = store.import_matches(&raw)?;
            println!("Imported {added} new matches from {}.", file.display());
        }
        Commands::Export { out_dir } => {
            if store.is_empty() {
                tracing::warn!("exporting an empty match log");
            }
            let name = store::export_file_name(chrono::Utc::now());
            let path = out_dir.join(name);
            std::fs::write(&path, store.export_json()?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported {} matches to {}.", store.len(), path.display());
        }
        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!("refusing to delete all scouting data without --yes");
            }
            store.clear_all()?;
            println!("All scouting data deleted.");
        }
        Commands::Teams => {
            let index = store.team_index();
            if index.is_empty() {
                println!("No teams scouted yet.");
                return Ok(());
            }
            for team_stats in stats::event_statistics(&index) {
                println!(
                    "- Team {}: {} matches, {} pts, {} teleop fuel, climb {}, {}",
                    team_stats.team_number,
                    team_stats.match_count,
                    stats::fmt1(team_stats.avg_points),
                    stats::fmt1(team_stats.avg_teleop_fuel),
                    stats::fmt1(team_stats.avg_endgame_climb),
                    stats::primary_label(team_stats.primary_chassis.as_deref())
                );
            }
        }
        Commands::Team { team } => {
            print!(
                "{}",
                report::build_team_report(team, &store.records_for_team(team))
            );
        }
        Commands::Rankings => {
            print!("{}", report::build_event_report(&store.team_index()));
        }
        Commands::MyTeam => {
            let scout_team = store
                .scout_team()
                .context("not logged in: run `login --team <number>` first")?;
            let team: i64 = scout_team
                .parse()
                .with_context(|| format!("scout team {scout_team:?} is not a team number"))?;
            print!("{}", report::build_my_team_report(team, store.records()));
        }
        Commands::Report { out } => {
            let report = report::build_event_report(&store.team_index());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::StatsCsv { out } => {
            let team_stats = stats::event_statistics(&store.team_index());
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            report::write_stats_csv(file, &team_stats)?;
            println!("Statistics for {} teams written to {}.", team_stats.len(), out.display());
        }
    }

    Ok(())
}
