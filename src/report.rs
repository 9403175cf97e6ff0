use std::collections::BTreeMap;
use std::fmt::Write;
use std::io;

use crate::models::{MatchRecord, RankingEntry, Tally, TeamStatistics};
use crate::stats::{self, fmt1, fmt2, primary_label};

fn raw_or_dash(value: Option<&impl std::fmt::Display>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn tally_line(primary: Option<&str>, tally: &Tally) -> String {
    if tally.entries().len() < 2 {
        return primary_label(primary).to_string();
    }
    let counts: Vec<String> = tally
        .entries()
        .iter()
        .map(|(label, count)| format!("{label} x{count}"))
        .collect();
    format!("{} ({})", primary_label(primary), counts.join(", "))
}

fn match_line(record: &MatchRecord) -> String {
    let alliance = record
        .alliance
        .map(|a| a.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        "- Match {} | Team {} ({} - {}) | Auto: {} fuel, climb {} | Teleop: {} fuel | Endgame: climb {} | Defense: {}/5",
        record.match_number,
        record.team_number,
        alliance,
        record.position.as_deref().unwrap_or("?"),
        raw_or_dash(record.auto_fuel_scored.as_ref()),
        raw_or_dash(record.auto_tower_climb.as_ref()),
        raw_or_dash(record.teleop_fuel_scored.as_ref()),
        raw_or_dash(record.climb.as_ref()),
        raw_or_dash(record.defense.as_ref()),
    )
}

pub fn build_team_report(team_number: i64, records: &[&MatchRecord]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Team {team_number}");

    let Some(stats) = stats::team_statistics(records) else {
        let _ = writeln!(output, "No matches scouted for this team.");
        return output;
    };

    let _ = writeln!(output);
    let _ = writeln!(output, "## Averages ({} matches)", stats.match_count);
    let _ = writeln!(output, "- Auto fuel: {}", fmt1(stats.avg_auto_fuel));
    let _ = writeln!(output, "- Auto cycle time: {}s", fmt1(stats.avg_auto_cycle_time));
    let _ = writeln!(output, "- Auto climb: {}", fmt1(stats.avg_auto_climb));
    let _ = writeln!(output, "- Teleop fuel: {}", fmt1(stats.avg_teleop_fuel));
    let _ = writeln!(output, "- Teleop cycle time: {}s", fmt1(stats.avg_teleop_cycle_time));
    let _ = writeln!(output, "- Teleop fuel rate: {}/s", fmt2(stats.avg_teleop_fuel_rate));
    let _ = writeln!(output, "- Fuel capacity: {}", fmt1(stats.avg_fuel_capacity));
    let _ = writeln!(output, "- Endgame climb: {}", fmt1(stats.avg_endgame_climb));
    let _ = writeln!(output, "- Defense: {}/5", fmt1(stats.avg_defense));
    let _ = writeln!(output, "- Points: {}", fmt1(stats.avg_points));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Robot");
    let _ = writeln!(
        output,
        "- Shooter: {}",
        tally_line(stats.primary_shooter.as_deref(), &stats.shooter_mechanisms)
    );
    let _ = writeln!(
        output,
        "- Adjustable hood: {}",
        tally_line(stats.primary_hood_adjustable.as_deref(), &stats.hood_adjustable)
    );
    let _ = writeln!(
        output,
        "- Chassis: {}",
        tally_line(stats.primary_chassis.as_deref(), &stats.chassis_types)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Match History");
    for record in records {
        let _ = writeln!(output, "{}", match_line(record));
        if let Some(notes) = record.notes.as_deref().filter(|n| !n.is_empty()) {
            let _ = writeln!(output, "  - Notes: {notes}");
        }
    }

    output
}

fn ranking_section(output: &mut String, title: &str, entries: &[RankingEntry], suffix: &str) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");
    for (index, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. Team {}: {}{}",
            index + 1,
            entry.team_number,
            fmt1(entry.value),
            suffix
        );
    }
}

pub fn build_event_report(index: &BTreeMap<i64, Vec<&MatchRecord>>) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Event Statistics");

    if index.is_empty() {
        let _ = writeln!(output, "Scout some matches to see event statistics.");
        return output;
    }

    let team_stats = stats::event_statistics(index);
    let rankings = stats::event_rankings(&team_stats);
    let overview = stats::event_overview(index);

    ranking_section(&mut output, "Top Scorers", &rankings.top_scorers, " pts");
    ranking_section(&mut output, "Best Fuel Scorers", &rankings.top_fuel, " fuel");
    ranking_section(&mut output, "Best Climbers", &rankings.top_climbers, "");
    ranking_section(&mut output, "Best Defense", &rankings.top_defense, "/5");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall Stats");
    let _ = writeln!(output, "- Teams scouted: {}", overview.team_count);
    let _ = writeln!(output, "- Total matches: {}", overview.match_count);
    let _ = writeln!(
        output,
        "- Avg matches/team: {}",
        fmt1(overview.avg_matches_per_team)
    );

    output
}

/// Scouting contributions plus the logged-in team's own numbers.
pub fn build_my_team_report(team_number: i64, all_records: &[MatchRecord]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Scouting Contributions");
    let _ = writeln!(output, "- Total matches scouted: {}", all_records.len());

    let _ = writeln!(output);
    let _ = writeln!(output, "## Scouting History");
    if all_records.is_empty() {
        let _ = writeln!(output, "Nothing scouted yet.");
    }
    for record in all_records.iter().rev() {
        let _ = writeln!(output, "{}", match_line(record));
    }

    let own: Vec<&MatchRecord> = all_records
        .iter()
        .filter(|r| r.team_number == team_number)
        .collect();

    let _ = writeln!(output);
    match stats::team_statistics(&own) {
        None => {
            let _ = writeln!(output, "## No Performance Data for Team {team_number}");
            let _ = writeln!(output, "No matches have been scouted for your team yet.");
        }
        Some(stats) => {
            let _ = writeln!(output, "## Your Team: {team_number} Performance");
            let _ = writeln!(output, "- Matches played: {}", stats.match_count);
            let _ = writeln!(output, "- Avg points: {}", fmt1(stats.avg_points));
            let _ = writeln!(output, "- Avg teleop fuel: {}", fmt1(stats.avg_teleop_fuel));
            let _ = writeln!(output, "- Endgame climb: {}", fmt1(stats.avg_endgame_climb));
            let _ = writeln!(
                output,
                "- Chassis: {}",
                primary_label(stats.primary_chassis.as_deref())
            );
        }
    }

    output
}

#[derive(serde::Serialize)]
struct StatsRow<'a> {
    team_number: i64,
    match_count: usize,
    avg_points: String,
    avg_auto_fuel: String,
    avg_auto_cycle_time: String,
    avg_auto_climb: String,
    avg_teleop_fuel: String,
    avg_teleop_cycle_time: String,
    avg_teleop_fuel_rate: String,
    avg_fuel_capacity: String,
    avg_endgame_climb: String,
    avg_defense: String,
    primary_shooter: &'a str,
    primary_hood_adjustable: &'a str,
    primary_chassis: &'a str,
}

/// One CSV row per team, values at display precision.
pub fn write_stats_csv<W: io::Write>(writer: W, team_stats: &[TeamStatistics]) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for stats in team_stats {
        csv_writer.serialize(StatsRow {
            team_number: stats.team_number,
            match_count: stats.match_count,
            avg_points: fmt1(stats.avg_points),
            avg_auto_fuel: fmt1(stats.avg_auto_fuel),
            avg_auto_cycle_time: fmt1(stats.avg_auto_cycle_time),
            avg_auto_climb: fmt1(stats.avg_auto_climb),
            avg_teleop_fuel: fmt1(stats.avg_teleop_fuel),
            avg_teleop_cycle_time: fmt1(stats.avg_teleop_cycle_time),
            avg_teleop_fuel_rate: fmt2(stats.avg_teleop_fuel_rate),
            avg_fuel_capacity: fmt1(stats.avg_fuel_capacity),
            avg_endgame_climb: fmt1(stats.avg_endgame_climb),
            avg_defense: fmt1(stats.avg_defense),
            primary_shooter: primary_label(stats.primary_shooter.as_deref()),
            primary_hood_adjustable: primary_label(stats.primary_hood_adjustable.as_deref()),
            primary_chassis: primary_label(stats.primary_chassis.as_deref()),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}
