use std::collections::BTreeMap;

use crate::coerce::{to_count_or_zero, to_level_or_zero, to_rate_or_zero};
use crate::models::{
    EventOverview, EventRankings, MatchRecord, RankingEntry, Tally, TeamStatistics,
};

pub const RANKING_LIMIT: usize = 10;

const AUTO_FUEL_POINTS: f64 = 1.0;
const AUTO_CLIMB_POINTS: f64 = 3.0;
const TELEOP_FUEL_POINTS: f64 = 1.0;
const ENDGAME_CLIMB_POINTS: f64 = 5.0;

/// Approximate points one robot contributed in one match.
pub fn match_points(record: &MatchRecord) -> f64 {
    to_count_or_zero(record.auto_fuel_scored.as_ref()) * AUTO_FUEL_POINTS
        + to_level_or_zero(record.auto_tower_climb.as_ref()) * AUTO_CLIMB_POINTS
        + to_count_or_zero(record.teleop_fuel_scored.as_ref()) * TELEOP_FUEL_POINTS
        + to_level_or_zero(record.climb.as_ref()) * ENDGAME_CLIMB_POINTS
}

/// Reduce one team's records. `None` when the team has never been scouted.
pub fn team_statistics(records: &[&MatchRecord]) -> Option<TeamStatistics> {
    let first = records.first()?;

    let mut sums = [0.0f64; 9];
    let mut total_points = 0.0;
    let mut shooter_mechanisms = Tally::default();
    let mut hood_adjustable = Tally::default();
    let mut chassis_types = Tally::default();

    for record in records {
        sums[0] += to_count_or_zero(record.auto_fuel_scored.as_ref());
        sums[1] += to_rate_or_zero(record.auto_cycle_time.as_ref());
        sums[2] += to_count_or_zero(record.teleop_fuel_scored.as_ref());
        sums[3] += to_rate_or_zero(record.teleop_cycle_time.as_ref());
        sums[4] += to_rate_or_zero(record.teleop_fuel_rate.as_ref());
        sums[5] += to_count_or_zero(record.fuel_capacity.as_ref());
        sums[6] += to_level_or_zero(record.auto_tower_climb.as_ref());
        sums[7] += to_level_or_zero(record.climb.as_ref());
        sums[8] += to_level_or_zero(record.defense.as_ref());

        tally_label(&mut shooter_mechanisms, record.shooter_mechanism.as_deref());
        tally_label(&mut hood_adjustable, record.hood_adjustable.as_deref());
        tally_label(&mut chassis_types, record.chassis_type.as_deref());

        total_points += match_points(record);
    }

    let count = records.len() as f64;
    let [auto_fuel, auto_cycle, teleop_fuel, teleop_cycle, fuel_rate, capacity, auto_climb, climb, defense] =
        sums.map(|sum| sum / count);

    Some(TeamStatistics {
        team_number: first.team_number,
        match_count: records.len(),
        avg_auto_fuel: auto_fuel,
        avg_auto_cycle_time: auto_cycle,
        avg_teleop_fuel: teleop_fuel,
        avg_teleop_cycle_time: teleop_cycle,
        avg_teleop_fuel_rate: fuel_rate,
        avg_fuel_capacity: capacity,
        avg_auto_climb: auto_climb,
        avg_endgame_climb: climb,
        avg_defense: defense,
        total_points,
        avg_points: total_points / count,
        primary_shooter: shooter_mechanisms.mode().map(str::to_string),
        primary_hood_adjustable: hood_adjustable.mode().map(str::to_string),
        primary_chassis: chassis_types.mode().map(str::to_string),
        shooter_mechanisms,
        hood_adjustable,
        chassis_types,
    })
}

fn tally_label(tally: &mut Tally, label: Option<&str>) {
    if let Some(label) = label.filter(|l| !l.is_empty()) {
        tally.record(label);
    }
}

/// Display form for counts, times, climbs, defense and points.
pub fn fmt1(value: f64) -> String {
    to_fixed(value, 1)
}

/// Display form for the fuel rate.
pub fn fmt2(value: f64) -> String {
    to_fixed(value, 2)
}

// f64 has at most 1074 fractional decimal digits, so this expansion is exact.
const EXACT_DIGITS: usize = 1100;

/// Fixed-point text where exact halves round away from zero (2.25 -> "2.3").
/// Everything else rounds to nearest, which `format!` already does.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return format!("{value:.digits$}");
    }
    let exact = format!("{:.*}", EXACT_DIGITS, value.abs());
    let Some((int_part, frac)) = exact.split_once('.') else {
        return format!("{value:.digits$}");
    };
    let tail = &frac[digits..];
    let is_half = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');
    if !is_half {
        return format!("{value:.digits$}");
    }

    let mut kept: Vec<u8> = int_part.bytes().chain(frac[..digits].bytes()).collect();
    let mut carry = true;
    for b in kept.iter_mut().rev() {
        if *b == b'9' {
            *b = b'0';
        } else {
            *b += 1;
            carry = false;
            break;
        }
    }
    if carry {
        kept.insert(0, b'1');
    }

    let split = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    if value < 0.0 {
        out.push('-');
    }
    out.extend(kept[..split].iter().map(|&b| b as char));
    if digits > 0 {
        out.push('.');
        out.extend(kept[split..].iter().map(|&b| b as char));
    }
    out
}

pub fn primary_label(primary: Option<&str>) -> &str {
    primary.unwrap_or("N/A")
}

// Rankings compare what the user sees, so round through the display string.
fn displayed(value: f64) -> f64 {
    fmt1(value).parse().unwrap_or(0.0)
}

pub fn event_statistics(index: &BTreeMap<i64, Vec<&MatchRecord>>) -> Vec<TeamStatistics> {
    index
        .values()
        .filter_map(|records| team_statistics(records))
        .collect()
}

pub fn event_rankings(stats: &[TeamStatistics]) -> EventRankings {
    EventRankings {
        top_scorers: rank_by(stats, |s| s.avg_points),
        top_fuel: rank_by(stats, |s| s.avg_teleop_fuel),
        top_climbers: rank_by(stats, |s| s.avg_endgame_climb),
        top_defense: rank_by(stats, |s| s.avg_defense),
    }
}

fn rank_by(stats: &[TeamStatistics], metric: impl Fn(&TeamStatistics) -> f64) -> Vec<RankingEntry> {
    let mut values: Vec<RankingEntry> = stats
        .iter()
        .map(|s| RankingEntry {
            team_number: s.team_number,
            value: displayed(metric(s)),
        })
        .collect();
    values.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.team_number.cmp(&b.team_number))
    });
    values.truncate(RANKING_LIMIT);
    values
}

pub fn event_overview(index: &BTreeMap<i64, Vec<&MatchRecord>>) -> EventOverview {
    let team_count = index.len();
    let match_count: usize = index.values().map(Vec::len).sum();
    EventOverview {
        team_count,
        match_count,
        avg_matches_per_team: if team_count == 0 {
            0.0
        } else {
            match_count as f64 / team_count as f64
        },
    }
}
