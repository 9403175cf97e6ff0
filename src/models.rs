use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alliance {
    Red,
    Blue,
}

impl std::str::FromStr for Alliance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Alliance::Red),
            "blue" => Ok(Alliance::Blue),
            other => Err(format!("unknown alliance {other:?}, expected Red or Blue")),
        }
    }
}

impl std::fmt::Display for Alliance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alliance::Red => write!(f, "Red"),
            Alliance::Blue => write!(f, "Blue"),
        }
    }
}

/// Match identifier as entered by the scout. `"12"` and `12` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchNumber {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for MatchNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchNumber::Number(n) => write!(f, "{n}"),
            MatchNumber::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A field value exactly as it was stored. Coercion to numbers happens at
/// aggregation time, see `coerce`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Int(n) => write!(f, "{n}"),
            RawValue::Float(x) => write!(f, "{x}"),
            RawValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One scout's notes on one team in one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub team_number: i64,
    pub match_number: MatchNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alliance: Option<Alliance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_fuel_scored: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_cycle_time: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_tower_climb: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chassis_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teleop_fuel_scored: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teleop_cycle_time: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teleop_fuel_rate: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_capacity: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shooter_mechanism: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hood_adjustable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climb: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defense: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scout_team: Option<String>,
    /// ISO-8601 text as written, e.g. `2026-03-14T15:09:26.000Z`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Keys written by other versions of the form, kept so exports stay lossless.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MatchRecord {
    pub fn from_observation(
        observation: Observation,
        scout_team: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let float = |value: Option<f64>| value.filter(|v| v.is_finite()).map(RawValue::Float);
        MatchRecord {
            team_number: observation.team_number,
            match_number: observation.match_number,
            alliance: Some(observation.alliance),
            position: Some(observation.position),
            auto_fuel_scored: observation.auto_fuel_scored.map(RawValue::Int),
            auto_cycle_time: float(observation.auto_cycle_time),
            auto_tower_climb: observation.auto_tower_climb.map(RawValue::Text),
            chassis_type: observation.chassis_type,
            teleop_fuel_scored: observation.teleop_fuel_scored.map(RawValue::Int),
            teleop_cycle_time: float(observation.teleop_cycle_time),
            teleop_fuel_rate: float(observation.teleop_fuel_rate),
            fuel_capacity: observation.fuel_capacity.map(RawValue::Int),
            shooter_mechanism: observation.shooter_mechanism,
            hood_adjustable: observation.hood_adjustable,
            climb: observation.climb.map(RawValue::Text),
            defense: observation.defense.map(RawValue::Text),
            notes: observation.notes,
            scout_team: Some(scout_team),
            timestamp: Some(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
            extra: serde_json::Map::new(),
        }
    }

    /// Identity used to drop duplicates when merging another scout's export.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            match_number: self.match_number.clone(),
            team_number: self.team_number,
            scout_team: self.scout_team.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub match_number: MatchNumber,
    pub team_number: i64,
    pub scout_team: Option<String>,
}

/// What the scouting form hands over; numbers are already parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub team_number: i64,
    pub match_number: MatchNumber,
    pub alliance: Alliance,
    pub position: String,
    pub auto_fuel_scored: Option<i64>,
    pub auto_cycle_time: Option<f64>,
    pub auto_tower_climb: Option<String>,
    pub chassis_type: Option<String>,
    pub teleop_fuel_scored: Option<i64>,
    pub teleop_cycle_time: Option<f64>,
    pub teleop_fuel_rate: Option<f64>,
    pub fuel_capacity: Option<i64>,
    pub shooter_mechanism: Option<String>,
    pub hood_adjustable: Option<String>,
    pub climb: Option<String>,
    pub defense: Option<String>,
    pub notes: Option<String>,
}

/// Insertion-ordered label counts for one categorical field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tally {
    entries: Vec<(String, usize)>,
}

impl Tally {
    pub fn record(&mut self, label: &str) {
        match self.entries.iter_mut().find(|(key, _)| key == label) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((label.to_string(), 1)),
        }
    }

    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    /// Most frequent label; on equal counts the earlier-enumerated label wins.
    pub fn mode(&self) -> Option<&str> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.entries {
            match best {
                Some(current) if entry.1 <= current.1 => {}
                _ => best = Some(entry),
            }
        }
        best.map(|(key, _)| key.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStatistics {
    pub team_number: i64,
    pub match_count: usize,
    pub avg_auto_fuel: f64,
    pub avg_auto_cycle_time: f64,
    pub avg_teleop_fuel: f64,
    pub avg_teleop_cycle_time: f64,
    pub avg_teleop_fuel_rate: f64,
    pub avg_fuel_capacity: f64,
    pub avg_auto_climb: f64,
    pub avg_endgame_climb: f64,
    pub avg_defense: f64,
    pub total_points: f64,
    pub avg_points: f64,
    pub shooter_mechanisms: Tally,
    pub hood_adjustable: Tally,
    pub chassis_types: Tally,
    pub primary_shooter: Option<String>,
    pub primary_hood_adjustable: Option<String>,
    pub primary_chassis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub team_number: i64,
    /// Display-rounded value the ranking was sorted on.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRankings {
    pub top_scorers: Vec<RankingEntry>,
    pub top_fuel: Vec<RankingEntry>,
    pub top_climbers: Vec<RankingEntry>,
    pub top_defense: Vec<RankingEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOverview {
    pub team_count: usize,
    pub match_count: usize,
    pub avg_matches_per_team: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_prefers_first_label_on_tie() {
        let mut tally = Tally::default();
        for label in ["Swerve", "Tank", "Swerve", "Tank"] {
            tally.record(label);
        }
        assert_eq!(tally.mode(), Some("Swerve"));
        assert_eq!(tally.entries()[1], ("Tank".to_string(), 2));
    }

    #[test]
    fn alliance_parses_case_insensitively() {
        assert_eq!("red".parse::<Alliance>(), Ok(Alliance::Red));
        assert_eq!(" Blue ".parse::<Alliance>(), Ok(Alliance::Blue));
        assert!("green".parse::<Alliance>().is_err());
    }

    #[test]
    fn mode_picks_strict_majority() {
        let mut tally = Tally::default();
        for label in ["Turret", "Fixed", "Fixed"] {
            tally.record(label);
        }
        assert_eq!(tally.mode(), Some("Fixed"));
        assert_eq!(Tally::default().mode(), None);
    }

    #[test]
    fn record_keeps_mixed_raw_values() {
        let raw = r#"{
            "teamNumber": 254,
            "matchNumber": "Q12",
            "alliance": "Blue",
            "autoFuelScored": 3,
            "autoCycleTime": 4.5,
            "climb": "2",
            "teleopFuelRate": null,
            "scoutTeam": "1678",
            "fieldNote": "kept"
        }"#;
        let record: MatchRecord = serde_json::from_str(raw).expect("record should parse");
        assert_eq!(record.match_number, MatchNumber::Text("Q12".to_string()));
        assert_eq!(record.auto_fuel_scored, Some(RawValue::Int(3)));
        assert_eq!(record.auto_cycle_time, Some(RawValue::Float(4.5)));
        assert_eq!(record.climb, Some(RawValue::Text("2".to_string())));
        assert_eq!(record.teleop_fuel_rate, None);
        assert_eq!(record.extra.get("fieldNote"), Some(&serde_json::json!("kept")));

        let json = serde_json::to_string(&record).expect("record should serialize");
        let back: MatchRecord = serde_json::from_str(&json).expect("record should reparse");
        assert_eq!(back, record);
    }

    #[test]
    fn numeric_and_text_match_numbers_are_distinct_keys() {
        let a: MatchRecord =
            serde_json::from_str(r#"{"teamNumber":1,"matchNumber":"12"}"#).unwrap();
        let b: MatchRecord =
            serde_json::from_str(r#"{"teamNumber":1,"matchNumber":12}"#).unwrap();
        assert_ne!(a.dedup_key(), b.dedup_key());
    }
}
