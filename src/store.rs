use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::blob::BlobStore;
use crate::models::{MatchRecord, Observation};

pub const MATCHES_SLOT: &str = "frc-scouting-data-2026";
pub const SCOUT_TEAM_SLOT: &str = "frc-scout-team";
pub const UNKNOWN_SCOUT: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid data format: {0}")]
    Format(String),
    #[error("error parsing JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to serialize match records: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("blob store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Append-only log of match observations mirrored into a blob slot.
pub struct MatchStore<B: BlobStore> {
    blobs: B,
    matches: Vec<MatchRecord>,
}

impl<B: BlobStore> MatchStore<B> {
    pub fn open(blobs: B) -> Self {
        let matches = load(&blobs);
        info!(count = matches.len(), "loaded match records");
        Self { blobs, matches }
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn save(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.matches).map_err(StoreError::Serialize)?;
        self.blobs.set(MATCHES_SLOT, &json)?;
        debug!(count = self.matches.len(), "persisted match records");
        Ok(())
    }

    pub fn add_match(&mut self, observation: Observation) -> Result<&MatchRecord, StoreError> {
        self.add_match_at(observation, Utc::now())
    }

    pub fn add_match_at(
        &mut self,
        observation: Observation,
        timestamp: DateTime<Utc>,
    ) -> Result<&MatchRecord, StoreError> {
        let scout_team = self
            .scout_team()
            .unwrap_or_else(|| UNKNOWN_SCOUT.to_string());
        let record = MatchRecord::from_observation(observation, scout_team, timestamp);
        info!(
            team = record.team_number,
            match_number = %record.match_number,
            "recorded match observation"
        );
        self.matches.push(record);
        self.save()?;
        Ok(&self.matches[self.matches.len() - 1])
    }

    /// Merge another export. Returns how many records were new.
    pub fn import_matches(&mut self, raw: &str) -> Result<usize, StoreError> {
        let value: serde_json::Value = serde_json::from_str(raw).map_err(StoreError::Parse)?;
        if !value.is_array() {
            return Err(StoreError::Format(
                "expected an array of matches".to_string(),
            ));
        }
        let candidates: Vec<MatchRecord> = serde_json::from_value(value)
            .map_err(|err| StoreError::Format(format!("not a match record: {err}")))?;

        let mut seen: HashSet<_> = self.matches.iter().map(MatchRecord::dedup_key).collect();
        let mut added = 0usize;
        let offered = candidates.len();

        for candidate in candidates {
            if seen.insert(candidate.dedup_key()) {
                self.matches.push(candidate);
                added += 1;
            }
        }

        self.save()?;
        info!(offered, added, "imported match records");
        Ok(added)
    }

    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        let removed = self.matches.len();
        self.matches.clear();
        self.save()?;
        warn!(removed, "cleared all match records");
        Ok(())
    }

    pub fn records_for_team(&self, team_number: i64) -> Vec<&MatchRecord> {
        self.matches
            .iter()
            .filter(|m| m.team_number == team_number)
            .collect()
    }

    pub fn team_index(&self) -> BTreeMap<i64, Vec<&MatchRecord>> {
        let mut teams: BTreeMap<i64, Vec<&MatchRecord>> = BTreeMap::new();
        for record in &self.matches {
            teams.entry(record.team_number).or_default().push(record);
        }
        teams
    }

    pub fn export_json(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(&self.matches).map_err(StoreError::Serialize)
    }

    /// Scout-team identity written at login, if any.
    pub fn scout_team(&self) -> Option<String> {
        match self.blobs.get(SCOUT_TEAM_SLOT) {
            Ok(value) => value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            Err(err) => {
                warn!(error = %err, "could not read scout team");
                None
            }
        }
    }

    pub fn set_scout_team(&mut self, scout_team: &str) -> Result<(), StoreError> {
        self.blobs.set(SCOUT_TEAM_SLOT, scout_team.trim())?;
        info!(scout_team = scout_team.trim(), "logged in");
        Ok(())
    }
}

/// Export file name for the UTC calendar day of `now`.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("frc_scouting_data_{}.json", now.date_naive().format("%Y-%m-%d"))
}

fn load<B: BlobStore>(blobs: &B) -> Vec<MatchRecord> {
    let raw = match blobs.get(MATCHES_SLOT) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(error = %err, "could not read stored matches, starting empty");
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<MatchRecord>>(&raw) {
        Ok(matches) => matches,
        Err(err) => {
            warn!(error = %err, "stored matches are corrupt, starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{FileBlobStore, MemoryBlobStore};
    use crate::models::{Alliance, MatchNumber};
    use chrono::TimeZone;

    fn observation(team_number: i64, match_number: i64) -> Observation {
        Observation {
            team_number,
            match_number: MatchNumber::Number(match_number),
            alliance: Alliance::Red,
            position: "1".to_string(),
            auto_fuel_scored: Some(2),
            auto_cycle_time: Some(3.5),
            auto_tower_climb: Some("1".to_string()),
            chassis_type: Some("Swerve".to_string()),
            teleop_fuel_scored: Some(8),
            teleop_cycle_time: Some(f64::NAN),
            teleop_fuel_rate: Some(1.25),
            fuel_capacity: Some(5),
            shooter_mechanism: Some("Turret".to_string()),
            hood_adjustable: Some("Yes".to_string()),
            climb: Some("2".to_string()),
            defense: Some("3".to_string()),
            notes: Some("fast cycles".to_string()),
        }
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap()
    }

    fn logged_in_store(scout: &str) -> MatchStore<MemoryBlobStore> {
        let mut store = MatchStore::open(MemoryBlobStore::default());
        store.set_scout_team(scout).unwrap();
        store
    }

    #[test]
    fn add_match_attaches_scout_and_timestamp() {
        let mut store = logged_in_store("1678");
        let record = store.add_match_at(observation(254, 1), stamp()).unwrap();
        assert_eq!(record.scout_team.as_deref(), Some("1678"));
        assert_eq!(record.timestamp.as_deref(), Some("2026-03-14T15:09:26.000Z"));
        assert_eq!(record.teleop_cycle_time, None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_scout_when_never_logged_in() {
        let mut store = MatchStore::open(MemoryBlobStore::default());
        let record = store.add_match(observation(254, 1)).unwrap();
        assert_eq!(record.scout_team.as_deref(), Some(UNKNOWN_SCOUT));
    }

    #[test]
    fn records_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = MatchStore::open(FileBlobStore::new(dir.path()));
            store.set_scout_team("1678").unwrap();
            store.add_match_at(observation(254, 1), stamp()).unwrap();
            store.add_match_at(observation(971, 1), stamp()).unwrap();
        }
        let store = MatchStore::open(FileBlobStore::new(dir.path()));
        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[1].team_number, 971);
        assert_eq!(store.scout_team().as_deref(), Some("1678"));
    }

    #[test]
    fn corrupt_blob_loads_empty() {
        let mut blobs = MemoryBlobStore::default();
        blobs.set(MATCHES_SLOT, "{not json").unwrap();
        assert!(MatchStore::open(blobs).is_empty());

        let mut blobs = MemoryBlobStore::default();
        blobs.set(MATCHES_SLOT, r#"{"teamNumber": 1}"#).unwrap();
        assert!(MatchStore::open(blobs).is_empty());
    }

    #[test]
    fn import_skips_existing_keys() {
        let mut store = logged_in_store("1678");
        store.add_match_at(observation(254, 1), stamp()).unwrap();

        let raw = r#"[
            {"teamNumber": 254, "matchNumber": 1, "scoutTeam": "1678", "notes": "other copy"},
            {"teamNumber": 254, "matchNumber": 2, "scoutTeam": "1678"}
        ]"#;
        let added = store.import_matches(raw).unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].notes.as_deref(), Some("fast cycles"));
    }

    #[test]
    fn import_dedups_within_the_batch() {
        let mut store = MatchStore::open(MemoryBlobStore::default());
        let raw = r#"[
            {"teamNumber": 118, "matchNumber": "3", "scoutTeam": "33"},
            {"teamNumber": 118, "matchNumber": "3", "scoutTeam": "33"},
            {"teamNumber": 118, "matchNumber": "3", "scoutTeam": "254"}
        ]"#;
        assert_eq!(store.import_matches(raw).unwrap(), 2);
    }

    #[test]
    fn import_rejects_non_arrays_without_mutating() {
        let mut store = logged_in_store("1678");
        store.add_match_at(observation(254, 1), stamp()).unwrap();

        let err = store
            .import_matches(r#"{"teamNumber": 254, "matchNumber": 9}"#)
            .unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));

        let err = store.import_matches("[1, 2]").unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));

        let err = store.import_matches("not json at all").unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn export_then_import_reproduces_records() {
        let mut source = logged_in_store("1678");
        source.add_match_at(observation(254, 1), stamp()).unwrap();
        source.add_match_at(observation(971, 2), stamp()).unwrap();
        source.add_match_at(observation(254, 3), stamp()).unwrap();
        let exported = source.export_json().unwrap();

        let mut target = MatchStore::open(MemoryBlobStore::default());
        assert_eq!(target.import_matches(&exported).unwrap(), 3);
        assert_eq!(target.records(), source.records());
    }

    #[test]
    fn imported_timestamps_are_exported_verbatim() {
        let mut store = MatchStore::open(MemoryBlobStore::default());
        let raw = r#"[
            {"teamNumber": 254, "matchNumber": "4", "scoutTeam": "33", "timestamp": "2026-03-14T00:00:00.000Z"},
            {"teamNumber": 254, "matchNumber": "5", "scoutTeam": "33", "timestamp": "2026-03-14T00:05:00Z"}
        ]"#;
        store.import_matches(raw).unwrap();

        let exported = store.export_json().unwrap();
        assert!(exported.contains(r#""timestamp": "2026-03-14T00:00:00.000Z""#));
        assert!(exported.contains(r#""timestamp": "2026-03-14T00:05:00Z""#));
    }

    #[test]
    fn clear_all_persists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MatchStore::open(FileBlobStore::new(dir.path()));
        store.add_match_at(observation(1, 1), stamp()).unwrap();
        store.clear_all().unwrap();
        assert!(store.is_empty());
        assert!(MatchStore::open(FileBlobStore::new(dir.path())).is_empty());
    }

    #[test]
    fn team_views_keep_insertion_order() {
        let mut store = logged_in_store("1678");
        for (team, m) in [(254, 1), (118, 1), (254, 2), (118, 2), (254, 3)] {
            store.add_match_at(observation(team, m), stamp()).unwrap();
        }

        let matches: Vec<String> = store
            .records_for_team(254)
            .iter()
            .map(|r| r.match_number.to_string())
            .collect();
        assert_eq!(matches, vec!["1", "2", "3"]);
        assert!(store.records_for_team(33).is_empty());

        let index = store.team_index();
        assert_eq!(index.keys().copied().collect::<Vec<_>>(), vec![118, 254]);
        assert_eq!(index[&118].len(), 2);
    }

    #[test]
    fn export_name_embeds_date() {
        assert_eq!(export_file_name(stamp()), "frc_scouting_data_2026-03-14.json");
    }

    #[test]
    fn export_name_uses_the_utc_day() {
        let evening_west = chrono::DateTime::parse_from_rfc3339("2026-03-14T20:30:00-05:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(export_file_name(evening_west), "frc_scouting_data_2026-03-15.json");
    }
}
