use std::path::PathBuf;

use anyhow::Context;

const DATA_DIR: &str = "frc-scouting";

/// Data directory: explicit flag / `SCOUTING_DATA_DIR`, then XDG data home,
/// then `~/.local/share`.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    default_data_dir().context(
        "no data directory: pass --data-dir or set SCOUTING_DATA_DIR, XDG_DATA_HOME or HOME",
    )
}

fn default_data_dir() -> Option<PathBuf> {
    if let Some(base) = non_empty_env("XDG_DATA_HOME") {
        return Some(PathBuf::from(base).join(DATA_DIR));
    }
    let home = non_empty_env("HOME")?;
    Some(PathBuf::from(home).join(".local").join("share").join(DATA_DIR))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
