use std::path::PathBuf;

use crate::aggregate::DEFAULT_HISTOGRAM_BINS;
use crate::filter::DEFAULT_TEAM_SELECTION;

pub const DEFAULT_DATA_FILE: &str = "player_injuries_impact.csv";
pub const DEFAULT_EXPORT_FILE: &str = "injury_dashboard.xlsx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_path: PathBuf,
    pub default_team_count: usize,
    pub histogram_bins: usize,
    pub export_path: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_FILE),
            default_team_count: DEFAULT_TEAM_SELECTION,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            export_path: PathBuf::from(DEFAULT_EXPORT_FILE),
            log_file: None,
        }
    }
}

impl Config {
    /// Reads `.env.local` and `.env` (if present) and then the process
    /// environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            data_path: non_empty("INJURY_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            default_team_count: non_empty("INJURY_DEFAULT_TEAMS")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(defaults.default_team_count),
            histogram_bins: non_empty("INJURY_HISTOGRAM_BINS")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(defaults.histogram_bins)
                .max(1),
            export_path: non_empty("INJURY_EXPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_path),
            log_file: non_empty("INJURY_LOG_FILE").map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = Config::from_lookup(|_| None);
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn overrides_and_bad_values() {
        let vars = HashMap::from([
            ("INJURY_DATA_PATH", "data/injuries.csv"),
            ("INJURY_DEFAULT_TEAMS", "five"),
            ("INJURY_HISTOGRAM_BINS", "0"),
            ("INJURY_LOG_FILE", "  "),
        ]);
        let cfg = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(cfg.data_path, PathBuf::from("data/injuries.csv"));
        assert_eq!(cfg.default_team_count, DEFAULT_TEAM_SELECTION);
        assert_eq!(cfg.histogram_bins, 1);
        assert_eq!(cfg.log_file, None);
    }
}
