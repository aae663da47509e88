//! Session settings assembled from an optional TOML file and CLI flags.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use battery_maze_core::{
    Position, PruningStrategy, BATTERY_CHOICES, DEFAULT_BATTERY, MAX_GRID_DIMENSION,
    MIN_GRID_DIMENSION,
};
use battery_maze_world::GRID_GENERATION_SEED;
use serde::Deserialize;
use tracing::warn;

/// Fully resolved settings for one run of the adapter.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) rows: u32,
    pub(crate) columns: u32,
    pub(crate) seed: u64,
    pub(crate) battery: u32,
    pub(crate) strategy: PruningStrategy,
    pub(crate) start: Option<Position>,
    pub(crate) goal: Option<Position>,
}

/// Values that may appear in the TOML file. Missing keys fall back to defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileSettings {
    pub(crate) rows: Option<u32>,
    pub(crate) columns: Option<u32>,
    pub(crate) seed: Option<u64>,
    pub(crate) battery: Option<u32>,
    pub(crate) strategy: Option<PruningStrategy>,
    pub(crate) start: Option<[u32; 2]>,
    pub(crate) goal: Option<[u32; 2]>,
}

impl FileSettings {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        Self::parse(&contents)
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse config toml contents")
    }

    /// Overlays `overrides` on top of the file values; set fields win.
    pub(crate) fn merged(self, overrides: FileSettings) -> Self {
        Self {
            rows: overrides.rows.or(self.rows),
            columns: overrides.columns.or(self.columns),
            seed: overrides.seed.or(self.seed),
            battery: overrides.battery.or(self.battery),
            strategy: overrides.strategy.or(self.strategy),
            start: overrides.start.or(self.start),
            goal: overrides.goal.or(self.goal),
        }
    }

    /// Fills defaults and validates the result.
    ///
    /// Endpoints stay unset when neither source names them; they are picked
    /// from the grid once it exists.
    pub(crate) fn resolve(self) -> Result<Settings> {
        let rows = self.rows.unwrap_or(MAX_GRID_DIMENSION);
        let columns = self.columns.unwrap_or(MAX_GRID_DIMENSION);
        for (name, value) in [("rows", rows), ("columns", columns)] {
            if !(MIN_GRID_DIMENSION..=MAX_GRID_DIMENSION).contains(&value) {
                bail!(
                    "{name} must lie within {MIN_GRID_DIMENSION}..={MAX_GRID_DIMENSION}, got {value}"
                );
            }
        }

        let battery = self.battery.unwrap_or(DEFAULT_BATTERY);
        if !BATTERY_CHOICES.contains(&battery) {
            warn!(battery, choices = ?BATTERY_CHOICES, "battery is not one of the offered choices");
        }

        Ok(Settings {
            rows,
            columns,
            seed: self.seed.unwrap_or(GRID_GENERATION_SEED),
            battery,
            strategy: self.strategy.unwrap_or_default(),
            start: self.start.map(to_position),
            goal: self.goal.map(to_position),
        })
    }
}

fn to_position([row, column]: [u32; 2]) -> Position {
    Position::new(row, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_resolves_to_defaults() {
        let settings = FileSettings::parse("")
            .expect("empty config parses")
            .resolve()
            .expect("defaults are valid");

        assert_eq!(settings.rows, MAX_GRID_DIMENSION);
        assert_eq!(settings.columns, MAX_GRID_DIMENSION);
        assert_eq!(settings.battery, DEFAULT_BATTERY);
        assert_eq!(settings.strategy, PruningStrategy::FrontierScan);
        assert_eq!(settings.seed, GRID_GENERATION_SEED);
        assert_eq!(settings.start, None);
        assert_eq!(settings.goal, None);
    }

    #[test]
    fn flags_override_file_values() {
        let file = FileSettings::parse(
            r#"
                rows = 4
                columns = 6
                battery = 30
                strategy = "best_score_map"
                goal = [1, 2]
            "#,
        )
        .expect("config parses");
        let flags = FileSettings {
            battery: Some(70),
            ..FileSettings::default()
        };

        let settings = file.merged(flags).resolve().expect("settings are valid");
        assert_eq!(settings.rows, 4);
        assert_eq!(settings.columns, 6);
        assert_eq!(settings.battery, 70);
        assert_eq!(settings.strategy, PruningStrategy::BestScoreMap);
        assert_eq!(settings.start, None);
        assert_eq!(settings.goal, Some(Position::new(1, 2)));
    }

    #[test]
    fn resolve_rejects_oversized_grids() {
        let file = FileSettings {
            rows: Some(11),
            ..FileSettings::default()
        };
        assert!(file.resolve().is_err());
    }

    #[test]
    fn parse_rejects_unknown_keys() {
        assert!(FileSettings::parse("tiles = 3").is_err());
    }
}
