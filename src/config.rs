//! Run configuration layered from defaults, an optional YAML file and the
//! command line, in increasing precedence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::source::{Capabilities, Engine};

pub const DEFAULT_SQL: &str = "sql/monitoring.sql";
pub const CHARTS_OUTPUT_DIR: &str = "./dq_charts";
pub const VALIDATION_OUTPUT_DIR: &str = "./dq_charts_final";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Charts,
    Validate,
}

impl Mode {
    pub fn default_output_dir(self) -> &'static str {
        match self {
            Mode::Charts => CHARTS_OUTPUT_DIR,
            Mode::Validate => VALIDATION_OUTPUT_DIR,
        }
    }
}

/// One configuration layer. Unset keys defer to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<Engine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columnar_engine: Option<bool>,
}

impl ConfigLayer {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Reading run configuration {path:?}"))?;
        Self::from_yaml(&text).with_context(|| format!("Parsing run configuration {path:?}"))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Keys set in `self` win over keys set in `lower`.
    pub fn over(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            sql: self.sql.or(lower.sql),
            database: self.database.or(lower.database),
            engine: self.engine.or(lower.engine),
            output_dir: self.output_dir.or(lower.output_dir),
            snapshot_dir: self.snapshot_dir.or(lower.snapshot_dir),
            font: self.font.or(lower.font),
            columnar_engine: self.columnar_engine.or(lower.columnar_engine),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub sql: PathBuf,
    /// `None` runs against an in-memory database.
    pub database: Option<PathBuf>,
    pub engine: Engine,
    pub capabilities: Capabilities,
    pub output_dir: PathBuf,
    pub snapshot_dir: Option<PathBuf>,
    pub font: Option<PathBuf>,
}

impl RunConfig {
    pub fn resolve(mode: Mode, cli: ConfigLayer, file: Option<ConfigLayer>) -> Self {
        let merged = match file {
            Some(file) => cli.over(file),
            None => cli,
        };
        Self {
            sql: merged.sql.unwrap_or_else(|| PathBuf::from(DEFAULT_SQL)),
            database: merged.database,
            engine: merged.engine.unwrap_or_default(),
            capabilities: Capabilities {
                columnar_engine: merged
                    .columnar_engine
                    .unwrap_or(Capabilities::default().columnar_engine),
            },
            output_dir: merged
                .output_dir
                .unwrap_or_else(|| PathBuf::from(mode.default_output_dir())),
            snapshot_dir: merged.snapshot_dir,
            font: merged.font,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_depend_on_mode() {
        let charts = RunConfig::resolve(Mode::Charts, ConfigLayer::default(), None);
        assert_eq!(charts.sql, PathBuf::from(DEFAULT_SQL));
        assert_eq!(charts.output_dir, PathBuf::from(CHARTS_OUTPUT_DIR));
        assert_eq!(charts.engine, Engine::Columnar);
        assert!(charts.capabilities.columnar_engine);
        assert_eq!(charts.database, None);
        assert_eq!(charts.snapshot_dir, None);

        let validate = RunConfig::resolve(Mode::Validate, ConfigLayer::default(), None);
        assert_eq!(validate.output_dir, PathBuf::from(VALIDATION_OUTPUT_DIR));
    }

    #[test]
    fn command_line_overrides_file() {
        let file = ConfigLayer::from_yaml(
            "sql: queries/file.sql\nengine: rows\noutput_dir: from_file\ncolumnar_engine: false\n",
        )
        .expect("parse yaml");
        let cli = ConfigLayer {
            output_dir: Some(PathBuf::from("from_cli")),
            ..ConfigLayer::default()
        };
        let config = RunConfig::resolve(Mode::Charts, cli, Some(file));
        assert_eq!(config.output_dir, PathBuf::from("from_cli"));
        assert_eq!(config.sql, PathBuf::from("queries/file.sql"));
        assert_eq!(config.engine, Engine::Rows);
        assert!(!config.capabilities.columnar_engine);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConfigLayer::from_yaml("output: charts\n").is_err());
    }

    #[test]
    fn load_reads_yaml_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("run.yml");
        fs::write(&path, "snapshot_dir: snapshots\n").expect("write config");
        let layer = ConfigLayer::load(&path).expect("load config");
        assert_eq!(layer.snapshot_dir, Some(PathBuf::from("snapshots")));
        assert!(ConfigLayer::load(&dir.path().join("missing.yml")).is_err());
    }
}
