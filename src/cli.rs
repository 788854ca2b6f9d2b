use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{config::ConfigLayer, source::Engine};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Render data-quality charts from a monitoring query",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Chart every column of the query result with dashboard metrics added
    Charts(RunArgs),
    /// Compare actual metrics against their assumption columns
    Validate(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// File holding the monitoring SQL (defaults to sql/monitoring.sql)
    #[arg(long)]
    pub sql: Option<PathBuf>,
    /// DuckDB database file to query (in-memory when omitted)
    #[arg(long)]
    pub database: Option<PathBuf>,
    /// How result rows are accumulated
    #[arg(long, value_enum)]
    pub engine: Option<Engine>,
    /// Directory receiving the chart images
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Directory receiving CSV snapshots of the fetched and derived tables
    #[arg(long = "snapshot-dir")]
    pub snapshot_dir: Option<PathBuf>,
    /// TrueType font used for chart text
    #[arg(long)]
    pub font: Option<PathBuf>,
    /// YAML run configuration; command-line values take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    pub fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            sql: self.sql.clone(),
            database: self.database.clone(),
            engine: self.engine,
            output_dir: self.output.clone(),
            snapshot_dir: self.snapshot_dir.clone(),
            font: self.font.clone(),
            columnar_engine: None,
        }
    }
}
