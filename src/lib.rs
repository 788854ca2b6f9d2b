pub mod classify;
pub mod cli;
pub mod config;
pub mod data;
pub mod derive;
pub mod error;
pub mod frequency;
pub mod io_utils;
pub mod pipeline;
pub mod render;
pub mod source;
pub mod stats;
pub mod summary;
pub mod validation;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, RunArgs},
    config::{ConfigLayer, Mode, RunConfig},
    pipeline::Pipeline,
    render::{PngWriter, typography},
    source::{DuckDbSource, read_query},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("dq_charts", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Charts(args) => handle_charts(&args),
        Commands::Validate(args) => handle_validate(&args),
    }
}

fn handle_charts(args: &RunArgs) -> Result<()> {
    let config = resolve_config(Mode::Charts, args)?;
    let (pipeline, query) = prepare(&config)?;
    info!("Writing charts to {:?}", config.output_dir);
    let run = pipeline
        .chart_columns(&query, &config.output_dir)
        .context("Chart run failed")?;
    print!("{}", summary::chart_summary(&run.report));
    Ok(())
}

fn handle_validate(args: &RunArgs) -> Result<()> {
    let config = resolve_config(Mode::Validate, args)?;
    let (pipeline, query) = prepare(&config)?;
    let pipeline = match &config.snapshot_dir {
        Some(dir) => pipeline.with_snapshots(dir),
        None => pipeline,
    };
    info!("Writing validation charts to {:?}", config.output_dir);
    let run = pipeline
        .validate_metrics(&query, &config.output_dir)
        .context("Validation run failed")?;
    print!("{}", summary::validation_summary(&run.report));
    Ok(())
}

fn resolve_config(mode: Mode, args: &RunArgs) -> Result<RunConfig> {
    let file = match &args.config {
        Some(path) => Some(ConfigLayer::load(path)?),
        None => None,
    };
    let config = RunConfig::resolve(mode, args.layer(), file);
    debug!("Resolved run configuration: {config:?}");
    Ok(config)
}

fn prepare(config: &RunConfig) -> Result<(Pipeline<DuckDbSource, PngWriter>, String)> {
    typography::install(config.font.as_deref());
    let query =
        read_query(&config.sql).with_context(|| format!("Loading query from {:?}", config.sql))?;
    let source = match &config.database {
        Some(path) => DuckDbSource::open(path, config.engine, config.capabilities)
            .with_context(|| format!("Opening database {path:?}"))?,
        None => DuckDbSource::in_memory(config.engine, config.capabilities)
            .context("Opening in-memory database")?,
    };
    Ok((Pipeline::new(source, PngWriter), query))
}
