//! `strata`: generate a terrain with biomes, vegetation and scattered objects.
//!
//! Configuration is loaded from `strata.ron` and can be overridden via CLI
//! flags. Run with `cargo run -p strata-cli -- --seed 42` for a batch run, or
//! add `--artist` to step through the phases interactively.

mod artist;
mod error;
mod output;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use strata_config::{CliArgs, Config, default_config_dir};
use strata_worldgen::{GenerationPipeline, PhaseState, PipelineEvent, TerrainData};
use tracing::{error, info};

use crate::artist::Outcome;
use crate::error::CliError;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let Some(config_dir) = args.config.clone().or_else(default_config_dir) else {
        eprintln!("Failed to resolve config directory; pass --config <dir>");
        return ExitCode::FAILURE;
    };

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    strata_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(&config, args.artist) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(%e, "Generation aborted");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, artist_mode: bool) -> Result<(), CliError> {
    config.validate()?;

    let mut pipeline = GenerationPipeline::new();
    pipeline.on_event(|event| {
        if let PipelineEvent::PhaseSkipped { name, reason, .. } = event {
            println!("{name}: skipped ({reason})");
        }
    });
    let terrain = TerrainData::new(config.terrain.layout());
    pipeline.begin(config.generation.clone(), terrain, artist_mode)?;
    let seed = pipeline.context().map(|ctx| ctx.seed()).unwrap_or_default();
    println!("seed {seed}");

    if artist_mode {
        let overlays = config.output.directory.join("overlays");
        let outcome = artist::run_session(
            &mut pipeline,
            Some(&overlays),
            io::stdin().lock(),
            io::stdout().lock(),
        )?;
        if outcome == Outcome::Quit {
            info!("Artist session ended before completion; nothing written");
            return Ok(());
        }
    } else {
        pipeline.execute_all()?;
    }

    if let Some(failed) = pipeline.phases().iter().find(|p| p.state() == PhaseState::Failed) {
        return Err(CliError::PhaseFailed {
            phase: failed.name(),
            error: failed.last_error().unwrap_or_default().to_owned(),
        });
    }

    let (Some(ctx), Some(terrain)) = (pipeline.context(), pipeline.target()) else {
        return Err(strata_worldgen::GenerationError::NotRunning.into());
    };
    let written = output::write_outputs(&config.output, ctx, terrain)?;
    let records: usize = ctx.spawn_groups().iter().map(|g| g.records.len()).sum();
    info!(
        files = written.len(),
        records,
        dir = %config.output.directory.display(),
        "Outputs written"
    );
    for path in &written {
        println!("wrote {}", path.display());
    }
    Ok(())
}
