//! Interactive artist mode: step through phases from stdin, inspecting and
//! rolling back between them.

use std::fmt::Display;
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use strata_worldgen::{GenerationError, GenerationPipeline, PhaseState, TerrainData};
use tracing::warn;

use crate::error::CliError;
use crate::output::write_overlay;

const HELP: &str = "commands: continue | rollback <phase> | reset | status | help | quit";

/// One line of artist input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Continue,
    Rollback(usize),
    Reset,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = match words.next().unwrap_or_default() {
            "continue" | "c" | "next" => Self::Continue,
            "rollback" | "r" => {
                let index = words
                    .next()
                    .ok_or_else(|| "rollback needs a phase index".to_string())?;
                let index = index
                    .parse()
                    .map_err(|_| format!("`{index}` is not a phase index"))?;
                Self::Rollback(index)
            }
            "reset" => Self::Reset,
            "status" | "s" => Self::Status,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => return Err(format!("unknown command `{other}`; {HELP}")),
        };
        match words.next() {
            Some(extra) => Err(format!("unexpected argument `{extra}`")),
            None => Ok(command),
        }
    }
}

/// How an artist session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every phase ran; outputs can be written.
    Completed,
    /// The artist quit or input ended first.
    Quit,
}

/// Drive `pipeline` from `input` until every phase has run or the artist
/// quits. The pipeline must already have begun. Overlays are saved into
/// `overlay_dir` after each phase when given.
pub fn run_session<R: BufRead, W: Write>(
    pipeline: &mut GenerationPipeline<TerrainData>,
    overlay_dir: Option<&Path>,
    input: R,
    mut out: W,
) -> Result<Outcome, CliError> {
    // Resolved config, so a reset replays the same seed.
    let restart = pipeline
        .context()
        .map(|ctx| ctx.config().clone())
        .ok_or(GenerationError::NotRunning)?;

    say(&mut out, HELP)?;
    print_status(pipeline, &mut out)?;
    for line in input.lines() {
        let line = line.map_err(CliError::Console)?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                say(&mut out, message)?;
                continue;
            }
        };

        match command {
            Command::Continue => {
                if !pipeline.is_running() {
                    say(&mut out, "nothing to run; rollback or reset first")?;
                    continue;
                }
                let index = pipeline.next_phase();
                let state = pipeline.resume()?;
                let phase = &pipeline.phases()[index];
                match state {
                    PhaseState::Failed => say(
                        &mut out,
                        format!(
                            "{} failed: {}",
                            phase.name(),
                            phase.last_error().unwrap_or_default()
                        ),
                    )?,
                    PhaseState::Skipped => say(
                        &mut out,
                        format!(
                            "{} skipped: {}",
                            phase.name(),
                            phase
                                .skip_reason()
                                .map(ToString::to_string)
                                .unwrap_or_default()
                        ),
                    )?,
                    _ => say(&mut out, format!("{} {state:?}", phase.name()))?,
                }
                if let Some(dir) = overlay_dir
                    && let Some(overlay) = pipeline.debug_overlay()
                {
                    let path = write_overlay(dir, index, overlay)?;
                    say(&mut out, format!("overlay saved to {}", path.display()))?;
                }
                if !pipeline.is_running() && state != PhaseState::Failed {
                    return Ok(Outcome::Completed);
                }
            }
            Command::Rollback(index) => match pipeline.rollback_to(index) {
                Ok(()) => say(&mut out, format!("rolled back; next phase is {index}"))?,
                Err(e) => {
                    warn!(index, %e, "Rollback rejected");
                    say(&mut out, format!("rollback failed: {e}"))?;
                }
            },
            Command::Reset => {
                pipeline.reset();
                let target = pipeline.finish().ok_or(GenerationError::NotRunning)?;
                pipeline.begin(restart.clone(), target, true)?;
                say(&mut out, "terrain restored; starting over")?;
            }
            Command::Status => print_status(pipeline, &mut out)?,
            Command::Help => say(&mut out, HELP)?,
            Command::Quit => return Ok(Outcome::Quit),
        }
    }
    Ok(Outcome::Quit)
}

fn print_status<W: Write>(
    pipeline: &GenerationPipeline<TerrainData>,
    out: &mut W,
) -> Result<(), CliError> {
    for (i, phase) in pipeline.phases().iter().enumerate() {
        let marker = if pipeline.is_running() && i == pipeline.next_phase() {
            '>'
        } else {
            ' '
        };
        say(
            out,
            format!("{marker} {i} {:<16} {:?}", phase.name(), phase.state()),
        )?;
    }
    Ok(())
}

fn say<W: Write>(out: &mut W, message: impl Display) -> Result<(), CliError> {
    writeln!(out, "{message}").map_err(CliError::Console)
}
