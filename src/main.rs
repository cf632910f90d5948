//! Intcode command-line runner.
//!
//! # Usage
//! ```text
//! intcode [OPTIONS] run <file> [-i <value>]... [--patch ADDR=VALUE]... [--dump]
//! intcode [OPTIONS] amplify <file> [--mode linear|feedback] [--amplifiers N] [--phases LO..=HI] [--concurrent]
//! intcode [OPTIONS] noun-verb <file> --target T [--max 99]
//! ```
//!
//! # Options
//! - `--log-level <level>`: trace, debug, info, warn or error (env `INTCODE_LOG`)
//! - `--step-limit <N>`: fail any machine after N instructions (env `INTCODE_STEP_LIMIT`)
//! - `--no-timestamp`: omit timestamps from log lines

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use intcode::config::{DEFAULT_AMPLIFIERS, LOG_LEVEL_ENV, MachineConfig, STEP_LIMIT_ENV};
use intcode::noun_verb::search_noun_verb_with_config;
use intcode::pipeline::{Orchestrator, PipelineMode};
use intcode::utils::log::{self, Level};
use intcode::virtual_machine::program::Program;
use intcode::virtual_machine::vm::Machine;
use intcode::{debug, error, info};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::Ordering;

#[derive(Parser, Debug)]
#[command(name = "intcode", version)]
#[command(about = "Run Intcode programs and amplifier pipelines")]
struct Cli {
    /// Most verbose log level written to stderr
    #[arg(long, global = true, env = LOG_LEVEL_ENV, default_value = "info")]
    log_level: Level,

    /// Maximum number of instructions any single machine may execute
    #[arg(long, global = true, env = STEP_LIMIT_ENV)]
    step_limit: Option<u64>,

    /// Omit timestamps from log lines
    #[arg(long, global = true)]
    no_timestamp: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a program to completion and print every output
    Run {
        /// Program file
        file: PathBuf,

        /// Value queued as input, in order
        #[arg(short, long = "input", allow_hyphen_values = true)]
        input: Vec<i64>,

        /// Overwrite a cell before running
        #[arg(long = "patch", value_name = "ADDR=VALUE", value_parser = parse_patch)]
        patch: Vec<(usize, i64)>,

        /// Print the final memory after the program halts
        #[arg(long)]
        dump: bool,
    },
    /// Find the phase assignment that maximizes an amplifier pipeline's signal
    Amplify {
        /// Program file
        file: PathBuf,

        /// Pipeline wiring: linear or feedback
        #[arg(long, default_value = "linear")]
        mode: PipelineMode,

        /// Number of amplifiers
        #[arg(long, default_value_t = DEFAULT_AMPLIFIERS)]
        amplifiers: usize,

        /// Phase values to permute (defaults depend on the mode)
        #[arg(long, value_name = "LO..=HI", value_parser = parse_range, allow_hyphen_values = true)]
        phases: Option<RangeInclusive<i64>>,

        /// Run every amplifier in its own task (feedback mode only)
        #[arg(long)]
        concurrent: bool,
    },
    /// Find the noun and verb that make a program leave a target in cell 0
    NounVerb {
        /// Program file
        file: PathBuf,

        /// Value cell 0 must hold after the program halts
        #[arg(long, allow_hyphen_values = true)]
        target: i64,

        /// Largest noun and verb to try
        #[arg(long, default_value_t = 99)]
        max: i64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    log::set_max_level(cli.log_level);
    log::SHOW_TIMESTAMP.store(!cli.no_timestamp, Ordering::Relaxed);

    let config = MachineConfig {
        step_limit: cli.step_limit,
    };
    if let Err(e) = execute(cli.command, config).await {
        error!("{e:#}");
        process::exit(1);
    }
}

async fn execute(command: Command, config: MachineConfig) -> Result<()> {
    match command {
        Command::Run {
            file,
            input,
            patch,
            dump,
        } => run_program(&file, &input, &patch, dump, config),
        Command::Amplify {
            file,
            mode,
            amplifiers,
            phases,
            concurrent,
        } => amplify(&file, mode, amplifiers, phases, concurrent, config).await,
        Command::NounVerb { file, target, max } => noun_verb(&file, target, max, config),
    }
}

fn load(file: &Path) -> Result<Program> {
    let program =
        Program::load(file).with_context(|| format!("failed to load {}", file.display()))?;
    debug!("loaded {} words from {}", program.len(), file.display());
    Ok(program)
}

fn run_program(
    file: &Path,
    input: &[i64],
    patch: &[(usize, i64)],
    dump: bool,
    config: MachineConfig,
) -> Result<()> {
    let program = load(file)?
        .patched(patch)
        .context("failed to apply patches")?;
    let mut machine = Machine::with_config(&program, config);
    machine.feed_all(input.iter().copied());
    let outputs = machine
        .run_to_halt()
        .with_context(|| format!("{} failed", file.display()))?;
    for value in outputs {
        println!("{value}");
    }
    if dump {
        println!("{}", Program::new(machine.snapshot()));
    }

    info!("halted after {} steps", machine.steps());
    for (opcode, count) in machine.profile().iter() {
        debug!("  {:<5} {count}", opcode.mnemonic());
    }
    Ok(())
}

async fn amplify(
    file: &Path,
    mode: PipelineMode,
    amplifiers: usize,
    phases: Option<RangeInclusive<i64>>,
    concurrent: bool,
    config: MachineConfig,
) -> Result<()> {
    if concurrent && mode != PipelineMode::Feedback {
        bail!("--concurrent requires --mode feedback");
    }
    let candidates = phases.unwrap_or_else(|| mode.default_phases(amplifiers));
    let orchestrator = Orchestrator::new(load(file)?, amplifiers).with_config(config);
    let best = if concurrent {
        orchestrator.search_feedback_concurrent(candidates).await
    } else {
        orchestrator.search_best_phase_assignment(mode, candidates)
    }
    .context("phase search failed")?;

    let phases = best
        .phases
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    println!("{} (phases {phases})", best.signal);
    Ok(())
}

fn noun_verb(file: &Path, target: i64, max: i64, config: MachineConfig) -> Result<()> {
    let program = load(file)?;
    match search_noun_verb_with_config(&program, target, 0..=max, config)
        .context("noun/verb search failed")?
    {
        Some(pair) => {
            info!("noun {} verb {}", pair.noun, pair.verb);
            println!("{}", pair.answer());
            Ok(())
        }
        None => bail!("no noun and verb in 0..={max} produce {target}"),
    }
}

/// Parses `ADDR=VALUE`.
fn parse_patch(s: &str) -> Result<(usize, i64), String> {
    let (address, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ADDR=VALUE, got '{s}'"))?;
    let address = address
        .trim()
        .parse()
        .map_err(|e| format!("invalid address '{address}': {e}"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value '{value}': {e}"))?;
    Ok((address, value))
}

/// Parses `LO..=HI`.
fn parse_range(s: &str) -> Result<RangeInclusive<i64>, String> {
    let (lo, hi) = s
        .split_once("..=")
        .ok_or_else(|| format!("expected LO..=HI, got '{s}'"))?;
    let lo: i64 = lo
        .trim()
        .parse()
        .map_err(|e| format!("invalid lower bound '{lo}': {e}"))?;
    let hi: i64 = hi
        .trim()
        .parse()
        .map_err(|e| format!("invalid upper bound '{hi}': {e}"))?;
    Ok(lo..=hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn patch_arguments() {
        assert_eq!(parse_patch("1=12"), Ok((1, 12)));
        assert_eq!(parse_patch(" 2 = -7 "), Ok((2, -7)));
        assert!(parse_patch("12").is_err());
        assert!(parse_patch("-1=0").is_err());
    }

    #[test]
    fn unreachable_patch_is_an_error() {
        let path = std::env::temp_dir().join(format!("intcode-patch-{}.txt", process::id()));
        std::fs::write(&path, "99").unwrap();
        let patch = parse_patch(&format!("{}=1", usize::MAX)).unwrap();
        let result = run_program(&path, &[], &[patch], false, MachineConfig::default());
        std::fs::remove_file(&path).unwrap();
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "failed to apply patches");
    }

    #[test]
    fn range_arguments() {
        assert_eq!(parse_range("5..=9"), Ok(5..=9));
        assert_eq!(parse_range("-2..=2"), Ok(-2..=2));
        assert!(parse_range("0..4").is_err());
    }

    #[test]
    fn amplify_defaults() {
        let cli = Cli::try_parse_from(["intcode", "amplify", "prog.txt"]).unwrap();
        match cli.command {
            Command::Amplify {
                mode,
                amplifiers,
                phases,
                concurrent,
                ..
            } => {
                assert_eq!(mode, PipelineMode::Linear);
                assert_eq!(amplifiers, DEFAULT_AMPLIFIERS);
                assert_eq!(phases, None);
                assert!(!concurrent);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn run_collects_repeated_inputs() {
        let cli = Cli::try_parse_from([
            "intcode",
            "--log-level",
            "debug",
            "run",
            "prog.txt",
            "-i",
            "3",
            "--input",
            "-4",
            "--patch",
            "1=12",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Level::Debug);
        match cli.command {
            Command::Run { input, patch, .. } => {
                assert_eq!(input, vec![3, -4]);
                assert_eq!(patch, vec![(1, 12)]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
