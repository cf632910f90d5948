//! Amplifier pipelines.
//!
//! An [`Orchestrator`] builds one independent [`Machine`] per stage from a
//! shared [`Program`], primes each with its phase setting and routes signals
//! from stage to stage:
//!
//! - [`PipelineMode::Linear`] visits every stage once; the last stage's first
//!   output is the result.
//! - [`PipelineMode::Feedback`] wires the last stage back into the first and
//!   keeps cycling until the last stage halts; its final output is the result.
//!
//! [`Orchestrator::search_best_phase_assignment`] tries every ordering of a
//! phase range on fresh machines and keeps the strongest signal.

pub mod concurrent;
pub mod errors;
pub mod permutations;

use crate::config::MachineConfig;
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::{Machine, RunOutcome};
use crate::{debug, info};
use errors::PipelineError;
use permutations::Permutations;
use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// How the stages of a pipeline are connected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PipelineMode {
    /// Each stage runs once, in order.
    Linear,
    /// The last stage feeds the first until the last stage halts.
    Feedback,
}

impl PipelineMode {
    /// Phase values conventionally used by `count` stages in this mode.
    ///
    /// Linear pipelines use `0..count`, feedback pipelines `count..2*count`.
    pub fn default_phases(self, count: usize) -> RangeInclusive<i64> {
        let count = count as i64;
        match self {
            PipelineMode::Linear => 0..=count - 1,
            PipelineMode::Feedback => count..=2 * count - 1,
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineMode::Linear => f.write_str("linear"),
            PipelineMode::Feedback => f.write_str("feedback"),
        }
    }
}

impl FromStr for PipelineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(PipelineMode::Linear),
            "feedback" => Ok(PipelineMode::Feedback),
            other => Err(format!(
                "unknown pipeline mode '{other}' (expected linear or feedback)"
            )),
        }
    }
}

/// Best phase assignment found by a search.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PhaseSearch {
    /// Strongest final signal.
    pub signal: i64,
    /// Phase per stage that produced `signal`.
    pub phases: Vec<i64>,
    /// Number of permutations tried.
    pub trials: usize,
}

/// Builds and drives pipelines of machines running the same program.
#[derive(Clone, Debug)]
pub struct Orchestrator {
    program: Program,
    machine_count: usize,
    config: MachineConfig,
    phase_range: Option<RangeInclusive<i64>>,
}

impl Orchestrator {
    /// Creates an orchestrator for `machine_count` stages running `program`.
    ///
    /// A count of zero is reported when a run or search starts.
    pub fn new(program: Program, machine_count: usize) -> Self {
        Self {
            program,
            machine_count,
            config: MachineConfig::default(),
            phase_range: None,
        }
    }

    /// Sets the limits handed to every machine.
    pub fn with_config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Rejects phase values outside `range`.
    pub fn with_phase_range(mut self, range: RangeInclusive<i64>) -> Self {
        self.phase_range = Some(range);
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn machine_count(&self) -> usize {
        self.machine_count
    }

    pub fn config(&self) -> MachineConfig {
        self.config
    }

    /// Runs one pass through the stages and returns the last stage's first output.
    pub fn run_linear(&self, phases: &[i64]) -> Result<i64, PipelineError> {
        self.validate_phases(phases)?;
        let mut pipeline = Pipeline::new(self, phases);
        let signal = pipeline.run_linear()?;
        debug!("linear pipeline {phases:?} -> {signal}");
        Ok(signal)
    }

    /// Cycles signals through the stages until the last one halts and
    /// returns its last output.
    pub fn run_feedback(&self, phases: &[i64]) -> Result<i64, PipelineError> {
        self.validate_phases(phases)?;
        let mut pipeline = Pipeline::new(self, phases);
        let signal = pipeline.run_feedback()?;
        debug!("feedback pipeline {phases:?} -> {signal}");
        Ok(signal)
    }

    /// Runs the pipeline in `mode`.
    pub fn run(&self, mode: PipelineMode, phases: &[i64]) -> Result<i64, PipelineError> {
        match mode {
            PipelineMode::Linear => self.run_linear(phases),
            PipelineMode::Feedback => self.run_feedback(phases),
        }
    }

    /// Tries every ordering of `candidates` as the phase assignment and
    /// returns the one producing the strongest final signal.
    ///
    /// `candidates` must hold exactly one value per stage. On ties the
    /// lexicographically first ordering wins. A failing trial aborts the
    /// search with [`PipelineError::TrialFailed`].
    pub fn search_best_phase_assignment(
        &self,
        mode: PipelineMode,
        candidates: RangeInclusive<i64>,
    ) -> Result<PhaseSearch, PipelineError> {
        self.validate_candidates(&candidates)?;
        let mut tracker = BestPhases::default();
        for phases in Permutations::new(candidates) {
            let signal = self
                .run(mode, &phases)
                .map_err(|source| PipelineError::TrialFailed {
                    phases: phases.clone(),
                    source: Box::new(source),
                })?;
            tracker.record(signal, phases);
        }
        tracker.finish(mode)
    }

    fn validate_count(&self) -> Result<(), PipelineError> {
        if self.machine_count == 0 {
            return Err(PipelineError::Configuration(
                "a pipeline needs at least one machine".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn validate_phases(&self, phases: &[i64]) -> Result<(), PipelineError> {
        self.validate_count()?;
        if phases.len() != self.machine_count {
            return Err(PipelineError::Configuration(format!(
                "expected {} phases, got {}",
                self.machine_count,
                phases.len()
            )));
        }
        let mut seen = HashSet::with_capacity(phases.len());
        for &phase in phases {
            if !seen.insert(phase) {
                return Err(PipelineError::Configuration(format!(
                    "phase {phase} is assigned more than once"
                )));
            }
            if let Some(range) = self
                .phase_range
                .as_ref()
                .filter(|range| !range.contains(&phase))
            {
                return Err(PipelineError::Configuration(format!(
                    "phase {phase} is outside {}..={}",
                    range.start(),
                    range.end()
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn validate_candidates(&self, candidates: &RangeInclusive<i64>) -> Result<(), PipelineError> {
        self.validate_count()?;
        let size = if candidates.is_empty() {
            0
        } else {
            i128::from(*candidates.end()) - i128::from(*candidates.start()) + 1
        };
        if size != self.machine_count as i128 {
            return Err(PipelineError::Configuration(format!(
                "phase range {}..={} holds {size} values but the pipeline has {} machines",
                candidates.start(),
                candidates.end(),
                self.machine_count
            )));
        }
        if let Some(range) = self.phase_range.as_ref().filter(|range| {
            !range.contains(candidates.start()) || !range.contains(candidates.end())
        }) {
            return Err(PipelineError::Configuration(format!(
                "phase range {}..={} is outside {}..={}",
                candidates.start(),
                candidates.end(),
                range.start(),
                range.end()
            )));
        }
        Ok(())
    }

    /// Fresh machines, each primed with its phase.
    pub(crate) fn build_machines(&self, phases: &[i64]) -> Vec<Machine> {
        phases
            .iter()
            .map(|&phase| {
                let mut machine = Machine::with_config(&self.program, self.config);
                machine.feed(phase);
                machine
            })
            .collect()
    }
}

/// Running maximum over the trials of a search.
#[derive(Default)]
pub(crate) struct BestPhases {
    best: Option<(i64, Vec<i64>)>,
    trials: usize,
}

impl BestPhases {
    /// Keeps `phases` only if `signal` beats every earlier trial.
    pub(crate) fn record(&mut self, signal: i64, phases: Vec<i64>) {
        self.trials += 1;
        if self.best.as_ref().is_none_or(|(top, _)| signal > *top) {
            self.best = Some((signal, phases));
        }
    }

    pub(crate) fn finish(self, mode: PipelineMode) -> Result<PhaseSearch, PipelineError> {
        let (signal, phases) = self.best.ok_or_else(|| {
            PipelineError::Configuration("no phase permutations to try".to_string())
        })?;
        info!(
            "best {mode} signal {signal} from phases {phases:?} after {} trials",
            self.trials
        );
        Ok(PhaseSearch {
            signal,
            phases,
            trials: self.trials,
        })
    }
}

/// Machines and routing state for a single trial.
struct Pipeline {
    machines: Vec<Machine>,
    /// Signal waiting to be delivered to the current stage.
    signal: Option<i64>,
}

impl Pipeline {
    fn new(orchestrator: &Orchestrator, phases: &[i64]) -> Self {
        Self {
            machines: orchestrator.build_machines(phases),
            signal: Some(0),
        }
    }

    fn run_linear(&mut self) -> Result<i64, PipelineError> {
        let mut signal = 0;
        for (stage, machine) in self.machines.iter_mut().enumerate() {
            machine.feed(signal);
            signal = match machine.run().map_err(PipelineError::machine(stage))? {
                RunOutcome::Output(value) => value,
                RunOutcome::Halted => return Err(PipelineError::NoOutput { stage }),
                RunOutcome::AwaitingInput => return Err(PipelineError::Stalled { stage }),
            };
        }
        Ok(signal)
    }

    fn run_feedback(&mut self) -> Result<i64, PipelineError> {
        let last = self.machines.len() - 1;
        let mut result = None;
        for stage in (0..self.machines.len()).cycle() {
            let machine = &mut self.machines[stage];
            if machine.is_halted() {
                self.signal = None;
                continue;
            }
            if let Some(value) = self.signal.take() {
                machine.feed(value);
            }
            match machine.run().map_err(PipelineError::machine(stage))? {
                RunOutcome::Output(value) => {
                    self.signal = Some(value);
                    if stage == last {
                        result = Some(value);
                    }
                }
                RunOutcome::Halted if stage == last => break,
                RunOutcome::Halted => {}
                RunOutcome::AwaitingInput => return Err(PipelineError::Stalled { stage }),
            }
        }
        result.ok_or(PipelineError::NoOutput { stage: last })
    }
}
