//! Feedback pipelines with one tokio task per stage.
//!
//! Stages are joined in a ring by unbounded channels: stage `i` reads from
//! channel `i` and writes to channel `i + 1`, the last stage writing back into
//! channel `0`. Every channel is seeded with its stage's phase and channel `0`
//! also carries the initial signal. A stage parks on its receiver whenever its
//! machine starves and drops its sender when the machine halts.

use super::errors::PipelineError;
use super::permutations::Permutations;
use super::{BestPhases, Orchestrator, PhaseSearch, PipelineMode};
use crate::debug;
use crate::virtual_machine::vm::{Machine, RunOutcome};
use std::ops::RangeInclusive;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

impl Orchestrator {
    /// Runs a feedback pipeline with every stage in its own task and returns
    /// the last output of the last stage.
    ///
    /// Produces the same signal as [`Orchestrator::run_feedback`].
    pub async fn run_feedback_concurrent(&self, phases: &[i64]) -> Result<i64, PipelineError> {
        self.validate_phases(phases)?;
        let count = phases.len();

        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..count).map(|_| unbounded_channel::<i64>()).unzip();
        for (sender, &phase) in senders.iter().zip(phases) {
            // Receivers are still alive here.
            let _ = sender.send(phase);
        }
        let _ = senders[0].send(0);

        let handles: Vec<JoinHandle<Result<Option<i64>, PipelineError>>> = self
            .build_unprimed_machines(count)
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(stage, (machine, inbox))| {
                let outbox = senders[(stage + 1) % count].clone();
                tokio::spawn(drive_stage(stage, machine, inbox, outbox))
            })
            .collect();
        // Only the stages hold senders from here on.
        drop(senders);

        let mut results = Vec::with_capacity(count);
        for (stage, handle) in handles.into_iter().enumerate() {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(PipelineError::TaskFailed {
                    stage,
                    reason: e.to_string(),
                }),
            };
            results.push(result);
        }

        let mut closed = None;
        let mut signal = None;
        for (stage, result) in results.into_iter().enumerate() {
            match result {
                Err(PipelineError::InputClosed { .. }) if closed.is_none() => {
                    closed = Some(PipelineError::InputClosed { stage });
                }
                Err(PipelineError::InputClosed { .. }) => {}
                Err(e) => return Err(e),
                Ok(last) if stage == count - 1 => signal = last,
                Ok(_) => {}
            }
        }
        if let Some(e) = closed {
            return Err(e);
        }
        let signal = signal.ok_or(PipelineError::NoOutput { stage: count - 1 })?;
        debug!("concurrent feedback pipeline {phases:?} -> {signal}");
        Ok(signal)
    }

    /// [`Orchestrator::search_best_phase_assignment`] in feedback mode, with
    /// every trial run by [`Orchestrator::run_feedback_concurrent`].
    pub async fn search_feedback_concurrent(
        &self,
        candidates: RangeInclusive<i64>,
    ) -> Result<PhaseSearch, PipelineError> {
        self.validate_candidates(&candidates)?;
        let mut tracker = BestPhases::default();
        for phases in Permutations::new(candidates) {
            let signal = self.run_feedback_concurrent(&phases).await.map_err(|source| {
                PipelineError::TrialFailed {
                    phases: phases.clone(),
                    source: Box::new(source),
                }
            })?;
            tracker.record(signal, phases);
        }
        tracker.finish(PipelineMode::Feedback)
    }

    fn build_unprimed_machines(&self, count: usize) -> Vec<Machine> {
        (0..count)
            .map(|_| Machine::with_config(self.program(), self.config()))
            .collect()
    }
}

/// Runs one stage until its machine halts, returning its last output.
async fn drive_stage(
    stage: usize,
    mut machine: Machine,
    mut inbox: UnboundedReceiver<i64>,
    outbox: UnboundedSender<i64>,
) -> Result<Option<i64>, PipelineError> {
    let mut last = None;
    loop {
        match machine.run().map_err(PipelineError::machine(stage))? {
            RunOutcome::Output(value) => {
                last = Some(value);
                // A halted downstream stage has dropped its receiver.
                let _ = outbox.send(value);
            }
            RunOutcome::AwaitingInput => match inbox.recv().await {
                Some(value) => machine.feed(value),
                None => return Err(PipelineError::InputClosed { stage }),
            },
            RunOutcome::Halted => {
                debug!("stage {stage} halted after {} steps", machine.steps());
                return Ok(last);
            }
        }
    }
}
