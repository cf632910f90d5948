use crate::virtual_machine::errors::MachineError;
use thiserror::Error;

/// Errors raised while orchestrating a pipeline of machines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Machine count or phase assignment is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A stage's machine failed.
    #[error("stage {stage}: {source}")]
    Machine {
        stage: usize,
        #[source]
        source: MachineError,
    },
    /// A stage halted before producing the signal the pipeline needed.
    #[error("stage {stage} halted without producing output")]
    NoOutput { stage: usize },
    /// A stage is waiting for input that no other stage will ever provide.
    #[error("stage {stage} is waiting for input that will never arrive")]
    Stalled { stage: usize },
    /// The upstream channel of a concurrently driven stage closed while it waited.
    #[error("stage {stage} input channel closed")]
    InputClosed { stage: usize },
    /// A concurrently driven stage's task panicked or was cancelled.
    #[error("stage {stage} task failed: {reason}")]
    TaskFailed { stage: usize, reason: String },
    /// A phase-permutation trial failed during a search.
    #[error("trial with phases {phases:?} failed: {source}")]
    TrialFailed {
        phases: Vec<i64>,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub(crate) fn machine(stage: usize) -> impl FnOnce(MachineError) -> PipelineError {
        move |source| PipelineError::Machine { stage, source }
    }
}
