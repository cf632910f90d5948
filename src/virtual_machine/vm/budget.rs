use crate::virtual_machine::errors::MachineError;
use crate::virtual_machine::isa::Opcode;

/// Number of opcodes tracked by [`StepProfile`].
const OPCODE_COUNT: usize = 10;

/// Dense slot for each opcode in [`StepProfile`].
const fn slot(opcode: Opcode) -> usize {
    match opcode {
        Opcode::Add => 0,
        Opcode::Mul => 1,
        Opcode::Input => 2,
        Opcode::Output => 3,
        Opcode::JumpIfTrue => 4,
        Opcode::JumpIfFalse => 5,
        Opcode::LessThan => 6,
        Opcode::Equals => 7,
        Opcode::AdjustRelativeBase => 8,
        Opcode::Halt => 9,
    }
}

/// Per-opcode execution counts.
///
/// Backed by a flat array indexed by opcode slot so the hot path stays a
/// single saturating add.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepProfile {
    counts: [u64; OPCODE_COUNT],
}

impl StepProfile {
    /// Creates an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one execution of `opcode`.
    #[inline(always)]
    pub fn record(&mut self, opcode: Opcode) {
        let count = &mut self.counts[slot(opcode)];
        *count = count.saturating_add(1);
    }

    /// Returns how many times `opcode` executed.
    pub fn count(&self, opcode: Opcode) -> u64 {
        self.counts[slot(opcode)]
    }

    /// Returns the total number of executed instructions.
    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .fold(0u64, |acc, &v| acc.saturating_add(v))
    }

    /// Returns an iterator over opcodes that executed at least once.
    pub fn iter(&self) -> impl Iterator<Item = (Opcode, u64)> + '_ {
        Opcode::ALL
            .iter()
            .map(|op| (*op, self.count(*op)))
            .filter(|(_, n)| *n > 0)
    }
}

/// Instruction budget enforcing the optional step watchdog.
#[derive(Clone, Debug, Default)]
pub struct StepBudget {
    used: u64,
    limit: Option<u64>,
}

impl StepBudget {
    /// Creates a budget with an optional instruction limit.
    pub fn new(limit: Option<u64>) -> Self {
        Self { used: 0, limit }
    }

    /// Charges one instruction about to execute at `pc`.
    ///
    /// Returns [`MachineError::StepLimitExceeded`] once more than `limit`
    /// instructions would have executed.
    #[inline(always)]
    pub fn charge(&mut self, pc: usize) -> Result<(), MachineError> {
        if let Some(limit) = self.limit.filter(|limit| self.used >= *limit) {
            return Err(MachineError::StepLimitExceeded { limit, pc });
        }
        self.used += 1;
        Ok(())
    }

    /// Returns the charge of an instruction that suspended before executing.
    #[inline(always)]
    pub fn refund(&mut self) {
        self.used = self.used.saturating_sub(1);
    }

    /// Number of instructions charged so far.
    pub fn used(&self) -> u64 {
        self.used
    }

    /// Configured limit, if any.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }
}
