//! Core virtual machine implementation.
//!
//! A [`Machine`] owns its memory, registers and input queue outright; sibling
//! machines built from the same [`Program`] never share cells. Execution is
//! cooperative: [`Machine::run`] returns control to the caller at every
//! suspend point instead of blocking:
//!
//! - an `IN` instruction finds the input queue empty ([`RunOutcome::AwaitingInput`]),
//!   leaving `pc` on that instruction so the next `run` retries it;
//! - an `OUT` instruction has produced a value ([`RunOutcome::Output`]);
//! - `HALT` executed ([`RunOutcome::Halted`]), after which the machine is terminal.

pub mod budget;
pub mod memory;
pub mod registers;

use crate::config::MachineConfig;
use crate::virtual_machine::errors::MachineError;
use crate::virtual_machine::executor::{self, Effect};
use crate::virtual_machine::isa::Instruction;
use crate::virtual_machine::operand::Operands;
use crate::virtual_machine::program::Program;
use budget::{StepBudget, StepProfile};
use memory::Memory;
use registers::Registers;
use std::collections::VecDeque;

/// Lifecycle of a machine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunState {
    /// Created, never run.
    Ready,
    /// Executing, or yielded after an output and ready to continue.
    Running,
    /// Parked on an `IN` instruction with an empty queue.
    AwaitingInput,
    /// Executed `HALT`. Terminal.
    Halted,
}

/// Why [`Machine::run`] returned control.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunOutcome {
    /// An `OUT` instruction produced this signal.
    Output(i64),
    /// An `IN` instruction needs a value; [`Machine::feed`] and run again.
    AwaitingInput,
    /// The program halted.
    Halted,
}

/// Intcode virtual machine.
pub struct Machine {
    /// Program and data cells.
    memory: Memory,
    /// Program counter and relative base.
    registers: Registers,
    /// Pending inputs, consumed front first.
    input: VecDeque<i64>,
    /// Current lifecycle state.
    state: RunState,
    /// Optional step watchdog.
    budget: StepBudget,
    /// Executed instructions per opcode.
    profile: StepProfile,
}

impl Machine {
    /// Creates a machine loaded with a private copy of `program`.
    pub fn new(program: &Program) -> Self {
        Self::with_config(program, MachineConfig::default())
    }

    /// Creates a machine loaded with a private copy of `program` and the given limits.
    pub fn with_config(program: &Program, config: MachineConfig) -> Self {
        Self::from_memory_with_config(program.to_memory(), config)
    }

    /// Creates a machine whose memory starts as `cells`.
    pub fn from_memory(cells: Vec<i64>) -> Self {
        Self::from_memory_with_config(cells, MachineConfig::default())
    }

    fn from_memory_with_config(cells: Vec<i64>, config: MachineConfig) -> Self {
        Self {
            memory: Memory::new(cells),
            registers: Registers::new(),
            input: VecDeque::new(),
            state: RunState::Ready,
            budget: StepBudget::new(config.step_limit),
            profile: StepProfile::new(),
        }
    }

    /// Runs `program` on a fresh machine with `inputs` queued and collects
    /// every output until it halts.
    pub fn execute(program: &Program, inputs: &[i64]) -> Result<Vec<i64>, MachineError> {
        let mut machine = Machine::new(program);
        machine.feed_all(inputs.iter().copied());
        machine.run_to_halt()
    }

    /// Appends `value` to the input queue.
    pub fn feed(&mut self, value: i64) {
        self.input.push_back(value);
    }

    /// Appends every value to the input queue, in order.
    pub fn feed_all<I: IntoIterator<Item = i64>>(&mut self, values: I) {
        self.input.extend(values);
    }

    /// Executes instructions until the next suspend point.
    ///
    /// Returns [`MachineError::MachineHalted`] if the machine already halted.
    pub fn run(&mut self) -> Result<RunOutcome, MachineError> {
        self.resume()?;
        loop {
            if let Some(outcome) = self.exec_next()? {
                return Ok(outcome);
            }
        }
    }

    /// Executes exactly one instruction.
    ///
    /// Returns `Ok(None)` if execution simply moved on, or the suspend outcome
    /// the instruction produced.
    pub fn step(&mut self) -> Result<Option<RunOutcome>, MachineError> {
        self.resume()?;
        self.exec_next()
    }

    /// Runs until `HALT`, collecting every output.
    ///
    /// Returns [`MachineError::InputExhausted`] if the program asks for input
    /// that was never queued.
    pub fn run_to_halt(&mut self) -> Result<Vec<i64>, MachineError> {
        let mut outputs = Vec::new();
        loop {
            match self.run()? {
                RunOutcome::Output(value) => outputs.push(value),
                RunOutcome::Halted => return Ok(outputs),
                RunOutcome::AwaitingInput => {
                    return Err(MachineError::InputExhausted {
                        pc: self.registers.pc,
                    });
                }
            }
        }
    }

    /// Reads the cell at `address` without side effects.
    pub fn peek(&self, address: i64) -> Result<i64, MachineError> {
        self.memory
            .get(address)
            .map_err(|e| e.at(self.registers.pc))
    }

    /// Overwrites the cell at `address`, growing memory when needed.
    pub fn poke(&mut self, address: i64, value: i64) -> Result<(), MachineError> {
        self.memory
            .set(address, value)
            .map_err(|e| e.at(self.registers.pc))
    }

    /// Returns a copy of the entire memory.
    pub fn snapshot(&self) -> Vec<i64> {
        self.memory.snapshot()
    }

    /// Returns the memory store.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn pc(&self) -> usize {
        self.registers.pc
    }

    pub fn relative_base(&self) -> i64 {
        self.registers.relative_base
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == RunState::Halted
    }

    /// Number of queued inputs not yet consumed.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// Number of instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.budget.used()
    }

    /// Per-opcode execution counts.
    pub fn profile(&self) -> &StepProfile {
        &self.profile
    }

    fn resume(&mut self) -> Result<(), MachineError> {
        if self.state == RunState::Halted {
            return Err(MachineError::MachineHalted {
                pc: self.registers.pc,
            });
        }
        self.state = RunState::Running;
        Ok(())
    }

    /// Decodes, resolves, evaluates and applies the instruction at `pc`.
    fn exec_next(&mut self) -> Result<Option<RunOutcome>, MachineError> {
        let pc = self.registers.pc;
        self.budget.charge(pc)?;
        let word = self.memory.get(pc as i64).map_err(|e| e.at(pc))?;
        let instr = Instruction::decode(word, pc)?;
        let ops = Operands::resolve(&instr, &self.memory, &self.registers)?;
        let effect = executor::evaluate(&instr, &ops, &self.registers)?;
        self.apply(&instr, effect)
    }

    fn apply(
        &mut self,
        instr: &Instruction,
        effect: Effect,
    ) -> Result<Option<RunOutcome>, MachineError> {
        let pc = self.registers.pc;
        let outcome = match effect {
            Effect::Write { address, value } => {
                self.memory.set(address, value).map_err(|e| e.at(pc))?;
                self.registers.advance(instr.width());
                None
            }
            Effect::Jump(target) => {
                self.registers.pc = Memory::index_of(target).map_err(|e| e.at(pc))?;
                None
            }
            Effect::Continue => {
                self.registers.advance(instr.width());
                None
            }
            Effect::SetRelativeBase(base) => {
                self.registers.relative_base = base;
                self.registers.advance(instr.width());
                None
            }
            Effect::Input { address } => {
                let Some(value) = self.input.pop_front() else {
                    self.budget.refund();
                    self.state = RunState::AwaitingInput;
                    crate::trace!("machine awaiting input at pc {pc}");
                    return Ok(Some(RunOutcome::AwaitingInput));
                };
                self.memory.set(address, value).map_err(|e| e.at(pc))?;
                self.registers.advance(instr.width());
                None
            }
            Effect::Output(value) => {
                self.registers.advance(instr.width());
                crate::trace!("machine output {value} at pc {pc}");
                Some(RunOutcome::Output(value))
            }
            Effect::Halt => {
                self.state = RunState::Halted;
                crate::trace!(
                    "machine halted at pc {pc} after {} steps",
                    self.budget.used()
                );
                Some(RunOutcome::Halted)
            }
        };
        self.profile.record(instr.opcode);
        Ok(outcome)
    }
}
