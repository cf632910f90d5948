//! Instruction semantics.
//!
//! [`evaluate`] is a pure function of the decoded instruction, its resolved
//! operands and the register file. It never touches memory or the input
//! queue; it describes what should happen as an [`Effect`] which the machine
//! then applies. Arithmetic is exact: any result outside the `i64` range is a
//! [`MachineError::ArithmeticOverflow`].

use crate::virtual_machine::errors::MachineError;
use crate::virtual_machine::isa::{Instruction, Opcode};
use crate::virtual_machine::operand::Operands;
use crate::virtual_machine::vm::registers::Registers;

/// State change requested by one instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Store `value` at `address`, then advance.
    Write { address: i64, value: i64 },
    /// Set `pc` to the absolute `target`.
    Jump(i64),
    /// Advance without any other change.
    Continue,
    /// Replace the relative base, then advance.
    SetRelativeBase(i64),
    /// Store the next queued input at `address`, or suspend if there is none.
    Input { address: i64 },
    /// Emit `value`, advance, and suspend.
    Output(i64),
    /// Stop for good.
    Halt,
}

/// Computes the effect of executing `instr` with the resolved `ops`.
pub fn evaluate(
    instr: &Instruction,
    ops: &Operands,
    regs: &Registers,
) -> Result<Effect, MachineError> {
    let overflow = || MachineError::ArithmeticOverflow {
        word: instr.word,
        pc: regs.pc,
    };

    let effect = match instr.opcode {
        Opcode::Add => Effect::Write {
            address: ops.dest,
            value: ops.value(0).checked_add(ops.value(1)).ok_or_else(overflow)?,
        },
        Opcode::Mul => Effect::Write {
            address: ops.dest,
            value: ops.value(0).checked_mul(ops.value(1)).ok_or_else(overflow)?,
        },
        Opcode::Input => Effect::Input { address: ops.dest },
        Opcode::Output => Effect::Output(ops.value(0)),
        Opcode::JumpIfTrue => branch(ops.value(0) != 0, ops.value(1)),
        Opcode::JumpIfFalse => branch(ops.value(0) == 0, ops.value(1)),
        Opcode::LessThan => Effect::Write {
            address: ops.dest,
            value: i64::from(ops.value(0) < ops.value(1)),
        },
        Opcode::Equals => Effect::Write {
            address: ops.dest,
            value: i64::from(ops.value(0) == ops.value(1)),
        },
        Opcode::AdjustRelativeBase => Effect::SetRelativeBase(
            regs.relative_base
                .checked_add(ops.value(0))
                .ok_or_else(overflow)?,
        ),
        Opcode::Halt => Effect::Halt,
    };
    Ok(effect)
}

#[inline(always)]
fn branch(taken: bool, target: i64) -> Effect {
    if taken {
        Effect::Jump(target)
    } else {
        Effect::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_machine::vm::memory::Memory;

    /// Decodes and evaluates the instruction at address 0 of `cells`.
    fn eval_at_zero(cells: Vec<i64>, relative_base: i64) -> Result<Effect, MachineError> {
        let mem = Memory::new(cells);
        let regs = Registers { pc: 0, relative_base };
        let instr = Instruction::decode(mem[0], 0)?;
        let ops = Operands::resolve(&instr, &mem, &regs)?;
        evaluate(&instr, &ops, &regs)
    }

    #[test]
    fn add_and_mul() {
        assert_eq!(
            eval_at_zero(vec![1101, 2, 3, 7], 0),
            Ok(Effect::Write { address: 7, value: 5 })
        );
        assert_eq!(
            eval_at_zero(vec![1102, -4, 3, 7], 0),
            Ok(Effect::Write { address: 7, value: -12 })
        );
    }

    #[test]
    fn comparisons_write_flags() {
        assert_eq!(
            eval_at_zero(vec![1107, 1, 2, 9], 0),
            Ok(Effect::Write { address: 9, value: 1 })
        );
        assert_eq!(
            eval_at_zero(vec![1107, 2, 2, 9], 0),
            Ok(Effect::Write { address: 9, value: 0 })
        );
        assert_eq!(
            eval_at_zero(vec![1108, 2, 2, 9], 0),
            Ok(Effect::Write { address: 9, value: 1 })
        );
        assert_eq!(
            eval_at_zero(vec![1108, 2, 3, 9], 0),
            Ok(Effect::Write { address: 9, value: 0 })
        );
    }

    #[test]
    fn jumps() {
        assert_eq!(eval_at_zero(vec![1105, 1, 42], 0), Ok(Effect::Jump(42)));
        assert_eq!(eval_at_zero(vec![1105, 0, 42], 0), Ok(Effect::Continue));
        assert_eq!(eval_at_zero(vec![1106, 0, 42], 0), Ok(Effect::Jump(42)));
        assert_eq!(eval_at_zero(vec![1106, 5, 42], 0), Ok(Effect::Continue));
    }

    #[test]
    fn relative_base_accumulates() {
        assert_eq!(
            eval_at_zero(vec![109, -3], 10),
            Ok(Effect::SetRelativeBase(7))
        );
    }

    #[test]
    fn io_and_halt() {
        assert_eq!(eval_at_zero(vec![3, 5], 0), Ok(Effect::Input { address: 5 }));
        assert_eq!(eval_at_zero(vec![203, 5], 2), Ok(Effect::Input { address: 7 }));
        assert_eq!(eval_at_zero(vec![104, -8], 0), Ok(Effect::Output(-8)));
        assert_eq!(eval_at_zero(vec![99], 0), Ok(Effect::Halt));
    }

    #[test]
    fn overflow_is_fatal() {
        assert_eq!(
            eval_at_zero(vec![1101, i64::MAX, 1, 0], 0),
            Err(MachineError::ArithmeticOverflow { word: 1101, pc: 0 })
        );
        assert_eq!(
            eval_at_zero(vec![1102, i64::MIN, -1, 0], 0),
            Err(MachineError::ArithmeticOverflow { word: 1102, pc: 0 })
        );
        assert_eq!(
            eval_at_zero(vec![109, 1], i64::MAX),
            Err(MachineError::ArithmeticOverflow { word: 109, pc: 0 })
        );
    }

    #[test]
    fn immediate_destination_is_fatal() {
        assert_eq!(
            eval_at_zero(vec![11101, 1, 1, 0], 0),
            Err(MachineError::InvalidDestinationMode { word: 11101, pc: 0 })
        );
        assert_eq!(
            eval_at_zero(vec![103, 0], 0),
            Err(MachineError::InvalidDestinationMode { word: 103, pc: 0 })
        );
    }
}
