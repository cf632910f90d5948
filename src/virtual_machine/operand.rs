//! Parameter resolution.
//!
//! A parameter cell holds a raw integer whose meaning depends on its
//! [`Mode`]. Read parameters resolve to a **value**, destination parameters
//! resolve to an **address**:
//!
//! | Mode      | value                          | address                  |
//! |-----------|--------------------------------|--------------------------|
//! | Position  | `mem[raw]`                     | `raw`                    |
//! | Immediate | `raw`                          | invalid                  |
//! | Relative  | `mem[relative_base + raw]`     | `relative_base + raw`    |

use crate::virtual_machine::errors::MachineError;
use crate::virtual_machine::isa::{Instruction, MAX_PARAMS, Mode, ParamKind};
use crate::virtual_machine::vm::memory::Memory;
use crate::virtual_machine::vm::registers::Registers;

/// A raw parameter cell tagged with its addressing mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SrcOperand {
    Position(i64),
    Immediate(i64),
    Relative(i64),
}

impl SrcOperand {
    pub const fn new(mode: Mode, raw: i64) -> Self {
        match mode {
            Mode::Position => SrcOperand::Position(raw),
            Mode::Immediate => SrcOperand::Immediate(raw),
            Mode::Relative => SrcOperand::Relative(raw),
        }
    }

    /// Resolves the operand to the value it denotes.
    pub fn value(
        &self,
        memory: &Memory,
        regs: &Registers,
        word: i64,
    ) -> Result<i64, MachineError> {
        match *self {
            SrcOperand::Immediate(v) => Ok(v),
            _ => {
                let address = self.address(regs, word)?;
                memory.get(address).map_err(|e| e.at(regs.pc))
            }
        }
    }

    /// Resolves the operand to a destination address.
    ///
    /// Returns [`MachineError::InvalidDestinationMode`] for immediate operands
    /// and [`MachineError::NegativeAddress`] if the address is below zero.
    pub fn address(&self, regs: &Registers, word: i64) -> Result<i64, MachineError> {
        let pc = regs.pc;
        let address = match *self {
            SrcOperand::Position(raw) => raw,
            SrcOperand::Relative(raw) => regs
                .relative_base
                .checked_add(raw)
                .ok_or(MachineError::ArithmeticOverflow { word, pc })?,
            SrcOperand::Immediate(_) => {
                return Err(MachineError::InvalidDestinationMode { word, pc });
            }
        };
        if address < 0 {
            return Err(MachineError::NegativeAddress { address, pc });
        }
        Ok(address)
    }
}

/// Fully resolved parameters of one instruction.
///
/// `values` holds the read parameters in order. `dest` holds the destination
/// address for opcodes with a write parameter and is `0` for the others.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Operands {
    values: [i64; MAX_PARAMS],
    count: usize,
    /// Destination address of the write parameter.
    pub dest: i64,
}

impl Operands {
    /// Resolves every parameter of `instr` against the current machine state.
    pub fn resolve(
        instr: &Instruction,
        memory: &Memory,
        regs: &Registers,
    ) -> Result<Self, MachineError> {
        let mut operands = Operands::default();
        for (index, kind) in instr.opcode.params().iter().enumerate() {
            let raw = memory
                .get(regs.param_address(index) as i64)
                .map_err(|e| e.at(regs.pc))?;
            let src = SrcOperand::new(instr.mode(index), raw);
            match kind {
                ParamKind::Read => {
                    operands.values[operands.count] = src.value(memory, regs, instr.word)?;
                    operands.count += 1;
                }
                ParamKind::Write => operands.dest = src.address(regs, instr.word)?,
            }
        }
        Ok(operands)
    }

    /// Read parameter values in order.
    pub fn values(&self) -> &[i64] {
        &self.values[..self.count]
    }

    /// Value of the read parameter at `index`.
    #[inline(always)]
    pub fn value(&self, index: usize) -> i64 {
        self.values[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs(pc: usize, relative_base: i64) -> Registers {
        Registers { pc, relative_base }
    }

    #[test]
    fn position_reads_through_memory() {
        let mem = Memory::new(vec![10, 20, 30]);
        let op = SrcOperand::new(Mode::Position, 2);
        assert_eq!(op.value(&mem, &regs(0, 0), 1), Ok(30));
        assert_eq!(op.address(&regs(0, 0), 1), Ok(2));
    }

    #[test]
    fn immediate_is_its_own_value() {
        let mem = Memory::new(vec![10, 20, 30]);
        let op = SrcOperand::new(Mode::Immediate, 2);
        assert_eq!(op.value(&mem, &regs(0, 0), 101), Ok(2));
    }

    #[test]
    fn immediate_destination_is_rejected() {
        let op = SrcOperand::new(Mode::Immediate, 2);
        assert_eq!(
            op.address(&regs(4, 0), 10001),
            Err(MachineError::InvalidDestinationMode { word: 10001, pc: 4 })
        );
    }

    #[test]
    fn relative_offsets_from_base() {
        let mem = Memory::new(vec![10, 20, 30]);
        let op = SrcOperand::new(Mode::Relative, -1);
        assert_eq!(op.value(&mem, &regs(0, 3), 201), Ok(30));
        assert_eq!(op.address(&regs(0, 3), 201), Ok(2));
    }

    #[test]
    fn unwritten_cells_read_as_zero() {
        let mem = Memory::new(vec![1]);
        let op = SrcOperand::new(Mode::Relative, 50);
        assert_eq!(op.value(&mem, &regs(0, 50), 201), Ok(0));
    }

    #[test]
    fn negative_addresses_are_rejected() {
        let mem = Memory::new(vec![1]);
        let op = SrcOperand::new(Mode::Position, -7);
        assert_eq!(
            op.value(&mem, &regs(2, 0), 1),
            Err(MachineError::NegativeAddress { address: -7, pc: 2 })
        );
        let op = SrcOperand::new(Mode::Relative, -4);
        assert_eq!(
            op.address(&regs(2, 3), 1),
            Err(MachineError::NegativeAddress { address: -1, pc: 2 })
        );
    }

    #[test]
    fn relative_overflow_is_rejected() {
        let op = SrcOperand::new(Mode::Relative, 1);
        assert_eq!(
            op.address(&regs(0, i64::MAX), 201),
            Err(MachineError::ArithmeticOverflow { word: 201, pc: 0 })
        );
    }

    #[test]
    fn resolve_splits_values_and_destination() {
        // MUL [P, I, P] 4, 3, 4 with mem[4] = 33
        let mem = Memory::new(vec![1002, 4, 3, 4, 33]);
        let instr = Instruction::decode(1002, 0).unwrap();
        let ops = Operands::resolve(&instr, &mem, &regs(0, 0)).unwrap();
        assert_eq!(ops.values(), &[33, 3]);
        assert_eq!(ops.dest, 4);
    }

    #[test]
    fn resolve_jump_has_no_destination() {
        let mem = Memory::new(vec![1105, 1, 9]);
        let instr = Instruction::decode(1105, 0).unwrap();
        let ops = Operands::resolve(&instr, &mem, &regs(0, 0)).unwrap();
        assert_eq!(ops.values(), &[1, 9]);
        assert_eq!(ops.dest, 0);
    }
}
