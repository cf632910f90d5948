use thiserror::Error;

/// Fatal errors raised while decoding or executing Intcode.
///
/// Every variant carries the program counter of the faulting instruction, and
/// the raw instruction word where one was involved, so failures can be traced
/// back to a concrete cell of the program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// The two low-order digits of an instruction word name no opcode.
    #[error("unknown opcode {opcode} in word {word} at pc {pc}")]
    UnknownOpcode { opcode: i64, word: i64, pc: usize },
    /// A parameter mode digit is not 0, 1 or 2.
    #[error("invalid addressing mode {mode} in word {word} at pc {pc}")]
    InvalidMode { mode: i64, word: i64, pc: usize },
    /// A destination parameter was encoded in immediate mode.
    #[error("immediate mode used for destination in word {word} at pc {pc}")]
    InvalidDestinationMode { word: i64, pc: usize },
    /// A memory access or jump resolved to an address below zero.
    #[error("negative address {address} at pc {pc}")]
    NegativeAddress { address: i64, pc: usize },
    /// A write needed more memory than could be allocated.
    #[error("cannot grow memory to address {address} at pc {pc}")]
    OutOfMemory { address: i64, pc: usize },
    /// Integer arithmetic left the signed 64-bit range.
    #[error("arithmetic overflow in word {word} at pc {pc}")]
    ArithmeticOverflow { word: i64, pc: usize },
    /// The configured instruction budget ran out.
    #[error("step limit of {limit} instructions exceeded at pc {pc}")]
    StepLimitExceeded { limit: u64, pc: usize },
    /// `run` was called on a machine that already halted.
    #[error("machine already halted at pc {pc}")]
    MachineHalted { pc: usize },
    /// A run-to-halt helper found the input queue empty.
    #[error("input exhausted at pc {pc}")]
    InputExhausted { pc: usize },
}

/// Errors raised by the memory store before the machine attaches context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("negative address {address}")]
    NegativeAddress { address: i64 },
    #[error("cannot grow memory to address {address}")]
    OutOfMemory { address: i64 },
}

impl MemoryError {
    /// Attaches the program counter of the instruction that caused the access.
    pub fn at(self, pc: usize) -> MachineError {
        match self {
            MemoryError::NegativeAddress { address } => MachineError::NegativeAddress { address, pc },
            MemoryError::OutOfMemory { address } => MachineError::OutOfMemory { address, pc },
        }
    }
}

/// Errors raised while loading program text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    /// The text contained no words at all.
    #[error("program text is empty")]
    Empty,
    /// A comma-separated token is not a base-10 signed integer.
    #[error("invalid word {token:?} at index {index}")]
    InvalidWord { index: usize, token: String },
    /// A patch targets an address the program cannot grow to.
    #[error("cannot patch address {address}")]
    PatchOutOfRange { address: usize },
    /// The program file could not be read.
    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_error_gains_pc() {
        let err = MemoryError::NegativeAddress { address: -3 }.at(12);
        assert_eq!(err, MachineError::NegativeAddress { address: -3, pc: 12 });
        let err = MemoryError::OutOfMemory { address: i64::MAX }.at(4);
        assert_eq!(err, MachineError::OutOfMemory { address: i64::MAX, pc: 4 });
    }

    #[test]
    fn messages_carry_context() {
        let err = MachineError::UnknownOpcode {
            opcode: 42,
            word: 1042,
            pc: 7,
        };
        assert_eq!(err.to_string(), "unknown opcode 42 in word 1042 at pc 7");

        let err = ProgramError::InvalidWord {
            index: 2,
            token: "x".into(),
        };
        assert_eq!(err.to_string(), "invalid word \"x\" at index 2");
    }
}
