//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_opcode!`](crate::for_each_opcode) macro holds the canonical
//! opcode list and invokes a callback macro for code generation, so the opcode
//! enum, its selector lookup and its parameter layout never drift apart.
//!
//! This module generates:
//! - The [`Opcode`] enum with selector mappings
//! - Parameter layouts ([`ParamKind`]) per opcode
//!
//! and implements the instruction-word decoder ([`Instruction::decode`]).
//!
//! # Instruction word format
//!
//! An instruction word is a non-negative decimal integer:
//! - Digits 0-1 (least significant): opcode selector
//! - Digit 2: mode of parameter 1
//! - Digit 3: mode of parameter 2
//! - Digit 4: mode of parameter 3
//!
//! Missing mode digits default to [`Mode::Position`]; digits above the last
//! parameter of the opcode are ignored.

use crate::virtual_machine::errors::MachineError;
use std::fmt;

/// Largest number of parameters taken by any opcode.
pub const MAX_PARAMS: usize = 3;

/// Invokes a callback macro with the complete opcode definition list.
///
/// Each entry is `Name = selector, "MNEMONIC" => [param: Kind, ...]` where a
/// `Read` parameter resolves to a value and a `Write` parameter resolves to a
/// destination address.
#[macro_export]
macro_rules! for_each_opcode {
    ($callback:ident) => {
        $callback! {
            /// ADD a, b, dst ; dst = a + b
            Add = 1, "ADD" => [a: Read, b: Read, dst: Write],
            /// MUL a, b, dst ; dst = a * b
            Mul = 2, "MUL" => [a: Read, b: Read, dst: Write],
            /// IN dst ; dst = next queued input, suspends when the queue is empty
            Input = 3, "IN" => [dst: Write],
            /// OUT a ; emits a and suspends
            Output = 4, "OUT" => [a: Read],
            /// JNZ cond, target ; pc = target if cond != 0
            JumpIfTrue = 5, "JNZ" => [cond: Read, target: Read],
            /// JZ cond, target ; pc = target if cond == 0
            JumpIfFalse = 6, "JZ" => [cond: Read, target: Read],
            /// LT a, b, dst ; dst = (a < b) as 0/1
            LessThan = 7, "LT" => [a: Read, b: Read, dst: Write],
            /// EQ a, b, dst ; dst = (a == b) as 0/1
            Equals = 8, "EQ" => [a: Read, b: Read, dst: Write],
            /// ARB delta ; relative_base += delta
            AdjustRelativeBase = 9, "ARB" => [delta: Read],
            /// HALT ; stops the machine for good
            Halt = 99, "HALT" => [],
        }
    };
}

#[macro_export]
macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $selector:literal, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        /// Closed set of Intcode operations.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $selector,
            )*
        }

        impl Opcode {
            /// Every opcode in definition order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            /// Maps the two low-order digits of an instruction word to an opcode.
            pub const fn from_selector(selector: i64) -> Option<Self> {
                match selector {
                    $( $selector => Some(Opcode::$name), )*
                    _ => None,
                }
            }

            /// Returns the numeric selector of this opcode.
            pub const fn selector(&self) -> i64 {
                match self {
                    $( Opcode::$name => $selector, )*
                }
            }

            /// Returns the disassembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns the parameter layout, left to right.
            pub const fn params(&self) -> &'static [ParamKind] {
                match self {
                    $( Opcode::$name => &[ $( ParamKind::$kind, )* ], )*
                }
            }
        }
    };
}

/// How a parameter is consumed by its instruction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ParamKind {
    /// Resolved to a value.
    Read,
    /// Resolved to a destination address.
    Write,
}

for_each_opcode!(define_opcodes);

impl Opcode {
    /// Number of parameters following the instruction word.
    pub const fn operand_count(&self) -> usize {
        self.params().len()
    }

    /// Number of cells the instruction occupies, including the word itself.
    pub const fn width(&self) -> usize {
        1 + self.operand_count()
    }
}

/// Parameter addressing mode.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Mode {
    /// The parameter holds an address.
    #[default]
    Position = 0,
    /// The parameter holds the value itself.
    Immediate = 1,
    /// The parameter holds an offset from the relative base.
    Relative = 2,
}

impl Mode {
    /// Maps one decimal mode digit to a mode.
    pub const fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            0 => Some(Mode::Position),
            1 => Some(Mode::Immediate),
            2 => Some(Mode::Relative),
            _ => None,
        }
    }

    const fn tag(&self) -> char {
        match self {
            Mode::Position => 'P',
            Mode::Immediate => 'I',
            Mode::Relative => 'R',
        }
    }
}

/// A decoded instruction word.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
    /// Operation selected by the low-order digits.
    pub opcode: Opcode,
    /// Raw instruction word, kept for diagnostics.
    pub word: i64,
    modes: [Mode; MAX_PARAMS],
}

impl Instruction {
    /// Decodes the instruction word found at `pc`.
    ///
    /// `pc` is only used to give errors their context.
    pub fn decode(word: i64, pc: usize) -> Result<Self, MachineError> {
        let selector = word % 100;
        let opcode = (word >= 0)
            .then(|| Opcode::from_selector(selector))
            .flatten()
            .ok_or(MachineError::UnknownOpcode {
                opcode: selector,
                word,
                pc,
            })?;

        let mut modes = [Mode::Position; MAX_PARAMS];
        let mut digits = word / 100;
        for slot in modes.iter_mut().take(opcode.operand_count()) {
            let digit = digits % 10;
            *slot = Mode::from_digit(digit).ok_or(MachineError::InvalidMode {
                mode: digit,
                word,
                pc,
            })?;
            digits /= 10;
        }

        Ok(Self {
            opcode,
            word,
            modes,
        })
    }

    /// Modes of the parameters this opcode actually takes, left to right.
    pub fn modes(&self) -> &[Mode] {
        &self.modes[..self.opcode.operand_count()]
    }

    /// Mode of the parameter at `index` (0-based).
    pub fn mode(&self, index: usize) -> Mode {
        self.modes[index]
    }

    /// Number of cells the instruction occupies.
    pub fn width(&self) -> usize {
        self.opcode.width()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode.mnemonic())?;
        if !self.modes().is_empty() {
            let tags: String = self.modes().iter().map(Mode::tag).collect();
            write!(f, "[{tags}]")?;
        }
        Ok(())
    }
}
