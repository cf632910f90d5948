//! Intcode virtual machine.
//!
//! A program is a flat sequence of signed 64-bit words that serves as both code
//! and data. Each instruction word encodes an opcode in its two low decimal
//! digits and one addressing mode per parameter in the digits above.
//!
//! # Architecture
//!
//! - **Memory**: growable vector of words; unwritten cells read as zero, writes
//!   past the end extend it with zeros
//! - **Registers**: program counter and relative base
//! - **Addressing modes**: position (`0`), immediate (`1`), relative (`2`)
//! - **Execution model**: decode, resolve operands, evaluate into an
//!   [`executor::Effect`], apply the effect to the machine
//! - **Suspension**: [`vm::Machine::run`] returns on output, on input
//!   starvation and on halt, so machines can be driven cooperatively
//! - **Step budget**: optional watchdog with per-opcode profiling
//!
//! # Modules
//!
//! - [`errors`]: Machine, memory and program-loading error types
//! - [`executor`]: Pure instruction semantics
//! - [`isa`]: Instruction set definition and decoding
//! - [`operand`]: Addressing-mode resolution
//! - [`program`]: Program text loading
//! - [`vm`]: Machine state, memory store and run loop

pub mod errors;
pub mod executor;
pub mod isa;
pub mod operand;
pub mod program;
pub mod vm;
