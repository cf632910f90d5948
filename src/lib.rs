//! Intcode library.
//!
//! Provides the Intcode virtual machine, amplifier pipelines built from
//! several machines, and the noun/verb memory-patching search.

pub mod config;
pub mod noun_verb;
pub mod pipeline;
pub mod utils;
pub mod virtual_machine;
