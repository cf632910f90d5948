//! Noun/verb search.
//!
//! Some programs take their parameters from cells 1 and 2 (the "noun" and
//! "verb") and leave their answer in cell 0 when they halt. This module patches
//! those cells, runs the program without input and scans for the pair that
//! produces a target answer.

use crate::config::MachineConfig;
use crate::debug;
use crate::virtual_machine::errors::MachineError;
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::Machine;
use std::ops::RangeInclusive;

/// Address of the noun cell.
pub const NOUN_ADDRESS: i64 = 1;
/// Address of the verb cell.
pub const VERB_ADDRESS: i64 = 2;
/// Values tried for both noun and verb unless told otherwise.
pub const DEFAULT_RANGE: RangeInclusive<i64> = 0..=99;

/// A noun and verb pair.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NounVerb {
    pub noun: i64,
    pub verb: i64,
}

impl NounVerb {
    /// Combined answer, `100 * noun + verb`.
    pub fn answer(&self) -> i64 {
        100 * self.noun + self.verb
    }
}

/// Runs `program` with cells 1 and 2 set to `noun` and `verb` and returns cell 0.
pub fn run_with_noun_verb(program: &Program, noun: i64, verb: i64) -> Result<i64, MachineError> {
    run_patched(program, noun, verb, MachineConfig::default())
}

fn run_patched(
    program: &Program,
    noun: i64,
    verb: i64,
    config: MachineConfig,
) -> Result<i64, MachineError> {
    let mut machine = Machine::with_config(program, config);
    machine.poke(NOUN_ADDRESS, noun)?;
    machine.poke(VERB_ADDRESS, verb)?;
    machine.run_to_halt()?;
    machine.peek(0)
}

/// Returns the first pair in `range × range` whose run leaves `target` in cell 0.
///
/// Nouns are scanned in the outer loop and verbs in the inner loop. The first
/// machine error aborts the search.
pub fn search_noun_verb(
    program: &Program,
    target: i64,
    range: RangeInclusive<i64>,
) -> Result<Option<NounVerb>, MachineError> {
    search_noun_verb_with_config(program, target, range, MachineConfig::default())
}

/// [`search_noun_verb`] with limits applied to every trial machine.
pub fn search_noun_verb_with_config(
    program: &Program,
    target: i64,
    range: RangeInclusive<i64>,
    config: MachineConfig,
) -> Result<Option<NounVerb>, MachineError> {
    for noun in range.clone() {
        for verb in range.clone() {
            if run_patched(program, noun, verb, config)? == target {
                debug!("noun {noun} verb {verb} produce {target}");
                return Ok(Some(NounVerb { noun, verb }));
            }
        }
    }
    Ok(None)
}
