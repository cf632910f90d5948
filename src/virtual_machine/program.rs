//! Program representation and text loading.
//!
//! A [`Program`] is the immutable initial memory image shared by every machine
//! built from it. Program text is a single line of comma-separated base-10
//! signed integers, e.g. `1,9,10,3,2,3,11,0,99,30,40,50`.

use crate::virtual_machine::errors::ProgramError;
use crate::virtual_machine::vm::memory::grow;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Immutable Intcode program.
///
/// Cloning is cheap; machines copy the words into their own memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    words: Arc<[i64]>,
}

impl Program {
    /// Creates a program from its words.
    pub fn new(words: Vec<i64>) -> Self {
        Self {
            words: words.into(),
        }
    }

    /// Parses comma-separated program text.
    ///
    /// Surrounding whitespace, including a trailing newline, is ignored, as is
    /// whitespace around each word.
    pub fn parse(text: &str) -> Result<Self, ProgramError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ProgramError::Empty);
        }
        let words = text
            .split(',')
            .enumerate()
            .map(|(index, token)| {
                let token = token.trim();
                token.parse::<i64>().map_err(|_| ProgramError::InvalidWord {
                    index,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(words))
    }

    /// Reads and parses the program file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProgramError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ProgramError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&text)
    }

    /// Returns the program words.
    pub fn words(&self) -> &[i64] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns a private copy of the words to use as machine memory.
    pub fn to_memory(&self) -> Vec<i64> {
        self.words.to_vec()
    }

    /// Returns a copy of this program with each `(address, value)` written in.
    ///
    /// Addresses past the end extend the program with zeros. An address the
    /// words cannot grow to fails with [`ProgramError::PatchOutOfRange`].
    pub fn patched(&self, patches: &[(usize, i64)]) -> Result<Self, ProgramError> {
        let mut words = self.to_memory();
        for &(address, value) in patches {
            if address >= words.len() {
                grow(&mut words, address).map_err(|_| ProgramError::PatchOutOfRange { address })?;
            }
            words[address] = value;
        }
        Ok(Self::new(words))
    }
}

impl From<Vec<i64>> for Program {
    fn from(words: Vec<i64>) -> Self {
        Self::new(words)
    }
}

impl FromStr for Program {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{word}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        let program = Program::parse("1,0,0,0,99").unwrap();
        assert_eq!(program.words(), &[1, 0, 0, 0, 99]);
        assert_eq!(program.len(), 5);
    }

    #[test]
    fn parse_trims_and_accepts_negatives() {
        let program: Program = "  1101,100,-1,4,0\n".parse().unwrap();
        assert_eq!(program.words(), &[1101, 100, -1, 4, 0]);

        let program = Program::parse("1, 2 ,3").unwrap();
        assert_eq!(program.words(), &[1, 2, 3]);
    }

    #[test]
    fn parse_large_words() {
        let program = Program::parse("104,1125899906842624,99").unwrap();
        assert_eq!(program.words()[1], 1_125_899_906_842_624);
    }

    #[test]
    fn parse_empty() {
        assert_eq!(Program::parse(""), Err(ProgramError::Empty));
        assert_eq!(Program::parse(" \n"), Err(ProgramError::Empty));
    }

    #[test]
    fn parse_invalid_word() {
        assert_eq!(
            Program::parse("1,x,3"),
            Err(ProgramError::InvalidWord {
                index: 1,
                token: "x".into()
            })
        );
        assert_eq!(
            Program::parse("1,2,"),
            Err(ProgramError::InvalidWord {
                index: 2,
                token: String::new()
            })
        );
        assert!(matches!(
            Program::parse("1.5"),
            Err(ProgramError::InvalidWord { index: 0, .. })
        ));
    }

    #[test]
    fn load_missing_file() {
        let err = Program::load("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, ProgramError::Io { .. }));
    }

    #[test]
    fn load_reads_file() {
        let path = std::env::temp_dir().join(format!("intcode-load-{}.txt", std::process::id()));
        fs::write(&path, "3,0,4,0,99\n").unwrap();
        let program = Program::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(program.words(), &[3, 0, 4, 0, 99]);
    }

    #[test]
    fn patched_leaves_original_untouched() {
        let program = Program::new(vec![1, 0, 0, 3, 99]);
        let patched = program.patched(&[(1, 12), (2, 2), (7, 5)]).unwrap();
        assert_eq!(program.words(), &[1, 0, 0, 3, 99]);
        assert_eq!(patched.words(), &[1, 12, 2, 3, 99, 0, 0, 5]);
    }

    #[test]
    fn patch_past_addressable_memory_fails() {
        let program = Program::new(vec![99]);
        assert_eq!(
            program.patched(&[(usize::MAX, 1)]),
            Err(ProgramError::PatchOutOfRange { address: usize::MAX })
        );
        assert_eq!(
            program.patched(&[(0, 1), (usize::MAX / 2, 1)]),
            Err(ProgramError::PatchOutOfRange {
                address: usize::MAX / 2
            })
        );
    }

    #[test]
    fn display_round_trips() {
        let text = "1002,4,3,4,33";
        assert_eq!(Program::parse(text).unwrap().to_string(), text);
    }

    #[test]
    fn clones_share_words() {
        let program = Program::new(vec![1, 2, 3]);
        let copy = program.clone();
        assert!(Arc::ptr_eq(&program.words, &copy.words));
    }
}
