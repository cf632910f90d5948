use crate::virtual_machine::errors::MemoryError;
use std::collections::TryReserveError;
use std::ops::Index;

/// Growable word-addressed memory of a single machine.
///
/// The store starts as a copy of the program and only ever grows:
/// - **Reads** outside the stored range return `0` and leave the store untouched.
/// - **Writes** outside the stored range zero-fill up to and including the
///   target address before storing.
///
/// No upper bound is enforced; the store is limited only by available memory,
/// and a write that cannot be allocated fails with
/// [`MemoryError::OutOfMemory`]. Negative addresses are rejected by every
/// accessor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<i64>,
}

impl Memory {
    /// Creates a memory store holding `cells` at addresses `0..cells.len()`.
    pub fn new(cells: Vec<i64>) -> Self {
        Self { cells }
    }

    /// Converts a signed address into an index.
    #[inline(always)]
    pub fn index_of(address: i64) -> Result<usize, MemoryError> {
        usize::try_from(address).map_err(|_| MemoryError::NegativeAddress { address })
    }

    /// Returns the value at `address`, or `0` if it was never written.
    pub fn get(&self, address: i64) -> Result<i64, MemoryError> {
        let index = Self::index_of(address)?;
        Ok(self.cells.get(index).copied().unwrap_or(0))
    }

    /// Stores `value` at `address`, growing the store when needed.
    pub fn set(&mut self, address: i64, value: i64) -> Result<(), MemoryError> {
        let index = Self::index_of(address)?;
        if index >= self.cells.len() {
            grow(&mut self.cells, index).map_err(|_| MemoryError::OutOfMemory { address })?;
        }
        self.cells[index] = value;
        Ok(())
    }

    /// Number of cells currently held, including zero-filled growth.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the store holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the stored cells.
    pub fn as_slice(&self) -> &[i64] {
        &self.cells
    }

    /// Returns a copy of every stored cell.
    pub fn snapshot(&self) -> Vec<i64> {
        self.cells.clone()
    }
}

/// Zero-fills `cells` so that `index` is in range.
pub(crate) fn grow(cells: &mut Vec<i64>, index: usize) -> Result<(), TryReserveError> {
    let additional = index.saturating_sub(cells.len()).saturating_add(1);
    cells.try_reserve_exact(additional)?;
    cells.resize(cells.len() + additional, 0);
    Ok(())
}

/// Indexes the stored cells directly. Panics when out of range; use
/// [`Memory::get`] for the zero-defaulting read.
impl Index<usize> for Memory {
    type Output = i64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.cells[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_in_bounds() {
        let mem = Memory::new(vec![1, 2, 3]);
        assert_eq!(mem.get(0), Ok(1));
        assert_eq!(mem.get(2), Ok(3));
    }

    #[test]
    fn get_out_of_bounds_is_zero_without_growth() {
        let mem = Memory::new(vec![1, 2, 3]);
        assert_eq!(mem.get(3), Ok(0));
        assert_eq!(mem.get(1_000_000), Ok(0));
        assert_eq!(mem.len(), 3);
    }

    #[test]
    fn set_in_bounds_overwrites() {
        let mut mem = Memory::new(vec![1, 2, 3]);
        mem.set(1, 20).unwrap();
        assert_eq!(mem.as_slice(), &[1, 20, 3]);
    }

    #[test]
    fn set_out_of_bounds_zero_fills() {
        let mut mem = Memory::new(vec![7]);
        mem.set(4, 9).unwrap();
        assert_eq!(mem.as_slice(), &[7, 0, 0, 0, 9]);
        assert_eq!(mem[4], 9);
    }

    #[test]
    fn set_just_past_end_appends() {
        let mut mem = Memory::default();
        assert!(mem.is_empty());
        mem.set(0, 5).unwrap();
        assert_eq!(mem.snapshot(), vec![5]);
    }

    #[test]
    fn unallocatable_write_fails_without_growth() {
        let mut mem = Memory::new(vec![1, 2]);
        assert_eq!(
            mem.set(i64::MAX, 1),
            Err(MemoryError::OutOfMemory { address: i64::MAX })
        );
        assert_eq!(mem.as_slice(), &[1, 2]);
        assert_eq!(mem.get(i64::MAX), Ok(0));
    }

    #[test]
    fn negative_addresses_fail() {
        let mut mem = Memory::new(vec![1]);
        assert_eq!(
            mem.get(-1),
            Err(MemoryError::NegativeAddress { address: -1 })
        );
        assert_eq!(
            mem.set(-5, 1),
            Err(MemoryError::NegativeAddress { address: -5 })
        );
        assert_eq!(mem.as_slice(), &[1]);
    }
}
