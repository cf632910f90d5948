/// Lazy, restartable sequence of every ordering of a set of values.
///
/// Orderings are produced in lexicographic order using the classic
/// next-permutation step: find the longest non-increasing suffix, swap its
/// predecessor with the smallest larger element of the suffix, then reverse
/// the suffix. The input is sorted first, so `n` distinct values always yield
/// exactly `n!` orderings, the first of which is the sorted one.
#[derive(Clone, Debug)]
pub struct Permutations<T> {
    start: Vec<T>,
    current: Vec<T>,
    exhausted: bool,
}

impl<T: Ord + Clone> Permutations<T> {
    pub fn new(values: impl IntoIterator<Item = T>) -> Self {
        let mut start: Vec<T> = values.into_iter().collect();
        start.sort();
        Self {
            current: start.clone(),
            start,
            exhausted: false,
        }
    }

    /// Rewinds to the first (sorted) ordering.
    pub fn restart(&mut self) {
        self.current.clone_from(&self.start);
        self.exhausted = false;
    }

    /// Advances `current` to its lexicographic successor.
    ///
    /// Returns `false` when `current` was already the last ordering.
    fn advance(&mut self) -> bool {
        let v = &mut self.current;
        if v.len() < 2 {
            return false;
        }
        let mut i = v.len() - 1;
        while i > 0 && v[i - 1] >= v[i] {
            i -= 1;
        }
        if i == 0 {
            return false;
        }
        let mut j = v.len() - 1;
        while v[j] <= v[i - 1] {
            j -= 1;
        }
        v.swap(i - 1, j);
        v[i..].reverse();
        true
    }
}

impl<T: Ord + Clone> Iterator for Permutations<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let item = self.current.clone();
        self.exhausted = !self.advance();
        Some(item)
    }
}
