//! Lexicographic permutation enumeration.

/// Rearrange `items` into the next lexicographically greater permutation.
///
/// Returns `false` (leaving `items` sorted ascending again) once the last
/// permutation has been passed.
pub fn next_permutation<T: Ord>(items: &mut [T]) -> bool {
    if items.len() < 2 {
        return false;
    }

    // Longest non-increasing suffix
    let mut i = items.len() - 1;
    while i > 0 && items[i - 1] >= items[i] {
        i -= 1;
    }
    if i == 0 {
        items.reverse();
        return false;
    }

    let mut j = items.len() - 1;
    while items[j] <= items[i - 1] {
        j -= 1;
    }
    items.swap(i - 1, j);
    items[i..].reverse();
    true
}

/// Lazy iterator over all permutations of a set, in lexicographic order
#[derive(Debug, Clone)]
pub struct LexicographicPermutations {
    first: Vec<usize>,
    current: Option<Vec<usize>>,
}

impl LexicographicPermutations {
    /// Start from the smallest arrangement of `items`
    pub fn new(mut items: Vec<usize>) -> Self {
        items.sort_unstable();
        LexicographicPermutations {
            first: items.clone(),
            current: Some(items),
        }
    }

    /// Enumerate the customers `1..dimension` of an instance
    pub fn of_customers(dimension: usize) -> Self {
        Self::new((1..dimension).collect())
    }

    /// Go back to the first permutation
    pub fn restart(&mut self) {
        self.current = Some(self.first.clone());
    }
}

impl Iterator for LexicographicPermutations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.current.take()?;
        let mut next = current.clone();
        if next_permutation(&mut next) {
            self.current = Some(next);
        }
        Some(current)
    }
}
