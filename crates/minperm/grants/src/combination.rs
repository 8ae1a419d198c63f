//! Lexicographic k-combinations over universe indices.

/// Lazy iterator over every strictly increasing `k`-tuple drawn from `0..n`.
///
/// Tuples come out in lexicographic order: for `n = 4, k = 2` that is
/// `[0,1] [0,2] [0,3] [1,2] [1,3] [2,3]`. `k = 0` yields one empty tuple and
/// `k > n` yields nothing.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    k: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            indices: Vec::with_capacity(k),
            started: false,
            done: k > n,
        }
    }

    /// Total number of tuples this iterator produces from the start.
    pub fn total(&self) -> u128 {
        binomial(self.n, self.k)
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.started {
            self.started = true;
            self.indices = (0..self.k).collect();
            return Some(self.indices.clone());
        }

        // rightmost position that can still advance
        let mut i = self.k;
        loop {
            if i == 0 {
                self.done = true;
                return None;
            }
            i -= 1;
            if self.indices[i] < self.n - self.k + i {
                break;
            }
        }

        self.indices[i] += 1;
        for j in i + 1..self.k {
            self.indices[j] = self.indices[j - 1] + 1;
        }

        Some(self.indices.clone())
    }
}

/// C(n, k), saturating at `u128::MAX`.
pub fn binomial(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        let numerator = (n - i) as u128;
        result = match result.checked_mul(numerator) {
            Some(product) => product / (i as u128 + 1),
            None => return u128::MAX,
        };
    }
    result
}

/// Upper bound on combination attempts for a search over `n` grants with the given
/// depth budget: the sum of C(n, d) for d in `1..max_depth`.
pub fn attempt_bound(n: usize, max_depth: usize) -> u128 {
    (1..max_depth)
        .map(|depth| binomial(n, depth))
        .fold(0u128, |acc, c| acc.saturating_add(c))
}
