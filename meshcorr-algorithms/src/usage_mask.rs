//! Claimed-target bookkeeping for injective matching

/// Target indices already claimed during one unique-assignment run.
///
/// Claims are never released: the mask only grows until the run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageMask {
    used: Vec<bool>,
    claimed: usize,
}

impl UsageMask {
    /// An empty mask over `target_len` target points
    pub fn new(target_len: usize) -> Self {
        Self {
            used: vec![false; target_len],
            claimed: 0,
        }
    }

    /// Claim `index`. Returns `false` if it was already claimed.
    ///
    /// # Panics
    /// Panics if `index` is outside the target set.
    pub fn claim(&mut self, index: usize) -> bool {
        if self.used[index] {
            return false;
        }
        self.used[index] = true;
        self.claimed += 1;
        true
    }

    pub fn is_used(&self, index: usize) -> bool {
        self.used.get(index).copied().unwrap_or(false)
    }

    /// Number of claimed targets
    pub fn len(&self) -> usize {
        self.claimed
    }

    pub fn is_empty(&self) -> bool {
        self.claimed == 0
    }

    /// Size of the target set the mask covers
    pub fn capacity(&self) -> usize {
        self.used.len()
    }

    /// Claimed target indices in ascending order
    pub fn claimed_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.used
            .iter()
            .enumerate()
            .filter_map(|(i, &used)| used.then_some(i))
    }
}
