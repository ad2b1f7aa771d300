//! Eviction Module
//!
//! Picks which entries to drop when the substrate refuses a write: the oldest
//! fifth by write time. Reads never refresh an entry's position.

/// One pass removes one in this many entries (20%), rounded up.
pub const EVICTION_DIVISOR: usize = 5;

// == Eviction Queue ==
/// Candidates ordered by write timestamp.
///
/// Front = oldest write, back = newest write. Ties keep insertion order.
#[derive(Debug, Default)]
pub struct EvictionQueue {
    candidates: Vec<(String, u64)>,
}

impl EvictionQueue {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }

    // == Push ==
    /// Adds a candidate key with its write timestamp.
    pub fn push(&mut self, key: String, timestamp: u64) {
        self.candidates.push((key, timestamp));
    }

    // == Target Count ==
    /// Number of entries one pass removes: `ceil(20% of candidates)`.
    pub fn target_count(&self) -> usize {
        self.candidates.len().div_ceil(EVICTION_DIVISOR)
    }

    // == Take Oldest ==
    /// Consumes the queue, returning the keys of the oldest fifth.
    pub fn take_oldest(mut self) -> Vec<String> {
        let count = self.target_count();
        self.candidates.sort_by_key(|(_, timestamp)| *timestamp);
        self.candidates
            .into_iter()
            .take(count)
            .map(|(key, _)| key)
            .collect()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl FromIterator<(String, u64)> for EvictionQueue {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            candidates: iter.into_iter().collect(),
        }
    }
}
