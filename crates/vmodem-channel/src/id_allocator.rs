use std::collections::BTreeSet;

use tracing::warn;

/// Allocates small positive IDs (logical channels, data call contexts,
/// keepalive handles) and reuses released ones.
///
/// Outstanding IDs are always `1..=last` minus `returned`. Releasing the
/// highest outstanding ID shrinks `last`, swallowing any run of already
/// released IDs directly below it.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    last: u32,
    returned: BTreeSet<u32>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse the largest released ID, or issue a fresh one.
    pub fn get(&mut self) -> u32 {
        if let Some(id) = self.returned.pop_last() {
            return id;
        }
        self.last += 1;
        self.last
    }

    /// Release `id`. IDs that are not outstanding are ignored.
    pub fn put(&mut self, id: u32) {
        if id == 0 || id > self.last || self.returned.contains(&id) {
            warn!(id, last = self.last, "release of an ID that is not outstanding");
            return;
        }

        if id == self.last {
            self.last -= 1;
            while self.last > 0 && self.returned.remove(&self.last) {
                self.last -= 1;
            }
        } else {
            self.returned.insert(id);
        }
    }

    /// Number of IDs currently held by callers.
    pub fn outstanding(&self) -> usize {
        self.last as usize - self.returned.len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn issues_sequential_ids() {
        let mut ids = IdAllocator::new();
        assert_eq!((ids.get(), ids.get(), ids.get()), (1, 2, 3));
        assert_eq!(ids.outstanding(), 3);
    }

    #[test]
    fn reuses_largest_released_first() {
        let mut ids = IdAllocator::new();
        for _ in 0..5 {
            ids.get();
        }
        ids.put(2);
        ids.put(4);
        assert_eq!(ids.get(), 4);
        assert_eq!(ids.get(), 2);
        assert_eq!(ids.get(), 6);
    }

    #[test]
    fn releasing_top_compacts_freed_suffix() {
        let mut ids = IdAllocator::new();
        for _ in 0..4 {
            ids.get();
        }
        ids.put(2);
        ids.put(3);
        ids.put(4);

        assert_eq!(ids.last, 1);
        assert!(ids.returned.is_empty());
        assert_eq!(ids.get(), 2);
    }

    #[test]
    fn releasing_everything_restarts_at_one() {
        let orders: [&[u32]; 3] = [&[1, 2, 3, 4], &[4, 3, 2, 1], &[2, 4, 1, 3]];
        for order in orders {
            let mut ids = IdAllocator::new();
            for _ in 0..4 {
                ids.get();
            }
            for &id in order {
                ids.put(id);
            }
            assert_eq!(ids.outstanding(), 0, "order {order:?}");
            assert!(ids.returned.is_empty(), "order {order:?}");
            assert_eq!(ids.get(), 1, "order {order:?}");
        }
    }

    #[test]
    fn descending_release_leaves_no_gaps() {
        let mut ids = IdAllocator::new();
        let held: Vec<u32> = (0..6).map(|_| ids.get()).collect();
        for &id in held.iter().rev().take(3) {
            ids.put(id);
            assert!(ids.returned.is_empty());
        }
        assert_eq!(ids.last, 3);
    }

    #[test]
    fn held_ids_are_unique_under_churn() {
        let mut ids = IdAllocator::new();
        let mut held: Vec<u32> = Vec::new();
        // Deterministic mix of gets and puts.
        for step in 0u32..200 {
            if step % 3 == 2 && !held.is_empty() {
                let victim = held.remove((step as usize * 7) % held.len());
                ids.put(victim);
            } else {
                held.push(ids.get());
            }
            let unique: HashSet<u32> = held.iter().copied().collect();
            assert_eq!(unique.len(), held.len(), "step {step}");
            assert_eq!(ids.outstanding(), held.len(), "step {step}");
        }
    }

    #[test]
    fn bogus_release_is_ignored() {
        let mut ids = IdAllocator::new();
        ids.get();
        ids.put(0);
        ids.put(7);
        ids.put(1);
        ids.put(1);
        assert_eq!(ids.outstanding(), 0);
        assert_eq!(ids.get(), 1);
    }
}
