//! Batch results with per-item failure isolation.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// An input item that was dropped from a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    /// Position in the input collection
    pub index: usize,
    pub reason: String,
}

/// Output of one stage over a collection: the items that made it through,
/// plus a record of every item that did not.
#[derive(Debug, Clone)]
pub struct Batch<T> {
    pub items: Vec<T>,
    pub skipped: Vec<SkippedItem>,
    /// Number of input items
    pub total: usize,
}

impl<T> Batch<T> {
    pub fn new(total: usize) -> Self {
        Self {
            items: Vec::with_capacity(total),
            skipped: Vec::new(),
            total,
        }
    }

    /// Number of items processed successfully.
    pub fn processed(&self) -> usize {
        self.items.len()
    }

    /// True when no input item was lost.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.items.len() == self.total
    }

    pub fn skip(&mut self, index: usize, reason: impl Into<String>) {
        self.skipped.push(SkippedItem {
            index,
            reason: reason.into(),
        });
    }

    /// "N of M processed successfully"
    pub fn summary(&self) -> String {
        format!(
            "{} of {} processed successfully",
            self.processed(),
            self.total
        )
    }
}

/// Order-preserving map over a slice, optionally spread across the rayon
/// pool. Both modes produce identical output.
pub fn map_items<T, U, F>(items: &[T], parallel: bool, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    if parallel {
        items.par_iter().map(f).collect()
    } else {
        items.iter().map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_summary() {
        let mut batch: Batch<u32> = Batch::new(3);
        batch.items.push(1);
        batch.items.push(2);
        batch.skip(1, "bad input");

        assert_eq!(batch.processed(), 2);
        assert!(!batch.is_complete());
        assert_eq!(batch.summary(), "2 of 3 processed successfully");
        assert_eq!(batch.skipped[0].index, 1);
    }

    #[test]
    fn test_empty_batch_is_complete() {
        let batch: Batch<u32> = Batch::new(0);
        assert!(batch.is_complete());
        assert_eq!(batch.summary(), "0 of 0 processed successfully");
    }

    #[test]
    fn test_map_items_preserves_order() {
        let input: Vec<u64> = (0..1000).collect();
        let sequential = map_items(&input, false, |x| x * 3);
        let parallel = map_items(&input, true, |x| x * 3);
        assert_eq!(sequential, parallel);
        assert_eq!(parallel[999], 2997);
    }
}
