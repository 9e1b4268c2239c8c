//! Bounded top-K collection of scored documents.
//!
//! The collector keeps at most `cutoff` entries in a min-heap keyed on rank,
//! so the worst retained entry is always at the top and can be evicted in
//! O(log K). Rank order is descending score, ties broken by ascending doc id;
//! the result is therefore independent of insertion order.

use crate::index::types::DocId;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A document with its query score
#[derive(Debug, Clone, Copy)]
pub struct RankedDoc {
    pub doc_id: DocId,
    pub score: f64,
}

impl RankedDoc {
    pub fn new(doc_id: DocId, score: f64) -> Self {
        Self { doc_id, score }
    }
}

/// `Less` means `self` ranks ahead of `other`
impl Ord for RankedDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

impl PartialOrd for RankedDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankedDoc {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankedDoc {}

/// Keeps the `cutoff` best-ranked documents
#[derive(Debug, Clone)]
pub struct RankingCollector {
    /// Max-heap on rank order: the worst retained entry is on top
    heap: BinaryHeap<RankedDoc>,
    cutoff: usize,
}

impl RankingCollector {
    pub fn new(cutoff: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(cutoff.saturating_add(1).min(1024)),
            cutoff,
        }
    }

    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    /// Offer a document. Scores that are not positive (or NaN) are ignored.
    ///
    /// Returns true if the document is now among the retained entries.
    pub fn add(&mut self, doc_id: DocId, score: f64) -> bool {
        if score.is_nan() || score <= 0.0 || self.cutoff == 0 {
            return false;
        }
        let entry = RankedDoc::new(doc_id, score);

        if self.heap.len() < self.cutoff {
            self.heap.push(entry);
            return true;
        }
        match self.heap.peek() {
            Some(worst) if entry < *worst => {
                self.heap.pop();
                self.heap.push(entry);
                true
            }
            _ => false,
        }
    }

    /// Lowest retained score once full; 0.0 before that
    pub fn threshold(&self) -> f64 {
        if self.heap.len() >= self.cutoff {
            self.heap.peek().map(|e| e.score).unwrap_or(0.0)
        } else {
            0.0
        }
    }

    /// Fold another collector's entries into this one
    pub fn merge(&mut self, other: RankingCollector) {
        for entry in other.heap {
            self.add(entry.doc_id, entry.score);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Retained entries, best first
    pub fn into_sorted_vec(self) -> Vec<RankedDoc> {
        self.heap.into_sorted_vec()
    }
}
