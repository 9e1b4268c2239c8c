//! Proximity and phrase ranking over positional postings.
//!
//! A document is scored by its successive minimal windows: intervals
//! `[a, b]` of positions that contain every distinct query term at least
//! once. Starting below the first position, each step moves `b` to the
//! furthest of the terms' next occurrences after the previous `a`, then
//! pulls `a` back to the nearest occurrence of every term at or before `b`.
//! Each window contributes `1 / (width - k + 2)`, where `width = b - a + 1`
//! is the number of positions spanned and `k` the number of distinct terms,
//! so a window holding exactly the query terms scores 1/2 and wider windows
//! score less.
//!
//! In phrase mode a window only counts if the full query sequence occurs at
//! consecutive positions starting at `a`.

use crate::error::{IndexError, Result};
use crate::index::cursor::PositionsCursor;
use crate::index::reader::Index;
use crate::index::types::{DocId, Position, PostingsList};
use crate::query::cancel::CancellationToken;
use crate::query::parser::{parse_query, ProximityQuery, QueryMode};
use crate::query::ranking::{RankedDoc, RankingCollector};
use crate::utils::SearchConfig;
use rayon::prelude::*;
use roaring::RoaringBitmap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Counters gathered while answering one query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Documents containing every query term
    pub candidates: usize,
    /// Candidates whose windows were computed
    pub scored: usize,
    /// Minimal windows examined
    pub windows: usize,
    /// Windows that contributed to a score
    pub accepted_windows: usize,
    /// Documents in the returned ranking
    pub ranked: usize,
}

impl SearchStats {
    fn merge(&mut self, other: &SearchStats) {
        self.candidates += other.candidates;
        self.scored += other.scored;
        self.windows += other.windows;
        self.accepted_windows += other.accepted_windows;
        self.ranked += other.ranked;
    }
}

/// Score of one document
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowScore {
    pub score: f64,
    pub windows: usize,
    pub accepted: usize,
}

/// Scores every minimal window of one document.
///
/// `cursors` holds one cursor per distinct query term. `slots` is the full
/// query sequence as indexes into `cursors`; it is only consulted in phrase
/// mode.
pub fn score_document(cursors: &[PositionsCursor<'_>], slots: &[usize], mode: QueryMode) -> WindowScore {
    let mut result = WindowScore::default();
    if cursors.is_empty() {
        return result;
    }
    let k = cursors.len() as f64;

    let mut lower: Option<Position> = None;
    let mut prev_upper: Option<Position> = None;

    'windows: loop {
        let mut upper: Position = 0;
        for cursor in cursors {
            let next = match lower {
                None => cursor.first(),
                Some(a) => cursor.next_after(a),
            };
            match next {
                Some(p) => upper = upper.max(p),
                None => break 'windows,
            }
        }

        // Each window must end strictly after the previous one
        if prev_upper.is_some_and(|prev| upper <= prev) {
            break;
        }

        let mut start = upper;
        for cursor in cursors {
            match cursor.at_or_before(upper) {
                Some(p) => start = start.min(p),
                None => break 'windows,
            }
        }

        result.windows += 1;
        let accepted = match mode {
            QueryMode::Proximity => true,
            QueryMode::Phrase => phrase_at(cursors, slots, start),
        };
        if accepted {
            let width = (upper - start) as f64 + 1.0;
            result.score += 1.0 / (width - k + 2.0).max(1.0);
            result.accepted += 1;
        }

        lower = Some(start);
        prev_upper = Some(upper);
    }

    result
}

/// Whether the query sequence occupies consecutive positions from `start`
fn phrase_at(cursors: &[PositionsCursor<'_>], slots: &[usize], start: Position) -> bool {
    slots.iter().enumerate().all(|(offset, &slot)| {
        let Ok(offset) = Position::try_from(offset) else {
            return false;
        };
        match (start.checked_add(offset), cursors.get(slot)) {
            (Some(p), Some(cursor)) => cursor.contains(p),
            _ => false,
        }
    })
}

/// Per-worker partial result
struct Shard {
    collector: RankingCollector,
    stats: SearchStats,
}

impl Shard {
    fn new(cutoff: usize) -> Self {
        Self {
            collector: RankingCollector::new(cutoff),
            stats: SearchStats::default(),
        }
    }

    fn merge(mut self, other: Shard) -> Self {
        self.collector.merge(other.collector);
        self.stats.merge(&other.stats);
        self
    }
}

/// Ranks documents of an index by term proximity
pub struct ProximityEngine<'a, I: Index + ?Sized> {
    index: &'a I,
    config: SearchConfig,
}

impl<'a, I: Index + ?Sized> ProximityEngine<'a, I> {
    pub fn new(index: &'a I) -> Self {
        Self::with_config(index, SearchConfig::default())
    }

    pub fn with_config(index: &'a I, config: SearchConfig) -> Self {
        Self { index, config }
    }

    pub fn index(&self) -> &'a I {
        self.index
    }

    /// Best `cutoff` documents for `query`, best first
    pub fn search(&self, query: &str, cutoff: usize) -> Result<Vec<RankedDoc>> {
        let (ranking, _) = self.search_with(query, cutoff, &CancellationToken::new())?;
        Ok(ranking)
    }

    /// Like [`Self::search`], stoppable through `cancel` and returning stats
    pub fn search_with(
        &self,
        query: &str,
        cutoff: usize,
        cancel: &CancellationToken,
    ) -> Result<(Vec<RankedDoc>, SearchStats)> {
        self.search_query(&parse_query(query), cutoff, cancel)
    }

    /// Rank documents for an already parsed query
    pub fn search_query(
        &self,
        query: &ProximityQuery,
        cutoff: usize,
        cancel: &CancellationToken,
    ) -> Result<(Vec<RankedDoc>, SearchStats)> {
        let start = Instant::now();
        if query.is_empty() || cutoff == 0 {
            return Ok((Vec::new(), SearchStats::default()));
        }

        let distinct = query.distinct_terms();
        let slots = query.term_slots();
        let lists = distinct
            .iter()
            .map(|term| self.index.postings(term))
            .collect::<Result<Vec<Arc<PostingsList>>>>()?;

        let candidates = candidate_docs(&lists);
        let total_candidates = candidates.len();

        let shard = candidates
            .par_iter()
            .with_min_len(self.config.min_shard_len.max(1))
            .try_fold(
                || Shard::new(cutoff),
                |mut shard, &doc_id| -> Result<Shard> {
                    if cancel.is_cancelled() {
                        return Err(IndexError::Cancelled);
                    }
                    let Some(cursors) = doc_cursors(&lists, doc_id) else {
                        return Ok(shard);
                    };
                    let scored = score_document(&cursors, &slots, query.mode);
                    shard.stats.scored += 1;
                    shard.stats.windows += scored.windows;
                    shard.stats.accepted_windows += scored.accepted;
                    shard.collector.add(doc_id, scored.score);
                    Ok(shard)
                },
            )
            .try_reduce(|| Shard::new(cutoff), |a, b| Ok(a.merge(b)))?;

        let ranking = shard.collector.into_sorted_vec();
        let stats = SearchStats {
            candidates: total_candidates,
            ranked: ranking.len(),
            ..shard.stats
        };

        debug!(
            terms = query.terms.len(),
            phrase = query.is_phrase(),
            candidates = stats.candidates,
            windows = stats.windows,
            accepted = stats.accepted_windows,
            ranked = stats.ranked,
            elapsed_us = start.elapsed().as_micros() as u64,
            "proximity search"
        );

        Ok((ranking, stats))
    }
}

/// Documents present in every list, ascending
fn candidate_docs(lists: &[Arc<PostingsList>]) -> Vec<DocId> {
    let mut by_len: Vec<&Arc<PostingsList>> = lists.iter().collect();
    by_len.sort_by_key(|list| list.len());

    let Some((first, rest)) = by_len.split_first() else {
        return Vec::new();
    };
    let mut docs: RoaringBitmap = first.doc_ids();
    for list in rest {
        if docs.is_empty() {
            break;
        }
        docs &= list.doc_ids();
    }
    docs.iter().collect()
}

fn doc_cursors(lists: &[Arc<PostingsList>], doc_id: DocId) -> Option<Vec<PositionsCursor<'_>>> {
    lists
        .iter()
        .map(|list| list.get(doc_id).map(|posting| posting.cursor()))
        .collect()
}
