//! Nearest-position queries over one posting's sorted positions.
//!
//! A cursor is a borrowed view, not an iterator: every query is a binary
//! search over the whole slice, so results do not depend on the order in
//! which queries are issued and a cursor can be shared freely between
//! threads. "No such position" is `None`.

use crate::index::types::Position;

#[derive(Debug, Clone, Copy)]
pub struct PositionsCursor<'a> {
    positions: &'a [Position],
}

impl<'a> PositionsCursor<'a> {
    /// Wrap a strictly increasing position slice
    pub fn new(positions: &'a [Position]) -> Self {
        Self { positions }
    }

    #[inline]
    pub fn first(&self) -> Option<Position> {
        self.positions.first().copied()
    }

    #[inline]
    pub fn last(&self) -> Option<Position> {
        self.positions.last().copied()
    }

    /// Smallest position strictly greater than `p`
    #[inline]
    pub fn next_after(&self, p: Position) -> Option<Position> {
        let idx = self.positions.partition_point(|&x| x <= p);
        self.positions.get(idx).copied()
    }

    /// Largest position strictly less than `p`
    #[inline]
    pub fn next_before(&self, p: Position) -> Option<Position> {
        let idx = self.positions.partition_point(|&x| x < p);
        idx.checked_sub(1).map(|i| self.positions[i])
    }

    /// Largest position less than or equal to `p`
    #[inline]
    pub fn at_or_before(&self, p: Position) -> Option<Position> {
        let idx = self.positions.partition_point(|&x| x <= p);
        idx.checked_sub(1).map(|i| self.positions[i])
    }

    #[inline]
    pub fn contains(&self, p: Position) -> bool {
        self.positions.binary_search(&p).is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
