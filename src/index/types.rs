use crate::index::cursor::PositionsCursor;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::slice;

/// Sequential identifier of a document, assigned at build time
pub type DocId = u32;

/// 0-based token offset of a term occurrence within a document
pub type Position = u32;

/// Dictionary file: one `"<term> <byte-offset>"` line per term
pub const DICTIONARY_FILE: &str = "dictionary.txt";
/// Postings store: one postings line per term, addressed by dictionary offset
pub const POSTINGS_FILE: &str = "postings.txt";
/// Path table: line number = doc id
pub const PATHS_FILE: &str = "paths.txt";
/// Norm table, parallel to the path table
pub const NORMS_FILE: &str = "norms.txt";
/// Build metadata (optional on load)
pub const META_FILE: &str = "meta.json";
/// Present while the writer is replacing tables; an index carrying it is incomplete
pub const BUILD_LOCK_FILE: &str = "build.lock";

pub const INDEX_VERSION: u32 = 1;

/// One document's occurrences of a term.
///
/// The frequency is the number of positions; positions are strictly
/// increasing, so `freq() == positions().len()` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    doc_id: DocId,
    positions: Vec<Position>,
}

impl Posting {
    /// Create a posting, checking the position invariants
    pub fn new(doc_id: DocId, positions: Vec<Position>) -> Result<Self, String> {
        if positions.is_empty() {
            return Err(format!("posting for doc {} has no positions", doc_id));
        }
        if let Some(w) = positions.windows(2).find(|w| w[0] >= w[1]) {
            return Err(format!(
                "positions of doc {} not strictly increasing ({} then {})",
                doc_id, w[0], w[1]
            ));
        }
        Ok(Self { doc_id, positions })
    }

    #[inline]
    pub fn doc_id(&self) -> DocId {
        self.doc_id
    }

    /// Number of occurrences of the term in the document
    #[inline]
    pub fn freq(&self) -> u32 {
        self.positions.len() as u32
    }

    #[inline]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Stateless cursor over this posting's positions
    #[inline]
    pub fn cursor(&self) -> PositionsCursor<'_> {
        PositionsCursor::new(&self.positions)
    }
}

/// All postings of one term, strictly increasing by doc id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingsList {
    postings: Vec<Posting>,
}

impl PostingsList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from postings, checking doc id order
    pub fn from_postings(postings: Vec<Posting>) -> Result<Self, String> {
        if let Some(w) = postings.windows(2).find(|w| w[0].doc_id >= w[1].doc_id) {
            return Err(format!(
                "doc ids not strictly increasing ({} then {})",
                w[0].doc_id, w[1].doc_id
            ));
        }
        Ok(Self { postings })
    }

    /// Number of documents containing the term
    #[inline]
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Posting> {
        self.postings.iter()
    }

    pub fn as_slice(&self) -> &[Posting] {
        &self.postings
    }

    /// Posting of one document, if the term occurs in it
    pub fn get(&self, doc_id: DocId) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|i| &self.postings[i])
    }

    /// Sum of frequencies across all postings
    pub fn total_freq(&self) -> u64 {
        self.postings.iter().map(|p| p.freq() as u64).sum()
    }

    /// Doc ids of this list as a bitmap, for candidate intersection
    pub fn doc_ids(&self) -> RoaringBitmap {
        RoaringBitmap::from_sorted_iter(self.postings.iter().map(|p| p.doc_id))
            .unwrap_or_else(|_| self.postings.iter().map(|p| p.doc_id).collect())
    }
}

impl<'a> IntoIterator for &'a PostingsList {
    type Item = &'a Posting;
    type IntoIter = slice::Iter<'a, Posting>;

    fn into_iter(self) -> Self::IntoIter {
        self.postings.iter()
    }
}

/// A document handed to the builder: its path and its ordered terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: String,
    pub terms: Vec<String>,
}

impl SourceDocument {
    pub fn new(path: impl Into<String>, terms: Vec<String>) -> Self {
        Self {
            path: path.into(),
            terms,
        }
    }
}

/// Index metadata stored in meta.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub doc_count: u32,
    pub term_count: u32,
    pub total_postings: u64,
    #[serde(default)]
    pub skipped_documents: u32,
    pub created_at: u64,
}

impl Default for IndexMeta {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            doc_count: 0,
            term_count: 0,
            total_postings: 0,
            skipped_documents: 0,
            created_at: 0,
        }
    }
}
