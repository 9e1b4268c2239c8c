use crate::error::{IndexError, Result};
use crate::index::codec::parse_dictionary_line;
use crate::index::disk::DiskIndex;
use crate::index::docs::{read_table, DocumentTable};
use crate::index::memory::MemoryIndex;
use crate::index::types::*;
use crate::utils::IndexConfig;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Read-only access to a loaded index.
///
/// Both storage strategies implement this contract; a loaded index is never
/// mutated and can be shared across threads.
pub trait Index: Send + Sync {
    /// Number of documents in the collection
    fn num_docs(&self) -> usize;

    /// Postings of `term`; an empty list when the term is not indexed
    fn postings(&self, term: &str) -> Result<Arc<PostingsList>>;

    /// Path of a document
    fn doc_path(&self, doc_id: DocId) -> Result<&str>;

    /// Norm of a document
    fn doc_norm(&self, doc_id: DocId) -> Result<f64>;

    /// All dictionary terms in ascending order
    fn terms(&self) -> Vec<&str>;

    /// Build metadata, when the index carries a meta.json
    fn meta(&self) -> Option<&IndexMeta>;

    /// Number of documents containing `term`
    fn doc_freq(&self, term: &str) -> Result<usize> {
        Ok(self.postings(term)?.len())
    }

    /// Total occurrences of `term` across the collection
    fn total_freq(&self, term: &str) -> Result<u64> {
        Ok(self.postings(term)?.total_freq())
    }

    /// Occurrences of `term` in one document
    fn term_freq(&self, term: &str, doc_id: DocId) -> Result<u32> {
        if doc_id as usize >= self.num_docs() {
            return Err(IndexError::out_of_range(
                "doc id",
                doc_id as u64,
                self.num_docs() as u64,
            ));
        }
        Ok(self
            .postings(term)?
            .get(doc_id)
            .map(|p| p.freq())
            .unwrap_or(0))
    }
}

/// Storage strategy chosen when an index is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Decode every postings line at load time
    Memory,
    /// Decode a term's postings line on demand
    #[default]
    Disk,
}

/// Open the index at `index_path` with the requested strategy
pub fn open_index(index_path: &Path, kind: IndexKind, config: &IndexConfig) -> Result<Box<dyn Index>> {
    Ok(match kind {
        IndexKind::Memory => Box::new(MemoryIndex::open(index_path)?),
        IndexKind::Disk => Box::new(DiskIndex::open_with_config(index_path, config)?),
    })
}

/// Tables shared by both strategies
pub(crate) struct IndexTables {
    pub dictionary: Vec<(String, u64)>,
    pub docs: DocumentTable,
    pub meta: Option<IndexMeta>,
}

impl IndexTables {
    /// Load dictionary, document table and metadata from an index directory
    pub fn load(index_path: &Path) -> Result<Self> {
        if !index_path.is_dir() {
            return Err(IndexError::no_index(index_path, "index directory not found"));
        }
        if index_path.join(BUILD_LOCK_FILE).exists() {
            return Err(IndexError::no_index(
                index_path,
                format!("{} present: a build did not complete", BUILD_LOCK_FILE),
            ));
        }

        let dictionary = read_dictionary(index_path)?;
        let docs = DocumentTable::load(index_path)?;
        let meta = read_meta(index_path)?;

        if let Some(meta) = &meta {
            if meta.doc_count as usize != docs.num_docs() {
                return Err(IndexError::no_index(
                    index_path,
                    format!(
                        "{} records {} documents but {} lists {}",
                        META_FILE,
                        meta.doc_count,
                        PATHS_FILE,
                        docs.num_docs()
                    ),
                ));
            }
        }

        Ok(Self {
            dictionary,
            docs,
            meta,
        })
    }
}

/// Read dictionary.txt into (term, offset) pairs
fn read_dictionary(index_path: &Path) -> Result<Vec<(String, u64)>> {
    let text = read_table(index_path, DICTIONARY_FILE)?;
    let mut seen = AHashSet::new();
    let mut entries = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let (term, offset) = parse_dictionary_line(line)
            .map_err(|reason| IndexError::malformed(DICTIONARY_FILE, format!("line {}", i), reason))?;
        if !seen.insert(term) {
            return Err(IndexError::malformed(
                DICTIONARY_FILE,
                format!("line {}", i),
                format!("duplicate term {:?}", term),
            ));
        }
        entries.push((term.to_string(), offset));
    }

    Ok(entries)
}

/// Read meta.json when present
fn read_meta(index_path: &Path) -> Result<Option<IndexMeta>> {
    let file = match File::open(index_path.join(META_FILE)) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(IndexError::no_index(index_path, format!("{}: {}", META_FILE, e))),
    };
    let meta: IndexMeta = serde_json::from_reader(io::BufReader::new(file))
        .map_err(|e| IndexError::no_index(index_path, format!("{}: {}", META_FILE, e)))?;
    if meta.version != INDEX_VERSION {
        return Err(IndexError::no_index(
            index_path,
            format!("unsupported index version {}", meta.version),
        ));
    }
    Ok(Some(meta))
}

/// Check that a decoded list only refers to existing documents
pub(crate) fn check_doc_bounds(list: &PostingsList, num_docs: usize) -> std::result::Result<(), String> {
    match list.iter().last() {
        Some(last) if last.doc_id() as usize >= num_docs => Err(format!(
            "doc id {} beyond the {} indexed documents",
            last.doc_id(),
            num_docs
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_index(dir: &Path, dictionary: &str, postings: &str) {
        fs::write(dir.join(DICTIONARY_FILE), dictionary).unwrap();
        fs::write(dir.join(POSTINGS_FILE), postings).unwrap();
        fs::write(dir.join(PATHS_FILE), "d0\nd1\n").unwrap();
        fs::write(dir.join(NORMS_FILE), "1\n1\n").unwrap();
    }

    #[test]
    fn test_missing_directory_is_no_index() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        for kind in [IndexKind::Memory, IndexKind::Disk] {
            let err = open_index(&missing, kind, &IndexConfig::default()).err().unwrap();
            assert!(matches!(err, IndexError::NoIndex { .. }), "{:?}", kind);
        }
    }

    #[test]
    fn test_missing_dictionary_is_no_index() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PATHS_FILE), "d0\n").unwrap();
        fs::write(dir.path().join(NORMS_FILE), "1\n").unwrap();
        let err = IndexTables::load(dir.path()).err().unwrap();
        assert!(err.to_string().contains("dictionary.txt missing"));
    }

    #[test]
    fn test_malformed_dictionary_propagates() {
        let dir = tempdir().unwrap();
        write_index(dir.path(), "a 0\nb\n", "0:1:0\n");
        let err = IndexTables::load(dir.path()).err().unwrap();
        assert!(matches!(err, IndexError::MalformedRecord { file: DICTIONARY_FILE, .. }));
    }

    #[test]
    fn test_duplicate_dictionary_term() {
        let dir = tempdir().unwrap();
        write_index(dir.path(), "a 0\na 6\n", "0:1:0\n1:1:0\n");
        assert!(matches!(
            IndexTables::load(dir.path()),
            Err(IndexError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_meta_doc_count_mismatch() {
        let dir = tempdir().unwrap();
        write_index(dir.path(), "a 0\n", "0:1:0\n");
        let meta = IndexMeta {
            doc_count: 5,
            ..IndexMeta::default()
        };
        fs::write(dir.path().join(META_FILE), serde_json::to_string(&meta).unwrap()).unwrap();
        assert!(matches!(
            IndexTables::load(dir.path()),
            Err(IndexError::NoIndex { .. })
        ));
    }

    #[test]
    fn test_build_lock_is_no_index() {
        let dir = tempdir().unwrap();
        write_index(dir.path(), "a 0\n", "0:1:0\n");
        assert!(IndexTables::load(dir.path()).is_ok());

        fs::write(dir.path().join(BUILD_LOCK_FILE), "").unwrap();
        let err = IndexTables::load(dir.path()).err().unwrap();
        assert!(matches!(err, IndexError::NoIndex { .. }));
        assert!(err.to_string().contains("build did not complete"));
    }

    #[test]
    fn test_index_kind_serde() {
        assert_eq!(serde_json::to_string(&IndexKind::Memory).unwrap(), "\"memory\"");
        let kind: IndexKind = serde_json::from_str("\"disk\"").unwrap();
        assert_eq!(kind, IndexKind::Disk);
    }
}
