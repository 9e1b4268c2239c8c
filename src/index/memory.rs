use crate::error::{IndexError, Result};
use crate::index::codec::{decode_postings, line_at};
use crate::index::docs::DocumentTable;
use crate::index::reader::{check_doc_bounds, Index, IndexTables};
use crate::index::types::*;
use ahash::AHashMap;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Index with every postings list decoded at load time
pub struct MemoryIndex {
    index_path: PathBuf,
    dictionary: AHashMap<String, Arc<PostingsList>>,
    docs: DocumentTable,
    meta: Option<IndexMeta>,
}

impl MemoryIndex {
    /// Load an index directory, decoding all postings lines in parallel
    pub fn open(index_path: &Path) -> Result<Self> {
        let IndexTables {
            dictionary,
            docs,
            meta,
        } = IndexTables::load(index_path)?;

        let data = match fs::read(index_path.join(POSTINGS_FILE)) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IndexError::no_index(
                    index_path,
                    format!("{} missing", POSTINGS_FILE),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let num_docs = docs.num_docs();
        let decoded = dictionary
            .into_par_iter()
            .map(|(term, offset)| -> Result<(String, Arc<PostingsList>)> {
                let line = line_at(&data, offset).ok_or_else(|| {
                    IndexError::out_of_range("postings offset", offset, data.len() as u64)
                })?;
                let list = decode_postings(line)
                    .and_then(|list| check_doc_bounds(&list, num_docs).map(|_| list))
                    .map_err(|reason| {
                        IndexError::malformed(POSTINGS_FILE, format!("term {:?}", term), reason)
                    })?;
                Ok((term, Arc::new(list)))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .collect::<AHashMap<_, _>>();

        info!(
            path = %index_path.display(),
            docs = num_docs,
            terms = decoded.len(),
            "loaded in-memory index"
        );

        Ok(Self {
            index_path: index_path.to_path_buf(),
            dictionary: decoded,
            docs,
            meta,
        })
    }

    /// Assemble an index from already-decoded parts
    pub fn from_parts(
        postings: impl IntoIterator<Item = (String, PostingsList)>,
        docs: DocumentTable,
    ) -> Result<Self> {
        let mut dictionary = AHashMap::new();
        for (term, list) in postings {
            check_doc_bounds(&list, docs.num_docs()).map_err(|reason| {
                IndexError::malformed(POSTINGS_FILE, format!("term {:?}", term), reason)
            })?;
            dictionary.insert(term, Arc::new(list));
        }
        Ok(Self {
            index_path: PathBuf::new(),
            dictionary,
            docs,
            meta: None,
        })
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }
}

impl Index for MemoryIndex {
    fn num_docs(&self) -> usize {
        self.docs.num_docs()
    }

    fn postings(&self, term: &str) -> Result<Arc<PostingsList>> {
        Ok(self
            .dictionary
            .get(term)
            .cloned()
            .unwrap_or_default())
    }

    fn doc_path(&self, doc_id: DocId) -> Result<&str> {
        self.docs.path(doc_id)
    }

    fn doc_norm(&self, doc_id: DocId) -> Result<f64> {
        self.docs.norm(doc_id)
    }

    fn terms(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = self.dictionary.keys().map(String::as_str).collect();
        terms.sort_unstable();
        terms
    }

    fn meta(&self) -> Option<&IndexMeta> {
        self.meta.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn posting(doc: DocId, positions: &[Position]) -> Posting {
        Posting::new(doc, positions.to_vec()).unwrap()
    }

    #[test]
    fn test_from_parts_statistics() {
        let docs = DocumentTable::new(vec!["x".into(), "y".into()], vec![1.0, 1.0]).unwrap();
        let list = PostingsList::from_postings(vec![posting(0, &[0, 3]), posting(1, &[2])]).unwrap();
        let index = MemoryIndex::from_parts([("sleep".to_string(), list)], docs).unwrap();

        assert_eq!(index.doc_freq("sleep").unwrap(), 2);
        assert_eq!(index.total_freq("sleep").unwrap(), 3);
        assert_eq!(index.term_freq("sleep", 0).unwrap(), 2);
        assert_eq!(index.doc_freq("awake").unwrap(), 0);
        assert_eq!(index.total_freq("awake").unwrap(), 0);
        assert!(index.postings("awake").unwrap().is_empty());
        assert!(matches!(
            index.term_freq("sleep", 2),
            Err(IndexError::OutOfRange { .. })
        ));
        assert_eq!(index.terms(), vec!["sleep"]);
    }

    #[test]
    fn test_from_parts_rejects_unknown_doc() {
        let docs = DocumentTable::new(vec!["x".into()], vec![1.0]).unwrap();
        let list = PostingsList::from_postings(vec![posting(3, &[0])]).unwrap();
        assert!(MemoryIndex::from_parts([("a".to_string(), list)], docs).is_err());
    }

    #[test]
    fn test_open_rejects_bad_offset() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(DICTIONARY_FILE), "a 100\n").unwrap();
        fs::write(dir.path().join(POSTINGS_FILE), "0:1:0\n").unwrap();
        fs::write(dir.path().join(PATHS_FILE), "d0\n").unwrap();
        fs::write(dir.path().join(NORMS_FILE), "1\n").unwrap();
        assert!(matches!(
            MemoryIndex::open(dir.path()),
            Err(IndexError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_open_rejects_malformed_postings() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(DICTIONARY_FILE), "a 0\n").unwrap();
        fs::write(dir.path().join(POSTINGS_FILE), "0:2:0\n").unwrap();
        fs::write(dir.path().join(PATHS_FILE), "d0\n").unwrap();
        fs::write(dir.path().join(NORMS_FILE), "1\n").unwrap();
        assert!(matches!(
            MemoryIndex::open(dir.path()),
            Err(IndexError::MalformedRecord { file: POSTINGS_FILE, .. })
        ));
    }
}
