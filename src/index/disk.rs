use crate::error::{IndexError, Result};
use crate::index::codec::{decode_postings, line_at};
use crate::index::docs::DocumentTable;
use crate::index::reader::{check_doc_bounds, Index, IndexTables};
use crate::index::types::*;
use crate::utils::IndexConfig;
use ahash::AHashMap;
use lru::LruCache;
use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Index that keeps only the dictionary in memory.
///
/// The postings store is mapped read-only; a lookup slices the mapping at the
/// term's dictionary offset and decodes that single line. There is no shared
/// seek position, so concurrent lookups need no locking. The optional cache
/// lock is held only around get/put, never while decoding.
pub struct DiskIndex {
    index_path: PathBuf,
    dictionary: AHashMap<String, u64>,
    /// `None` when the postings store is empty (an empty file cannot be mapped)
    postings: Option<Mmap>,
    docs: DocumentTable,
    meta: Option<IndexMeta>,
    cache: Option<Mutex<LruCache<String, Arc<PostingsList>>>>,
}

impl DiskIndex {
    /// Open an index directory without a postings cache
    pub fn open(index_path: &Path) -> Result<Self> {
        Self::open_with_config(index_path, &IndexConfig::default())
    }

    pub fn open_with_config(index_path: &Path, config: &IndexConfig) -> Result<Self> {
        let IndexTables {
            dictionary,
            docs,
            meta,
        } = IndexTables::load(index_path)?;

        let file = match File::open(index_path.join(POSTINGS_FILE)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IndexError::no_index(
                    index_path,
                    format!("{} missing", POSTINGS_FILE),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        let postings = if file.metadata()?.len() == 0 {
            None
        } else {
            // SAFETY: the store is opened read-only and never modified while
            // an index is loaded
            Some(unsafe { Mmap::map(&file)? })
        };

        let postings_len = postings.as_ref().map(|m| m.len()).unwrap_or(0) as u64;
        if let Some((term, offset)) = dictionary.iter().find(|(_, offset)| *offset >= postings_len) {
            debug!(term = %term, offset, "dictionary offset beyond postings store");
            return Err(IndexError::out_of_range("postings offset", *offset, postings_len));
        }

        let cache = NonZeroUsize::new(config.postings_cache_capacity)
            .map(|capacity| Mutex::new(LruCache::new(capacity)));

        info!(
            path = %index_path.display(),
            docs = docs.num_docs(),
            terms = dictionary.len(),
            cached = cache.is_some(),
            "opened disk index"
        );

        Ok(Self {
            index_path: index_path.to_path_buf(),
            dictionary: dictionary.into_iter().collect(),
            postings,
            docs,
            meta,
            cache,
        })
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Byte offset of a term's postings line
    pub fn offset(&self, term: &str) -> Option<u64> {
        self.dictionary.get(term).copied()
    }

    fn decode_at(&self, term: &str, offset: u64) -> Result<PostingsList> {
        let data = self.postings.as_deref().unwrap_or(&[]);
        let line = line_at(data, offset)
            .ok_or_else(|| IndexError::out_of_range("postings offset", offset, data.len() as u64))?;
        let list = decode_postings(line)
            .and_then(|list| check_doc_bounds(&list, self.docs.num_docs()).map(|_| list))
            .map_err(|reason| {
                IndexError::malformed(POSTINGS_FILE, format!("term {:?} @ {}", term, offset), reason)
            })?;
        Ok(list)
    }

    fn cached(&self, term: &str) -> Option<Arc<PostingsList>> {
        let cache = self.cache.as_ref()?;
        let mut guard = cache.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(term).cloned()
    }

    fn remember(&self, term: &str, list: &Arc<PostingsList>) {
        if let Some(cache) = &self.cache {
            let mut guard = cache.lock().unwrap_or_else(|e| e.into_inner());
            guard.put(term.to_string(), Arc::clone(list));
        }
    }
}

impl Index for DiskIndex {
    fn num_docs(&self) -> usize {
        self.docs.num_docs()
    }

    fn postings(&self, term: &str) -> Result<Arc<PostingsList>> {
        let Some(offset) = self.offset(term) else {
            return Ok(Arc::default());
        };
        if let Some(list) = self.cached(term) {
            return Ok(list);
        }
        let list = Arc::new(self.decode_at(term, offset)?);
        self.remember(term, &list);
        Ok(list)
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
