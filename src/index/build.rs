use crate::error::{IndexError, Result};
use crate::index::docs::DocumentTable;
use crate::index::types::*;
use crate::index::writer::IndexWriter;
use crate::utils::progress::{ProgressBar, ProgressStyle};
use crate::utils::{discover_files, read_document, BuildConfig, CollectionFiles};
use ahash::AHashMap;
use anyhow::Context;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::mem;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Outcome of a completed build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub index_path: PathBuf,
    /// Documents assigned a doc id
    pub documents: usize,
    /// Distinct terms written to the dictionary
    pub terms: usize,
    /// Postings written across all terms
    pub postings: u64,
    /// Documents that failed and were left out
    pub skipped: usize,
}

/// Accumulates positional postings for a stream of documents.
///
/// Doc ids are assigned in encounter order. A document whose path was already
/// added replaces the earlier one under the same doc id.
#[derive(Default)]
pub struct IndexBuilder {
    path_ids: AHashMap<String, DocId>,
    paths: Vec<String>,
    norms: Vec<f64>,
    /// Distinct terms of each document, to drop its postings on replacement
    doc_terms: Vec<Vec<String>>,
    postings: BTreeMap<String, BTreeMap<DocId, Vec<Position>>>,
    skipped: usize,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents assigned a doc id so far
    pub fn num_docs(&self) -> usize {
        self.paths.len()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Add one document, returning its doc id.
    ///
    /// Returns `None` (and counts the document as skipped) when the path is
    /// empty or spans lines, since the path table stores one path per line.
    /// Empty terms and terms containing whitespace are not indexed but still
    /// occupy their position.
    pub fn add_document(&mut self, doc: SourceDocument) -> Option<DocId> {
        if doc.path.is_empty() || doc.path.contains(['\n', '\r']) {
            self.skip_document(format_args!("unusable document path {:?}", doc.path));
            return None;
        }

        let doc_id = match self.path_ids.get(&doc.path) {
            Some(&doc_id) => {
                debug!(path = %doc.path, doc_id, "replacing document");
                self.remove_postings(doc_id);
                doc_id
            }
            None => {
                let Ok(doc_id) = DocId::try_from(self.paths.len()) else {
                    self.skip_document(format_args!("doc id space exhausted at {}", doc.path));
                    return None;
                };
                self.paths.push(doc.path.clone());
                self.norms.push(0.0);
                self.doc_terms.push(Vec::new());
                self.path_ids.insert(doc.path.clone(), doc_id);
                doc_id
            }
        };

        let mut occurrences: AHashMap<&str, Vec<Position>> = AHashMap::new();
        for (i, term) in doc.terms.iter().enumerate() {
            if term.is_empty() || term.contains(char::is_whitespace) {
                continue;
            }
            let Ok(position) = Position::try_from(i) else {
                warn!(path = %doc.path, "document truncated at maximum position");
                break;
            };
            occurrences.entry(term.as_str()).or_default().push(position);
        }

        let norm = occurrences
            .values()
            .map(|positions| (positions.len() as f64).powi(2))
            .sum::<f64>()
            .sqrt();

        let mut distinct = Vec::with_capacity(occurrences.len());
        for (term, positions) in occurrences {
            self.postings
                .entry(term.to_string())
                .or_default()
                .insert(doc_id, positions);
            distinct.push(term.to_string());
        }

        let slot = doc_id as usize;
        self.norms[slot] = norm;
        self.doc_terms[slot] = distinct;
        Some(doc_id)
    }

    /// Record a document that could not be read or tokenized
    pub fn skip_document(&mut self, reason: impl Display) {
        warn!(reason = %reason, "skipping document");
        self.skipped += 1;
    }

    fn remove_postings(&mut self, doc_id: DocId) {
        for term in mem::take(&mut self.doc_terms[doc_id as usize]) {
            if let Some(docs) = self.postings.get_mut(&term) {
                docs.remove(&doc_id);
                if docs.is_empty() {
                    self.postings.remove(&term);
                }
            }
        }
    }

    /// Write the accumulated index into `destination`
    pub fn finish(self, destination: &Path) -> Result<BuildSummary> {
        let mut lists = Vec::with_capacity(self.postings.len());
        let mut total_postings = 0u64;

        for (term, docs) in self.postings {
            let list = docs
                .into_iter()
                .map(|(doc_id, positions)| Posting::new(doc_id, positions))
                .collect::<std::result::Result<Vec<_>, _>>()
                .and_then(PostingsList::from_postings)
                .map_err(|reason| IndexError::malformed(POSTINGS_FILE, format!("term {:?}", term), reason))?;
            total_postings += list.len() as u64;
            lists.push((term, list));
        }

        let docs = DocumentTable::new(self.paths, self.norms)?;
        let meta = IndexMeta {
            version: INDEX_VERSION,
            doc_count: docs.num_docs() as u32,
            term_count: u32::try_from(lists.len()).unwrap_or(u32::MAX),
            total_postings,
            skipped_documents: u32::try_from(self.skipped).unwrap_or(u32::MAX),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };

        let writer = IndexWriter::new(destination)?;
        writer.write(
            lists.iter().map(|(term, list)| (term.as_str(), list)),
            &docs,
            &meta,
        )?;

        let summary = BuildSummary {
            index_path: destination.to_path_buf(),
            documents: docs.num_docs(),
            terms: lists.len(),
            postings: total_postings,
            skipped: self.skipped,
        };
        info!(
            path = %destination.display(),
            documents = summary.documents,
            terms = summary.terms,
            postings = summary.postings,
            skipped = summary.skipped,
            "index written"
        );
        Ok(summary)
    }
}

/// Build an index from a stream of documents.
///
/// An `Err` item stands for a document that could not be produced; it is
/// logged, counted and skipped. Failures writing `destination` are fatal.
pub fn build_index<I, E>(documents: I, destination: &Path) -> Result<BuildSummary>
where
    I: IntoIterator<Item = std::result::Result<SourceDocument, E>>,
    E: Display,
{
    let mut builder = IndexBuilder::new();
    for document in documents {
        match document {
            Ok(doc) => {
                builder.add_document(doc);
            }
            Err(e) => builder.skip_document(e),
        }
    }
    builder.finish(destination)
}

/// Build an index from every text file under `collection`.
///
/// Files are read and tokenized in parallel, one chunk at a time, and fed to
/// the builder in path order so doc ids do not depend on scheduling.
pub fn build_from_directory(
    collection: &Path,
    destination: &Path,
    config: &BuildConfig,
) -> anyhow::Result<BuildSummary> {
    let start = Instant::now();
    let CollectionFiles { files, errors } = discover_files(collection)?;
    info!(
        collection = %collection.display(),
        files = files.len(),
        walk_errors = errors.len(),
        "indexing collection"
    );

    let mut builder = IndexBuilder::new();
    for error in errors {
        builder.skip_document(format_args!("walk error: {}", error));
    }

    let progress_bar = if config.progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .map(|style| style.progress_chars("█▓▒░  "))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Indexing documents...");
        pb
    } else {
        ProgressBar::hidden()
    };

    for chunk in files.chunks(config.chunk_size.max(1)) {
        let documents: Vec<_> = chunk
            .par_iter()
            .map(|path| {
                let document = read_document(collection, path, config);
                progress_bar.inc(1);
                document
            })
            .collect();

        for document in documents {
            match document {
                Ok(doc) => {
                    builder.add_document(doc);
                }
                Err(e) => builder.skip_document(format!("{:#}", e)),
            }
        }
    }

    progress_bar.finish_with_message(format!(
        "Indexed {} documents ({} skipped)",
        builder.num_docs(),
        builder.skipped()
    ));

    let summary = builder
        .finish(destination)
        .with_context(|| format!("Failed to write index to {}", destination.display()))?;
    debug!(elapsed_ms = start.elapsed().as_millis() as u64, "build finished");
    Ok(summary)
}
