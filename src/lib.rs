//! # proxima - positional index with proximity ranking
//!
//! proxima builds a positional inverted index over a document collection and
//! ranks documents by how tightly the query terms cluster in them.
//!
//! ## Architecture
//!
//! - [`index`] - Building, persisting and loading the index (in-memory or
//!   lazily decoded from disk)
//! - [`query`] - Query parsing, minimal-window scoring and top-K ranking
//! - [`output`] - Terminal rendering of rankings and postings
//! - [`utils`] - Configuration, collection reading, tokenization
//! - [`error`] - The [`IndexError`](error::IndexError) taxonomy
//!
//! ## Quick Start
//!
//! ```no_run
//! use proxima::index::{build_index, open_index, Index, IndexKind, SourceDocument};
//! use proxima::query::ProximityEngine;
//! use proxima::utils::{tokenize, IndexConfig};
//! use std::path::Path;
//!
//! let docs = vec![
//!     Ok::<_, std::io::Error>(SourceDocument::new("d0", tokenize("to be or not to be"))),
//!     Ok(SourceDocument::new("d1", tokenize("not to sleep"))),
//! ];
//! build_index(docs, Path::new("/tmp/idx")).unwrap();
//!
//! let index = open_index(Path::new("/tmp/idx"), IndexKind::Disk, &IndexConfig::default()).unwrap();
//! let engine = ProximityEngine::new(index.as_ref());
//!
//! for hit in engine.search("\"to be\"", 10).unwrap() {
//!     println!("{:.3} {}", hit.score, index.doc_path(hit.doc_id).unwrap());
//! }
//! ```
//!
//! ## Storage
//!
//! An index directory holds `dictionary.txt` (term and byte offset),
//! `postings.txt` (one `doc:freq:pos,...;...` line per term), `paths.txt`,
//! `norms.txt` and an optional `meta.json`. The disk variant maps
//! `postings.txt` and decodes a term's line only when it is queried.

pub mod error;
pub mod index;
pub mod output;
pub mod query;
pub mod utils;
