//! Document records: the path and norm tables.

use crate::error::{IndexError, Result};
use crate::index::codec::parse_norm;
use crate::index::types::{DocId, NORMS_FILE, PATHS_FILE};
use std::fs;
use std::io;
use std::path::Path;

/// Path and norm of every document, indexed by doc id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentTable {
    paths: Vec<String>,
    norms: Vec<f64>,
}

impl DocumentTable {
    /// Create a table from parallel path and norm columns
    pub fn new(paths: Vec<String>, norms: Vec<f64>) -> Result<Self> {
        if paths.len() != norms.len() {
            return Err(IndexError::malformed(
                NORMS_FILE,
                "table length",
                format!("{} norms for {} paths", norms.len(), paths.len()),
            ));
        }
        Ok(Self { paths, norms })
    }

    /// Load `paths.txt` and `norms.txt` from an index directory
    pub fn load(index_path: &Path) -> Result<Self> {
        let paths_text = read_table(index_path, PATHS_FILE)?;
        let norms_text = read_table(index_path, NORMS_FILE)?;

        let paths: Vec<String> = paths_text
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();

        let norms = norms_text
            .lines()
            .enumerate()
            .map(|(i, line)| {
                parse_norm(line).map_err(|reason| {
                    IndexError::no_index(index_path, format!("{} line {}: {}", NORMS_FILE, i, reason))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if paths.len() != norms.len() {
            return Err(IndexError::no_index(
                index_path,
                format!(
                    "{} has {} entries but {} has {}",
                    PATHS_FILE,
                    paths.len(),
                    NORMS_FILE,
                    norms.len()
                ),
            ));
        }

        Ok(Self { paths, norms })
    }

    #[inline]
    pub fn num_docs(&self) -> usize {
        self.paths.len()
    }

    pub fn path(&self, doc_id: DocId) -> Result<&str> {
        self.paths
            .get(doc_id as usize)
            .map(String::as_str)
            .ok_or_else(|| IndexError::out_of_range("doc id", doc_id as u64, self.paths.len() as u64))
    }

    pub fn norm(&self, doc_id: DocId) -> Result<f64> {
        self.norms
            .get(doc_id as usize)
            .copied()
            .ok_or_else(|| IndexError::out_of_range("doc id", doc_id as u64, self.norms.len() as u64))
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn norms(&self) -> &[f64] {
        &self.norms
    }
}

/// Read one of the index's text tables, mapping absence to `NoIndex`
pub(crate) fn read_table(index_path: &Path, name: &str) -> Result<String> {
    match fs::read_to_string(index_path.join(name)) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(IndexError::no_index(index_path, format!("{} missing", name)))
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(IndexError::no_index(
            index_path,
            format!("{} is not valid UTF-8", name),
        )),
        Err(e) => Err(e.into()),
    }
}
