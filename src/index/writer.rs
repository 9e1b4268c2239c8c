use crate::error::Result;
use crate::index::codec::{encode_postings, format_dictionary_line};
use crate::index::docs::DocumentTable;
use crate::index::types::*;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes the persisted index layout into one directory.
///
/// `build.lock` is created before any table is touched and removed only
/// after `meta.json` is in place; the loader refuses a directory that still
/// carries it, so tables from two different builds are never read together.
/// Every table goes to a `.tmp` sibling first and is renamed into place once
/// flushed.
pub struct IndexWriter {
    index_path: PathBuf,
}

impl IndexWriter {
    /// Create the destination directory if needed
    pub fn new(index_path: &Path) -> Result<Self> {
        fs::create_dir_all(index_path)?;
        Ok(Self {
            index_path: index_path.to_path_buf(),
        })
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Write dictionary, postings, paths and norms, then `meta.json`.
    ///
    /// `postings` must yield terms in ascending byte order; offsets in the
    /// dictionary are byte offsets of each term's line in the postings store.
    pub fn write<'a>(
        &self,
        postings: impl IntoIterator<Item = (&'a str, &'a PostingsList)>,
        docs: &DocumentTable,
        meta: &IndexMeta,
    ) -> Result<()> {
        let lock_path = self.index_path.join(BUILD_LOCK_FILE);
        File::create(&lock_path)?.sync_all()?;

        match fs::remove_file(self.index_path.join(META_FILE)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        self.write_postings(postings)?;
        self.write_paths(docs)?;
        self.write_norms(docs)?;

        for name in [POSTINGS_FILE, DICTIONARY_FILE, PATHS_FILE, NORMS_FILE] {
            fs::rename(self.tmp_path(name), self.index_path.join(name))?;
        }

        self.write_meta(meta)?;
        fs::remove_file(lock_path)?;
        Ok(())
    }

    fn tmp_path(&self, name: &str) -> PathBuf {
        self.index_path.join(format!("{}.tmp", name))
    }

    /// Write postings store and dictionary together
    fn write_postings<'a>(
        &self,
        postings: impl IntoIterator<Item = (&'a str, &'a PostingsList)>,
    ) -> Result<()> {
        let mut dict_file = BufWriter::new(File::create(self.tmp_path(DICTIONARY_FILE))?);
        let mut postings_file = BufWriter::new(File::create(self.tmp_path(POSTINGS_FILE))?);

        let mut offset: u64 = 0;
        let mut line = String::new();
        let mut terms = 0usize;

        for (term, list) in postings {
            line.clear();
            encode_postings(list, &mut line);
            line.push('\n');

            writeln!(dict_file, "{}", format_dictionary_line(term, offset))?;
            postings_file.write_all(line.as_bytes())?;
            offset += line.len() as u64;
            terms += 1;
        }

        dict_file.flush()?;
        postings_file.flush()?;
        debug!(terms, bytes = offset, "wrote postings store");
        Ok(())
    }

    fn write_paths(&self, docs: &DocumentTable) -> Result<()> {
        let mut file = BufWriter::new(File::create(self.tmp_path(PATHS_FILE))?);
        for path in docs.paths() {
            writeln!(file, "{}", path)?;
        }
        file.flush()?;
        Ok(())
    }

    fn write_norms(&self, docs: &DocumentTable) -> Result<()> {
        let mut file = BufWriter::new(File::create(self.tmp_path(NORMS_FILE))?);
        for norm in docs.norms() {
            // Debug formatting of f64 round-trips exactly
            writeln!(file, "{:?}", norm)?;
        }
        file.flush()?;
        Ok(())
    }

    fn write_meta(&self, meta: &IndexMeta) -> Result<()> {
        let tmp = self.tmp_path(META_FILE);
        let mut file = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut file, meta)?;
        file.flush()?;
        drop(file);
        fs::rename(tmp, self.index_path.join(META_FILE))?;
        Ok(())
    }
}
