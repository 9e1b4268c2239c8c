//! Plain-text document collection on disk.

use crate::index::types::SourceDocument;
use crate::utils::config::BuildConfig;
use crate::utils::tokenizer::tokenize;
use anyhow::{bail, Context, Result};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

/// Files found under a collection root
#[derive(Debug, Default)]
pub struct CollectionFiles {
    /// Indexable files, sorted by path
    pub files: Vec<PathBuf>,
    /// Entries the walk could not read, such as unreadable directories
    pub errors: Vec<ignore::Error>,
}

/// Find every indexable file under `root`, sorted by path.
///
/// Hidden and git-ignored files are skipped. Sorting makes doc ids
/// deterministic across runs. Walk failures below the root are returned
/// with the files rather than aborting the walk.
pub fn discover_files(root: &Path) -> Result<CollectionFiles> {
    if !root.is_dir() {
        bail!("Collection directory not found: {}", root.display());
    }

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .build();

    Ok(collect_entries(walker.map(|entry| {
        entry.map(|entry| {
            let is_file = entry.file_type().is_some_and(|t| t.is_file());
            is_file.then(|| entry.into_path())
        })
    })))
}

fn collect_entries<I>(entries: I) -> CollectionFiles
where
    I: IntoIterator<Item = std::result::Result<Option<PathBuf>, ignore::Error>>,
{
    let mut found = CollectionFiles::default();
    for entry in entries {
        match entry {
            Ok(Some(path)) => found.files.push(path),
            Ok(None) => {}
            Err(e) => found.errors.push(e),
        }
    }
    found.files.sort();
    found
}

/// Read and tokenize one file.
///
/// The document path is `full_path` relative to `root`, `/`-separated.
/// Oversized, binary and non-UTF-8 files are errors; the builder skips them.
pub fn read_document(root: &Path, full_path: &Path, config: &BuildConfig) -> Result<SourceDocument> {
    let rel_path = full_path.strip_prefix(root).unwrap_or(full_path);
    let path = rel_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let size = full_path
        .metadata()
        .with_context(|| format!("Failed to stat {}", full_path.display()))?
        .len();
    if size > config.max_file_size {
        bail!("{} is {} bytes, over the {} byte limit", path, size, config.max_file_size);
    }

    let content = fs::read(full_path).with_context(|| format!("Failed to read {}", full_path.display()))?;
    if is_binary(&content) {
        bail!("{} looks like a binary file", path);
    }
    let text = String::from_utf8(content).with_context(|| format!("{} is not valid UTF-8", path))?;

    Ok(SourceDocument::new(path, tokenize(&text)))
}

/// Check if content is likely binary
pub fn is_binary(content: &[u8]) -> bool {
    let sample_size = content.len().min(8192);
    let sample = &content[..sample_size];

    if sample.contains(&0) {
        return true;
    }

    let non_text_count = sample
        .iter()
        .filter(|&&b| b < 0x20 && b != b'\n' && b != b'\r' && b != b'\t' && b != 0x0c)
        .count();

    non_text_count > sample_size / 8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tempfile::tempdir;

    #[test]
    fn test_discover_sorted_and_skips_hidden() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("sub/c.txt"), "c").unwrap();
        fs::write(dir.path().join(".hidden"), "h").unwrap();

        let found = discover_files(dir.path()).unwrap();
        assert!(found.errors.is_empty());
        let names: Vec<_> = found
            .files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b.txt"),
                PathBuf::from("sub").join("c.txt")
            ]
        );
    }

    #[test]
    fn test_read_document() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let file = dir.path().join("sub/doc.txt");
        fs::write(&file, "Sleep, sleep SOUNDLY.").unwrap();

        let doc = read_document(dir.path(), &file, &BuildConfig::default()).unwrap();
        assert_eq!(doc.path, "sub/doc.txt");
        assert_eq!(doc.terms, vec!["sleep", "sleep", "soundly"]);
    }

    #[test]
    fn test_read_document_rejects_oversized_and_binary() {
        let dir = tempdir().unwrap();
        let big = dir.path().join("big.txt");
        fs::write(&big, "words words words").unwrap();
        let config = BuildConfig {
            max_file_size: 4,
            ..BuildConfig::default()
        };
        assert!(read_document(dir.path(), &big, &config).is_err());

        let bin = dir.path().join("blob.bin");
        fs::write(&bin, [0u8, 1, 2, 3, 0, 0]).unwrap();
        assert!(read_document(dir.path(), &bin, &BuildConfig::default()).is_err());
    }

    #[test]
    fn test_walk_errors_are_kept() {
        let denied = ignore::Error::WithPath {
            path: PathBuf::from("locked"),
            err: Box::new(ignore::Error::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "denied",
            ))),
        };
        let found = collect_entries(vec![
            Ok(Some(PathBuf::from("b.txt"))),
            Err(denied),
            Ok(None),
            Ok(Some(PathBuf::from("a.txt"))),
        ]);

        assert_eq!(found.files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert_eq!(found.errors.len(), 1);
        assert!(found.errors[0].to_string().contains("locked"));
    }

    #[test]
    fn test_missing_collection() {
        let dir = tempdir().unwrap();
        assert!(discover_files(&dir.path().join("nope")).is_err());
    }
}
