use crate::index::disk::DiskIndex;
use crate::index::reader::Index;
use anyhow::{Context, Result};
use std::path::Path;

/// Display index statistics
pub fn show_stats(index_path: &Path) -> Result<()> {
    let index = DiskIndex::open(index_path)
        .with_context(|| format!("Failed to open index at {}", index_path.display()))?;

    println!("Index Statistics");
    println!("================");
    println!();
    println!("Index location:   {}", index_path.display());
    println!("Document count:   {}", index.num_docs());
    println!("Term count:       {}", index.terms().len());

    match index.meta() {
        Some(meta) => {
            println!("Index version:    {}", meta.version);
            println!("Postings:         {}", meta.total_postings);
            println!("Skipped docs:     {}", meta.skipped_documents);
            println!("Created:          {}", format_timestamp(meta.created_at));
        }
        None => println!("Metadata:         none (no meta.json)"),
    }

    if let Ok(size) = dir_size(index_path) {
        println!();
        println!("Index size:       {}", format_size(size));
    }

    Ok(())
}

/// Calculate directory size recursively
fn dir_size(path: &Path) -> std::io::Result<u64> {
    let mut size = 0;
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                size += entry.metadata()?.len();
            } else if path.is_dir() {
                size += dir_size(&path)?;
            }
        }
    }
    Ok(size)
}

/// Format byte size to human readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Unix timestamp with its age in days
fn format_timestamp(ts: u64) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(ts);
    let days = now.saturating_sub(ts) / 86_400;
    format!("{} ({} days ago)", ts, days)
}
