//! Line grammars of the persisted index.
//!
//! ```text
//! dictionary.txt   <term> <byte-offset>
//! postings.txt     doc:freq:pos1,pos2,...;doc:freq:pos1,...
//! paths.txt        <path>
//! norms.txt        <float>
//! ```
//!
//! Decoders return a plain `String` reason; callers attach the file and
//! record so the error can say where the bad data lives.

use crate::index::types::{DocId, Position, Posting, PostingsList};
use memchr::memchr;
use std::fmt::Write;

/// Append the postings line for `list` (without the newline)
pub fn encode_postings(list: &PostingsList, out: &mut String) {
    for (i, posting) in list.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        // Writing to a String cannot fail
        let _ = write!(out, "{}:{}:", posting.doc_id(), posting.freq());
        for (j, pos) in posting.positions().iter().enumerate() {
            if j > 0 {
                out.push(',');
            }
            let _ = write!(out, "{}", pos);
        }
    }
}

/// Decode one postings line
pub fn decode_postings(line: &[u8]) -> Result<PostingsList, String> {
    let line = std::str::from_utf8(line).map_err(|e| format!("invalid UTF-8: {}", e))?;
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        return Ok(PostingsList::new());
    }
    let line = line.strip_suffix(';').unwrap_or(line);

    let mut postings = Vec::new();
    for entry in line.split(';') {
        postings.push(decode_posting(entry)?);
    }
    PostingsList::from_postings(postings)
}

fn decode_posting(entry: &str) -> Result<Posting, String> {
    let mut fields = entry.splitn(3, ':');
    let (Some(doc), Some(freq), Some(positions)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(format!("expected doc:freq:positions, got {:?}", entry));
    };

    let doc_id: DocId = doc
        .parse()
        .map_err(|_| format!("invalid doc id {:?}", doc))?;
    let freq: u32 = freq
        .parse()
        .map_err(|_| format!("invalid frequency {:?}", freq))?;

    let positions = positions
        .split(',')
        .map(|p| {
            p.parse::<Position>()
                .map_err(|_| format!("invalid position {:?} in doc {}", p, doc_id))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if positions.len() != freq as usize {
        return Err(format!(
            "doc {} has frequency {} but {} positions",
            doc_id,
            freq,
            positions.len()
        ));
    }

    Posting::new(doc_id, positions)
}

pub fn format_dictionary_line(term: &str, offset: u64) -> String {
    format!("{} {}", term, offset)
}

/// Parse a `"<term> <offset>"` line
pub fn parse_dictionary_line(line: &str) -> Result<(&str, u64), String> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut parts = line.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(term), Some(offset), None) if !term.is_empty() => {
            let offset = offset
                .parse()
                .map_err(|_| format!("invalid offset {:?}", offset))?;
            Ok((term, offset))
        }
        _ => Err(format!("expected \"<term> <offset>\", got {:?}", line)),
    }
}

/// Parse a norm table line
pub fn parse_norm(line: &str) -> Result<f64, String> {
    let line = line.trim_end_matches('\r');
    let norm: f64 = line
        .parse()
        .map_err(|_| format!("invalid norm {:?}", line))?;
    if !norm.is_finite() || norm < 0.0 {
        return Err(format!("norm must be finite and non-negative, got {}", norm));
    }
    Ok(norm)
}

/// The line starting at `offset`, without its terminator.
///
/// Returns `None` when `offset` is not inside `data`.
pub fn line_at(data: &[u8], offset: u64) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    if start >= data.len() {
        return None;
    }
    let rest = &data[start..];
    let end = memchr(b'\n', rest).unwrap_or(rest.len());
    Some(&rest[..end])
}
