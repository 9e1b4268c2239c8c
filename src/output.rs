//! Terminal rendering of rankings and postings

use crate::error::Result;
use crate::index::reader::Index;
use crate::query::ranking::RankedDoc;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn color_choice(color: bool) -> ColorChoice {
    if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Print a ranking as `score  doc-id  path` lines, best first
pub fn print_ranking<I: Index + ?Sized>(index: &I, ranking: &[RankedDoc], color: bool) -> Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(color));
    write_ranking(&mut stdout, index, ranking)
}

pub fn write_ranking<W: WriteColor, I: Index + ?Sized>(
    out: &mut W,
    index: &I,
    ranking: &[RankedDoc],
) -> Result<()> {
    for entry in ranking {
        let path = index.doc_path(entry.doc_id)?;

        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "{:.6}", entry.score)?;
        out.reset()?;
        write!(out, "\t{}\t", entry.doc_id)?;

        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(out, "{}", path)?;
        out.reset()?;
        writeln!(out)?;
    }
    Ok(())
}

/// Print a term's statistics and up to `limit` of its postings
pub fn print_postings<I: Index + ?Sized>(index: &I, term: &str, limit: usize, color: bool) -> Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(color));
    write_postings(&mut stdout, index, term, limit)
}

pub fn write_postings<W: WriteColor, I: Index + ?Sized>(
    out: &mut W,
    index: &I,
    term: &str,
    limit: usize,
) -> Result<()> {
    let postings = index.postings(term)?;

    out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(out, "{}", term)?;
    out.reset()?;
    writeln!(
        out,
        ": doc freq {}, total freq {}",
        postings.len(),
        postings.total_freq()
    )?;

    for posting in postings.iter().take(limit) {
        let path = index.doc_path(posting.doc_id())?;
        write!(out, "  {}\t", posting.doc_id())?;

        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(out, "{}", path)?;
        out.reset()?;

        let positions: Vec<String> = posting.positions().iter().map(|p| p.to_string()).collect();
        writeln!(out, "\ttf={}\t[{}]", posting.freq(), positions.join(","))?;
    }

    if postings.len() > limit {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        writeln!(out, "  ... and {} more", postings.len() - limit)?;
        out.reset()?;
    }
    Ok(())
}
