/// How the terms of a query must be arranged in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// All terms, in any order, as close together as possible
    #[default]
    Proximity,
    /// All terms, consecutive and in query order
    Phrase,
}

/// Parsed query representation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProximityQuery {
    /// Terms in query order, duplicates kept
    pub terms: Vec<String>,
    pub mode: QueryMode,
}

impl ProximityQuery {
    pub fn new(terms: Vec<String>, mode: QueryMode) -> Self {
        Self { terms, mode }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_phrase(&self) -> bool {
        self.mode == QueryMode::Phrase
    }

    /// Distinct terms in order of first appearance
    pub fn distinct_terms(&self) -> Vec<&str> {
        let mut distinct: Vec<&str> = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            if !distinct.contains(&term.as_str()) {
                distinct.push(term);
            }
        }
        distinct
    }

    /// For each query term, its index in [`Self::distinct_terms`]
    pub fn term_slots(&self) -> Vec<usize> {
        let distinct = self.distinct_terms();
        self.terms
            .iter()
            .map(|term| {
                distinct
                    .iter()
                    .position(|d| *d == term.as_str())
                    .unwrap_or(0)
            })
            .collect()
    }
}

/// Parse a query string.
///
/// A query wrapped in double quotes is a phrase query; every quote character
/// is removed from it. Anything else is a proximity query. Terms are split on
/// whitespace; an all-whitespace query has no terms.
pub fn parse_query(input: &str) -> ProximityQuery {
    let trimmed = input.trim();
    let is_phrase = trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"');

    if is_phrase {
        let text = trimmed.replace('"', "");
        ProximityQuery::new(split_terms(&text), QueryMode::Phrase)
    } else {
        ProximityQuery::new(split_terms(trimmed), QueryMode::Proximity)
    }
}

fn split_terms(text: &str) -> Vec<String> {
    text.split_whitespace().map(String::from).collect()
}
