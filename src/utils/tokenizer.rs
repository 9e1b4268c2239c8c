use regex::Regex;
use std::sync::LazyLock;

/// Maximum term length kept in the index.
/// Longer letter runs are almost always encoded data rather than words.
pub const MAX_TERM_LENGTH: usize = 128;

static LETTER_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[A-Za-z]+").expect("letter-run pattern is valid"));

/// Split text into lowercase terms.
///
/// Terms are maximal runs of ASCII letters; every other character separates
/// terms. Over-long runs become empty slots: they are dropped by the builder
/// but still occupy a position, so distances between the surrounding terms
/// are preserved.
pub fn tokenize(text: &str) -> Vec<String> {
    LETTER_RUN
        .find_iter(text)
        .map(|m| {
            let term = m.as_str();
            if term.len() > MAX_TERM_LENGTH {
                String::new()
            } else {
                term.to_ascii_lowercase()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_letters_only() {
        assert_eq!(
            tokenize("The cat's 2 hats, DON'T-stop!"),
            vec!["the", "cat", "s", "hats", "don", "t", "stop"]
        );
    }

    #[test]
    fn test_tokenize_non_ascii_separates() {
        assert_eq!(tokenize("naïve café"), vec!["na", "ve", "caf"]);
        assert!(tokenize("1234 !!").is_empty());
    }

    #[test]
    fn test_long_run_keeps_position() {
        let long = "x".repeat(MAX_TERM_LENGTH + 1);
        let terms = tokenize(&format!("a {} b", long));
        assert_eq!(terms, vec!["a".to_string(), String::new(), "b".to_string()]);
    }
}
