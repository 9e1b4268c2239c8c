#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let query = proxima::query::parse_query(data);
    // Parsed terms never carry whitespace or quotes
    for term in &query.terms {
        assert!(!term.is_empty());
        assert!(!term.contains(char::is_whitespace));
        if query.is_phrase() {
            assert!(!term.contains('"'));
        }
    }
    assert_eq!(query.term_slots().len(), query.terms.len());
});
