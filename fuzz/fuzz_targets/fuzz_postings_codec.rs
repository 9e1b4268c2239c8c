#![no_main]

use libfuzzer_sys::fuzz_target;
use proxima::index::codec::{decode_postings, encode_postings};

fuzz_target!(|data: &[u8]| {
    // Whatever decodes must re-encode to a line that decodes identically
    if let Ok(list) = decode_postings(data) {
        let mut line = String::new();
        encode_postings(&list, &mut line);
        let again = decode_postings(line.as_bytes()).expect("re-encoded line decodes");
        assert_eq!(list, again);
    }
});
