//! End-to-end tests: build an index on disk, reload it with both storage
//! strategies and rank documents through the proximity engine.

use proxima::error::IndexError;
use proxima::index::*;
use proxima::query::{CancellationToken, ProximityEngine, RankedDoc};
use proxima::utils::IndexConfig;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const KINDS: [IndexKind; 2] = [IndexKind::Memory, IndexKind::Disk];

fn doc(path: &str, text: &str) -> Result<SourceDocument, String> {
    Ok(SourceDocument::new(
        path,
        text.split_whitespace().map(String::from).collect(),
    ))
}

/// d0="a b c", d1="b c a", d2="c a b"
fn build_toy() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    build_index(
        vec![doc("d0", "a b c"), doc("d1", "b c a"), doc("d2", "c a b")],
        dir.path(),
    )
    .expect("Failed to build toy index");
    dir
}

fn open(path: &Path, kind: IndexKind) -> Box<dyn Index> {
    open_index(path, kind, &IndexConfig::default()).expect("Failed to open index")
}

fn doc_ids(ranking: &[RankedDoc]) -> Vec<DocId> {
    ranking.iter().map(|r| r.doc_id).collect()
}

// ============================================================================
// Round-trip
// ============================================================================

#[test]
fn test_toy_round_trip() {
    let dir = build_toy();

    assert_eq!(
        fs::read_to_string(dir.path().join(PATHS_FILE)).unwrap(),
        "d0\nd1\nd2\n"
    );

    for kind in KINDS {
        let index = open(dir.path(), kind);
        assert_eq!(index.num_docs(), 3, "{:?}", kind);
        assert_eq!(index.terms(), vec!["a", "b", "c"]);

        let a = index.postings("a").unwrap();
        let positions: Vec<(DocId, Vec<Position>)> = a
            .iter()
            .map(|p| (p.doc_id(), p.positions().to_vec()))
            .collect();
        assert_eq!(positions, vec![(0, vec![0]), (1, vec![2]), (2, vec![1])]);

        for doc_id in 0..3 {
            assert_eq!(index.doc_path(doc_id).unwrap(), format!("d{}", doc_id));
            assert!((index.doc_norm(doc_id).unwrap() - 3f64.sqrt()).abs() < 1e-12);
        }

        let meta = index.meta().expect("builder writes meta.json");
        assert_eq!(meta.doc_count, 3);
        assert_eq!(meta.term_count, 3);
        assert_eq!(meta.total_postings, 9);
    }
}

#[test]
fn test_variants_agree() {
    let dir = TempDir::new().unwrap();
    let texts = [
        "sleep perchance to dream",
        "to sleep to sleep to dream",
        "dream on",
        "the rest is silence",
    ];
    build_index(
        texts.iter().enumerate().map(|(i, t)| doc(&format!("doc{}.txt", i), t)),
        dir.path(),
    )
    .unwrap();

    let memory = open(dir.path(), IndexKind::Memory);
    let disk = open(dir.path(), IndexKind::Disk);

    assert_eq!(memory.terms(), disk.terms());
    for term in memory.terms() {
        assert_eq!(memory.postings(term).unwrap(), disk.postings(term).unwrap());
        assert_eq!(memory.doc_freq(term).unwrap(), memory.postings(term).unwrap().len());
        assert_eq!(
            disk.total_freq(term).unwrap(),
            disk.postings(term).unwrap().iter().map(|p| p.freq() as u64).sum::<u64>()
        );
    }
    assert_eq!(memory.term_freq("sleep", 1).unwrap(), 2);
    assert_eq!(disk.term_freq("sleep", 2).unwrap(), 0);
    assert_eq!(disk.doc_freq("absent").unwrap(), 0);
    assert_eq!(disk.total_freq("absent").unwrap(), 0);
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn test_toy_unordered_query() {
    let dir = build_toy();
    for kind in KINDS {
        let index = open(dir.path(), kind);
        let ranking = ProximityEngine::new(index.as_ref()).search("a b c", 5).unwrap();

        assert_eq!(doc_ids(&ranking), vec![0, 1, 2], "{:?}", kind);
        for entry in &ranking {
            assert!((entry.score - 0.5).abs() < 1e-12);
        }
    }
}

#[test]
fn test_toy_phrase_query() {
    let dir = build_toy();
    for kind in KINDS {
        let index = open(dir.path(), kind);
        let ranking = ProximityEngine::new(index.as_ref())
            .search("\"a b c\"", 5)
            .unwrap();

        assert_eq!(doc_ids(&ranking), vec![0], "{:?}", kind);
        assert!(ranking[0].score > 0.0);
    }
}

#[test]
fn test_cutoff_semantics() {
    let dir = build_toy();
    let index = open(dir.path(), IndexKind::Disk);
    let engine = ProximityEngine::new(index.as_ref());

    for cutoff in 0..5 {
        let ranking = engine.search("b c", cutoff).unwrap();
        assert_eq!(ranking.len(), cutoff.min(3));
    }
    // "c a" is adjacent in d1 and d2 only; d0 has them two apart
    let ranking = engine.search("c a", 2).unwrap();
    assert_eq!(doc_ids(&ranking), vec![1, 2]);
}

#[test]
fn test_ranking_stable_under_document_order() {
    let texts = [
        ("p0", "x y"),
        ("p1", "y q x"),
        ("p2", "x q q y"),
        ("p3", "y x"),
        ("p4", "x q y"),
    ];

    let forward = TempDir::new().unwrap();
    build_index(texts.iter().map(|(p, t)| doc(p, t)), forward.path()).unwrap();
    let backward = TempDir::new().unwrap();
    build_index(texts.iter().rev().map(|(p, t)| doc(p, t)), backward.path()).unwrap();

    let rank_paths = |dir: &Path| -> Vec<(String, f64)> {
        let index = open(dir, IndexKind::Memory);
        ProximityEngine::new(index.as_ref())
            .search("x y", 10)
            .unwrap()
            .iter()
            .map(|r| (index.doc_path(r.doc_id).unwrap().to_string(), r.score))
            .collect()
    };

    let forward_ranking = rank_paths(forward.path());
    let backward_ranking = rank_paths(backward.path());

    let scores = |r: &[(String, f64)]| r.iter().map(|(_, s)| *s).collect::<Vec<_>>();
    assert_eq!(scores(&forward_ranking), scores(&backward_ranking));
    // Equal scores are ordered by doc id, so the adjacent pair comes first
    assert_eq!(forward_ranking[0].0, "p0");
    assert_eq!(backward_ranking[0].0, "p3");
}

#[test]
fn test_shared_disk_index_across_threads() {
    let dir = TempDir::new().unwrap();
    let texts = ["x y", "q x y", "y x q", "x q q y", "q y x", "y q x"];
    build_index(
        texts.iter().enumerate().map(|(i, t)| doc(&format!("t{}", i), t)),
        dir.path(),
    )
    .unwrap();

    // Three terms against two cache slots keeps entries evicting under contention
    let config = IndexConfig {
        kind: IndexKind::Disk,
        postings_cache_capacity: 2,
    };
    let index = open_index(dir.path(), IndexKind::Disk, &config).unwrap();
    let engine = ProximityEngine::new(index.as_ref());

    let queries = ["x y", "\"q x\"", "y q"];
    let expected: Vec<Vec<RankedDoc>> = queries
        .iter()
        .map(|q| engine.search(q, 10).unwrap())
        .collect();
    assert!(expected.iter().all(|ranking| !ranking.is_empty()));

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let engine = &engine;
            let expected = &expected;
            scope.spawn(move || {
                for round in 0..50 {
                    let i = (worker + round) % queries.len();
                    assert_eq!(engine.search(queries[i], 10).unwrap(), expected[i]);
                    assert_eq!(engine.index().doc_freq("q").unwrap(), 5);
                }
            });
        }
    });
}

#[test]
fn test_cancelled_search_reports_error() {
    let dir = build_toy();
    let index = open(dir.path(), IndexKind::Disk);
    let token = CancellationToken::new();
    token.cancel();
    let result = ProximityEngine::new(index.as_ref()).search_with("a b", 3, &token);
    assert!(matches!(result, Err(IndexError::Cancelled)));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_failing_document_is_skipped() {
    let dir = TempDir::new().unwrap();
    let summary = build_index(
        vec![
            doc("ok0", "alpha beta"),
            Err("permission denied".to_string()),
            doc("ok1", "beta gamma"),
        ],
        dir.path(),
    )
    .unwrap();

    assert_eq!(summary.documents, 2);
    assert_eq!(summary.skipped, 1);
    let index = open(dir.path(), IndexKind::Disk);
    assert_eq!(index.doc_path(1).unwrap(), "ok1");
    assert_eq!(index.doc_freq("beta").unwrap(), 2);
}

#[test]
fn test_missing_index_is_no_index() {
    let dir = TempDir::new().unwrap();
    for kind in KINDS {
        let err = open_index(dir.path(), kind, &IndexConfig::default()).err().unwrap();
        assert!(matches!(err, IndexError::NoIndex { .. }), "{:?}", kind);
    }
}

#[test]
fn test_malformed_postings_line() {
    let dir = build_toy();
    // Same length as the original first line, so dictionary offsets stay valid
    let postings = fs::read_to_string(dir.path().join(POSTINGS_FILE)).unwrap();
    let first_len = postings.find('\n').unwrap();
    let corrupt = format!("{}{}", "x".repeat(first_len), &postings[first_len..]);
    fs::write(dir.path().join(POSTINGS_FILE), corrupt).unwrap();

    let err = open_index(dir.path(), IndexKind::Memory, &IndexConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, IndexError::MalformedRecord { .. }));

    // The disk variant only fails once the broken term is requested
    let index = open(dir.path(), IndexKind::Disk);
    assert!(index.postings("b").is_ok());
    assert!(matches!(
        index.postings("a"),
        Err(IndexError::MalformedRecord { .. })
    ));
    assert!(matches!(
        ProximityEngine::new(index.as_ref()).search("a b", 3),
        Err(IndexError::MalformedRecord { .. })
    ));
}

#[test]
fn test_interrupted_rebuild_is_no_index() {
    let dir = build_toy();
    let other = TempDir::new().unwrap();
    build_index(vec![doc("n0", "b b b"), doc("n1", "a")], other.path()).unwrap();

    // State left by a rebuild that stopped between table renames: new
    // postings next to the old dictionary, no meta.json, lock still held
    fs::copy(other.path().join(POSTINGS_FILE), dir.path().join(POSTINGS_FILE)).unwrap();
    fs::remove_file(dir.path().join(META_FILE)).unwrap();
    fs::write(dir.path().join(BUILD_LOCK_FILE), "").unwrap();

    for kind in KINDS {
        let err = open_index(dir.path(), kind, &IndexConfig::default()).err().unwrap();
        assert!(matches!(err, IndexError::NoIndex { .. }), "{:?}", kind);
    }
}

#[test]
fn test_rebuild_in_place_loads_new_tables() {
    let dir = build_toy();
    build_index(vec![doc("n0", "b b b"), doc("n1", "a")], dir.path()).unwrap();

    assert!(!dir.path().join(BUILD_LOCK_FILE).exists());
    let index = open(dir.path(), IndexKind::Disk);
    assert_eq!(index.num_docs(), 2);
    assert_eq!(index.terms(), vec!["a", "b"]);
    assert_eq!(index.postings("b").unwrap().get(0).unwrap().positions(), &[0, 1, 2]);
}

#[test]
fn test_out_of_range_doc() {
    let dir = build_toy();
    for kind in KINDS {
        let index = open(dir.path(), kind);
        assert!(matches!(
            index.doc_path(3),
            Err(IndexError::OutOfRange { index: 3, len: 3, .. })
        ));
        assert!(matches!(index.doc_norm(99), Err(IndexError::OutOfRange { .. })));
    }
}

#[test]
fn test_index_without_meta_loads() {
    let dir = build_toy();
    fs::remove_file(dir.path().join(META_FILE)).unwrap();
    for kind in KINDS {
        let index = open(dir.path(), kind);
        assert!(index.meta().is_none());
        assert_eq!(index.num_docs(), 3);
    }
}
