use chem_core::{top_k, Fingerprint, Fingerprinter, LibraryHandle, LibraryIndex, PathFingerprinter, SearchEngine,
                SearchPhase, SimilarityResult};
use chem_domain::{DatasetRow, Descriptors};
use chemengine::{EngineError, MolecularGraph, SmilesParser, StructureParser};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn row(id: &str, smiles: &str) -> DatasetRow {
    DatasetRow::new(id, smiles, Descriptors::new(), 0).unwrap()
}

fn path_index(rows: Vec<DatasetRow>) -> LibraryIndex {
    LibraryIndex::build(rows, &SmilesParser, Arc::new(PathFingerprinter::default())).0
}

/// Parser que cuenta invocaciones.
#[derive(Default)]
struct CountingParser {
    calls: AtomicUsize,
}

impl StructureParser for CountingParser {
    fn parse(&self, notation: &str) -> Result<MolecularGraph, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SmilesParser.parse(notation)
    }
}

/// Fingerprint fijo por número de átomos, para controlar los scores.
#[derive(Debug)]
struct AtomCountFingerprinter;

impl Fingerprinter for AtomCountFingerprinter {
    fn fingerprint(&self, graph: &MolecularGraph) -> Fingerprint {
        let bits: &[usize] = match graph.atom_count() {
            1 => &[0, 1],
            2 => &[0, 1, 2, 3],
            3 => &[0],
            _ => &[],
        };
        Fingerprint::from_bits(64, bits.iter().copied())
    }

    fn nbits(&self) -> usize {
        64
    }

    fn params(&self) -> serde_json::Value {
        json!({"scheme": "atom-count"})
    }
}

/// Fingerprinter que falla con moléculas grandes.
#[derive(Debug)]
struct FragileFingerprinter;

impl Fingerprinter for FragileFingerprinter {
    fn fingerprint(&self, graph: &MolecularGraph) -> Fingerprint {
        if graph.atom_count() > 5 {
            panic!("fingerprint table overflow");
        }
        PathFingerprinter::default().fingerprint(graph)
    }

    fn nbits(&self) -> usize {
        2048
    }

    fn params(&self) -> serde_json::Value {
        json!({"scheme": "fragile"})
    }
}

/// Declara 64 bits pero emite fingerprints de 128.
#[derive(Debug)]
struct MisreportedWidthFingerprinter;

impl Fingerprinter for MisreportedWidthFingerprinter {
    fn fingerprint(&self, graph: &MolecularGraph) -> Fingerprint {
        Fingerprint::from_bits(128, 0..graph.atom_count())
    }

    fn nbits(&self) -> usize {
        64
    }

    fn params(&self) -> serde_json::Value {
        json!({"scheme": "misreported"})
    }
}

/// Fingerprinter cuyo ancho no puede consultarse.
#[derive(Debug)]
struct WidthlessFingerprinter;

impl Fingerprinter for WidthlessFingerprinter {
    fn fingerprint(&self, graph: &MolecularGraph) -> Fingerprint {
        Fingerprint::from_bits(64, 0..graph.atom_count())
    }

    fn nbits(&self) -> usize {
        panic!("width table missing")
    }

    fn params(&self) -> serde_json::Value {
        json!({"scheme": "widthless"})
    }
}

#[test]
fn empty_query_does_not_invoke_parser() {
    let index = path_index(vec![row("A", "CCO")]);
    let engine = SearchEngine::new(CountingParser::default());
    let resp = engine.search("", &index, 10, true);
    assert_eq!(resp.result, SimilarityResult::Ranked(Vec::new()));
    assert!(resp.elapsed.is_none());
    assert_eq!(engine.parser().calls.load(Ordering::SeqCst), 0);

    engine.search("CCO", &index, 10, true);
    assert_eq!(engine.parser().calls.load(Ordering::SeqCst), 1);
}

#[test]
fn garbage_query_is_single_invalid_result() {
    let index = path_index(vec![row("A", "CCO"), row("B", "CCN")]);
    let resp = SearchEngine::new(SmilesParser).search("not a molecule!!", &index, 10, true);
    assert!(matches!(&resp.result, SimilarityResult::InvalidQuery { query, .. } if query == "not a molecule!!"));
    assert!(resp.result.hits().is_empty());
    assert!(resp.elapsed.is_none());
}

#[test]
fn ranked_scores_follow_insertion_on_ties() {
    let rows = vec![row("C3", "CCC"), row("A", "C"), row("B", "CC"), row("C", "CCC")];
    let (index, _) = LibraryIndex::build(rows, &SmilesParser, Arc::new(AtomCountFingerprinter));
    let query = AtomCountFingerprinter.fingerprint(&SmilesParser.parse("C").unwrap());

    let hits = top_k(&query, &index, 2).unwrap();
    let got: Vec<(&str, f64)> = hits.iter().map(|h| (h.entry.id(), h.score)).collect();
    assert_eq!(got, vec![("A", 1.0), ("C3", 0.5)]);

    // los tres de 0.5 quedan en orden de inserción
    let all: Vec<&str> = top_k(&query, &index, 4).unwrap().iter().map(|h| h.entry.id()).collect();
    assert_eq!(all, vec!["A", "C3", "B", "C"]);
}

#[test]
fn abc_scenario() {
    let rows = vec![row("A", "C"), row("B", "CC"), row("C", "CCC")];
    let (index, report) = LibraryIndex::build(rows, &SmilesParser, Arc::new(AtomCountFingerprinter));
    assert_eq!(report.skipped_count(), 0);

    let resp = SearchEngine::new(SmilesParser).search("C", &index, 2, true);
    let hits = resp.result.hits();
    assert_eq!(hits.len(), 2);
    assert_eq!((hits[0].entry.id(), hits[0].score), ("A", 1.0));
    assert_eq!((hits[1].entry.id(), hits[1].score), ("B", 0.5));
}

#[test]
fn identical_fingerprints_rank_by_position() {
    let index = path_index(vec![row("X", "CCO"), row("Y", "OCC"), row("Z", "C(C)O")]);
    let resp = SearchEngine::new(SmilesParser).search("CCO", &index, 3, false);
    let ids: Vec<&str> = resp.result.hits().iter().map(|h| h.entry.id()).collect();
    assert_eq!(ids, vec!["X", "Y", "Z"]);
    assert!(resp.result.hits().iter().all(|h| h.score == 1.0));
}

#[test]
fn one_malformed_row_among_n() {
    let rows = vec![row("1", "CCO"), row("2", "c1ccccc1"), row("3", "C(C"), row("4", "CCN"), row("5", "O")];
    let (index, report) = LibraryIndex::build(rows, &SmilesParser, Arc::new(PathFingerprinter::default()));
    assert_eq!(index.size(), 4);
    assert_eq!(report.skipped_count(), 1);
}

#[test]
fn k_larger_than_index_and_empty_index() {
    let index = path_index(vec![row("A", "CCO"), row("B", "CCN")]);
    let resp = SearchEngine::new(SmilesParser).search("CCO", &index, 50, true);
    assert_eq!(resp.result.hits().len(), 2);

    let empty = path_index(Vec::new());
    let resp = SearchEngine::new(SmilesParser).search("CCO", &empty, 10, true);
    assert_eq!(resp.result, SimilarityResult::Ranked(Vec::new()));
    assert!(resp.elapsed.is_some());

    let resp = SearchEngine::new(SmilesParser).search("CCO", &index, 0, true);
    assert!(resp.result.hits().is_empty());
}

#[test]
fn panic_during_fingerprint_is_internal_error() {
    let (index, _) = LibraryIndex::build(vec![row("A", "CCO")], &SmilesParser, Arc::new(FragileFingerprinter));
    let resp = SearchEngine::new(SmilesParser).search("CCCCCCCC", &index, 10, true);
    match &resp.result {
        SimilarityResult::InternalError { phase, message } => {
            assert_eq!(*phase, SearchPhase::Fingerprint);
            assert!(message.contains("overflow"));
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert!(resp.elapsed.is_none());
}

#[test]
fn query_width_mismatch_is_internal_error_in_rank() {
    let (index, report) =
        LibraryIndex::build(vec![row("A", "CCO"), row("B", "CCN")], &SmilesParser, Arc::new(MisreportedWidthFingerprinter));
    assert_eq!(report.skipped_count(), 0);
    let resp = SearchEngine::new(SmilesParser).search("CCO", &index, 10, true);
    match &resp.result {
        SimilarityResult::InternalError { phase, message } => {
            assert_eq!(*phase, SearchPhase::Rank);
            assert!(message.contains("64"), "{message}");
            assert!(message.contains("128"), "{message}");
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert!(resp.elapsed.is_none());
    assert!(resp.result.hits().is_empty());
}

#[test]
fn panic_during_rank_is_internal_error() {
    let (index, _) = LibraryIndex::build(vec![row("A", "CCO")], &SmilesParser, Arc::new(WidthlessFingerprinter));
    let resp = SearchEngine::new(SmilesParser).search("CCO", &index, 10, true);
    match &resp.result {
        SimilarityResult::InternalError { phase, message } => {
            assert_eq!(*phase, SearchPhase::Rank);
            assert_eq!(message, "width table missing");
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert!(resp.elapsed.is_none());
}

#[test]
fn out_of_range_charge_query_is_invalid() {
    let index = path_index(vec![row("A", "CCO")]);
    let query = format!("[C{}]", "+".repeat(130));
    let resp = SearchEngine::new(SmilesParser).search(&query, &index, 10, true);
    assert!(matches!(&resp.result, SimilarityResult::InvalidQuery { query: q, .. } if *q == query));
    assert!(resp.elapsed.is_none());

    let charged = format!("[C{}]", "+".repeat(130));
    let (index, report) = LibraryIndex::build(vec![row("A", "CCO"), row("B", &charged)],
                                              &SmilesParser,
                                              Arc::new(PathFingerprinter::default()));
    assert_eq!(index.size(), 1);
    assert_eq!(report.skipped_count(), 1);
}

#[test]
fn width_mismatch_is_rejected() {
    let index = path_index(vec![row("A", "CCO")]);
    let narrow = Fingerprint::new(512);
    assert!(top_k(&narrow, &index, 3).is_err());
}

#[test]
fn concurrent_searches_during_swap() {
    let fp: Arc<dyn Fingerprinter> = Arc::new(PathFingerprinter::default());
    let small = vec![row("A", "CCO"), row("B", "CCN")];
    let large = vec![row("A", "CCO"), row("B", "CCN"), row("C", "CCC"), row("D", "c1ccccc1")];
    let handle = LibraryHandle::new(LibraryIndex::build(small.clone(), &SmilesParser, fp.clone()).0);
    let engine = SearchEngine::new(SmilesParser);

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..50 {
                    let index = handle.current();
                    let resp = engine.search("CCO", &index, 3, false);
                    let hits = resp.result.hits();
                    assert_eq!(hits.len(), 3.min(index.size()));
                    assert_eq!(hits[0].entry.id(), "A");
                }
            });
        }
        s.spawn(|| {
            for i in 0..20 {
                let rows = if i % 2 == 0 { large.clone() } else { small.clone() };
                handle.rebuild(rows, &SmilesParser, fp.clone());
            }
        });
    });
    assert!(handle.current().size() == 2 || handle.current().size() == 4);
}
