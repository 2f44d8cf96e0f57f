use chem_adapters::{load_dataset, DatasetColumns, ResultTable, TableColumns};
use chem_core::{LibraryIndex, PathFingerprinter, SearchEngine};
use chem_domain::DEFAULT_DESCRIPTORS;
use chemengine::SmilesParser;
use std::io::Write;
use std::sync::Arc;

fn write_dataset(rows: &[(&str, &str, f64, i64)]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let mut header = vec!["COCONUT_ID", "SMILES"];
    header.extend(DEFAULT_DESCRIPTORS);
    header.push("Cluster");
    writeln!(file, "{}", header.join(",")).unwrap();
    for (id, smiles, weight, cluster) in rows {
        let mut fields = vec![id.to_string(), smiles.to_string(), weight.to_string()];
        fields.extend((1..DEFAULT_DESCRIPTORS.len()).map(|i| format!("{:.3}", i as f64 / 7.0)));
        fields.push(cluster.to_string());
        writeln!(file, "{}", fields.join(",")).unwrap();
    }
    file
}

#[test]
fn load_search_and_render() {
    let file = write_dataset(&[("CNP0000001", "CCO", 46.0684, 1),
                               ("CNP0000002", "c1ccccc1O", 94.1112, 2),
                               ("CNP0000003", "C1CC", 42.0, 3),
                               ("CNP0000004", "CCCO", 60.0952, 1)]);
    let loaded = load_dataset(file.path(), &DatasetColumns::default()).unwrap();
    assert_eq!(loaded.dataset.len(), 4);
    assert_eq!(loaded.dropped, 0);

    let (index, report) =
        LibraryIndex::build(loaded.dataset.into_rows(), &SmilesParser, Arc::new(PathFingerprinter::default()));
    assert_eq!(index.size(), 3);
    assert_eq!(report.skipped_count(), 1);

    let response = SearchEngine::new(SmilesParser).search("CCO", &index, 10, true);
    let table = ResultTable::from_response(&response, &TableColumns::default());
    assert_eq!(table.headers(), &["COCONUT_ID", "SMILES", "MolecularWeight", "LogP", "Cluster", "SimilarityScore"]);
    assert_eq!(table.rows().len(), 3);
    assert_eq!(table.rows()[0],
               vec!["CNP0000001", "CCO", "46.07", "0.14", "1", "1.0000"]);
    assert!(table.time_taken().ends_with(" seconds"));

    let json: serde_json::Value = serde_json::from_str(&table.to_json().unwrap()).unwrap();
    assert_eq!(json["rows"][0]["COCONUT_ID"], "CNP0000001");
    assert_eq!(json["rows"].as_array().map(Vec::len), Some(3));
}

#[test]
fn invalid_query_renders_single_row() {
    let file = write_dataset(&[("CNP0000001", "CCO", 46.07, 1)]);
    let loaded = load_dataset(file.path(), &DatasetColumns::default()).unwrap();
    let (index, _) =
        LibraryIndex::build(loaded.dataset.into_rows(), &SmilesParser, Arc::new(PathFingerprinter::default()));

    let response = SearchEngine::new(SmilesParser).search("not a molecule!!", &index, 10, true);
    let table = ResultTable::from_response(&response, &TableColumns::default());
    assert_eq!(table.rows().len(), 1);
    assert_eq!(table.rows()[0][0], "Invalid SMILES");
    assert!(table.rows()[0][1..].iter().all(|c| c == "N/A"));
    assert_eq!(table.time_taken(), "N/A");
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_dataset(dir.path().join("absent.csv"), &DatasetColumns::default()).unwrap_err();
    assert!(matches!(err, chem_adapters::AdapterError::Io(_)));
}
