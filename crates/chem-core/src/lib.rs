//! chem-core: motor de búsqueda por similitud molecular.
//!
//! Fingerprints estructurales, coeficiente de Tanimoto, índice inmutable de
//! la biblioteca, selección top-K con desempate estable y el orquestador que
//! combina parser → fingerprint → ranking.
pub mod constants;
pub mod errors;
pub mod fingerprint;
pub mod handle;
pub mod hashing;
pub mod index;
pub mod ranking;
pub mod search;
pub mod similarity;

pub use errors::CoreEngineError;
pub use fingerprint::{Fingerprint, FingerprintConfig, FingerprintKind, Fingerprinter, MorganFingerprinter, PathFingerprinter};
pub use handle::LibraryHandle;
pub use index::{BuildReport, LibraryEntry, LibraryIndex, SkippedRow};
pub use ranking::{top_k, top_k_with_threshold, Hit};
pub use search::{SearchEngine, SearchOptions, SearchPhase, SearchResponse, SimilarityResult};
pub use similarity::{tanimoto, tanimoto_bulk, try_tanimoto};
