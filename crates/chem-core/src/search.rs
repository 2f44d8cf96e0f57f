//! Orquestador de búsqueda: parseo → fingerprint → ranking.
//!
//! Estados: `EMPTY_INPUT` (consulta vacía, no se invoca el parser),
//! `PARSE`, `FINGERPRINT`, `RANK`, `DONE`. Todo fallo se resuelve a un
//! valor de `SimilarityResult`; un panic en cualquiera de las fases se
//! captura y se devuelve como `InternalError`. Sólo el camino exitoso
//! reporta tiempo.

use chem_domain::Molecule;
use chemengine::{SmilesParser, StructureParser};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::constants::PARALLEL_SCORING_THRESHOLD;
use crate::index::LibraryIndex;
use crate::ranking::{top_k_with_threshold, Hit};

/// Fase en la que ocurrió un fallo interno.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchPhase {
    Parse,
    Fingerprint,
    Rank,
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchPhase::Parse => write!(f, "parse"),
            SearchPhase::Fingerprint => write!(f, "fingerprint"),
            SearchPhase::Rank => write!(f, "rank"),
        }
    }
}

/// Resultado de una búsqueda. Cada variante lleva sólo sus campos.
#[derive(Debug, Clone, PartialEq)]
pub enum SimilarityResult<'a> {
    /// Hits ordenados (vacío para una consulta vacía).
    Ranked(Vec<Hit<'a>>),
    /// La consulta no es una estructura válida.
    InvalidQuery { query: String, reason: String },
    /// Fallo inesperado durante la búsqueda.
    InternalError { phase: SearchPhase, message: String },
}

impl<'a> SimilarityResult<'a> {
    pub fn is_ranked(&self) -> bool {
        matches!(self, SimilarityResult::Ranked(_))
    }

    /// Hits de un resultado rankeado; vacío en las variantes de error.
    pub fn hits(&self) -> &[Hit<'a>] {
        match self {
            SimilarityResult::Ranked(hits) => hits,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse<'a> {
    pub result: SimilarityResult<'a>,
    /// Duración PARSE→RANK; sólo en éxito y si se pidió.
    pub elapsed: Option<Duration>,
}

impl<'a> SearchResponse<'a> {
    fn failed(result: SimilarityResult<'a>) -> Self {
        Self { result, elapsed: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Tamaño de índice a partir del cual el scoring es paralelo.
    pub parallel_threshold: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { parallel_threshold: PARALLEL_SCORING_THRESHOLD }
    }
}

/// Buscador sin estado: puede compartirse entre hilos y usarse contra
/// cualquier índice.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine<P = SmilesParser> {
    parser: P,
    options: SearchOptions,
}

impl<P> SearchEngine<P> where P: StructureParser
{
    pub fn new(parser: P) -> Self {
        Self { parser, options: SearchOptions::default() }
    }

    pub fn with_options(parser: P, options: SearchOptions) -> Self {
        Self { parser, options }
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    /// Ejecuta una búsqueda de los `k` vecinos más similares a `query_text`.
    pub fn search<'a>(&self, query_text: &str, index: &'a LibraryIndex, k: usize, timing: bool) -> SearchResponse<'a> {
        let query = query_text.trim();
        if query.is_empty() {
            debug!("consulta vacía, no hay nada que buscar");
            return SearchResponse::failed(SimilarityResult::Ranked(Vec::new()));
        }

        let started = Instant::now();

        let molecule = match guarded(|| Molecule::from_smiles_with(&self.parser, query)) {
            Ok(Ok(molecule)) => molecule,
            Ok(Err(e)) => {
                warn!("consulta inválida '{query}': {e}");
                return SearchResponse::failed(SimilarityResult::InvalidQuery { query: query_text.to_string(),
                                                                               reason: e.to_string() });
            }
            Err(message) => return internal_error(SearchPhase::Parse, message),
        };

        let fingerprint = match guarded(|| index.fingerprinter().fingerprint(molecule.graph())) {
            Ok(fp) => fp,
            Err(message) => return internal_error(SearchPhase::Fingerprint, message),
        };

        let threshold = self.options.parallel_threshold;
        let hits = match guarded(|| top_k_with_threshold(&fingerprint, index, k, threshold)) {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => return internal_error(SearchPhase::Rank, e.to_string()),
            Err(message) => return internal_error(SearchPhase::Rank, message),
        };

        let elapsed = started.elapsed();
        debug!("consulta '{query}': {} de {} entradas rankeadas en {:?}", hits.len(), index.size(), elapsed);
        SearchResponse { result: SimilarityResult::Ranked(hits), elapsed: timing.then_some(elapsed) }
    }
}

fn internal_error<'a>(phase: SearchPhase, message: String) -> SearchResponse<'a> {
    error!("búsqueda fallida en la fase {phase}: {message}");
    SearchResponse::failed(SimilarityResult::InternalError { phase, message })
}

/// Ejecuta `f` capturando un posible panic como mensaje.
pub(crate) fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic desconocido".to_string()
    }
}
