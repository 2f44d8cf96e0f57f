//! chemsim: búsqueda de similitud molecular.
//!
//! Este crate es la fachada que usan los hosts (CLI, servicios):
//! - `build_index` / `build_index_with`: construye el índice inmutable a
//!   partir de filas del dataset.
//! - `search` / `search_default`: busca los K vecinos más similares.
//! - `config` y `errors`: configuración por entorno y errores de aplicación.
//!
//! Todo lo demás se reexporta desde los crates del workspace.

pub mod config;
pub mod errors;

use chem_adapters::{load_dataset, LoadedDataset};
use chem_core::{FingerprintConfig, Fingerprinter, PathFingerprinter, SearchEngine};
use chem_domain::DatasetRow;
use chemengine::SmilesParser;
use log::{info, warn};
use std::sync::Arc;

pub use chem_core::constants::DEFAULT_TOP_K;
pub use chem_core::{BuildReport, Hit, LibraryEntry, LibraryHandle, LibraryIndex, SearchResponse, SimilarityResult};
pub use config::{AppConfig, CONFIG};
pub use errors::CoreError;

/// Parámetros de construcción del índice.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub fingerprinter: Arc<dyn Fingerprinter>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self { fingerprinter: Arc::new(PathFingerprinter::default()) }
    }
}

impl BuildSettings {
    pub fn from_config(config: &FingerprintConfig) -> Result<Self, CoreError> {
        let fingerprinter = config.build().map_err(|e| CoreError::Config(e.to_string()))?;
        Ok(Self { fingerprinter })
    }
}

/// Construye el índice con la configuración por defecto.
/// Devuelve el índice y el número de filas descartadas.
pub fn build_index<I>(rows: I) -> (LibraryIndex, usize)
    where I: IntoIterator<Item = DatasetRow>
{
    let (index, report) = build_index_with(rows, &BuildSettings::default());
    (index, report.skipped_count())
}

/// Construye el índice con el fingerprinter indicado y devuelve el reporte
/// completo de filas descartadas.
pub fn build_index_with<I>(rows: I, settings: &BuildSettings) -> (LibraryIndex, BuildReport)
    where I: IntoIterator<Item = DatasetRow>
{
    LibraryIndex::build(rows, &SmilesParser, settings.fingerprinter.clone())
}

/// Busca los `k` vecinos más similares a `query_text`.
pub fn search<'a>(query_text: &str, index: &'a LibraryIndex, k: usize, timing: bool) -> SearchResponse<'a> {
    SearchEngine::new(SmilesParser).search(query_text, index, k, timing)
}

/// `search` con `k = DEFAULT_TOP_K` y medición de tiempo.
pub fn search_default<'a>(query_text: &str, index: &'a LibraryIndex) -> SearchResponse<'a> {
    search(query_text, index, DEFAULT_TOP_K, true)
}

/// Carga el CSV configurado y lo deja listo para indexar.
pub fn load_configured_dataset(config: &AppConfig) -> Result<LoadedDataset, CoreError> {
    let path = config.dataset
                     .as_ref()
                     .ok_or_else(|| CoreError::Config("CHEMSIM_DATASET no definido".to_string()))?;
    let loaded = load_dataset(path, &config.dataset_columns())?;
    if loaded.dropped > 0 {
        warn!("{} filas con valores ausentes descartadas de {}", loaded.dropped, path.display());
    }
    Ok(loaded)
}

/// Carga el dataset configurado y construye su índice.
pub fn load_library(config: &AppConfig) -> Result<(LibraryIndex, BuildReport), CoreError> {
    let settings = BuildSettings::from_config(&config.fingerprint)?;
    let loaded = load_configured_dataset(config)?;
    let (index, report) = build_index_with(loaded.dataset.into_rows(), &settings);
    info!("biblioteca lista: {} entradas ({} descartadas al indexar)",
          index.size(),
          report.skipped_count());
    Ok((index, report))
}
