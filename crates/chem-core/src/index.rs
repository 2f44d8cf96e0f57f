//! Índice inmutable de la biblioteca de referencia.
//!
//! `LibraryIndex::build` parsea y calcula el fingerprint de cada fila una
//! sola vez. Las filas que no parsean, o que repiten un identificador ya
//! indexado, se descartan y quedan registradas en el `BuildReport`. Una vez
//! construido no existe API de mutación: refrescar es construir otro índice
//! (ver `LibraryHandle`).

use chem_domain::{DatasetRow, Descriptors};
use chemengine::StructureParser;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::ENGINE_VERSION;
use crate::fingerprint::{Fingerprint, Fingerprinter};
use crate::hashing::hash_value;
use crate::search::guarded;

/// Molécula de referencia con su fingerprint precalculado.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryEntry {
    row: DatasetRow,
    position: usize,
    fingerprint: Fingerprint,
}

impl LibraryEntry {
    pub fn row(&self) -> &DatasetRow {
        &self.row
    }

    pub fn id(&self) -> &str {
        self.row.id()
    }

    pub fn smiles(&self) -> &str {
        self.row.smiles()
    }

    pub fn descriptors(&self) -> &Descriptors {
        self.row.descriptors()
    }

    pub fn cluster(&self) -> i64 {
        self.row.cluster()
    }

    /// Posición (0-based) en el índice; criterio de desempate del ranking.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

/// Fila descartada durante la construcción.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// Número de fila (0-based) en la entrada.
    pub row_number: usize,
    pub id: String,
    pub reason: String,
}

/// Resumen de una construcción.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub total_rows: usize,
    pub skipped: Vec<SkippedRow>,
}

impl BuildReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn indexed_count(&self) -> usize {
        self.total_rows - self.skipped.len()
    }
}

#[derive(Debug)]
pub struct LibraryIndex {
    id: Uuid,
    built_at: DateTime<Utc>,
    entries: Vec<LibraryEntry>,
    by_id: HashMap<String, usize>,
    fingerprinter: Arc<dyn Fingerprinter>,
    content_hash: String,
}

impl LibraryIndex {
    /// Construye el índice a partir de filas en orden de dataset.
    ///
    /// El parseo y el fingerprint corren en el pool de rayon; el orden de las
    /// entradas es siempre el de `rows`.
    pub fn build<I, P>(rows: I, parser: &P, fingerprinter: Arc<dyn Fingerprinter>) -> (Self, BuildReport)
        where I: IntoIterator<Item = DatasetRow>,
              P: StructureParser + ?Sized
    {
        let rows: Vec<DatasetRow> = rows.into_iter().collect();
        let total_rows = rows.len();
        let fp_ref = &fingerprinter;

        let computed: Vec<(DatasetRow, Result<Fingerprint, String>)> =
            rows.into_par_iter()
                .map(|row| {
                    let fp = guarded(|| parser.parse(row.smiles()).map(|graph| fp_ref.fingerprint(&graph)))
                        .and_then(|parsed| parsed.map_err(|e| e.to_string()));
                    (row, fp)
                })
                .collect();

        let mut entries = Vec::with_capacity(total_rows);
        let mut by_id = HashMap::with_capacity(total_rows);
        let mut report = BuildReport { total_rows, skipped: Vec::new() };

        for (row_number, (row, fp)) in computed.into_iter().enumerate() {
            let reason = match fp {
                Err(reason) => reason,
                Ok(_) if by_id.contains_key(row.id()) => format!("identificador duplicado {}", row.id()),
                Ok(fingerprint) => {
                    let position = entries.len();
                    by_id.insert(row.id().to_string(), position);
                    entries.push(LibraryEntry { row, position, fingerprint });
                    continue;
                }
            };
            warn!("fila {row_number} de la biblioteca descartada ({}): {reason}", row.id());
            report.skipped.push(SkippedRow { row_number, id: row.id().to_string(), reason });
        }

        let content_hash = Self::compute_content_hash(&entries, fingerprinter.as_ref());
        let index = LibraryIndex { id: Uuid::new_v4(),
                                   built_at: Utc::now(),
                                   entries,
                                   by_id,
                                   fingerprinter,
                                   content_hash };
        info!("índice {} construido: {} entradas, {} descartadas",
              index.id,
              index.size(),
              report.skipped_count());
        debug!("índice {} con hash de contenido {}", index.id, index.content_hash);
        (index, report)
    }

    /// Índice vacío con el fingerprinter indicado.
    pub fn empty(fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        let content_hash = Self::compute_content_hash(&[], fingerprinter.as_ref());
        LibraryIndex { id: Uuid::new_v4(),
                       built_at: Utc::now(),
                       entries: Vec::new(),
                       by_id: HashMap::new(),
                       fingerprinter,
                       content_hash }
    }

    fn compute_content_hash(entries: &[LibraryEntry], fingerprinter: &dyn Fingerprinter) -> String {
        let listed: Vec<_> = entries.iter()
                                    .map(|e| json!([e.id(), e.fingerprint.content_hash()]))
                                    .collect();
        hash_value(&json!({
            "engine_version": ENGINE_VERSION,
            "fingerprinter": fingerprinter.params(),
            "entries": listed,
        }))
    }

    pub fn all_entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LibraryEntry> {
        self.by_id.get(id).map(|&pos| &self.entries[pos])
    }

    pub fn fingerprinter(&self) -> &Arc<dyn Fingerprinter> {
        &self.fingerprinter
    }

    /// Ancho de los fingerprints almacenados.
    pub fn nbits(&self) -> usize {
        self.fingerprinter.nbits()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Hash de contenido: versión del motor, parámetros del fingerprinter y
    /// la lista ordenada `(id, hash de fingerprint)`. Dos construcciones sobre
    /// los mismos datos dan el mismo hash aunque su `id` difiera.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }
}
