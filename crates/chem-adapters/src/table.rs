//! Tabla de resultados para mostrar una búsqueda.
//!
//! Es la única capa que conoce las filas centinela ("Invalid SMILES",
//! "Error"); el core devuelve variantes tipadas.

use chem_core::{SearchResponse, SimilarityResult};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::error::AdapterError;

pub const INVALID_QUERY_ID: &str = "Invalid SMILES";
pub const ERROR_ID: &str = "Error";
pub const NOT_AVAILABLE: &str = "N/A";

/// Columnas de la tabla de salida.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    pub id: String,
    pub smiles: String,
    pub descriptors: Vec<String>,
    pub cluster: String,
    pub score: String,
}

impl Default for TableColumns {
    fn default() -> Self {
        Self { id: "COCONUT_ID".to_string(),
               smiles: "SMILES".to_string(),
               descriptors: vec!["MolecularWeight".to_string(), "LogP".to_string()],
               cluster: "Cluster".to_string(),
               score: "SimilarityScore".to_string() }
    }
}

impl TableColumns {
    fn headers(&self) -> Vec<String> {
        let mut headers = vec![self.id.clone(), self.smiles.clone()];
        headers.extend(self.descriptors.iter().cloned());
        headers.push(self.cluster.clone());
        headers.push(self.score.clone());
        headers
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    #[serde(skip)]
    elapsed: Option<Duration>,
}

impl ResultTable {
    pub fn from_response(response: &SearchResponse<'_>, columns: &TableColumns) -> Self {
        let headers = columns.headers();
        let width = headers.len();
        let rows = match &response.result {
            SimilarityResult::Ranked(hits) => {
                hits.iter()
                    .map(|hit| {
                        let entry = hit.entry;
                        let mut row = vec![entry.id().to_string(), entry.smiles().to_string()];
                        row.extend(columns.descriptors.iter().map(|name| {
                                                                 entry.descriptors()
                                                                      .get(name)
                                                                      .map(|v| v.to_string())
                                                                      .unwrap_or_else(|| NOT_AVAILABLE.to_string())
                                                             }));
                        row.push(entry.cluster().to_string());
                        row.push(format!("{:.4}", hit.score));
                        row
                    })
                    .collect()
            }
            SimilarityResult::InvalidQuery { .. } => {
                let mut row = vec![NOT_AVAILABLE.to_string(); width];
                row[0] = INVALID_QUERY_ID.to_string();
                vec![row]
            }
            SimilarityResult::InternalError { message, .. } => {
                let mut row = vec![String::new(); width];
                row[0] = ERROR_ID.to_string();
                row[1] = message.clone();
                vec![row]
            }
        };
        Self { headers, rows, elapsed: response.elapsed }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tiempo de búsqueda para mostrar.
    pub fn time_taken(&self) -> String {
        match self.elapsed {
            Some(d) => format!("{:.2} seconds", d.as_secs_f64()),
            None => NOT_AVAILABLE.to_string(),
        }
    }

    /// Filas como objetos `{columna: valor}` en el orden de la cabecera.
    pub fn records(&self) -> Vec<IndexMap<&str, &str>> {
        self.rows
            .iter()
            .map(|row| self.headers.iter().map(String::as_str).zip(row.iter().map(String::as_str)).collect())
            .collect()
    }

    pub fn to_json(&self) -> Result<String, AdapterError> {
        #[derive(Serialize)]
        struct Out<'t> {
            rows: Vec<IndexMap<&'t str, &'t str>>,
            time_taken: String,
        }
        Ok(serde_json::to_string_pretty(&Out { rows: self.records(), time_taken: self.time_taken() })?)
    }
}

/// Tabla de ancho fijo.
impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }
        let line = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            let padded: Vec<String> = cells.iter().zip(&widths).map(|(c, &w)| format!("{c:<w$}")).collect();
            writeln!(f, "{}", padded.join("  ").trim_end())
        };
        line(f, &self.headers)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        line(f, &rule)?;
        for row in &self.rows {
            line(f, row)?;
        }
        Ok(())
    }
}
