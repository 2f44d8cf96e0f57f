//! Carga del dataset de referencia desde CSV.
//!
//! Reglas de limpieza: una fila con cualquier columna usada vacía, ausente o
//! no numérica (en las columnas numéricas) se descarta y se cuenta en
//! `LoadedDataset::dropped`. Los descriptores se redondean a `precision`
//! decimales; el cluster se redondea al entero más cercano.

use chem_domain::{round_to, Dataset, DatasetRow, DescriptorSchema, Descriptors, DEFAULT_PRECISION};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::AdapterError;

/// Nombres de columna del CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetColumns {
    pub id: String,
    pub smiles: String,
    pub cluster: String,
    pub descriptors: DescriptorSchema,
    pub precision: u32,
}

impl Default for DatasetColumns {
    fn default() -> Self {
        Self { id: "COCONUT_ID".to_string(),
               smiles: "SMILES".to_string(),
               cluster: "Cluster".to_string(),
               descriptors: DescriptorSchema::default(),
               precision: DEFAULT_PRECISION }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    /// Filas de datos leídas (sin cabecera).
    pub total: usize,
    /// Filas descartadas por valores ausentes o no numéricos.
    pub dropped: usize,
}

/// Índices de columna resueltos contra la cabecera.
struct Layout {
    id: usize,
    smiles: usize,
    cluster: usize,
    descriptors: Vec<(String, usize)>,
}

impl Layout {
    fn resolve(header: &StringRecord, columns: &DatasetColumns) -> Result<Self, AdapterError> {
        let find = |name: &str| {
            header.iter()
                  .position(|h| h.trim() == name)
                  .ok_or_else(|| AdapterError::MissingColumn(name.to_string()))
        };
        let descriptors = columns.descriptors
                                 .names()
                                 .iter()
                                 .map(|name| find(name.as_str()).map(|i| (name.clone(), i)))
                                 .collect::<Result<Vec<_>, _>>()?;
        Ok(Layout { id: find(columns.id.as_str())?,
                    smiles: find(columns.smiles.as_str())?,
                    cluster: find(columns.cluster.as_str())?,
                    descriptors })
    }
}

fn field<'r>(record: &'r StringRecord, idx: usize) -> Option<&'r str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn number(record: &StringRecord, idx: usize) -> Option<f64> {
    field(record, idx).and_then(|s| s.parse::<f64>().ok())
                      .filter(|v| v.is_finite())
}

/// Convierte un registro en fila; `None` si debe descartarse.
fn to_row(record: &StringRecord, layout: &Layout, precision: u32) -> Option<DatasetRow> {
    let id = field(record, layout.id)?;
    let smiles = field(record, layout.smiles)?;
    let cluster = number(record, layout.cluster)?.round_ties_even();
    if cluster < i64::MIN as f64 || cluster > i64::MAX as f64 {
        return None;
    }
    let mut descriptors = Descriptors::new();
    for (name, idx) in &layout.descriptors {
        let value = round_to(number(record, *idx)?, precision);
        descriptors.insert(name.clone(), value).ok()?;
    }
    DatasetRow::new(id, smiles, descriptors, cluster as i64).ok()
}

/// Lee un dataset desde cualquier lector CSV con cabecera.
pub fn read_dataset<R: Read>(reader: R, columns: &DatasetColumns) -> Result<LoadedDataset, AdapterError> {
    let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);
    let header = reader.headers()?.clone();
    let layout = Layout::resolve(&header, columns)?;

    let mut dataset = Dataset::new(columns.descriptors.clone());
    let mut total = 0;
    let mut dropped = 0;
    for result in reader.records() {
        let record = result?;
        total += 1;
        match to_row(&record, &layout, columns.precision) {
            Some(row) => dataset.push(row)?,
            None => {
                debug!("registro CSV {total} descartado: valor ausente o no numérico");
                dropped += 1;
            }
        }
    }
    info!("dataset cargado: {} filas conservadas, {} descartadas, sha256 {}",
          dataset.len(),
          dropped,
          dataset.content_hash());
    Ok(LoadedDataset { dataset, total, dropped })
}

/// Abre y lee un CSV del disco.
pub fn load_dataset(path: impl AsRef<Path>, columns: &DatasetColumns) -> Result<LoadedDataset, AdapterError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;
    read_dataset(file, columns)
}
