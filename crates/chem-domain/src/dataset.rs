// dataset.rs
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::{DescriptorSchema, Descriptors, DomainError};

/// Fila del dataset de referencia: identificador, SMILES, descriptores
/// precalculados y etiqueta de cluster.
///
/// El SMILES no se valida aquí; lo hace el índice al construirse (las filas
/// que no parsean se descartan allí).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    id: String,
    smiles: String,
    descriptors: Descriptors,
    cluster: i64,
}

impl DatasetRow {
    pub fn new(id: impl Into<String>,
               smiles: impl Into<String>,
               descriptors: Descriptors,
               cluster: i64)
               -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::ValidationError("Identificador vacío".to_string()));
        }
        Ok(Self { id, smiles: smiles.into(), descriptors, cluster })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn smiles(&self) -> &str {
        &self.smiles
    }

    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }

    pub fn descriptor(&self, name: &str) -> Option<f64> {
        self.descriptors.get(name)
    }

    pub fn cluster(&self) -> i64 {
        self.cluster
    }
}

impl fmt::Display for DatasetRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {}>", self.id, self.smiles)
    }
}

/// Conjunto de filas que comparten un mismo esquema de descriptores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    schema: DescriptorSchema,
    rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn new(schema: DescriptorSchema) -> Self {
        Self { schema, rows: Vec::new() }
    }

    /// Construye validando cada fila contra el esquema.
    pub fn from_rows<I>(schema: DescriptorSchema, rows: I) -> Result<Self, DomainError>
        where I: IntoIterator<Item = DatasetRow>
    {
        let mut dataset = Self::new(schema);
        for row in rows {
            dataset.push(row)?;
        }
        Ok(dataset)
    }

    /// Agrega una fila.
    ///
    /// # Errores
    /// `DomainError::SchemaError` si la fila no lleva exactamente los
    /// descriptores del esquema.
    pub fn push(&mut self, row: DatasetRow) -> Result<(), DomainError> {
        if !row.descriptors().matches_schema(&self.schema) {
            return Err(DomainError::SchemaError(format!("La fila {} no coincide con el esquema de descriptores ({} esperados, {} presentes)",
                                                        row.id(),
                                                        self.schema.len(),
                                                        row.descriptors().len())));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn schema(&self) -> &DescriptorSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DatasetRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Hash SHA-256 sobre (id, SMILES) en orden; identifica la composición
    /// del dataset para trazabilidad en logs.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for row in &self.rows {
            hasher.update(row.id().as_bytes());
            hasher.update([0u8]);
            hasher.update(row.smiles().as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a DatasetRow;
    type IntoIter = std::slice::Iter<'a, DatasetRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for Dataset {
    type Item = DatasetRow;
    type IntoIter = std::vec::IntoIter<DatasetRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
