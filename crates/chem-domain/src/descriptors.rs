// descriptors.rs
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Columnas numéricas del dataset de referencia (sin `Cluster`, que se
/// modela aparte como etiqueta entera).
pub const DEFAULT_DESCRIPTORS: [&str; 15] = ["MolecularWeight",
                                             "LogP",
                                             "TPSA",
                                             "NumRotatableBonds",
                                             "NumAromaticRings",
                                             "HBondDonors",
                                             "HBondAcceptors",
                                             "HeavyAtomCount",
                                             "MolFractionCSP3",
                                             "RingCount",
                                             "Chi0",
                                             "Chi1",
                                             "NPLikeness",
                                             "QED_Drug_Likeness",
                                             "SyntheticAccessibilityScore"];

/// Decimales con los que se almacenan los descriptores.
pub const DEFAULT_PRECISION: u32 = 2;

/// Redondea a `decimals` decimales con desempate a par (mismo criterio que
/// numpy/pandas).
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

/// Esquema ordenado de nombres de descriptores. Todas las filas de un
/// dataset deben llevar exactamente estos nombres.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorSchema {
    names: Vec<String>,
}

impl DescriptorSchema {
    pub fn new<I, S>(names: I) -> Result<Self, DomainError>
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut seen = std::collections::HashSet::new();
        for name in &names {
            if name.trim().is_empty() {
                return Err(DomainError::SchemaError("Nombre de descriptor vacío".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(DomainError::SchemaError(format!("Descriptor duplicado en el esquema: {name}")));
            }
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

impl Default for DescriptorSchema {
    fn default() -> Self {
        Self { names: DEFAULT_DESCRIPTORS.iter().map(|s| s.to_string()).collect() }
    }
}

/// Valores de descriptores por nombre, en orden de inserción.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Descriptors(IndexMap<String, f64>);

impl Descriptors {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Inserta un valor; rechaza NaN/infinito.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Result<(), DomainError> {
        let name = name.into();
        if !value.is_finite() {
            return Err(DomainError::ValidationError(format!("Valor no finito para {name}: {value}")));
        }
        self.0.insert(name, value);
        Ok(())
    }

    /// Construye a partir de pares (nombre, valor).
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, DomainError>
        where I: IntoIterator<Item = (S, f64)>,
              S: Into<String>
    {
        let mut out = Self::new();
        for (name, value) in pairs {
            out.insert(name, value)?;
        }
        Ok(out)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copia con todos los valores redondeados a `decimals`.
    pub fn rounded(&self, decimals: u32) -> Self {
        Self(self.0.iter().map(|(k, v)| (k.clone(), round_to(*v, decimals))).collect())
    }

    /// `true` si lleva exactamente los nombres del esquema (en cualquier orden).
    pub fn matches_schema(&self, schema: &DescriptorSchema) -> bool {
        self.0.len() == schema.len() && schema.names().iter().all(|n| self.0.contains_key(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_uses_two_decimals_ties_even() {
        assert_eq!(round_to(180.1589, 2), 180.16);
        assert_eq!(round_to(-0.004, 2), -0.0);
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(3.0, 0), 3.0);
    }

    #[test]
    fn schema_rejects_duplicates() {
        assert!(DescriptorSchema::new(["LogP", "LogP"]).is_err());
        assert!(DescriptorSchema::new(["LogP", " "]).is_err());
        assert_eq!(DescriptorSchema::default().len(), 15);
    }

    #[test]
    fn descriptors_reject_non_finite() {
        let mut d = Descriptors::new();
        assert!(d.insert("LogP", f64::NAN).is_err());
        assert!(d.insert("LogP", f64::INFINITY).is_err());
        assert!(d.insert("LogP", 1.5).is_ok());
        assert_eq!(d.get("LogP"), Some(1.5));
    }

    #[test]
    fn schema_matching_ignores_order() {
        let schema = DescriptorSchema::new(["A", "B"]).unwrap();
        let d = Descriptors::from_pairs([("B", 1.0), ("A", 2.0)]).unwrap();
        assert!(d.matches_schema(&schema));
        let partial = Descriptors::from_pairs([("A", 2.0)]).unwrap();
        assert!(!partial.matches_schema(&schema));
    }
}
