//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable
//! (`AppConfig`), además de una instancia global perezosa (`CONFIG`) para
//! los binarios.
use chem_adapters::DatasetColumns;
use chem_core::constants::{DEFAULT_TOP_K, PARALLEL_SCORING_THRESHOLD};
use chem_core::{FingerprintConfig, FingerprintKind, SearchOptions};
use chem_domain::{DescriptorSchema, DEFAULT_PRECISION};
use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::CoreError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Forzar carga temprana de .env.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

/// Configuración global de la aplicación.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// CSV de la biblioteca de referencia.
    pub dataset: Option<PathBuf>,
    pub top_k: usize,
    pub fingerprint: FingerprintConfig,
    pub parallel_threshold: usize,
    pub id_column: String,
    pub smiles_column: String,
    pub cluster_column: String,
    /// Decimales de los descriptores al cargar.
    pub precision: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { dataset: None,
               top_k: DEFAULT_TOP_K,
               fingerprint: FingerprintConfig::default(),
               parallel_threshold: PARALLEL_SCORING_THRESHOLD,
               id_column: "COCONUT_ID".to_string(),
               smiles_column: "SMILES".to_string(),
               cluster_column: "Cluster".to_string(),
               precision: DEFAULT_PRECISION }
    }
}

fn parsed<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, CoreError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v.parse().map_err(|_| CoreError::Config(format!("{key}: valor inválido '{v}'"))),
    }
}

impl AppConfig {
    /// Lee la configuración del entorno (tras cargar `.env`).
    pub fn from_env() -> Result<Self, CoreError> {
        init_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Lee la configuración desde una fuente arbitraria de variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
        where F: Fn(&str) -> Option<String>
    {
        let d = Self::default();
        let kind = match lookup("CHEMSIM_FINGERPRINT") {
            Some(v) if !v.trim().is_empty() => {
                v.parse::<FingerprintKind>()
                 .map_err(|e| CoreError::Config(format!("CHEMSIM_FINGERPRINT: {e}")))?
            }
            _ => d.fingerprint.kind,
        };
        let fingerprint = FingerprintConfig { kind,
                                              nbits: parsed("CHEMSIM_FP_BITS", lookup("CHEMSIM_FP_BITS"), d.fingerprint.nbits)?,
                                              max_path: parsed("CHEMSIM_MAX_PATH",
                                                               lookup("CHEMSIM_MAX_PATH"),
                                                               d.fingerprint.max_path)?,
                                              radius: parsed("CHEMSIM_MORGAN_RADIUS",
                                                             lookup("CHEMSIM_MORGAN_RADIUS"),
                                                             d.fingerprint.radius)?,
                                              ..d.fingerprint };
        let top_k: usize = parsed("CHEMSIM_TOP_K", lookup("CHEMSIM_TOP_K"), d.top_k)?;
        if top_k == 0 {
            return Err(CoreError::Config("CHEMSIM_TOP_K debe ser mayor que 0".into()));
        }
        let text = |key: &str, default: String| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).unwrap_or(default);

        let config = AppConfig { dataset: lookup("CHEMSIM_DATASET").filter(|v| !v.trim().is_empty()).map(PathBuf::from),
                                 top_k,
                                 fingerprint,
                                 parallel_threshold: parsed("CHEMSIM_PARALLEL_THRESHOLD",
                                                            lookup("CHEMSIM_PARALLEL_THRESHOLD"),
                                                            d.parallel_threshold)?,
                                 id_column: text("CHEMSIM_ID_COLUMN", d.id_column),
                                 smiles_column: text("CHEMSIM_SMILES_COLUMN", d.smiles_column),
                                 cluster_column: text("CHEMSIM_CLUSTER_COLUMN", d.cluster_column),
                                 precision: parsed("CHEMSIM_PRECISION", lookup("CHEMSIM_PRECISION"), d.precision)? };
        // valida los parámetros del fingerprint antes de cargar nada
        config.fingerprint.build().map_err(|e| CoreError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Columnas del CSV según la configuración (esquema de descriptores por defecto).
    pub fn dataset_columns(&self) -> DatasetColumns {
        DatasetColumns { id: self.id_column.clone(),
                         smiles: self.smiles_column.clone(),
                         cluster: self.cluster_column.clone(),
                         descriptors: DescriptorSchema::default(),
                         precision: self.precision }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions { parallel_threshold: self.parallel_threshold }
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<Result<AppConfig, String>> = Lazy::new(|| {
    AppConfig::from_env().map_err(|e| match e {
                             CoreError::Config(message) => message,
                             other => other.to_string(),
                         })
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn global_config_matches_environment() {
        let direct = AppConfig::from_env().map_err(|e| match e {
                                              CoreError::Config(message) => message,
                                              other => other.to_string(),
                                          });
        assert_eq!(*CONFIG, direct);
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.top_k, 10);
        assert_eq!(cfg.fingerprint.nbits, 2048);
    }

    #[test]
    fn reads_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[("CHEMSIM_DATASET", "/data/coconut.csv"),
                                                  ("CHEMSIM_TOP_K", "5"),
                                                  ("CHEMSIM_FINGERPRINT", "morgan"),
                                                  ("CHEMSIM_FP_BITS", "1024"),
                                                  ("CHEMSIM_ID_COLUMN", "ID")])).unwrap();
        assert_eq!(cfg.dataset, Some(PathBuf::from("/data/coconut.csv")));
        assert_eq!(cfg.top_k, 5);
        assert_eq!(cfg.fingerprint.kind, FingerprintKind::Morgan);
        assert_eq!(cfg.fingerprint.nbits, 1024);
        assert_eq!(cfg.dataset_columns().id, "ID");
    }

    #[test]
    fn malformed_values_are_config_errors() {
        for vars in [[("CHEMSIM_TOP_K", "diez")], [("CHEMSIM_FINGERPRINT", "maccs")], [("CHEMSIM_FP_BITS", "0")],
                     [("CHEMSIM_TOP_K", "0")]]
        {
            let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, CoreError::Config(_)), "{vars:?} -> {err}");
        }
    }
}
