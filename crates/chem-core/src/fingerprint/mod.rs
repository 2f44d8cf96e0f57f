//! Fingerprints estructurales de ancho fijo.
//!
//! Un `Fingerprint` es un vector de bits inmutable. Dos fingerprints con el
//! mismo contenido son indistinguibles: la igualdad compara `(nbits, words)`
//! y nunca el origen.
//!
//! El trait `Fingerprinter` es la costura entre el índice y el esquema
//! concreto; el índice guarda el suyo para que las consultas se calculen con
//! las mismas reglas que la biblioteca.

mod morgan;
mod path;

pub use morgan::MorganFingerprinter;
pub use path::PathFingerprinter;

use chemengine::MolecularGraph;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::constants::{DEFAULT_BITS_PER_HASH, DEFAULT_FP_SIZE, DEFAULT_MAX_PATH, DEFAULT_MIN_PATH, DEFAULT_MORGAN_RADIUS};
use crate::errors::CoreEngineError;
use crate::hashing::hash_bytes;

/// Vector de bits de ancho fijo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    nbits: usize,
    words: Vec<u64>,
}

impl Fingerprint {
    /// Fingerprint vacío de `nbits` bits.
    pub fn new(nbits: usize) -> Self {
        Self { nbits, words: vec![0u64; nbits.div_ceil(64)] }
    }

    /// Fingerprint con los bits indicados activos (posiciones plegadas a
    /// `nbits`).
    pub fn from_bits<I>(nbits: usize, positions: I) -> Self
        where I: IntoIterator<Item = usize>
    {
        let mut fp = Self::new(nbits);
        for pos in positions {
            fp.set_bit(pos);
        }
        fp
    }

    /// Activa un bit; la posición se pliega módulo `nbits`.
    pub fn set_bit(&mut self, pos: usize) {
        if self.nbits == 0 {
            return;
        }
        let pos = pos % self.nbits;
        self.words[pos / 64] |= 1u64 << (pos % 64);
    }

    pub fn get_bit(&self, pos: usize) -> bool {
        if pos >= self.nbits {
            return false;
        }
        (self.words[pos / 64] >> (pos % 64)) & 1 == 1
    }

    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn nbits(&self) -> usize {
        self.nbits
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Hash blake3 (hex) del contenido de bits.
    pub fn content_hash(&self) -> String {
        let mut bytes = Vec::with_capacity(8 + self.words.len() * 8);
        bytes.extend_from_slice(&(self.nbits as u64).to_le_bytes());
        for word in &self.words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        hash_bytes(&bytes)
    }
}

/// Esquema de fingerprint: grafo → vector de bits.
///
/// Implementaciones deben ser deterministas (mismo grafo, mismos bits) y
/// aceptar grafos sin enlaces.
pub trait Fingerprinter: Send + Sync + fmt::Debug {
    fn fingerprint(&self, graph: &MolecularGraph) -> Fingerprint;

    /// Ancho de los fingerprints producidos.
    fn nbits(&self) -> usize;

    /// Parámetros del esquema; entran en el hash de contenido del índice.
    fn params(&self) -> serde_json::Value;
}

impl<F: Fingerprinter + ?Sized> Fingerprinter for Arc<F> {
    fn fingerprint(&self, graph: &MolecularGraph) -> Fingerprint {
        (**self).fingerprint(graph)
    }

    fn nbits(&self) -> usize {
        (**self).nbits()
    }

    fn params(&self) -> serde_json::Value {
        (**self).params()
    }
}

impl<F: Fingerprinter + ?Sized> Fingerprinter for Box<F> {
    fn fingerprint(&self, graph: &MolecularGraph) -> Fingerprint {
        (**self).fingerprint(graph)
    }

    fn nbits(&self) -> usize {
        (**self).nbits()
    }

    fn params(&self) -> serde_json::Value {
        (**self).params()
    }
}

/// Esquemas disponibles por configuración.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintKind {
    /// Caminos lineales (topológico).
    #[default]
    Path,
    /// Entornos circulares (tipo ECFP).
    Morgan,
}

impl fmt::Display for FingerprintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FingerprintKind::Path => write!(f, "path"),
            FingerprintKind::Morgan => write!(f, "morgan"),
        }
    }
}

impl FromStr for FingerprintKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" | "topological" => Ok(FingerprintKind::Path),
            "morgan" | "ecfp" => Ok(FingerprintKind::Morgan),
            other => Err(format!("unknown fingerprint kind '{other}' (expected path|morgan)")),
        }
    }
}

/// Parámetros de construcción de un `Fingerprinter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintConfig {
    pub kind: FingerprintKind,
    pub nbits: usize,
    pub min_path: usize,
    pub max_path: usize,
    pub bits_per_hash: usize,
    pub radius: usize,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self { kind: FingerprintKind::Path,
               nbits: DEFAULT_FP_SIZE,
               min_path: DEFAULT_MIN_PATH,
               max_path: DEFAULT_MAX_PATH,
               bits_per_hash: DEFAULT_BITS_PER_HASH,
               radius: DEFAULT_MORGAN_RADIUS }
    }
}

impl FingerprintConfig {
    /// Construye el fingerprinter descrito.
    ///
    /// # Errores
    /// `CoreEngineError::Internal` si `nbits` o `bits_per_hash` son cero, o si
    /// `min_path > max_path`.
    pub fn build(&self) -> Result<Arc<dyn Fingerprinter>, CoreEngineError> {
        if self.nbits == 0 {
            return Err(CoreEngineError::Internal("fingerprint width must be > 0".to_string()));
        }
        match self.kind {
            FingerprintKind::Path => {
                if self.min_path > self.max_path {
                    return Err(CoreEngineError::Internal(format!("min_path ({}) > max_path ({})",
                                                                 self.min_path, self.max_path)));
                }
                if self.bits_per_hash == 0 {
                    return Err(CoreEngineError::Internal("bits_per_hash must be > 0".to_string()));
                }
                Ok(Arc::new(PathFingerprinter::new(self.nbits, self.min_path, self.max_path, self.bits_per_hash)))
            }
            FingerprintKind::Morgan => Ok(Arc::new(MorganFingerprinter::new(self.radius, self.nbits))),
        }
    }
}

// FNV-1a de 64 bits sobre palabras little-endian; compartido por los esquemas.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

pub(crate) fn fnv1a_init() -> u64 {
    FNV_OFFSET
}

pub(crate) fn fnv1a_update(hash: u64, value: u64) -> u64 {
    let mut h = hash;
    for b in value.to_le_bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemengine::parse_smiles;

    #[test]
    fn bit_operations() {
        let mut fp = Fingerprint::new(128);
        assert!(!fp.get_bit(42));
        fp.set_bit(42);
        assert!(fp.get_bit(42));
        fp.set_bit(128 + 100);
        assert!(fp.get_bit(100));
        assert_eq!(fp.count_ones(), 2);
        assert!(!fp.get_bit(500));
    }

    #[test]
    fn equality_ignores_origin() {
        let a = Fingerprint::from_bits(64, [1, 5, 9]);
        let b = Fingerprint::from_bits(64, [9, 5, 1, 65]);
        assert_eq!(a, b);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a, Fingerprint::from_bits(128, [1, 5, 9]));
    }

    #[test]
    fn width_not_multiple_of_word() {
        let fp = Fingerprint::from_bits(70, [69, 70]);
        assert_eq!(fp.words().len(), 2);
        assert!(fp.get_bit(69));
        assert!(fp.get_bit(0));
    }

    #[test]
    fn kind_parses_from_text() {
        assert_eq!("Morgan".parse::<FingerprintKind>().unwrap(), FingerprintKind::Morgan);
        assert_eq!(" path ".parse::<FingerprintKind>().unwrap(), FingerprintKind::Path);
        assert!("maccs".parse::<FingerprintKind>().is_err());
    }

    #[test]
    fn config_builds_requested_scheme() {
        let g = parse_smiles("c1ccccc1O").unwrap();
        let path = FingerprintConfig::default().build().unwrap();
        let morgan = FingerprintConfig { kind: FingerprintKind::Morgan, nbits: 1024, ..Default::default() }.build()
                                                                                                           .unwrap();
        assert_eq!(path.nbits(), 2048);
        assert_eq!(morgan.nbits(), 1024);
        assert_eq!(path.params()["scheme"], "path");
        assert_eq!(morgan.params()["scheme"], "morgan");
        assert_eq!(morgan.fingerprint(&g).nbits(), 1024);
    }

    #[test]
    fn config_rejects_invalid_parameters() {
        assert!(FingerprintConfig { nbits: 0, ..Default::default() }.build().is_err());
        assert!(FingerprintConfig { min_path: 5, max_path: 2, ..Default::default() }.build().is_err());
        assert!(FingerprintConfig { bits_per_hash: 0, ..Default::default() }.build().is_err());
    }
}
