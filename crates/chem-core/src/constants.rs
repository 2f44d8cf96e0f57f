//! Constantes del motor de similitud.
//!
//! `ENGINE_VERSION` forma parte del hash de contenido de cada índice: un
//! cambio en el esquema de fingerprints debe subir la versión para que dos
//! índices construidos con reglas distintas nunca compartan hash.

/// Versión lógica del motor.
pub const ENGINE_VERSION: &str = "S1.0";

/// Número de resultados por defecto de una búsqueda.
pub const DEFAULT_TOP_K: usize = 10;

/// Ancho por defecto del fingerprint (bits).
pub const DEFAULT_FP_SIZE: usize = 2048;

/// Longitud mínima de camino (en enlaces) del fingerprint topológico.
/// Con 0 los átomos aislados también aportan bits.
pub const DEFAULT_MIN_PATH: usize = 0;

/// Longitud máxima de camino (en enlaces) del fingerprint topológico.
pub const DEFAULT_MAX_PATH: usize = 7;

/// Bits activados por cada camino.
pub const DEFAULT_BITS_PER_HASH: usize = 2;

/// Radio por defecto del fingerprint circular.
pub const DEFAULT_MORGAN_RADIUS: usize = 2;

/// A partir de este tamaño de índice el scoring se reparte en el pool de rayon.
pub const PARALLEL_SCORING_THRESHOLD: usize = 4096;
