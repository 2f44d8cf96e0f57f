//! Coeficiente de Tanimoto sobre conjuntos de bits.

use crate::errors::CoreEngineError;
use crate::fingerprint::Fingerprint;

/// |a ∧ b| / |a ∨ b|, palabra a palabra, sin reservar memoria.
///
/// Dos fingerprints sin bits activos dan `0.0`. Los anchos deben coincidir;
/// si no, sólo se comparan las palabras comunes (usar `try_tanimoto` cuando
/// el ancho no esté garantizado).
pub fn tanimoto(a: &Fingerprint, b: &Fingerprint) -> f64 {
    debug_assert_eq!(a.nbits(), b.nbits(), "fingerprints must have the same width");
    let mut both = 0u32;
    let mut either = 0u32;
    for (x, y) in a.words().iter().zip(b.words()) {
        both += (x & y).count_ones();
        either += (x | y).count_ones();
    }
    if either == 0 {
        return 0.0;
    }
    both as f64 / either as f64
}

/// Variante verificada de [`tanimoto`].
pub fn try_tanimoto(a: &Fingerprint, b: &Fingerprint) -> Result<f64, CoreEngineError> {
    if a.nbits() != b.nbits() {
        return Err(CoreEngineError::FingerprintSizeMismatch { expected: a.nbits(), found: b.nbits() });
    }
    Ok(tanimoto(a, b))
}

/// Puntúa `query` contra cada objetivo, en orden.
pub fn tanimoto_bulk(query: &Fingerprint, targets: &[Fingerprint]) -> Vec<f64> {
    targets.iter().map(|t| tanimoto(query, t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_is_one() {
        let a = Fingerprint::from_bits(256, [3, 70, 200]);
        assert_eq!(tanimoto(&a, &a), 1.0);
    }

    #[test]
    fn zero_vs_zero_is_zero() {
        let z = Fingerprint::new(256);
        assert_eq!(tanimoto(&z, &z), 0.0);
        assert_eq!(tanimoto(&z, &Fingerprint::from_bits(256, [1])), 0.0);
    }

    #[test]
    fn partial_overlap() {
        let a = Fingerprint::from_bits(128, [1, 2]);
        let b = Fingerprint::from_bits(128, [2, 3, 4]);
        assert_eq!(tanimoto(&a, &b), 0.25);
        assert_eq!(tanimoto_bulk(&a, &[a.clone(), b]), vec![1.0, 0.25]);
    }

    #[test]
    fn width_mismatch_is_reported() {
        let a = Fingerprint::new(64);
        let b = Fingerprint::new(128);
        assert_eq!(try_tanimoto(&a, &b),
                   Err(CoreEngineError::FingerprintSizeMismatch { expected: 64, found: 128 }));
    }
}
