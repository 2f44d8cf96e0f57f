//! Selección top-K con desempate estable.
//!
//! Orden total: score descendente y, a igual score, posición ascendente en
//! el índice. Es exactamente el orden de un sort estable por score
//! descendente, pero se obtiene con un heap acotado de tamaño `k`.

use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::constants::PARALLEL_SCORING_THRESHOLD;
use crate::errors::CoreEngineError;
use crate::fingerprint::Fingerprint;
use crate::index::{LibraryEntry, LibraryIndex};
use crate::similarity::tanimoto;

/// Entrada rankeada. `rank` empieza en 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<'a> {
    pub rank: usize,
    pub entry: &'a LibraryEntry,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f64,
    position: usize,
}

// "Mayor" = peor candidato, para que la cima del heap sea el descartable.
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other.score
             .total_cmp(&self.score)
             .then_with(|| self.position.cmp(&other.position))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Heap acotado con los `k` mejores candidatos vistos.
struct Selector {
    k: usize,
    heap: BinaryHeap<Candidate>,
}

impl Selector {
    fn new(k: usize) -> Self {
        Self { k, heap: BinaryHeap::with_capacity(k.saturating_add(1).min(1024)) }
    }

    fn offer(&mut self, candidate: Candidate) {
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if let Some(worst) = self.heap.peek() {
            if candidate < *worst {
                self.heap.pop();
                self.heap.push(candidate);
            }
        }
    }

    fn merge(mut self, other: Selector) -> Self {
        for c in other.heap {
            self.offer(c);
        }
        self
    }

    /// Mejores primero.
    fn into_sorted(self) -> Vec<Candidate> {
        self.heap.into_sorted_vec()
    }
}

/// Top-K con el umbral de paralelismo por defecto.
pub fn top_k<'a>(query: &Fingerprint, index: &'a LibraryIndex, k: usize) -> Result<Vec<Hit<'a>>, CoreEngineError> {
    top_k_with_threshold(query, index, k, PARALLEL_SCORING_THRESHOLD)
}

/// Top-K puntuando en paralelo cuando el índice tiene al menos
/// `parallel_threshold` entradas.
///
/// Devuelve `min(k, size)` hits. Índice vacío o `k == 0` no son error.
///
/// # Errores
/// `CoreEngineError::FingerprintSizeMismatch` si el ancho de la consulta no
/// coincide con el del índice.
pub fn top_k_with_threshold<'a>(query: &Fingerprint,
                                index: &'a LibraryIndex,
                                k: usize,
                                parallel_threshold: usize)
                                -> Result<Vec<Hit<'a>>, CoreEngineError> {
    if query.nbits() != index.nbits() {
        return Err(CoreEngineError::FingerprintSizeMismatch { expected: index.nbits(), found: query.nbits() });
    }
    let entries = index.all_entries();
    if k == 0 || entries.is_empty() {
        return Ok(Vec::new());
    }

    let score = |(position, entry): (usize, &LibraryEntry)| Candidate { score: tanimoto(query, entry.fingerprint()),
                                                                         position };
    let selector = if entries.len() >= parallel_threshold {
        entries.par_iter()
               .enumerate()
               .map(score)
               .fold(|| Selector::new(k), |mut s, c| {
                   s.offer(c);
                   s
               })
               .reduce(|| Selector::new(k), Selector::merge)
    } else {
        entries.iter().enumerate().map(score).fold(Selector::new(k), |mut s, c| {
                                                  s.offer(c);
                                                  s
                                              })
    };

    Ok(selector.into_sorted()
               .into_iter()
               .enumerate()
               .map(|(i, c)| Hit { rank: i + 1, entry: &entries[c.position], score: c.score })
               .collect())
}
