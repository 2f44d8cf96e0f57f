//! Fingerprint topológico por caminos lineales.
//!
//! Cada camino simple de `min_path..=max_path` enlaces se describe como la
//! secuencia `átomo, enlace, átomo, ...` de invariantes. El camino y su
//! reverso son el mismo subgrafo, así que se toma la menor de las dos
//! secuencias antes de hashear. Cada hash activa `bits_per_hash` bits
//! derivados con un LCG.

use chemengine::{Atom, MolecularGraph};
use serde_json::json;

use super::{fnv1a_init, fnv1a_update, Fingerprint, Fingerprinter};
use crate::constants::{DEFAULT_BITS_PER_HASH, DEFAULT_FP_SIZE, DEFAULT_MAX_PATH, DEFAULT_MIN_PATH};

const LCG_MUL: u64 = 6364136223846793005;
const LCG_INC: u64 = 1442695040888963407;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathFingerprinter {
    nbits: usize,
    min_path: usize,
    max_path: usize,
    bits_per_hash: usize,
}

impl Default for PathFingerprinter {
    fn default() -> Self {
        Self::new(DEFAULT_FP_SIZE, DEFAULT_MIN_PATH, DEFAULT_MAX_PATH, DEFAULT_BITS_PER_HASH)
    }
}

/// Estado del recorrido en profundidad; los buffers se reutilizan entre
/// caminos.
struct Walk<'g> {
    graph: &'g MolecularGraph,
    atoms: Vec<usize>,
    bonds: Vec<usize>,
    visited: Vec<bool>,
    seq: Vec<u64>,
}

impl PathFingerprinter {
    pub fn new(nbits: usize, min_path: usize, max_path: usize, bits_per_hash: usize) -> Self {
        Self { nbits, min_path, max_path, bits_per_hash }
    }

    pub fn min_path(&self) -> usize {
        self.min_path
    }

    pub fn max_path(&self) -> usize {
        self.max_path
    }

    pub fn bits_per_hash(&self) -> usize {
        self.bits_per_hash
    }

    fn extend(&self, walk: &mut Walk<'_>, tip: usize, fp: &mut Fingerprint) {
        if walk.bonds.len() >= self.min_path {
            let hash = path_hash(walk);
            self.set_bits(hash, fp);
        }
        if walk.bonds.len() == self.max_path {
            return;
        }
        let graph = walk.graph;
        for &(next, bond) in graph.neighbors(tip) {
            if walk.visited[next] {
                continue;
            }
            walk.visited[next] = true;
            walk.atoms.push(next);
            walk.bonds.push(bond);
            self.extend(walk, next, fp);
            walk.bonds.pop();
            walk.atoms.pop();
            walk.visited[next] = false;
        }
    }

    fn set_bits(&self, hash: u64, fp: &mut Fingerprint) {
        let mut state = hash;
        for _ in 0..self.bits_per_hash {
            state = state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
            fp.set_bit((state >> 17) as usize % self.nbits);
        }
    }
}

fn atom_invariant(atom: &Atom) -> u64 {
    (atom.atomic_number as u64) << 1 | atom.aromatic as u64
}

/// Hash canónico del camino actual (independiente del sentido de recorrido).
fn path_hash(walk: &mut Walk<'_>) -> u64 {
    walk.seq.clear();
    for (i, &atom) in walk.atoms.iter().enumerate() {
        walk.seq.push(atom_invariant(&walk.graph.atoms()[atom]));
        if let Some(&bond) = walk.bonds.get(i) {
            walk.seq.push(walk.graph.bonds()[bond].order.code() as u64);
        }
    }
    let mut h = fnv1a_update(fnv1a_init(), walk.bonds.len() as u64);
    if walk.seq.iter().le(walk.seq.iter().rev()) {
        for &v in walk.seq.iter() {
            h = fnv1a_update(h, v);
        }
    } else {
        for &v in walk.seq.iter().rev() {
            h = fnv1a_update(h, v);
        }
    }
    h
}

impl Fingerprinter for PathFingerprinter {
    fn fingerprint(&self, graph: &MolecularGraph) -> Fingerprint {
        let mut fp = Fingerprint::new(self.nbits);
        if self.nbits == 0 {
            return fp;
        }
        let n = graph.atom_count();
        let mut walk = Walk { graph,
                              atoms: Vec::with_capacity(self.max_path + 1),
                              bonds: Vec::with_capacity(self.max_path),
                              visited: vec![false; n],
                              seq: Vec::with_capacity(2 * self.max_path + 1) };
        for start in 0..n {
            walk.visited[start] = true;
            walk.atoms.push(start);
            self.extend(&mut walk, start, &mut fp);
            walk.atoms.pop();
            walk.visited[start] = false;
        }
        fp
    }

    fn nbits(&self) -> usize {
        self.nbits
    }

    fn params(&self) -> serde_json::Value {
        json!({
            "scheme": "path",
            "nbits": self.nbits,
            "min_path": self.min_path,
            "max_path": self.max_path,
            "bits_per_hash": self.bits_per_hash,
        })
    }
}
