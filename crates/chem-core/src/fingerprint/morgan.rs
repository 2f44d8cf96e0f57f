//! Fingerprint circular (tipo ECFP).
//!
//! Cada átomo arranca con un identificador derivado de sus invariantes
//! locales. En cada iteración el identificador absorbe los de sus vecinos
//! (ordenados por orden de enlace e identificador) y el entorno crece en los
//! enlaces alcanzados. Un entorno que cubre exactamente los mismos enlaces que
//! otro ya emitido no activa bit; la iteración termina antes de `radius` si
//! ningún entorno crece.

use chemengine::MolecularGraph;
use serde_json::json;
use std::collections::HashSet;

use super::{fnv1a_init, fnv1a_update, Fingerprint, Fingerprinter};
use crate::constants::{DEFAULT_FP_SIZE, DEFAULT_MORGAN_RADIUS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MorganFingerprinter {
    radius: usize,
    nbits: usize,
}

impl Default for MorganFingerprinter {
    fn default() -> Self {
        Self::new(DEFAULT_MORGAN_RADIUS, DEFAULT_FP_SIZE)
    }
}

impl MorganFingerprinter {
    pub fn new(radius: usize, nbits: usize) -> Self {
        Self { radius, nbits }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    fn emit(&self, fp: &mut Fingerprint, identifier: u64) {
        fp.set_bit((identifier % self.nbits as u64) as usize);
    }
}

/// Entorno de un átomo tras una iteración.
#[derive(Debug, Clone)]
struct Environment {
    identifier: u64,
    // índices de enlace cubiertos, ordenados y sin repetir
    bonds: Vec<usize>,
}

fn atom_invariant(graph: &MolecularGraph, ring_atoms: &[bool], atom: usize) -> u64 {
    let a = &graph.atoms()[atom];
    [a.atomic_number as u64,
     graph.degree(atom) as u64,
     a.hydrogens as u64,
     a.formal_charge as i64 as u64,
     ring_atoms[atom] as u64,
     a.aromatic as u64].into_iter()
                       .fold(fnv1a_init(), fnv1a_update)
}

fn grow(graph: &MolecularGraph, layer: &[Environment], atom: usize) -> Environment {
    let adjacent = graph.neighbors(atom);
    let mut keyed: Vec<(u8, u64)> = adjacent.iter()
                                            .map(|&(nbr, bond)| (graph.bonds()[bond].order.code(), layer[nbr].identifier))
                                            .collect();
    keyed.sort_unstable();
    let seed = fnv1a_update(fnv1a_init(), layer[atom].identifier);
    let identifier = keyed.iter()
                          .fold(seed, |h, &(order, id)| fnv1a_update(fnv1a_update(h, order as u64), id));

    let mut bonds = layer[atom].bonds.clone();
    for &(nbr, bond) in adjacent {
        bonds.push(bond);
        bonds.extend_from_slice(&layer[nbr].bonds);
    }
    bonds.sort_unstable();
    bonds.dedup();
    Environment { identifier, bonds }
}

impl Fingerprinter for MorganFingerprinter {
    fn fingerprint(&self, graph: &MolecularGraph) -> Fingerprint {
        let n = graph.atom_count();
        let mut fp = Fingerprint::new(self.nbits);
        if n == 0 || self.nbits == 0 {
            return fp;
        }

        let ring_atoms = graph.ring_atoms();
        let mut layer: Vec<Environment> =
            (0..n).map(|i| Environment { identifier: atom_invariant(graph, &ring_atoms, i), bonds: Vec::new() })
                  .collect();
        for env in &layer {
            self.emit(&mut fp, env.identifier);
        }

        let mut seen: HashSet<Vec<usize>> = HashSet::new();
        for _ in 0..self.radius {
            let next: Vec<Environment> = (0..n).map(|i| grow(graph, &layer, i)).collect();

            // a igual cobertura gana el identificador menor
            let mut fresh: Vec<&Environment> =
                next.iter().filter(|env| !env.bonds.is_empty() && !seen.contains(&env.bonds)).collect();
            fresh.sort_by(|a, b| a.bonds.cmp(&b.bonds).then(a.identifier.cmp(&b.identifier)));
            fresh.dedup_by(|later, earlier| later.bonds == earlier.bonds);
            for env in fresh {
                self.emit(&mut fp, env.identifier);
                seen.insert(env.bonds.clone());
            }

            let grew = next.iter().zip(&layer).any(|(after, before)| after.bonds.len() > before.bonds.len());
            layer = next;
            if !grew {
                break;
            }
        }
        fp
    }

    fn nbits(&self) -> usize {
        self.nbits
    }

    fn params(&self) -> serde_json::Value {
        json!({
            "scheme": "morgan",
            "nbits": self.nbits,
            "radius": self.radius,
        })
    }
}
