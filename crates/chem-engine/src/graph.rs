//! Grafo molecular producido por el parser.
//!
//! Representación mínima (átomos, enlaces y lista de adyacencia) suficiente
//! para calcular fingerprints estructurales. No intenta ser un modelo químico
//! completo: no hay coordenadas, estereoquímica ni percepción de anillos SSSR.

/// Orden de enlace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// Contribución a la valencia (aromático cuenta como 1 sigma; el electrón
    /// pi se resuelve aparte).
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }

    /// Código estable usado como invariante en los fingerprints.
    pub fn code(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
            BondOrder::Aromatic => 5,
        }
    }
}

/// Átomo del grafo.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    /// Número atómico (0 para el comodín `*`).
    pub atomic_number: u8,
    pub formal_charge: i8,
    pub isotope: Option<u16>,
    pub aromatic: bool,
    /// Hidrógenos implícitos (subset orgánico) o explícitos (átomos entre corchetes).
    pub hydrogens: u8,
}

/// Enlace entre dos átomos (índices en `MolecularGraph::atoms`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
}

impl Bond {
    /// Devuelve el extremo opuesto a `atom`.
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom { self.end } else { self.begin }
    }
}

/// Grafo molecular completamente resuelto.
///
/// Sólo puede obtenerse de un parser exitoso (o construyéndolo a mano en
/// tests), por lo que nunca representa un fallo de parseo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MolecularGraph {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// adjacency[atom] = [(vecino, índice de enlace)]
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl MolecularGraph {
    /// Construye el grafo y su lista de adyacencia.
    pub fn new(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (idx, bond) in bonds.iter().enumerate() {
            adjacency[bond.begin].push((bond.end, idx));
            adjacency[bond.end].push((bond.begin, idx));
        }
        Self { atoms, bonds, adjacency }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Átomos distintos de hidrógeno.
    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.atomic_number != 1).count()
    }

    /// Vecinos de un átomo como pares `(vecino, índice de enlace)`.
    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    /// Enlace entre `a` y `b`, si existe.
    pub fn bond_between(&self, a: usize, b: usize) -> Option<&Bond> {
        self.adjacency[a].iter().find(|&&(n, _)| n == b).map(|&(_, bi)| &self.bonds[bi])
    }

    /// Número de fragmentos desconectados.
    pub fn fragment_count(&self) -> usize {
        let n = self.atoms.len();
        let mut seen = vec![false; n];
        let mut count = 0;
        for start in 0..n {
            if seen[start] {
                continue;
            }
            count += 1;
            let mut stack = vec![start];
            seen[start] = true;
            while let Some(cur) = stack.pop() {
                for &(next, _) in &self.adjacency[cur] {
                    if !seen[next] {
                        seen[next] = true;
                        stack.push(next);
                    }
                }
            }
        }
        count
    }

    /// Marca por enlace: `true` si el enlace pertenece a algún ciclo.
    ///
    /// Un enlace está en un anillo si y sólo si no es un puente del grafo
    /// (Tarjan, DFS iterativo para no depender de la profundidad de pila).
    pub fn ring_bonds(&self) -> Vec<bool> {
        let n = self.atoms.len();
        let mut in_ring = vec![true; self.bonds.len()];
        let mut disc = vec![usize::MAX; n];
        let mut low = vec![0usize; n];
        let mut timer = 0usize;

        for root in 0..n {
            if disc[root] != usize::MAX {
                continue;
            }
            // (átomo, enlace por el que se llegó, siguiente vecino a visitar)
            let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
            disc[root] = timer;
            low[root] = timer;
            timer += 1;

            while let Some(top) = stack.len().checked_sub(1) {
                let (atom, via, cursor) = stack[top];
                if cursor < self.adjacency[atom].len() {
                    let (next, bond) = self.adjacency[atom][cursor];
                    stack[top].2 += 1;
                    if Some(bond) == via {
                        continue;
                    }
                    if disc[next] == usize::MAX {
                        disc[next] = timer;
                        low[next] = timer;
                        timer += 1;
                        stack.push((next, Some(bond), 0));
                    } else {
                        low[atom] = low[atom].min(disc[next]);
                    }
                } else {
                    stack.pop();
                    if let (Some(bond), Some(&(parent, _, _))) = (via, stack.last()) {
                        low[parent] = low[parent].min(low[atom]);
                        if low[atom] > disc[parent] {
                            in_ring[bond] = false;
                        }
                    }
                }
            }
        }
        in_ring
    }

    /// Marca por átomo: `true` si participa en al menos un enlace de anillo.
    pub fn ring_atoms(&self) -> Vec<bool> {
        let mut atoms = vec![false; self.atoms.len()];
        for (bond, in_ring) in self.bonds.iter().zip(self.ring_bonds()) {
            if in_ring {
                atoms[bond.begin] = true;
                atoms[bond.end] = true;
            }
        }
        atoms
    }
}
