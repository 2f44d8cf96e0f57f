use chemengine::{ChemEngine, MolecularGraph, StructureParser};

use crate::DomainError;
use std::fmt;

/// Molécula validada: notación original + grafo resuelto.
///
/// Sólo se construye a partir de un parseo exitoso; un fallo de parseo nunca
/// produce una `Molecule` con grafo vacío.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Molecule {
    smiles: String,
    graph: MolecularGraph,
}

impl Molecule {
    /// Parsea `smiles` con el parser indicado.
    pub fn from_smiles_with<P>(parser: &P, smiles: &str) -> Result<Self, DomainError>
        where P: StructureParser + ?Sized
    {
        let graph = parser.parse(smiles)?;
        Ok(Molecule { smiles: smiles.trim().to_string(), graph })
    }

    /// Parsea `smiles` con el motor por defecto.
    pub fn new_molecule_with_smiles(smiles: &str) -> Result<Self, DomainError> {
        let engine = ChemEngine::init()?;
        let graph = engine.get_molecule(smiles)?;
        Ok(Molecule { smiles: smiles.trim().to_string(), graph })
    }

    pub fn smiles(&self) -> &str {
        &self.smiles
    }

    pub fn graph(&self) -> &MolecularGraph {
        &self.graph
    }

    pub fn into_graph(self) -> MolecularGraph {
        self.graph
    }

    pub fn atom_count(&self) -> usize {
        self.graph.atom_count()
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<smiles: {}, atoms: {}>", self.smiles, self.graph.atom_count())
    }
}
