//! chemengine: contrato del parser estructural y parser SMILES nativo.
//!
//! El resto del workspace sólo depende de `StructureParser` y de
//! `MolecularGraph`; `SmilesParser` es la implementación por defecto.
use thiserror::Error;

pub mod element;
pub mod graph;
pub mod smiles;

pub use graph::{Atom, Bond, BondOrder, MolecularGraph};
pub use smiles::{parse_smiles, SmilesParser};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("SMILES vacío")]
    Empty,
    #[error("Error de parseo en posición {position}: {message}")]
    Parse { position: usize, message: String },
    #[error("Valencia excedida en el átomo {atom} ({symbol})")]
    Valence { atom: usize, symbol: String },
    #[error("Átomo {atom} marcado como aromático fuera de un anillo")]
    Aromaticity { atom: usize },
}

/// Contrato del parser estructural: texto → grafo, o error de parseo.
///
/// Debe ser determinista y seguro de compartir entre hilos; el índice y el
/// orquestador de búsqueda lo invocan concurrentemente.
pub trait StructureParser: Send + Sync {
    fn parse(&self, notation: &str) -> Result<MolecularGraph, EngineError>;
}

impl<P: StructureParser + ?Sized> StructureParser for std::sync::Arc<P> {
    fn parse(&self, notation: &str) -> Result<MolecularGraph, EngineError> {
        (**self).parse(notation)
    }
}

impl<P: StructureParser + ?Sized> StructureParser for Box<P> {
    fn parse(&self, notation: &str) -> Result<MolecularGraph, EngineError> {
        (**self).parse(notation)
    }
}

/// Fachada del motor químico.
pub struct ChemEngine {
    parser: SmilesParser,
}

impl ChemEngine {
    pub fn init() -> Result<Self, EngineError> {
        Ok(Self { parser: SmilesParser })
    }

    pub fn get_molecule(&self, smiles: &str) -> Result<MolecularGraph, EngineError> {
        self.parser.parse(smiles)
    }

    /// Parser subyacente, para compartirlo con el índice y el buscador.
    pub fn parser(&self) -> SmilesParser {
        self.parser
    }
}
