//! Publicación atómica del índice vigente (rebuild-and-swap).
//!
//! Los lectores toman un `Arc` del índice actual y trabajan sobre él aunque
//! mientras tanto se publique otro. La construcción ocurre fuera del lock;
//! el lock sólo protege el intercambio del puntero.

use chem_domain::DatasetRow;
use chemengine::StructureParser;
use log::info;
use std::sync::{Arc, PoisonError, RwLock};

use crate::fingerprint::Fingerprinter;
use crate::index::{BuildReport, LibraryIndex};

#[derive(Debug)]
pub struct LibraryHandle {
    current: RwLock<Arc<LibraryIndex>>,
}

impl LibraryHandle {
    pub fn new(index: LibraryIndex) -> Self {
        Self { current: RwLock::new(Arc::new(index)) }
    }

    /// Índice vigente. Nunca observa un índice a medio construir.
    pub fn current(&self) -> Arc<LibraryIndex> {
        // el valor protegido es sólo un puntero: un lock envenenado sigue siendo válido
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Publica `index` y devuelve el anterior.
    pub fn publish(&self, index: LibraryIndex) -> Arc<LibraryIndex> {
        let next = Arc::new(index);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, next);
        drop(guard);
        info!("índice {} reemplazado por {}", previous.id(), self.current().id());
        previous
    }

    /// Construye un índice nuevo y lo publica.
    pub fn rebuild<I, P>(&self, rows: I, parser: &P, fingerprinter: Arc<dyn Fingerprinter>) -> BuildReport
        where I: IntoIterator<Item = DatasetRow>,
              P: StructureParser + ?Sized
    {
        let (index, report) = LibraryIndex::build(rows, parser, fingerprinter);
        self.publish(index);
        report
    }
}
