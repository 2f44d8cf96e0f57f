//! chem-adapters: entrada/salida alrededor del motor de similitud.
//!
//! - `dataset`: carga del CSV de referencia (redondeo de descriptores y
//!   descarte de filas incompletas).
//! - `table`: tabla de resultados con filas centinela, JSON y texto.

pub mod dataset;
pub mod error;
pub mod table;

pub use dataset::{load_dataset, read_dataset, DatasetColumns, LoadedDataset};
pub use error::AdapterError;
pub use table::{ResultTable, TableColumns};
