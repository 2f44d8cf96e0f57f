// chem-domain library entry point
pub mod dataset;
pub mod descriptors;
pub mod error;
pub mod molecule;
pub use dataset::{Dataset, DatasetRow};
pub use descriptors::{round_to, DescriptorSchema, Descriptors, DEFAULT_DESCRIPTORS, DEFAULT_PRECISION};
pub use error::DomainError;
pub use molecule::Molecule;
