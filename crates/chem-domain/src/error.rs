use chemengine::EngineError;
use thiserror::Error;

/// Error del dominio químico.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("Error de validación: {0}")]
    ValidationError(String),

    #[error("Error externo: {0}")]
    ExternalError(String),

    #[error("Error de esquema: {0}")]
    SchemaError(String),
}

// El fallo del parser se expone como error externo: el dominio no conoce las
// reglas de la notación.
impl From<EngineError> for DomainError {
    fn from(e: EngineError) -> Self {
        DomainError::ExternalError(e.to_string())
    }
}
