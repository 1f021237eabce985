use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Error de decodificación: {0}")]
    Decode(String),
    #[error("Error de inferencia: {0}")]
    Inference(String),
    #[error("No encontrado: {0}")]
    NotFound(String),
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),
    #[error("Error de operación: {0}")]
    OperationFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
