use thiserror::Error;

/// Validation failures raised while constructing or decoding domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid amount `{0}`: amounts must be finite and non-negative")]
    InvalidAmount(String),
    #[error("Unsupported transaction kind `{0}`")]
    UnsupportedTransactionKind(String),
    #[error("Invalid client: {0}")]
    InvalidClient(String),
}
