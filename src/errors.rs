//! Error types for vaultgate

use thiserror::Error;

/// Main error type for vaultgate operations
///
/// A signing intent blocked by policy is NOT an error; it is a normal
/// `Decision` return. These variants cover misconfiguration and malformed
/// input, which fail fast instead of defaulting to allow or deny.
#[derive(Error, Debug)]
pub enum VaultGateError {
    // Evaluation input errors
    #[error("Invalid key ref: {0}")]
    InvalidKeyRef(String),

    // Policy errors
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Failed to load policy: {0}")]
    PolicyLoadFailed(String),

    // Audit errors
    #[error("Audit sink error: {0}")]
    AuditError(String),

    // Security errors
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Internal errors
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for VaultGateError {
    fn from(err: std::io::Error) -> Self {
        VaultGateError::PolicyLoadFailed(err.to_string())
    }
}

impl From<serde_json::Error> for VaultGateError {
    fn from(err: serde_json::Error) -> Self {
        VaultGateError::PolicyLoadFailed(format!("JSON error: {}", err))
    }
}

/// Convert VaultGateError to tonic::Status for gRPC responses
impl From<VaultGateError> for tonic::Status {
    fn from(err: VaultGateError) -> Self {
        match err {
            VaultGateError::InvalidKeyRef(_) | VaultGateError::InvalidPolicy(_) => {
                tonic::Status::invalid_argument(err.to_string())
            }
            VaultGateError::SecurityViolation(_) => {
                tonic::Status::unauthenticated(err.to_string())
            }
            VaultGateError::ConfigError(_) | VaultGateError::PolicyLoadFailed(_) => {
                tonic::Status::failed_precondition(err.to_string())
            }
            _ => tonic::Status::internal(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultGateError>;
