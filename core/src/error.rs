//! Error types for Solstice

use thiserror::Error;

/// Main error type for Solstice
#[derive(Error, Debug)]
pub enum SolsticeError {
    // ============ Cryptography Errors ============
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid private key")]
    InvalidPrivateKey,

    // ============ Consensus Errors ============
    #[error("Consensus module \"{0}\" does not exist")]
    UnknownConsensusModule(String),

    #[error("No candidate block is being built")]
    NoCandidateBlock,

    #[error("Invalid consensus payload: {0}")]
    InvalidConsensusPayload(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid setting {key}: {value}")]
    InvalidSetting { key: String, value: String },

    // ============ Storage Errors ============
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("State corruption detected: {0}")]
    StateCorruption(String),

    #[error("Key storage error: {0}")]
    KeyStorageError(String),

    #[error("Message serialization failed: {0}")]
    SerializationError(String),

    #[error("Message deserialization failed: {0}")]
    DeserializationError(String),

    // ============ General Errors ============
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for SolsticeError {
    fn from(err: std::io::Error) -> Self {
        SolsticeError::StorageError(err.to_string())
    }
}

impl From<bincode::Error> for SolsticeError {
    fn from(err: bincode::Error) -> Self {
        SolsticeError::SerializationError(err.to_string())
    }
}
