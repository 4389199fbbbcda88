//! Error types for LATTICE operations

use thiserror::Error;

/// Document store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Backend error in namespace {namespace}: {reason}")]
    Backend { namespace: String, reason: String },

    #[error("Serialization failed in namespace {namespace}: {reason}")]
    Serialization { namespace: String, reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// On-chain read errors.
///
/// All of these are swallowed at the point of use by the enrichment and
/// reconciliation passes; the variants exist so logs carry enough context
/// to tell an RPC transport failure from a malformed response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("RPC request to {endpoint} failed: {reason}")]
    Rpc { endpoint: String, reason: String },

    #[error("Contract call {method} returned an error: {reason}")]
    CallFailed { method: String, reason: String },

    #[error("Failed to decode {method} result: {reason}")]
    AbiDecode { method: String, reason: String },

    #[error("No {contract} contract configured for chain {chain}")]
    MissingContract { contract: String, chain: String },
}

/// External command-service errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    #[error("Command service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response body: {reason}")]
    InvalidBody { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown chain: {chain}")]
    UnknownChain { chain: String },

    #[error("Duplicate chain id in configuration: {chain}")]
    DuplicateChain { chain: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for all LATTICE errors.
#[derive(Debug, Clone, Error)]
pub enum LatticeError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for LATTICE operations.
pub type LatticeResult<T> = Result<T, LatticeError>;
