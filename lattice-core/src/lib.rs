//! LATTICE Core - Entity Types
//!
//! Pure data structures shared by the proxy, store, and chain crates.
//! This crate contains ONLY data types and small pure helpers - no IO.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod time;

pub use config::{
    normalize_chain, AssetConfig, AssetContractConfig, CosmosChainConfig, EvmChainConfig,
    NetworkConfig, SamplingConfig, ROOT_CHAIN_ID,
};
pub use entities::{
    BatchQueryOutput, BatchRecord, CacheEntry, CliResponse, CommandParams, CommandRecord,
    QueryResponse, SignBatchStamp, TransferLeg, TransferRecord, TransferSource,
};
pub use enums::BatchStatus;
pub use error::{
    ChainError, ConfigError, LatticeError, LatticeResult, ServiceError, StoreError,
};
pub use time::TimeBucket;
