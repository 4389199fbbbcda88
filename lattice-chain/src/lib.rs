//! LATTICE Chain - Read-Only On-Chain Access
//!
//! The two contract reads the enrichment and reconciliation passes need,
//! behind a trait so tests can substitute deterministic readers. The
//! production implementation speaks raw `eth_call` JSON-RPC; every
//! failure is surfaced as a [`ChainError`] and callers are expected to
//! swallow it at the point of use.

pub mod abi;
pub mod rpc;

pub use rpc::EvmRpcReader;

use async_trait::async_trait;
use lattice_core::{AssetContractConfig, ChainError, EvmChainConfig};
use std::sync::Arc;

/// Result type for on-chain reads.
pub type ChainResult<T> = Result<T, ChainError>;

/// Read-only access to one chain's gateway and token contracts.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Whether the gateway has executed the given command id.
    async fn is_command_executed(&self, command_id: &str) -> ChainResult<bool>;

    /// The deterministic deposit address derived from a salt on the
    /// chain's token contract.
    async fn deposit_address(&self, salt: &str) -> ChainResult<String>;
}

/// Builds per-chain readers from configuration.
///
/// The enrichment engine resolves a batch's chain at request time; this
/// seam lets it construct the matching reader without knowing the
/// transport, and lets tests inject canned readers.
pub trait ReaderFactory: Send + Sync {
    fn reader(
        &self,
        chain: &EvmChainConfig,
        token_contract: Option<&AssetContractConfig>,
    ) -> Arc<dyn ChainReader>;
}

/// Production factory: one shared HTTP client, JSON-RPC readers.
#[derive(Debug, Clone, Default)]
pub struct EvmReaderFactory {
    client: reqwest::Client,
}

impl EvmReaderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ReaderFactory for EvmReaderFactory {
    fn reader(
        &self,
        chain: &EvmChainConfig,
        token_contract: Option<&AssetContractConfig>,
    ) -> Arc<dyn ChainReader> {
        Arc::new(EvmRpcReader::new(
            self.client.clone(),
            chain.endpoint.clone(),
            chain.id.clone(),
            chain.gateway_address.clone(),
            token_contract.map(|c| c.contract_address.clone()),
        ))
    }
}
