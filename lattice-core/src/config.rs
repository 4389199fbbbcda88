//! Network configuration
//!
//! All chain/asset metadata is an explicitly constructed, immutable
//! object injected at component construction time. Nothing in this crate
//! reads the process environment.

use crate::{ConfigError, LatticeResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Canonical id of the root (hub) chain.
pub const ROOT_CHAIN_ID: &str = "axelarnet";

/// An EVM chain the gateway contract is deployed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvmChainConfig {
    /// Canonical lower-case chain id, matched case-insensitively.
    pub id: String,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// JSON-RPC endpoint.
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_address: Option<String>,
}

/// A cosmos-side chain participating in sender-chain normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmosChainConfig {
    pub id: String,
    /// Bech32 address prefix, e.g. `osmo`.
    pub prefix_address: String,
}

/// A deployed token contract for one asset on one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetContractConfig {
    pub chain_id: u64,
    pub contract_address: String,
    #[serde(default)]
    pub is_native: bool,
}

/// A cross-chain asset and its per-chain contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub id: String,
    #[serde(default)]
    pub contracts: Vec<AssetContractConfig>,
}

/// Deposit-address resolution sampling policy.
///
/// On-chain reads are costly and most large batches do not need every
/// address resolved in a single pass; unresolved addresses are picked up
/// by later passes. The thresholds are configuration, not hidden magic
/// numbers, so tests can pin exact values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Batches smaller than this always resolve every address.
    pub small_batch_max: usize,
    /// Larger batches still resolve while fewer than this many salted
    /// commands lack an address.
    pub unresolved_salted_max: usize,
    /// Past both thresholds, resolve with this probability.
    pub sample_rate: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            small_batch_max: 15,
            unresolved_salted_max: 15,
            sample_rate: 0.3,
        }
    }
}

/// Master network configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    #[serde(default)]
    pub evm_chains: Vec<EvmChainConfig>,
    #[serde(default)]
    pub cosmos_chains: Vec<CosmosChainConfig>,
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
    #[serde(default = "SamplingConfig::default")]
    pub sampling: SamplingConfig,
}

impl NetworkConfig {
    /// Look up an EVM chain by id, case-insensitively.
    pub fn evm_chain(&self, chain: &str) -> Option<&EvmChainConfig> {
        self.evm_chains
            .iter()
            .find(|c| c.id.eq_ignore_ascii_case(chain))
    }

    /// Cosmos chains other than the root chain.
    pub fn non_root_cosmos_chains(&self) -> impl Iterator<Item = &CosmosChainConfig> {
        self.cosmos_chains.iter().filter(|c| c.id != ROOT_CHAIN_ID)
    }

    /// The non-root cosmos chain whose address prefix matches the given
    /// sender address, if any.
    pub fn sender_chain_by_prefix(&self, sender_address: &str) -> Option<&CosmosChainConfig> {
        self.non_root_cosmos_chains()
            .find(|c| sender_address.starts_with(&c.prefix_address))
    }

    /// The token contract used for deposit-address resolution on the
    /// given chain: the first configured asset with a non-native
    /// contract deployed there.
    pub fn deposit_token_contract(&self, chain_id: u64) -> Option<&AssetContractConfig> {
        self.assets
            .iter()
            .find(|a| {
                a.contracts
                    .iter()
                    .any(|c| c.chain_id == chain_id && !c.is_native)
            })
            .and_then(|a| a.contracts.iter().find(|c| c.chain_id == chain_id))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LatticeResult<()> {
        let mut seen = HashSet::new();
        for chain in &self.evm_chains {
            if !seen.insert(chain.id.to_lowercase()) {
                return Err(ConfigError::DuplicateChain {
                    chain: chain.id.clone(),
                }
                .into());
            }
        }
        if !(0.0..=1.0).contains(&self.sampling.sample_rate) {
            return Err(ConfigError::InvalidValue {
                field: "sampling.sample_rate".to_string(),
                reason: "must be within [0, 1]".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Normalize a reported chain identifier to canonical form.
pub fn normalize_chain(chain: &str) -> String {
    chain.trim().to_lowercase()
}
