//! Shared mock collaborators for unit tests.

use crate::proxy::QueryProxy;
use crate::sampling::DepositSampler;
use crate::service::{CommandService, QueryParams};
use async_trait::async_trait;
use lattice_chain::{ChainReader, ChainResult, ReaderFactory};
use lattice_core::{
    AssetConfig, AssetContractConfig, BatchRecord, BatchStatus, ChainError, CliResponse,
    CommandParams, CommandRecord, CosmosChainConfig, EvmChainConfig, NetworkConfig,
    SamplingConfig, ServiceError, TimeBucket, ROOT_CHAIN_ID,
};
use lattice_store::MemoryStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Command service with canned responses keyed by command string.
pub(crate) struct MockCommandService {
    responses: Mutex<HashMap<String, CliResponse>>,
    calls: Mutex<Vec<String>>,
}

impl MockCommandService {
    pub(crate) fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn insert(&self, cmd: impl Into<String>, response: CliResponse) {
        self.responses.lock().unwrap().insert(cmd.into(), response);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_for(&self, cmd: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == cmd).count()
    }
}

#[async_trait]
impl CommandService for MockCommandService {
    async fn execute(&self, _path: &str, params: &QueryParams) -> Result<CliResponse, ServiceError> {
        self.calls.lock().unwrap().push(params.cmd.clone());
        self.responses
            .lock()
            .unwrap()
            .get(&params.cmd)
            .cloned()
            .ok_or_else(|| ServiceError::Transport {
                reason: format!("no canned response for: {}", params.cmd),
            })
    }
}

/// Chain reader with canned per-command and per-salt results.
#[derive(Default)]
pub(crate) struct MockChainReader {
    executed: HashMap<String, bool>,
    deposits: HashMap<String, String>,
    fail_executed: bool,
    fail_deposits: bool,
    executed_calls: AtomicUsize,
    deposit_calls: AtomicUsize,
}

impl MockChainReader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn executed(mut self, command_id: &str, value: bool) -> Self {
        self.executed.insert(command_id.to_string(), value);
        self
    }

    pub(crate) fn deposit(mut self, salt: &str, address: &str) -> Self {
        self.deposits.insert(salt.to_string(), address.to_string());
        self
    }

    pub(crate) fn fail_executed(mut self) -> Self {
        self.fail_executed = true;
        self
    }

    pub(crate) fn fail_deposits(mut self) -> Self {
        self.fail_deposits = true;
        self
    }

    pub(crate) fn executed_calls(&self) -> usize {
        self.executed_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn deposit_calls(&self) -> usize {
        self.deposit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn is_command_executed(&self, command_id: &str) -> ChainResult<bool> {
        self.executed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_executed {
            return Err(ChainError::Rpc {
                endpoint: "mock".to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(self.executed.get(command_id).copied().unwrap_or(false))
    }

    async fn deposit_address(&self, salt: &str) -> ChainResult<String> {
        self.deposit_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deposits {
            return Err(ChainError::Rpc {
                endpoint: "mock".to_string(),
                reason: "injected failure".to_string(),
            });
        }
        self.deposits
            .get(salt)
            .cloned()
            .ok_or_else(|| ChainError::CallFailed {
                method: "depositAddress".to_string(),
                reason: format!("no canned address for salt {}", salt),
            })
    }
}

/// Factory that hands out one shared mock reader for every chain.
pub(crate) struct MockReaderFactory {
    reader: Arc<MockChainReader>,
}

impl ReaderFactory for MockReaderFactory {
    fn reader(
        &self,
        _chain: &EvmChainConfig,
        _token_contract: Option<&AssetContractConfig>,
    ) -> Arc<dyn ChainReader> {
        self.reader.clone()
    }
}

/// Network configuration used across the unit tests: one EVM chain with
/// a gateway and a non-native token, the root chain, and one prefix
/// chain.
pub(crate) fn test_network_config() -> NetworkConfig {
    NetworkConfig {
        evm_chains: vec![EvmChainConfig {
            id: "ethereum".to_string(),
            chain_id: 1,
            endpoint: "http://localhost:8545".to_string(),
            gateway_address: Some("0x4f4495243837681061c4743b74b3eedf548d56a5".to_string()),
        }],
        cosmos_chains: vec![
            CosmosChainConfig {
                id: ROOT_CHAIN_ID.to_string(),
                prefix_address: "axelar".to_string(),
            },
            CosmosChainConfig {
                id: "osmosis".to_string(),
                prefix_address: "osmo".to_string(),
            },
        ],
        assets: vec![AssetConfig {
            id: "uusdc".to_string(),
            contracts: vec![AssetContractConfig {
                chain_id: 1,
                contract_address: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string(),
                is_native: false,
            }],
        }],
        sampling: SamplingConfig::default(),
    }
}

pub(crate) fn test_sampler(config: SamplingConfig) -> DepositSampler {
    DepositSampler::with_seed(config, 42)
}

/// Proxy wired to mocks, returning handles to the reader and store for
/// assertions.
pub(crate) fn proxy_with(
    service: MockCommandService,
    store: MemoryStore,
    reader: MockChainReader,
) -> (
    QueryProxy<MockCommandService, MemoryStore, MockReaderFactory>,
    Arc<MockChainReader>,
    Arc<MemoryStore>,
) {
    proxy_with_sampler(service, store, reader, test_sampler(SamplingConfig::default()))
}

pub(crate) fn proxy_with_sampler(
    service: MockCommandService,
    store: MemoryStore,
    reader: MockChainReader,
    sampler: DepositSampler,
) -> (
    QueryProxy<MockCommandService, MemoryStore, MockReaderFactory>,
    Arc<MockChainReader>,
    Arc<MemoryStore>,
) {
    let reader = Arc::new(reader);
    let store = Arc::new(store);
    let proxy = QueryProxy::with_sampler(
        Arc::new(service),
        store.clone(),
        Arc::new(MockReaderFactory {
            reader: reader.clone(),
        }),
        test_network_config(),
        sampler,
    );
    (proxy, reader, store)
}

/// Canned response with the given stdout.
pub(crate) fn stdout_response(stdout: impl Into<String>) -> CliResponse {
    CliResponse {
        stdout: Some(stdout.into()),
        ..CliResponse::default()
    }
}

/// A signed single-command batch on ethereum, for reconciler tests.
pub(crate) fn scenario_batch(command_id: &str) -> BatchRecord {
    BatchRecord {
        id: "BATCH1".to_string(),
        batch_id: "BATCH1".to_string(),
        chain: "ethereum".to_string(),
        command_ids: vec![command_id.to_string()],
        status: BatchStatus::Signed,
        created_at: TimeBucket::from_unix_seconds(1_700_000_000),
        commands: vec![CommandRecord {
            id: command_id.to_string(),
            command_type: None,
            executed: false,
            deposit_address: None,
            params: CommandParams::default(),
            extra: serde_json::Map::new(),
        }],
        extra: serde_json::Map::new(),
    }
}
