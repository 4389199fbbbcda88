//! JSON-RPC reader for gateway/token contract state

use crate::abi::{
    decode_address, decode_bool, encode_bytes32_call, DEPOSIT_ADDRESS_SELECTOR,
    IS_COMMAND_EXECUTED_SELECTOR,
};
use crate::{ChainReader, ChainResult};
use async_trait::async_trait;
use lattice_core::ChainError;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Read-only contract access over raw `eth_call` JSON-RPC.
///
/// Calldata is assembled by hand from precomputed 4-byte selectors; the
/// two calls the core needs each take a single `bytes32` argument.
pub struct EvmRpcReader {
    client: reqwest::Client,
    endpoint: String,
    gateway_address: Option<String>,
    token_address: Option<String>,
    chain: String,
}

impl EvmRpcReader {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        chain: impl Into<String>,
        gateway_address: Option<String>,
        token_address: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            gateway_address,
            token_address,
            chain: chain.into(),
        }
    }

    async fn eth_call(&self, to: &str, data: String, method: &str) -> ChainResult<String> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{ "to": to, "data": data }, "latest"],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Rpc {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let response: RpcResponse = response.json().await.map_err(|e| ChainError::Rpc {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        if let Some(error) = response.error {
            return Err(ChainError::CallFailed {
                method: method.to_string(),
                reason: error.to_string(),
            });
        }
        match response.result {
            Some(Value::String(result)) => Ok(result),
            other => Err(ChainError::AbiDecode {
                method: method.to_string(),
                reason: format!("unexpected result: {:?}", other),
            }),
        }
    }
}

#[async_trait]
impl ChainReader for EvmRpcReader {
    async fn is_command_executed(&self, command_id: &str) -> ChainResult<bool> {
        let gateway = self.gateway_address.as_deref().ok_or_else(|| {
            ChainError::MissingContract {
                contract: "gateway".to_string(),
                chain: self.chain.clone(),
            }
        })?;
        let data =
            encode_bytes32_call(IS_COMMAND_EXECUTED_SELECTOR, command_id, "isCommandExecuted")?;
        let result = self.eth_call(gateway, data, "isCommandExecuted").await?;
        decode_bool(&result, "isCommandExecuted")
    }

    async fn deposit_address(&self, salt: &str) -> ChainResult<String> {
        let token = self.token_address.as_deref().ok_or_else(|| {
            ChainError::MissingContract {
                contract: "token".to_string(),
                chain: self.chain.clone(),
            }
        })?;
        let data = encode_bytes32_call(DEPOSIT_ADDRESS_SELECTOR, salt, "depositAddress")?;
        let result = self.eth_call(token, data, "depositAddress").await?;
        decode_address(&result, "depositAddress")
    }
}

impl std::fmt::Debug for EvmRpcReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmRpcReader")
            .field("endpoint", &self.endpoint)
            .field("chain", &self.chain)
            .field("gateway_address", &self.gateway_address)
            .field("token_address", &self.token_address)
            .finish()
    }
}
