//! External command-service client
//!
//! The service executes node-CLI commands on the proxy's behalf and
//! returns their stdout. It is specified only at this boundary; the
//! trait lets tests substitute canned executions.

use async_trait::async_trait;
use lattice_core::{CliResponse, ServiceError};
use std::collections::BTreeMap;

/// Parameters of one query. `cmd` is the opaque command string;
/// `created_at` (unix seconds) is an optional caller-supplied creation
/// time for the records the command describes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams {
    pub cmd: String,
    pub created_at: Option<i64>,
    /// Additional parameters forwarded verbatim.
    pub extra: BTreeMap<String, String>,
}

impl QueryParams {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            ..Self::default()
        }
    }

    pub fn with_created_at(mut self, secs: i64) -> Self {
        self.created_at = Some(secs);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Render as query-string pairs.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("cmd".to_string(), self.cmd.clone())];
        if let Some(created_at) = self.created_at {
            pairs.push(("created_at".to_string(), created_at.to_string()));
        }
        pairs.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }
}

/// Command-execution collaborator.
#[async_trait]
pub trait CommandService: Send + Sync {
    /// Execute a command and return its raw response.
    async fn execute(&self, path: &str, params: &QueryParams) -> Result<CliResponse, ServiceError>;
}

/// HTTP command service speaking `GET <base>/<path>?cmd=...`.
pub struct HttpCommandService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCommandService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CommandService for HttpCommandService {
    async fn execute(&self, path: &str, params: &QueryParams) -> Result<CliResponse, ServiceError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .get(&url)
            .query(&params.to_query_pairs())
            .send()
            .await
            .map_err(|e| ServiceError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|e| ServiceError::InvalidBody {
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for HttpCommandService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCommandService")
            .field("base_url", &self.base_url)
            .finish()
    }
}
