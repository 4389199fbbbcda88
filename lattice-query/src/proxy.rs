//! Cache-aside query layer
//!
//! Routes command queries through the document store before the external
//! command service, and hands recognized batched-commands output to the
//! enrichment engine so cached payloads are always the enriched form.

use crate::sampling::DepositSampler;
use crate::service::{CommandService, QueryParams};
use chrono::Utc;
use lattice_chain::ReaderFactory;
use lattice_core::{CacheEntry, CliResponse, NetworkConfig, QueryResponse};
use lattice_store::DocumentStore;
use serde_json::Value;
use std::sync::Arc;

/// Reserved command namespace; only commands under it are ever cached.
pub const CLI_NAMESPACE: &str = "axelard";

/// Default cache TTL in minutes.
pub const DEFAULT_CACHE_TTL_MINUTES: i64 = 15;

/// TTL for recursive single-command queries issued by enrichment.
pub(crate) const COMMAND_CACHE_TTL_MINUTES: i64 = 1;

/// Store namespace holding cached command responses.
pub const NS_CLI_CACHE: &str = "axelard";
/// Store namespace holding batch records.
pub const NS_BATCHES: &str = "batches";
/// Store namespace holding transfer records.
pub const NS_TRANSFERS: &str = "transfers";

const SNAPSHOT_PROXY_PREFIX: &str = "axelard q snapshot proxy ";

/// Cache-aside proxy in front of the external command service.
///
/// # Type Parameters
///
/// - `S`: the command-execution collaborator
/// - `D`: the document store
/// - `F`: per-chain reader construction
pub struct QueryProxy<S, D, F>
where
    S: CommandService,
    D: DocumentStore,
    F: ReaderFactory,
{
    pub(crate) service: Arc<S>,
    pub(crate) store: Arc<D>,
    pub(crate) readers: Arc<F>,
    pub(crate) config: NetworkConfig,
    pub(crate) sampler: DepositSampler,
}

impl<S, D, F> QueryProxy<S, D, F>
where
    S: CommandService,
    D: DocumentStore,
    F: ReaderFactory,
{
    /// Create a new proxy. The sampler draws from OS entropy; tests use
    /// [`with_sampler`](Self::with_sampler) to pin a seeded one.
    pub fn new(service: Arc<S>, store: Arc<D>, readers: Arc<F>, config: NetworkConfig) -> Self {
        let sampler = DepositSampler::new(config.sampling.clone());
        Self::with_sampler(service, store, readers, config, sampler)
    }

    pub fn with_sampler(
        service: Arc<S>,
        store: Arc<D>,
        readers: Arc<F>,
        config: NetworkConfig,
        sampler: DepositSampler,
    ) -> Self {
        Self {
            service,
            store,
            readers,
            config,
            sampler,
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Execute a command query through the cache.
    ///
    /// On a cache hit the external service is skipped entirely. On a
    /// miss the service executes the command; transport failures are
    /// embedded in the response body rather than returned as errors.
    /// Recognized batched-commands output is enriched before the
    /// response is cached or returned, so cached payloads are always the
    /// enriched form.
    pub async fn query(
        &self,
        path: &str,
        params: QueryParams,
        use_cache: bool,
        ttl_minutes: i64,
    ) -> QueryResponse {
        let cache_id = params.cmd.clone();
        let qualifies = cache_id.starts_with(CLI_NAMESPACE);
        let now = Utc::now().timestamp();

        let mut cache_hit = false;
        let mut stale: Option<CacheEntry> = None;
        let mut updated_at: Option<i64> = None;
        let mut response: Option<CliResponse> = None;

        if use_cache && qualifies {
            if let Some(entry) = self.load_cache(&cache_id).await {
                if entry.is_fresh(now, ttl_minutes) {
                    updated_at = Some(entry.updated_at);
                    response = Some(entry.response);
                    cache_hit = true;
                } else {
                    stale = Some(entry);
                }
            }
        }

        let mut response = match response {
            Some(response) => response,
            None => match self.service.execute(path, &params).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(cmd = %params.cmd, error = %e, "command service failed");
                    CliResponse::from_error(e.to_string())
                }
            },
        };

        let stdout = response.stdout.clone().filter(|s| !s.is_empty());
        if let Some(stdout) = stdout {
            if params.cmd.starts_with(SNAPSHOT_PROXY_PREFIX) {
                response.response_type = Some("proxy".to_string());
            } else if crate::enrich::is_batched_commands_query(&params.cmd) {
                if let Some(enriched) = self.enrich_batch(path, &params, &stdout).await {
                    response.stdout = Some(enriched);
                }
            }

            if use_cache && qualifies && !cache_hit {
                let entry = CacheEntry {
                    response: response.clone(),
                    updated_at: now,
                };
                self.save_cache(&cache_id, &entry).await;
                updated_at = Some(now);
            }
        } else if let Some(entry) = stale {
            // no fresh output; a stale entry beats an empty response
            updated_at = Some(entry.updated_at);
            response = entry.response;
        }

        QueryResponse {
            response,
            updated_at,
            cache_hit,
        }
    }

    /// Load a cache entry; store failures and malformed entries are
    /// treated as a miss.
    pub(crate) async fn load_cache(&self, cache_id: &str) -> Option<CacheEntry> {
        let doc = match self.store.get(NS_CLI_CACHE, cache_id).await {
            Ok(doc) => doc?,
            Err(e) => {
                tracing::warn!(cmd = %cache_id, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_value(doc) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(cmd = %cache_id, error = %e, "malformed cache entry ignored");
                None
            }
        }
    }

    /// Write a cache entry; failures are logged and swallowed so the
    /// caller still receives the response.
    pub(crate) async fn save_cache(&self, cache_id: &str, entry: &CacheEntry) {
        let doc = match serde_json::to_value(entry) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(cmd = %cache_id, error = %e, "cache entry serialization failed");
                return;
            }
        };
        if let Err(e) = self.store.write(NS_CLI_CACHE, cache_id, doc).await {
            tracing::warn!(cmd = %cache_id, error = %e, "cache write failed");
        }
    }

    /// Persist a document into a namespace, logging and swallowing
    /// failures; enrichment must degrade, never abort.
    pub(crate) async fn persist(&self, namespace: &str, id: &str, doc: Value) {
        if let Err(e) = self.store.write(namespace, id, doc).await {
            tracing::warn!(namespace, id, error = %e, "store write failed");
        }
    }
}
