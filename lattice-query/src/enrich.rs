//! Batch enrichment engine
//!
//! Parses batched-commands query output, resolves missing per-command
//! facts on-chain and through recursive single-command queries, merges
//! with the previously persisted batch record, and persists the result.
//! Every failure path degrades: parse failures pass the raw output
//! through, on-chain failures leave fields unresolved.

use crate::proxy::{QueryProxy, COMMAND_CACHE_TTL_MINUTES, NS_BATCHES};
use crate::service::{CommandService, QueryParams};
use chrono::Utc;
use lattice_chain::{ChainReader, ReaderFactory};
use lattice_core::{
    normalize_chain, BatchQueryOutput, BatchRecord, CacheEntry, CommandRecord, TimeBucket,
};
use lattice_store::{DocumentStore, SearchQuery};
use std::sync::Arc;

const BATCHED_COMMANDS_PREFIX: &str = "axelard q evm batched-commands ";
const LATEST_BATCHED_COMMANDS_PREFIX: &str = "axelard q evm latest-batched-commands ";
const JSON_OUTPUT_SUFFIX: &str = " -oj";

/// Whether a command is a recognized batched-commands query.
pub(crate) fn is_batched_commands_query(cmd: &str) -> bool {
    (cmd.starts_with(BATCHED_COMMANDS_PREFIX) || cmd.starts_with(LATEST_BATCHED_COMMANDS_PREFIX))
        && cmd.ends_with(JSON_OUTPUT_SUFFIX)
}

/// The chain argument embedded in a batched-commands query.
pub(crate) fn command_chain_arg(cmd: &str) -> Option<&str> {
    cmd.split_whitespace().nth(4)
}

/// Transfer id encoded in a command id: its value as a hex integer.
///
/// Ids whose significant digits exceed a u64 cannot index a transfer
/// and yield None, as do ids that parse to zero.
pub(crate) fn transfer_id_from_command(command_id: &str) -> Option<u64> {
    let digits = command_id
        .strip_prefix("0x")
        .unwrap_or(command_id)
        .trim_start_matches('0');
    if digits.is_empty() || digits.len() > 16 {
        return None;
    }
    u64::from_str_radix(digits, 16).ok().filter(|id| *id >= 1)
}

impl<S, D, F> QueryProxy<S, D, F>
where
    S: CommandService,
    D: DocumentStore,
    F: ReaderFactory,
{
    /// Enrich parsed batched-commands output and persist the merged
    /// batch record. Returns the serialized enriched payload, or None
    /// when the output cannot be parsed (raw passthrough).
    pub(crate) async fn enrich_batch(
        &self,
        path: &str,
        params: &QueryParams,
        stdout: &str,
    ) -> Option<String> {
        let output: BatchQueryOutput = match serde_json::from_str(stdout) {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!(cmd = %params.cmd, error = %e, "unparseable batch output passed through");
                return None;
            }
        };

        let chain = normalize_chain(command_chain_arg(&params.cmd)?);
        let reader = self.chain_reader(&chain);

        let batch_id = output.id.clone();
        let previous = self.load_batch_baseline(&batch_id).await;
        let baseline = previous
            .as_ref()
            .map(|b| b.commands.clone())
            .unwrap_or_default();
        // snapshot taken before this pass mutates anything; the sampling
        // policy is judged against it for every command in the batch
        let unresolved_salted = baseline
            .iter()
            .filter(|c| c.params.salt.is_some() && c.deposit_address.is_none())
            .count();

        let mut working: Vec<Option<CommandRecord>> =
            baseline.into_iter().map(Some).collect();

        for command_id in output.command_ids.iter().filter(|id| !id.is_empty()) {
            let slot = working.iter().position(|c| {
                c.as_ref()
                    .is_some_and(|c| c.id.eq_ignore_ascii_case(command_id))
            });
            let mut command = match slot {
                Some(index) => working[index].take(),
                None => self.fetch_command(path, &chain, command_id).await,
            };

            if let Some(command) = command.as_mut() {
                self.resolve_command_facts(
                    command,
                    reader.as_deref(),
                    output.command_ids.len(),
                    unresolved_salted,
                )
                .await;
            }

            match slot {
                Some(index) => working[index] = command,
                None => working.push(command),
            }
        }

        let commands: Vec<CommandRecord> = working.into_iter().flatten().collect();

        let created_at = match params.created_at {
            Some(secs) => TimeBucket::from_unix_seconds(secs),
            None => match previous.as_ref() {
                Some(previous) => TimeBucket::from_unix_millis(previous.created_at.ms),
                None => TimeBucket::now(),
            },
        };

        let record = BatchRecord {
            id: output.id,
            batch_id: batch_id.clone(),
            chain,
            command_ids: output.command_ids,
            status: output.status,
            created_at,
            commands,
            extra: output.extra,
        };

        match serde_json::to_value(&record) {
            Ok(doc) => self.persist(NS_BATCHES, &batch_id, doc).await,
            Err(e) => {
                tracing::warn!(batch_id = %batch_id, error = %e, "batch record serialization failed")
            }
        }

        if record.status.is_signed() && !record.command_ids.is_empty() {
            if let Some(reader) = reader.as_ref() {
                let transfers: Vec<(String, u64)> = record
                    .command_ids
                    .iter()
                    .filter_map(|id| transfer_id_from_command(id).map(|t| (id.clone(), t)))
                    .collect();
                if !transfers.is_empty() {
                    self.reconcile_signed_batch(&record, reader.as_ref(), &transfers)
                        .await;
                }
            }
        }

        serde_json::to_string(&record).ok()
    }

    /// Build the per-chain reader, if the chain is configured with a
    /// gateway contract.
    fn chain_reader(&self, chain: &str) -> Option<Arc<dyn ChainReader>> {
        let chain_config = self.config.evm_chain(chain)?;
        chain_config.gateway_address.as_ref()?;
        let token = self.config.deposit_token_contract(chain_config.chain_id);
        Some(self.readers.reader(chain_config, token))
    }

    /// Load the most recently persisted record for a batch id; at most
    /// one record is read per enrichment pass.
    async fn load_batch_baseline(&self, batch_id: &str) -> Option<BatchRecord> {
        let query = SearchQuery::match_phrase("batch_id", batch_id);
        let hits = match self.store.search(NS_BATCHES, &query, 1).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(batch_id = %batch_id, error = %e, "batch baseline lookup failed");
                return None;
            }
        };
        let doc = hits.into_iter().next()?;
        match serde_json::from_value(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(batch_id = %batch_id, error = %e, "malformed batch baseline ignored");
                None
            }
        }
    }

    /// Resolve a single command's starting point through the cache-aside
    /// path with a short TTL.
    async fn fetch_command(
        &self,
        path: &str,
        chain: &str,
        command_id: &str,
    ) -> Option<CommandRecord> {
        let cmd = format!("axelard q evm command {} {} -oj", chain, command_id);
        let now = Utc::now().timestamp();

        if let Some(entry) = self.load_cache(&cmd).await {
            if entry.is_fresh(now, COMMAND_CACHE_TTL_MINUTES) {
                if let Some(stdout) = entry.response.stdout.as_deref() {
                    if let Some(command) = parse_command(stdout, command_id) {
                        return Some(command);
                    }
                }
            }
        }

        let response = match self.service.execute(path, &QueryParams::new(&cmd)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(command_id = %command_id, error = %e, "command query failed");
                return None;
            }
        };

        let stdout = response.stdout.clone()?;
        self.save_cache(
            &cmd,
            &CacheEntry {
                response,
                updated_at: now,
            },
        )
        .await;
        parse_command(&stdout, command_id)
    }

    /// Resolve `executed` and `deposit_address` on-chain. Failures leave
    /// the fields exactly as they were.
    async fn resolve_command_facts(
        &self,
        command: &mut CommandRecord,
        reader: Option<&dyn ChainReader>,
        batch_size: usize,
        unresolved_salted: usize,
    ) {
        let Some(reader) = reader else { return };

        if !command.executed {
            match reader.is_command_executed(&command.id).await {
                Ok(executed) => command.executed = executed,
                Err(e) => {
                    tracing::debug!(command_id = %command.id, error = %e, "executed lookup failed")
                }
            }
        }

        if command.deposit_address.is_none() {
            if let Some(salt) = command.params.salt.clone() {
                if self.sampler.should_resolve(batch_size, unresolved_salted) {
                    match reader.deposit_address(&salt).await {
                        Ok(address) => command.deposit_address = Some(address),
                        Err(e) => {
                            tracing::debug!(command_id = %command.id, error = %e, "deposit address resolution failed")
                        }
                    }
                }
            }
        }
    }
}

fn parse_command(stdout: &str, command_id: &str) -> Option<CommandRecord> {
    match serde_json::from_str(stdout) {
        Ok(command) => Some(command),
        Err(e) => {
            tracing::debug!(command_id = %command_id, error = %e, "unparseable command output");
            None
        }
    }
}
