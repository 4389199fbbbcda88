//! Signed-batch reconciler
//!
//! Cross-references each signed command against persisted transfer
//! records and stamps them with signing/execution metadata. Writes are
//! whole-record upserts keyed by `{transfer_id}_{recipient_address}`
//! lower-cased; each matching transfer is written at most once per pass.

use crate::proxy::{QueryProxy, NS_TRANSFERS};
use crate::service::CommandService;
use lattice_chain::{ChainReader, ReaderFactory};
use lattice_core::{normalize_chain, BatchRecord, SignBatchStamp, TransferRecord, TransferSource};
use lattice_store::{DocumentStore, MatchClause, SearchQuery};

const TRANSFER_SEARCH_SIZE: usize = 100;

impl<S, D, F> QueryProxy<S, D, F>
where
    S: CommandService,
    D: DocumentStore,
    F: ReaderFactory,
{
    /// Stamp every transfer record matching one of the batch's signed
    /// commands. `transfers` pairs each command id with its decoded
    /// transfer id.
    pub(crate) async fn reconcile_signed_batch(
        &self,
        batch: &BatchRecord,
        reader: &dyn ChainReader,
        transfers: &[(String, u64)],
    ) {
        for (command_id, transfer_id) in transfers {
            let query = SearchQuery::any_of(vec![
                MatchClause::new("confirm_deposit.transfer_id", *transfer_id),
                MatchClause::new("vote.transfer_id", *transfer_id),
                MatchClause::new("transfer_id", *transfer_id),
            ]);
            let hits = match self
                .store
                .search(NS_TRANSFERS, &query, TRANSFER_SEARCH_SIZE)
                .await
            {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!(transfer_id = *transfer_id, error = %e, "transfer lookup failed");
                    continue;
                }
            };
            if hits.is_empty() {
                continue;
            }

            let records: Vec<TransferRecord> = hits
                .into_iter()
                .filter_map(|doc| match serde_json::from_value(doc) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::debug!(transfer_id = *transfer_id, error = %e, "malformed transfer record skipped");
                        None
                    }
                })
                .collect();

            let executed = self
                .resolve_stamp_executed(batch, reader, command_id, &records)
                .await;

            let stamp = SignBatchStamp {
                chain: batch.chain.clone(),
                batch_id: batch.batch_id.clone(),
                command_id: command_id.clone(),
                transfer_id: *transfer_id,
                executed,
                created_at: batch.created_at.clone(),
            };

            for mut record in records {
                let Some(key) = record.store_key() else {
                    continue;
                };
                if let Some(source) = record.source.as_mut() {
                    source.sender_chain = Some(self.canonical_sender_chain(source));
                }
                record.sign_batch = Some(stamp.clone());
                match serde_json::to_value(&record) {
                    Ok(doc) => self.persist(NS_TRANSFERS, &key, doc).await,
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "transfer record serialization failed")
                    }
                }
            }
        }
    }

    /// A stamp is executed if any matching record already says so, the
    /// enriched command says so, or a fresh on-chain read says so. Read
    /// failures leave the value as computed.
    async fn resolve_stamp_executed(
        &self,
        batch: &BatchRecord,
        reader: &dyn ChainReader,
        command_id: &str,
        records: &[TransferRecord],
    ) -> bool {
        let mut executed = records
            .iter()
            .any(|r| r.sign_batch.as_ref().is_some_and(|s| s.executed))
            || batch
                .commands
                .iter()
                .find(|c| c.id.eq_ignore_ascii_case(command_id))
                .is_some_and(|c| c.executed);

        if !executed {
            match reader.is_command_executed(command_id).await {
                Ok(value) => executed = value,
                Err(e) => {
                    tracing::debug!(command_id = %command_id, error = %e, "executed lookup failed during reconciliation")
                }
            }
        }
        executed
    }

    /// Canonical sender chain: a known non-root chain whose address
    /// prefix matches the sender wins over the reported value.
    fn canonical_sender_chain(&self, source: &TransferSource) -> String {
        source
            .sender_address
            .as_deref()
            .and_then(|address| self.config.sender_chain_by_prefix(address))
            .map(|chain| chain.id.clone())
            .unwrap_or_else(|| {
                normalize_chain(source.sender_chain.as_deref().unwrap_or_default())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{proxy_with, scenario_batch, MockChainReader, MockCommandService};
    use lattice_store::MemoryStore;
    use serde_json::json;

    async fn seed(store: &MemoryStore, key: &str, doc: serde_json::Value) {
        store.write(NS_TRANSFERS, key, doc).await.unwrap();
    }

    #[tokio::test]
    async fn test_sender_chain_prefix_wins_over_reported_value() {
        let store = MemoryStore::new();
        seed(
            &store,
            "t1_0xr",
            json!({
                "transfer_id": 7,
                "source": {
                    "id": "T1",
                    "sender_chain": "Terra",
                    "sender_address": "osmo1sender",
                    "recipient_address": "0xR"
                }
            }),
        )
        .await;
        let (proxy, _, _) = proxy_with(MockCommandService::new(), store, MockChainReader::new());

        let batch = scenario_batch("07");
        proxy
            .reconcile_signed_batch(&batch, &MockChainReader::new(), &[("07".to_string(), 7)])
            .await;

        let transfer = proxy.store.get(NS_TRANSFERS, "t1_0xr").await.unwrap().unwrap();
        // the osmo prefix identifies osmosis regardless of what was reported
        assert_eq!(transfer["source"]["sender_chain"], json!("osmosis"));
    }

    #[tokio::test]
    async fn test_reported_chain_is_normalized_when_no_prefix_matches() {
        let store = MemoryStore::new();
        seed(
            &store,
            "t1_0xr",
            json!({
                "transfer_id": 7,
                "source": {
                    "id": "T1",
                    "sender_chain": " Terra ",
                    "sender_address": "terra1sender",
                    "recipient_address": "0xR"
                }
            }),
        )
        .await;
        let (proxy, _, _) = proxy_with(MockCommandService::new(), store, MockChainReader::new());

        proxy
            .reconcile_signed_batch(
                &scenario_batch("07"),
                &MockChainReader::new(),
                &[("07".to_string(), 7)],
            )
            .await;

        let transfer = proxy.store.get(NS_TRANSFERS, "t1_0xr").await.unwrap().unwrap();
        assert_eq!(transfer["source"]["sender_chain"], json!("terra"));
    }

    #[tokio::test]
    async fn test_match_any_stamps_all_legs() {
        let store = MemoryStore::new();
        seed(
            &store,
            "a_r",
            json!({"vote": {"transfer_id": 7}, "source": {"id": "A", "recipient_address": "R"}}),
        )
        .await;
        seed(
            &store,
            "b_r",
            json!({"confirm_deposit": {"transfer_id": 7}, "source": {"id": "B", "recipient_address": "R"}}),
        )
        .await;
        seed(
            &store,
            "c_r",
            json!({"transfer_id": 8, "source": {"id": "C", "recipient_address": "R"}}),
        )
        .await;
        let (proxy, _, _) = proxy_with(MockCommandService::new(), store, MockChainReader::new());

        proxy
            .reconcile_signed_batch(
                &scenario_batch("07"),
                &MockChainReader::new(),
                &[("07".to_string(), 7)],
            )
            .await;

        for key in ["a_r", "b_r"] {
            let doc = proxy.store.get(NS_TRANSFERS, key).await.unwrap().unwrap();
            assert_eq!(doc["sign_batch"]["command_id"], json!("07"), "{}", key);
        }
        let untouched = proxy.store.get(NS_TRANSFERS, "c_r").await.unwrap().unwrap();
        assert!(untouched.get("sign_batch").is_none());
    }

    #[tokio::test]
    async fn test_existing_stamp_keeps_executed_true() {
        let store = MemoryStore::new();
        seed(
            &store,
            "t1_r",
            json!({
                "transfer_id": 7,
                "source": {"id": "t1", "recipient_address": "r"},
                "sign_batch": {
                    "chain": "ethereum",
                    "batch_id": "OLD",
                    "command_id": "07",
                    "transfer_id": 7,
                    "executed": true,
                    "created_at": lattice_core::TimeBucket::from_unix_seconds(1_600_000_000)
                }
            }),
        )
        .await;
        let (proxy, _, _) = proxy_with(MockCommandService::new(), store, MockChainReader::new());

        // the chain now reports not-executed; the stamp must stay true
        let reader = MockChainReader::new().executed("07", false);
        proxy
            .reconcile_signed_batch(&scenario_batch("07"), &reader, &[("07".to_string(), 7)])
            .await;

        let doc = proxy.store.get(NS_TRANSFERS, "t1_r").await.unwrap().unwrap();
        assert_eq!(doc["sign_batch"]["executed"], json!(true));
        assert_eq!(doc["sign_batch"]["batch_id"], json!("BATCH1"));
        assert_eq!(reader.executed_calls(), 0);
    }

    #[tokio::test]
    async fn test_enriched_command_flag_avoids_onchain_read() {
        let store = MemoryStore::new();
        seed(
            &store,
            "t1_r",
            json!({"transfer_id": 7, "source": {"id": "t1", "recipient_address": "r"}}),
        )
        .await;
        let (proxy, _, _) = proxy_with(MockCommandService::new(), store, MockChainReader::new());

        let mut batch = scenario_batch("07");
        batch.commands[0].executed = true;
        let reader = MockChainReader::new();
        proxy
            .reconcile_signed_batch(&batch, &reader, &[("07".to_string(), 7)])
            .await;

        let doc = proxy.store.get(NS_TRANSFERS, "t1_r").await.unwrap().unwrap();
        assert_eq!(doc["sign_batch"]["executed"], json!(true));
        assert_eq!(reader.executed_calls(), 0);
    }

    #[tokio::test]
    async fn test_onchain_failure_leaves_executed_false() {
        let store = MemoryStore::new();
        seed(
            &store,
            "t1_r",
            json!({"transfer_id": 7, "source": {"id": "t1", "recipient_address": "r"}}),
        )
        .await;
        let (proxy, _, _) = proxy_with(MockCommandService::new(), store, MockChainReader::new());

        let reader = MockChainReader::new().fail_executed();
        proxy
            .reconcile_signed_batch(&scenario_batch("07"), &reader, &[("07".to_string(), 7)])
            .await;

        let doc = proxy.store.get(NS_TRANSFERS, "t1_r").await.unwrap().unwrap();
        assert_eq!(doc["sign_batch"]["executed"], json!(false));
    }

    #[tokio::test]
    async fn test_records_without_source_id_are_skipped() {
        let store = MemoryStore::new();
        seed(&store, "orphan", json!({"transfer_id": 7, "source": {"recipient_address": "r"}})).await;
        seed(
            &store,
            "kept",
            json!({"transfer_id": 7, "source": {"id": "Kept", "recipient_address": "0xAB"}}),
        )
        .await;
        let (proxy, _, _) = proxy_with(MockCommandService::new(), store, MockChainReader::new());

        proxy
            .reconcile_signed_batch(
                &scenario_batch("07"),
                &MockChainReader::new(),
                &[("07".to_string(), 7)],
            )
            .await;

        let orphan = proxy.store.get(NS_TRANSFERS, "orphan").await.unwrap().unwrap();
        assert!(orphan.get("sign_batch").is_none());
        // the stamped copy lands under the lower-cased composite key
        let stamped = proxy.store.get(NS_TRANSFERS, "kept_0xab").await.unwrap().unwrap();
        assert_eq!(stamped["sign_batch"]["transfer_id"], json!(7));
    }
}
