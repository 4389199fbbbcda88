//! LATTICE Query - Cache-Aside Proxy and Batch Reconciliation
//!
//! The request pipeline: a caller submits a command string through
//! [`QueryProxy::query`], which consults the document store's cache
//! before delegating to the external command service. Recognized
//! batched-commands output is enriched with on-chain facts, merged with
//! the previously persisted batch record, and persisted; batches that
//! reach the signed status are reconciled against transfer records.
//!
//! Nothing in this pipeline is fatal: transport, parse, store, and
//! on-chain failures all degrade to a best-effort result.

mod enrich;
pub mod proxy;
mod reconcile;
pub mod sampling;
pub mod service;

#[cfg(test)]
mod testing;

pub use proxy::{
    QueryProxy, CLI_NAMESPACE, DEFAULT_CACHE_TTL_MINUTES, NS_BATCHES, NS_CLI_CACHE, NS_TRANSFERS,
};
pub use sampling::DepositSampler;
pub use service::{CommandService, HttpCommandService, QueryParams};
