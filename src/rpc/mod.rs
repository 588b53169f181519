//! Read-only chain access.
//!
//! The resolution engine talks to chains through [`ChainReader`] only, so the
//! alloy-backed [`RpcClient`] can be swapped for `mock::MockChain` in tests.

#[cfg(test)]
pub mod mock;

use crate::error::{TrackerError, TrackerResult};
use crate::registry::Network;
use crate::types::{LogEntry, Receipt};
use alloy_primitives::{Address, Bytes, TxKind, B256};
use alloy_provider::network::ReceiptResponse;
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types::{Filter, TransactionInput, TransactionReceipt, TransactionRequest};
use alloy_transport_http::Http;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// JSON-RPC code geth and nitro use for `execution reverted`.
const REVERT_ERROR_CODE: i64 = 3;

/// Result of an `eth_call`: reverts are an expected answer for several
/// precompile queries, so they are kept apart from transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Success(Bytes),
    Reverted(String),
}

impl CallOutcome {
    /// Treats a revert as an RPC error carrying the node's reason.
    pub fn expect_success(self, chain_id: u64) -> TrackerResult<Bytes> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Reverted(reason) => Err(TrackerError::rpc(chain_id, reason)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub address: Address,
    pub topic0: B256,
    pub topic1: Option<B256>,
    pub from_block: u64,
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    fn chain_id(&self) -> u64;

    /// `None` when the node does not know the transaction.
    async fn transaction_receipt(&self, tx_hash: B256) -> TrackerResult<Option<Receipt>>;

    async fn block_number(&self) -> TrackerResult<u64>;

    /// Number of the block with this hash, `None` if the node does not know it.
    async fn block_number_by_hash(&self, block_hash: B256) -> TrackerResult<Option<u64>>;

    async fn call(&self, to: Address, data: Bytes) -> TrackerResult<CallOutcome>;

    async fn logs(&self, query: &LogQuery) -> TrackerResult<Vec<LogEntry>>;
}

/// Opens readers for registry entries.
pub trait Connector: Send + Sync {
    fn connect(&self, network: &Network) -> TrackerResult<Arc<dyn ChainReader>>;
}

#[derive(Clone)]
pub struct RpcClient {
    pub chain_id: u64,
    pub provider: RootProvider,
}

impl RpcClient {
    pub fn new(chain_id: u64, url: &str, timeout: Duration) -> TrackerResult<Self> {
        let endpoint = url::Url::parse(url).map_err(|err| TrackerError::rpc(chain_id, err))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TrackerError::rpc(chain_id, err))?;
        let transport = Http::with_client(http, endpoint);
        let client = alloy_rpc_client::RpcClient::new(transport, false);
        Ok(Self {
            chain_id,
            provider: RootProvider::new(client),
        })
    }

    pub async fn chain_id_from_node(&self) -> TrackerResult<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|err| TrackerError::rpc(self.chain_id, err))
    }
}

fn receipt_from_rpc(receipt: &TransactionReceipt) -> Receipt {
    let logs = receipt
        .inner
        .logs()
        .iter()
        .map(|log| LogEntry {
            address: log.inner.address,
            topics: log.inner.data.topics().to_vec(),
            data: log.inner.data.data.clone(),
        })
        .collect();
    Receipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number.unwrap_or_default(),
        block_hash: receipt.block_hash.unwrap_or_default(),
        success: ReceiptResponse::status(receipt),
        logs,
    }
}

#[async_trait]
impl ChainReader for RpcClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> TrackerResult<Option<Receipt>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|err| TrackerError::rpc(self.chain_id, err))?;
        Ok(receipt.as_ref().map(receipt_from_rpc))
    }

    async fn block_number(&self) -> TrackerResult<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|err| TrackerError::rpc(self.chain_id, err))
    }

    async fn block_number_by_hash(&self, block_hash: B256) -> TrackerResult<Option<u64>> {
        let block = self
            .provider
            .get_block_by_hash(block_hash)
            .await
            .map_err(|err| TrackerError::rpc(self.chain_id, err))?;
        Ok(block.map(|block| block.header.number))
    }

    async fn call(&self, to: Address, data: Bytes) -> TrackerResult<CallOutcome> {
        let request = TransactionRequest {
            to: Some(TxKind::Call(to)),
            input: TransactionInput::new(data),
            ..Default::default()
        };
        match self.provider.call(request).await {
            Ok(output) => Ok(CallOutcome::Success(output)),
            Err(err) => {
                if let Some(payload) = err.as_error_resp() {
                    if payload.code == REVERT_ERROR_CODE || payload.message.contains("revert") {
                        return Ok(CallOutcome::Reverted(payload.message.to_string()));
                    }
                }
                Err(TrackerError::rpc(self.chain_id, err))
            }
        }
    }

    async fn logs(&self, query: &LogQuery) -> TrackerResult<Vec<LogEntry>> {
        let mut filter = Filter::new()
            .address(query.address)
            .event_signature(query.topic0)
            .from_block(query.from_block);
        if let Some(topic1) = query.topic1 {
            filter = filter.topic1(topic1);
        }
        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|err| TrackerError::rpc(self.chain_id, err))?;
        Ok(logs
            .into_iter()
            .map(|log| LogEntry {
                address: log.inner.address,
                topics: log.inner.data.topics().to_vec(),
                data: log.inner.data.data,
            })
            .collect())
    }
}

/// Connects over HTTP with a per-request timeout.
#[derive(Debug, Clone, Copy)]
pub struct RpcConnector {
    pub rpc_timeout: Duration,
}

impl Connector for RpcConnector {
    fn connect(&self, network: &Network) -> TrackerResult<Arc<dyn ChainReader>> {
        tracing::debug!(chain_id = network.chain_id, name = %network.name, "opening rpc client");
        let client = RpcClient::new(network.chain_id, &network.rpc_url, self.rpc_timeout)?;
        Ok(Arc::new(client))
    }
}
