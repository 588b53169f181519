use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;

use crate::error::{TrackerError, TrackerResult};
use crate::registry::Network;
use crate::types::{LogEntry, Receipt};

use super::{CallOutcome, ChainReader, Connector, LogQuery};

/// Canned chain state for tests. Unknown receipts are `None`, unknown calls
/// revert, and every method counts towards `requests()`.
pub struct MockChain {
    chain_id: u64,
    receipts: HashMap<B256, Receipt>,
    calls: HashMap<(Address, Bytes), CallOutcome>,
    call_errors: HashMap<(Address, Bytes), String>,
    logs: Vec<LogEntry>,
    block_number: u64,
    block_hashes: HashMap<B256, u64>,
    unreachable: bool,
    requests: AtomicUsize,
}

impl MockChain {
    pub fn builder(chain_id: u64) -> MockChainBuilder {
        MockChainBuilder {
            chain_id,
            receipts: HashMap::new(),
            calls: HashMap::new(),
            call_errors: HashMap::new(),
            logs: Vec::new(),
            block_number: 0,
            block_hashes: HashMap::new(),
            unreachable: false,
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn hit(&self) -> TrackerResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(TrackerError::rpc(self.chain_id, "connection refused"));
        }
        Ok(())
    }
}

pub struct MockChainBuilder {
    chain_id: u64,
    receipts: HashMap<B256, Receipt>,
    calls: HashMap<(Address, Bytes), CallOutcome>,
    call_errors: HashMap<(Address, Bytes), String>,
    logs: Vec<LogEntry>,
    block_number: u64,
    block_hashes: HashMap<B256, u64>,
    unreachable: bool,
}

impl MockChainBuilder {
    pub fn with_receipt(mut self, receipt: Receipt) -> Self {
        self.receipts.insert(receipt.tx_hash, receipt);
        self
    }

    pub fn with_call(mut self, to: Address, data: Bytes, output: Bytes) -> Self {
        self.calls.insert((to, data), CallOutcome::Success(output));
        self
    }

    pub fn with_call_error(mut self, to: Address, data: Bytes, message: &str) -> Self {
        self.call_errors.insert((to, data), message.to_string());
        self
    }

    pub fn with_log(mut self, log: LogEntry) -> Self {
        self.logs.push(log);
        self
    }

    pub fn with_block_number(mut self, block_number: u64) -> Self {
        self.block_number = block_number;
        self
    }

    pub fn with_block_hash(mut self, block_hash: B256, number: u64) -> Self {
        self.block_hashes.insert(block_hash, number);
        self
    }

    /// Every request fails with a transport error.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn build(self) -> Arc<MockChain> {
        Arc::new(MockChain {
            chain_id: self.chain_id,
            receipts: self.receipts,
            calls: self.calls,
            call_errors: self.call_errors,
            logs: self.logs,
            block_number: self.block_number,
            block_hashes: self.block_hashes,
            unreachable: self.unreachable,
            requests: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ChainReader for MockChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> TrackerResult<Option<Receipt>> {
        self.hit()?;
        Ok(self.receipts.get(&tx_hash).cloned())
    }

    async fn block_number(&self) -> TrackerResult<u64> {
        self.hit()?;
        Ok(self.block_number)
    }

    async fn block_number_by_hash(&self, block_hash: B256) -> TrackerResult<Option<u64>> {
        self.hit()?;
        Ok(self.block_hashes.get(&block_hash).copied())
    }

    async fn call(&self, to: Address, data: Bytes) -> TrackerResult<CallOutcome> {
        self.hit()?;
        let key = (to, data);
        if let Some(message) = self.call_errors.get(&key) {
            return Err(TrackerError::rpc(self.chain_id, message));
        }
        Ok(self
            .calls
            .get(&key)
            .cloned()
            .unwrap_or_else(|| CallOutcome::Reverted("execution reverted".into())))
    }

    async fn logs(&self, query: &LogQuery) -> TrackerResult<Vec<LogEntry>> {
        self.hit()?;
        Ok(self
            .logs
            .iter()
            .filter(|log| log.address == query.address)
            .filter(|log| log.topic0() == Some(query.topic0))
            .filter(|log| query.topic1.is_none() || log.topic(1) == query.topic1)
            .cloned()
            .collect())
    }
}

/// Hands out registered mock chains by chain id.
#[derive(Default)]
pub struct MockConnector {
    chains: HashMap<u64, Arc<MockChain>>,
    connects: AtomicUsize,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain(mut self, chain: Arc<MockChain>) -> Self {
        self.chains.insert(chain.chain_id, chain);
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Sum of requests over every registered chain.
    pub fn requests(&self) -> usize {
        self.chains.values().map(|chain| chain.requests()).sum()
    }
}

impl Connector for MockConnector {
    fn connect(&self, network: &Network) -> TrackerResult<Arc<dyn ChainReader>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.chains.get(&network.chain_id) {
            Some(chain) => Ok(chain.clone() as Arc<dyn ChainReader>),
            None => Err(TrackerError::rpc(network.chain_id, "no mock endpoint")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_calls_revert_and_are_counted() {
        let chain = MockChain::builder(1).with_block_number(7).build();
        let outcome = chain
            .call(Address::ZERO, Bytes::from(vec![1u8]))
            .await
            .unwrap();
        assert!(matches!(outcome, CallOutcome::Reverted(_)));
        assert_eq!(chain.block_number().await.unwrap(), 7);
        assert_eq!(chain.requests(), 2);
    }

    #[tokio::test]
    async fn log_query_filters_on_topic1() {
        let wanted = B256::repeat_byte(0x01);
        let chain = MockChain::builder(1)
            .with_log(LogEntry {
                address: Address::ZERO,
                topics: vec![B256::ZERO, wanted],
                data: Bytes::new(),
            })
            .with_log(LogEntry {
                address: Address::ZERO,
                topics: vec![B256::ZERO, B256::repeat_byte(0x02)],
                data: Bytes::new(),
            })
            .build();
        let query = LogQuery {
            address: Address::ZERO,
            topic0: B256::ZERO,
            topic1: Some(wanted),
            from_block: 0,
        };
        assert_eq!(chain.logs(&query).await.unwrap().len(), 1);
    }
}
