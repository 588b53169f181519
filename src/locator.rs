//! Finds which candidate network knows a transaction hash.

use crate::error::{TrackerError, TrackerResult};
use crate::registry::Network;
use crate::rpc::{ChainReader, Connector};
use crate::types::{parse_tx_hash, Receipt};
use alloy_primitives::B256;
use futures::future::join_all;
use std::sync::Arc;

/// A receipt together with the network it was found on and an open reader
/// for that network.
#[derive(Clone)]
pub struct LocatedReceipt {
    pub receipt: Receipt,
    pub network: Arc<Network>,
    pub reader: Arc<dyn ChainReader>,
}

impl std::fmt::Debug for LocatedReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocatedReceipt")
            .field("receipt", &self.receipt)
            .field("chain_id", &self.network.chain_id)
            .finish()
    }
}

async fn probe(
    network: Arc<Network>,
    connector: &dyn Connector,
    tx_hash: B256,
) -> Option<LocatedReceipt> {
    let reader = match connector.connect(&network) {
        Ok(reader) => reader,
        Err(err) => {
            tracing::warn!(chain_id = network.chain_id, error = %err, "cannot connect, skipping");
            return None;
        }
    };
    match reader.transaction_receipt(tx_hash).await {
        Ok(Some(receipt)) => Some(LocatedReceipt {
            receipt,
            network,
            reader,
        }),
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(
                chain_id = network.chain_id,
                error = %err,
                "receipt lookup failed, skipping"
            );
            None
        }
    }
}

/// Probes every candidate concurrently; the first hit in `networks` order
/// wins regardless of which node answered first.
pub async fn locate_receipt(
    tx_hash: &str,
    networks: &[Arc<Network>],
    connector: &dyn Connector,
) -> TrackerResult<LocatedReceipt> {
    let hash = parse_tx_hash(tx_hash)?;
    let probes = networks
        .iter()
        .map(|network| probe(network.clone(), connector, hash));
    let found = join_all(probes).await.into_iter().flatten().next();

    match found {
        Some(located) => {
            tracing::debug!(
                tx_hash = %hash,
                chain_id = located.network.chain_id,
                "receipt located"
            );
            Ok(located)
        }
        None => Err(TrackerError::NotFound(hash)),
    }
}
