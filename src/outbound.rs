//! L2 to L1 messages: extraction from `ArbSys` logs, confirmation status and
//! challenge period estimates.

use crate::abi::{self, ARB_SYS_ADDRESS, NODE_INTERFACE_ADDRESS};
use crate::error::{TrackerError, TrackerResult};
use crate::registry::{Network, NetworkRegistry};
use crate::rpc::{ChainReader, LogQuery};
use crate::types::Receipt;
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_SECONDS_PER_BLOCK: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundStatus {
    Unconfirmed,
    Confirmed,
    Executed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfirmationInfo {
    /// First L1 block at which the message can be executed.
    pub deadline_block: u64,
    pub eta_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub origin_tx: B256,
    pub source: Arc<Network>,
    pub target: Arc<Network>,
    pub caller: Address,
    pub destination: Address,
    pub position: U256,
    pub l2_block: u64,
    pub l2_block_hash: B256,
    pub l1_block: u64,
    pub callvalue: U256,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct ResolvedOutbound {
    pub message: OutboundMessage,
    pub status: OutboundStatus,
    pub confirmation: Option<ConfirmationInfo>,
    pub batch: Option<u64>,
}

pub fn eta_seconds(deadline_block: u64, current_block: u64, seconds_per_block: u64) -> u64 {
    deadline_block
        .saturating_sub(current_block)
        .saturating_mul(seconds_per_block)
}

pub fn first_executable_block(current_l1: u64, confirmations: u64, confirm_period: u64) -> u64 {
    current_l1
        .saturating_sub(confirmations)
        .saturating_add(confirm_period)
}

fn to_u64(value: U256, what: &'static str) -> TrackerResult<u64> {
    u64::try_from(value).map_err(|err| TrackerError::decode(what, err))
}

/// Outbound messages in log order. The target is the source L2's partner.
pub fn extract_outbound(
    receipt: &Receipt,
    source: &Arc<Network>,
    registry: &NetworkRegistry,
) -> TrackerResult<Vec<OutboundMessage>> {
    let topic = abi::l2_to_l1_tx_topic();
    let logs: Vec<_> = receipt
        .logs
        .iter()
        .filter(|log| log.address == ARB_SYS_ADDRESS && log.topic0() == Some(topic))
        .collect();
    if logs.is_empty() {
        return Ok(Vec::new());
    }

    let partner = source
        .partner_chain_ids()
        .first()
        .copied()
        .ok_or(TrackerError::UnsupportedNetwork(source.chain_id))?;
    let target = registry.require_l1(partner)?;

    logs.into_iter()
        .map(|log| {
            let (Some(destination), Some(position)) = (log.topic(1), log.topic(3)) else {
                return Err(TrackerError::decode("L2ToL1Tx", "missing indexed topics"));
            };
            let event = abi::decode_l2_to_l1_tx(&log.data)?;
            Ok(OutboundMessage {
                origin_tx: receipt.tx_hash,
                source: source.clone(),
                target: target.clone(),
                caller: event.caller,
                destination: Address::from_word(destination),
                position: U256::from_be_bytes(position.0),
                l2_block: receipt.block_number,
                l2_block_hash: receipt.block_hash,
                l1_block: to_u64(event.ethBlockNum, "L2ToL1Tx ethBlockNum")?,
                callvalue: event.callvalue,
                data: event.data,
            })
        })
        .collect()
}

async fn is_spent(l1: &dyn ChainReader, outbox: Address, position: U256) -> TrackerResult<bool> {
    let output = l1
        .call(outbox, abi::encode_is_spent_call(position))
        .await?
        .expect_success(l1.chain_id())?;
    abi::decode_bool(&output)
}

async fn node_interface_u64(l2: &dyn ChainReader, data: Bytes) -> TrackerResult<u64> {
    let output = l2
        .call(NODE_INTERFACE_ADDRESS, data)
        .await?
        .expect_success(l2.chain_id())?;
    abi::decode_u64(&output)
}

/// Highest L2 block covered by an assertion confirmed at or after `from_block`
/// on L1, read from the outbox's `SendRootUpdated` events.
async fn latest_confirmed_l2_block(
    l1: &dyn ChainReader,
    l2: &dyn ChainReader,
    outbox: Address,
    from_block: u64,
) -> TrackerResult<Option<u64>> {
    let query = LogQuery {
        address: outbox,
        topic0: abi::send_root_updated_topic(),
        topic1: None,
        from_block,
    };
    let logs = l1.logs(&query).await?;
    let Some(l2_block_hash) = logs.last().and_then(|log| log.topic(2)) else {
        return Ok(None);
    };
    let number = l2.block_number_by_hash(l2_block_hash).await?;
    if number.is_none() {
        tracing::warn!(
            l2_block_hash = %l2_block_hash,
            "confirmed send root names an unknown L2 block"
        );
    }
    Ok(number)
}

async fn confirmation_state(
    l1: &dyn ChainReader,
    l2: &dyn ChainReader,
    outbox: Address,
    message: &OutboundMessage,
    seconds_per_block: u64,
) -> TrackerResult<(OutboundStatus, Option<ConfirmationInfo>, Option<u64>)> {
    let confirm_period = message
        .source
        .confirm_period_blocks()
        .ok_or(TrackerError::UnsupportedNetwork(message.source.chain_id))?;

    let batch = node_interface_u64(l2, abi::encode_find_batch_call(message.l2_block)).await?;
    let confirmations =
        node_interface_u64(l2, abi::encode_l1_confirmations_call(message.l2_block_hash)).await?;
    let current_l1 = l1.block_number().await?;
    let deadline_block = first_executable_block(current_l1, confirmations, confirm_period);
    let info = ConfirmationInfo {
        deadline_block,
        eta_seconds: eta_seconds(deadline_block, current_l1, seconds_per_block),
    };
    if confirmations < confirm_period {
        return Ok((OutboundStatus::Unconfirmed, Some(info), Some(batch)));
    }

    // the challenge period runs from the assertion, which lands after the batch
    let batch_l1_block = current_l1.saturating_sub(confirmations);
    let confirmed = latest_confirmed_l2_block(l1, l2, outbox, batch_l1_block).await?;
    match confirmed {
        Some(confirmed) if confirmed >= message.l2_block => {
            Ok((OutboundStatus::Confirmed, None, Some(batch)))
        }
        _ => Ok((OutboundStatus::Unconfirmed, Some(info), Some(batch))),
    }
}

pub async fn outbound_status(
    l1: &dyn ChainReader,
    l2: &dyn ChainReader,
    message: OutboundMessage,
    seconds_per_block: u64,
) -> TrackerResult<ResolvedOutbound> {
    let outbox = message
        .source
        .bridge()
        .map(|bridge| bridge.outbox)
        .ok_or(TrackerError::UnsupportedNetwork(message.source.chain_id))?;

    if is_spent(l1, outbox, message.position).await? {
        return Ok(ResolvedOutbound {
            message,
            status: OutboundStatus::Executed,
            confirmation: None,
            batch: None,
        });
    }

    let (status, confirmation, batch) =
        match confirmation_state(l1, l2, outbox, &message, seconds_per_block).await {
            Ok(state) => state,
            Err(err) if err.is_missing_batch() => {
                tracing::debug!(l2_block = message.l2_block, "batch not posted yet");
                (OutboundStatus::Unconfirmed, None, None)
            }
            Err(err) => return Err(err),
        };
    Ok(ResolvedOutbound {
        message,
        status,
        confirmation,
        batch,
    })
}
