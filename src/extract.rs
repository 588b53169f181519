//! Turns an L1 receipt into the bridge messages it delivered.
//!
//! Pure over the receipt: no RPC is issued here. Each partner L2 is handled
//! independently and its protocol generation is decided once from the bridge
//! events, so a single receipt never mixes generations for one network.

use crate::abi::{self, L1_MESSAGE_TYPE_ETH_DEPOSIT, L1_MESSAGE_TYPE_SUBMIT_RETRYABLE_TX};
use crate::error::TrackerResult;
use crate::message::{
    ClassicRetryable, EthDeposit, Generation, L1ToL2Message, NetworkMessage, RetryableParams,
    RetryableTicket,
};
use crate::registry::{Network, NetworkRegistry};
use crate::types::{LogEntry, Receipt};
use alloy_primitives::{Address, B256, U256};
use std::collections::HashSet;
use std::sync::Arc;

/// Bridge-side facts about one delivered message.
#[derive(Debug, Clone, Copy)]
struct Delivery {
    kind: u8,
    sender: Address,
    l1_base_fee: U256,
}

pub fn extract_messages(
    receipt: &Receipt,
    origin: &Network,
    registry: &NetworkRegistry,
) -> TrackerResult<Vec<NetworkMessage>> {
    let mut seen = HashSet::new();
    let partners: Vec<u64> = origin
        .partner_chain_ids()
        .into_iter()
        .filter(|chain_id| seen.insert(*chain_id))
        .collect();

    let mut messages = Vec::new();
    for chain_id in partners {
        let network = registry.require_l2(chain_id)?;
        messages.extend(extract_for_partner(receipt, &network)?);
    }
    Ok(messages)
}

fn extract_for_partner(
    receipt: &Receipt,
    network: &Arc<Network>,
) -> TrackerResult<Vec<NetworkMessage>> {
    let Some(bridge) = network.bridge() else {
        return Ok(Vec::new());
    };
    let inbox_topic = abi::inbox_message_delivered_topic();
    let inbox_logs: Vec<&LogEntry> = receipt
        .logs
        .iter()
        .filter(|log| log.address == bridge.inbox && log.topic0() == Some(inbox_topic))
        .collect();
    if inbox_logs.is_empty() {
        return Ok(Vec::new());
    }

    let generation = probe_generation(receipt, bridge.inbox);
    tracing::debug!(
        chain_id = network.chain_id,
        generation = generation.label(),
        inbox_logs = inbox_logs.len(),
        "extracting messages"
    );

    let mut messages = Vec::new();
    for log in inbox_logs {
        let Some(message_number) = log.topic(1) else {
            tracing::warn!(chain_id = network.chain_id, "inbox log without message number");
            continue;
        };
        let delivery = find_delivery(receipt, generation, bridge.inbox, message_number)?;
        let Some(delivery) = delivery else {
            tracing::warn!(
                chain_id = network.chain_id,
                message_number = %message_number,
                "inbox log has no matching bridge event, skipping"
            );
            continue;
        };
        let payload = abi::decode_inbox_message_delivered(&log.data)?;
        let message_number = U256::from_be_bytes(message_number.0);

        let message = match (generation, delivery.kind) {
            (Generation::Current, L1_MESSAGE_TYPE_SUBMIT_RETRYABLE_TX) => {
                L1ToL2Message::Retryable(RetryableTicket::new(
                    network.chain_id,
                    receipt.tx_hash,
                    message_number,
                    delivery.sender,
                    delivery.l1_base_fee,
                    RetryableParams::decode(&payload)?,
                ))
            }
            (Generation::Classic, L1_MESSAGE_TYPE_SUBMIT_RETRYABLE_TX) => {
                let params = match RetryableParams::decode(&payload) {
                    Ok(params) => Some(params),
                    Err(err) => {
                        tracing::debug!(error = %err, "classic ticket params not decodable");
                        None
                    }
                };
                L1ToL2Message::ClassicRetryable(ClassicRetryable::new(
                    network.chain_id,
                    receipt.tx_hash,
                    message_number,
                    params,
                ))
            }
            (Generation::Current, L1_MESSAGE_TYPE_ETH_DEPOSIT) => {
                L1ToL2Message::EthDeposit(EthDeposit::decode(
                    network.chain_id,
                    receipt.tx_hash,
                    message_number,
                    delivery.sender,
                    &payload,
                )?)
            }
            (_, kind) => {
                tracing::debug!(kind, "ignoring message kind");
                continue;
            }
        };
        messages.push(NetworkMessage {
            message,
            network: network.clone(),
        });
    }
    Ok(messages)
}

/// Current when a current-encoding bridge event names this inbox.
fn probe_generation(receipt: &Receipt, inbox: Address) -> Generation {
    let topic = abi::message_delivered_topic();
    let current = receipt
        .logs
        .iter()
        .filter(|log| log.topic0() == Some(topic))
        .filter_map(|log| abi::decode_message_delivered(&log.data).ok())
        .any(|event| event.inbox == inbox);
    if current {
        Generation::Current
    } else {
        Generation::Classic
    }
}

fn find_delivery(
    receipt: &Receipt,
    generation: Generation,
    inbox: Address,
    message_number: B256,
) -> TrackerResult<Option<Delivery>> {
    let topic = match generation {
        Generation::Current => abi::message_delivered_topic(),
        Generation::Classic => abi::classic_message_delivered_topic(),
    };
    for log in &receipt.logs {
        if log.topic0() != Some(topic) || log.topic(1) != Some(message_number) {
            continue;
        }
        let delivery = match generation {
            Generation::Current => {
                let event = abi::decode_message_delivered(&log.data)?;
                (event.inbox == inbox).then_some(Delivery {
                    kind: event.kind,
                    sender: event.sender,
                    l1_base_fee: event.baseFeeL1,
                })
            }
            Generation::Classic => {
                let event = abi::decode_classic_message_delivered(&log.data)?;
                (event.inbox == inbox).then_some(Delivery {
                    kind: event.kind,
                    sender: event.sender,
                    l1_base_fee: U256::ZERO,
                })
            }
        };
        if delivery.is_some() {
            return Ok(delivery);
        }
    }
    Ok(None)
}
