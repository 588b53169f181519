//! Cross-chain messages produced by an L1 transaction.
//!
//! The protocol generation is decided once, at extraction time, by picking
//! the variant of [`L1ToL2Message`]. Each variant knows how to derive its own
//! identifier here and how to query its own status (see `retryable`).

use crate::error::{TrackerError, TrackerResult};
use crate::registry::Network;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, Header};
use serde::Serialize;
use std::sync::Arc;

const WORD: usize = 32;
const RETRYABLE_HEADER_WORDS: usize = 9;
const SUBMIT_RETRYABLE_TX_TYPE: u8 = 0x69;
const ETH_DEPOSIT_TX_TYPE: u8 = 0x64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Generation {
    Classic,
    Current,
}

impl Generation {
    pub fn label(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Current => "current",
        }
    }
}

/// Creation parameters of a retryable ticket, as packed by the inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableParams {
    pub dest: Address,
    pub l2_call_value: U256,
    pub l1_value: U256,
    pub max_submission_fee: U256,
    pub excess_fee_refund: Address,
    pub call_value_refund: Address,
    pub gas_limit: U256,
    pub max_fee_per_gas: U256,
    pub data: Bytes,
}

impl RetryableParams {
    /// Nine 32-byte words followed by the raw call data.
    pub fn decode(data: &[u8]) -> TrackerResult<Self> {
        let header_len = RETRYABLE_HEADER_WORDS * WORD;
        if data.len() < header_len {
            return Err(TrackerError::decode(
                "retryable params",
                format!("{} bytes, need at least {header_len}", data.len()),
            ));
        }
        let word = |i: usize| U256::from_be_slice(&data[i * WORD..(i + 1) * WORD]);
        let addr = |i: usize| Address::from_slice(&data[i * WORD + 12..(i + 1) * WORD]);

        let end = usize::try_from(word(8))
            .ok()
            .and_then(|len| header_len.checked_add(len))
            .filter(|end| *end <= data.len())
            .ok_or_else(|| {
                TrackerError::decode("retryable params", "call data length exceeds payload")
            })?;

        Ok(Self {
            dest: addr(0),
            l2_call_value: word(1),
            l1_value: word(2),
            max_submission_fee: word(3),
            excess_fee_refund: addr(4),
            call_value_refund: addr(5),
            gas_limit: word(6),
            max_fee_per_gas: word(7),
            data: Bytes::copy_from_slice(&data[header_len..end]),
        })
    }

    /// True when the ticket only moves ETH: no call value, no gas, no call
    /// data, and every refund goes back to the destination.
    pub fn looks_like_eth_deposit(&self) -> bool {
        self.l2_call_value.is_zero()
            && self.gas_limit.is_zero()
            && self.max_fee_per_gas.is_zero()
            && self.data.is_empty()
            && self.dest == self.excess_fee_refund
            && self.excess_fee_refund == self.call_value_refund
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableTicket {
    pub origin_tx: B256,
    pub message_number: U256,
    pub sender: Address,
    pub l1_base_fee: U256,
    pub params: RetryableParams,
    pub creation_id: B256,
}

impl RetryableTicket {
    pub fn new(
        l2_chain_id: u64,
        origin_tx: B256,
        message_number: U256,
        sender: Address,
        l1_base_fee: U256,
        params: RetryableParams,
    ) -> Self {
        let creation_id =
            submit_retryable_id(l2_chain_id, message_number, sender, l1_base_fee, &params);
        Self {
            origin_tx,
            message_number,
            sender,
            l1_base_fee,
            params,
            creation_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassicRetryable {
    pub origin_tx: B256,
    pub message_number: U256,
    pub params: Option<RetryableParams>,
    pub creation_id: B256,
    pub redeem_tx_hash: B256,
}

impl ClassicRetryable {
    pub fn new(
        l2_chain_id: u64,
        origin_tx: B256,
        message_number: U256,
        params: Option<RetryableParams>,
    ) -> Self {
        let creation_id = classic_retryable_id(l2_chain_id, message_number);
        Self {
            origin_tx,
            message_number,
            params,
            creation_id,
            redeem_tx_hash: classic_redeem_tx_hash(creation_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthDeposit {
    pub origin_tx: B256,
    pub message_number: U256,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub deposit_tx_hash: B256,
}

impl EthDeposit {
    /// Inbox payload is `to (20 bytes) ++ value (32 bytes)`.
    pub fn decode(
        l2_chain_id: u64,
        origin_tx: B256,
        message_number: U256,
        from: Address,
        data: &[u8],
    ) -> TrackerResult<Self> {
        if data.len() < 20 + WORD {
            return Err(TrackerError::decode(
                "eth deposit",
                format!("{} bytes, need 52", data.len()),
            ));
        }
        let to = Address::from_slice(&data[..20]);
        let value = U256::from_be_slice(&data[20..20 + WORD]);
        Ok(Self {
            origin_tx,
            message_number,
            from,
            to,
            value,
            deposit_tx_hash: eth_deposit_tx_hash(l2_chain_id, message_number, from, to, value),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum L1ToL2Message {
    Retryable(RetryableTicket),
    ClassicRetryable(ClassicRetryable),
    EthDeposit(EthDeposit),
}

impl L1ToL2Message {
    /// Retryable creation id, or the L2 deposit transaction hash.
    pub fn id(&self) -> B256 {
        match self {
            Self::Retryable(ticket) => ticket.creation_id,
            Self::ClassicRetryable(ticket) => ticket.creation_id,
            Self::EthDeposit(deposit) => deposit.deposit_tx_hash,
        }
    }

    pub fn origin_tx(&self) -> B256 {
        match self {
            Self::Retryable(ticket) => ticket.origin_tx,
            Self::ClassicRetryable(ticket) => ticket.origin_tx,
            Self::EthDeposit(deposit) => deposit.origin_tx,
        }
    }

    pub fn message_number(&self) -> U256 {
        match self {
            Self::Retryable(ticket) => ticket.message_number,
            Self::ClassicRetryable(ticket) => ticket.message_number,
            Self::EthDeposit(deposit) => deposit.message_number,
        }
    }

    pub fn generation(&self) -> Generation {
        match self {
            Self::ClassicRetryable(_) => Generation::Classic,
            Self::Retryable(_) | Self::EthDeposit(_) => Generation::Current,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Retryable(_) => "retryable",
            Self::ClassicRetryable(_) => "classic-retryable",
            Self::EthDeposit(_) => "eth-deposit",
        }
    }
}

/// A message together with the L2 network it targets.
#[derive(Debug, Clone)]
pub struct NetworkMessage {
    pub message: L1ToL2Message,
    pub network: Arc<Network>,
}

fn rlp_list(fields: &[&dyn Encodable]) -> Vec<u8> {
    let payload_length = fields.iter().map(|field| field.length()).sum();
    let mut out = Vec::with_capacity(payload_length + 9);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    for field in fields {
        field.encode(&mut out);
    }
    out
}

fn typed_tx_hash(tx_type: u8, fields: &[&dyn Encodable]) -> B256 {
    let mut encoded = vec![tx_type];
    encoded.extend(rlp_list(fields));
    keccak256(encoded)
}

fn padded_message_number(message_number: U256) -> B256 {
    B256::from(message_number.to_be_bytes::<32>())
}

pub fn submit_retryable_id(
    l2_chain_id: u64,
    message_number: U256,
    sender: Address,
    l1_base_fee: U256,
    params: &RetryableParams,
) -> B256 {
    let chain_id = U256::from(l2_chain_id);
    let message_number = padded_message_number(message_number);
    // a zero destination is encoded as an empty string
    let dest = if params.dest == Address::ZERO {
        Bytes::new()
    } else {
        Bytes::copy_from_slice(params.dest.as_slice())
    };
    typed_tx_hash(
        SUBMIT_RETRYABLE_TX_TYPE,
        &[
            &chain_id,
            &message_number,
            &sender,
            &l1_base_fee,
            &params.l1_value,
            &params.max_fee_per_gas,
            &params.gas_limit,
            &dest,
            &params.l2_call_value,
            &params.call_value_refund,
            &params.max_submission_fee,
            &params.excess_fee_refund,
            &params.data,
        ],
    )
}

pub fn eth_deposit_tx_hash(
    l2_chain_id: u64,
    message_number: U256,
    from: Address,
    to: Address,
    value: U256,
) -> B256 {
    let chain_id = U256::from(l2_chain_id);
    let message_number = padded_message_number(message_number);
    typed_tx_hash(
        ETH_DEPOSIT_TX_TYPE,
        &[&chain_id, &message_number, &from, &to, &value],
    )
}

pub fn classic_retryable_id(l2_chain_id: u64, message_number: U256) -> B256 {
    let flipped: U256 = message_number | (U256::from(1u8) << 255);
    let mut preimage = Vec::with_capacity(2 * WORD);
    preimage.extend_from_slice(&U256::from(l2_chain_id).to_be_bytes::<32>());
    preimage.extend_from_slice(&flipped.to_be_bytes::<32>());
    keccak256(preimage)
}

pub fn classic_redeem_tx_hash(creation_id: B256) -> B256 {
    let mut preimage = Vec::with_capacity(2 * WORD);
    preimage.extend_from_slice(creation_id.as_slice());
    preimage.extend_from_slice(&[0u8; WORD]);
    keccak256(preimage)
}
