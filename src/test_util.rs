//! Shared fixtures for unit tests.

use std::sync::Arc;

use alloy_primitives::{address, Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;

use crate::abi::{
    self, ClassicMessageDeliveredData, InboxMessageDeliveredData, L2ToL1TxData,
    MessageDeliveredData,
};
use crate::message::RetryableParams;
use crate::registry::{EthBridge, Network, NetworkRegistry, Role};
use crate::types::{LogEntry, Receipt};

pub const L1_CHAIN: u64 = 1;
pub const L2_A: u64 = 42161;
pub const L2_B: u64 = 42170;

pub const BRIDGE: Address = address!("8315177ab297ba92a06054ce80a67ed4dbd7ed3a");
pub const INBOX_A: Address = address!("4dbd4fc535ac27206064b68ffcf827b0a60bab3f");
pub const INBOX_B: Address = address!("c4448b71118c9071bcb9734a0eac55d18a153949");
pub const OUTBOX_A: Address = address!("0b9857ae2d4a3dbe74ffe1d7df045bb7f96e4840");

pub fn l1_network(chain_id: u64, partners: Vec<u64>) -> Network {
    Network {
        chain_id,
        name: format!("l1-{chain_id}"),
        rpc_url: "http://localhost:8545".to_string(),
        explorer_url: "https://l1.example".to_string(),
        role: Role::L1 {
            partner_chain_ids: partners,
        },
    }
}

pub fn l2_network(chain_id: u64, partner: u64, inbox: Address, outbox: Address) -> Network {
    Network {
        chain_id,
        name: format!("l2-{chain_id}"),
        rpc_url: "http://localhost:8547".to_string(),
        explorer_url: "https://l2.example/".to_string(),
        role: Role::L2 {
            partner_chain_id: partner,
            bridge: EthBridge { inbox, outbox },
            confirm_period_blocks: 20,
        },
    }
}

/// One L1 with two partner L2s, in probing order L1, A, B.
pub fn registry() -> Arc<NetworkRegistry> {
    Arc::new(
        NetworkRegistry::new(vec![
            l1_network(L1_CHAIN, vec![L2_A, L2_B]),
            l2_network(L2_A, L1_CHAIN, INBOX_A, OUTBOX_A),
            l2_network(L2_B, L1_CHAIN, INBOX_B, Address::repeat_byte(0x0b)),
        ])
        .unwrap(),
    )
}

pub fn tx_hash(byte: u8) -> B256 {
    B256::repeat_byte(byte)
}

pub fn receipt(tx_hash: B256, success: bool, logs: Vec<LogEntry>) -> Receipt {
    Receipt {
        tx_hash,
        block_number: 100,
        block_hash: B256::repeat_byte(0xbb),
        success,
        logs,
    }
}

/// Retryable that only moves ETH to `owner`.
pub fn deposit_shaped_params(owner: Address) -> RetryableParams {
    RetryableParams {
        dest: owner,
        l2_call_value: U256::ZERO,
        l1_value: U256::from(1_000_000u64),
        max_submission_fee: U256::from(500u64),
        excess_fee_refund: owner,
        call_value_refund: owner,
        gas_limit: U256::ZERO,
        max_fee_per_gas: U256::ZERO,
        data: Bytes::new(),
    }
}

/// Contract call ticket with every refund going to `owner`.
pub fn contract_call_params(owner: Address) -> RetryableParams {
    RetryableParams {
        dest: Address::repeat_byte(0xc0),
        l2_call_value: U256::from(10u64),
        l1_value: U256::from(1_000_000u64),
        max_submission_fee: U256::from(500u64),
        excess_fee_refund: owner,
        call_value_refund: owner,
        gas_limit: U256::from(300_000u64),
        max_fee_per_gas: U256::from(100_000_000u64),
        data: Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb]),
    }
}

pub fn pack_retryable_params(params: &RetryableParams) -> Vec<u8> {
    let word_of = |address: Address| U256::from_be_slice(address.as_slice());
    let words = [
        word_of(params.dest),
        params.l2_call_value,
        params.l1_value,
        params.max_submission_fee,
        word_of(params.excess_fee_refund),
        word_of(params.call_value_refund),
        params.gas_limit,
        params.max_fee_per_gas,
        U256::from(params.data.len()),
    ];
    let mut packed = Vec::new();
    for word in words {
        packed.extend_from_slice(&word.to_be_bytes::<32>());
    }
    packed.extend_from_slice(&params.data);
    packed
}

pub fn bridge_log(
    message_number: u64,
    inbox: Address,
    kind: u8,
    sender: Address,
    base_fee: u64,
) -> LogEntry {
    let data = MessageDeliveredData {
        inbox,
        kind,
        sender,
        messageDataHash: B256::ZERO,
        baseFeeL1: U256::from(base_fee),
        timestamp: 1_700_000_000,
    };
    LogEntry {
        address: BRIDGE,
        topics: vec![
            abi::message_delivered_topic(),
            B256::from(U256::from(message_number)),
            B256::ZERO,
        ],
        data: Bytes::from(data.abi_encode_params()),
    }
}

pub fn classic_bridge_log(
    message_number: u64,
    inbox: Address,
    kind: u8,
    sender: Address,
) -> LogEntry {
    let data = ClassicMessageDeliveredData {
        inbox,
        kind,
        sender,
        messageDataHash: B256::ZERO,
    };
    LogEntry {
        address: BRIDGE,
        topics: vec![
            abi::classic_message_delivered_topic(),
            B256::from(U256::from(message_number)),
            B256::ZERO,
        ],
        data: Bytes::from(data.abi_encode_params()),
    }
}

pub fn inbox_log(inbox: Address, message_number: u64, payload: Vec<u8>) -> LogEntry {
    let data = InboxMessageDeliveredData {
        data: Bytes::from(payload),
    };
    LogEntry {
        address: inbox,
        topics: vec![
            abi::inbox_message_delivered_topic(),
            B256::from(U256::from(message_number)),
        ],
        data: Bytes::from(data.abi_encode_params()),
    }
}

pub fn eth_deposit_payload(to: Address, value: u64) -> Vec<u8> {
    let mut payload = to.to_vec();
    payload.extend_from_slice(&U256::from(value).to_be_bytes::<32>());
    payload
}

pub fn l2_to_l1_log(destination: Address, position: u64, arb_block: u64) -> LogEntry {
    let data = L2ToL1TxData {
        caller: Address::repeat_byte(0xca),
        arbBlockNum: U256::from(arb_block),
        ethBlockNum: U256::from(19_000_000u64),
        timestamp: U256::from(1_700_000_000u64),
        callvalue: U256::from(5u64),
        data: Bytes::new(),
    };
    LogEntry {
        address: abi::ARB_SYS_ADDRESS,
        topics: vec![
            abi::l2_to_l1_tx_topic(),
            B256::left_padding_from(destination.as_slice()),
            B256::ZERO,
            B256::from(U256::from(position)),
        ],
        data: Bytes::from(data.abi_encode_params()),
    }
}
