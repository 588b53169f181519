use crate::error::{TrackerError, TrackerResult};
use alloy_primitives::{address, keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};

/// ArbSys precompile, emitter of `L2ToL1Tx`.
pub const ARB_SYS_ADDRESS: Address = address!("0000000000000000000000000000000000000064");
/// ArbRetryableTx precompile.
pub const ARB_RETRYABLE_TX_ADDRESS: Address =
    address!("000000000000000000000000000000000000006e");
/// NodeInterface virtual contract, only reachable through `eth_call`.
pub const NODE_INTERFACE_ADDRESS: Address = address!("00000000000000000000000000000000000000c8");

pub const L1_MESSAGE_TYPE_SUBMIT_RETRYABLE_TX: u8 = 9;
pub const L1_MESSAGE_TYPE_ETH_DEPOSIT: u8 = 12;

alloy_sol_types::sol! {
    // non-indexed part of the bridge events
    #[derive(Debug)]
    struct MessageDeliveredData {
        address inbox;
        uint8 kind;
        address sender;
        bytes32 messageDataHash;
        uint256 baseFeeL1;
        uint64 timestamp;
    }

    struct ClassicMessageDeliveredData {
        address inbox;
        uint8 kind;
        address sender;
        bytes32 messageDataHash;
    }

    struct InboxMessageDeliveredData {
        bytes data;
    }

    struct L2ToL1TxData {
        address caller;
        uint256 arbBlockNum;
        uint256 ethBlockNum;
        uint256 timestamp;
        uint256 callvalue;
        bytes data;
    }

    function getTimeout(bytes32 ticketId) external view returns (uint256);
    function redeem(bytes32 ticketId) external returns (bytes32);
    function isSpent(uint256 index) external view returns (bool);
    function findBatchContainingBlock(uint64 blockNum) external view returns (uint64 batch);
    function getL1Confirmations(bytes32 blockHash) external view returns (uint64 confirmations);
}

pub fn event_topic(signature: &str) -> B256 {
    keccak256(signature.as_bytes())
}

pub fn message_delivered_topic() -> B256 {
    event_topic("MessageDelivered(uint256,bytes32,address,uint8,address,bytes32,uint256,uint64)")
}

pub fn classic_message_delivered_topic() -> B256 {
    event_topic("MessageDelivered(uint256,bytes32,address,uint8,address,bytes32)")
}

pub fn inbox_message_delivered_topic() -> B256 {
    event_topic("InboxMessageDelivered(uint256,bytes)")
}

pub fn redeem_scheduled_topic() -> B256 {
    event_topic("RedeemScheduled(bytes32,bytes32,uint64,uint64,address,uint256,uint256)")
}

/// Emitted by the outbox each time a rollup assertion is confirmed.
pub fn send_root_updated_topic() -> B256 {
    event_topic("SendRootUpdated(bytes32,bytes32)")
}

pub fn l2_to_l1_tx_topic() -> B256 {
    event_topic("L2ToL1Tx(address,address,uint256,uint256,uint256,uint256,uint256,uint256,bytes)")
}

pub fn decode_message_delivered(data: &Bytes) -> TrackerResult<MessageDeliveredData> {
    MessageDeliveredData::abi_decode_params(data)
        .map_err(|err| TrackerError::decode("MessageDelivered", err))
}

pub fn decode_classic_message_delivered(
    data: &Bytes,
) -> TrackerResult<ClassicMessageDeliveredData> {
    ClassicMessageDeliveredData::abi_decode_params(data)
        .map_err(|err| TrackerError::decode("classic MessageDelivered", err))
}

pub fn decode_inbox_message_delivered(data: &Bytes) -> TrackerResult<Bytes> {
    InboxMessageDeliveredData::abi_decode_params(data)
        .map(|decoded| decoded.data)
        .map_err(|err| TrackerError::decode("InboxMessageDelivered", err))
}

pub fn decode_l2_to_l1_tx(data: &Bytes) -> TrackerResult<L2ToL1TxData> {
    L2ToL1TxData::abi_decode_params(data).map_err(|err| TrackerError::decode("L2ToL1Tx", err))
}

pub fn encode_get_timeout_call(ticket_id: B256) -> Bytes {
    let call = getTimeoutCall { ticketId: ticket_id };
    Bytes::from(call.abi_encode())
}

pub fn encode_redeem_call(ticket_id: B256) -> Bytes {
    let call = redeemCall { ticketId: ticket_id };
    Bytes::from(call.abi_encode())
}

pub fn encode_is_spent_call(index: U256) -> Bytes {
    let call = isSpentCall { index };
    Bytes::from(call.abi_encode())
}

pub fn encode_find_batch_call(block_number: u64) -> Bytes {
    let call = findBatchContainingBlockCall {
        blockNum: block_number,
    };
    Bytes::from(call.abi_encode())
}

pub fn encode_l1_confirmations_call(block_hash: B256) -> Bytes {
    let call = getL1ConfirmationsCall {
        blockHash: block_hash,
    };
    Bytes::from(call.abi_encode())
}

pub fn decode_bool(data: &Bytes) -> TrackerResult<bool> {
    let value: (bool,) =
        <(bool,)>::abi_decode(data).map_err(|err| TrackerError::decode("bool return", err))?;
    Ok(value.0)
}

pub fn decode_u64(data: &Bytes) -> TrackerResult<u64> {
    let value: (u64,) =
        <(u64,)>::abi_decode(data).map_err(|err| TrackerError::decode("uint64 return", err))?;
    Ok(value.0)
}
