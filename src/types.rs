use crate::error::{TrackerError, TrackerResult};
use alloy_primitives::{Address, Bytes, B256, U256};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::str::FromStr;

pub const TX_HASH_LEN: usize = 66;

/// Validates a user supplied transaction hash.
///
/// Only the canonical form is accepted: a lowercase `0x` prefix followed by
/// exactly 64 hex digits of either case.
pub fn parse_tx_hash(value: &str) -> TrackerResult<B256> {
    let valid = value.len() == TX_HASH_LEN
        && value.starts_with("0x")
        && value[2..].bytes().all(|b| b.is_ascii_hexdigit());
    if !valid {
        return Err(TrackerError::InvalidInput(value.to_string()));
    }
    B256::from_str(value).map_err(|_| TrackerError::InvalidInput(value.to_string()))
}

pub fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value).map_err(|err| anyhow!("invalid address {value}: {err}"))
}

pub fn format_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn u256_to_string(value: U256) -> String {
    value.to_string()
}

pub fn b256_to_hex(value: B256) -> String {
    format!("{value:#x}")
}

pub fn address_to_hex(value: Address) -> String {
    format!("{value:#x}")
}

/// A log entry as the resolution engine sees it, independent of transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

impl LogEntry {
    pub fn topic0(&self) -> Option<B256> {
        self.topics.first().copied()
    }

    pub fn topic(&self, index: usize) -> Option<B256> {
        self.topics.get(index).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: B256,
    pub block_number: u64,
    pub block_hash: B256,
    pub success: bool,
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    L1ToL2,
    L2ToL1,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::L1ToL2 => write!(f, "L1 to L2"),
            Self::L2ToL1 => write!(f, "L2 to L1"),
        }
    }
}

/// Alert level attached to every line shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Pending,
    Warning,
    Failure,
}

impl Severity {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Pending => "⏳",
            Self::Warning => "⚠️",
            Self::Failure => "❌",
        }
    }
}
