use alloy_primitives::B256;
use std::time::Duration;

/// Node error text reported while the batch carrying an L2 block has not been
/// posted to L1 yet.
pub const MISSING_BATCH_ERROR: &str = "batch doesn't exist";

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("invalid transaction hash {0:?}: expected 0x followed by 64 hex characters")]
    InvalidInput(String),

    #[error("transaction {0:#x} not found on any configured network")]
    NotFound(B256),

    #[error("transaction {tx_hash:#x} reverted on chain {chain_id}")]
    UpstreamFailed { tx_hash: B256, chain_id: u64 },

    #[error("chain {0} is not in the network registry")]
    UnsupportedNetwork(u64),

    #[error("rpc request to chain {chain_id} failed: {message}")]
    Rpc { chain_id: u64, message: String },

    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    #[error("unrecognised {generation} retryable status {status}")]
    UnknownStatus {
        generation: &'static str,
        status: &'static str,
    },

    #[error("query did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

impl TrackerError {
    pub fn rpc(chain_id: u64, err: impl std::fmt::Display) -> Self {
        Self::Rpc {
            chain_id,
            message: err.to_string(),
        }
    }

    pub fn decode(what: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            what,
            reason: err.to_string(),
        }
    }

    /// Matches on the node's error text; there is no structured code for it.
    pub fn is_missing_batch(&self) -> bool {
        match self {
            Self::Rpc { message, .. } => message.contains(MISSING_BATCH_ERROR),
            _ => false,
        }
    }
}
