//! Lifecycle status of L1 to L2 messages.
//!
//! Every variant of [`L1ToL2Message`] has its own status query. The queries
//! are wrapped in a bounded wait: a ticket that is not visible on L2 yet is
//! polled for one confirmation window before being reported as not created.

use crate::abi::{self, ARB_RETRYABLE_TX_ADDRESS};
use crate::error::{TrackerError, TrackerResult};
use crate::message::{
    ClassicRetryable, EthDeposit, Generation, L1ToL2Message, NetworkMessage, RetryableTicket,
};
use crate::rpc::{CallOutcome, ChainReader, LogQuery};
use crate::types::{LogEntry, Receipt};
use alloy_primitives::B256;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetryableStatus {
    NotYetCreated,
    CreationFailed,
    FundsDepositedOnL2,
    Redeemed,
    Expired,
}

impl RetryableStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotYetCreated => "NOT_YET_CREATED",
            Self::CreationFailed => "CREATION_FAILED",
            Self::FundsDepositedOnL2 => "FUNDS_DEPOSITED_ON_L2",
            Self::Redeemed => "REDEEMED",
            Self::Expired => "EXPIRED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryableOutcome {
    pub status: RetryableStatus,
    /// Successful redeem transaction, when one was found.
    pub redeem_tx: Option<B256>,
}

impl RetryableOutcome {
    fn status(status: RetryableStatus) -> Self {
        Self {
            status,
            redeem_tx: None,
        }
    }

    fn redeemed(redeem_tx: B256) -> Self {
        Self {
            status: RetryableStatus::Redeemed,
            redeem_tx: Some(redeem_tx),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositStatus {
    Completed,
    /// Still pending or failed; the two cannot be told apart from L2 alone.
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWait {
    pub window: Duration,
    pub poll_interval: Duration,
}

impl Default for StatusWait {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(10),
            poll_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedStatus {
    Retryable {
        generation: Generation,
        status: RetryableStatus,
        deposit_shaped: bool,
    },
    EthDeposit(DepositStatus),
}

#[derive(Debug, Clone)]
pub struct ResolvedMessage {
    pub message: NetworkMessage,
    pub status: ResolvedStatus,
    /// L2 transaction that carried out the message, if any.
    pub l2_tx_hash: Option<B256>,
}

/// Polls `query` until `done` holds. `Ok(None)` when the window elapses;
/// errors from `query` end the wait immediately.
async fn poll_until<T, F, Fut>(
    wait: StatusWait,
    query: F,
    done: impl Fn(&T) -> bool,
) -> TrackerResult<Option<T>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = TrackerResult<T>>,
{
    let polling = async {
        loop {
            let value = query().await?;
            if done(&value) {
                return Ok::<T, TrackerError>(value);
            }
            tokio::time::sleep(wait.poll_interval).await;
        }
    };
    match tokio::time::timeout(wait.window, polling).await {
        Ok(result) => result.map(Some),
        Err(_) => Ok(None),
    }
}

/// Runs a retryable status query inside the confirmation window.
pub async fn wait_for_status<F, Fut>(wait: StatusWait, query: F) -> TrackerResult<RetryableOutcome>
where
    F: Fn() -> Fut,
    Fut: Future<Output = TrackerResult<RetryableOutcome>>,
{
    let outcome = poll_until(wait, query, |outcome: &RetryableOutcome| {
        outcome.status != RetryableStatus::NotYetCreated
    })
    .await?;
    Ok(outcome.unwrap_or_else(|| {
        tracing::debug!(window = ?wait.window, "ticket not created within window");
        RetryableOutcome::status(RetryableStatus::NotYetCreated)
    }))
}

fn redeem_scheduled_for(log: &LogEntry, ticket_id: B256) -> Option<B256> {
    let matches = log.address == ARB_RETRYABLE_TX_ADDRESS
        && log.topic0() == Some(abi::redeem_scheduled_topic())
        && log.topic(1) == Some(ticket_id);
    // topic 2 is the retry transaction hash
    matches.then(|| log.topic(2)).flatten()
}

async fn first_successful(
    reader: &dyn ChainReader,
    retry_txs: impl IntoIterator<Item = B256>,
) -> TrackerResult<Option<B256>> {
    for retry_tx in retry_txs {
        let receipt = reader.transaction_receipt(retry_tx).await?;
        if receipt.is_some_and(|receipt| receipt.success) {
            return Ok(Some(retry_tx));
        }
    }
    Ok(None)
}

/// Single status read of a current-protocol ticket.
pub async fn current_status(
    reader: &dyn ChainReader,
    ticket: &RetryableTicket,
) -> TrackerResult<RetryableOutcome> {
    let ticket_id = ticket.creation_id;
    let Some(creation) = reader.transaction_receipt(ticket_id).await? else {
        return Ok(RetryableOutcome::status(RetryableStatus::NotYetCreated));
    };
    if !creation.success {
        return Ok(RetryableOutcome::status(RetryableStatus::CreationFailed));
    }

    let auto_redeems = creation
        .logs
        .iter()
        .filter_map(|log| redeem_scheduled_for(log, ticket_id));
    if let Some(retry_tx) = first_successful(reader, auto_redeems.collect::<Vec<_>>()).await? {
        return Ok(RetryableOutcome::redeemed(retry_tx));
    }

    if let Some(retry_tx) = manual_redeem(reader, ticket_id, &creation).await? {
        return Ok(RetryableOutcome::redeemed(retry_tx));
    }

    match reader
        .call(ARB_RETRYABLE_TX_ADDRESS, abi::encode_get_timeout_call(ticket_id))
        .await?
    {
        CallOutcome::Success(_) => Ok(RetryableOutcome::status(
            RetryableStatus::FundsDepositedOnL2,
        )),
        CallOutcome::Reverted(reason) => {
            tracing::debug!(
                ticket = %ticket_id,
                reason = %reason,
                "getTimeout reverted, ticket gone"
            );
            Ok(RetryableOutcome::status(RetryableStatus::Expired))
        }
    }
}

async fn manual_redeem(
    reader: &dyn ChainReader,
    ticket_id: B256,
    creation: &Receipt,
) -> TrackerResult<Option<B256>> {
    let query = LogQuery {
        address: ARB_RETRYABLE_TX_ADDRESS,
        topic0: abi::redeem_scheduled_topic(),
        topic1: Some(ticket_id),
        from_block: creation.block_number,
    };
    let logs = reader.logs(&query).await?;
    let retry_txs: Vec<B256> = logs
        .iter()
        .filter_map(|log| redeem_scheduled_for(log, ticket_id))
        .collect();
    first_successful(reader, retry_txs).await
}

/// Single status read of a classic ticket. Classic tickets either ran or
/// are treated as expired.
pub async fn classic_status(
    reader: &dyn ChainReader,
    ticket: &ClassicRetryable,
) -> TrackerResult<RetryableOutcome> {
    let Some(creation) = reader.transaction_receipt(ticket.creation_id).await? else {
        return Ok(RetryableOutcome::status(RetryableStatus::NotYetCreated));
    };
    if !creation.success {
        return Ok(RetryableOutcome::status(RetryableStatus::CreationFailed));
    }
    let redeem = reader.transaction_receipt(ticket.redeem_tx_hash).await?;
    if redeem.is_some_and(|receipt| receipt.success) {
        return Ok(RetryableOutcome::redeemed(ticket.redeem_tx_hash));
    }
    Ok(RetryableOutcome::status(RetryableStatus::Expired))
}

/// Never fails: anything but a successful deposit receipt is unresolved.
pub async fn deposit_status(
    reader: &dyn ChainReader,
    deposit: &EthDeposit,
    wait: StatusWait,
) -> DepositStatus {
    let receipt = poll_until(
        wait,
        || reader.transaction_receipt(deposit.deposit_tx_hash),
        |receipt: &Option<Receipt>| receipt.is_some(),
    )
    .await;
    match receipt {
        Ok(Some(Some(receipt))) if receipt.success => DepositStatus::Completed,
        Ok(Some(_)) => DepositStatus::Unresolved,
        Ok(None) => {
            tracing::debug!(tx = %deposit.deposit_tx_hash, "deposit not seen within window");
            DepositStatus::Unresolved
        }
        Err(err) => {
            tracing::warn!(tx = %deposit.deposit_tx_hash, error = %err, "deposit lookup failed");
            DepositStatus::Unresolved
        }
    }
}

/// Resolves one message against a reader for its target L2.
pub async fn resolve_message(
    reader: &dyn ChainReader,
    message: NetworkMessage,
    wait: StatusWait,
) -> TrackerResult<ResolvedMessage> {
    let (status, l2_tx_hash) = match &message.message {
        L1ToL2Message::Retryable(ticket) => {
            let outcome = wait_for_status(wait, || current_status(reader, ticket)).await?;
            let status = ResolvedStatus::Retryable {
                generation: Generation::Current,
                status: outcome.status,
                deposit_shaped: ticket.params.looks_like_eth_deposit(),
            };
            (status, outcome.redeem_tx)
        }
        L1ToL2Message::ClassicRetryable(ticket) => {
            let outcome = wait_for_status(wait, || classic_status(reader, ticket)).await?;
            let deposit_shaped = ticket
                .params
                .as_ref()
                .is_some_and(|params| params.looks_like_eth_deposit());
            let status = ResolvedStatus::Retryable {
                generation: Generation::Classic,
                status: outcome.status,
                deposit_shaped,
            };
            (status, outcome.redeem_tx)
        }
        L1ToL2Message::EthDeposit(deposit) => {
            let status = deposit_status(reader, deposit, wait).await;
            let l2_tx_hash =
                (status == DepositStatus::Completed).then_some(deposit.deposit_tx_hash);
            (ResolvedStatus::EthDeposit(status), l2_tx_hash)
        }
    };
    tracing::debug!(
        id = %message.message.id(),
        chain_id = message.network.chain_id,
        status = ?status,
        "message resolved"
    );
    Ok(ResolvedMessage {
        message,
        status,
        l2_tx_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::mock::MockChain;
    use crate::test_util::*;
    use alloy_primitives::{Address, Bytes, U256};
    use std::sync::Arc;

    fn quick() -> StatusWait {
        StatusWait {
            window: Duration::from_millis(40),
            poll_interval: Duration::from_millis(5),
        }
    }

    fn ticket(params: crate::message::RetryableParams) -> RetryableTicket {
        RetryableTicket::new(
            L2_A,
            tx_hash(0x01),
            U256::from(5u8),
            Address::repeat_byte(0x05),
            U256::from(30u8),
            params,
        )
    }

    fn redeem_scheduled(ticket_id: B256, retry_tx: B256) -> LogEntry {
        LogEntry {
            address: ARB_RETRYABLE_TX_ADDRESS,
            topics: vec![
                abi::redeem_scheduled_topic(),
                ticket_id,
                retry_tx,
                B256::ZERO,
            ],
            data: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn missing_creation_receipt_times_out_as_not_yet_created() {
        let ticket = ticket(contract_call_params(Address::ZERO));
        let chain = MockChain::builder(L2_A).build();
        let outcome = wait_for_status(quick(), || current_status(chain.as_ref(), &ticket))
            .await
            .unwrap();
        assert_eq!(outcome.status, RetryableStatus::NotYetCreated);
        assert!(chain.requests() > 1);
    }

    #[tokio::test]
    async fn reverted_creation_is_creation_failed() {
        let ticket = ticket(contract_call_params(Address::ZERO));
        let chain = MockChain::builder(L2_A)
            .with_receipt(receipt(ticket.creation_id, false, vec![]))
            .build();
        let outcome = current_status(chain.as_ref(), &ticket).await.unwrap();
        assert_eq!(outcome.status, RetryableStatus::CreationFailed);
    }

    #[tokio::test]
    async fn successful_auto_redeem_is_redeemed() {
        let ticket = ticket(contract_call_params(Address::ZERO));
        let retry_tx = tx_hash(0x77);
        let chain = MockChain::builder(L2_A)
            .with_receipt(receipt(
                ticket.creation_id,
                true,
                vec![redeem_scheduled(ticket.creation_id, retry_tx)],
            ))
            .with_receipt(receipt(retry_tx, true, vec![]))
            .build();
        let outcome = current_status(chain.as_ref(), &ticket).await.unwrap();
        assert_eq!(outcome, RetryableOutcome::redeemed(retry_tx));
    }

    #[tokio::test]
    async fn manual_redeem_after_failed_auto_redeem() {
        let ticket = ticket(contract_call_params(Address::ZERO));
        let auto_tx = tx_hash(0x71);
        let manual_tx = tx_hash(0x72);
        let chain = MockChain::builder(L2_A)
            .with_receipt(receipt(
                ticket.creation_id,
                true,
                vec![redeem_scheduled(ticket.creation_id, auto_tx)],
            ))
            .with_receipt(receipt(auto_tx, false, vec![]))
            .with_receipt(receipt(manual_tx, true, vec![]))
            .with_log(redeem_scheduled(ticket.creation_id, auto_tx))
            .with_log(redeem_scheduled(ticket.creation_id, manual_tx))
            .build();
        let outcome = current_status(chain.as_ref(), &ticket).await.unwrap();
        assert_eq!(outcome, RetryableOutcome::redeemed(manual_tx));
    }

    #[tokio::test]
    async fn live_ticket_has_funds_on_l2_and_dead_one_expired() {
        let ticket = ticket(contract_call_params(Address::ZERO));
        let live = MockChain::builder(L2_A)
            .with_receipt(receipt(ticket.creation_id, true, vec![]))
            .with_call(
                ARB_RETRYABLE_TX_ADDRESS,
                abi::encode_get_timeout_call(ticket.creation_id),
                Bytes::from(U256::from(1_800_000_000u64).to_be_bytes::<32>().to_vec()),
            )
            .build();
        let outcome = current_status(live.as_ref(), &ticket).await.unwrap();
        assert_eq!(outcome.status, RetryableStatus::FundsDepositedOnL2);

        let dead = MockChain::builder(L2_A)
            .with_receipt(receipt(ticket.creation_id, true, vec![]))
            .build();
        let outcome = current_status(dead.as_ref(), &ticket).await.unwrap();
        assert_eq!(outcome.status, RetryableStatus::Expired);
    }

    #[tokio::test]
    async fn rpc_errors_inside_the_wait_propagate() {
        let ticket = ticket(contract_call_params(Address::ZERO));
        let chain = MockChain::builder(L2_A).unreachable().build();
        let err = wait_for_status(quick(), || current_status(chain.as_ref(), &ticket))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Rpc { .. }));
    }

    #[tokio::test]
    async fn classic_ticket_is_redeemed_or_expired() {
        let ticket = ClassicRetryable::new(L2_A, tx_hash(0x01), U256::from(3u8), None);
        let redeemed = MockChain::builder(L2_A)
            .with_receipt(receipt(ticket.creation_id, true, vec![]))
            .with_receipt(receipt(ticket.redeem_tx_hash, true, vec![]))
            .build();
        let outcome = classic_status(redeemed.as_ref(), &ticket).await.unwrap();
        assert_eq!(outcome, RetryableOutcome::redeemed(ticket.redeem_tx_hash));

        let expired = MockChain::builder(L2_A)
            .with_receipt(receipt(ticket.creation_id, true, vec![]))
            .with_receipt(receipt(ticket.redeem_tx_hash, false, vec![]))
            .build();
        let outcome = classic_status(expired.as_ref(), &ticket).await.unwrap();
        assert_eq!(outcome.status, RetryableStatus::Expired);
    }

    #[tokio::test]
    async fn deposit_status_collapses_everything_but_success() {
        let deposit = EthDeposit::decode(
            L2_A,
            tx_hash(0x01),
            U256::from(2u8),
            Address::repeat_byte(0x05),
            &eth_deposit_payload(Address::repeat_byte(0x06), 10),
        )
        .unwrap();

        let done = MockChain::builder(L2_A)
            .with_receipt(receipt(deposit.deposit_tx_hash, true, vec![]))
            .build();
        assert_eq!(
            deposit_status(done.as_ref(), &deposit, quick()).await,
            DepositStatus::Completed
        );

        let reverted = MockChain::builder(L2_A)
            .with_receipt(receipt(deposit.deposit_tx_hash, false, vec![]))
            .build();
        assert_eq!(
            deposit_status(reverted.as_ref(), &deposit, quick()).await,
            DepositStatus::Unresolved
        );

        let missing = MockChain::builder(L2_A).build();
        assert_eq!(
            deposit_status(missing.as_ref(), &deposit, quick()).await,
            DepositStatus::Unresolved
        );

        let down = MockChain::builder(L2_A).unreachable().build();
        assert_eq!(
            deposit_status(down.as_ref(), &deposit, quick()).await,
            DepositStatus::Unresolved
        );
    }

    #[tokio::test]
    async fn resolved_retryable_carries_deposit_shape() {
        let params = deposit_shaped_params(Address::repeat_byte(0x0a));
        let ticket = ticket(params);
        let chain = MockChain::builder(L2_A)
            .with_receipt(receipt(ticket.creation_id, true, vec![]))
            .build();
        let network = registry().get(L2_A).unwrap();
        let message = NetworkMessage {
            message: L1ToL2Message::Retryable(ticket),
            network: Arc::clone(&network),
        };
        let resolved = resolve_message(chain.as_ref(), message, quick()).await.unwrap();
        assert_eq!(
            resolved.status,
            ResolvedStatus::Retryable {
                generation: Generation::Current,
                status: RetryableStatus::Expired,
                deposit_shaped: true,
            }
        );
        assert_eq!(resolved.l2_tx_hash, None);
    }
}
