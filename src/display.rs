//! Maps resolved statuses to user-facing lines.
//!
//! Everything here is pure and exhaustive over the status enums: adding a
//! status variant fails to compile until a line is chosen for it.

use crate::abi::{self, ARB_RETRYABLE_TX_ADDRESS};
use crate::error::{TrackerError, TrackerResult};
use crate::message::{Generation, L1ToL2Message};
use crate::outbound::{ConfirmationInfo, OutboundStatus, ResolvedOutbound};
use crate::retryable::{DepositStatus, ResolvedMessage, ResolvedStatus, RetryableStatus};
use crate::types::{address_to_hex, b256_to_hex, format_hex, u256_to_string, Severity};
use serde::Serialize;

const DEPOSIT_COMPLETED: &str = "Success! 🎉 Your Eth deposit has completed";
const ASSERTION_PENDING: &str =
    "Challenge period elapsed; waiting for the rollup to confirm the assertion covering this message.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayLine {
    pub text: String,
    pub severity: Severity,
    pub action_required: bool,
}

impl DisplayLine {
    fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
            action_required: false,
        }
    }

    fn action(mut self) -> Self {
        self.action_required = true;
        self
    }
}

/// Everything a collaborator needs to submit a manual redeem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedeemHandle {
    pub chain_id: u64,
    pub ticket_id: String,
    pub to: String,
    pub calldata: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusDisplay {
    pub kind: &'static str,
    pub chain_id: u64,
    pub network: String,
    pub status: &'static str,
    pub text: String,
    pub severity: Severity,
    pub action_required: bool,
    pub explorer_url: String,
    pub origin_tx: String,
    pub message_number: String,
    pub message_id: String,
    pub explorer_link: String,
    pub l2_tx_hash: Option<String>,
    /// Recipient and amount, for plain ETH deposits.
    pub deposit: Option<DepositDetails>,
    pub redeem: Option<RedeemHandle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositDetails {
    pub from: String,
    pub to: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundDisplay {
    pub chain_id: u64,
    pub target_chain_id: u64,
    pub caller: String,
    pub destination: String,
    pub position: String,
    pub callvalue: String,
    pub data: String,
    pub l1_block: u64,
    pub status: OutboundStatus,
    pub text: String,
    pub severity: Severity,
    pub action_required: bool,
    pub batch: Option<u64>,
    pub deadline_block: Option<u64>,
    pub eta_seconds: Option<u64>,
    pub explorer_link: String,
}

/// Outcome of a whole query, before any message is looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptState {
    InvalidInputLength,
    NotFound,
    L1Failed,
    L2Failed,
    NoL1L2Messages,
    NoL2L1Messages,
    MessagesFound,
    TrackerFailed,
}

pub fn retryable_display(
    generation: Generation,
    status: RetryableStatus,
    deposit_shaped: bool,
) -> TrackerResult<DisplayLine> {
    match generation {
        Generation::Current => Ok(current_retryable_display(status, deposit_shaped)),
        Generation::Classic => classic_retryable_display(status, deposit_shaped),
    }
}

fn current_retryable_display(status: RetryableStatus, deposit_shaped: bool) -> DisplayLine {
    match status {
        RetryableStatus::CreationFailed => DisplayLine::new(
            "L2 message creation reverted; perhaps provided maxSubmissionCost was too low?",
            Severity::Failure,
        ),
        RetryableStatus::Expired | RetryableStatus::FundsDepositedOnL2 if deposit_shaped => {
            DisplayLine::new(DEPOSIT_COMPLETED, Severity::Success)
        }
        RetryableStatus::Expired => {
            DisplayLine::new("Retryable ticket expired.", Severity::Failure)
        }
        RetryableStatus::NotYetCreated => DisplayLine::new(
            "L1 to L2 message initiated from L1, but not yet created, check again in a few minutes!",
            Severity::Pending,
        ),
        RetryableStatus::Redeemed => {
            DisplayLine::new("Success! 🎉 Your retryable was executed.", Severity::Success)
        }
        RetryableStatus::FundsDepositedOnL2 => {
            DisplayLine::new("Auto-redeem failed; you can redeem it now:", Severity::Warning)
                .action()
        }
    }
}

fn classic_retryable_display(
    status: RetryableStatus,
    deposit_shaped: bool,
) -> TrackerResult<DisplayLine> {
    let line = match status {
        RetryableStatus::CreationFailed => DisplayLine::new(
            "Classic L2 message creation reverted; perhaps provided maxSubmissionCost was too low?",
            Severity::Failure,
        ),
        RetryableStatus::Expired if deposit_shaped => {
            DisplayLine::new(DEPOSIT_COMPLETED, Severity::Success)
        }
        RetryableStatus::Expired => DisplayLine::new(
            "Classic retryable ticket was not redeemed and has expired.",
            Severity::Failure,
        ),
        RetryableStatus::NotYetCreated => DisplayLine::new(
            "Classic L1 to L2 message not yet created on L2, check again in a few minutes!",
            Severity::Pending,
        ),
        RetryableStatus::Redeemed => DisplayLine::new(
            "Success! 🎉 Your classic retryable was executed.",
            Severity::Success,
        ),
        RetryableStatus::FundsDepositedOnL2 => {
            return Err(TrackerError::UnknownStatus {
                generation: Generation::Classic.label(),
                status: status.as_str(),
            })
        }
    };
    Ok(line)
}

pub fn deposit_display(status: DepositStatus) -> DisplayLine {
    match status {
        DepositStatus::Completed => DisplayLine::new(DEPOSIT_COMPLETED, Severity::Success),
        DepositStatus::Unresolved => DisplayLine::new(
            "Something failed in this tracker, you can try to check your account on l2",
            Severity::Failure,
        ),
    }
}

/// Rough human form of a duration, e.g. `6d 8h` or `12m`.
pub fn format_eta(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    match (days, hours, minutes) {
        (0, 0, 0) => format!("{seconds}s"),
        (0, 0, m) => format!("{m}m"),
        (0, h, m) => format!("{h}h {m}m"),
        (d, h, _) => format!("{d}d {h}h"),
    }
}

pub fn outbound_display(
    status: OutboundStatus,
    confirmation: Option<&ConfirmationInfo>,
) -> DisplayLine {
    match (status, confirmation) {
        (OutboundStatus::Executed, _) => DisplayLine::new(
            "Success! 🎉 Your L2 to L1 message was executed on L1.",
            Severity::Success,
        ),
        (OutboundStatus::Confirmed, _) => DisplayLine::new(
            "Message confirmed; it can now be executed on L1.",
            Severity::Warning,
        )
        .action(),
        (OutboundStatus::Unconfirmed, Some(info)) if info.eta_seconds == 0 => {
            DisplayLine::new(ASSERTION_PENDING, Severity::Pending)
        }
        (OutboundStatus::Unconfirmed, Some(info)) => DisplayLine::new(
            format!(
                "Waiting for the challenge period; executable from L1 block {} (about {}).",
                info.deadline_block,
                format_eta(info.eta_seconds)
            ),
            Severity::Pending,
        ),
        (OutboundStatus::Unconfirmed, None) => DisplayLine::new(
            "Message not yet included in a batch posted to L1.",
            Severity::Pending,
        ),
    }
}

pub fn receipt_state_display(state: ReceiptState) -> DisplayLine {
    match state {
        ReceiptState::InvalidInputLength => {
            DisplayLine::new("Error: invalid transaction hash", Severity::Failure)
        }
        ReceiptState::NotFound => DisplayLine::new(
            "Transaction not found on any supported network",
            Severity::Warning,
        ),
        ReceiptState::L1Failed => {
            DisplayLine::new("Error: L1 transaction reverted", Severity::Failure)
        }
        ReceiptState::L2Failed => {
            DisplayLine::new("Error: L2 transaction reverted", Severity::Failure)
        }
        ReceiptState::NoL1L2Messages => DisplayLine::new(
            "No L1-to-L2 messages created by provided L1 transaction",
            Severity::Warning,
        ),
        ReceiptState::NoL2L1Messages => DisplayLine::new(
            "No L2-to-L1 messages created by provided L2 transaction",
            Severity::Warning,
        ),
        ReceiptState::MessagesFound => {
            DisplayLine::new("Cross chain messages found", Severity::Success)
        }
        ReceiptState::TrackerFailed => DisplayLine::new(
            "Something failed in this tracker, check the logs for details",
            Severity::Failure,
        ),
    }
}

fn redeem_handle(chain_id: u64, message: &L1ToL2Message) -> Option<RedeemHandle> {
    let L1ToL2Message::Retryable(ticket) = message else {
        return None;
    };
    Some(RedeemHandle {
        chain_id,
        ticket_id: b256_to_hex(ticket.creation_id),
        to: address_to_hex(ARB_RETRYABLE_TX_ADDRESS),
        calldata: format_hex(&abi::encode_redeem_call(ticket.creation_id)),
    })
}

pub fn status_display(resolved: &ResolvedMessage) -> TrackerResult<StatusDisplay> {
    let network = &resolved.message.network;
    let message = &resolved.message.message;
    let (line, status) = match resolved.status {
        ResolvedStatus::Retryable {
            generation,
            status,
            deposit_shaped,
        } => (
            retryable_display(generation, status, deposit_shaped)?,
            status.as_str(),
        ),
        ResolvedStatus::EthDeposit(status) => (
            deposit_display(status),
            match status {
                DepositStatus::Completed => "COMPLETED",
                DepositStatus::Unresolved => "UNRESOLVED",
            },
        ),
    };
    let redeem = if line.action_required {
        redeem_handle(network.chain_id, message)
    } else {
        None
    };
    let deposit = match message {
        L1ToL2Message::EthDeposit(deposit) => Some(DepositDetails {
            from: address_to_hex(deposit.from),
            to: address_to_hex(deposit.to),
            value: u256_to_string(deposit.value),
        }),
        _ => None,
    };
    Ok(StatusDisplay {
        kind: message.kind_label(),
        chain_id: network.chain_id,
        network: network.name.clone(),
        status,
        text: line.text,
        severity: line.severity,
        action_required: line.action_required,
        explorer_url: network.explorer_url.clone(),
        origin_tx: b256_to_hex(message.origin_tx()),
        message_number: u256_to_string(message.message_number()),
        message_id: b256_to_hex(message.id()),
        explorer_link: network.explorer_tx_url(message.id()),
        l2_tx_hash: resolved.l2_tx_hash.map(b256_to_hex),
        deposit,
        redeem,
    })
}

pub fn outbound_status_display(resolved: &ResolvedOutbound) -> OutboundDisplay {
    let line = outbound_display(resolved.status, resolved.confirmation.as_ref());
    let message = &resolved.message;
    OutboundDisplay {
        chain_id: message.source.chain_id,
        target_chain_id: message.target.chain_id,
        caller: address_to_hex(message.caller),
        destination: address_to_hex(message.destination),
        position: u256_to_string(message.position),
        callvalue: u256_to_string(message.callvalue),
        data: format_hex(&message.data),
        l1_block: message.l1_block,
        status: resolved.status,
        text: line.text,
        severity: line.severity,
        action_required: line.action_required,
        batch: resolved.batch,
        deadline_block: resolved.confirmation.map(|info| info.deadline_block),
        eta_seconds: resolved.confirmation.map(|info| info.eta_seconds),
        explorer_link: message.source.explorer_tx_url(message.origin_tx),
    }
}
