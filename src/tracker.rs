//! Per-query pipeline: locate, extract, resolve, display.
//!
//! A [`Tracker`] is cheap to clone and holds nothing but the immutable
//! registry, a connector and timing options, so independent queries never
//! share mutable state.

use crate::config::Timing;
use crate::display::{
    outbound_status_display, receipt_state_display, status_display, DisplayLine,
    OutboundDisplay, ReceiptState, StatusDisplay,
};
use crate::error::{TrackerError, TrackerResult};
use crate::extract::extract_messages;
use crate::locator::locate_receipt;
use crate::outbound::{extract_outbound, outbound_status};
use crate::registry::{Network, NetworkRegistry};
use crate::retryable::{resolve_message, StatusWait};
use crate::rpc::{ChainReader, Connector};
use crate::types::Direction;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerOptions {
    pub status_wait: StatusWait,
    pub request_timeout: Duration,
    pub seconds_per_block: u64,
}

impl From<Timing> for TrackerOptions {
    fn from(timing: Timing) -> Self {
        Self {
            status_wait: StatusWait {
                window: timing.status_wait,
                poll_interval: timing.poll_interval,
            },
            request_timeout: timing.request_timeout,
            seconds_per_block: timing.seconds_per_block,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceMode {
    L1ToL2,
    L2ToL1,
    /// L1 networks first, then L2 networks if the hash is unknown on L1.
    Auto,
}

#[derive(Debug, Clone)]
pub struct InboundTrace {
    pub origin_chain_id: u64,
    pub origin_explorer_link: String,
    pub messages: Vec<StatusDisplay>,
}

#[derive(Debug, Clone)]
pub struct OutboundTrace {
    pub origin_chain_id: u64,
    pub origin_explorer_link: String,
    pub messages: Vec<OutboundDisplay>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceReport {
    pub tx_hash: String,
    pub direction: Option<Direction>,
    pub receipt_state: ReceiptState,
    pub summary: DisplayLine,
    pub origin_chain_id: Option<u64>,
    /// Explorer page of the located transaction on its own chain.
    pub origin_explorer_link: Option<String>,
    pub messages: Vec<StatusDisplay>,
    pub outbound: Vec<OutboundDisplay>,
}

impl TraceReport {
    fn new(tx_hash: &str, direction: Option<Direction>, state: ReceiptState) -> Self {
        Self {
            tx_hash: tx_hash.to_string(),
            direction,
            receipt_state: state,
            summary: receipt_state_display(state),
            origin_chain_id: None,
            origin_explorer_link: None,
            messages: Vec::new(),
            outbound: Vec::new(),
        }
    }

    fn inbound(tx_hash: &str, trace: InboundTrace) -> Self {
        let state = if trace.messages.is_empty() {
            ReceiptState::NoL1L2Messages
        } else {
            ReceiptState::MessagesFound
        };
        Self {
            origin_chain_id: Some(trace.origin_chain_id),
            origin_explorer_link: Some(trace.origin_explorer_link),
            messages: trace.messages,
            ..Self::new(tx_hash, Some(Direction::L1ToL2), state)
        }
    }

    fn outbound(tx_hash: &str, trace: OutboundTrace) -> Self {
        let state = if trace.messages.is_empty() {
            ReceiptState::NoL2L1Messages
        } else {
            ReceiptState::MessagesFound
        };
        Self {
            origin_chain_id: Some(trace.origin_chain_id),
            origin_explorer_link: Some(trace.origin_explorer_link),
            outbound: trace.messages,
            ..Self::new(tx_hash, Some(Direction::L2ToL1), state)
        }
    }
}

enum Traced {
    Inbound(InboundTrace),
    Outbound(OutboundTrace),
}

#[derive(Clone)]
pub struct Tracker {
    registry: Arc<NetworkRegistry>,
    connector: Arc<dyn Connector>,
    options: TrackerOptions,
}

impl Tracker {
    pub fn new(
        registry: Arc<NetworkRegistry>,
        connector: Arc<dyn Connector>,
        options: TrackerOptions,
    ) -> Self {
        Self {
            registry,
            connector,
            options,
        }
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    fn readers_for<'a>(
        &self,
        networks: impl IntoIterator<Item = &'a Arc<Network>>,
    ) -> TrackerResult<HashMap<u64, Arc<dyn ChainReader>>> {
        let mut readers = HashMap::new();
        for network in networks {
            if !readers.contains_key(&network.chain_id) {
                readers.insert(network.chain_id, self.connector.connect(network)?);
            }
        }
        Ok(readers)
    }

    pub async fn trace_l1_to_l2(&self, tx_hash: &str) -> TrackerResult<InboundTrace> {
        let located =
            locate_receipt(tx_hash, &self.registry.l1_networks(), self.connector.as_ref()).await?;
        let origin = located.network;
        if !located.receipt.success {
            return Err(TrackerError::UpstreamFailed {
                tx_hash: located.receipt.tx_hash,
                chain_id: origin.chain_id,
            });
        }

        let messages = extract_messages(&located.receipt, &origin, &self.registry)?;
        let readers = self.readers_for(messages.iter().map(|message| &message.network))?;
        let wait = self.options.status_wait;
        let pending = messages.into_iter().map(|message| {
            let reader = readers.get(&message.network.chain_id).cloned();
            async move {
                let reader =
                    reader.ok_or(TrackerError::UnsupportedNetwork(message.network.chain_id))?;
                resolve_message(reader.as_ref(), message, wait).await
            }
        });
        let resolved = join_all(pending)
            .await
            .into_iter()
            .collect::<TrackerResult<Vec<_>>>()?;

        let messages = resolved
            .iter()
            .map(status_display)
            .collect::<TrackerResult<Vec<_>>>()?;
        Ok(InboundTrace {
            origin_chain_id: origin.chain_id,
            origin_explorer_link: origin.explorer_tx_url(located.receipt.tx_hash),
            messages,
        })
    }

    pub async fn trace_l2_to_l1(&self, tx_hash: &str) -> TrackerResult<OutboundTrace> {
        let located =
            locate_receipt(tx_hash, &self.registry.l2_networks(), self.connector.as_ref()).await?;
        let source = located.network;
        if !located.receipt.success {
            return Err(TrackerError::UpstreamFailed {
                tx_hash: located.receipt.tx_hash,
                chain_id: source.chain_id,
            });
        }

        let messages = extract_outbound(&located.receipt, &source, &self.registry)?;
        let readers = self.readers_for(messages.iter().map(|message| &message.target))?;
        let l2 = located.reader;
        let seconds_per_block = self.options.seconds_per_block;
        let pending = messages.into_iter().map(|message| {
            let l1 = readers.get(&message.target.chain_id).cloned();
            let l2 = l2.clone();
            async move {
                let l1 = l1.ok_or(TrackerError::UnsupportedNetwork(message.target.chain_id))?;
                outbound_status(l1.as_ref(), l2.as_ref(), message, seconds_per_block).await
            }
        });
        let resolved = join_all(pending)
            .await
            .into_iter()
            .collect::<TrackerResult<Vec<_>>>()?;

        Ok(OutboundTrace {
            origin_chain_id: source.chain_id,
            origin_explorer_link: source.explorer_tx_url(located.receipt.tx_hash),
            messages: resolved.iter().map(outbound_status_display).collect(),
        })
    }

    async fn run(&self, tx_hash: &str, mode: TraceMode) -> TrackerResult<Traced> {
        match mode {
            TraceMode::L1ToL2 => self.trace_l1_to_l2(tx_hash).await.map(Traced::Inbound),
            TraceMode::L2ToL1 => self.trace_l2_to_l1(tx_hash).await.map(Traced::Outbound),
            TraceMode::Auto => match self.trace_l1_to_l2(tx_hash).await {
                Err(TrackerError::NotFound(_)) => {
                    tracing::debug!(tx_hash, "not found on L1, trying L2 networks");
                    self.trace_l2_to_l1(tx_hash).await.map(Traced::Outbound)
                }
                other => other.map(Traced::Inbound),
            },
        }
    }

    /// Runs one query under the request deadline. Never fails: every error
    /// becomes a receipt state, with the details going to the log.
    pub async fn trace(&self, tx_hash: &str, mode: TraceMode) -> TraceReport {
        let deadline = self.options.request_timeout;
        let result = match tokio::time::timeout(deadline, self.run(tx_hash, mode)).await {
            Ok(result) => result,
            Err(_) => Err(TrackerError::DeadlineExceeded(deadline)),
        };
        match result {
            Ok(Traced::Inbound(trace)) => TraceReport::inbound(tx_hash, trace),
            Ok(Traced::Outbound(trace)) => TraceReport::outbound(tx_hash, trace),
            Err(err) => self.failure_report(tx_hash, mode, err),
        }
    }

    fn failure_report(&self, tx_hash: &str, mode: TraceMode, err: TrackerError) -> TraceReport {
        let direction = match mode {
            TraceMode::L1ToL2 => Some(Direction::L1ToL2),
            TraceMode::L2ToL1 => Some(Direction::L2ToL1),
            TraceMode::Auto => None,
        };
        let state = match &err {
            TrackerError::InvalidInput(_) => ReceiptState::InvalidInputLength,
            TrackerError::NotFound(_) => ReceiptState::NotFound,
            TrackerError::UpstreamFailed { chain_id, .. } => {
                let on_l1 = self
                    .registry
                    .get(*chain_id)
                    .is_some_and(|network| network.is_l1());
                if on_l1 {
                    ReceiptState::L1Failed
                } else {
                    ReceiptState::L2Failed
                }
            }
            _ => ReceiptState::TrackerFailed,
        };
        match state {
            ReceiptState::TrackerFailed => tracing::error!(tx_hash, error = %err, "query failed"),
            _ => tracing::info!(tx_hash, error = %err, "query ended without messages"),
        }
        let direction = match state {
            ReceiptState::L1Failed => Some(Direction::L1ToL2),
            ReceiptState::L2Failed => Some(Direction::L2ToL1),
            _ => direction,
        };
        TraceReport::new(tx_hash, direction, state)
    }
}

/// Holds at most one in-flight query; submitting a new one aborts the
/// previous.
#[derive(Default)]
pub struct LatestQuery {
    current: Option<JoinHandle<()>>,
}

impl LatestQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit<F>(&mut self, query: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.current.take() {
            if !previous.is_finished() {
                tracing::debug!("superseding in-flight query");
            }
            previous.abort();
        }
        self.current = Some(tokio::spawn(query));
    }

    /// Waits for the last submitted query, if any.
    pub async fn finish(&mut self) {
        if let Some(handle) = self.current.take() {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    tracing::warn!(error = %err, "query task failed");
                }
            }
        }
    }
}
