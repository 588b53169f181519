use crate::cli::WatchArgs;
use crate::commands::trace::print_report;
use crate::tracker::{LatestQuery, TraceMode, Tracker};
use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Trace every hash read from stdin. A new line aborts the query still
/// running for the previous one.
pub async fn run(args: WatchArgs, tracker: Tracker) -> Result<()> {
    let mode = TraceMode::from(args.direction);
    let json = args.json;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut latest = LatestQuery::new();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let tx_hash = line.trim().to_string();
        if tx_hash.is_empty() {
            continue;
        }
        tracing::info!(tx_hash = %tx_hash, "tracing");
        let tracker = tracker.clone();
        latest.submit(async move {
            let report = tracker.trace(&tx_hash, mode).await;
            if let Err(err) = print_report(&report, json) {
                tracing::warn!(error = %err, "failed to print report");
            }
        });
    }

    latest.finish().await;
    Ok(())
}
