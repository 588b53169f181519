use crate::cli::TraceArgs;
use crate::display::{OutboundDisplay, StatusDisplay};
use crate::tracker::{TraceMode, TraceReport, Tracker};
use anyhow::Result;

/// Trace one transaction and print the report.
pub async fn run(args: TraceArgs, tracker: &Tracker, mode: TraceMode) -> Result<()> {
    let report = tracker.trace(args.tx_hash.trim(), mode).await;
    print_report(&report, args.json)
}

pub fn print_report(report: &TraceReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let mut header = format!("tx {}", report.tx_hash);
    if let Some(direction) = report.direction {
        header.push_str(&format!(" ({direction}"));
        if let Some(chain_id) = report.origin_chain_id {
            header.push_str(&format!(", chain {chain_id}"));
        }
        header.push(')');
    }
    println!("{header}");
    if let Some(link) = &report.origin_explorer_link {
        println!("{link}");
    }
    println!("{} {}", report.summary.severity.icon(), report.summary.text);

    for message in &report.messages {
        print_message(message);
    }
    for message in &report.outbound {
        print_outbound(message);
    }
    Ok(())
}

fn print_message(message: &StatusDisplay) {
    println!();
    println!(
        "  [{} {}] {} {}",
        message.chain_id, message.network, message.kind, message.message_id
    );
    println!("    {} {}", message.severity.icon(), message.text);
    println!("    explorer: {}", message.explorer_link);
    if let Some(l2_tx) = &message.l2_tx_hash {
        println!("    l2 tx:    {l2_tx}");
    }
    if let Some(redeem) = &message.redeem {
        println!("    redeem:   send to {} on chain {}", redeem.to, redeem.chain_id);
        println!("    calldata: {}", redeem.calldata);
    }
}

fn print_outbound(message: &OutboundDisplay) {
    println!();
    println!(
        "  [{} -> {}] position {} to {}",
        message.chain_id, message.target_chain_id, message.position, message.destination
    );
    println!("    {} {}", message.severity.icon(), message.text);
    if let Some(batch) = message.batch {
        println!("    batch:    {batch}");
    }
    println!("    explorer: {}", message.explorer_link);
}
