use crate::cli::NetworksArgs;
use crate::registry::{Network, NetworkRegistry, Role};
use crate::rpc::RpcClient;
use anyhow::Result;
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NetworkListItem {
    chain_id: u64,
    name: String,
    role: &'static str,
    partners: Vec<u64>,
    rpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reported_chain_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    probe_error: Option<String>,
}

/// List the registry, optionally probing each endpoint's chain id.
pub async fn run(
    args: NetworksArgs,
    registry: &NetworkRegistry,
    rpc_timeout: Duration,
) -> Result<()> {
    let probe = args.probe;
    let probes = registry.all().iter().map(|network| async move {
        if !probe {
            return (None, None);
        }
        match probe_chain_id(network, rpc_timeout).await {
            Ok(chain_id) => (Some(chain_id), None),
            Err(err) => (None, Some(err.to_string())),
        }
    });
    let probed = join_all(probes).await;

    let items: Vec<NetworkListItem> = registry
        .all()
        .iter()
        .zip(probed)
        .map(|(network, (reported_chain_id, probe_error))| NetworkListItem {
            chain_id: network.chain_id,
            name: network.name.clone(),
            role: match network.role {
                Role::L1 { .. } => "l1",
                Role::L2 { .. } => "l2",
            },
            partners: network.partner_chain_ids(),
            rpc: redact_url(&network.rpc_url),
            reported_chain_id,
            probe_error,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    println!(
        "{:<10} {:<18} {:<4} {:<14} {}",
        "chainId", "name", "role", "partners", "rpc"
    );
    for item in items {
        let partners = item
            .partners
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let mut line = format!(
            "{:<10} {:<18} {:<4} {:<14} {}",
            item.chain_id, item.name, item.role, partners, item.rpc
        );
        match (item.reported_chain_id, item.probe_error) {
            (Some(reported), _) if reported != item.chain_id => {
                line.push_str(&format!("  ❌ endpoint reports chain {reported}"))
            }
            (Some(_), _) => line.push_str("  ✅"),
            (None, Some(err)) => line.push_str(&format!("  ❌ {err}")),
            (None, None) => {}
        }
        println!("{line}");
    }
    Ok(())
}

async fn probe_chain_id(network: &Network, rpc_timeout: Duration) -> Result<u64> {
    let client = RpcClient::new(network.chain_id, &network.rpc_url, rpc_timeout)?;
    Ok(client.chain_id_from_node().await?)
}

/// Redact credentials from a URL string for display.
fn redact_url(value: &str) -> String {
    match url::Url::parse(value) {
        Ok(mut parsed) => {
            if !parsed.username().is_empty() {
                let _ = parsed.set_username("REDACTED");
            }
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            // api keys are commonly passed as the last path segment
            let key_like = parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .is_some_and(|segment| segment.len() >= 24);
            if key_like {
                if let Ok(mut segments) = parsed.path_segments_mut() {
                    segments.pop().push("REDACTED");
                }
            }
            parsed.to_string()
        }
        Err(_) => value.to_string(),
    }
}
