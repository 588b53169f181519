//! Static table of the networks the tracker knows how to query.
//!
//! The registry is built once at startup (from the built-in defaults or the
//! `[[networks]]` section of the config file) and shared read-only by every
//! query afterwards.

use crate::config::{Config, NetworkConfig};
use crate::error::{TrackerError, TrackerResult};
use crate::types::parse_address;
use alloy_primitives::{address, Address, B256};
use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// Bridge contracts living on the parent chain of an L2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthBridge {
    pub inbox: Address,
    pub outbox: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    L1 {
        partner_chain_ids: Vec<u64>,
    },
    L2 {
        partner_chain_id: u64,
        bridge: EthBridge,
        confirm_period_blocks: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub role: Role,
}

impl Network {
    pub fn is_l1(&self) -> bool {
        matches!(self.role, Role::L1 { .. })
    }

    pub fn is_l2(&self) -> bool {
        matches!(self.role, Role::L2 { .. })
    }

    /// Partner chains in declaration order. An L2 has exactly one.
    pub fn partner_chain_ids(&self) -> Vec<u64> {
        match &self.role {
            Role::L1 { partner_chain_ids } => partner_chain_ids.clone(),
            Role::L2 {
                partner_chain_id, ..
            } => vec![*partner_chain_id],
        }
    }

    pub fn bridge(&self) -> Option<&EthBridge> {
        match &self.role {
            Role::L2 { bridge, .. } => Some(bridge),
            Role::L1 { .. } => None,
        }
    }

    pub fn confirm_period_blocks(&self) -> Option<u64> {
        match &self.role {
            Role::L2 {
                confirm_period_blocks,
                ..
            } => Some(*confirm_period_blocks),
            Role::L1 { .. } => None,
        }
    }

    pub fn explorer_tx_url(&self, tx_hash: B256) -> String {
        format!(
            "{}/tx/{tx_hash:#x}",
            self.explorer_url.trim_end_matches('/')
        )
    }

    fn from_config(cfg: &NetworkConfig) -> Result<Self> {
        let role = match cfg.role.as_str() {
            "l1" | "L1" => {
                let partner_chain_ids = cfg.partner_chain_ids.clone().unwrap_or_default();
                Role::L1 { partner_chain_ids }
            }
            "l2" | "L2" => {
                let partner_chain_id = cfg
                    .partner_chain_id
                    .ok_or_else(|| anyhow!("l2 network {} needs partner_chain_id", cfg.chain_id))?;
                let inbox = cfg
                    .inbox
                    .as_deref()
                    .ok_or_else(|| anyhow!("l2 network {} needs an inbox", cfg.chain_id))?;
                let outbox = cfg
                    .outbox
                    .as_deref()
                    .ok_or_else(|| anyhow!("l2 network {} needs an outbox", cfg.chain_id))?;
                Role::L2 {
                    partner_chain_id,
                    bridge: EthBridge {
                        inbox: parse_address(inbox)?,
                        outbox: parse_address(outbox)?,
                    },
                    confirm_period_blocks: cfg
                        .confirm_period_blocks
                        .unwrap_or(DEFAULT_CONFIRM_PERIOD_BLOCKS),
                }
            }
            other => anyhow::bail!("unknown role {other} for chain {}", cfg.chain_id),
        };
        Ok(Self {
            chain_id: cfg.chain_id,
            name: cfg
                .name
                .clone()
                .unwrap_or_else(|| format!("chain {}", cfg.chain_id)),
            rpc_url: cfg.rpc.clone(),
            explorer_url: cfg.explorer_url.clone().unwrap_or_default(),
            role,
        })
    }
}

pub const DEFAULT_CONFIRM_PERIOD_BLOCKS: u64 = 45_818;

#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: Vec<Arc<Network>>,
}

impl NetworkRegistry {
    /// Declaration order is probing priority.
    pub fn new(networks: Vec<Network>) -> Result<Self> {
        let mut seen = HashSet::new();
        for network in &networks {
            if !seen.insert(network.chain_id) {
                anyhow::bail!("chain {} declared twice", network.chain_id);
            }
        }
        Ok(Self {
            networks: networks.into_iter().map(Arc::new).collect(),
        })
    }

    /// Registry from config: `[[networks]]` replaces the built-in table and
    /// `[rpc]` overrides individual endpoints.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut networks = match config.networks.as_deref() {
            Some(entries) if !entries.is_empty() => entries
                .iter()
                .map(|cfg| {
                    Network::from_config(cfg)
                        .with_context(|| format!("invalid network entry {}", cfg.chain_id))
                })
                .collect::<Result<Vec<_>>>()?,
            _ => builtin_networks(),
        };
        for network in &mut networks {
            if let Some(url) = config.rpc_override(network.chain_id) {
                network.rpc_url = url.to_string();
            }
        }
        Self::new(networks)
    }

    pub fn get(&self, chain_id: u64) -> Option<Arc<Network>> {
        self.networks
            .iter()
            .find(|network| network.chain_id == chain_id)
            .cloned()
    }

    pub fn require_l2(&self, chain_id: u64) -> TrackerResult<Arc<Network>> {
        self.get(chain_id)
            .filter(|network| network.is_l2())
            .ok_or(TrackerError::UnsupportedNetwork(chain_id))
    }

    pub fn require_l1(&self, chain_id: u64) -> TrackerResult<Arc<Network>> {
        self.get(chain_id)
            .filter(|network| network.is_l1())
            .ok_or(TrackerError::UnsupportedNetwork(chain_id))
    }

    pub fn l1_networks(&self) -> Vec<Arc<Network>> {
        self.networks.iter().filter(|n| n.is_l1()).cloned().collect()
    }

    pub fn l2_networks(&self) -> Vec<Arc<Network>> {
        self.networks.iter().filter(|n| n.is_l2()).cloned().collect()
    }

    pub fn all(&self) -> &[Arc<Network>] {
        &self.networks
    }
}

pub fn builtin_networks() -> Vec<Network> {
    vec![
        Network {
            chain_id: 1,
            name: "Ethereum".to_string(),
            rpc_url: "https://ethereum-rpc.publicnode.com".to_string(),
            explorer_url: "https://etherscan.io".to_string(),
            role: Role::L1 {
                partner_chain_ids: vec![42161, 42170],
            },
        },
        Network {
            chain_id: 11155111,
            name: "Sepolia".to_string(),
            rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
            explorer_url: "https://sepolia.etherscan.io".to_string(),
            role: Role::L1 {
                partner_chain_ids: vec![421614],
            },
        },
        Network {
            chain_id: 42161,
            name: "Arbitrum One".to_string(),
            rpc_url: "https://arb1.arbitrum.io/rpc".to_string(),
            explorer_url: "https://arbiscan.io".to_string(),
            role: Role::L2 {
                partner_chain_id: 1,
                bridge: EthBridge {
                    inbox: address!("4dbd4fc535ac27206064b68ffcf827b0a60bab3f"),
                    outbox: address!("0b9857ae2d4a3dbe74ffe1d7df045bb7f96e4840"),
                },
                confirm_period_blocks: 45_818,
            },
        },
        Network {
            chain_id: 42170,
            name: "Arbitrum Nova".to_string(),
            rpc_url: "https://nova.arbitrum.io/rpc".to_string(),
            explorer_url: "https://nova.arbiscan.io".to_string(),
            role: Role::L2 {
                partner_chain_id: 1,
                bridge: EthBridge {
                    inbox: address!("c4448b71118c9071bcb9734a0eac55d18a153949"),
                    outbox: address!("d4b80c3d7240325d18e645b49e6535a3bf95cc58"),
                },
                confirm_period_blocks: 45_818,
            },
        },
        Network {
            chain_id: 421614,
            name: "Arbitrum Sepolia".to_string(),
            rpc_url: "https://sepolia-rollup.arbitrum.io/rpc".to_string(),
            explorer_url: "https://sepolia.arbiscan.io".to_string(),
            role: Role::L2 {
                partner_chain_id: 11155111,
                bridge: EthBridge {
                    inbox: address!("aae29b0366299461418f5324a79afc425be5ae21"),
                    outbox: address!("65f07c7d521164a4d5dac6eb8fac8da067a3b78f"),
                },
                confirm_period_blocks: 20,
            },
        },
    ]
}
