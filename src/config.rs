use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Chain id (as a string key) to RPC URL.
    pub rpc: Option<BTreeMap<String, String>>,
    pub networks: Option<Vec<NetworkConfig>>,
    pub tracker: Option<TrackerConfig>,
    #[serde(skip)]
    pub path: PathBuf,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct NetworkConfig {
    #[serde(rename = "chainId", alias = "chain_id")]
    pub chain_id: u64,
    pub name: Option<String>,
    pub role: String,
    pub rpc: String,
    pub explorer_url: Option<String>,
    pub partner_chain_ids: Option<Vec<u64>>,
    pub partner_chain_id: Option<u64>,
    pub inbox: Option<String>,
    pub outbox: Option<String>,
    pub confirm_period_blocks: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct TrackerConfig {
    pub status_wait_ms: Option<u64>,
    pub poll_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub rpc_timeout_ms: Option<u64>,
    pub seconds_per_block: Option<u64>,
}

/// Timing knobs after merging CLI flags over the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub status_wait: Duration,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub rpc_timeout: Duration,
    pub seconds_per_block: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            status_wait: Duration::from_millis(10_000),
            poll_interval: Duration::from_millis(1_000),
            request_timeout: Duration::from_millis(120_000),
            rpc_timeout: Duration::from_millis(15_000),
            seconds_per_block: 15,
        }
    }
}

/// Per-invocation overrides coming from the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimingFlags {
    pub status_wait_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub seconds_per_block: Option<u64>,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path(),
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using built-in networks");
            return Ok(Self {
                path,
                ..Self::default()
            });
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.path = path;
        Ok(config)
    }

    /// Applies `CHAIN_ID=URL` pairs given on the command line.
    pub fn apply_rpc_flags(&mut self, pairs: &[String]) -> Result<()> {
        for pair in pairs {
            let (chain, url) = pair
                .split_once('=')
                .with_context(|| format!("invalid --rpc value {pair} (expected CHAIN_ID=URL)"))?;
            let chain_id: u64 = chain
                .trim()
                .parse()
                .with_context(|| format!("invalid chain id in --rpc {pair}"))?;
            url::Url::parse(url.trim()).with_context(|| format!("invalid rpc url in {pair}"))?;
            self.rpc
                .get_or_insert_with(BTreeMap::new)
                .insert(chain_id.to_string(), url.trim().to_string());
        }
        Ok(())
    }

    pub fn rpc_override(&self, chain_id: u64) -> Option<&str> {
        self.rpc
            .as_ref()?
            .get(&chain_id.to_string())
            .map(String::as_str)
    }

    pub fn timing(&self, flags: TimingFlags) -> Timing {
        let defaults = Timing::default();
        let cfg = self.tracker.clone().unwrap_or_default();
        let ms = |flag: Option<u64>, file: Option<u64>, fallback: Duration| {
            flag.or(file).map(Duration::from_millis).unwrap_or(fallback)
        };
        Timing {
            status_wait: ms(flags.status_wait_ms, cfg.status_wait_ms, defaults.status_wait),
            poll_interval: ms(None, cfg.poll_ms, defaults.poll_interval),
            request_timeout: ms(
                flags.request_timeout_ms,
                cfg.request_timeout_ms,
                defaults.request_timeout,
            ),
            rpc_timeout: ms(None, cfg.rpc_timeout_ms, defaults.rpc_timeout),
            seconds_per_block: flags
                .seconds_per_block
                .or(cfg.seconds_per_block)
                .unwrap_or(defaults.seconds_per_block),
        }
    }
}

fn default_config_path() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        return dir.join("retryable-tracker").join("config.toml");
    }
    PathBuf::from("./config.toml")
}
