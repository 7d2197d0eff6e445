//! Configuration module for the DataPact client
//!
//! Configuration is loaded from a TOML file, then overridden from the
//! environment (a `.env` file is read first via dotenvy). Every section and
//! field has a default, so an empty file is a valid testnet configuration
//! apart from the contract package id.

use crate::retry::RetryOptions;
use crate::validation::is_object_id;
use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fullnode connection
    pub network: NetworkConfig,

    /// Deployed contract coordinates
    pub contract: ContractConfig,

    /// Finality polling and retry policy
    pub finality: FinalityConfig,

    /// External signing bridge
    pub wallet: WalletConfig,
}

/// Sui network the client talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiNetwork {
    #[default]
    Testnet,
    Mainnet,
    Devnet,
}

impl SuiNetwork {
    /// Public fullnode endpoint
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            SuiNetwork::Testnet => "https://fullnode.testnet.sui.io:443",
            SuiNetwork::Mainnet => "https://fullnode.mainnet.sui.io:443",
            SuiNetwork::Devnet => "https://fullnode.devnet.sui.io:443",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SuiNetwork::Testnet => "testnet",
            SuiNetwork::Mainnet => "mainnet",
            SuiNetwork::Devnet => "devnet",
        }
    }
}

impl fmt::Display for SuiNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuiNetwork {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(SuiNetwork::Testnet),
            "mainnet" => Ok(SuiNetwork::Mainnet),
            "devnet" => Ok(SuiNetwork::Devnet),
            other => Err(anyhow!("unknown Sui network '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub name: SuiNetwork,

    /// Overrides the network's public fullnode
    pub rpc_url: Option<String>,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Client-side rate limit (requests per second, 0 disables)
    pub rate_limit_rps: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: SuiNetwork::default(),
            rpc_url: None,
            request_timeout_ms: default_request_timeout_ms(),
            rate_limit_rps: default_rate_limit_rps(),
        }
    }
}

impl NetworkConfig {
    /// Configured URL, or the network's public fullnode
    pub fn rpc_url(&self) -> &str {
        match self.rpc_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ => self.name.default_rpc_url(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Published package id (`0x…`); required to build calls
    pub package_id: String,
    pub module: String,
    /// Coin type of the reward pool
    pub coin_type: String,
    pub create_function: String,
    pub submit_function: String,
    pub label_finalized_event: String,
    pub create_bounty_event: String,
    /// Compare the sender's balance with the reward before asking the wallet to sign
    pub check_balance: bool,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            package_id: String::new(),
            module: default_module(),
            coin_type: default_coin_type(),
            create_function: default_create_function(),
            submit_function: default_submit_function(),
            label_finalized_event: default_label_finalized_event(),
            create_bounty_event: default_create_bounty_event(),
            check_balance: true,
        }
    }
}

impl ContractConfig {
    /// Fully qualified Move event type, e.g. `0x…::datapact::CreateBountyEvent`
    pub fn event_type(&self, event: &str) -> String {
        format!("{}::{}::{}", self.package_id, self.module, event)
    }

    pub fn has_package_id(&self) -> bool {
        !self.package_id.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalityConfig {
    /// Overall budget for one wait on a digest
    pub wait_timeout_ms: u64,
    /// Delay between lookups while the digest is unknown
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for FinalityConfig {
    fn default() -> Self {
        let retry = RetryOptions::finality();
        Self {
            wait_timeout_ms: default_wait_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: retry.max_attempts,
            initial_delay_ms: retry.initial_delay.as_millis() as u64,
            max_delay_ms: retry.max_delay.as_millis() as u64,
            backoff_multiplier: retry.backoff_multiplier,
        }
    }
}

impl FinalityConfig {
    pub fn retry_options(&self) -> RetryOptions {
        RetryOptions {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Base URL of the external signing bridge
    pub bridge_url: Option<String>,

    /// Connected account address
    pub address: Option<String>,
}

fn default_request_timeout_ms() -> u64 { 30_000 }
fn default_rate_limit_rps() -> u32 { 20 }
fn default_module() -> String { "datapact".to_string() }
fn default_coin_type() -> String { "0x2::sui::SUI".to_string() }
fn default_create_function() -> String { "create_database_bounty".to_string() }
fn default_submit_function() -> String { "submit_label".to_string() }
fn default_label_finalized_event() -> String { "LabelFinalizedEvent".to_string() }
fn default_create_bounty_event() -> String { "CreateBountyEvent".to_string() }
fn default_wait_timeout_ms() -> u64 { 60_000 }
fn default_poll_interval_ms() -> u64 { 2_000 }

pub const ENV_NETWORK: &str = "DATAPACT_NETWORK";
pub const ENV_RPC_URL: &str = "DATAPACT_RPC_URL";
pub const ENV_PACKAGE_ID: &str = "DATAPACT_PACKAGE_ID";
pub const ENV_WALLET_BRIDGE_URL: &str = "DATAPACT_WALLET_BRIDGE_URL";
pub const ENV_WALLET_ADDRESS: &str = "DATAPACT_WALLET_ADDRESS";

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content).context("invalid configuration TOML")?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Load configuration with environment variable overrides
    ///
    /// A missing file falls back to defaults so that everything can come from
    /// the environment. The result is validated.
    pub fn from_file_with_env(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            debug!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        if !config.contract.has_package_id() {
            warn!("Contract package id is not configured; building calls will fail");
        }

        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment)
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(network) = get(ENV_NETWORK) {
            self.network.name = network
                .parse()
                .with_context(|| format!("invalid {}", ENV_NETWORK))?;
        }
        if let Some(url) = get(ENV_RPC_URL) {
            self.network.rpc_url = Some(url);
        }
        if let Some(package_id) = get(ENV_PACKAGE_ID) {
            self.contract.package_id = package_id;
        }
        if let Some(url) = get(ENV_WALLET_BRIDGE_URL) {
            self.wallet.bridge_url = Some(url);
        }
        if let Some(address) = get(ENV_WALLET_ADDRESS) {
            self.wallet.address = Some(address);
        }
        Ok(())
    }

    /// Reject configurations the client cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        self.finality
            .retry_options()
            .validate()
            .map_err(|e| anyhow!("invalid [finality] policy: {}", e))?;

        if self.finality.poll_interval_ms == 0 {
            bail!("[finality] poll_interval_ms must be greater than 0");
        }
        if self.network.request_timeout_ms == 0 {
            bail!("[network] request_timeout_ms must be greater than 0");
        }
        if self.contract.has_package_id() && !is_object_id(&self.contract.package_id) {
            bail!(
                "[contract] package_id '{}' is not a 0x-prefixed hex id",
                self.contract.package_id
            );
        }
        if let Some(address) = self.wallet.address.as_deref() {
            if !is_object_id(address) {
                bail!("[wallet] address '{}' is not a 0x-prefixed hex address", address);
            }
        }
        Ok(())
    }
}
