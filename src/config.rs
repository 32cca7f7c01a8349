//! Marketplace configuration loaded from `bountyboard.toml`.
//!
//! Values absent from the file use defaults matching the production
//! deployment; the `FACILITATOR_URL`, `PAY_TO_ADDRESS`, and `PAYMENT_NETWORK`
//! environment variables take precedence over the file.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// Base URL of the x402 payment facilitator.
    #[serde(default = "default_facilitator_url")]
    pub facilitator_url: String,

    /// Payee wallet address payments settle to.
    #[serde(default)]
    pub pay_to: String,

    /// Settlement network name (celo, celo-sepolia, base, avalanche).
    #[serde(default = "default_network")]
    pub network: String,

    /// Base URL the challenge's resource field is qualified against.
    #[serde(default = "default_resource_base")]
    pub resource_base: String,
}

fn default_facilitator_url() -> String {
    "https://stack.perkos.xyz".to_string()
}

fn default_network() -> String {
    crate::x402::networks::DEFAULT_NETWORK.to_string()
}

fn default_resource_base() -> String {
    "https://bountyboard.xyz".to_string()
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            facilitator_url: default_facilitator_url(),
            pay_to: String::new(),
            network: default_network(),
            resource_base: default_resource_base(),
        }
    }
}

impl MarketConfig {
    /// Load configuration from `bountyboard.toml` in the current directory,
    /// falling back to defaults if the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("bountyboard.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<MarketConfig>(&contents)?
        } else {
            Self::default()
        };

        // Environment takes precedence over the file.
        if let Ok(url) = std::env::var("FACILITATOR_URL")
            && !url.is_empty()
        {
            config.facilitator_url = url;
        }
        if let Ok(address) = std::env::var("PAY_TO_ADDRESS")
            && !address.is_empty()
        {
            config.pay_to = address;
        }
        if let Ok(network) = std::env::var("PAYMENT_NETWORK")
            && !network.is_empty()
        {
            config.network = network;
        }

        Ok(config)
    }
}
