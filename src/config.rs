// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup into typed
//! [`Settings`]. Ledger and mirror clients are constructed per call from these
//! settings; nothing holds an ambient global client.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory for the embedded donation ledger | `/data` |
//! | `HEDERA_NETWORK` | `testnet` or `mainnet` | Required |
//! | `HEDERA_OPERATOR_ID` | Operator account id (`0.0.x`) | Required |
//! | `HEDERA_OPERATOR_KEY` | Operator private key (DER hex) | Required |
//! | `WALLET_FUNDING_HBAR` | Initial balance for provisioned accounts | `1` |
//! | `MIRROR_BASE_URL` | Mirror node base URL | Derived from network |
//! | `MIRROR_INDEXING_DELAY_SECS` | Wait before the first mirror lookup | `5` |
//! | `MIRROR_BACKOFF_BASE_SECS` | Retry backoff base | `1` |
//! | `MIRROR_MAX_ATTEMPTS` | Lookups per identifier format | `3` |
//! | `MIRROR_TIMESTAMP_PRECISION` | Digits kept in the reduced-precision id | `6` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::ledger::units::TINYBARS_PER_HBAR;

/// Environment variable name for the embedded database directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable selecting the Hedera network.
pub const NETWORK_ENV: &str = "HEDERA_NETWORK";

/// Environment variable for the operator account id.
pub const OPERATOR_ID_ENV: &str = "HEDERA_OPERATOR_ID";

/// Environment variable for the operator private key.
pub const OPERATOR_KEY_ENV: &str = "HEDERA_OPERATOR_KEY";

/// Configuration errors are fatal: the process refuses to start rather than
/// run with credentials or a network selector it cannot trust.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// The Hedera network this deployment settles against.
///
/// Exactly one network per deployment; there is no per-request selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HederaNetwork {
    Testnet,
    Mainnet,
}

impl HederaNetwork {
    /// Network name as understood by the Hedera SDK.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
        }
    }

    /// Public mirror node REST endpoint for this network.
    pub fn default_mirror_url(&self) -> &'static str {
        match self {
            Self::Testnet => "https://testnet.mirrornode.hedera.com",
            Self::Mainnet => "https://mainnet.mirrornode.hedera.com",
        }
    }
}

impl FromStr for HederaNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            other => Err(format!(
                "unknown network `{other}` (expected `testnet` or `mainnet`)"
            )),
        }
    }
}

/// Operator credentials and network selector for the ledger client.
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    pub network: HederaNetwork,
    /// Operator account id in `0.0.x` form. Parsed by the client on connect.
    pub operator_id: String,
    /// Operator private key material. Held in memory only.
    pub operator_key: String,
    /// Initial balance given to newly provisioned accounts, in tinybars.
    pub wallet_funding_tinybars: i64,
}

/// Mirror node endpoint and retry policy knobs.
#[derive(Debug, Clone)]
pub struct MirrorSettings {
    pub base_url: Url,
    /// Average indexing lag waited out before the first lookup.
    pub indexing_delay: Duration,
    /// Backoff base; attempt n waits `base * 2^(n-1)`.
    pub backoff_base: Duration,
    /// Lookups per identifier format before advancing to the next format.
    pub max_attempts: u32,
    /// Digits of the timestamp fraction kept in the reduced-precision format.
    pub timestamp_precision: usize,
}

/// HTTP server bind settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub data_dir: PathBuf,
    pub ledger: LedgerSettings,
    pub mirror: MirrorSettings,
}

impl Settings {
    /// Load all settings from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let network: HederaNetwork = require(NETWORK_ENV)?
            .parse()
            .map_err(|reason| ConfigError::Invalid { name: NETWORK_ENV, reason })?;

        let operator_id = require(OPERATOR_ID_ENV)?;
        let operator_key = require(OPERATOR_KEY_ENV)?;

        let funding_hbar = parse_or("WALLET_FUNDING_HBAR", 1i64)?;
        let wallet_funding_tinybars = funding_hbar
            .checked_mul(TINYBARS_PER_HBAR)
            .ok_or_else(|| ConfigError::Invalid {
                name: "WALLET_FUNDING_HBAR",
                reason: "funding amount overflows tinybars".to_string(),
            })?;

        let base_url = match env::var("MIRROR_BASE_URL") {
            Ok(raw) => raw.parse::<Url>().map_err(|e| ConfigError::Invalid {
                name: "MIRROR_BASE_URL",
                reason: e.to_string(),
            })?,
            Err(_) => network
                .default_mirror_url()
                .parse::<Url>()
                .expect("default mirror URL is valid"),
        };

        let mirror = MirrorSettings {
            base_url,
            indexing_delay: Duration::from_secs(parse_or("MIRROR_INDEXING_DELAY_SECS", 5u64)?),
            backoff_base: Duration::from_secs(parse_or("MIRROR_BACKOFF_BASE_SECS", 1u64)?),
            max_attempts: parse_or("MIRROR_MAX_ATTEMPTS", 3u32)?,
            timestamp_precision: parse_or("MIRROR_TIMESTAMP_PRECISION", 6usize)?,
        };

        Ok(Self {
            server: ServerSettings {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_or("PORT", 8080u16)?,
            },
            data_dir: env::var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/data")),
            ledger: LedgerSettings {
                network,
                operator_id,
                operator_key,
                wallet_funding_tinybars,
            },
            mirror,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_parses_case_insensitively() {
        assert_eq!(
            "testnet".parse::<HederaNetwork>().unwrap(),
            HederaNetwork::Testnet
        );
        assert_eq!(
            "MAINNET".parse::<HederaNetwork>().unwrap(),
            HederaNetwork::Mainnet
        );
        assert!("previewnet".parse::<HederaNetwork>().is_err());
    }

    #[test]
    fn network_maps_to_mirror_url() {
        assert!(HederaNetwork::Testnet
            .default_mirror_url()
            .starts_with("https://testnet."));
        assert!(HederaNetwork::Mainnet
            .default_mirror_url()
            .starts_with("https://mainnet."));
    }
}
