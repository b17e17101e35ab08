// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Hedera network client construction.
//!
//! A [`HederaGateway`] is built per call from explicit [`LedgerSettings`];
//! there is no process-global client. Construction is purely local (credential
//! parsing and network selection) and performs no I/O, so a configuration
//! error always surfaces before anything touches the network.

use hedera::{AccountId, Client, PrivateKey};

use crate::config::LedgerSettings;

/// Errors raised while constructing a gateway.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Bad operator credentials or network selector. Fatal, never retried.
    #[error("ledger configuration error: {0}")]
    Configuration(String),

    /// Transient transport failure. The caller may retry.
    #[error("ledger network error: {0}")]
    Network(String),
}

impl ClientError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Connected Hedera client with the operator set as payer for operator-funded
/// transactions.
#[derive(Debug)]
pub struct HederaGateway {
    client: Client,
    settings: LedgerSettings,
}

impl HederaGateway {
    /// Build a gateway from explicit settings.
    pub fn connect(settings: &LedgerSettings) -> Result<Self, ClientError> {
        let operator_id: AccountId = settings
            .operator_id
            .parse()
            .map_err(|e| ClientError::Configuration(format!("invalid operator account id: {e}")))?;

        let operator_key: PrivateKey = settings
            .operator_key
            .parse()
            .map_err(|e| ClientError::Configuration(format!("invalid operator key: {e}")))?;

        let client = Client::for_name(settings.network.name())
            .map_err(|e| ClientError::Configuration(format!("network selection failed: {e}")))?;
        client.set_operator(operator_id, operator_key);

        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HederaNetwork;

    fn settings_with(operator_id: &str, operator_key: &str) -> LedgerSettings {
        LedgerSettings {
            network: HederaNetwork::Testnet,
            operator_id: operator_id.to_string(),
            operator_key: operator_key.to_string(),
            wallet_funding_tinybars: 100_000_000,
        }
    }

    #[test]
    fn connect_rejects_malformed_operator_id() {
        let key = PrivateKey::generate_ecdsa().to_string();
        let err = HederaGateway::connect(&settings_with("not-an-account", &key)).unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn connect_rejects_malformed_operator_key() {
        let err = HederaGateway::connect(&settings_with("0.0.2", "deadbeef")).unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[tokio::test]
    async fn connect_accepts_valid_credentials() {
        let key = PrivateKey::generate_ecdsa().to_string();
        let gateway = HederaGateway::connect(&settings_with("0.0.2", &key)).unwrap();
        assert_eq!(gateway.settings().operator_id, "0.0.2");
    }
}
