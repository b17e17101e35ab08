// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Mirror node REST client.
//!
//! The mirror node is a read-only, eventually-consistent index of ledger
//! history. A transaction that settled seconds ago is routinely absent here,
//! so "not indexed" is modeled as a value ([`MirrorLookup::NotIndexed`]) that
//! the retry loop can inspect, while transport and server failures are errors
//! that abort the current identifier format.

use std::future::Future;

use serde::Deserialize;
use url::Url;

use crate::config::MirrorSettings;

/// One transfer line-item of an indexed transaction. Amounts are signed
/// tinybars: debits negative, credits positive.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorTransfer {
    pub account: Option<String>,
    #[serde(default)]
    pub amount: i64,
}

/// An indexed transaction as returned by `GET /api/v1/transactions/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorTransaction {
    pub transaction_id: Option<String>,
    pub consensus_timestamp: Option<String>,
    pub result: Option<String>,
    #[serde(default)]
    pub transfers: Vec<MirrorTransfer>,
}

#[derive(Debug, Deserialize)]
struct MirrorTransactionList {
    #[serde(default)]
    transactions: Vec<MirrorTransaction>,
}

/// Outcome of a single mirror lookup.
#[derive(Debug, Clone)]
pub enum MirrorLookup {
    /// The transaction is indexed under the queried identifier.
    Found(MirrorTransaction),
    /// Not visible yet. Retryable: the indexer may simply be lagging.
    NotIndexed,
}

/// Terminal lookup failures. These abort the current identifier format
/// instead of being retried.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("mirror node returned HTTP {0}")]
    Status(u16),

    #[error("mirror node transport error: {0}")]
    Transport(String),

    #[error("mirror node response decode error: {0}")]
    Decode(String),
}

/// Capability consumed by the verifier: look a transaction up by one textual
/// identifier encoding.
pub trait MirrorApi: Send + Sync {
    fn lookup(
        &self,
        id_text: &str,
    ) -> impl Future<Output = Result<MirrorLookup, MirrorError>> + Send;
}

/// Production [`MirrorApi`] over the mirror node REST API.
pub struct HttpMirrorApi {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpMirrorApi {
    pub fn new(settings: &MirrorSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: settings.base_url.clone(),
        }
    }

    fn transaction_url(&self, id_text: &str) -> String {
        format!(
            "{}/api/v1/transactions/{}",
            self.base_url.as_str().trim_end_matches('/'),
            id_text
        )
    }
}

impl MirrorApi for HttpMirrorApi {
    async fn lookup(&self, id_text: &str) -> Result<MirrorLookup, MirrorError> {
        let url = self.transaction_url(id_text);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| MirrorError::Transport(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let body: MirrorTransactionList = response
                    .json()
                    .await
                    .map_err(|e| MirrorError::Decode(e.to_string()))?;
                // A 200 with an empty list still means "not visible yet"
                match body.transactions.into_iter().next() {
                    Some(tx) => Ok(MirrorLookup::Found(tx)),
                    None => Ok(MirrorLookup::NotIndexed),
                }
            }
            reqwest::StatusCode::NOT_FOUND => Ok(MirrorLookup::NotIndexed),
            status => Err(MirrorError::Status(status.as_u16())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_url_handles_trailing_slash() {
        let mut settings = MirrorSettings {
            base_url: "https://testnet.mirrornode.hedera.com".parse().unwrap(),
            indexing_delay: std::time::Duration::ZERO,
            backoff_base: std::time::Duration::ZERO,
            max_attempts: 3,
            timestamp_precision: 6,
        };

        let api = HttpMirrorApi::new(&settings);
        assert_eq!(
            api.transaction_url("0.0.7-1.2"),
            "https://testnet.mirrornode.hedera.com/api/v1/transactions/0.0.7-1.2"
        );

        settings.base_url = "https://testnet.mirrornode.hedera.com/".parse().unwrap();
        let api = HttpMirrorApi::new(&settings);
        assert_eq!(
            api.transaction_url("0.0.7-1.2"),
            "https://testnet.mirrornode.hedera.com/api/v1/transactions/0.0.7-1.2"
        );
    }

    #[test]
    fn transaction_list_decodes_mirror_payload() {
        let payload = r#"{
            "transactions": [{
                "transaction_id": "0.0.4886-1693219282-762992295",
                "consensus_timestamp": "1693219290.006283002",
                "result": "SUCCESS",
                "transfers": [
                    {"account": "0.0.4886", "amount": -500000000},
                    {"account": "0.0.5011", "amount": 500000000}
                ]
            }]
        }"#;

        let list: MirrorTransactionList = serde_json::from_str(payload).unwrap();
        assert_eq!(list.transactions.len(), 1);
        let tx = &list.transactions[0];
        assert_eq!(tx.result.as_deref(), Some("SUCCESS"));
        assert_eq!(tx.transfers.len(), 2);
        assert_eq!(tx.transfers[0].amount, -500_000_000);
    }

    #[test]
    fn transaction_list_tolerates_missing_fields() {
        let list: MirrorTransactionList = serde_json::from_str("{}").unwrap();
        assert!(list.transactions.is_empty());

        let sparse: MirrorTransactionList =
            serde_json::from_str(r#"{"transactions": [{}]}"#).unwrap();
        assert!(sparse.transactions[0].result.is_none());
        assert!(sparse.transactions[0].transfers.is_empty());
    }
}
