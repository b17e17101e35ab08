// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Transfer submission and receipt classification.
//!
//! A donation is a balanced HBAR transfer: debit the donor, credit the project
//! wallet, net zero. The executor signs with the donor's key, submits, and
//! classifies the network's own receipt status as the authoritative
//! settled/rejected decision. It never waits for mirror node visibility —
//! indexing lag is unbounded and belongs to the verification path, not the
//! donation request path.

use hedera::{AccountId, Hbar, PrivateKey, Status, TransferTransaction};

use super::client::HederaGateway;
use super::tx_id::TransactionIdentifier;

/// A transfer to submit. Exists only for the duration of one settlement
/// attempt; the donor key is never persisted.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub donor_account: String,
    pub recipient_account: String,
    /// Amount in tinybars. Must be positive.
    pub amount_tinybars: i64,
    /// DER-encoded donor private key used to sign the debit.
    pub donor_key: String,
}

/// The network's verdict on a submitted transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Receipt status equals the network success code.
    Settled,
    /// Anything else: a non-success receipt status, or a receipt that could
    /// not be fetched after submission.
    Rejected { reason: String },
}

/// Outcome of a submission that produced a transaction identifier.
#[derive(Debug, Clone)]
pub struct SubmittedTransfer {
    pub transaction_id: TransactionIdentifier,
    pub settlement: Settlement,
}

/// Errors raised before the network assigned a transaction identifier.
/// Nothing was submitted; no donation row can reference these.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("invalid donor key: {0}")]
    InvalidKey(String),

    #[error("transfer amount must be positive")]
    InvalidAmount,

    #[error("transfer submission failed: {0}")]
    Submission(String),
}

/// Builds, signs, and submits value transfers.
pub struct TransferExecutor<'a> {
    gateway: &'a HederaGateway,
}

impl<'a> TransferExecutor<'a> {
    pub fn new(gateway: &'a HederaGateway) -> Self {
        Self { gateway }
    }

    /// Submit a transfer and classify its receipt.
    ///
    /// Returns `Ok` whenever the network assigned a transaction identifier,
    /// carrying the settled/rejected classification; the identifier must reach
    /// the donation ledger even when the transfer was rejected. `Err` means no
    /// identifier exists.
    pub async fn submit_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<SubmittedTransfer, SettlementError> {
        if request.amount_tinybars <= 0 {
            return Err(SettlementError::InvalidAmount);
        }

        let donor: AccountId = request
            .donor_account
            .parse()
            .map_err(|e| SettlementError::InvalidAddress(format!("donor: {e}")))?;
        let recipient: AccountId = request
            .recipient_account
            .parse()
            .map_err(|e| SettlementError::InvalidAddress(format!("recipient: {e}")))?;
        let donor_key: PrivateKey = request
            .donor_key
            .parse::<PrivateKey>()
            .map_err(|e| SettlementError::InvalidKey(e.to_string()))?;

        let mut transaction = TransferTransaction::new();
        transaction
            .hbar_transfer(donor, Hbar::from_tinybars(-request.amount_tinybars))
            .hbar_transfer(recipient, Hbar::from_tinybars(request.amount_tinybars))
            .freeze_with(self.gateway.client())
            .map_err(|e| SettlementError::Submission(e.to_string()))?
            .sign(donor_key);

        let response = transaction
            .execute(self.gateway.client())
            .await
            .map_err(|e| SettlementError::Submission(e.to_string()))?;

        let raw_id = response.transaction_id.to_string();
        let transaction_id = TransactionIdentifier::parse(&raw_id).ok_or_else(|| {
            SettlementError::Submission(format!("unparseable transaction id `{raw_id}`"))
        })?;

        // The receipt status is checked against the one success code; a
        // receipt we cannot fetch classifies as rejected so the identifier is
        // never lost between submission and the donation ledger.
        let settlement = match response.get_receipt(self.gateway.client()).await {
            Ok(receipt) if receipt.status == Status::Success => Settlement::Settled,
            Ok(receipt) => Settlement::Rejected {
                reason: format!("receipt status {:?}", receipt.status),
            },
            Err(e) => Settlement::Rejected {
                reason: format!("receipt unavailable: {e}"),
            },
        };

        match &settlement {
            Settlement::Settled => {
                tracing::info!(
                    transaction_id = %transaction_id.canonical(),
                    amount_tinybars = request.amount_tinybars,
                    from = %request.donor_account,
                    to = %request.recipient_account,
                    "Transfer settled"
                );
            }
            Settlement::Rejected { reason } => {
                tracing::warn!(
                    transaction_id = %transaction_id.canonical(),
                    reason = %reason,
                    "Transfer rejected by the network"
                );
            }
        }

        Ok(SubmittedTransfer {
            transaction_id,
            settlement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HederaNetwork, LedgerSettings};

    fn test_gateway() -> HederaGateway {
        let settings = LedgerSettings {
            network: HederaNetwork::Testnet,
            operator_id: "0.0.2".to_string(),
            operator_key: PrivateKey::generate_ecdsa().to_string(),
            wallet_funding_tinybars: 100_000_000,
        };
        HederaGateway::connect(&settings).unwrap()
    }

    fn valid_request() -> TransferRequest {
        TransferRequest {
            donor_account: "0.0.1001".to_string(),
            recipient_account: "0.0.1002".to_string(),
            amount_tinybars: 500_000_000,
            donor_key: PrivateKey::generate_ecdsa().to_string(),
        }
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let gateway = test_gateway();
        let executor = TransferExecutor::new(&gateway);
        let mut request = valid_request();
        request.amount_tinybars = 0;

        let err = executor.submit_transfer(&request).await.unwrap_err();
        assert!(matches!(err, SettlementError::InvalidAmount));
    }

    #[tokio::test]
    async fn rejects_malformed_donor_address() {
        let gateway = test_gateway();
        let executor = TransferExecutor::new(&gateway);
        let mut request = valid_request();
        request.donor_account = "not an account".to_string();

        let err = executor.submit_transfer(&request).await.unwrap_err();
        assert!(matches!(err, SettlementError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn rejects_malformed_donor_key() {
        let gateway = test_gateway();
        let executor = TransferExecutor::new(&gateway);
        let mut request = valid_request();
        request.donor_key = "ffff".to_string();

        let err = executor.submit_transfer(&request).await.unwrap_err();
        assert!(matches!(err, SettlementError::InvalidKey(_)));
    }
}
