// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Account provisioning.
//!
//! Creates a fresh Hedera account for a donor or a project wallet: generate an
//! ECDSA keypair, submit an operator-funded `AccountCreateTransaction`, and
//! read the assigned account id out of the receipt. The private key exists
//! only in the returned value; encrypted custody of it belongs to the caller.

use hedera::{AccountCreateTransaction, Hbar, PrivateKey};

use super::client::{ClientError, HederaGateway};

/// A freshly created ledger account.
///
/// `private_key` is the only copy of the secret. It is handed to the caller
/// exactly once and never persisted here.
#[derive(Debug, Clone)]
pub struct ProvisionedAccount {
    /// Ledger-assigned account id (`0.0.x`). Immutable once created.
    pub address: String,
    /// DER-encoded private key for the new account.
    pub private_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The network accepted the transaction but the receipt carried no
    /// account id. Non-retryable: retrying would create a second account.
    #[error("account creation receipt carried no account id (status: {status})")]
    MissingAccountId { status: String },

    #[error("account creation failed: {0}")]
    Submission(String),
}

impl ProvisioningError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Client(e) => e.is_retryable(),
            Self::MissingAccountId { .. } => false,
            Self::Submission(_) => true,
        }
    }
}

/// Creates on-chain accounts funded from the operator account.
pub struct WalletProvisioner<'a> {
    gateway: &'a HederaGateway,
}

impl<'a> WalletProvisioner<'a> {
    pub fn new(gateway: &'a HederaGateway) -> Self {
        Self { gateway }
    }

    /// Create a new account with the given initial balance.
    ///
    /// The side effect is irreversible: a successful call has created an
    /// on-chain account regardless of what happens to the returned value.
    pub async fn create_account(
        &self,
        initial_tinybars: i64,
        memo: &str,
    ) -> Result<ProvisionedAccount, ProvisioningError> {
        let key = PrivateKey::generate_ecdsa();

        let receipt = AccountCreateTransaction::new()
            .key(key.public_key())
            .initial_balance(Hbar::from_tinybars(initial_tinybars))
            .account_memo(memo)
            .execute(self.gateway.client())
            .await
            .map_err(|e| ProvisioningError::Submission(e.to_string()))?
            .get_receipt(self.gateway.client())
            .await
            .map_err(|e| ProvisioningError::Submission(e.to_string()))?;

        let account_id = receipt
            .account_id
            .ok_or_else(|| ProvisioningError::MissingAccountId {
                status: format!("{:?}", receipt.status),
            })?;

        let address = account_id.to_string();
        tracing::info!(address = %address, "Provisioned new ledger account");

        Ok(ProvisionedAccount {
            address,
            private_key: key.to_string(),
        })
    }
}
