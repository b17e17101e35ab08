// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Hedera ledger integration.
//!
//! This module provides:
//! - Client construction from explicit operator configuration
//! - Account provisioning for donor and project wallets
//! - Signed HBAR transfer submission and receipt classification
//! - Transaction identifier encodings and tinybar arithmetic

pub mod client;
pub mod transfer;
pub mod tx_id;
pub mod units;
pub mod wallet;

pub use client::{ClientError, HederaGateway};
pub use transfer::{Settlement, SettlementError, SubmittedTransfer, TransferExecutor, TransferRequest};
pub use tx_id::{candidate_formats, TransactionIdentifier};
pub use units::{format_hbar, parse_hbar};
pub use wallet::{ProvisionedAccount, ProvisioningError, WalletProvisioner};
