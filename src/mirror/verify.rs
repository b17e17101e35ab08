// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Independent transfer verification against the mirror node.
//!
//! ## Strategy
//!
//! The mirror node accepts exactly one textual encoding of a transaction id,
//! but identifiers arrive in either separator convention, and some
//! transactions are only reachable through a reduced-precision timestamp. The
//! verifier therefore tries each candidate encoding in order, retrying each
//! one with exponential backoff while the mirror reports "not indexed", and
//! aborting a candidate on any other failure.
//!
//! Exhausting every candidate is not an error: verification is advisory for
//! audit, never a precondition for crediting a donation. The terminal outcome
//! is a result with `valid = false` and an explicit detail string.
//!
//! The retry loop is purely local backoff; cancelling the caller's future
//! cancels it cleanly.

use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

use crate::config::MirrorSettings;
use crate::ledger::tx_id::candidate_formats;
use crate::ledger::units::format_hbar;

use super::client::{MirrorApi, MirrorError, MirrorLookup, MirrorTransaction};

/// Mirror result string that marks a successful transaction.
const MIRROR_SUCCESS: &str = "SUCCESS";

/// Bounded retry policy for mirror lookups.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Fixed delay before the first lookup, covering average indexing lag.
    pub indexing_delay: Duration,
    /// Attempt n (1-based) waits `backoff_base * 2^(n-1)` after a miss.
    pub backoff_base: Duration,
    /// Lookups per identifier format.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            indexing_delay: Duration::from_secs(5),
            backoff_base: Duration::from_secs(1),
            max_attempts: 3,
        }
    }
}

impl From<&MirrorSettings> for RetryPolicy {
    fn from(settings: &MirrorSettings) -> Self {
        Self {
            indexing_delay: settings.indexing_delay,
            backoff_base: settings.backoff_base,
            max_attempts: settings.max_attempts,
        }
    }
}

/// What the mirror node knows about a transfer.
///
/// `valid == false` covers both "indexed but unsuccessful" and "never found";
/// the latter also carries a `detail` marker.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerificationResult {
    /// Whether the mirror indexed the transaction with a success result.
    pub valid: bool,
    /// Total credited amount in HBAR.
    pub amount: String,
    /// Debited account, when indexed.
    pub from_account: Option<String>,
    /// Credited account, when indexed.
    pub to_account: Option<String>,
    /// Consensus timestamp, when indexed.
    pub consensus_timestamp: Option<String>,
    /// The identifier as reported by the mirror, or as queried.
    pub transaction_id: String,
    /// Set when the transaction was never found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl VerificationResult {
    fn from_mirror(tx: MirrorTransaction, queried_id: &str) -> Self {
        let credited: i64 = tx
            .transfers
            .iter()
            .filter(|t| t.amount > 0)
            .map(|t| t.amount)
            .sum();
        let from_account = tx
            .transfers
            .iter()
            .find(|t| t.amount < 0)
            .and_then(|t| t.account.clone());
        let to_account = tx
            .transfers
            .iter()
            .find(|t| t.amount > 0)
            .and_then(|t| t.account.clone());

        Self {
            valid: tx.result.as_deref() == Some(MIRROR_SUCCESS),
            amount: format_hbar(credited),
            from_account,
            to_account,
            consensus_timestamp: tx.consensus_timestamp,
            transaction_id: tx
                .transaction_id
                .unwrap_or_else(|| queried_id.to_string()),
            detail: None,
        }
    }

    fn not_found(queried_id: &str) -> Self {
        Self {
            valid: false,
            amount: "0".to_string(),
            from_account: None,
            to_account: None,
            consensus_timestamp: None,
            transaction_id: queried_id.to_string(),
            detail: Some(
                "transaction not found on the mirror node after exhausting identifier formats"
                    .to_string(),
            ),
        }
    }

    /// True when the mirror never returned the transaction under any format.
    pub fn is_not_found(&self) -> bool {
        self.detail.is_some()
    }
}

/// Verifies submitted transfers against the mirror node.
pub struct MirrorVerifier<A: MirrorApi> {
    api: A,
    policy: RetryPolicy,
    timestamp_precision: usize,
}

impl<A: MirrorApi> MirrorVerifier<A> {
    pub fn new(api: A, policy: RetryPolicy, timestamp_precision: usize) -> Self {
        Self {
            api,
            policy,
            timestamp_precision,
        }
    }

    /// Verify a transaction by identifier. Never fails: every outcome,
    /// including "not found anywhere", is a [`VerificationResult`].
    pub async fn verify(&self, id_text: &str) -> VerificationResult {
        if !self.policy.indexing_delay.is_zero() {
            tokio::time::sleep(self.policy.indexing_delay).await;
        }

        for format in candidate_formats(id_text, self.timestamp_precision) {
            for attempt in 1..=self.policy.max_attempts {
                match self.api.lookup(&format).await {
                    Ok(MirrorLookup::Found(tx)) => {
                        tracing::debug!(
                            format = %format,
                            attempt,
                            "Mirror lookup resolved"
                        );
                        return VerificationResult::from_mirror(tx, id_text);
                    }
                    Ok(MirrorLookup::NotIndexed) => {
                        if attempt < self.policy.max_attempts {
                            let wait = self.policy.backoff_base * 2u32.pow(attempt - 1);
                            tracing::debug!(
                                format = %format,
                                attempt,
                                wait_ms = wait.as_millis() as u64,
                                "Transaction not indexed yet, backing off"
                            );
                            tokio::time::sleep(wait).await;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            format = %format,
                            error = %e,
                            "Mirror lookup failed, advancing to next format"
                        );
                        break;
                    }
                }
            }
        }

        tracing::warn!(
            transaction_id = %id_text,
            "Transaction not found on the mirror node under any identifier format"
        );
        VerificationResult::not_found(id_text)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::mirror::client::MirrorTransfer;

    const GIVEN: &str = "0.0.4886-1693219282.762992295";
    const ALTERNATE: &str = "0.0.4886@1693219282.762992295";
    const REDUCED: &str = "0.0.4886@1693219282.762992";

    enum Script {
        Found(&'static str),
        NotIndexed,
        HttpError(u16),
    }

    struct ScriptedMirror {
        responses: Mutex<HashMap<String, VecDeque<Script>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedMirror {
        fn new(scripts: Vec<(&str, Vec<Script>)>) -> Self {
            let responses = scripts
                .into_iter()
                .map(|(id, steps)| (id.to_string(), steps.into_iter().collect()))
                .collect();
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl MirrorApi for ScriptedMirror {
        async fn lookup(&self, id_text: &str) -> Result<MirrorLookup, MirrorError> {
            self.calls.lock().unwrap().push(id_text.to_string());
            let next = self
                .responses
                .lock()
                .unwrap()
                .get_mut(id_text)
                .and_then(|queue| queue.pop_front());

            match next.unwrap_or(Script::NotIndexed) {
                Script::Found(result) => Ok(MirrorLookup::Found(MirrorTransaction {
                    transaction_id: Some(id_text.to_string()),
                    consensus_timestamp: Some("1693219290.006283002".to_string()),
                    result: Some(result.to_string()),
                    transfers: vec![
                        MirrorTransfer {
                            account: Some("0.0.4886".to_string()),
                            amount: -500_000_000,
                        },
                        MirrorTransfer {
                            account: Some("0.0.5011".to_string()),
                            amount: 500_000_000,
                        },
                    ],
                })),
                Script::NotIndexed => Ok(MirrorLookup::NotIndexed),
                Script::HttpError(code) => Err(MirrorError::Status(code)),
            }
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            indexing_delay: Duration::from_secs(5),
            backoff_base: Duration::from_secs(1),
            max_attempts: 3,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_alternate_separator_format() {
        // The mirror only recognizes the `@` form; the `-` form must fall
        // through to it after its retry budget is spent.
        let mirror = ScriptedMirror::new(vec![(ALTERNATE, vec![Script::Found("SUCCESS")])]);
        let verifier = MirrorVerifier::new(mirror, fast_policy(), 6);

        let result = verifier.verify(GIVEN).await;

        assert!(result.valid);
        assert_eq!(result.amount, "5");
        assert_eq!(result.from_account.as_deref(), Some("0.0.4886"));
        assert_eq!(result.to_account.as_deref(), Some("0.0.5011"));
        assert!(result.detail.is_none());

        let calls = verifier.api.calls();
        assert_eq!(calls[..3], [GIVEN, GIVEN, GIVEN]);
        assert_eq!(calls[3], ALTERNATE);
        assert_eq!(calls.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_terminal_within_retry_budget() {
        let mirror = ScriptedMirror::new(vec![]);
        let verifier = MirrorVerifier::new(mirror, fast_policy(), 6);

        let result = verifier.verify(GIVEN).await;

        assert!(!result.valid);
        assert!(result.is_not_found());
        assert_eq!(result.transaction_id, GIVEN);
        // 3 formats x 3 attempts, nothing more
        assert_eq!(verifier.api.calls().len(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn http_error_aborts_format_without_retry() {
        let mirror = ScriptedMirror::new(vec![
            (GIVEN, vec![Script::HttpError(500)]),
            (ALTERNATE, vec![Script::Found("SUCCESS")]),
        ]);
        let verifier = MirrorVerifier::new(mirror, fast_policy(), 6);

        let result = verifier.verify(GIVEN).await;

        assert!(result.valid);
        // One failed call for the first format, then straight to the next
        assert_eq!(verifier.api.calls(), vec![GIVEN.to_string(), ALTERNATE.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn indexed_failure_is_valid_false_without_not_found_marker() {
        let mirror = ScriptedMirror::new(vec![(GIVEN, vec![Script::Found("INSUFFICIENT_PAYER_BALANCE")])]);
        let verifier = MirrorVerifier::new(mirror, fast_policy(), 6);

        let result = verifier.verify(GIVEN).await;

        assert!(!result.valid);
        assert!(!result.is_not_found());
        assert_eq!(result.consensus_timestamp.as_deref(), Some("1693219290.006283002"));
    }

    #[tokio::test(start_paused = true)]
    async fn reduced_precision_format_is_last_resort() {
        let mirror = ScriptedMirror::new(vec![(REDUCED, vec![Script::Found("SUCCESS")])]);
        let verifier = MirrorVerifier::new(mirror, fast_policy(), 6);

        let result = verifier.verify(GIVEN).await;

        assert!(result.valid);
        let calls = verifier.api.calls();
        // Full budget spent on the first two formats before the reduced one hits
        assert_eq!(calls.len(), 7);
        assert_eq!(calls[6], REDUCED);
    }

    #[test]
    fn default_policy_matches_documented_bounds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.indexing_delay, Duration::from_secs(5));
        assert_eq!(policy.backoff_base, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 3);
    }
}
