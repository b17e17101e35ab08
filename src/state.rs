// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::mirror::{HttpMirrorApi, MirrorVerifier, RetryPolicy, VerificationCache};
use crate::storage::DonationLedger;

/// Number of verification results kept in the in-process cache.
const VERIFY_CACHE_CAPACITY: usize = 256;

/// How long a cached verification result stays fresh.
const VERIFY_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub ledger: Arc<DonationLedger>,
    pub verifier: Arc<MirrorVerifier<HttpMirrorApi>>,
    pub verify_cache: Arc<VerificationCache>,
}

impl AppState {
    pub fn new(settings: Settings, ledger: DonationLedger) -> Self {
        let verifier = MirrorVerifier::new(
            HttpMirrorApi::new(&settings.mirror),
            RetryPolicy::from(&settings.mirror),
            settings.mirror.timestamp_precision,
        );

        Self {
            settings: Arc::new(settings),
            ledger: Arc::new(ledger),
            verifier: Arc::new(verifier),
            verify_cache: Arc::new(VerificationCache::new(
                VERIFY_CACHE_CAPACITY,
                VERIFY_CACHE_TTL,
            )),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::{
        HederaNetwork, LedgerSettings, MirrorSettings, ServerSettings, Settings,
    };

    /// Build an [`AppState`] over a throwaway database for router tests.
    pub(crate) fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DonationLedger::open(&dir.path().join("test.redb")).unwrap();

        let settings = Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            data_dir: dir.path().to_path_buf(),
            ledger: LedgerSettings {
                network: HederaNetwork::Testnet,
                operator_id: "0.0.2".to_string(),
                operator_key: "unused-in-tests".to_string(),
                wallet_funding_tinybars: 100_000_000,
            },
            mirror: MirrorSettings {
                base_url: "https://testnet.mirrornode.hedera.com".parse().unwrap(),
                indexing_delay: Duration::ZERO,
                backoff_base: Duration::ZERO,
                max_attempts: 1,
                timestamp_precision: 6,
            },
        };

        (AppState::new(settings, ledger), dir)
    }
}
