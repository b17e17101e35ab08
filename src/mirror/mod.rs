// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Mirror node verification.
//!
//! Independent confirmation of submitted transfers through the external
//! read-only indexer, tolerating indexing lag and identifier encoding
//! ambiguity. Verification is advisory: it feeds audits and transparency
//! views, never the crediting decision.

pub mod cache;
pub mod client;
pub mod verify;

pub use cache::VerificationCache;
pub use client::{HttpMirrorApi, MirrorApi, MirrorError, MirrorLookup, MirrorTransaction};
pub use verify::{MirrorVerifier, RetryPolicy, VerificationResult};
