// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Transaction identifier encodings.
//!
//! A Hedera transaction id names the paying account and the transaction's
//! valid-start timestamp. Two textual encodings circulate: the SDK prints
//! `0.0.x@seconds.nanos` while upstream tooling (and our persisted rows) use
//! `0.0.x-seconds.nanos`. The mirror node additionally indexes some
//! transactions under a reduced-precision timestamp, so lookups must be able
//! to produce that form too.
//!
//! The `-` separated form is the canonical encoding and the idempotency key
//! for the donation ledger. Exactly one donation row may reference it.

/// A parsed transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIdentifier {
    payer: String,
    seconds: String,
    nanos: String,
}

impl TransactionIdentifier {
    /// Parse either separator convention.
    ///
    /// Accepts `payer@seconds.nanos` and `payer-seconds.nanos`; the nanos
    /// fraction may be absent. Returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (payer, timestamp) = match text.split_once('@') {
            Some(pair) => pair,
            None => text.split_once('-')?,
        };

        if payer.is_empty() || timestamp.is_empty() {
            return None;
        }

        let (seconds, nanos) = match timestamp.split_once('.') {
            Some((s, n)) => (s, n),
            None => (timestamp, ""),
        };

        if seconds.is_empty() || !seconds.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !nanos.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            payer: payer.to_string(),
            seconds: seconds.to_string(),
            nanos: nanos.to_string(),
        })
    }

    /// Canonical (`-` separated) encoding, used as the idempotency key.
    pub fn canonical(&self) -> String {
        if self.nanos.is_empty() {
            format!("{}-{}", self.payer, self.seconds)
        } else {
            format!("{}-{}.{}", self.payer, self.seconds, self.nanos)
        }
    }

    /// SDK (`@` separated) encoding.
    pub fn wire(&self) -> String {
        if self.nanos.is_empty() {
            format!("{}@{}", self.payer, self.seconds)
        } else {
            format!("{}@{}.{}", self.payer, self.seconds, self.nanos)
        }
    }

    /// Encoding with the timestamp fraction truncated to `digits` digits.
    pub fn reduced(&self, digits: usize) -> String {
        let truncated = &self.nanos[..self.nanos.len().min(digits)];
        if truncated.is_empty() {
            format!("{}@{}", self.payer, self.seconds)
        } else {
            format!("{}@{}.{}", self.payer, self.seconds, truncated)
        }
    }
}

/// Candidate encodings for a mirror node lookup, in the order they should be
/// tried: the identifier as given, the alternate-separator form, then the
/// reduced-precision form.
///
/// An unparseable identifier still yields itself as the only candidate so the
/// caller can report an honest not-found instead of failing early.
pub fn candidate_formats(text: &str, precision: usize) -> Vec<String> {
    let Some(id) = TransactionIdentifier::parse(text) else {
        return vec![text.to_string()];
    };

    let given = text.trim().to_string();
    let mut candidates = vec![given];
    for alternate in [id.canonical(), id.wire(), id.reduced(precision)] {
        if !candidates.contains(&alternate) {
            candidates.push(alternate);
        }
    }
    candidates
}
