// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! HBAR amount handling.
//!
//! All arithmetic inside the service is done on tinybars (`i64`), the smallest
//! indivisible unit of the currency. Decimal HBAR strings only exist at the
//! API boundary. 1 HBAR = 10^8 tinybars.

/// Number of decimal places in an HBAR amount.
pub const HBAR_DECIMALS: u32 = 8;

/// Tinybars per whole HBAR (10^8).
pub const TINYBARS_PER_HBAR: i64 = 100_000_000;

/// Errors produced when parsing a decimal HBAR amount.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid amount format")]
    Malformed,

    #[error("too many decimal places (max {HBAR_DECIMALS})")]
    TooPrecise,

    #[error("amount must be positive")]
    NotPositive,

    #[error("amount overflows the tinybar range")]
    Overflow,
}

/// Parse a human-readable HBAR amount (e.g. `"1.5"`) into tinybars.
///
/// Rejects zero and negative amounts: a donation always moves value.
pub fn parse_hbar(amount: &str) -> Result<i64, AmountError> {
    let amount = amount.trim();
    let parts: Vec<&str> = amount.split('.').collect();

    if parts.len() > 2 || parts[0].is_empty() {
        return Err(AmountError::Malformed);
    }

    let whole = parts[0].parse::<u64>().map_err(|_| AmountError::Malformed)?;

    let fraction = if parts.len() == 2 {
        let dec_str = parts[1];
        if dec_str.is_empty() || !dec_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Malformed);
        }
        if dec_str.len() > HBAR_DECIMALS as usize {
            return Err(AmountError::TooPrecise);
        }
        // Pad with zeros to the full tinybar width
        let padded = format!("{dec_str:0<width$}", width = HBAR_DECIMALS as usize);
        padded.parse::<u64>().map_err(|_| AmountError::Malformed)?
    } else {
        0
    };

    let total = whole
        .checked_mul(TINYBARS_PER_HBAR as u64)
        .and_then(|w| w.checked_add(fraction))
        .ok_or(AmountError::Overflow)?;

    if total == 0 {
        return Err(AmountError::NotPositive);
    }

    i64::try_from(total).map_err(|_| AmountError::Overflow)
}

/// Format tinybars as a human-readable HBAR amount with trailing zeros trimmed.
pub fn format_hbar(tinybars: i64) -> String {
    if tinybars == 0 {
        return "0".to_string();
    }

    let sign = if tinybars < 0 { "-" } else { "" };
    let magnitude = tinybars.unsigned_abs();
    let whole = magnitude / TINYBARS_PER_HBAR as u64;
    let remainder = magnitude % TINYBARS_PER_HBAR as u64;

    if remainder == 0 {
        format!("{sign}{whole}")
    } else {
        let decimal_str = format!("{remainder:0>width$}", width = HBAR_DECIMALS as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        format!("{sign}{whole}.{trimmed}")
    }
}
