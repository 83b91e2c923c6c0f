// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Minimum number of hex digits used when rendering an address.
pub const ADDRESS_WIDTH: usize = 8;

/// Marker that introduces a hexadecimal literal in rendered text.
pub const HEX_MARKER: &str = "0x";

/// A virtual address inside the binary under analysis.
///
/// The "unset" sentinel of the analysis engine is modelled as `Option<Address>::None`, so every
/// `Address` value is a real, comparable location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(u64);

impl Address {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub fn checked_add(self, delta: u64) -> Option<Self> {
        self.0.checked_add(delta).map(Self)
    }

    /// Byte distance from `base` to `self`, if `self` is not below `base`.
    pub fn offset_from(self, base: Address) -> Option<u64> {
        self.0.checked_sub(base.0)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Renders `0x` followed by at least [`ADDRESS_WIDTH`] lowercase hex digits.
///
/// This is the only place addresses are normalized for display; every panel and the fixture
/// engine go through it, so text produced here always parses back to the same value.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{HEX_MARKER}{:0width$x}", self.0, width = ADDRESS_WIDTH)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAddressError {
    #[error("address must not be empty")]
    Empty,
    #[error("address {0:?} has no hex digits")]
    MissingDigits(String),
    #[error("address {0:?} contains a non-hex character")]
    InvalidDigit(String),
    #[error("address {0:?} does not fit in 64 bits")]
    Overflow(String),
}

impl FromStr for Address {
    type Err = ParseAddressError;

    /// Accepts `0x1234`, `0X1234` and bare `1234` (always base 16).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseAddressError::Empty);
        }

        let digits = trimmed
            .strip_prefix(HEX_MARKER)
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(ParseAddressError::MissingDigits(trimmed.to_owned()));
        }
        if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(ParseAddressError::InvalidDigit(trimmed.to_owned()));
        }

        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ParseAddressError::Overflow(trimmed.to_owned()))
    }
}

/// Re-renders user or engine supplied address text in the canonical padded form.
pub fn normalize_address_text(raw: &str) -> Result<String, ParseAddressError> {
    raw.parse::<Address>().map(|address| address.to_string())
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(Self(value)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_address_text, Address, ParseAddressError};

    #[test]
    fn display_pads_to_eight_digits() {
        assert_eq!(Address::new(0x1000).to_string(), "0x00001000");
        assert_eq!(Address::new(0).to_string(), "0x00000000");
    }

    #[test]
    fn display_keeps_wide_addresses_intact() {
        assert_eq!(Address::new(0x1_4000_1000).to_string(), "0x140001000");
    }

    #[test]
    fn parses_prefixed_and_bare_hex() {
        assert_eq!("0x1f".parse::<Address>(), Ok(Address::new(0x1f)));
        assert_eq!("0X1F".parse::<Address>(), Ok(Address::new(0x1f)));
        assert_eq!(" 1f ".parse::<Address>(), Ok(Address::new(0x1f)));
    }

    #[test]
    fn rejects_malformed_text() {
        assert_eq!("".parse::<Address>(), Err(ParseAddressError::Empty));
        assert!(matches!("0x".parse::<Address>(), Err(ParseAddressError::MissingDigits(_))));
        assert!(matches!("0xzz".parse::<Address>(), Err(ParseAddressError::InvalidDigit(_))));
        assert!(matches!(
            "0x1ffffffffffffffff".parse::<Address>(),
            Err(ParseAddressError::Overflow(_))
        ));
    }

    #[test]
    fn normalization_is_shared_by_short_and_long_inputs() {
        assert_eq!(normalize_address_text("0x40").as_deref(), Ok("0x00000040"));
        assert_eq!(normalize_address_text("0x0000000000401000").as_deref(), Ok("0x00401000"));
    }

    #[test]
    fn serde_accepts_numbers_and_hex_strings() {
        let from_text: Address = serde_json::from_str("\"0x2000\"").expect("text");
        let from_number: Address = serde_json::from_str("8192").expect("number");
        assert_eq!(from_text, from_number);
        assert_eq!(serde_json::to_string(&from_text).expect("json"), "\"0x00002000\"");
    }
}
