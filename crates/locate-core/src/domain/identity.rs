//! Canonical beacon identity tokens.
//!
//! Beacons, anchors (gateways), and relay tags are all identified by a 48-bit
//! BLE MAC address.  Different parts of the deployment spell the same address
//! differently:
//!
//! ```text
//! aa:bb:cc:dd:ee:ff      lower-case from the admin tool
//! AABBCCDDEEFF           compact form from the firmware
//! AA-BB-CC-DD-EE-FF      dash form from spreadsheets
//! ```
//!
//! [`MacAddress`] parses all of them and always prints the canonical
//! `AA:BB:CC:DD:EE:FF` form, so set membership and map keys agree no matter
//! which spelling arrived first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of hex digits in a 48-bit address.
const HEX_DIGITS: usize = 12;

/// Errors produced when a string is not a usable identity token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// A character other than a hex digit or a separator was found.
    #[error("invalid character {ch:?} in identity token {token:?}")]
    InvalidCharacter { token: String, ch: char },

    /// The token did not contain exactly twelve hex digits.
    #[error("identity token {token:?} has {digits} hex digits, expected 12")]
    WrongLength { token: String, digits: usize },
}

/// A normalized 48-bit beacon identity.
///
/// Ordering follows the byte values, which is the same as sorting the
/// canonical strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Builds an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub fn bytes(&self) -> [u8; 6] {
        self.0
    }

    /// Parses any accepted spelling into the canonical token.
    ///
    /// Separators (`:`, `-`, `.`, whitespace) are ignored; case is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidCharacter`] for non-hex characters and
    /// [`IdentityError::WrongLength`] when the digit count is not twelve.
    pub fn parse(token: &str) -> Result<Self, IdentityError> {
        let mut nibbles = Vec::with_capacity(HEX_DIGITS);
        for ch in token.chars() {
            if matches!(ch, ':' | '-' | '.') || ch.is_whitespace() {
                continue;
            }
            let value = ch.to_digit(16).ok_or_else(|| IdentityError::InvalidCharacter {
                token: token.to_string(),
                ch,
            })?;
            nibbles.push(value as u8);
        }

        if nibbles.len() != HEX_DIGITS {
            return Err(IdentityError::WrongLength {
                token: token.to_string(),
                digits: nibbles.len(),
            });
        }

        let mut bytes = [0u8; 6];
        for (i, pair) in nibbles.chunks_exact(2).enumerate() {
            bytes[i] = (pair[0] << 4) | pair[1];
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// The wire always carries the canonical string form.
impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
