//! Wire and host types shared by every collection.
//!
//! This module provides the values that cross the boundary between a
//! collection contract and the chain hosting it: chain identifiers, call
//! context, events, and ether amount parsing.

use alloy_primitives::utils::{ParseUnits, Unit};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The CAIP-2 namespace for EVM chains.
pub const EIP155_NAMESPACE: &str = "eip155";

/// Number of decimal places of the native currency (wei per ether = 10^18).
pub const ETHER_DECIMALS: u8 = 18;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Sequential token identifier. The first issued pass has id `1`.
pub type TokenId = u64;

// ============================================================================
// ChainId
// ============================================================================

/// An EIP-155 chain identifier.
///
/// Displays and serializes in CAIP-2 form (`eip155:31337`). Parsing accepts
/// either the CAIP-2 form or the bare integer.
///
/// # Example
///
/// ```
/// use pass_mint::chain::ChainId;
///
/// let id: ChainId = "eip155:31337".parse().unwrap();
/// assert_eq!(id.as_u64(), 31337);
/// assert_eq!(id, "31337".parse().unwrap());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ChainId(u64);

impl ChainId {
    /// Creates a chain id from its EIP-155 integer.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the EIP-155 integer.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the id widened to the 256-bit form used in signed proofs.
    pub fn as_u256(&self) -> U256 {
        U256::from(self.0)
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ChainId> for u64 {
    fn from(value: ChainId) -> Self {
        value.0
    }
}

impl FromStr for ChainId {
    type Err = ChainIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reference = match s.split_once(':') {
            Some((namespace, reference)) => {
                if namespace != EIP155_NAMESPACE {
                    return Err(ChainIdParseError::InvalidNamespace(namespace.to_string()));
                }
                reference
            }
            None => s,
        };
        reference
            .parse::<u64>()
            .map(ChainId)
            .map_err(|_| ChainIdParseError::InvalidReference(reference.to_string()))
    }
}

impl Display for ChainId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{EIP155_NAMESPACE}:{}", self.0)
    }
}

impl Serialize for ChainId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error returned when parsing a [`ChainId`].
#[derive(Debug, thiserror::Error)]
pub enum ChainIdParseError {
    /// The CAIP-2 namespace is not `eip155`.
    #[error("Invalid namespace {0}, expected eip155")]
    InvalidNamespace(String),
    /// The reference is not a decimal integer.
    #[error("Invalid chain reference {0}, expected a decimal integer")]
    InvalidReference(String),
}

// ============================================================================
// CallContext and Event
// ============================================================================

/// Everything the hosting chain tells a contract about the current call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// The authenticated identity initiating the call.
    pub caller: Address,
    /// Native value (wei) attached to the call.
    pub value: U256,
    /// Block timestamp at call time.
    pub timestamp: Timestamp,
    /// EIP-155 id of the executing chain.
    pub chain_id: u64,
}

impl CallContext {
    /// A context with no attached value.
    pub fn new(caller: Address, timestamp: Timestamp, chain_id: u64) -> Self {
        Self {
            caller,
            value: U256::ZERO,
            timestamp,
            chain_id,
        }
    }

    /// Returns a copy of this context carrying `value`.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// A log entry recorded by the host for a committed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    /// A pass was issued.
    Minted {
        collection: Address,
        to: Address,
        token_id: TokenId,
    },
    /// The accumulated sale balance was paid out.
    Withdrawn {
        collection: Address,
        to: Address,
        amount: U256,
    },
    /// The mint window bounds changed.
    WindowUpdated {
        collection: Address,
        start: Timestamp,
        end: Option<Timestamp>,
    },
    /// Administrative control moved to a new identity.
    OwnershipTransferred {
        collection: Address,
        previous: Address,
        new: Address,
    },
}

// ============================================================================
// Amounts
// ============================================================================

/// Parses a human-readable ether amount (e.g. `"0.05"`) into wei.
pub fn parse_ether(v: &str) -> Result<U256, AmountParseError> {
    parse_units(v, ETHER_DECIMALS)
}

/// Parses a decimal amount string into base units.
///
/// Accepts formats like `"10.50"`, `"1000"`, etc. The amount is scaled by
/// `decimals` places.
///
/// # Errors
///
/// Returns an error if the input is not a plain decimal number, carries more
/// fractional digits than `decimals`, or overflows 256 bits.
pub fn parse_units(v: &str, decimals: u8) -> Result<U256, AmountParseError> {
    let (whole, frac) = v.split_once('.').unwrap_or((v, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !is_digits(whole) || !is_digits(frac) {
        return Err(AmountParseError::InvalidFormat(v.to_string()));
    }
    // alloy truncates excess fractional digits; an amount must be exact here.
    if frac.len() > usize::from(decimals) {
        return Err(AmountParseError::TooManyDecimals {
            got: frac.len() as u32,
            max: decimals,
        });
    }

    let unit = Unit::new(decimals).ok_or(AmountParseError::InvalidUnit(decimals))?;
    ParseUnits::parse_units(v, unit)
        .map(<U256 as From<ParseUnits>>::from)
        .map_err(|_| AmountParseError::Overflow)
}

/// Formats wei as a decimal ether string without trailing zeros.
pub fn format_ether(v: U256) -> String {
    format_units(v, ETHER_DECIMALS)
}

/// Formats base units as a decimal string scaled by `decimals` places.
pub fn format_units(v: U256, decimals: u8) -> String {
    let Some(unit) = Unit::new(decimals) else {
        return v.to_string();
    };
    ParseUnits::U256(v)
        .format_units(unit)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Error returned when parsing an amount.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AmountParseError {
    /// The input string is not a valid number.
    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),
    /// Too many decimal places for the unit.
    #[error("Too many decimal places: got {got}, max {max}")]
    TooManyDecimals { got: u32, max: u8 },
    /// No 256-bit amount can carry that many decimal places.
    #[error("Unsupported number of decimals: {0}")]
    InvalidUnit(u8),
    /// The resulting amount overflows 256 bits.
    #[error("Amount overflow")]
    Overflow,
}

// ============================================================================
// Tests
// ============================================================================
