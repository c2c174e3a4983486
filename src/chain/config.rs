//! Deployment configuration for a chain and its collections.
//!
//! These structures are deserialized from JSON (camelCase) and handed to
//! [`LocalChain::from_config`](super::LocalChain::from_config),
//! [`PublicSale::deploy`](crate::public_sale::PublicSale::deploy) and
//! [`WhitelistSale::deploy`](crate::whitelist::WhitelistSale::deploy).

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use super::{ChainId, Timestamp};
use crate::metadata::CollectionMetadata;

/// Configuration for a hosting chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// The EIP-155 chain id used for replay protection.
    pub chain_id: ChainId,
}

/// Construction parameters of a fixed-price public sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSaleConfig {
    /// Name, symbol and token URI of the collection.
    #[serde(flatten)]
    pub metadata: CollectionMetadata,
    /// Exact mint price in wei, written as a decimal ether string (`"0.05"`).
    #[serde(with = "ether")]
    pub price: U256,
    /// First second at which minting is allowed.
    pub start_time: Timestamp,
}

/// Construction parameters of a proof-gated whitelist sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistSaleConfig {
    /// Name, symbol and token URI of the collection.
    #[serde(flatten)]
    pub metadata: CollectionMetadata,
    /// Identity whose signatures authenticate eligibility proofs.
    pub issuer: Address,
    /// First second at which minting is allowed.
    pub start_time: Timestamp,
    /// First second at which minting is no longer allowed.
    pub end_time: Timestamp,
}

/// Serde adapter writing wei amounts as decimal ether strings.
pub mod ether {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::chain::{format_ether, parse_ether};

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_ether(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_ether(&s).map_err(serde::de::Error::custom)
    }
}
