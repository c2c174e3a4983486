//! Well-known chains and the stock pass collections.
//!
//! This module provides convenient constructors for the chains the passes are
//! deployed on and for the two collections' deployment parameters.

use alloy_primitives::{Address, U256};

use crate::chain::{ChainConfig, ChainId, PublicSaleConfig, Timestamp, WhitelistSaleConfig};
use crate::metadata::CollectionMetadata;

/// Trait providing convenient methods for well-known EVM networks.
///
/// This trait can be implemented for any type to provide static methods that
/// create instances for well-known chains.
///
/// # Example
///
/// ```
/// use pass_mint::KnownNetwork;
/// use pass_mint::chain::ChainId;
///
/// let local: ChainId = ChainId::hardhat();
/// assert_eq!(local.to_string(), "eip155:31337");
/// ```
pub trait KnownNetwork<A> {
    /// Returns the instance for Ethereum mainnet (eip155:1).
    fn ethereum_mainnet() -> A;
    /// Returns the instance for Sepolia (eip155:11155111).
    fn sepolia() -> A;
    /// Returns the instance for a local Hardhat node (eip155:31337).
    fn hardhat() -> A;
}

impl KnownNetwork<ChainId> for ChainId {
    fn ethereum_mainnet() -> ChainId {
        ChainId::new(1)
    }

    fn sepolia() -> ChainId {
        ChainId::new(11_155_111)
    }

    fn hardhat() -> ChainId {
        ChainId::new(31_337)
    }
}

impl KnownNetwork<ChainConfig> for ChainConfig {
    fn ethereum_mainnet() -> ChainConfig {
        ChainConfig {
            chain_id: ChainId::ethereum_mainnet(),
        }
    }

    fn sepolia() -> ChainConfig {
        ChainConfig {
            chain_id: ChainId::sepolia(),
        }
    }

    fn hardhat() -> ChainConfig {
        ChainConfig {
            chain_id: ChainId::hardhat(),
        }
    }
}

const PASS_METADATA_ROOT: &str = "ipfs://QmUtg6fpxGt2WHRndXe3ZbbbnqasGhQKrh8CreksUQ3uX1";

/// 0.05 ether, in wei.
const APY_PASS_PRICE_WEI: u64 = 50_000_000_000_000_000;

impl PublicSaleConfig {
    /// The "Weave6 APY Pass" (`WAP`) sale, priced at 0.05 ether.
    pub fn apy_pass(start_time: Timestamp) -> Self {
        Self {
            metadata: CollectionMetadata::new(
                "Weave6 APY Pass",
                "WAP",
                format!("{PASS_METADATA_ROOT}/apypass.json"),
            ),
            price: U256::from(APY_PASS_PRICE_WEI),
            start_time,
        }
    }
}

impl WhitelistSaleConfig {
    /// The "Weave6 Genesis Pass" (`WGP`) sale, free for holders of an
    /// `issuer`-signed proof between `start_time` and `end_time`.
    pub fn genesis_pass(issuer: Address, start_time: Timestamp, end_time: Timestamp) -> Self {
        Self {
            metadata: CollectionMetadata::new(
                "Weave6 Genesis Pass",
                "WGP",
                format!("{PASS_METADATA_ROOT}/genesispass.json"),
            ),
            issuer,
            start_time,
            end_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::parse_ether;

    #[test]
    fn test_known_chain_ids() {
        assert_eq!(ChainId::ethereum_mainnet().as_u64(), 1);
        assert_eq!(ChainId::sepolia().as_u64(), 11_155_111);
        assert_eq!(ChainConfig::hardhat().chain_id, ChainId::new(31337));
    }

    #[test]
    fn test_apy_pass_price() {
        let config = PublicSaleConfig::apy_pass(0);
        assert_eq!(config.price, parse_ether("0.05").unwrap());
        assert_eq!(config.metadata.symbol, "WAP");
    }

    #[test]
    fn test_genesis_pass_preset() {
        let issuer = Address::repeat_byte(7);
        let config = WhitelistSaleConfig::genesis_pass(issuer, 10, 20);
        assert_eq!(config.metadata.name, "Weave6 Genesis Pass");
        assert_eq!(config.issuer, issuer);
        assert_eq!((config.start_time, config.end_time), (10, 20));
    }
}
