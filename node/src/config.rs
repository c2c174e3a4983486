//! Environment configuration of the node.

use alloy_primitives::{Address, U256, address};
use pass_mint::chain::{AmountParseError, ChainId, ChainIdParseError, Timestamp, parse_ether};
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

/// Hardhat's first default account.
const DEFAULT_OWNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
/// Issuer of the development whitelist proofs.
const DEFAULT_ISSUER: Address = address!("4f8e1b8a9c0b481f9153ee8b5d0f010846e5f4ac");
/// Addresses the two sales would get as the first deployments of the owner.
pub const PUBLIC_SALE_ADDRESS: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
pub const WHITELIST_SALE_ADDRESS: Address = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");

const WHITELIST_DEFAULT_DURATION: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {var}: {source}")]
    ChainId {
        var: &'static str,
        source: ChainIdParseError,
    },
    #[error("Invalid {var}: {source}")]
    Amount {
        var: &'static str,
        source: AmountParseError,
    },
    #[error("Invalid {var}: {value:?} is not an address")]
    Address { var: &'static str, value: String },
    #[error("Invalid {var}: {value:?} is not a unix timestamp")]
    Timestamp { var: &'static str, value: String },
}

/// Everything the node reads from its environment.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub chain_id: ChainId,
    pub owner: Address,
    pub issuer: Address,
    pub price: U256,
    pub public_start: Timestamp,
    pub whitelist_start: Timestamp,
    pub whitelist_end: Timestamp,
    /// Amount credited by `POST /dev/fund`. Zero disables the route.
    pub dev_prefund: U256,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // BIND_ADDR takes precedence; fall back to HOST:PORT
        let bind_address = env::var("BIND_ADDR").unwrap_or_else(|_| {
            let port: u16 = env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4020);
            let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
            format!("{host}:{port}")
        });

        let chain_id = match env::var("CHAIN_ID") {
            Ok(v) => v.parse().map_err(|source| ConfigError::ChainId {
                var: "CHAIN_ID",
                source,
            })?,
            Err(_) => ChainId::new(31337),
        };

        let now = unix_now();
        let whitelist_start = timestamp_var("WHITELIST_START", now)?;

        Ok(Self {
            bind_address,
            chain_id,
            owner: address_var("OWNER_ADDRESS", DEFAULT_OWNER)?,
            issuer: address_var("ISSUER_ADDRESS", DEFAULT_ISSUER)?,
            price: ether_var("PRICE", "0.05")?,
            public_start: timestamp_var("PUBLIC_START", now)?,
            whitelist_start,
            whitelist_end: timestamp_var(
                "WHITELIST_END",
                whitelist_start.saturating_add(WHITELIST_DEFAULT_DURATION),
            )?,
            dev_prefund: ether_var("DEV_PREFUND", "0")?,
        })
    }
}

fn unix_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn address_var(var: &'static str, default: Address) -> Result<Address, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Address { var, value }),
        Err(_) => Ok(default),
    }
}

fn timestamp_var(var: &'static str, default: Timestamp) -> Result<Timestamp, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Timestamp { var, value }),
        Err(_) => Ok(default),
    }
}

fn ether_var(var: &'static str, default: &str) -> Result<U256, ConfigError> {
    let value = env::var(var).unwrap_or_else(|_| default.to_string());
    parse_ether(value.trim()).map_err(|source| ConfigError::Amount { var, source })
}
