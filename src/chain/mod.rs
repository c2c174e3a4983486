//! Chain-side types, configuration, and the hosting environment.
//!
//! - [`ChainId`] - EIP-155 chain id with CAIP-2 serialization
//! - [`CallContext`] - caller, attached value, timestamp and chain of a call
//! - [`Event`] - log entries recorded for committed calls
//! - [`PublicSaleConfig`] / [`WhitelistSaleConfig`] - deployment parameters
//! - [`LocalChain`] - executes calls atomically against [`HostState`]

pub mod types;
pub use types::*;

pub mod config;
pub use config::*;

pub mod provider;
pub use provider::*;
