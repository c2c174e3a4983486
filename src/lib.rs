//! One-per-identity pass minting for EVM-style chains.
//!
//! This crate implements the mint authorization logic of two pass
//! collections: a fixed-price public sale and a free whitelist sale gated by
//! issuer-signed eligibility proofs. Both share the same core: a time window,
//! a one-shot per-identity ledger, and a single administrative owner.
//!
//! # Architecture
//!
//! Collections are plain state machines. Everything they need from the chain
//! (value transfers, token issuance, event logs) is reached through the
//! traits in [`chain`], and [`chain::LocalChain`] provides an in-memory host
//! that runs each call atomically:
//!
//! 1. **Caller** submits a call with an attached value
//! 2. **Host** moves the value to the collection and runs the call
//! 3. **Collection** checks window, then payment or proof, then the ledger
//! 4. **Host** commits state and events on success, discards both on failure
//!
//! # Feature Flags
//!
//! - `tracing` - Emit `tracing` events for mints, withdrawals and admin calls
//!
//! # Usage
//!
//! ## Whitelist: Issuing and Redeeming a Proof
//!
//! ```
//! use alloy_primitives::{Address, U256};
//! use pass_mint::KnownNetwork;
//! use pass_mint::chain::{ChainId, LocalChain, ManualClock, WhitelistSaleConfig};
//! use pass_mint::whitelist::{ProofIssuer, WhitelistSale};
//! use std::sync::Arc;
//!
//! let clock = ManualClock::new(100);
//! let mut chain = LocalChain::with_clock(ChainId::hardhat(), Arc::new(clock));
//! let issuer = ProofIssuer::from_bytes(&[7u8; 32]).unwrap();
//! let config = WhitelistSaleConfig::genesis_pass(issuer.address(), 100, 200);
//! let mut sale = WhitelistSale::deploy(Address::repeat_byte(0xbb), Address::repeat_byte(1), &config);
//!
//! let alice = Address::repeat_byte(0xa1);
//! let proof = issuer.sign(alice, U256::from(31337u64), U256::ZERO).unwrap();
//! let receipt = chain
//!     .call(&mut sale, alice, U256::ZERO, |sale, ctx, host| sale.mint(ctx, &proof, host))
//!     .unwrap();
//! assert_eq!(receipt.token_id, 1);
//! ```

pub mod chain;
pub mod metadata;
pub mod mint;
pub mod public_sale;
pub mod whitelist;

mod networks;
pub use networks::*;

pub use mint::{MintError, MintReceipt};
pub use public_sale::PublicSale;
pub use whitelist::WhitelistSale;
