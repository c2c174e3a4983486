//! Issued count and the one-shot per-identity minted flag.

use alloy_primitives::Address;
use std::collections::HashSet;

use super::{MintError, MintResult};
use crate::chain::TokenId;

/// Persistent record of what a collection has issued.
///
/// An identity, once marked, stays marked. `total_issued` only grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MintLedger {
    total_issued: u64,
    minted: HashSet<Address>,
}

impl MintLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_issued(&self) -> u64 {
        self.total_issued
    }

    pub fn has_minted(&self, who: &Address) -> bool {
        self.minted.contains(who)
    }

    /// The id the next successful mint will receive.
    pub fn next_token_id(&self) -> TokenId {
        self.total_issued + 1
    }

    pub fn ensure_unminted(&self, who: Address) -> MintResult<()> {
        if self.has_minted(&who) {
            return Err(MintError::AlreadyIssued(who));
        }
        Ok(())
    }

    /// Marks `who` as minted and returns the new token id.
    pub(crate) fn record(&mut self, who: Address) -> MintResult<TokenId> {
        if !self.minted.insert(who) {
            return Err(MintError::AlreadyIssued(who));
        }
        self.total_issued += 1;
        Ok(self.total_issued)
    }
}
