//! Single-identity administrative capability.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use super::{MintError, MintResult};

/// The identity allowed to perform administrative actions on a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(Address);

impl Owner {
    pub fn new(address: Address) -> Self {
        Self(address)
    }

    pub fn address(&self) -> Address {
        self.0
    }

    pub fn is(&self, caller: Address) -> bool {
        self.0 == caller
    }

    /// Fails with [`MintError::Unauthorized`] unless `caller` is the owner.
    pub fn ensure(&self, caller: Address) -> MintResult<()> {
        if !self.is(caller) {
            return Err(MintError::Unauthorized { caller });
        }
        Ok(())
    }

    /// Hands the capability to `new`, returning the previous owner.
    pub(crate) fn replace(&mut self, new: Address) -> Address {
        std::mem::replace(&mut self.0, new)
    }
}
