//! Owner-only payout of accumulated sale proceeds.

use alloy_primitives::{Address, U256};

use crate::chain::{CallContext, Event, EventSink, ValueTransfer};
use crate::mint::{MintResult, Owner};

/// Proceeds held by a sale contract.
///
/// The balance itself lives with the value-transfer host under the
/// collection's address; the treasury only knows where to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Treasury {
    collection: Address,
}

impl Treasury {
    pub fn new(collection: Address) -> Self {
        Self { collection }
    }

    pub fn balance<H: ValueTransfer>(&self, host: &H) -> U256 {
        host.balance_of(self.collection)
    }

    /// Sends the whole balance to the owner in a single transfer.
    ///
    /// Returns the amount paid out. A failing transfer fails the call.
    pub fn withdraw<H: ValueTransfer + EventSink>(
        &self,
        owner: &Owner,
        ctx: &CallContext,
        host: &mut H,
    ) -> MintResult<U256> {
        owner.ensure(ctx.caller)?;

        let amount = host.balance_of(self.collection);
        host.transfer(self.collection, owner.address(), amount)?;
        host.emit(Event::Withdrawn {
            collection: self.collection,
            to: owner.address(),
            amount,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(
            collection = %self.collection,
            to = %owner.address(),
            amount = %amount,
            "Proceeds withdrawn"
        );

        Ok(amount)
    }
}
