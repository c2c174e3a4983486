//! Exact fixed-price payment check.

use alloy_primitives::U256;

use crate::chain::CallContext;
use crate::mint::{GateRejection, MintGate};

/// Admits a mint only when the attached value equals the price exactly.
///
/// Over- and under-payments are both rejected; nothing is refunded because
/// a rejected call never keeps the value in the first place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentGate {
    price: U256,
}

impl PaymentGate {
    pub fn new(price: U256) -> Self {
        Self { price }
    }

    pub fn price(&self) -> U256 {
        self.price
    }

    pub fn check_value(&self, submitted: U256) -> Result<(), GateRejection> {
        if submitted != self.price {
            return Err(GateRejection::InvalidPayment {
                expected: self.price,
                got: submitted,
            });
        }
        Ok(())
    }
}

impl MintGate for PaymentGate {
    type Input = U256;

    fn check(&self, _ctx: &CallContext, input: &U256) -> Result<(), GateRejection> {
        self.check_value(*input)
    }
}
