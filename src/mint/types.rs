//! Outcome types of the mint authorization core.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::chain::{ProviderError, TokenId};

/// Why the mint window rejected a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WindowClosed {
    #[error("mint not started")]
    NotStarted,
    #[error("mint has been finished")]
    Finished,
}

/// Why the sale's gate rejected a call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateRejection {
    /// The attached value differs from the fixed price.
    #[error("payment value must be equal to price: expected {expected}, got {got}")]
    InvalidPayment { expected: U256, got: U256 },

    /// The eligibility proof failed verification. Which check failed is not
    /// reported.
    #[error("not whitelist user")]
    InvalidProof,
}

/// Every way a collection call can be rejected.
///
/// A rejected call leaves no trace in storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MintError {
    /// A non-owner attempted an administrative action.
    #[error("caller is not the owner: {caller}")]
    Unauthorized { caller: Address },

    /// The call happened outside the mint window.
    #[error(transparent)]
    WindowClosed(#[from] WindowClosed),

    /// Wrong payment, or the proof failed verification.
    #[error(transparent)]
    GateRejected(#[from] GateRejection),

    /// The identity already holds a pass from this collection.
    #[error("can only mint one pass: {0} has already minted")]
    AlreadyIssued(Address),

    /// A value transfer or token issuance primitive failed.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] ProviderError),
}

impl MintError {
    /// Stable machine-readable category of the error.
    pub fn code(&self) -> &'static str {
        match self {
            MintError::Unauthorized { .. } => "unauthorized",
            MintError::WindowClosed(_) => "window_closed",
            MintError::GateRejected(_) => "gate_rejected",
            MintError::AlreadyIssued(_) => "already_issued",
            MintError::TransferFailed(_) => "transfer_failed",
        }
    }
}

pub type MintResult<T> = Result<T, MintError>;

/// Proof of a successful mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    pub collection: Address,
    pub to: Address,
    pub token_id: TokenId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let caller = Address::repeat_byte(1);
        assert_eq!(MintError::Unauthorized { caller }.code(), "unauthorized");
        assert_eq!(MintError::from(WindowClosed::Finished).code(), "window_closed");
        assert_eq!(MintError::from(GateRejection::InvalidProof).code(), "gate_rejected");
        assert_eq!(MintError::AlreadyIssued(caller).code(), "already_issued");
        let provider = ProviderError::Rejected("refused".to_string());
        assert_eq!(MintError::from(provider).code(), "transfer_failed");
    }

    #[test]
    fn test_error_reasons() {
        assert_eq!(MintError::from(WindowClosed::NotStarted).to_string(), "mint not started");
        assert_eq!(
            MintError::from(WindowClosed::Finished).to_string(),
            "mint has been finished"
        );
        assert_eq!(
            MintError::from(GateRejection::InvalidProof).to_string(),
            "not whitelist user"
        );
        let msg = MintError::Unauthorized {
            caller: Address::ZERO,
        }
        .to_string();
        assert!(msg.starts_with("caller is not the owner"));
    }
}
