//! The mint authorization core.
//!
//! A sale is a [`MintAuthority`] parameterized by a [`MintGate`]:
//!
//! - [`MintWindow`] - when minting is permitted, as a pure function of time
//! - [`MintLedger`] - issued count and the one-shot per-identity flag
//! - [`Owner`] - the single identity allowed to administer the sale
//! - [`MintGate`] - the sale-specific admission check (payment or proof)
//!
//! Every rejection is a [`MintError`]; see [`MintError::code`] for the stable
//! category strings.

pub mod authority;
pub use authority::*;

pub mod ledger;
pub use ledger::*;

pub mod owner;
pub use owner::*;

pub mod types;
pub use types::*;

pub mod window;
pub use window::*;
