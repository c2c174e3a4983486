//! Proof-gated whitelist sale with a start and end boundary.
//!
//! An off-chain [`ProofIssuer`] signs `(identity, chain id, salt)` for each
//! eligible identity. The sale recovers the signer of a submitted [`Proof`]
//! and admits the caller only if the issuer signed for that caller on this
//! chain. Minting is free.

pub mod proof;
pub use proof::*;

pub mod signer;
pub use signer::*;

pub mod verifier;
pub use verifier::*;

use alloy_primitives::Address;

use crate::chain::{
    CallContext, Contract, EventSink, Timestamp, TokenId, TokenIssuer, WhitelistSaleConfig,
};
use crate::metadata::CollectionMetadata;
use crate::mint::{MintAuthority, MintReceipt, MintResult, MintWindow, WindowStatus};

/// A free collection minted by holders of an issuer-signed proof.
#[derive(Debug, Clone)]
pub struct WhitelistSale {
    metadata: CollectionMetadata,
    authority: MintAuthority<ProofVerifier>,
}

impl WhitelistSale {
    /// Deploys a sale at `address`, administered by `owner`.
    pub fn deploy(address: Address, owner: Address, config: &WhitelistSaleConfig) -> Self {
        Self::new(
            address,
            owner,
            config.metadata.clone(),
            config.issuer,
            config.start_time,
            config.end_time,
        )
    }

    pub fn new(
        address: Address,
        owner: Address,
        metadata: CollectionMetadata,
        issuer: Address,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Self {
        Self {
            metadata,
            authority: MintAuthority::new(
                address,
                owner,
                MintWindow::between(start_time, end_time),
                ProofVerifier::new(issuer),
            ),
        }
    }

    /// Mints one pass to the caller against a typed proof.
    pub fn mint<H: TokenIssuer + EventSink>(
        &mut self,
        ctx: &CallContext,
        proof: &Proof,
        host: &mut H,
    ) -> MintResult<MintReceipt> {
        self.mint_encoded(ctx, &proof.abi_encode(), host)
    }

    /// Mints one pass to the caller against an ABI-encoded proof.
    ///
    /// The window is checked before the bytes are decoded, so garbage
    /// submitted outside the window reports the window error.
    pub fn mint_encoded<H: TokenIssuer + EventSink>(
        &mut self,
        ctx: &CallContext,
        encoded: &[u8],
        host: &mut H,
    ) -> MintResult<MintReceipt> {
        self.authority.mint(ctx, encoded, host)
    }

    /// Moves the start time. Owner only.
    pub fn set_start<H: EventSink>(
        &mut self,
        ctx: &CallContext,
        start_time: Timestamp,
        host: &mut H,
    ) -> MintResult<()> {
        self.authority.set_start(ctx, start_time, host)
    }

    /// Moves the end time. Owner only.
    pub fn set_end<H: EventSink>(
        &mut self,
        ctx: &CallContext,
        end_time: Timestamp,
        host: &mut H,
    ) -> MintResult<()> {
        self.authority.set_end(ctx, end_time, host)
    }

    /// Replaces both boundaries at once. Owner only.
    pub fn set_bounds<H: EventSink>(
        &mut self,
        ctx: &CallContext,
        start_time: Timestamp,
        end_time: Timestamp,
        host: &mut H,
    ) -> MintResult<()> {
        self.authority.set_bounds(ctx, start_time, end_time, host)
    }

    pub fn transfer_ownership<H: EventSink>(
        &mut self,
        ctx: &CallContext,
        new_owner: Address,
        host: &mut H,
    ) -> MintResult<()> {
        self.authority.transfer_ownership(ctx, new_owner, host)
    }

    pub fn start_time(&self) -> Timestamp {
        self.authority.window().start()
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        self.authority.window().end()
    }

    /// The identity whose signatures this sale accepts. Fixed at deployment.
    pub fn issuer(&self) -> Address {
        self.authority.gate().issuer()
    }

    pub fn status(&self, now: Timestamp) -> WindowStatus {
        self.authority.status(now)
    }

    pub fn total_supply(&self) -> u64 {
        self.authority.ledger().total_issued()
    }

    pub fn has_minted(&self, who: &Address) -> bool {
        self.authority.ledger().has_minted(who)
    }

    pub fn owner(&self) -> Address {
        self.authority.owner().address()
    }

    pub fn metadata(&self) -> &CollectionMetadata {
        &self.metadata
    }

    pub fn token_uri(&self, token_id: TokenId) -> Option<&str> {
        self.metadata.uri_for(token_id, self.total_supply())
    }
}

impl Contract for WhitelistSale {
    fn address(&self) -> Address {
        self.authority.collection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainId, LocalChain, ManualClock};
    use crate::mint::{GateRejection, MintError, WindowClosed};
    use alloy_primitives::U256;
    use std::sync::Arc;

    const START: Timestamp = 1_700_000_000;
    const END: Timestamp = START + 7 * 24 * 3600;
    const CHAIN: u64 = 31337;

    struct Fixture {
        chain: LocalChain,
        clock: ManualClock,
        sale: WhitelistSale,
        issuer: ProofIssuer,
        owner: Address,
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::new(START - 60);
        let chain = LocalChain::with_clock(ChainId::new(CHAIN), Arc::new(clock.clone()));
        let issuer = ProofIssuer::from_bytes(&[0x5a; 32]).unwrap();
        let owner = Address::repeat_byte(0x01);
        let config = WhitelistSaleConfig::genesis_pass(issuer.address(), START, END);
        let sale = WhitelistSale::deploy(Address::repeat_byte(0xbb), owner, &config);
        Fixture {
            chain,
            clock,
            sale,
            issuer,
            owner,
        }
    }

    fn proof_for(f: &Fixture, who: Address) -> Proof {
        f.issuer
            .sign(who, U256::from(CHAIN), U256::from(0x5eedu64))
            .unwrap()
    }

    fn mint(f: &mut Fixture, caller: Address, proof: &Proof) -> MintResult<MintReceipt> {
        f.chain
            .call(&mut f.sale, caller, U256::ZERO, |sale, ctx, host| {
                sale.mint(ctx, proof, host)
            })
    }

    #[test]
    fn test_deploy_init_values() {
        let f = fixture();
        assert_eq!(f.sale.metadata().name, "Weave6 Genesis Pass");
        assert_eq!(f.sale.metadata().symbol, "WGP");
        assert_eq!(f.sale.start_time(), START);
        assert_eq!(f.sale.end_time(), Some(END));
        assert_eq!(f.sale.issuer(), f.issuer.address());
        assert_eq!(f.sale.owner(), f.owner);
    }

    #[test]
    fn test_valid_proof_mints() {
        let mut f = fixture();
        f.clock.set(START);
        let alice = Address::repeat_byte(0xa1);
        let proof = proof_for(&f, alice);
        let receipt = mint(&mut f, alice, &proof).unwrap();
        assert_eq!(receipt.token_id, 1);
        assert!(f.sale.has_minted(&alice));
        assert_eq!(f.chain.state().owner_of(f.sale.address(), 1), Some(alice));
    }

    #[test]
    fn test_proof_cannot_be_replayed_by_another_caller() {
        let mut f = fixture();
        f.clock.set(START);
        let alice = Address::repeat_byte(0xa1);
        let bob = Address::repeat_byte(0xb0);
        let proof = proof_for(&f, alice);
        let err = mint(&mut f, bob, &proof).unwrap_err();
        assert_eq!(err, MintError::GateRejected(GateRejection::InvalidProof));
        assert_eq!(f.sale.total_supply(), 0);
    }

    #[test]
    fn test_proof_cannot_be_replayed_on_another_chain() {
        let mut f = fixture();
        f.clock.set(START);
        let alice = Address::repeat_byte(0xa1);
        let foreign = f.issuer.sign(alice, U256::from(1u8), U256::ZERO).unwrap();
        let err = mint(&mut f, alice, &foreign).unwrap_err();
        assert_eq!(err.to_string(), "not whitelist user");
    }

    #[test]
    fn test_second_mint_rejected() {
        let mut f = fixture();
        f.clock.set(START + 1);
        let alice = Address::repeat_byte(0xa1);
        let proof = proof_for(&f, alice);
        mint(&mut f, alice, &proof).unwrap();
        let err = mint(&mut f, alice, &proof).unwrap_err();
        assert_eq!(err, MintError::AlreadyIssued(alice));
    }

    #[test]
    fn test_window_reported_before_garbage_proof() {
        let mut f = fixture();
        let alice = Address::repeat_byte(0xa1);
        let err = f
            .chain
            .call(&mut f.sale, alice, U256::ZERO, |sale, ctx, host| {
                sale.mint_encoded(ctx, b"proof", host)
            })
            .unwrap_err();
        assert_eq!(err, MintError::WindowClosed(WindowClosed::NotStarted));

        f.clock.set(START);
        let err = f
            .chain
            .call(&mut f.sale, alice, U256::ZERO, |sale, ctx, host| {
                sale.mint_encoded(ctx, b"proof", host)
            })
            .unwrap_err();
        assert_eq!(err, MintError::GateRejected(GateRejection::InvalidProof));
    }

    #[test]
    fn test_mint_after_end_rejected() {
        let mut f = fixture();
        f.clock.set(END);
        let alice = Address::repeat_byte(0xa1);
        let proof = proof_for(&f, alice);
        let err = mint(&mut f, alice, &proof).unwrap_err();
        assert_eq!(err, MintError::WindowClosed(WindowClosed::Finished));
    }

    #[test]
    fn test_owner_reopens_window() {
        let mut f = fixture();
        f.clock.set(END + 10);
        let owner = f.owner;
        f.chain
            .call(&mut f.sale, owner, U256::ZERO, |sale, ctx, host| {
                sale.set_end(ctx, END + 100, host)
            })
            .unwrap();
        let alice = Address::repeat_byte(0xa1);
        let proof = proof_for(&f, alice);
        assert!(mint(&mut f, alice, &proof).is_ok());
    }

    #[test]
    fn test_stranger_cannot_move_window() {
        let mut f = fixture();
        let stranger = Address::repeat_byte(0x77);
        let err = f
            .chain
            .call(&mut f.sale, stranger, U256::ZERO, |sale, ctx, host| {
                sale.set_bounds(ctx, 0, 1, host)
            })
            .unwrap_err();
        assert_eq!(err.code(), "unauthorized");
        assert_eq!(f.sale.start_time(), START);
        assert_eq!(f.sale.end_time(), Some(END));
    }
}
