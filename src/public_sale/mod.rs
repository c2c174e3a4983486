//! Fixed-price public sale with a single start boundary.
//!
//! Anyone may mint once the start time has passed, provided the call carries
//! exactly the sale price. Proceeds accumulate under the collection's address
//! until the owner withdraws them.
//!
//! # Usage
//!
//! ```
//! use alloy_primitives::Address;
//! use pass_mint::chain::{ChainId, LocalChain, ManualClock, PublicSaleConfig};
//! use pass_mint::public_sale::PublicSale;
//! use std::sync::Arc;
//!
//! let clock = ManualClock::new(1_000);
//! let mut chain = LocalChain::with_clock(ChainId::new(31337), Arc::new(clock));
//! let owner = Address::repeat_byte(1);
//! let alice = Address::repeat_byte(2);
//!
//! let config = PublicSaleConfig::apy_pass(1_000);
//! let mut sale = PublicSale::deploy(Address::repeat_byte(0xaa), owner, &config);
//! chain.fund(alice, config.price).unwrap();
//!
//! let receipt = chain
//!     .call(&mut sale, alice, config.price, |sale, ctx, host| sale.mint(ctx, host))
//!     .unwrap();
//! assert_eq!(receipt.token_id, 1);
//! assert_eq!(sale.total_supply(), 1);
//! ```

pub mod payment;
pub use payment::*;

pub mod treasury;
pub use treasury::*;

use alloy_primitives::{Address, U256};

use crate::chain::{
    CallContext, Contract, EventSink, PublicSaleConfig, Timestamp, TokenId, TokenIssuer,
    ValueTransfer,
};
use crate::metadata::CollectionMetadata;
use crate::mint::{MintAuthority, MintReceipt, MintResult, MintWindow, WindowStatus};

/// A pay-to-mint collection: one pass per identity at a fixed price.
#[derive(Debug, Clone)]
pub struct PublicSale {
    metadata: CollectionMetadata,
    authority: MintAuthority<PaymentGate>,
    treasury: Treasury,
}

impl PublicSale {
    /// Deploys a sale at `address`, administered by `owner`.
    pub fn deploy(address: Address, owner: Address, config: &PublicSaleConfig) -> Self {
        Self::new(
            address,
            owner,
            config.metadata.clone(),
            config.price,
            config.start_time,
        )
    }

    pub fn new(
        address: Address,
        owner: Address,
        metadata: CollectionMetadata,
        price: U256,
        start_time: Timestamp,
    ) -> Self {
        Self {
            metadata,
            authority: MintAuthority::new(
                address,
                owner,
                MintWindow::starting_at(start_time),
                PaymentGate::new(price),
            ),
            treasury: Treasury::new(address),
        }
    }

    /// Mints one pass to the caller, paid by the value attached to the call.
    pub fn mint<H: TokenIssuer + EventSink>(
        &mut self,
        ctx: &CallContext,
        host: &mut H,
    ) -> MintResult<MintReceipt> {
        self.authority.mint(ctx, &ctx.value, host)
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

    /// Pays the whole accumulated balance to the owner. Owner only.
    pub fn withdraw<H: ValueTransfer + EventSink>(
        &self,
        ctx: &CallContext,
        host: &mut H,
    ) -> MintResult<U256> {
        self.treasury.withdraw(self.authority.owner(), ctx, host)
    }

    /// Hands administrative control to `new_owner`. Owner only.
    pub fn transfer_ownership<H: EventSink>(
        &mut self,
        ctx: &CallContext,
        new_owner: Address,
        host: &mut H,
    ) -> MintResult<()> {
        self.authority.transfer_ownership(ctx, new_owner, host)
    }

    pub fn price(&self) -> U256 {
        self.authority.gate().price()
    }

    pub fn start_time(&self) -> Timestamp {
        self.authority.window().start()
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

    /// Proceeds currently held by the sale.
    pub fn balance<H: ValueTransfer>(&self, host: &H) -> U256 {
        self.treasury.balance(host)
    }
}

impl Contract for PublicSale {
    fn address(&self) -> Address {
        self.authority.collection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainId, LocalChain, ManualClock, parse_ether};
    use crate::mint::{GateRejection, MintError, WindowClosed};
    use std::sync::Arc;

    const START: Timestamp = 1_700_000_000;

    struct Fixture {
        chain: LocalChain,
        clock: ManualClock,
        sale: PublicSale,
        owner: Address,
        alice: Address,
        price: U256,
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::new(START - 60);
        let mut chain = LocalChain::with_clock(ChainId::new(31337), Arc::new(clock.clone()));
        let owner = Address::repeat_byte(0x01);
        let alice = Address::repeat_byte(0xa1);
        let config = PublicSaleConfig::apy_pass(START);
        let price = config.price;
        chain.fund(alice, parse_ether("1").unwrap()).unwrap();
        let sale = PublicSale::deploy(Address::repeat_byte(0xaa), owner, &config);
        Fixture {
            chain,
            clock,
            sale,
            owner,
            alice,
            price,
        }
    }

    fn mint(f: &mut Fixture, caller: Address, value: U256) -> MintResult<MintReceipt> {
        f.chain
            .call(&mut f.sale, caller, value, |sale, ctx, host| sale.mint(ctx, host))
    }

    #[test]
    fn test_deploy_init_values() {
        let f = fixture();
        assert_eq!(f.sale.start_time(), START);
        assert_eq!(f.sale.metadata().name, "Weave6 APY Pass");
        assert_eq!(f.sale.metadata().symbol, "WAP");
        assert_eq!(f.sale.total_supply(), 0);
        assert_eq!(f.sale.owner(), f.owner);
        assert_eq!(f.sale.price(), parse_ether("0.05").unwrap());
    }

    #[test]
    fn test_mint_before_start_rejected() {
        let mut f = fixture();
        let (alice, price) = (f.alice, f.price);
        let err = mint(&mut f, alice, price).unwrap_err();
        assert_eq!(err, MintError::WindowClosed(WindowClosed::NotStarted));
        assert_eq!(f.chain.balance_of(alice), parse_ether("1").unwrap());
    }

    #[test]
    fn test_wrong_price_rejected_and_refunded() {
        let mut f = fixture();
        f.clock.set(START);
        let (alice, price) = (f.alice, f.price);
        let err = mint(&mut f, alice, price - U256::from(1u8)).unwrap_err();
        assert!(matches!(
            err,
            MintError::GateRejected(GateRejection::InvalidPayment { .. })
        ));
        assert_eq!(f.sale.balance(f.chain.state()), U256::ZERO);
        assert_eq!(f.chain.balance_of(alice), parse_ether("1").unwrap());
    }

    #[test]
    fn test_mint_collects_exact_price() {
        let mut f = fixture();
        f.clock.set(START);
        let (alice, price) = (f.alice, f.price);
        let receipt = mint(&mut f, alice, price).unwrap();
        assert_eq!(receipt.token_id, 1);
        assert_eq!(f.chain.state().holdings(f.sale.address(), alice), 1);
        assert_eq!(f.sale.balance(f.chain.state()), price);
        assert_eq!(
            f.sale.token_uri(1),
            Some("ipfs://QmUtg6fpxGt2WHRndXe3ZbbbnqasGhQKrh8CreksUQ3uX1/apypass.json")
        );
    }

    #[test]
    fn test_second_mint_rejected() {
        let mut f = fixture();
        f.clock.set(START);
        let (alice, price) = (f.alice, f.price);
        mint(&mut f, alice, price).unwrap();
        let err = mint(&mut f, alice, price).unwrap_err();
        assert_eq!(err, MintError::AlreadyIssued(alice));
        assert_eq!(f.sale.balance(f.chain.state()), price);
        assert_eq!(f.sale.total_supply(), 1);
    }

    #[test]
    fn test_owner_updates_start() {
        let mut f = fixture();
        let owner = f.owner;
        f.chain
            .call(&mut f.sale, owner, U256::ZERO, |sale, ctx, host| {
                sale.set_start(ctx, 42, host)
            })
            .unwrap();
        assert_eq!(f.sale.start_time(), 42);
    }

    #[test]
    fn test_stranger_cannot_update_start() {
        let mut f = fixture();
        let alice = f.alice;
        let err = f
            .chain
            .call(&mut f.sale, alice, U256::ZERO, |sale, ctx, host| {
                sale.set_start(ctx, 42, host)
            })
            .unwrap_err();
        assert_eq!(err, MintError::Unauthorized { caller: alice });
        assert_eq!(f.sale.start_time(), START);
    }
}
