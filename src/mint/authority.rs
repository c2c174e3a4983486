//! The mint authorization state machine shared by every sale.

use alloy_primitives::Address;

use super::{
    GateRejection, MintLedger, MintReceipt, MintResult, MintWindow, Owner, WindowStatus,
};
use crate::chain::{CallContext, Event, EventSink, Timestamp, TokenIssuer};

/// Admission check specific to a sale: a payment, a proof, etc.
pub trait MintGate {
    /// What the caller submits alongside the mint call.
    type Input: ?Sized;

    /// Accepts or rejects `input` for the call described by `ctx`.
    fn check(&self, ctx: &CallContext, input: &Self::Input) -> Result<(), GateRejection>;
}

/// Decides whether a mint is admissible and commits it.
///
/// Checks run in a fixed order and the first failure wins:
///
/// 1. the window must be open at the call's timestamp
/// 2. the gate must accept the submitted input
/// 3. the caller must not have minted before
///
/// Only when all three pass is the token issued and the ledger updated.
#[derive(Debug, Clone)]
pub struct MintAuthority<G> {
    collection: Address,
    owner: Owner,
    window: MintWindow,
    ledger: MintLedger,
    gate: G,
}

impl<G> MintAuthority<G> {
    pub fn new(collection: Address, owner: Address, window: MintWindow, gate: G) -> Self {
        Self {
            collection,
            owner: Owner::new(owner),
            window,
            ledger: MintLedger::new(),
            gate,
        }
    }

    pub fn collection(&self) -> Address {
        self.collection
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn window(&self) -> &MintWindow {
        &self.window
    }

    pub fn ledger(&self) -> &MintLedger {
        &self.ledger
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn status(&self, now: Timestamp) -> WindowStatus {
        self.window.status(now)
    }

    /// Moves the opening boundary. Owner only.
    pub fn set_start<H: EventSink>(
        &mut self,
        ctx: &CallContext,
        start: Timestamp,
        host: &mut H,
    ) -> MintResult<()> {
        self.owner.ensure(ctx.caller)?;
        self.window.set_start(start);
        self.window_updated(host);
        Ok(())
    }

    /// Moves the closing boundary. Owner only.
    pub fn set_end<H: EventSink>(
        &mut self,
        ctx: &CallContext,
        end: Timestamp,
        host: &mut H,
    ) -> MintResult<()> {
        self.owner.ensure(ctx.caller)?;
        self.window.set_end(end);
        self.window_updated(host);
        Ok(())
    }

    /// Replaces both boundaries. Owner only.
    pub fn set_bounds<H: EventSink>(
        &mut self,
        ctx: &CallContext,
        start: Timestamp,
        end: Timestamp,
        host: &mut H,
    ) -> MintResult<()> {
        self.owner.ensure(ctx.caller)?;
        self.window.set_start(start);
        self.window.set_end(end);
        self.window_updated(host);
        Ok(())
    }

    /// Hands administrative control to `new_owner`. Owner only.
    pub fn transfer_ownership<H: EventSink>(
        &mut self,
        ctx: &CallContext,
        new_owner: Address,
        host: &mut H,
    ) -> MintResult<()> {
        self.owner.ensure(ctx.caller)?;
        let previous = self.owner.replace(new_owner);
        host.emit(Event::OwnershipTransferred {
            collection: self.collection,
            previous,
            new: new_owner,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(
            collection = %self.collection,
            previous = %previous,
            new = %new_owner,
            "Ownership transferred"
        );

        Ok(())
    }

    fn window_updated<H: EventSink>(&self, host: &mut H) {
        host.emit(Event::WindowUpdated {
            collection: self.collection,
            start: self.window.start(),
            end: self.window.end(),
        });

        #[cfg(feature = "tracing")]
        tracing::info!(
            collection = %self.collection,
            start = self.window.start(),
            end = ?self.window.end(),
            "Mint window updated"
        );
    }
}

impl<G: MintGate> MintAuthority<G> {
    /// Runs the admission checks for `ctx.caller` and issues one pass.
    ///
    /// The token is issued before the ledger is touched, so a failing
    /// issuance leaves this authority unchanged.
    pub fn mint<H: TokenIssuer + EventSink>(
        &mut self,
        ctx: &CallContext,
        input: &G::Input,
        host: &mut H,
    ) -> MintResult<MintReceipt> {
        let result = self.try_mint(ctx, input, host);

        #[cfg(feature = "tracing")]
        match &result {
            Ok(receipt) => tracing::info!(
                collection = %receipt.collection,
                to = %receipt.to,
                token_id = receipt.token_id,
                "Pass minted"
            ),
            Err(e) => tracing::debug!(
                collection = %self.collection,
                caller = %ctx.caller,
                code = e.code(),
                reason = %e,
                "Mint rejected"
            ),
        }

        result
    }

    fn try_mint<H: TokenIssuer + EventSink>(
        &mut self,
        ctx: &CallContext,
        input: &G::Input,
        host: &mut H,
    ) -> MintResult<MintReceipt> {
        self.window.ensure_open(ctx.timestamp)?;
        self.gate.check(ctx, input)?;
        self.ledger.ensure_unminted(ctx.caller)?;

        let token_id = self.ledger.next_token_id();
        host.issue(self.collection, ctx.caller, token_id)?;
        let recorded = self.ledger.record(ctx.caller)?;
        debug_assert_eq!(recorded, token_id);

        host.emit(Event::Minted {
            collection: self.collection,
            to: ctx.caller,
            token_id,
        });
        Ok(MintReceipt {
            collection: self.collection,
            to: ctx.caller,
            token_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use crate::chain::{HostState, ProviderError, TokenId};
    use crate::mint::{MintError, WindowClosed};

    /// Accepts inputs equal to its magic number.
    #[derive(Debug, Clone)]
    struct MagicGate(u32);

    impl MintGate for MagicGate {
        type Input = u32;

        fn check(&self, _ctx: &CallContext, input: &u32) -> Result<(), GateRejection> {
            if *input == self.0 {
                Ok(())
            } else {
                Err(GateRejection::InvalidProof)
            }
        }
    }

    /// Host whose token issuance always fails.
    #[derive(Default)]
    struct BrokenIssuer {
        events: Vec<Event>,
    }

    impl TokenIssuer for BrokenIssuer {
        fn issue(&mut self, _: Address, _: Address, _: TokenId) -> Result<(), ProviderError> {
            Err(ProviderError::Rejected("receiver refused".to_string()))
        }
    }

    impl EventSink for BrokenIssuer {
        fn emit(&mut self, event: Event) {
            self.events.push(event);
        }
    }

    const COLLECTION: Address = address!("cccccccccccccccccccccccccccccccccccccccc");
    const OWNER: Address = address!("0101010101010101010101010101010101010101");
    const ALICE: Address = address!("a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1");

    fn authority() -> MintAuthority<MagicGate> {
        MintAuthority::new(COLLECTION, OWNER, MintWindow::between(100, 200), MagicGate(7))
    }

    fn at(caller: Address, timestamp: Timestamp) -> CallContext {
        CallContext::new(caller, timestamp, 31337)
    }

    #[test]
    fn test_mint_issues_first_token() {
        let mut auth = authority();
        let mut host = HostState::default();
        let receipt = auth.mint(&at(ALICE, 150), &7, &mut host).unwrap();
        assert_eq!(receipt.token_id, 1);
        assert_eq!(host.owner_of(COLLECTION, 1), Some(ALICE));
        assert_eq!(auth.ledger().total_issued(), 1);
        assert!(auth.ledger().has_minted(&ALICE));
        assert_eq!(
            host.events().last(),
            Some(&Event::Minted {
                collection: COLLECTION,
                to: ALICE,
                token_id: 1
            })
        );
    }

    #[test]
    fn test_window_checked_before_gate() {
        let mut auth = authority();
        let mut host = HostState::default();
        let err = auth.mint(&at(ALICE, 50), &0, &mut host).unwrap_err();
        assert_eq!(err, MintError::WindowClosed(WindowClosed::NotStarted));
        let err = auth.mint(&at(ALICE, 200), &0, &mut host).unwrap_err();
        assert_eq!(err, MintError::WindowClosed(WindowClosed::Finished));
    }

    #[test]
    fn test_gate_checked_before_ledger() {
        let mut auth = authority();
        let mut host = HostState::default();
        auth.mint(&at(ALICE, 150), &7, &mut host).unwrap();
        let err = auth.mint(&at(ALICE, 151), &8, &mut host).unwrap_err();
        assert_eq!(err, MintError::GateRejected(GateRejection::InvalidProof));
        let err = auth.mint(&at(ALICE, 152), &7, &mut host).unwrap_err();
        assert_eq!(err, MintError::AlreadyIssued(ALICE));
        assert_eq!(auth.ledger().total_issued(), 1);
    }

    #[test]
    fn test_failed_issuance_leaves_ledger_untouched() {
        let mut auth = authority();
        let mut host = BrokenIssuer::default();
        let err = auth.mint(&at(ALICE, 150), &7, &mut host).unwrap_err();
        assert_eq!(err.code(), "transfer_failed");
        assert_eq!(auth.ledger().total_issued(), 0);
        assert!(!auth.ledger().has_minted(&ALICE));
        assert!(host.events.is_empty());
    }

    #[test]
    fn test_admin_requires_owner() {
        let mut auth = authority();
        let mut host = HostState::default();
        let err = auth.set_start(&at(ALICE, 0), 0, &mut host).unwrap_err();
        assert_eq!(err, MintError::Unauthorized { caller: ALICE });
        let err = auth.set_bounds(&at(ALICE, 0), 0, 1, &mut host).unwrap_err();
        assert_eq!(err.code(), "unauthorized");
        let err = auth.transfer_ownership(&at(ALICE, 0), ALICE, &mut host).unwrap_err();
        assert_eq!(err.code(), "unauthorized");
        assert_eq!(*auth.window(), MintWindow::between(100, 200));
        assert!(host.events().is_empty());
    }

    #[test]
    fn test_owner_moves_window() {
        let mut auth = authority();
        let mut host = HostState::default();
        auth.set_start(&at(OWNER, 0), 10, &mut host).unwrap();
        auth.set_end(&at(OWNER, 0), 20, &mut host).unwrap();
        assert_eq!(*auth.window(), MintWindow::between(10, 20));
        assert_eq!(auth.status(15), WindowStatus::Open);
        assert_eq!(host.events().len(), 2);
    }

    #[test]
    fn test_transfer_ownership() {
        let mut auth = authority();
        let mut host = HostState::default();
        auth.transfer_ownership(&at(OWNER, 0), ALICE, &mut host).unwrap();
        assert!(auth.owner().is(ALICE));
        assert!(auth.set_start(&at(OWNER, 0), 1, &mut host).is_err());
        assert!(auth.set_start(&at(ALICE, 0), 1, &mut host).is_ok());
    }
}
