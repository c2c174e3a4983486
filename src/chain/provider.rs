//! Host collaborators and the in-process chain that executes collection calls.
//!
//! Collections never touch balances or token ownership directly. They go
//! through the [`ValueTransfer`], [`TokenIssuer`] and [`EventSink`] seams,
//! which [`HostState`] implements for the in-process [`LocalChain`].

use alloy_primitives::{Address, U256};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use super::{CallContext, ChainConfig, ChainId, Event, Timestamp, TokenId};

// ============================================================================
// Collaborator traits
// ============================================================================

/// Source of the current block timestamp.
pub trait Clock: Send + Sync {
    /// Returns the current unix time in seconds.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// A settable clock. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self(Arc::new(AtomicU64::new(now)))
    }

    pub fn set(&self, now: Timestamp) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.0.load(Ordering::SeqCst)
    }
}

/// Native value custody and transfer.
pub trait ValueTransfer {
    /// Returns the native balance held by `who`.
    fn balance_of(&self, who: Address) -> U256;

    /// Moves `amount` from `from` to `to`, failing without side effects.
    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), ProviderError>;
}

/// Records ownership of newly issued tokens.
pub trait TokenIssuer {
    /// Records that `to` now owns token `token_id` of `collection`.
    fn issue(
        &mut self,
        collection: Address,
        to: Address,
        token_id: TokenId,
    ) -> Result<(), ProviderError>;
}

/// Receives the events of the call being executed.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

/// A contract hosted on a [`LocalChain`].
pub trait Contract {
    /// The contract's own identity, which holds any value paid to it.
    fn address(&self) -> Address;
}

/// Errors raised by host primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The sender does not hold enough native value.
    #[error("Insufficient balance for {account}: have {have}, need {need}")]
    InsufficientBalance {
        account: Address,
        have: U256,
        need: U256,
    },

    /// Crediting the recipient would overflow its balance.
    #[error("Balance overflow for {0}")]
    Overflow(Address),

    /// The token id was already issued in this collection.
    #[error("Token {token_id} of {collection} already issued")]
    TokenExists { collection: Address, token_id: TokenId },

    /// The recipient refused the transfer.
    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

// ============================================================================
// HostState
// ============================================================================

/// Balances, token ownership and event log of a [`LocalChain`].
///
/// While a call is executing, every write is also recorded in an undo
/// journal so a failed call can be rolled back without copying the state.
#[derive(Debug, Default)]
pub struct HostState {
    balances: HashMap<Address, U256>,
    owners: HashMap<(Address, TokenId), Address>,
    holdings: HashMap<(Address, Address), u64>,
    events: Vec<Event>,
    journal: Option<Vec<JournalEntry>>,
}

/// A single undoable write.
#[derive(Debug)]
enum JournalEntry {
    Balance {
        who: Address,
        previous: Option<U256>,
    },
    Issued {
        collection: Address,
        token_id: TokenId,
        to: Address,
    },
}

/// Where a failed call rolls the host state back to.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    events: usize,
}

impl HostState {
    /// Returns the owner of `token_id` in `collection`, if issued.
    pub fn owner_of(&self, collection: Address, token_id: TokenId) -> Option<Address> {
        self.owners.get(&(collection, token_id)).copied()
    }

    /// Returns how many tokens of `collection` are held by `who`.
    pub fn holdings(&self, collection: Address, who: Address) -> u64 {
        self.holdings.get(&(collection, who)).copied().unwrap_or_default()
    }

    /// Returns every event recorded by committed calls, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    fn credit(&mut self, who: Address, amount: U256) -> Result<(), ProviderError> {
        let credited = self
            .balance_of(who)
            .checked_add(amount)
            .ok_or(ProviderError::Overflow(who))?;
        self.set_balance(who, credited);
        Ok(())
    }

    fn set_balance(&mut self, who: Address, amount: U256) {
        let previous = self.balances.insert(who, amount);
        self.record(JournalEntry::Balance { who, previous });
    }

    fn record(&mut self, entry: JournalEntry) {
        if let Some(journal) = &mut self.journal {
            journal.push(entry);
        }
    }

    /// Starts journaling writes for a call.
    fn checkpoint(&mut self) -> Checkpoint {
        self.journal = Some(Vec::new());
        Checkpoint {
            events: self.events.len(),
        }
    }

    /// Keeps every write made since the checkpoint.
    fn commit(&mut self) {
        self.journal = None;
    }

    /// Undoes every write made since `checkpoint`, newest first.
    fn revert(&mut self, checkpoint: Checkpoint) {
        let journal = self.journal.take().unwrap_or_default();
        for entry in journal.into_iter().rev() {
            match entry {
                JournalEntry::Balance {
                    who,
                    previous: Some(amount),
                } => {
                    self.balances.insert(who, amount);
                }
                JournalEntry::Balance {
                    who,
                    previous: None,
                } => {
                    self.balances.remove(&who);
                }
                JournalEntry::Issued {
                    collection,
                    token_id,
                    to,
                } => {
                    self.owners.remove(&(collection, token_id));
                    if let Entry::Occupied(mut held) = self.holdings.entry((collection, to)) {
                        if *held.get() <= 1 {
                            held.remove();
                        } else {
                            *held.get_mut() -= 1;
                        }
                    }
                }
            }
        }
        self.events.truncate(checkpoint.events);
    }
}

impl ValueTransfer for HostState {
    fn balance_of(&self, who: Address) -> U256 {
        self.balances.get(&who).copied().unwrap_or_default()
    }

    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), ProviderError> {
        if amount.is_zero() || from == to {
            return Ok(());
        }
        let have = self.balance_of(from);
        if have < amount {
            return Err(ProviderError::InsufficientBalance {
                account: from,
                have,
                need: amount,
            });
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(ProviderError::Overflow(to))?;
        self.set_balance(from, have - amount);
        self.set_balance(to, credited);
        Ok(())
    }
}

impl TokenIssuer for HostState {
    fn issue(
        &mut self,
        collection: Address,
        to: Address,
        token_id: TokenId,
    ) -> Result<(), ProviderError> {
        if self.owners.contains_key(&(collection, token_id)) {
            return Err(ProviderError::TokenExists { collection, token_id });
        }
        self.owners.insert((collection, token_id), to);
        *self.holdings.entry((collection, to)).or_default() += 1;
        self.record(JournalEntry::Issued {
            collection,
            token_id,
            to,
        });
        Ok(())
    }
}

impl EventSink for HostState {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

// ============================================================================
// LocalChain
// ============================================================================

/// An in-process chain executing one call at a time.
///
/// Every call runs against a copy of the target contract and a journaled
/// view of the host state. The contract copy replaces the live one only when
/// the call returns `Ok`; any error rolls back every change the call made,
/// including the value attached to it.
///
/// # Example
///
/// ```
/// use pass_mint::chain::{ChainId, LocalChain, ManualClock};
/// use std::sync::Arc;
///
/// let clock = ManualClock::new(1_700_000_000);
/// let chain = LocalChain::with_clock(ChainId::new(31337), Arc::new(clock));
/// assert_eq!(chain.now(), 1_700_000_000);
/// ```
pub struct LocalChain {
    chain_id: ChainId,
    clock: Arc<dyn Clock>,
    state: HostState,
}

impl LocalChain {
    /// Creates a chain driven by the system clock.
    pub fn new(chain_id: ChainId) -> Self {
        Self::with_clock(chain_id, Arc::new(SystemClock))
    }

    /// Creates a chain driven by `clock`.
    pub fn with_clock(chain_id: ChainId, clock: Arc<dyn Clock>) -> Self {
        Self {
            chain_id,
            clock,
            state: HostState::default(),
        }
    }

    /// Creates a chain from configuration.
    pub fn from_config(config: &ChainConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_clock(config.chain_id, clock)
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Returns the timestamp the next call will observe.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Read-only view of balances, ownership and events.
    pub fn state(&self) -> &HostState {
        &self.state
    }

    pub fn balance_of(&self, who: Address) -> U256 {
        self.state.balance_of(who)
    }

    /// Credits `amount` of freshly created native value to `who`.
    pub fn fund(&mut self, who: Address, amount: U256) -> Result<(), ProviderError> {
        self.state.credit(who, amount)
    }

    /// Removes and returns the events of every committed call so far.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.state.events)
    }

    /// Executes `f` as `caller` against `contract`, attaching `value`.
    ///
    /// The attached value moves from `caller` to the contract before `f`
    /// runs. If either the move or `f` fails, neither the host state nor
    /// `contract` change.
    pub fn call<C, T, E, F>(
        &mut self,
        contract: &mut C,
        caller: Address,
        value: U256,
        f: F,
    ) -> Result<T, E>
    where
        C: Contract + Clone,
        E: From<ProviderError>,
        F: FnOnce(&mut C, &CallContext, &mut HostState) -> Result<T, E>,
    {
        let ctx = CallContext {
            caller,
            value,
            timestamp: self.clock.now(),
            chain_id: self.chain_id.as_u64(),
        };
        let mut next = contract.clone();
        let checkpoint = self.state.checkpoint();

        let result = self
            .state
            .transfer(caller, next.address(), value)
            .map_err(E::from)
            .and_then(|()| f(&mut next, &ctx, &mut self.state));

        match result {
            Ok(output) => {
                self.state.commit();
                *contract = next;
                Ok(output)
            }
            Err(e) => {
                self.state.revert(checkpoint);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for LocalChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalChain")
            .field("chain_id", &self.chain_id)
            .field("now", &self.clock.now())
            .field("events", &self.state.events.len())
            .finish()
    }
}
