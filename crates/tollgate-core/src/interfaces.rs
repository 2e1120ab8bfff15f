//! Collaborator traits implemented by the host.
//!
//! The engine does not store balances or run the transfer hook itself. It
//! talks to two collaborators:
//!
//! - [`Controller`] - the transfer hook that keeps the protection map and
//!   freeze flags, and only accepts protection changes from its guardian
//! - [`TokenLedger`] - balances, token administrators, and value movement
//!
//! These traits are defined here to avoid circular dependencies between the
//! policy crate and the host implementations.

use alloy_primitives::{Address, U256};

use crate::error::{GuardResult, LedgerError};
use crate::types::StrategyId;

/// The host's transfer hook.
///
/// Mutating callbacks take the `caller` explicitly and must reject anyone
/// other than the registered guardian with
/// [`GuardError::NotGuardian`](crate::error::GuardError::NotGuardian).
pub trait Controller {
    /// Identity the controller uses when invoking strategy hooks.
    fn id(&self) -> Address;

    /// The guardian currently allowed to mutate protection state.
    fn guardian(&self) -> Option<Address>;

    /// The strategy responsible for `account` on `token`, if protected.
    fn protected_strategy(&self, token: Address, account: Address) -> Option<StrategyId>;

    /// Returns `true` if `account` is protected on `token`.
    fn is_address_protected(&self, token: Address, account: Address) -> bool {
        self.protected_strategy(token, account).is_some()
    }

    /// Mark `account` as protected by `strategy`.
    ///
    /// # Errors
    ///
    /// Fails if `caller` is not the registered guardian.
    fn set_protected_address(
        &mut self,
        caller: Address,
        token: Address,
        account: Address,
        strategy: StrategyId,
    ) -> GuardResult<()>;

    /// Clear the protection mark for `account`.
    ///
    /// # Errors
    ///
    /// Fails if `caller` is not the registered guardian.
    fn remove_protected_address(
        &mut self,
        caller: Address,
        token: Address,
        account: Address,
    ) -> GuardResult<()>;

    /// Returns `true` if `account` is frozen on `token`.
    fn is_frozen(&self, token: Address, account: Address) -> bool;

    /// Freeze `account`. Invoked by the host's own transfer path.
    fn freeze(&mut self, token: Address, account: Address);

    /// Clear the freeze flag for `account`.
    ///
    /// # Errors
    ///
    /// Fails if `caller` is not the registered guardian.
    fn unfreeze(&mut self, caller: Address, token: Address, account: Address) -> GuardResult<()>;

    /// Outflow threshold above which a transfer from `account` freezes the
    /// recipient.
    fn freeze_threshold(&self, token: Address, account: Address) -> Option<U256>;

    /// Set or clear the outflow threshold for `account`.
    ///
    /// # Errors
    ///
    /// Fails if `caller` is not the registered guardian.
    fn set_freeze_threshold(
        &mut self,
        caller: Address,
        token: Address,
        account: Address,
        threshold: Option<U256>,
    ) -> GuardResult<()>;
}

/// The host's token ledger.
pub trait TokenLedger {
    /// The administrator of `token`, if the ledger knows the token.
    fn token_admin(&self, token: Address) -> Option<Address>;

    /// Current balance of `account`.
    fn balance_of(&self, token: Address, account: Address) -> U256;

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if `from` lacks the balance or `to` would
    /// overflow. A failed transfer leaves balances unchanged.
    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError>;
}
