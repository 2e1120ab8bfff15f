//! In-memory [`Controller`] and [`TokenLedger`] implementations.
//!
//! Used by the engine's tests and by hosts that keep all state in process.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, U256};

use crate::error::{GuardError, GuardResult, LedgerError};
use crate::interfaces::{Controller, TokenLedger};
use crate::types::StrategyId;

type Key = (Address, Address);

/// A controller keeping protection marks, freeze flags, and thresholds in
/// hash maps.
#[derive(Debug, Clone)]
pub struct InMemoryController {
    id: Address,
    admin: Address,
    guardian: Option<Address>,
    protected: HashMap<Key, StrategyId>,
    frozen: HashSet<Key>,
    thresholds: HashMap<Key, U256>,
}

impl InMemoryController {
    /// Create a controller with identity `id`, administered by `admin`.
    #[must_use]
    pub fn new(id: Address, admin: Address) -> Self {
        Self {
            id,
            admin,
            guardian: None,
            protected: HashMap::new(),
            frozen: HashSet::new(),
            thresholds: HashMap::new(),
        }
    }

    /// The controller's administrator.
    #[must_use]
    pub const fn admin(&self) -> Address {
        self.admin
    }

    /// Register the guardian allowed to mutate protection state.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::NotAdmin`] unless `caller` is the admin.
    pub fn set_guardian(&mut self, caller: Address, guardian: Address) -> GuardResult<()> {
        if caller != self.admin {
            return Err(GuardError::NotAdmin);
        }
        self.guardian = Some(guardian);
        tracing::info!(%guardian, "controller guardian set");
        Ok(())
    }

    fn ensure_guardian(&self, caller: Address) -> GuardResult<()> {
        if self.guardian == Some(caller) {
            Ok(())
        } else {
            Err(GuardError::NotGuardian)
        }
    }
}

impl Controller for InMemoryController {
    fn id(&self) -> Address {
        self.id
    }

    fn guardian(&self) -> Option<Address> {
        self.guardian
    }

    fn protected_strategy(&self, token: Address, account: Address) -> Option<StrategyId> {
        self.protected.get(&(token, account)).copied()
    }

    fn set_protected_address(
        &mut self,
        caller: Address,
        token: Address,
        account: Address,
        strategy: StrategyId,
    ) -> GuardResult<()> {
        self.ensure_guardian(caller)?;
        self.protected.insert((token, account), strategy);
        Ok(())
    }

    fn remove_protected_address(
        &mut self,
        caller: Address,
        token: Address,
        account: Address,
    ) -> GuardResult<()> {
        self.ensure_guardian(caller)?;
        self.protected.remove(&(token, account));
        Ok(())
    }

    fn is_frozen(&self, token: Address, account: Address) -> bool {
        self.frozen.contains(&(token, account))
    }

    fn freeze(&mut self, token: Address, account: Address) {
        self.frozen.insert((token, account));
    }

    fn unfreeze(&mut self, caller: Address, token: Address, account: Address) -> GuardResult<()> {
        self.ensure_guardian(caller)?;
        self.frozen.remove(&(token, account));
        Ok(())
    }

    fn freeze_threshold(&self, token: Address, account: Address) -> Option<U256> {
        self.thresholds.get(&(token, account)).copied()
    }

    fn set_freeze_threshold(
        &mut self,
        caller: Address,
        token: Address,
        account: Address,
        threshold: Option<U256>,
    ) -> GuardResult<()> {
        self.ensure_guardian(caller)?;
        match threshold {
            Some(value) => {
                self.thresholds.insert((token, account), value);
            }
            None => {
                self.thresholds.remove(&(token, account));
            }
        }
        Ok(())
    }
}

/// A token ledger keeping balances and token administrators in hash maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<Key, U256>,
    admins: HashMap<Address, Address>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` with its administrator.
    pub fn create_token(&mut self, token: Address, admin: Address) {
        self.admins.insert(token, admin);
    }

    /// Credit `amount` to `account`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BalanceOverflow`] if the balance would overflow.
    pub fn mint(&mut self, token: Address, account: Address, amount: U256) -> Result<(), LedgerError> {
        let balance = self.balances.entry((token, account)).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        Ok(())
    }
}

impl TokenLedger for InMemoryLedger {
    fn token_admin(&self, token: Address) -> Option<Address> {
        self.admins.get(&token).copied()
    }

    fn balance_of(&self, token: Address, account: Address) -> U256 {
        self.balances
            .get(&(token, account))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let from_balance = self.balance_of(token, from);
        if from_balance < amount {
            return Err(LedgerError::insufficient_balance(from_balance, amount));
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(token, to)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;

        self.balances.insert((token, from), from_balance - amount);
        self.balances.insert((token, to), to_balance);
        Ok(())
    }
}
