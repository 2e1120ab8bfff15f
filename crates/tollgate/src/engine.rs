//! The composition root.
//!
//! [`Engine`] owns the guardian, the deployed strategies, the host's
//! controller and ledger, the clock, and the event log. Every call reads the
//! clock once and threads the resulting [`TimePoint`] through the guardian
//! and strategies.
//!
//! [`Engine::transfer`] plays the controller's transfer hook:
//!
//! 1. a frozen sender is rejected
//! 2. the sender's balance must cover the amount
//! 3. a protected sender is checked by its responsible strategy
//! 4. the ledger moves the value
//! 5. the responsible strategy is charged
//! 6. a sender over its legacy threshold freezes the recipient
//!
//! A strategy is only charged once the ledger has moved the value, so a
//! failed transfer never leaves a limit charged.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use tollgate_core::clock::Clock;
use tollgate_core::config::Config;
use tollgate_core::error::{ConfigError, GuardError, GuardResult, LedgerError, TollgateError};
use tollgate_core::interfaces::{Controller, TokenLedger};
use tollgate_core::types::{
    EventLog, GuardEvent, LimitSnapshot, StrategyId, TimePoint, TransferRequest,
};
use tollgate_policy::{
    Guardian, MultiLimitStrategy, ProtectionContext, SingleLimitStrategy, Strategy, StrategyKind,
    TransferPolicy, TreasuryStrategy,
};

use crate::journal::{EventJournal, JournalError};

/// A transfer guard wired to a host controller and ledger.
pub struct Engine<C, L> {
    guardian: Guardian,
    strategies: BTreeMap<StrategyId, Strategy>,
    controller: C,
    ledger: L,
    clock: Arc<dyn Clock>,
    events: EventLog,
}

impl<C: Controller, L: TokenLedger> Engine<C, L> {
    /// Assemble an engine from its parts.
    pub fn new(guardian: Guardian, controller: C, ledger: L, clock: Arc<dyn Clock>) -> Self {
        tracing::info!(
            guardian = %guardian.id(),
            controller = %controller.id(),
            time_base = %clock.time_base(),
            "engine created"
        );
        Self {
            guardian,
            strategies: BTreeMap::new(),
            controller,
            ledger,
            clock,
            events: EventLog::new(),
        }
    }

    /// Build an engine whose guardian follows `config`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] if the configuration is invalid or
    /// `clock` reports a different time base than `clock.time_base`.
    pub fn from_config(
        config: &Config,
        guardian_id: Address,
        admin: Address,
        controller: C,
        ledger: L,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if clock.time_base() != config.clock.time_base {
            return Err(ConfigError::invalid_value(
                "clock.time_base",
                format!(
                    "configured {} but the clock reports {}",
                    config.clock.time_base,
                    clock.time_base()
                ),
            ));
        }
        let guardian = Guardian::new(guardian_id, admin, &config.guardian);
        Ok(Self::new(guardian, controller, ledger, clock))
    }

    fn split(
        &mut self,
    ) -> (
        &mut Guardian,
        &mut BTreeMap<StrategyId, Strategy>,
        ProtectionContext<'_>,
    ) {
        let now = self.clock.now();
        (
            &mut self.guardian,
            &mut self.strategies,
            ProtectionContext::new(
                &mut self.controller,
                &mut self.ledger,
                &mut self.events,
                now,
            ),
        )
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The guardian registry.
    #[must_use]
    pub const fn guardian(&self) -> &Guardian {
        &self.guardian
    }

    /// The host controller.
    #[must_use]
    pub const fn controller(&self) -> &C {
        &self.controller
    }

    /// Mutable access to the host controller, for host-side setup such as
    /// registering the guardian.
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    /// The host ledger.
    #[must_use]
    pub const fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable access to the host ledger.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// The current time point.
    #[must_use]
    pub fn now(&self) -> TimePoint {
        self.clock.now()
    }

    /// Events of committed changes, oldest first.
    #[must_use]
    pub fn events(&self) -> &[GuardEvent] {
        self.events.events()
    }

    /// Remove and return the recorded events.
    pub fn drain_events(&mut self) -> Vec<GuardEvent> {
        self.events.drain()
    }

    /// Append the recorded events to `journal`, then forget them.
    ///
    /// Returns how many events were written. On error the events stay
    /// recorded.
    ///
    /// # Errors
    ///
    /// Any [`JournalError`] from the append.
    pub fn flush_events(&mut self, journal: &mut EventJournal) -> Result<usize, JournalError> {
        let count = self.events.events().len();
        if count == 0 {
            return Ok(0);
        }
        journal.append(self.events.events())?;
        self.events.drain();
        tracing::debug!(count, next_seq = journal.next_seq(), "events flushed");
        Ok(count)
    }

    /// Returns `true` if `account` is under protection on `token`.
    #[must_use]
    pub fn is_address_protected(&self, token: Address, account: Address) -> bool {
        self.controller.is_address_protected(token, account)
    }

    /// The strategy governing `account` on `token`.
    #[must_use]
    pub fn protected_strategy(&self, token: Address, account: Address) -> Option<StrategyId> {
        self.controller.protected_strategy(token, account)
    }

    /// Returns `true` if `account` is frozen on `token`.
    #[must_use]
    pub fn is_frozen(&self, token: Address, account: Address) -> bool {
        self.controller.is_frozen(token, account)
    }

    // ------------------------------------------------------------------------
    // Strategy registry
    // ------------------------------------------------------------------------

    /// Deploy `strategy` alongside this engine. Verifying it is still up to
    /// the guardian's admin.
    ///
    /// Returns its identity.
    pub fn register_strategy(&mut self, strategy: impl Into<Strategy>) -> StrategyId {
        let strategy = strategy.into();
        let id = strategy.id();
        tracing::info!(strategy = %id, kind = %strategy.kind(), "strategy registered");
        self.strategies.insert(id, strategy);
        id
    }

    /// Deploy a single-limit strategy answering to this engine's controller.
    pub fn deploy_single_limit(&mut self, id: StrategyId) -> StrategyId {
        let controller = self.controller.id();
        self.register_strategy(SingleLimitStrategy::new(id, controller))
    }

    /// Deploy a multi-limit strategy answering to this engine's controller.
    pub fn deploy_multi_limit(&mut self, id: StrategyId) -> StrategyId {
        let controller = self.controller.id();
        self.register_strategy(MultiLimitStrategy::new(id, controller))
    }

    /// Deploy a treasury strategy answering to this engine's controller.
    pub fn deploy_treasury(&mut self, id: StrategyId) -> StrategyId {
        let controller = self.controller.id();
        self.register_strategy(TreasuryStrategy::new(id, controller))
    }

    /// The deployed strategy `id`.
    #[must_use]
    pub fn strategy(&self, id: StrategyId) -> Option<&Strategy> {
        self.strategies.get(&id)
    }

    /// Run `f` against the single-limit strategy `id`.
    ///
    /// # Errors
    ///
    /// [`GuardError::UnknownStrategy`], [`GuardError::StrategyKindMismatch`],
    /// or whatever `f` returns.
    pub fn with_single_limit<R>(
        &mut self,
        id: StrategyId,
        f: impl FnOnce(&mut SingleLimitStrategy, &Guardian, &mut ProtectionContext<'_>) -> GuardResult<R>,
    ) -> GuardResult<R> {
        let (guardian, strategies, mut cx) = self.split();
        match strategies.get_mut(&id) {
            Some(Strategy::SingleLimit(strategy)) => f(strategy, &*guardian, &mut cx),
            Some(_) => Err(GuardError::kind_mismatch(id)),
            None => Err(GuardError::unknown_strategy(id)),
        }
    }

    /// Run `f` against the multi-limit strategy `id`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::with_single_limit`].
    pub fn with_multi_limit<R>(
        &mut self,
        id: StrategyId,
        f: impl FnOnce(&mut MultiLimitStrategy, &Guardian, &mut ProtectionContext<'_>) -> GuardResult<R>,
    ) -> GuardResult<R> {
        let (guardian, strategies, mut cx) = self.split();
        match strategies.get_mut(&id) {
            Some(Strategy::MultiLimit(strategy)) => f(strategy, &*guardian, &mut cx),
            Some(_) => Err(GuardError::kind_mismatch(id)),
            None => Err(GuardError::unknown_strategy(id)),
        }
    }

    /// Run `f` against the treasury strategy `id`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::with_single_limit`].
    pub fn with_treasury<R>(
        &mut self,
        id: StrategyId,
        f: impl FnOnce(&mut TreasuryStrategy, &Guardian, &mut ProtectionContext<'_>) -> GuardResult<R>,
    ) -> GuardResult<R> {
        let (guardian, strategies, mut cx) = self.split();
        match strategies.get_mut(&id) {
            Some(Strategy::Treasury(strategy)) => f(strategy, &*guardian, &mut cx),
            Some(_) => Err(GuardError::kind_mismatch(id)),
            None => Err(GuardError::unknown_strategy(id)),
        }
    }

    /// Pause `account` under the liquidity strategy `id`.
    ///
    /// # Errors
    ///
    /// [`GuardError::StrategyKindMismatch`] for a treasury strategy, otherwise
    /// as the strategy's `pause`.
    pub fn pause(
        &mut self,
        id: StrategyId,
        caller: Address,
        token: Address,
        account: Address,
    ) -> GuardResult<()> {
        let (guardian, strategies, mut cx) = self.split();
        match strategies.get_mut(&id) {
            Some(Strategy::SingleLimit(s)) => s.pause(guardian, &mut cx, caller, token, account),
            Some(Strategy::MultiLimit(s)) => s.pause(guardian, &mut cx, caller, token, account),
            Some(Strategy::Treasury(_)) => Err(GuardError::kind_mismatch(id)),
            None => Err(GuardError::unknown_strategy(id)),
        }
    }

    /// Lift a pause under the liquidity strategy `id`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::pause`].
    pub fn unpause(
        &mut self,
        id: StrategyId,
        caller: Address,
        token: Address,
        account: Address,
    ) -> GuardResult<()> {
        let (guardian, strategies, mut cx) = self.split();
        match strategies.get_mut(&id) {
            Some(Strategy::SingleLimit(s)) => s.unpause(guardian, &mut cx, caller, token, account),
            Some(Strategy::MultiLimit(s)) => s.unpause(guardian, &mut cx, caller, token, account),
            Some(Strategy::Treasury(_)) => Err(GuardError::kind_mismatch(id)),
            None => Err(GuardError::unknown_strategy(id)),
        }
    }

    /// Drop whatever strategy `id` keeps for `accounts` and release its
    /// protection on them.
    ///
    /// # Errors
    ///
    /// [`GuardError::UnknownStrategy`], or the strategy's error.
    pub fn remove_guards(
        &mut self,
        id: StrategyId,
        caller: Address,
        token: Address,
        accounts: &[Address],
    ) -> GuardResult<()> {
        let (guardian, strategies, mut cx) = self.split();
        match strategies.get_mut(&id) {
            Some(Strategy::SingleLimit(s)) => {
                s.remove_limits(guardian, &mut cx, caller, token, accounts)
            }
            Some(Strategy::MultiLimit(s)) => {
                s.remove_limits(guardian, &mut cx, caller, token, accounts)
            }
            Some(Strategy::Treasury(s)) => {
                s.remove_protected_addresses(guardian, &mut cx, caller, token, accounts)
            }
            None => Err(GuardError::unknown_strategy(id)),
        }
    }

    /// The limit at `index` that liquidity strategy `id` keeps for `account`,
    /// as observed now.
    ///
    /// # Errors
    ///
    /// [`GuardError::UnknownStrategy`], [`GuardError::StrategyKindMismatch`]
    /// for a treasury strategy, [`GuardError::LimitIndexOutOfRange`].
    pub fn limit(
        &self,
        id: StrategyId,
        token: Address,
        account: Address,
        index: usize,
    ) -> GuardResult<LimitSnapshot> {
        let now = self.clock.now();
        match self.strategies.get(&id) {
            Some(Strategy::SingleLimit(s)) => {
                let snapshot = s.get_limit(token, account, now);
                let len = usize::from(snapshot.is_some());
                snapshot
                    .filter(|_| index == 0)
                    .ok_or(GuardError::LimitIndexOutOfRange { index, len })
            }
            Some(Strategy::MultiLimit(s)) => s.limit(token, account, index, now),
            Some(Strategy::Treasury(_)) => Err(GuardError::kind_mismatch(id)),
            None => Err(GuardError::unknown_strategy(id)),
        }
    }

    // ------------------------------------------------------------------------
    // Guardian operations
    // ------------------------------------------------------------------------

    /// See [`Guardian::verify_token`].
    ///
    /// # Errors
    ///
    /// `NotAdmin`.
    pub fn verify_token(&mut self, caller: Address, token: Address) -> GuardResult<()> {
        self.guardian.verify_token(caller, token, &mut self.events)
    }

    /// See [`Guardian::remove_verified_token`].
    ///
    /// # Errors
    ///
    /// `NotAdmin`.
    pub fn remove_verified_token(&mut self, caller: Address, token: Address) -> GuardResult<()> {
        self.guardian
            .remove_verified_token(caller, token, &mut self.events)
    }

    /// See [`Guardian::verify_strategies`].
    ///
    /// # Errors
    ///
    /// `NotAdmin`.
    pub fn verify_strategies(
        &mut self,
        caller: Address,
        strategies: &[StrategyId],
    ) -> GuardResult<()> {
        self.guardian
            .verify_strategies(caller, strategies, &mut self.events)
    }

    /// See [`Guardian::remove_strategies`].
    ///
    /// # Errors
    ///
    /// `NotAdmin`.
    pub fn remove_strategies(
        &mut self,
        caller: Address,
        strategies: &[StrategyId],
    ) -> GuardResult<()> {
        self.guardian
            .remove_strategies(caller, strategies, &mut self.events)
    }

    /// See [`Guardian::verify_address`].
    ///
    /// # Errors
    ///
    /// `NotAdmin`.
    pub fn verify_address(
        &mut self,
        caller: Address,
        token: Address,
        account: Address,
        verified: bool,
    ) -> GuardResult<()> {
        self.guardian
            .verify_address(caller, token, account, verified, &mut self.events)
    }

    /// See [`Guardian::set_protection_admin`].
    ///
    /// # Errors
    ///
    /// `TokenNotVerified`, `NotTokenAdmin`.
    pub fn set_protection_admin(
        &mut self,
        caller: Address,
        token: Address,
        admin: Address,
    ) -> GuardResult<()> {
        let (guardian, _, mut cx) = self.split();
        guardian.set_protection_admin(&mut cx, caller, token, admin)
    }

    /// See [`Guardian::set_admins`].
    ///
    /// # Errors
    ///
    /// `TokenNotVerified`, `NotTokenAdmin`.
    pub fn set_admins(
        &mut self,
        caller: Address,
        token: Address,
        protection_admin: Address,
        refund_admin: Address,
    ) -> GuardResult<()> {
        let (guardian, _, mut cx) = self.split();
        guardian.set_admins(&mut cx, caller, token, protection_admin, refund_admin)
    }

    /// See [`Guardian::set_guard_admin`].
    ///
    /// # Errors
    ///
    /// `Unauthorized`.
    pub fn set_guard_admin(
        &mut self,
        caller: Address,
        token: Address,
        admin: Address,
    ) -> GuardResult<()> {
        let (guardian, _, mut cx) = self.split();
        guardian.set_guard_admin(&mut cx, caller, token, admin)
    }

    /// See [`Guardian::set_guarded_list`].
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `LengthMismatch`, `NotGuardian`.
    pub fn set_guarded_list(
        &mut self,
        caller: Address,
        token: Address,
        accounts: &[Address],
        thresholds: &[U256],
    ) -> GuardResult<()> {
        let (guardian, _, mut cx) = self.split();
        guardian.set_guarded_list(&mut cx, caller, token, accounts, thresholds)
    }

    /// Returns `false` if `amount` exceeds the legacy threshold of `account`.
    #[must_use]
    pub fn is_transfer_allowed_legacy(&self, token: Address, account: Address, amount: U256) -> bool {
        Guardian::is_transfer_allowed_legacy(&self.controller, token, account, amount)
    }

    /// See [`Guardian::unfreeze`].
    ///
    /// # Errors
    ///
    /// `NotProtectionAdmin`, `NotGuardian`.
    pub fn unfreeze(
        &mut self,
        caller: Address,
        token: Address,
        accounts: &[Address],
    ) -> GuardResult<()> {
        let (guardian, _, mut cx) = self.split();
        guardian.unfreeze(&mut cx, caller, token, accounts)
    }

    /// See [`Guardian::set_timelock_period`].
    ///
    /// # Errors
    ///
    /// `NotAdmin`.
    pub fn set_timelock_period(&mut self, caller: Address, period: u64) -> GuardResult<()> {
        self.guardian
            .set_timelock_period(caller, period, &mut self.events)
    }

    /// See [`Guardian::propose_refund`].
    ///
    /// # Errors
    ///
    /// `NotRefundAdmin`, `AddressNotFrozen`, `RefundAlreadyProposed`.
    pub fn propose_refund(
        &mut self,
        caller: Address,
        token: Address,
        from: Address,
        to: Address,
        salt: B256,
    ) -> GuardResult<B256> {
        let (guardian, _, mut cx) = self.split();
        guardian.propose_refund(&mut cx, caller, token, from, to, salt)
    }

    /// See [`Guardian::cancel_refund_proposal`].
    ///
    /// # Errors
    ///
    /// `NotRefundAdmin`, `RefundNotFound`.
    pub fn cancel_refund_proposal(
        &mut self,
        caller: Address,
        token: Address,
        from: Address,
        to: Address,
        salt: B256,
    ) -> GuardResult<()> {
        let (guardian, _, mut cx) = self.split();
        guardian.cancel_refund_proposal(&mut cx, caller, token, from, to, salt)
    }

    /// See [`Guardian::execute_refund`].
    ///
    /// Returns the amount moved.
    ///
    /// # Errors
    ///
    /// `NotRefundAdmin`, `RefundNotFound`, `TimelockNotElapsed`, or the
    /// ledger's error.
    pub fn execute_refund(
        &mut self,
        caller: Address,
        token: Address,
        from: Address,
        to: Address,
        salt: B256,
    ) -> Result<U256, TollgateError> {
        let (guardian, _, mut cx) = self.split();
        guardian.execute_refund(&mut cx, caller, token, from, to, salt)
    }

    // ------------------------------------------------------------------------
    // Transfers
    // ------------------------------------------------------------------------

    /// Move `request.amount` from `request.from` to `request.to`, subject to
    /// the guard.
    ///
    /// # Errors
    ///
    /// [`GuardError::AddressFrozen`] for a frozen sender,
    /// [`LedgerError::InsufficientBalance`], the responsible strategy's
    /// denial, or [`GuardError::UnknownStrategy`] if the account is governed
    /// by a strategy this engine does not host, or any ledger error. A
    /// rejected transfer changes nothing.
    pub fn transfer(&mut self, request: TransferRequest) -> Result<(), TollgateError> {
        let now = self.clock.now();
        let TransferRequest {
            token,
            from,
            to,
            amount,
        } = request;

        if self.controller.is_frozen(token, from) {
            tracing::warn!(%token, account = %from, "transfer from frozen account");
            return Err(GuardError::frozen(from).into());
        }

        let balance = self.ledger.balance_of(token, from);
        if balance < amount {
            return Err(LedgerError::insufficient_balance(balance, amount).into());
        }

        let responsible = self.controller.protected_strategy(token, from);
        if let Some(id) = responsible {
            self.strategies
                .get(&id)
                .ok_or(GuardError::unknown_strategy(id))?
                .check_transfer(self.controller.id(), &request, now)?;
        }

        self.ledger.transfer(token, from, to, amount)?;
        if let Some(strategy) = responsible.and_then(|id| self.strategies.get_mut(&id)) {
            strategy.commit_transfer(&request, now);
        }
        tracing::debug!(%token, %from, %to, %amount, "transfer completed");

        if !Guardian::is_transfer_allowed_legacy(&self.controller, token, from, amount) {
            self.controller.freeze(token, to);
            tracing::warn!(%token, %from, account = %to, %amount, "threshold exceeded, recipient frozen");
            self.events.push(GuardEvent::AccountFrozen { token, account: to });
        }
        Ok(())
    }

    /// Kind of the deployed strategy `id`.
    #[must_use]
    pub fn strategy_kind(&self, id: StrategyId) -> Option<StrategyKind> {
        self.strategies.get(&id).map(Strategy::kind)
    }
}
