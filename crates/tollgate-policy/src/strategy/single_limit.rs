//! Liquidity protection with one fixed-window limit per account.

use alloy_primitives::Address;
use tollgate_core::error::GuardResult;
use tollgate_core::types::{GuardEvent, LimitSnapshot, LimitSpec, StrategyId, TimePoint, TransferRequest};

use super::{
    ensure_controller, ensure_governs, governed, protect_all, trace_decision, TransferPolicy,
};
use crate::context::ProtectionContext;
use crate::guardian::Guardian;
use crate::limits::{Limit, LimitLedger};

/// One rate limit per protected account.
#[derive(Debug, Clone)]
pub struct SingleLimitStrategy {
    id: StrategyId,
    controller: Address,
    limits: LimitLedger,
}

impl SingleLimitStrategy {
    /// Deploy a strategy that accepts admission calls from `controller`.
    #[must_use]
    pub fn new(id: StrategyId, controller: Address) -> Self {
        Self {
            id,
            controller,
            limits: LimitLedger::new(),
        }
    }

    /// Protect `account` with a single limit.
    ///
    /// # Errors
    ///
    /// See [`SingleLimitStrategy::set_limit_batched`].
    pub fn set_limit(
        &mut self,
        guardian: &Guardian,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        account: Address,
        spec: LimitSpec,
    ) -> GuardResult<()> {
        self.set_limit_batched(guardian, cx, caller, token, &[account], spec)
    }

    /// Protect every account in `accounts` with the same limit, replacing
    /// any previous one.
    ///
    /// # Errors
    ///
    /// [`NotProtectionAdmin`](tollgate_core::GuardError::NotProtectionAdmin)
    /// unless `caller` is the protection admin of `token`, or any error of
    /// [`Guardian::check_protectable`]. Nothing is written on error.
    pub fn set_limit_batched(
        &mut self,
        guardian: &Guardian,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        accounts: &[Address],
        spec: LimitSpec,
    ) -> GuardResult<()> {
        guardian.ensure_protection_admin(caller, token)?;
        let responsible = vec![self.id; accounts.len()];
        protect_all(guardian, cx, self.id, token, accounts, &responsible)?;

        for &account in accounts {
            self.limits.set(token, account, vec![Limit::new(spec)]);
            tracing::info!(
                strategy = %self.id,
                %token,
                %account,
                cap = %spec.cap,
                window = spec.window,
                "limit set"
            );
            cx.events.push(GuardEvent::LimitsSet {
                strategy: self.id,
                token,
                account,
                count: 1,
            });
        }
        Ok(())
    }

    /// Drop the limits of `accounts` and release their protection.
    ///
    /// # Errors
    ///
    /// `NotProtectionAdmin` unless `caller` is the protection admin of
    /// `token`.
    pub fn remove_limits(
        &mut self,
        guardian: &Guardian,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        accounts: &[Address],
    ) -> GuardResult<()> {
        guardian.ensure_protection_admin(caller, token)?;
        let owned = governed(cx, self.id, token, accounts);
        guardian.remove_protected_addresses(cx, self.id, token, &owned)?;

        for &account in accounts {
            if let Some(event) = self.release(token, account) {
                cx.events.push(event);
            }
        }
        Ok(())
    }

    fn release(&mut self, token: Address, account: Address) -> Option<GuardEvent> {
        self.limits.remove(token, account)?;
        tracing::info!(strategy = %self.id, %token, %account, "limits removed");
        Some(GuardEvent::LimitsRemoved {
            strategy: self.id,
            token,
            account,
        })
    }

    /// Block every outbound transfer of `account` until unpaused.
    ///
    /// # Errors
    ///
    /// `NotProtectionAdmin`, `NotProtected` unless this strategy governs the
    /// account, `AlreadyPaused`.
    pub fn pause(
        &mut self,
        guardian: &Guardian,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        account: Address,
    ) -> GuardResult<()> {
        guardian.ensure_protection_admin(caller, token)?;
        ensure_governs(cx, self.id, token, account)?;
        self.limits.pause(token, account, cx.now)?;
        tracing::info!(strategy = %self.id, %token, %account, "account paused");
        cx.events.push(GuardEvent::Paused { token, account });
        Ok(())
    }

    /// Lift a pause.
    ///
    /// # Errors
    ///
    /// `NotProtectionAdmin`, `NotProtected`, `NotPaused`.
    pub fn unpause(
        &mut self,
        guardian: &Guardian,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        account: Address,
    ) -> GuardResult<()> {
        guardian.ensure_protection_admin(caller, token)?;
        ensure_governs(cx, self.id, token, account)?;
        self.limits.unpause(token, account)?;
        tracing::info!(strategy = %self.id, %token, %account, "account unpaused");
        cx.events.push(GuardEvent::Unpaused { token, account });
        Ok(())
    }

    /// The limit of `account` as observed at `now`. Rollover is reported,
    /// not stored.
    #[must_use]
    pub fn get_limit(&self, token: Address, account: Address, now: TimePoint) -> Option<LimitSnapshot> {
        self.limits.snapshot(token, account, 0, now)
    }

    /// Returns `true` if `account` is paused.
    #[must_use]
    pub fn is_paused(&self, token: Address, account: Address) -> bool {
        self.limits.is_paused(token, account)
    }
}

impl TransferPolicy for SingleLimitStrategy {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn check_transfer(
        &self,
        caller: Address,
        request: &TransferRequest,
        now: TimePoint,
    ) -> GuardResult<()> {
        ensure_controller(self.controller, caller)?;
        let result = self
            .limits
            .check(request.token, request.from, request.amount, now);
        trace_decision(self.id, request, &result);
        result
    }

    fn commit_transfer(&mut self, request: &TransferRequest, now: TimePoint) {
        self.limits
            .charge(request.token, request.from, request.amount, now);
    }
}
