//! Liquidity protection with stacked limits.
//!
//! Each protected account carries an ordered list of limits, typically a
//! short window with a small cap and a long window with a larger one. A
//! transfer is admitted only if every limit admits it, and each limit rolls
//! over on its own schedule.

use alloy_primitives::Address;
use tollgate_core::error::{GuardError, GuardResult};
use tollgate_core::types::{
    GuardEvent, LimitSnapshot, LimitSpec, StrategyId, TimePoint, TransferRequest,
};

use super::{
    ensure_controller, ensure_governs, governed, protect_all, trace_decision, TransferPolicy,
};
use crate::context::ProtectionContext;
use crate::guardian::Guardian;
use crate::limits::{Limit, LimitLedger};

/// Several rate limits per protected account, combined with logical AND.
#[derive(Debug, Clone)]
pub struct MultiLimitStrategy {
    id: StrategyId,
    controller: Address,
    limits: LimitLedger,
}

#[derive(Clone, Copy)]
enum Write {
    Append,
    Replace,
}

impl MultiLimitStrategy {
    /// Deploy a strategy that accepts admission calls from `controller`.
    #[must_use]
    pub fn new(id: StrategyId, controller: Address) -> Self {
        Self {
            id,
            controller,
            limits: LimitLedger::new(),
        }
    }

    /// Append `specs` to the limits of every account in `accounts` and
    /// protect them under this strategy.
    ///
    /// # Errors
    ///
    /// `NotProtectionAdmin` unless `caller` is the protection admin of
    /// `token`, or any error of [`Guardian::check_protectable`].
    pub fn add_limits(
        &mut self,
        guardian: &Guardian,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        accounts: &[Address],
        specs: &[LimitSpec],
    ) -> GuardResult<()> {
        let responsible = vec![self.id; accounts.len()];
        self.configure(guardian, cx, caller, token, accounts, specs, &responsible, Write::Append)
    }

    /// Replace the limits of every account in `accounts` with `specs`.
    ///
    /// # Errors
    ///
    /// Same as [`MultiLimitStrategy::add_limits`].
    pub fn set_limits(
        &mut self,
        guardian: &Guardian,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        accounts: &[Address],
        specs: &[LimitSpec],
    ) -> GuardResult<()> {
        let responsible = vec![self.id; accounts.len()];
        self.configure(guardian, cx, caller, token, accounts, specs, &responsible, Write::Replace)
    }

    /// Protect `accounts[i]` under `responsible[i]`, replacing its limits
    /// with `specs` when this strategy is the one responsible.
    ///
    /// Handing an account to another strategy moves it out of this one,
    /// which is how accounts migrate between liquidity and treasury control.
    ///
    /// # Errors
    ///
    /// [`GuardError::LengthMismatch`] if `responsible` does not match
    /// `accounts`, otherwise as [`MultiLimitStrategy::add_limits`].
    pub fn set_guarded_list(
        &mut self,
        guardian: &Guardian,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        accounts: &[Address],
        specs: &[LimitSpec],
        responsible: &[StrategyId],
    ) -> GuardResult<()> {
        self.configure(guardian, cx, caller, token, accounts, specs, responsible, Write::Replace)
    }

    #[allow(clippy::too_many_arguments)]
    fn configure(
        &mut self,
        guardian: &Guardian,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        accounts: &[Address],
        specs: &[LimitSpec],
        responsible: &[StrategyId],
        write: Write,
    ) -> GuardResult<()> {
        guardian.ensure_protection_admin(caller, token)?;
        if accounts.len() != responsible.len() {
            return Err(GuardError::length_mismatch(accounts.len(), responsible.len()));
        }
        protect_all(guardian, cx, self.id, token, accounts, responsible)?;

        for (&account, &strategy) in accounts.iter().zip(responsible) {
            if strategy != self.id {
                if let Some(event) = self.release(token, account) {
                    cx.events.push(event);
                }
                continue;
            }
            let fresh = specs.iter().copied().map(Limit::new);
            match write {
                Write::Append => self.limits.extend(token, account, fresh),
                Write::Replace => self.limits.set(token, account, fresh.collect()),
            }
            tracing::info!(
                strategy = %self.id,
                %token,
                %account,
                count = specs.len(),
                "limits set"
            );
            cx.events.push(GuardEvent::LimitsSet {
                strategy: self.id,
                token,
                account,
                count: specs.len(),
            });
        }
        Ok(())
    }

    /// Drop every limit of `accounts`, pause marker included, and release
    /// the protection this strategy holds on them.
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

    /// Append a zero-capacity entry that blocks `account` until unpaused.
    /// The configured limits are left as they are.
    ///
    /// # Errors
    ///
    /// `NotProtectionAdmin`, `NotProtected`, `AlreadyPaused`.
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

    /// Drop the pause entry.
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

    /// Number of entries for `account`, pause entry included.
    #[must_use]
    pub fn limits_len(&self, token: Address, account: Address) -> usize {
        self.limits.len(token, account)
    }

    /// The entry at `index` as observed at `now`.
    ///
    /// # Errors
    ///
    /// [`GuardError::LimitIndexOutOfRange`] if there is no such entry.
    pub fn limit(
        &self,
        token: Address,
        account: Address,
        index: usize,
        now: TimePoint,
    ) -> GuardResult<LimitSnapshot> {
        self.limits
            .snapshot(token, account, index, now)
            .ok_or(GuardError::LimitIndexOutOfRange {
                index,
                len: self.limits.len(token, account),
            })
    }

    /// Every entry for `account` as observed at `now`.
    #[must_use]
    pub fn limits(&self, token: Address, account: Address, now: TimePoint) -> Vec<LimitSnapshot> {
        self.limits.snapshots(token, account, now)
    }

    /// Returns `true` if `account` is paused.
    #[must_use]
    pub fn is_paused(&self, token: Address, account: Address) -> bool {
        self.limits.is_paused(token, account)
    }
}

impl TransferPolicy for MultiLimitStrategy {
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
