//! Treasury protection: outbound transfers only to approved destinations.

use std::collections::{BTreeSet, HashMap};

use alloy_primitives::{Address, U256};
use tollgate_core::error::{GuardError, GuardResult};
use tollgate_core::types::{GuardEvent, StrategyId, TimePoint, TransferRequest};

use super::{ensure_controller, governed, protect_all, trace_decision, TransferPolicy};
use crate::context::ProtectionContext;
use crate::guardian::Guardian;

/// Destination whitelist per protected account.
///
/// Admission ignores amount and time entirely.
#[derive(Debug, Clone)]
pub struct TreasuryStrategy {
    id: StrategyId,
    controller: Address,
    whitelists: HashMap<(Address, Address), BTreeSet<Address>>,
}

impl TreasuryStrategy {
    /// Deploy a strategy that accepts admission calls from `controller`.
    #[must_use]
    pub fn new(id: StrategyId, controller: Address) -> Self {
        Self {
            id,
            controller,
            whitelists: HashMap::new(),
        }
    }

    /// Protect `account` and add `destinations` to its whitelist. Existing
    /// entries are kept.
    ///
    /// # Errors
    ///
    /// `NotProtectionAdmin` unless `caller` is the protection admin of
    /// `token`, or any error of [`Guardian::check_protectable`].
    pub fn set_protected_address(
        &mut self,
        guardian: &Guardian,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        account: Address,
        destinations: &[Address],
    ) -> GuardResult<()> {
        guardian.ensure_protection_admin(caller, token)?;
        protect_all(guardian, cx, self.id, token, &[account], &[self.id])?;

        let whitelist = self.whitelists.entry((token, account)).or_default();
        let before = whitelist.len();
        whitelist.extend(destinations.iter().copied());
        let added = whitelist.len() - before;

        tracing::info!(strategy = %self.id, %token, %account, added, "whitelist extended");
        cx.events.push(GuardEvent::WhitelistExtended {
            token,
            account,
            added,
        });
        Ok(())
    }

    /// Protect `accounts[i]` under `responsible[i]`.
    ///
    /// `amounts` is accepted for compatibility with older callers and only
    /// checked for length. Whitelists are left as they are, except that an
    /// account handed to another strategy loses its whitelist here.
    ///
    /// # Errors
    ///
    /// [`GuardError::LengthMismatch`] if the lists differ in length,
    /// otherwise as [`TreasuryStrategy::set_protected_address`].
    pub fn set_guarded_list(
        &mut self,
        guardian: &Guardian,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        accounts: &[Address],
        amounts: &[U256],
        responsible: &[StrategyId],
    ) -> GuardResult<()> {
        guardian.ensure_protection_admin(caller, token)?;
        if accounts.len() != amounts.len() {
            return Err(GuardError::length_mismatch(accounts.len(), amounts.len()));
        }
        if accounts.len() != responsible.len() {
            return Err(GuardError::length_mismatch(accounts.len(), responsible.len()));
        }
        protect_all(guardian, cx, self.id, token, accounts, responsible)?;

        for (&account, &strategy) in accounts.iter().zip(responsible) {
            if strategy != self.id {
                if let Some(event) = self.release(token, account) {
                    cx.events.push(event);
                }
            }
        }
        Ok(())
    }

    /// Clear the whitelists of `accounts` and release the protection this
    /// strategy holds on them.
    ///
    /// # Errors
    ///
    /// `NotProtectionAdmin` unless `caller` is the protection admin of
    /// `token`.
    pub fn remove_protected_addresses(
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
        self.whitelists.remove(&(token, account))?;
        tracing::info!(strategy = %self.id, %token, %account, "whitelist cleared");
        Some(GuardEvent::WhitelistCleared {
            strategy: self.id,
            token,
            account,
        })
    }

    /// The approved destinations of `account`, in address order.
    #[must_use]
    pub fn whitelist(&self, token: Address, account: Address) -> Vec<Address> {
        self.whitelists
            .get(&(token, account))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns `true` if `account` may send to `destination`.
    #[must_use]
    pub fn is_whitelisted(&self, token: Address, account: Address, destination: Address) -> bool {
        self.whitelists
            .get(&(token, account))
            .is_some_and(|set| set.contains(&destination))
    }
}

impl TransferPolicy for TreasuryStrategy {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn check_transfer(
        &self,
        caller: Address,
        request: &TransferRequest,
        _now: TimePoint,
    ) -> GuardResult<()> {
        ensure_controller(self.controller, caller)?;
        let result = if self.is_whitelisted(request.token, request.from, request.to) {
            Ok(())
        } else {
            Err(GuardError::RecipientNotWhitelisted)
        };
        trace_decision(self.id, request, &result);
        result
    }

    fn commit_transfer(&mut self, _request: &TransferRequest, _now: TimePoint) {}
}
