//! Two-phase refunds of frozen balances.
//!
//! A refund key is `keccak256(token ‖ from ‖ to ‖ salt)`. Its lifecycle is
//! `NONE -> PROPOSED -> NONE`: the refund admin proposes while `from` is
//! frozen, then either cancels or, once the timelock has elapsed, executes.
//! Execution moves the whole balance of `from` to `to`.

use alloy_primitives::{keccak256, Address, B256, U256};
use tollgate_core::error::{GuardError, GuardResult, TollgateError};
use tollgate_core::types::{EventLog, GuardEvent, TimePoint};

use super::Guardian;
use crate::context::ProtectionContext;

impl Guardian {
    /// Deterministic refund key for `(token, from, to, salt)`.
    #[must_use]
    pub fn hash_operation(token: Address, from: Address, to: Address, salt: B256) -> B256 {
        let mut preimage = [0u8; 92];
        preimage[..20].copy_from_slice(token.as_slice());
        preimage[20..40].copy_from_slice(from.as_slice());
        preimage[40..60].copy_from_slice(to.as_slice());
        preimage[60..].copy_from_slice(salt.as_slice());
        keccak256(preimage)
    }

    /// Current refund delay, in clock units.
    #[must_use]
    pub const fn timelock_period(&self) -> u64 {
        self.timelock_period
    }

    /// Whether execution waits for the timelock.
    #[must_use]
    pub const fn enforces_timelock(&self) -> bool {
        self.enforce_timelock
    }

    /// Change the refund delay.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotAdmin`] unless `caller` is the admin.
    pub fn set_timelock_period(
        &mut self,
        caller: Address,
        period: u64,
        events: &mut EventLog,
    ) -> GuardResult<()> {
        self.ensure_admin(caller)?;
        self.timelock_period = period;
        tracing::info!(period, "timelock period set");
        events.push(GuardEvent::TimelockPeriodSet { period });
        Ok(())
    }

    /// When the live proposal `id` was made.
    #[must_use]
    pub fn refund_proposed_at(&self, id: B256) -> Option<TimePoint> {
        self.refunds.get(&id).copied()
    }

    /// Earliest time the live proposal `id` may be executed.
    #[must_use]
    pub fn refund_ready_at(&self, id: B256) -> Option<TimePoint> {
        self.refund_proposed_at(id)
            .map(|at| at.saturating_add(self.timelock_period))
    }

    fn ensure_refund_admin(&self, caller: Address, token: Address) -> GuardResult<()> {
        if self.refund_admin(token) == Some(caller) {
            Ok(())
        } else {
            Err(GuardError::NotRefundAdmin)
        }
    }

    /// Propose moving the balance of frozen `from` to `to`.
    ///
    /// Returns the refund key.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotRefundAdmin`], [`GuardError::AddressNotFrozen`] if
    /// `from` is not frozen, [`GuardError::RefundAlreadyProposed`] if the key
    /// is live.
    pub fn propose_refund(
        &mut self,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        from: Address,
        to: Address,
        salt: B256,
    ) -> GuardResult<B256> {
        self.ensure_refund_admin(caller, token)?;
        if !cx.controller.is_frozen(token, from) {
            return Err(GuardError::AddressNotFrozen);
        }
        let id = Self::hash_operation(token, from, to, salt);
        if self.refunds.contains_key(&id) {
            return Err(GuardError::RefundAlreadyProposed);
        }

        self.refunds.insert(id, cx.now);
        tracing::info!(%token, %from, %to, %id, "refund proposed");
        cx.events.push(GuardEvent::RefundProposed {
            id,
            proposed_at: cx.now,
        });
        Ok(id)
    }

    /// Withdraw a live proposal.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotRefundAdmin`], [`GuardError::RefundNotFound`].
    pub fn cancel_refund_proposal(
        &mut self,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        from: Address,
        to: Address,
        salt: B256,
    ) -> GuardResult<()> {
        self.ensure_refund_admin(caller, token)?;
        let id = Self::hash_operation(token, from, to, salt);
        if self.refunds.remove(&id).is_none() {
            return Err(GuardError::RefundNotFound);
        }
        tracing::info!(%token, %from, %to, %id, "refund canceled");
        cx.events.push(GuardEvent::RefundCanceled { id });
        Ok(())
    }

    /// Move the whole balance of `from` to `to` and retire the proposal.
    ///
    /// The proposal is retired before the ledger is called; if the ledger
    /// fails the proposal is restored.
    ///
    /// Returns the amount moved.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotRefundAdmin`], [`GuardError::RefundNotFound`],
    /// [`GuardError::TimelockNotElapsed`] while the delay is running, or the
    /// ledger's error.
    pub fn execute_refund(
        &mut self,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        from: Address,
        to: Address,
        salt: B256,
    ) -> Result<U256, TollgateError> {
        self.ensure_refund_admin(caller, token)?;
        let id = Self::hash_operation(token, from, to, salt);
        let proposed_at = self
            .refunds
            .get(&id)
            .copied()
            .ok_or(GuardError::RefundNotFound)?;

        let ready_at = proposed_at.saturating_add(self.timelock_period);
        if self.enforce_timelock && cx.now < ready_at {
            return Err(GuardError::TimelockNotElapsed { ready_at }.into());
        }

        self.refunds.remove(&id);
        let amount = cx.ledger.balance_of(token, from);
        if let Err(err) = cx.ledger.transfer(token, from, to, amount) {
            self.refunds.insert(id, proposed_at);
            tracing::warn!(%token, %from, %to, %id, error = %err, "refund transfer failed");
            return Err(err.into());
        }

        tracing::info!(%token, %from, %to, %id, %amount, "refund executed");
        cx.events.push(GuardEvent::RefundExecuted {
            id,
            token,
            from,
            to,
            amount,
        });
        Ok(amount)
    }
}
