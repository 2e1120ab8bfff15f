//! Entry points of the threshold-based guardian, kept for older hosts.
//!
//! They translate into the current role model: the guard admin is the
//! protection admin, and thresholds are stored on the controller that
//! enforces them. Nothing here keeps state of its own.

use alloy_primitives::{Address, U256};
use tollgate_core::error::{GuardError, GuardResult};
use tollgate_core::interfaces::Controller;
use tollgate_core::types::GuardEvent;

use super::Guardian;
use crate::context::ProtectionContext;

impl Guardian {
    /// Appoint the guard admin of `token`.
    ///
    /// Unlike [`Guardian::set_protection_admin`], the token need not be
    /// verified.
    ///
    /// # Errors
    ///
    /// [`GuardError::Unauthorized`] unless `caller` is the token's admin on
    /// the ledger.
    pub fn set_guard_admin(
        &mut self,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        admin: Address,
    ) -> GuardResult<()> {
        if cx.ledger.token_admin(token) != Some(caller) {
            return Err(GuardError::Unauthorized);
        }
        self.protection_admins.insert(token, admin);
        tracing::info!(%token, %admin, "guard admin set");
        cx.events.push(GuardEvent::ProtectionAdminSet { token, admin });
        Ok(())
    }

    /// Set outflow thresholds for `accounts`. A transfer above its sender's
    /// threshold freezes the recipient.
    ///
    /// # Errors
    ///
    /// [`GuardError::Unauthorized`] unless `caller` is the guard admin,
    /// [`GuardError::LengthMismatch`] if the lists differ in length,
    /// [`GuardError::NotGuardian`] if the controller does not accept this
    /// guardian.
    pub fn set_guarded_list(
        &self,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        accounts: &[Address],
        thresholds: &[U256],
    ) -> GuardResult<()> {
        self.ensure_protection_admin(caller, token)
            .map_err(|_| GuardError::Unauthorized)?;
        if accounts.len() != thresholds.len() {
            return Err(GuardError::length_mismatch(accounts.len(), thresholds.len()));
        }
        self.ensure_registered(&*cx.controller)?;

        for (&account, &threshold) in accounts.iter().zip(thresholds) {
            cx.controller
                .set_freeze_threshold(self.id, token, account, Some(threshold))?;
            tracing::info!(%token, %account, %threshold, "guard threshold set");
        }
        Ok(())
    }

    /// Returns `false` if `amount` exceeds the threshold of `account`.
    #[must_use]
    pub fn is_transfer_allowed_legacy(
        controller: &dyn Controller,
        token: Address,
        account: Address,
        amount: U256,
    ) -> bool {
        controller
            .freeze_threshold(token, account)
            .map_or(true, |threshold| amount <= threshold)
    }
}
