//! The guardian registry.
//!
//! The [`Guardian`] is the single authority over:
//!
//! - which tokens and strategies are trusted
//! - per-token protection and refund admins
//! - which accounts may be put under protection
//! - the freeze/refund flow (see [`refund`])
//!
//! Protection records themselves live on the [`Controller`]; the guardian is
//! the only party the controller accepts them from. Every check of a batched
//! call runs before the first write, so a rejected call changes nothing.
//!
//! [`Controller`]: tollgate_core::interfaces::Controller

pub mod legacy;
pub mod refund;

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, B256};
use tollgate_core::config::GuardianConfig;
use tollgate_core::error::{GuardError, GuardResult};
use tollgate_core::interfaces::{Controller, TokenLedger};
use tollgate_core::types::{EventLog, GuardEvent, StrategyId, TimePoint};

use crate::context::ProtectionContext;

/// Central registry of trust relationships and roles.
#[derive(Debug, Clone)]
pub struct Guardian {
    id: Address,
    admin: Address,
    verified_tokens: HashSet<Address>,
    verified_strategies: HashSet<StrategyId>,
    verified_addresses: HashSet<(Address, Address)>,
    protection_admins: HashMap<Address, Address>,
    refund_admins: HashMap<Address, Address>,
    refunds: HashMap<B256, TimePoint>,
    timelock_period: u64,
    enforce_timelock: bool,
}

impl Guardian {
    /// Create a guardian with identity `id`, administered by `admin`.
    #[must_use]
    pub fn new(id: Address, admin: Address, config: &GuardianConfig) -> Self {
        Self {
            id,
            admin,
            verified_tokens: HashSet::new(),
            verified_strategies: HashSet::new(),
            verified_addresses: HashSet::new(),
            protection_admins: HashMap::new(),
            refund_admins: HashMap::new(),
            refunds: HashMap::new(),
            timelock_period: config.timelock_period,
            enforce_timelock: config.enforce_timelock,
        }
    }

    /// The identity the controller knows this guardian by.
    #[must_use]
    pub const fn id(&self) -> Address {
        self.id
    }

    /// The engine-wide administrator.
    #[must_use]
    pub const fn admin(&self) -> Address {
        self.admin
    }

    fn ensure_admin(&self, caller: Address) -> GuardResult<()> {
        if caller == self.admin {
            Ok(())
        } else {
            Err(GuardError::NotAdmin)
        }
    }

    // ------------------------------------------------------------------------
    // Verification sets
    // ------------------------------------------------------------------------

    /// Mark `token` as trusted.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotAdmin`] unless `caller` is the admin.
    pub fn verify_token(
        &mut self,
        caller: Address,
        token: Address,
        events: &mut EventLog,
    ) -> GuardResult<()> {
        self.ensure_admin(caller)?;
        self.verified_tokens.insert(token);
        tracing::info!(%token, "token verified");
        events.push(GuardEvent::TokenVerified { token });
        Ok(())
    }

    /// Withdraw trust from `token`.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotAdmin`] unless `caller` is the admin.
    pub fn remove_verified_token(
        &mut self,
        caller: Address,
        token: Address,
        events: &mut EventLog,
    ) -> GuardResult<()> {
        self.ensure_admin(caller)?;
        self.verified_tokens.remove(&token);
        tracing::info!(%token, "token verification removed");
        events.push(GuardEvent::TokenVerificationRemoved { token });
        Ok(())
    }

    /// Mark every strategy in `strategies` as trusted. An empty list is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotAdmin`] unless `caller` is the admin.
    pub fn verify_strategies(
        &mut self,
        caller: Address,
        strategies: &[StrategyId],
        events: &mut EventLog,
    ) -> GuardResult<()> {
        self.ensure_admin(caller)?;
        for &strategy in strategies {
            self.verified_strategies.insert(strategy);
            tracing::info!(%strategy, "strategy verified");
            events.push(GuardEvent::StrategyVerified { strategy });
        }
        Ok(())
    }

    /// Withdraw trust from every strategy in `strategies`. An empty list is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotAdmin`] unless `caller` is the admin.
    pub fn remove_strategies(
        &mut self,
        caller: Address,
        strategies: &[StrategyId],
        events: &mut EventLog,
    ) -> GuardResult<()> {
        self.ensure_admin(caller)?;
        for &strategy in strategies {
            self.verified_strategies.remove(&strategy);
            tracing::info!(%strategy, "strategy removed");
            events.push(GuardEvent::StrategyRemoved { strategy });
        }
        Ok(())
    }

    /// Set or clear the gate that allows `account` to be protected on
    /// `token`.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotAdmin`] unless `caller` is the admin.
    pub fn verify_address(
        &mut self,
        caller: Address,
        token: Address,
        account: Address,
        verified: bool,
        events: &mut EventLog,
    ) -> GuardResult<()> {
        self.ensure_admin(caller)?;
        if verified {
            self.verified_addresses.insert((token, account));
        } else {
            self.verified_addresses.remove(&(token, account));
        }
        tracing::info!(%token, %account, verified, "address verification changed");
        events.push(GuardEvent::AddressVerified {
            token,
            account,
            verified,
        });
        Ok(())
    }

    /// Returns `true` if `token` is trusted.
    #[must_use]
    pub fn is_token_verified(&self, token: Address) -> bool {
        self.verified_tokens.contains(&token)
    }

    /// Returns `true` if `strategy` is trusted.
    #[must_use]
    pub fn is_strategy_verified(&self, strategy: StrategyId) -> bool {
        self.verified_strategies.contains(&strategy)
    }

    /// Returns `true` if `account` may be protected on `token`.
    #[must_use]
    pub fn is_address_verified(&self, token: Address, account: Address) -> bool {
        self.verified_addresses.contains(&(token, account))
    }

    // ------------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------------

    fn ensure_token_admin(
        &self,
        ledger: &dyn TokenLedger,
        caller: Address,
        token: Address,
    ) -> GuardResult<()> {
        if !self.is_token_verified(token) {
            return Err(GuardError::TokenNotVerified);
        }
        if ledger.token_admin(token) != Some(caller) {
            return Err(GuardError::NotTokenAdmin);
        }
        Ok(())
    }

    /// Appoint the protection admin of `token`.
    ///
    /// # Errors
    ///
    /// [`GuardError::TokenNotVerified`] or [`GuardError::NotTokenAdmin`]
    /// unless `token` is verified and `caller` is its admin on the ledger.
    pub fn set_protection_admin(
        &mut self,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        admin: Address,
    ) -> GuardResult<()> {
        self.ensure_token_admin(&*cx.ledger, caller, token)?;
        self.protection_admins.insert(token, admin);
        tracing::info!(%token, %admin, "protection admin set");
        cx.events.push(GuardEvent::ProtectionAdminSet { token, admin });
        Ok(())
    }

    /// Appoint both the protection admin and the refund admin of `token`.
    ///
    /// # Errors
    ///
    /// Same as [`Guardian::set_protection_admin`].
    pub fn set_admins(
        &mut self,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        protection_admin: Address,
        refund_admin: Address,
    ) -> GuardResult<()> {
        self.ensure_token_admin(&*cx.ledger, caller, token)?;
        self.protection_admins.insert(token, protection_admin);
        self.refund_admins.insert(token, refund_admin);
        tracing::info!(%token, %protection_admin, %refund_admin, "token admins set");
        cx.events.push(GuardEvent::ProtectionAdminSet {
            token,
            admin: protection_admin,
        });
        cx.events.push(GuardEvent::RefundAdminSet {
            token,
            admin: refund_admin,
        });
        Ok(())
    }

    /// The protection admin of `token`.
    #[must_use]
    pub fn protection_admin(&self, token: Address) -> Option<Address> {
        self.protection_admins.get(&token).copied()
    }

    /// The refund admin of `token`.
    #[must_use]
    pub fn refund_admin(&self, token: Address) -> Option<Address> {
        self.refund_admins.get(&token).copied()
    }

    /// Fails unless `caller` is the protection admin of `token`.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotProtectionAdmin`].
    pub fn ensure_protection_admin(&self, caller: Address, token: Address) -> GuardResult<()> {
        if self.protection_admin(token) == Some(caller) {
            Ok(())
        } else {
            Err(GuardError::NotProtectionAdmin)
        }
    }

    // ------------------------------------------------------------------------
    // Protection records
    // ------------------------------------------------------------------------

    fn ensure_registered(&self, controller: &dyn Controller) -> GuardResult<()> {
        if controller.guardian() == Some(self.id) {
            Ok(())
        } else {
            Err(GuardError::NotGuardian)
        }
    }

    /// Checks everything [`Guardian::set_protected_address`] requires,
    /// without writing.
    ///
    /// # Errors
    ///
    /// [`GuardError::StrategyNotVerified`] if `caller` or `responsible` is
    /// not trusted, [`GuardError::AddressNotVerified`] if `account` is not
    /// gated in, [`GuardError::NotGuardian`] if the controller does not
    /// accept this guardian.
    pub fn check_protectable(
        &self,
        controller: &dyn Controller,
        caller: StrategyId,
        token: Address,
        account: Address,
        responsible: StrategyId,
    ) -> GuardResult<()> {
        if !self.is_strategy_verified(caller) || !self.is_strategy_verified(responsible) {
            return Err(GuardError::StrategyNotVerified);
        }
        if !self.is_address_verified(token, account) {
            return Err(GuardError::AddressNotVerified);
        }
        self.ensure_registered(controller)
    }

    /// Record `responsible` as the strategy governing `account` on `token`.
    ///
    /// # Errors
    ///
    /// See [`Guardian::check_protectable`].
    pub fn set_protected_address(
        &self,
        cx: &mut ProtectionContext<'_>,
        caller: StrategyId,
        token: Address,
        account: Address,
        responsible: StrategyId,
    ) -> GuardResult<()> {
        self.check_protectable(&*cx.controller, caller, token, account, responsible)?;
        cx.controller
            .set_protected_address(self.id, token, account, responsible)?;
        tracing::info!(%token, %account, strategy = %responsible, "protected address set");
        cx.events.push(GuardEvent::ProtectedAddressSet {
            token,
            account,
            strategy: responsible,
        });
        Ok(())
    }

    /// Checks everything [`Guardian::remove_protected_addresses`] requires
    /// for one account, without writing.
    ///
    /// # Errors
    ///
    /// [`GuardError::StrategyNotVerified`] if `caller` is not trusted,
    /// [`GuardError::NotResponsibleStrategy`] if another strategy governs the
    /// account, [`GuardError::NotGuardian`] if the controller does not accept
    /// this guardian.
    pub fn check_removable(
        &self,
        controller: &dyn Controller,
        caller: StrategyId,
        token: Address,
        account: Address,
    ) -> GuardResult<()> {
        if !self.is_strategy_verified(caller) {
            return Err(GuardError::StrategyNotVerified);
        }
        match controller.protected_strategy(token, account) {
            Some(current) if current != caller => Err(GuardError::NotResponsibleStrategy),
            _ => self.ensure_registered(controller),
        }
    }

    /// Clear the protection records of `accounts`. Accounts that are not
    /// protected are skipped.
    ///
    /// # Errors
    ///
    /// See [`Guardian::check_removable`]. Nothing is removed if any account
    /// fails the check.
    pub fn remove_protected_addresses(
        &self,
        cx: &mut ProtectionContext<'_>,
        caller: StrategyId,
        token: Address,
        accounts: &[Address],
    ) -> GuardResult<()> {
        for &account in accounts {
            self.check_removable(&*cx.controller, caller, token, account)?;
        }
        for &account in accounts {
            if !cx.controller.is_address_protected(token, account) {
                continue;
            }
            cx.controller
                .remove_protected_address(self.id, token, account)?;
            tracing::info!(%token, %account, "protected address removed");
            cx.events
                .push(GuardEvent::ProtectedAddressRemoved { token, account });
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Freeze
    // ------------------------------------------------------------------------

    /// Clear the freeze flag of `accounts`. Accounts that are not frozen are
    /// skipped.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotProtectionAdmin`] unless `caller` is the protection
    /// admin of `token`, [`GuardError::NotGuardian`] if the controller does
    /// not accept this guardian.
    pub fn unfreeze(
        &self,
        cx: &mut ProtectionContext<'_>,
        caller: Address,
        token: Address,
        accounts: &[Address],
    ) -> GuardResult<()> {
        self.ensure_protection_admin(caller, token)?;
        self.ensure_registered(&*cx.controller)?;
        for &account in accounts {
            if !cx.controller.is_frozen(token, account) {
                continue;
            }
            cx.controller.unfreeze(self.id, token, account)?;
            tracing::info!(%token, %account, "account unfrozen");
            cx.events.push(GuardEvent::AccountUnfrozen { token, account });
        }
        Ok(())
    }
}
