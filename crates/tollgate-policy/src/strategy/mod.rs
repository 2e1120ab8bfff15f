//! Transfer strategies.
//!
//! A strategy decides whether a debit from a protected account is admitted.
//! The set of strategies is closed:
//!
//! - [`SingleLimitStrategy`] - one fixed-window rate limit per account
//! - [`MultiLimitStrategy`] - several stacked limits, all of which must admit
//! - [`TreasuryStrategy`] - destination whitelist, independent of amount
//!
//! All three implement [`TransferPolicy`], and [`Strategy`] wraps them for
//! dispatch by the host.

pub mod multi_limit;
pub mod single_limit;
pub mod treasury;

use std::fmt;

use alloy_primitives::Address;
use tollgate_core::error::{GuardError, GuardResult};
use tollgate_core::types::{StrategyId, TimePoint, TransferRequest};

use crate::context::ProtectionContext;
use crate::guardian::Guardian;

pub use multi_limit::MultiLimitStrategy;
pub use single_limit::SingleLimitStrategy;
pub use treasury::TreasuryStrategy;

/// The admission hook the controller calls for protected senders.
///
/// Admission is split in two so a host can check a transfer, move the value,
/// and only then charge the strategy.
pub trait TransferPolicy {
    /// This strategy's identity.
    fn id(&self) -> StrategyId;

    /// Decide on `request` without touching any accounting.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotController`] unless `caller` is the controller this
    /// strategy was deployed with, or a policy denial.
    fn check_transfer(
        &self,
        caller: Address,
        request: &TransferRequest,
        now: TimePoint,
    ) -> GuardResult<()>;

    /// Charge `request` to the sender's accounting. Only valid after
    /// [`TransferPolicy::check_transfer`] admitted it at the same `now`.
    fn commit_transfer(&mut self, request: &TransferRequest, now: TimePoint);

    /// Decide on `request`, updating any accounting on success.
    ///
    /// # Errors
    ///
    /// Same as [`TransferPolicy::check_transfer`]. A denial leaves the
    /// strategy unchanged.
    fn is_transfer_allowed(
        &mut self,
        caller: Address,
        request: &TransferRequest,
        now: TimePoint,
    ) -> GuardResult<()> {
        self.check_transfer(caller, request, now)?;
        self.commit_transfer(request, now);
        Ok(())
    }
}

/// Tag of a [`Strategy`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// [`SingleLimitStrategy`].
    SingleLimit,
    /// [`MultiLimitStrategy`].
    MultiLimit,
    /// [`TreasuryStrategy`].
    Treasury,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleLimit => write!(f, "single_limit"),
            Self::MultiLimit => write!(f, "multi_limit"),
            Self::Treasury => write!(f, "treasury"),
        }
    }
}

/// A deployed strategy of any kind.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// One limit per account.
    SingleLimit(SingleLimitStrategy),
    /// Stacked limits per account.
    MultiLimit(MultiLimitStrategy),
    /// Destination whitelist.
    Treasury(TreasuryStrategy),
}

impl Strategy {
    /// The variant's tag.
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::SingleLimit(_) => StrategyKind::SingleLimit,
            Self::MultiLimit(_) => StrategyKind::MultiLimit,
            Self::Treasury(_) => StrategyKind::Treasury,
        }
    }
}

impl TransferPolicy for Strategy {
    fn id(&self) -> StrategyId {
        match self {
            Self::SingleLimit(s) => s.id(),
            Self::MultiLimit(s) => s.id(),
            Self::Treasury(s) => s.id(),
        }
    }

    fn check_transfer(
        &self,
        caller: Address,
        request: &TransferRequest,
        now: TimePoint,
    ) -> GuardResult<()> {
        match self {
            Self::SingleLimit(s) => s.check_transfer(caller, request, now),
            Self::MultiLimit(s) => s.check_transfer(caller, request, now),
            Self::Treasury(s) => s.check_transfer(caller, request, now),
        }
    }

    fn commit_transfer(&mut self, request: &TransferRequest, now: TimePoint) {
        match self {
            Self::SingleLimit(s) => s.commit_transfer(request, now),
            Self::MultiLimit(s) => s.commit_transfer(request, now),
            Self::Treasury(s) => s.commit_transfer(request, now),
        }
    }
}

impl From<SingleLimitStrategy> for Strategy {
    fn from(strategy: SingleLimitStrategy) -> Self {
        Self::SingleLimit(strategy)
    }
}

impl From<MultiLimitStrategy> for Strategy {
    fn from(strategy: MultiLimitStrategy) -> Self {
        Self::MultiLimit(strategy)
    }
}

impl From<TreasuryStrategy> for Strategy {
    fn from(strategy: TreasuryStrategy) -> Self {
        Self::Treasury(strategy)
    }
}

pub(crate) fn ensure_controller(expected: Address, caller: Address) -> GuardResult<()> {
    if caller == expected {
        Ok(())
    } else {
        Err(GuardError::NotController)
    }
}

/// Records the outcome of an admission check.
pub(crate) fn trace_decision(id: StrategyId, request: &TransferRequest, result: &GuardResult<()>) {
    match result {
        Ok(()) => tracing::debug!(
            strategy = %id,
            token = %request.token,
            account = %request.from,
            amount = %request.amount,
            "transfer admitted"
        ),
        Err(err) => tracing::warn!(
            strategy = %id,
            token = %request.token,
            account = %request.from,
            amount = %request.amount,
            reason = err.reason(),
            "transfer denied"
        ),
    }
}

/// Checks that every account may be registered under its responsible
/// strategy, then registers them all.
pub(crate) fn protect_all(
    guardian: &Guardian,
    cx: &mut ProtectionContext<'_>,
    caller: StrategyId,
    token: Address,
    accounts: &[Address],
    responsible: &[StrategyId],
) -> GuardResult<()> {
    for (&account, &strategy) in accounts.iter().zip(responsible) {
        guardian.check_protectable(&*cx.controller, caller, token, account, strategy)?;
    }
    for (&account, &strategy) in accounts.iter().zip(responsible) {
        guardian.set_protected_address(cx, caller, token, account, strategy)?;
    }
    Ok(())
}

/// Fails with [`GuardError::NotProtected`] unless the controller names
/// `caller` as the strategy responsible for `account`.
pub(crate) fn ensure_governs(
    cx: &ProtectionContext<'_>,
    caller: StrategyId,
    token: Address,
    account: Address,
) -> GuardResult<()> {
    if cx.controller.protected_strategy(token, account) == Some(caller) {
        Ok(())
    } else {
        Err(GuardError::NotProtected)
    }
}

/// Accounts this strategy currently governs, out of `accounts`.
pub(crate) fn governed(
    cx: &ProtectionContext<'_>,
    caller: StrategyId,
    token: Address,
    accounts: &[Address],
) -> Vec<Address> {
    accounts
        .iter()
        .copied()
        .filter(|&account| cx.controller.protected_strategy(token, account) == Some(caller))
        .collect()
}
