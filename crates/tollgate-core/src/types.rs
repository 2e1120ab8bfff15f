//! Core types for the Tollgate transfer guard.
//!
//! - [`StrategyId`] - Identity of a deployed transfer strategy
//! - [`TimePoint`] - Opaque, monotonically non-decreasing clock value
//! - [`TransferRequest`] - A single debit submitted for admission
//! - [`LimitSpec`] / [`LimitSnapshot`] - Rate limit configuration and state
//! - [`GuardEvent`] / [`EventLog`] - Notifications for committed changes
//!
//! Tokens and accounts are plain [`Address`] values. All state in the
//! engine is scoped per token.
//!
//! # Examples
//!
//! ```
//! use tollgate_core::types::{LimitSpec, TimePoint};
//! use alloy_primitives::U256;
//!
//! let spec = LimitSpec::new(U256::from(100u64), 10, TimePoint::new(0));
//! assert_eq!(spec.window, 10);
//! assert_eq!(TimePoint::new(12).since(TimePoint::new(2)), Some(10));
//! ```

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a deployed strategy.
///
/// Strategies are addressed the same way accounts are, so a strategy can be
/// the `caller` of guardian operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyId(pub Address);

impl StrategyId {
    /// Wrap an address as a strategy identity.
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    /// The underlying address.
    #[must_use]
    pub const fn address(self) -> Address {
        self.0
    }
}

impl From<Address> for StrategyId {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A clock value: either a block index or a Unix timestamp, depending on
/// the [`Clock`](crate::clock::Clock) the host injects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimePoint(u64);

impl TimePoint {
    /// The earliest representable time point.
    pub const ZERO: Self = Self(0);

    /// Create a time point from a raw clock value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw clock value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Units elapsed since `earlier`, or `None` if `earlier` is in the future.
    #[must_use]
    pub const fn since(self, earlier: Self) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }

    /// This point moved forward by `units`, saturating at the end of time.
    #[must_use]
    pub const fn saturating_add(self, units: u64) -> Self {
        Self(self.0.saturating_add(units))
    }
}

impl From<u64> for TimePoint {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A debit submitted to the engine for admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Token being moved.
    pub token: Address,
    /// Account being debited.
    pub from: Address,
    /// Destination account.
    pub to: Address,
    /// Amount in the token's smallest unit.
    pub amount: U256,
}

impl TransferRequest {
    /// Create a transfer request.
    #[must_use]
    pub const fn new(token: Address, from: Address, to: Address, amount: U256) -> Self {
        Self {
            token,
            from,
            to,
            amount,
        }
    }
}

/// Configuration of a single fixed-window rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitSpec {
    /// Maximum amount admitted within one window.
    pub cap: U256,
    /// Window length in clock units.
    pub window: u64,
    /// Start of the first window.
    pub start: TimePoint,
}

impl LimitSpec {
    /// Create a limit specification.
    #[must_use]
    pub const fn new(cap: U256, window: u64, start: TimePoint) -> Self {
        Self { cap, window, start }
    }
}

/// Observed state of a limit, as reported by read-only queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitSnapshot {
    /// Maximum amount admitted within one window.
    pub cap: U256,
    /// Window length in clock units.
    pub window: u64,
    /// Amount consumed in the current window.
    pub consumed: U256,
    /// Start of the current window.
    pub window_start: TimePoint,
}

impl LimitSnapshot {
    /// Capacity left in the current window.
    #[must_use]
    pub fn remaining(&self) -> U256 {
        self.cap.saturating_sub(self.consumed)
    }
}

/// Notification emitted when an operation commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum GuardEvent {
    /// A token was verified.
    TokenVerified { token: Address },
    /// A token lost its verification.
    TokenVerificationRemoved { token: Address },
    /// A strategy was verified.
    StrategyVerified { strategy: StrategyId },
    /// A strategy lost its verification.
    StrategyRemoved { strategy: StrategyId },
    /// The address-verification flag changed.
    AddressVerified {
        token: Address,
        account: Address,
        verified: bool,
    },
    /// A protection admin was appointed.
    ProtectionAdminSet { token: Address, admin: Address },
    /// A refund admin was appointed.
    RefundAdminSet { token: Address, admin: Address },
    /// An account was put under a strategy's protection.
    ProtectedAddressSet {
        token: Address,
        account: Address,
        strategy: StrategyId,
    },
    /// An account left protection.
    ProtectedAddressRemoved { token: Address, account: Address },
    /// An account was frozen by the threshold rule.
    AccountFrozen { token: Address, account: Address },
    /// An account was unfrozen.
    AccountUnfrozen { token: Address, account: Address },
    /// The refund timelock changed.
    TimelockPeriodSet { period: u64 },
    /// A refund was proposed.
    RefundProposed { id: B256, proposed_at: TimePoint },
    /// A refund proposal was canceled.
    RefundCanceled { id: B256 },
    /// A refund moved a frozen balance.
    RefundExecuted {
        id: B256,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    },
    /// Limits were configured for an account.
    LimitsSet {
        strategy: StrategyId,
        token: Address,
        account: Address,
        count: usize,
    },
    /// Limits were removed for an account.
    LimitsRemoved {
        strategy: StrategyId,
        token: Address,
        account: Address,
    },
    /// An account was paused.
    Paused { token: Address, account: Address },
    /// An account was unpaused.
    Unpaused { token: Address, account: Address },
    /// Destinations were added to a treasury whitelist.
    WhitelistExtended {
        token: Address,
        account: Address,
        added: usize,
    },
    /// A treasury whitelist was dropped.
    WhitelistCleared {
        strategy: StrategyId,
        token: Address,
        account: Address,
    },
}

/// Append-only log of committed [`GuardEvent`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<GuardEvent>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append a single event.
    pub fn push(&mut self, event: GuardEvent) {
        self.events.push(event);
    }

    /// Append every event from another log, leaving it empty.
    pub fn append(&mut self, other: &mut Self) {
        self.events.append(&mut other.events);
    }

    /// Events recorded so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[GuardEvent] {
        &self.events
    }

    /// Remove and return every recorded event.
    pub fn drain(&mut self) -> Vec<GuardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
