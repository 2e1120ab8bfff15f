//! Fixed-window limit accounting.
//!
//! A [`LimitLedger`] keeps an ordered list of [`Limit`]s per `(token, account)`.
//! Windows roll over lazily: nothing ticks in the background, and a limit
//! whose window has elapsed is reset the next time a transfer is admitted
//! against it.
//!
//! Admission is the conjunction of every limit in the list. Either every
//! limit admits the amount and all of them are charged, or the transfer is
//! denied and nothing changes.
//!
//! # Example
//!
//! ```
//! use tollgate_policy::limits::{Limit, LimitLedger};
//! use tollgate_core::{Address, LimitSpec, TimePoint, U256};
//!
//! let token = Address::repeat_byte(1);
//! let account = Address::repeat_byte(2);
//! let mut ledger = LimitLedger::new();
//! ledger.set(token, account, vec![Limit::new(LimitSpec::new(U256::from(10u64), 5, TimePoint::ZERO))]);
//!
//! let now = TimePoint::new(1);
//! assert!(ledger.try_consume(token, account, U256::from(8u64), now).is_ok());
//! assert!(ledger.try_consume(token, account, U256::from(3u64), now).is_err());
//! ```

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use tollgate_core::error::{GuardError, GuardResult};
use tollgate_core::types::{LimitSnapshot, LimitSpec, TimePoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Configured,
    Pause,
}

/// A single fixed-window rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    cap: U256,
    window: u64,
    consumed: U256,
    window_start: TimePoint,
    origin: Origin,
}

impl Limit {
    /// A fresh limit with nothing consumed.
    #[must_use]
    pub const fn new(spec: LimitSpec) -> Self {
        Self {
            cap: spec.cap,
            window: spec.window,
            consumed: U256::ZERO,
            window_start: spec.start,
            origin: Origin::Configured,
        }
    }

    /// The zero-capacity, never-ending entry appended while an account is
    /// paused.
    #[must_use]
    pub const fn pause_marker(now: TimePoint) -> Self {
        Self {
            cap: U256::ZERO,
            window: u64::MAX,
            consumed: U256::ZERO,
            window_start: now,
            origin: Origin::Pause,
        }
    }

    /// Returns `true` for the entry appended by a pause.
    #[must_use]
    pub const fn is_pause_marker(&self) -> bool {
        matches!(self.origin, Origin::Pause)
    }

    /// This limit as observed at `now`, with any due rollover applied.
    #[must_use]
    pub fn rolled(self, now: TimePoint) -> Self {
        match now.since(self.window_start) {
            Some(elapsed) if elapsed >= self.window => Self {
                consumed: U256::ZERO,
                window_start: now,
                ..self
            },
            _ => self,
        }
    }

    /// Returns `true` if `amount` fits in the current window.
    #[must_use]
    pub fn admits(&self, amount: U256) -> bool {
        !self.is_pause_marker()
            && self
                .consumed
                .checked_add(amount)
                .is_some_and(|total| total <= self.cap)
    }

    /// Plain-data view of this limit.
    #[must_use]
    pub const fn snapshot(&self) -> LimitSnapshot {
        LimitSnapshot {
            cap: self.cap,
            window: self.window,
            consumed: self.consumed,
            window_start: self.window_start,
        }
    }
}

/// Per-`(token, account)` lists of limits.
#[derive(Debug, Clone, Default)]
pub struct LimitLedger {
    records: HashMap<(Address, Address), Vec<Limit>>,
}

impl LimitLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the limits of `account`.
    ///
    /// A pause survives the replacement and still needs an explicit
    /// [`LimitLedger::unpause`].
    pub fn set(&mut self, token: Address, account: Address, mut limits: Vec<Limit>) {
        limits.retain(|limit| !limit.is_pause_marker());
        if let Some(marker) = self
            .records
            .get(&(token, account))
            .and_then(|old| old.iter().find(|limit| limit.is_pause_marker()))
        {
            limits.push(*marker);
        }
        self.records.insert((token, account), limits);
    }

    /// Append limits to `account`, keeping any existing ones.
    pub fn extend(
        &mut self,
        token: Address,
        account: Address,
        limits: impl IntoIterator<Item = Limit>,
    ) {
        self.records
            .entry((token, account))
            .or_default()
            .extend(limits);
    }

    /// Drop every limit of `account`, pause marker included.
    pub fn remove(&mut self, token: Address, account: Address) -> Option<Vec<Limit>> {
        self.records.remove(&(token, account))
    }

    /// Returns `true` if `account` has a limit list on `token`.
    #[must_use]
    pub fn contains(&self, token: Address, account: Address) -> bool {
        self.records.contains_key(&(token, account))
    }

    /// Number of entries for `account`, pause marker included.
    #[must_use]
    pub fn len(&self, token: Address, account: Address) -> usize {
        self.records.get(&(token, account)).map_or(0, Vec::len)
    }

    /// The entry at `index` as observed at `now`.
    ///
    /// Rollover is computed for the report only and never stored.
    #[must_use]
    pub fn snapshot(
        &self,
        token: Address,
        account: Address,
        index: usize,
        now: TimePoint,
    ) -> Option<LimitSnapshot> {
        self.records
            .get(&(token, account))
            .and_then(|limits| limits.get(index))
            .map(|limit| limit.rolled(now).snapshot())
    }

    /// Every entry for `account` as observed at `now`.
    #[must_use]
    pub fn snapshots(&self, token: Address, account: Address, now: TimePoint) -> Vec<LimitSnapshot> {
        self.records
            .get(&(token, account))
            .map(|limits| limits.iter().map(|l| l.rolled(now).snapshot()).collect())
            .unwrap_or_default()
    }

    /// Returns `true` if a pause marker is present.
    #[must_use]
    pub fn is_paused(&self, token: Address, account: Address) -> bool {
        self.records
            .get(&(token, account))
            .is_some_and(|limits| limits.iter().any(Limit::is_pause_marker))
    }

    /// Append a pause marker.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotProtected`] if `account` has no limits here,
    /// [`GuardError::AlreadyPaused`] if it is already paused.
    pub fn pause(&mut self, token: Address, account: Address, now: TimePoint) -> GuardResult<()> {
        let limits = self
            .records
            .get_mut(&(token, account))
            .ok_or(GuardError::NotProtected)?;
        if limits.iter().any(Limit::is_pause_marker) {
            return Err(GuardError::AlreadyPaused);
        }
        limits.push(Limit::pause_marker(now));
        Ok(())
    }

    /// Remove the pause marker, leaving the configured limits untouched.
    ///
    /// # Errors
    ///
    /// [`GuardError::NotProtected`] if `account` has no limits here,
    /// [`GuardError::NotPaused`] if it is not paused.
    pub fn unpause(&mut self, token: Address, account: Address) -> GuardResult<()> {
        let limits = self
            .records
            .get_mut(&(token, account))
            .ok_or(GuardError::NotProtected)?;
        if !limits.iter().any(Limit::is_pause_marker) {
            return Err(GuardError::NotPaused);
        }
        limits.retain(|limit| !limit.is_pause_marker());
        Ok(())
    }

    /// Check `amount` against every limit of `account` without charging.
    ///
    /// Accounts without a limit list are not restricted.
    ///
    /// # Errors
    ///
    /// [`GuardError::LimitReached`] if the account is paused or any limit
    /// would be exceeded.
    pub fn check(
        &self,
        token: Address,
        account: Address,
        amount: U256,
        now: TimePoint,
    ) -> GuardResult<()> {
        match self.records.get(&(token, account)) {
            Some(limits) if !limits.iter().all(|limit| limit.rolled(now).admits(amount)) => {
                Err(GuardError::LimitReached)
            }
            _ => Ok(()),
        }
    }

    /// Charge `amount` to every limit of `account`, applying due rollovers.
    ///
    /// Only meaningful after [`LimitLedger::check`] admitted the same amount
    /// at the same `now`; consumption saturates instead of overflowing.
    pub fn charge(&mut self, token: Address, account: Address, amount: U256, now: TimePoint) {
        let Some(limits) = self.records.get_mut(&(token, account)) else {
            return;
        };
        for limit in limits.iter_mut().filter(|limit| !limit.is_pause_marker()) {
            let rolled = limit.rolled(now);
            *limit = Limit {
                consumed: rolled.consumed.saturating_add(amount),
                ..rolled
            };
        }
    }

    /// Admit `amount` against every limit of `account`, charging all of them.
    ///
    /// Accounts without a limit list are not restricted.
    ///
    /// # Errors
    ///
    /// [`GuardError::LimitReached`] if the account is paused or any limit
    /// would be exceeded. The ledger is left unchanged.
    pub fn try_consume(
        &mut self,
        token: Address,
        account: Address,
        amount: U256,
        now: TimePoint,
    ) -> GuardResult<()> {
        self.check(token, account, amount, now)?;
        self.charge(token, account, amount, now);
        Ok(())
    }
}
