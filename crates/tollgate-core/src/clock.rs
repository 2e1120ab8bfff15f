//! Time sources for window rollover and refund timelocks.
//!
//! The engine never reads time on its own. Hosts inject a [`Clock`] that
//! returns block indices or Unix timestamps, and every operation receives the
//! resulting [`TimePoint`] as an argument.
//!
//! # Example
//!
//! ```
//! use tollgate_core::clock::{Clock, ManualClock, TimeBase};
//!
//! let clock = ManualClock::blocks(100);
//! clock.advance(5);
//! assert_eq!(clock.now().value(), 105);
//! assert_eq!(clock.time_base(), TimeBase::BlockNumber);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::types::TimePoint;

/// Which monotonic counter a clock reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    /// Block index of the host chain.
    #[default]
    BlockNumber,
    /// Unix timestamp in seconds.
    Timestamp,
}

impl fmt::Display for TimeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockNumber => write!(f, "block_number"),
            Self::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// Source of the current [`TimePoint`].
///
/// Implementations must be monotonically non-decreasing.
pub trait Clock: Send + Sync {
    /// The current time point.
    fn now(&self) -> TimePoint;

    /// The counter this clock reports.
    fn time_base(&self) -> TimeBase;
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> TimePoint {
        (**self).now()
    }

    fn time_base(&self) -> TimeBase {
        (**self).time_base()
    }
}

/// A clock advanced explicitly by its owner.
///
/// Clones share the same counter, so a test can keep a handle while the
/// engine holds another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: TimeBase,
    value: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a manual clock with the given base and starting value.
    #[must_use]
    pub fn new(base: TimeBase, start: u64) -> Self {
        Self {
            base,
            value: Arc::new(AtomicU64::new(start)),
        }
    }

    /// A block-number clock starting at `start`.
    #[must_use]
    pub fn blocks(start: u64) -> Self {
        Self::new(TimeBase::BlockNumber, start)
    }

    /// A timestamp clock starting at `start`.
    #[must_use]
    pub fn timestamps(start: u64) -> Self {
        Self::new(TimeBase::Timestamp, start)
    }

    /// Move the clock forward by `units`, saturating at `u64::MAX`.
    pub fn advance(&self, units: u64) {
        // fetch_update never fails when the closure always returns Some
        let _ = self
            .value
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                Some(v.saturating_add(units))
            });
    }

    /// Move the clock to `value`. Values in the past are ignored.
    pub fn set(&self, value: u64) {
        self.value.fetch_max(value, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimePoint {
        TimePoint::new(self.value.load(Ordering::SeqCst))
    }

    fn time_base(&self) -> TimeBase {
        self.base
    }
}

/// Wall-clock time in Unix seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimePoint {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        TimePoint::new(secs)
    }

    fn time_base(&self) -> TimeBase {
        TimeBase::Timestamp
    }
}
