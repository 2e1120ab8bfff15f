//! Error types for the Tollgate transfer guard.
//!
//! Errors are organized by the component that produces them:
//!
//! - [`GuardError`] - Rejections from the guardian registry and the strategies
//! - [`LedgerError`] - Failures reported by the host token ledger
//! - [`ConfigError`] - Configuration failures
//! - [`TollgateError`] - Top-level error that wraps all error types
//!
//! The `Display` output of a [`GuardError`] is its stable reason string.
//! Hosts surface it verbatim to callers, so these strings are part of the
//! externally observed contract and must not change.
//!
//! # Example
//!
//! ```rust
//! use tollgate_core::error::{ErrorKind, GuardError, TollgateError};
//!
//! let err: TollgateError = GuardError::LimitReached.into();
//! assert_eq!(err.reason(), "limit reached");
//! assert_eq!(GuardError::LimitReached.kind(), ErrorKind::Policy);
//! ```

use std::fmt;

use alloy_primitives::{Address, U256};

use crate::types::{StrategyId, TimePoint};

/// Top-level error type for Tollgate.
#[derive(Debug, thiserror::Error)]
pub enum TollgateError {
    /// The guardian or a strategy rejected the call.
    #[error("{0}")]
    Guard(#[from] GuardError),

    /// The host ledger failed to move value.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl TollgateError {
    /// Returns `true` if this is a guard rejection.
    #[must_use]
    pub const fn is_guard(&self) -> bool {
        matches!(self, Self::Guard(_))
    }

    /// Returns the wrapped guard error, if any.
    #[must_use]
    pub const fn as_guard(&self) -> Option<&GuardError> {
        match self {
            Self::Guard(err) => Some(err),
            _ => None,
        }
    }

    /// Short, stable reason string for this error.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Guard(err) => err.reason(),
            Self::Ledger(err) => err.reason(),
            Self::Config(_) => "configuration error",
        }
    }
}

/// Coarse classification of a [`GuardError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller lacks the role required for the token or operation.
    Authorization,
    /// The operation is invalid for the current state.
    State,
    /// A transfer was denied by the responsible strategy.
    Policy,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authorization => write!(f, "authorization"),
            Self::State => write!(f, "state"),
            Self::Policy => write!(f, "policy"),
        }
    }
}

// ============================================================================
// GuardError
// ============================================================================

/// Rejections produced by the guardian registry and the transfer strategies.
///
/// Every variant is a synchronous, non-retryable rejection: the call that
/// produced it made no state change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    // --- Authorization ---
    /// Generic authorization failure (legacy entry points).
    #[error("unauthorized")]
    Unauthorized,

    /// The caller is not the engine-wide administrator.
    #[error("not admin")]
    NotAdmin,

    /// The token has not been verified by the administrator.
    #[error("token not verified")]
    TokenNotVerified,

    /// The caller is not the token's administrator on the ledger.
    #[error("not token admin")]
    NotTokenAdmin,

    /// The caller is not the protection admin for the token.
    #[error("not protection admin")]
    NotProtectionAdmin,

    /// The caller is not the refund admin for the token.
    #[error("not refund admin")]
    NotRefundAdmin,

    /// The calling strategy has not been verified.
    #[error("strategy not verified")]
    StrategyNotVerified,

    /// The account has not been verified for protection on this token.
    #[error("address not verified")]
    AddressNotVerified,

    /// A strategy hook was invoked by someone other than its controller.
    #[error("not controller")]
    NotController,

    /// A controller callback was invoked by someone other than the guardian.
    #[error("sender is not guardian")]
    NotGuardian,

    /// The strategy is not the one currently responsible for the account.
    #[error("not responsible strategy")]
    NotResponsibleStrategy,

    // --- State ---
    /// The account is not protected by the strategy.
    #[error("not protected")]
    NotProtected,

    /// The account is already paused.
    #[error("already paused")]
    AlreadyPaused,

    /// The account is not paused.
    #[error("not paused")]
    NotPaused,

    /// No live refund proposal exists for the key.
    #[error("refund not found")]
    RefundNotFound,

    /// A refund proposal for the key is already live.
    #[error("refund already proposed")]
    RefundAlreadyProposed,

    /// Refunds can only be proposed for frozen accounts.
    #[error("address not frozen")]
    AddressNotFrozen,

    /// The refund timelock has not elapsed yet.
    #[error("timelock not elapsed")]
    TimelockNotElapsed {
        /// Earliest time point at which the refund becomes executable.
        ready_at: TimePoint,
    },

    /// No strategy is registered under the identifier.
    #[error("unknown strategy")]
    UnknownStrategy {
        /// The identifier that was looked up.
        strategy: StrategyId,
    },

    /// The strategy exists but is of a different kind than requested.
    #[error("strategy kind mismatch")]
    StrategyKindMismatch {
        /// The identifier that was looked up.
        strategy: StrategyId,
    },

    /// Parallel input lists have different lengths.
    #[error("length mismatch")]
    LengthMismatch {
        /// Expected number of elements.
        expected: usize,
        /// Number of elements supplied.
        actual: usize,
    },

    /// A limit was requested by an index past the end of the list.
    #[error("limit index out of range")]
    LimitIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of limits configured.
        len: usize,
    },

    // --- Policy ---
    /// At least one rate limit would be exceeded by the transfer.
    #[error("limit reached")]
    LimitReached,

    /// The destination is not on the sender's whitelist.
    #[error("recipient not whitelisted")]
    RecipientNotWhitelisted,

    /// The sender is frozen.
    #[error("address frozen")]
    AddressFrozen {
        /// The frozen account.
        account: Address,
    },
}

impl GuardError {
    /// Create a `LengthMismatch` error.
    #[must_use]
    pub const fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// Create an `UnknownStrategy` error.
    #[must_use]
    pub const fn unknown_strategy(strategy: StrategyId) -> Self {
        Self::UnknownStrategy { strategy }
    }

    /// Create a `StrategyKindMismatch` error.
    #[must_use]
    pub const fn kind_mismatch(strategy: StrategyId) -> Self {
        Self::StrategyKindMismatch { strategy }
    }

    /// Create an `AddressFrozen` error.
    #[must_use]
    pub const fn frozen(account: Address) -> Self {
        Self::AddressFrozen { account }
    }

    /// Stable reason string, without any payload.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotAdmin => "not admin",
            Self::TokenNotVerified => "token not verified",
            Self::NotTokenAdmin => "not token admin",
            Self::NotProtectionAdmin => "not protection admin",
            Self::NotRefundAdmin => "not refund admin",
            Self::StrategyNotVerified => "strategy not verified",
            Self::AddressNotVerified => "address not verified",
            Self::NotController => "not controller",
            Self::NotGuardian => "sender is not guardian",
            Self::NotResponsibleStrategy => "not responsible strategy",
            Self::NotProtected => "not protected",
            Self::AlreadyPaused => "already paused",
            Self::NotPaused => "not paused",
            Self::RefundNotFound => "refund not found",
            Self::RefundAlreadyProposed => "refund already proposed",
            Self::AddressNotFrozen => "address not frozen",
            Self::TimelockNotElapsed { .. } => "timelock not elapsed",
            Self::UnknownStrategy { .. } => "unknown strategy",
            Self::StrategyKindMismatch { .. } => "strategy kind mismatch",
            Self::LengthMismatch { .. } => "length mismatch",
            Self::LimitIndexOutOfRange { .. } => "limit index out of range",
            Self::LimitReached => "limit reached",
            Self::RecipientNotWhitelisted => "recipient not whitelisted",
            Self::AddressFrozen { .. } => "address frozen",
        }
    }

    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized
            | Self::NotAdmin
            | Self::TokenNotVerified
            | Self::NotTokenAdmin
            | Self::NotProtectionAdmin
            | Self::NotRefundAdmin
            | Self::StrategyNotVerified
            | Self::AddressNotVerified
            | Self::NotController
            | Self::NotGuardian
            | Self::NotResponsibleStrategy => ErrorKind::Authorization,
            Self::NotProtected
            | Self::AlreadyPaused
            | Self::NotPaused
            | Self::RefundNotFound
            | Self::RefundAlreadyProposed
            | Self::AddressNotFrozen
            | Self::TimelockNotElapsed { .. }
            | Self::UnknownStrategy { .. }
            | Self::StrategyKindMismatch { .. }
            | Self::LengthMismatch { .. }
            | Self::LimitIndexOutOfRange { .. } => ErrorKind::State,
            Self::LimitReached | Self::RecipientNotWhitelisted | Self::AddressFrozen { .. } => {
                ErrorKind::Policy
            }
        }
    }

    /// Returns `true` for authorization failures.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.kind(), ErrorKind::Authorization)
    }

    /// Returns `true` if a transfer was denied by policy.
    #[must_use]
    pub const fn is_denial(&self) -> bool {
        matches!(self.kind(), ErrorKind::Policy)
    }
}

// ============================================================================
// LedgerError
// ============================================================================

/// Errors reported by the host token ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The sender does not hold enough tokens.
    #[error("insufficient balance: balance={balance}, amount={amount}")]
    InsufficientBalance {
        /// Current balance of the sender.
        balance: U256,
        /// Requested amount.
        amount: U256,
    },

    /// The recipient balance would overflow.
    #[error("balance overflow")]
    BalanceOverflow,
}

impl LedgerError {
    /// Create an `InsufficientBalance` error.
    #[must_use]
    pub const fn insufficient_balance(balance: U256, amount: U256) -> Self {
        Self::InsufficientBalance { balance, amount }
    }

    /// Stable reason string, without any payload.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InsufficientBalance { .. } => "insufficient balance",
            Self::BalanceOverflow => "balance overflow",
        }
    }
}

// ============================================================================
// ConfigError
// ============================================================================

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {context}")]
    ParseFailed {
        /// Context about the parsing failure.
        context: String,
    },

    /// A configuration value is invalid.
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// The field name with the invalid value.
        field: String,
        /// The invalid value.
        value: String,
    },

    /// Reading or writing the configuration file failed.
    #[error("I/O error ({context}): {source}")]
    Io {
        /// What was being done.
        context: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The home directory could not be determined.
    #[error("could not determine home directory")]
    NoHomeDirectory,
}

impl ConfigError {
    /// Create a `FileNotFound` error.
    #[must_use]
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a `ParseFailed` error.
    #[must_use]
    pub fn parse_failed(context: impl Into<String>) -> Self {
        Self::ParseFailed {
            context: context.into(),
        }
    }

    /// Create an `InvalidValue` error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an `Io` error.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

// ============================================================================
// Result type aliases
// ============================================================================

/// A `Result` type alias using [`TollgateError`] as the error type.
pub type Result<T> = std::result::Result<T, TollgateError>;

/// A `Result` type alias for guardian and strategy operations.
pub type GuardResult<T> = std::result::Result<T, GuardError>;

/// A `Result` type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ============================================================================
// Unit Tests
// ============================================================================
