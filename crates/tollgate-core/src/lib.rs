//! # tollgate-core
//!
//! Core types, traits, and error definitions for the Tollgate transfer guard.
//!
//! This crate provides the foundation shared by every Tollgate crate:
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy with stable reason strings
//! - [`types`] - Strategy identities, time points, limits and events
//! - [`clock`] - Injected time sources (block numbers or timestamps)
//! - [`interfaces`] - The [`Controller`] and [`TokenLedger`] collaborator traits
//! - [`memory`] - In-memory implementations of the collaborators
//! - [`config`] / [`config_loader`] - TOML configuration
//!
//! ## Error Handling
//!
//! ```rust
//! use tollgate_core::error::{GuardError, TollgateError};
//!
//! fn check(paused: bool) -> Result<(), TollgateError> {
//!     if paused {
//!         return Err(GuardError::AlreadyPaused.into());
//!     }
//!     Ok(())
//! }
//!
//! let err = check(true).unwrap_err();
//! assert_eq!(err.to_string(), "already paused");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod interfaces;
pub mod memory;
pub mod types;

// Re-export commonly used error types at crate root for convenience
pub use error::{
    ConfigError, ErrorKind, GuardError, GuardResult, LedgerError, Result, TollgateError,
};

// Re-export config types at crate root for convenience
pub use config::{ClockConfig, Config, ConfigBuilder, GuardianConfig, LoggingConfig};
pub use config_loader::{expand_path, load_config, ConfigLoader};

pub use clock::{Clock, ManualClock, SystemClock, TimeBase};
pub use interfaces::{Controller, TokenLedger};
pub use memory::{InMemoryController, InMemoryLedger};
pub use types::{
    EventLog, GuardEvent, LimitSnapshot, LimitSpec, StrategyId, TimePoint, TransferRequest,
};

// Re-export primitives used throughout the public API
pub use alloy_primitives::{Address, B256, U256};
