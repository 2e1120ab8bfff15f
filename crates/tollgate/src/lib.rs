//! # Tollgate
//!
//! Pluggable transfer-authorization engine for token ledgers.
//!
//! A host controller consults Tollgate before every debit from a protected
//! account. A guardian registry decides which tokens, strategies and
//! accounts may take part, and each protected account is governed by one
//! strategy:
//!
//! - single limit: at most `cap` per fixed window
//! - multi limit: several windows, all of which must admit
//! - treasury: only whitelisted destinations
//!
//! Accounts over a legacy threshold freeze their recipients, and frozen
//! balances can be returned through a timelocked refund flow.
//!
//! ## Modules
//!
//! - [`engine`] - The [`Engine`] composition root and transfer hook
//! - [`journal`] - JSONL persistence of committed events
//! - [`logging`] - Tracing subscriber setup
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use tollgate::{Engine, InMemoryController, InMemoryLedger, ManualClock, TransferRequest};
//! use tollgate::{Address, Config, LimitSpec, StrategyId, TimePoint, U256};
//!
//! let admin = Address::repeat_byte(1);
//! let token_admin = Address::repeat_byte(2);
//! let guardian = Address::repeat_byte(3);
//! let token = Address::repeat_byte(4);
//! let alice = Address::repeat_byte(5);
//! let bob = Address::repeat_byte(6);
//! let strategy = StrategyId(Address::repeat_byte(7));
//!
//! let mut controller = InMemoryController::new(Address::repeat_byte(8), admin);
//! controller.set_guardian(admin, guardian)?;
//! let mut ledger = InMemoryLedger::new();
//! ledger.create_token(token, token_admin);
//! ledger.mint(token, alice, U256::from(100u64))?;
//!
//! let clock = ManualClock::blocks(0);
//! let mut engine = Engine::from_config(
//!     &Config::default(),
//!     guardian,
//!     admin,
//!     controller,
//!     ledger,
//!     Arc::new(clock.clone()),
//! )?;
//! engine.verify_token(admin, token)?;
//! engine.deploy_single_limit(strategy);
//! engine.verify_strategies(admin, &[strategy])?;
//! engine.verify_address(admin, token, alice, true)?;
//! engine.set_protection_admin(token_admin, token, token_admin)?;
//! engine.with_single_limit(strategy, |s, g, cx| {
//!     let spec = LimitSpec::new(U256::from(10u64), 5, TimePoint::ZERO);
//!     s.set_limit(g, cx, token_admin, token, alice, spec)
//! })?;
//!
//! engine.transfer(TransferRequest::new(token, alice, bob, U256::from(10u64)))?;
//! let err = engine
//!     .transfer(TransferRequest::new(token, alice, bob, U256::from(1u64)))
//!     .unwrap_err();
//! assert_eq!(err.reason(), "limit reached");
//!
//! clock.advance(5);
//! engine.transfer(TransferRequest::new(token, alice, bob, U256::from(1u64)))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod engine;
pub mod journal;
pub mod logging;

pub use engine::Engine;
pub use journal::{EventJournal, JournalEntry, JournalError};

// Re-export key logging types for convenience
pub use logging::{init_logging, LogConfig, LogError, LogFormat, LogGuard, LogLevel};

// Re-export the types hosts need to drive the engine
pub use tollgate_core::{
    load_config, Address, Clock, Config, ConfigError, Controller, ErrorKind, GuardError,
    GuardEvent, GuardResult, InMemoryController, InMemoryLedger, LedgerError, LimitSnapshot,
    LimitSpec, ManualClock, StrategyId, SystemClock, TimeBase, TimePoint, TokenLedger,
    TollgateError, TransferRequest, B256, U256,
};
pub use tollgate_policy::{
    Guardian, MultiLimitStrategy, ProtectionContext, SingleLimitStrategy, Strategy, StrategyKind,
    TransferPolicy, TreasuryStrategy,
};
