//! # tollgate-policy
//!
//! Guardian registry and transfer strategies for the Tollgate transfer guard.
//!
//! ## Internal Crate Warning
//!
//! **This crate is an internal implementation detail of `tollgate`.** The
//! API is unstable. Hosts should drive the guard through `tollgate::Engine`.
//!
//! ## Modules
//!
//! - [`limits`] - Fixed-window limit accounting shared by the liquidity
//!   strategies
//! - [`guardian`] - Trust registry, roles, protection records, freeze and
//!   refund flow
//! - [`strategy`] - Single-limit, multi-limit and treasury strategies
//! - [`context`] - Borrowed collaborators passed to every mutating call
//!
//! ## Admission
//!
//! A protected account's outbound transfer is decided by exactly one
//! strategy, the one the controller has on record for it:
//!
//! | Strategy | Admits when |
//! |----------|-------------|
//! | single limit | amount fits the account's window |
//! | multi limit | amount fits every window |
//! | treasury | destination is whitelisted |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod context;
pub mod guardian;
pub mod limits;
pub mod strategy;

pub use context::ProtectionContext;
pub use guardian::Guardian;
pub use limits::{Limit, LimitLedger};
pub use strategy::{
    MultiLimitStrategy, SingleLimitStrategy, Strategy, StrategyKind, TransferPolicy,
    TreasuryStrategy,
};
