//! # Test Utilities for Tollgate
//!
//! Shared fixtures for the integration tests.
//!
//! ## Functions
//!
//! - [`harness`] - An engine over in-memory collaborators, ready to protect
//!   accounts on two tokens
//! - [`harness_with`] - The same, built from a custom [`Config`]
//!
//! ## Proptest Strategies
//!
//! - [`amount`] - Transfer amounts small enough to stay under the minted
//!   balance for a while
//! - [`account`] - Accounts drawn from a small pool so operations collide

#![allow(dead_code)]
// Allow expect() in test utilities since panicking on setup failures is acceptable in tests
#![allow(clippy::expect_used)]

use std::sync::Arc;

use proptest::prelude::*;
use tollgate::{
    Address, Config, Engine, InMemoryController, InMemoryLedger, LimitSpec, ManualClock,
    StrategyId, TimePoint, TransferRequest, U256,
};

pub const ADMIN: Address = Address::repeat_byte(0x01);
pub const TOKEN_ADMIN: Address = Address::repeat_byte(0x02);
pub const PROTECTION_ADMIN: Address = Address::repeat_byte(0x03);
pub const REFUND_ADMIN: Address = Address::repeat_byte(0x04);
pub const STRANGER: Address = Address::repeat_byte(0x05);
pub const GUARDIAN_ID: Address = Address::repeat_byte(0x06);
pub const CONTROLLER_ID: Address = Address::repeat_byte(0x07);

pub const TOKEN: Address = Address::repeat_byte(0x10);
pub const OTHER_TOKEN: Address = Address::repeat_byte(0x11);

pub const ALICE: Address = Address::repeat_byte(0x20);
pub const BOB: Address = Address::repeat_byte(0x21);
pub const CAROL: Address = Address::repeat_byte(0x22);
pub const RECOVERY: Address = Address::repeat_byte(0x23);

pub const SINGLE: StrategyId = StrategyId(Address::repeat_byte(0x30));
pub const MULTI: StrategyId = StrategyId(Address::repeat_byte(0x31));
pub const TREASURY: StrategyId = StrategyId(Address::repeat_byte(0x32));

/// Balance minted to every funded account on both tokens.
pub const INITIAL_BALANCE: u64 = 1_000_000;

pub type TestEngine = Engine<InMemoryController, InMemoryLedger>;

/// An engine plus a handle on the clock it reads.
pub struct Harness {
    pub engine: TestEngine,
    pub clock: ManualClock,
}

impl Harness {
    /// Move the clock forward by `units`.
    pub fn advance(&self, units: u64) {
        self.clock.advance(units);
    }

    /// Transfer `amount` of `token` from `from` to `to`.
    pub fn send(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<(), tollgate::TollgateError> {
        self.engine
            .transfer(TransferRequest::new(token, from, to, u(amount)))
    }

    /// Balance of `account` on `token`.
    pub fn balance(&self, token: Address, account: Address) -> U256 {
        use tollgate::TokenLedger;
        self.engine.ledger().balance_of(token, account)
    }

    /// Protect `account` on `token` with a single limit.
    pub fn single_limit(&mut self, token: Address, account: Address, cap: u64, window: u64) {
        let start = self.engine.now();
        self.engine
            .with_single_limit(SINGLE, |s, g, cx| {
                s.set_limit(g, cx, PROTECTION_ADMIN, token, account, limit(cap, window, start))
            })
            .expect("set_limit should succeed");
    }

    /// Protect `account` on `token` with several limits.
    pub fn multi_limit(&mut self, token: Address, account: Address, limits: &[(u64, u64)]) {
        let start = self.engine.now();
        let specs: Vec<LimitSpec> = limits
            .iter()
            .map(|&(cap, window)| limit(cap, window, start))
            .collect();
        self.engine
            .with_multi_limit(MULTI, |s, g, cx| {
                s.add_limits(g, cx, PROTECTION_ADMIN, token, &[account], &specs)
            })
            .expect("add_limits should succeed");
    }

    /// Protect `account` on `token` with a treasury whitelist.
    pub fn treasury(&mut self, token: Address, account: Address, destinations: &[Address]) {
        self.engine
            .with_treasury(TREASURY, |s, g, cx| {
                s.set_protected_address(g, cx, PROTECTION_ADMIN, token, account, destinations)
            })
            .expect("set_protected_address should succeed");
    }
}

/// Shorthand for a `U256` amount.
pub fn u(value: u64) -> U256 {
    U256::from(value)
}

/// A limit whose first window starts at `start`.
pub fn limit(cap: u64, window: u64, start: TimePoint) -> LimitSpec {
    LimitSpec::new(u(cap), window, start)
}

/// A block-numbered harness with default configuration.
pub fn harness() -> Harness {
    harness_with(&Config::default())
}

/// A harness built from `config`.
///
/// Both tokens are verified with `PROTECTION_ADMIN` and `REFUND_ADMIN`
/// appointed, all three strategies are deployed and verified, and `ALICE`
/// and `BOB` are funded and verified on both tokens. The event log starts
/// empty.
pub fn harness_with(config: &Config) -> Harness {
    let clock = ManualClock::new(config.clock.time_base, 0);

    let mut controller = InMemoryController::new(CONTROLLER_ID, ADMIN);
    controller
        .set_guardian(ADMIN, GUARDIAN_ID)
        .expect("controller admin registers the guardian");

    let mut ledger = InMemoryLedger::new();
    for token in [TOKEN, OTHER_TOKEN] {
        ledger.create_token(token, TOKEN_ADMIN);
        for account in [ALICE, BOB] {
            ledger
                .mint(token, account, u(INITIAL_BALANCE))
                .expect("mint should succeed");
        }
    }

    let mut engine = Engine::from_config(
        config,
        GUARDIAN_ID,
        ADMIN,
        controller,
        ledger,
        Arc::new(clock.clone()),
    )
    .expect("configuration should be valid");

    for token in [TOKEN, OTHER_TOKEN] {
        engine.verify_token(ADMIN, token).expect("verify token");
        engine
            .set_admins(TOKEN_ADMIN, token, PROTECTION_ADMIN, REFUND_ADMIN)
            .expect("appoint admins");
        for account in [ALICE, BOB] {
            engine
                .verify_address(ADMIN, token, account, true)
                .expect("verify address");
        }
    }

    engine.deploy_single_limit(SINGLE);
    engine.deploy_multi_limit(MULTI);
    engine.deploy_treasury(TREASURY);
    engine
        .verify_strategies(ADMIN, &[SINGLE, MULTI, TREASURY])
        .expect("verify strategies");

    engine.drain_events();
    Harness { engine, clock }
}

// ============================================================================
// Proptest Strategies
// ============================================================================

/// Amounts between 1 and 50.
pub fn amount() -> impl Strategy<Value = u64> {
    1u64..=50
}

/// One of the funded accounts.
pub fn account() -> impl Strategy<Value = Address> {
    prop_oneof![Just(ALICE), Just(BOB)]
}

/// A `(cap, window)` pair for a limit.
pub fn cap_and_window() -> impl Strategy<Value = (u64, u64)> {
    (1u64..=200, 1u64..=20)
}
