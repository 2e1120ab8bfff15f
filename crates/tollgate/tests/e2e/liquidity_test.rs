//! Integration tests for the liquidity strategies.
//!
//! These tests verify:
//! - Fixed-window accounting and lazy rollover
//! - Conjunction of stacked limits
//! - Pause and unpause
//! - Moving accounts between strategies

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]

use tollgate::{GuardError, GuardEvent, LedgerError, LimitSnapshot, Strategy, TollgateError, U256};

use crate::common::{
    harness, limit, u, ALICE, BOB, CAROL, MULTI, PROTECTION_ADMIN, SINGLE, STRANGER, TOKEN,
    TREASURY,
};

fn reason(result: Result<(), TollgateError>) -> &'static str {
    result.expect_err("transfer should be denied").reason()
}

fn multi_limits(h: &crate::common::Harness) -> Vec<LimitSnapshot> {
    match h.engine.strategy(MULTI) {
        Some(Strategy::MultiLimit(s)) => s.limits(TOKEN, ALICE, h.engine.now()),
        other => panic!("expected a multi-limit strategy, got {other:?}"),
    }
}

// ============================================================================
// Single limit
// ============================================================================

#[test]
fn test_single_limit_accumulates_until_window_elapses() {
    let mut h = harness();
    h.single_limit(TOKEN, ALICE, 100, 10);

    h.send(TOKEN, ALICE, BOB, 10).unwrap();
    for _ in 0..45 {
        h.send(TOKEN, ALICE, BOB, 2).unwrap();
    }
    assert_eq!(h.engine.limit(SINGLE, TOKEN, ALICE, 0).unwrap().consumed, u(100));

    assert_eq!(reason(h.send(TOKEN, ALICE, BOB, 1)), "limit reached");
    assert_eq!(h.engine.limit(SINGLE, TOKEN, ALICE, 0).unwrap().consumed, u(100));

    h.advance(10);
    let snapshot = h.engine.limit(SINGLE, TOKEN, ALICE, 0).unwrap();
    assert_eq!(snapshot.consumed, u(0));
    assert_eq!(snapshot.window_start, h.engine.now());

    h.send(TOKEN, ALICE, BOB, 100).unwrap();
}

#[test]
fn test_denied_transfer_does_not_consume() {
    let mut h = harness();
    h.single_limit(TOKEN, ALICE, 100, 10);

    h.send(TOKEN, ALICE, BOB, 60).unwrap();
    assert_eq!(reason(h.send(TOKEN, ALICE, BOB, 41)), "limit reached");

    let snapshot = h.engine.limit(SINGLE, TOKEN, ALICE, 0).unwrap();
    assert_eq!(snapshot.consumed, u(60));
    assert_eq!(snapshot.remaining(), u(40));
    h.send(TOKEN, ALICE, BOB, 40).unwrap();
}

#[test]
fn test_small_transfers_then_reset_scenario() {
    let mut h = harness();
    h.single_limit(TOKEN, ALICE, 5, 10);

    for _ in 0..3 {
        h.send(TOKEN, ALICE, BOB, 1).unwrap();
    }
    assert_eq!(reason(h.send(TOKEN, ALICE, BOB, 4)), "limit reached");

    h.advance(10);
    h.send(TOKEN, ALICE, BOB, 5).unwrap();
    assert_eq!(h.engine.limit(SINGLE, TOKEN, ALICE, 0).unwrap().consumed, u(5));

    // A fresh window never admits more than the cap.
    h.advance(10);
    assert_eq!(reason(h.send(TOKEN, ALICE, BOB, 9)), "limit reached");
}

#[test]
fn test_failed_ledger_move_leaves_limit_uncharged() {
    let mut h = harness();
    h.single_limit(TOKEN, ALICE, 100, 10);
    h.engine.ledger_mut().mint(TOKEN, CAROL, U256::MAX).unwrap();

    let err = h.send(TOKEN, ALICE, CAROL, 50).unwrap_err();
    assert!(matches!(err, TollgateError::Ledger(LedgerError::BalanceOverflow)));
    assert_eq!(h.balance(TOKEN, ALICE), u(crate::common::INITIAL_BALANCE));
    assert_eq!(h.engine.limit(SINGLE, TOKEN, ALICE, 0).unwrap().consumed, U256::ZERO);

    h.send(TOKEN, ALICE, BOB, 100).unwrap();
}

#[test]
fn test_reading_a_limit_does_not_commit_rollover() {
    let mut h = harness();
    h.single_limit(TOKEN, ALICE, 10, 5);
    h.send(TOKEN, ALICE, BOB, 10).unwrap();

    h.advance(5);
    let seen = h.engine.limit(SINGLE, TOKEN, ALICE, 0).unwrap();
    assert_eq!(seen.consumed, u(0));

    match h.engine.strategy(SINGLE) {
        Some(Strategy::SingleLimit(s)) => {
            let at_start = s
                .get_limit(TOKEN, ALICE, tollgate::TimePoint::new(1))
                .unwrap();
            assert_eq!(at_start.consumed, u(10));
        }
        other => panic!("expected a single-limit strategy, got {other:?}"),
    }
}

#[test]
fn test_set_limit_requires_protection_admin_of_token() {
    let mut h = harness();
    let start = h.engine.now();

    let err = h
        .engine
        .with_single_limit(SINGLE, |s, g, cx| {
            s.set_limit(g, cx, STRANGER, TOKEN, ALICE, limit(10, 5, start))
        })
        .unwrap_err();
    assert_eq!(err, GuardError::NotProtectionAdmin);
    assert_eq!(err.to_string(), "not protection admin");
    assert!(!h.engine.is_address_protected(TOKEN, ALICE));
}

#[test]
fn test_unverified_account_cannot_be_protected() {
    let mut h = harness();
    let start = h.engine.now();

    let err = h
        .engine
        .with_single_limit(SINGLE, |s, g, cx| {
            s.set_limit_batched(g, cx, PROTECTION_ADMIN, TOKEN, &[ALICE, CAROL], limit(10, 5, start))
        })
        .unwrap_err();
    assert_eq!(err, GuardError::AddressNotVerified);
    assert!(!h.engine.is_address_protected(TOKEN, ALICE));
    assert!(h.engine.events().is_empty());
}

#[test]
fn test_remove_guards_lifts_protection() {
    let mut h = harness();
    h.single_limit(TOKEN, ALICE, 1, 100);
    h.send(TOKEN, ALICE, BOB, 1).unwrap();

    h.engine
        .remove_guards(SINGLE, PROTECTION_ADMIN, TOKEN, &[ALICE])
        .unwrap();
    assert!(!h.engine.is_address_protected(TOKEN, ALICE));
    h.send(TOKEN, ALICE, BOB, 500).unwrap();
}

// ============================================================================
// Multi limit
// ============================================================================

#[test]
fn test_multi_limit_requires_every_limit() {
    let mut h = harness();
    h.multi_limit(TOKEN, ALICE, &[(5, 10), (10, 15)]);

    h.send(TOKEN, ALICE, BOB, 3).unwrap();
    h.advance(4);
    assert_eq!(reason(h.send(TOKEN, ALICE, BOB, 3)), "limit reached");

    let limits = multi_limits(&h);
    assert_eq!(limits.len(), 2);
    assert_eq!(limits[0].consumed, u(3));
    assert_eq!(limits[1].consumed, u(3));
}

#[test]
fn test_multi_limit_windows_roll_independently() {
    let mut h = harness();
    h.multi_limit(TOKEN, ALICE, &[(5, 10), (10, 15)]);

    h.send(TOKEN, ALICE, BOB, 5).unwrap();
    h.advance(10);
    h.send(TOKEN, ALICE, BOB, 5).unwrap();

    // The long window has reset, the short one is still full.
    h.advance(5);
    assert_eq!(reason(h.send(TOKEN, ALICE, BOB, 1)), "limit reached");

    h.advance(5);
    h.send(TOKEN, ALICE, BOB, 5).unwrap();
    let limits = multi_limits(&h);
    assert_eq!(limits[0].consumed, u(5));
    assert_eq!(limits[1].consumed, u(5));
}

#[test]
fn test_multi_limit_index_access() {
    let mut h = harness();
    h.multi_limit(TOKEN, ALICE, &[(5, 10), (10, 15)]);

    assert_eq!(h.engine.limit(MULTI, TOKEN, ALICE, 1).unwrap().cap, u(10));
    assert_eq!(
        h.engine.limit(MULTI, TOKEN, ALICE, 2),
        Err(GuardError::LimitIndexOutOfRange { index: 2, len: 2 })
    );
    assert_eq!(
        h.engine.limit(TREASURY, TOKEN, ALICE, 0),
        Err(GuardError::kind_mismatch(TREASURY))
    );
}

// ============================================================================
// Pause
// ============================================================================

#[test]
fn test_pause_blocks_and_unpause_restores() {
    let mut h = harness();
    h.multi_limit(TOKEN, ALICE, &[(50, 10), (100, 20)]);
    h.send(TOKEN, ALICE, BOB, 7).unwrap();
    let before = multi_limits(&h);

    h.engine.pause(MULTI, PROTECTION_ADMIN, TOKEN, ALICE).unwrap();
    assert_eq!(reason(h.send(TOKEN, ALICE, BOB, 1)), "limit reached");
    assert_eq!(
        h.engine.pause(MULTI, PROTECTION_ADMIN, TOKEN, ALICE),
        Err(GuardError::AlreadyPaused)
    );

    h.engine.unpause(MULTI, PROTECTION_ADMIN, TOKEN, ALICE).unwrap();
    assert_eq!(multi_limits(&h), before);
    assert_eq!(
        h.engine.unpause(MULTI, PROTECTION_ADMIN, TOKEN, ALICE),
        Err(GuardError::NotPaused)
    );
    h.send(TOKEN, ALICE, BOB, 1).unwrap();
}

#[test]
fn test_single_limit_pause() {
    let mut h = harness();
    h.single_limit(TOKEN, ALICE, 1_000, 10);

    h.engine.pause(SINGLE, PROTECTION_ADMIN, TOKEN, ALICE).unwrap();
    assert_eq!(reason(h.send(TOKEN, ALICE, BOB, 1)), "limit reached");

    h.engine.unpause(SINGLE, PROTECTION_ADMIN, TOKEN, ALICE).unwrap();
    h.send(TOKEN, ALICE, BOB, 1).unwrap();
}

#[test]
fn test_pause_by_former_strategy_is_rejected() {
    let mut h = harness();
    h.single_limit(TOKEN, ALICE, 1_000, 10);
    h.multi_limit(TOKEN, ALICE, &[(1_000, 10)]);
    assert_eq!(h.engine.protected_strategy(TOKEN, ALICE), Some(MULTI));
    h.engine.drain_events();

    assert_eq!(
        h.engine.pause(SINGLE, PROTECTION_ADMIN, TOKEN, ALICE),
        Err(GuardError::NotProtected)
    );
    assert!(h.engine.events().is_empty());

    // Pausing through the governing strategy still takes effect.
    h.engine.pause(MULTI, PROTECTION_ADMIN, TOKEN, ALICE).unwrap();
    assert_eq!(reason(h.send(TOKEN, ALICE, BOB, 5)), "limit reached");
}

#[test]
fn test_reconfiguring_paused_account_keeps_it_paused() {
    let mut h = harness();
    h.single_limit(TOKEN, ALICE, 10, 10);
    h.engine.pause(SINGLE, PROTECTION_ADMIN, TOKEN, ALICE).unwrap();

    h.single_limit(TOKEN, ALICE, 1_000, 10);
    assert_eq!(reason(h.send(TOKEN, ALICE, BOB, 1)), "limit reached");
    assert!(!h
        .engine
        .events()
        .iter()
        .any(|event| matches!(event, GuardEvent::Unpaused { .. })));

    h.engine.unpause(SINGLE, PROTECTION_ADMIN, TOKEN, ALICE).unwrap();
    h.send(TOKEN, ALICE, BOB, 500).unwrap();
}

#[test]
fn test_pause_requires_protection() {
    let mut h = harness();

    assert_eq!(
        h.engine.pause(SINGLE, PROTECTION_ADMIN, TOKEN, BOB),
        Err(GuardError::NotProtected)
    );
    assert_eq!(
        h.engine.pause(SINGLE, STRANGER, TOKEN, BOB),
        Err(GuardError::NotProtectionAdmin)
    );

    h.single_limit(TOKEN, ALICE, 10, 10);
    let err = h.engine.unpause(SINGLE, STRANGER, TOKEN, ALICE).unwrap_err();
    assert_eq!(err, GuardError::NotProtectionAdmin);
    assert!(err.is_unauthorized());
}

// ============================================================================
// Migration
// ============================================================================

#[test]
fn test_migrate_between_treasury_and_liquidity() {
    let mut h = harness();
    h.treasury(TOKEN, ALICE, &[CAROL]);
    assert_eq!(reason(h.send(TOKEN, ALICE, BOB, 1)), "recipient not whitelisted");

    let start = h.engine.now();
    h.engine
        .with_multi_limit(MULTI, |s, g, cx| {
            s.set_guarded_list(g, cx, PROTECTION_ADMIN, TOKEN, &[ALICE], &[limit(10, 10, start)], &[MULTI])
        })
        .unwrap();
    assert_eq!(h.engine.protected_strategy(TOKEN, ALICE), Some(MULTI));
    h.send(TOKEN, ALICE, BOB, 10).unwrap();
    assert_eq!(reason(h.send(TOKEN, ALICE, BOB, 1)), "limit reached");

    h.engine
        .with_multi_limit(MULTI, |s, g, cx| {
            s.set_guarded_list(g, cx, PROTECTION_ADMIN, TOKEN, &[ALICE], &[], &[TREASURY])
        })
        .unwrap();
    assert_eq!(h.engine.protected_strategy(TOKEN, ALICE), Some(TREASURY));
    assert!(multi_limits(&h).is_empty());
    h.send(TOKEN, ALICE, CAROL, 500).unwrap();
}
