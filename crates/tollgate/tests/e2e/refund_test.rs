//! Integration tests for the legacy freeze rule and the refund flow.
//!
//! These tests verify:
//! - A transfer over the sender's threshold freezes the recipient
//! - Frozen accounts cannot send until unfrozen
//! - Propose, cancel and execute round-trips, with and without the timelock

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use tollgate::{Config, GuardError, GuardEvent, Guardian, TollgateError, B256};

use crate::common::{
    harness, harness_with, u, Harness, ALICE, CAROL, PROTECTION_ADMIN, RECOVERY, REFUND_ADMIN,
    STRANGER, TOKEN,
};

const SALT: B256 = B256::repeat_byte(0x5a);

/// `ALICE` has a threshold of 100 and has just sent 150 to `CAROL`, who is
/// now frozen.
fn frozen_carol(h: &mut Harness) {
    h.engine
        .set_guarded_list(PROTECTION_ADMIN, TOKEN, &[ALICE], &[u(100)])
        .unwrap();
    h.send(TOKEN, ALICE, CAROL, 150).unwrap();
    assert!(h.engine.is_frozen(TOKEN, CAROL));
}

// ============================================================================
// Freeze
// ============================================================================

#[test]
fn test_transfer_over_threshold_freezes_recipient() {
    let mut h = harness();
    h.engine
        .set_guarded_list(PROTECTION_ADMIN, TOKEN, &[ALICE], &[u(100)])
        .unwrap();
    assert!(h.engine.is_transfer_allowed_legacy(TOKEN, ALICE, u(100)));
    assert!(!h.engine.is_transfer_allowed_legacy(TOKEN, ALICE, u(101)));

    h.send(TOKEN, ALICE, CAROL, 100).unwrap();
    assert!(!h.engine.is_frozen(TOKEN, CAROL));

    h.send(TOKEN, ALICE, CAROL, 150).unwrap();
    assert!(h.engine.is_frozen(TOKEN, CAROL));
    assert!(!h.engine.is_frozen(TOKEN, ALICE));
    assert_eq!(h.balance(TOKEN, CAROL), u(250));
    assert_eq!(
        h.engine.events().last(),
        Some(&GuardEvent::AccountFrozen {
            token: TOKEN,
            account: CAROL
        })
    );
}

#[test]
fn test_frozen_account_cannot_send_until_unfrozen() {
    let mut h = harness();
    frozen_carol(&mut h);

    let err = h.send(TOKEN, CAROL, RECOVERY, 1).unwrap_err();
    assert_eq!(err.reason(), "address frozen");

    assert_eq!(
        h.engine.unfreeze(STRANGER, TOKEN, &[CAROL]),
        Err(GuardError::NotProtectionAdmin)
    );
    h.engine.unfreeze(PROTECTION_ADMIN, TOKEN, &[CAROL]).unwrap();
    // Unfreezing an account that is not frozen is harmless.
    h.engine.unfreeze(PROTECTION_ADMIN, TOKEN, &[CAROL]).unwrap();

    h.send(TOKEN, CAROL, RECOVERY, 1).unwrap();
}

#[test]
fn test_guarded_list_requires_guard_admin() {
    let mut h = harness();

    assert_eq!(
        h.engine.set_guarded_list(STRANGER, TOKEN, &[ALICE], &[u(1)]),
        Err(GuardError::Unauthorized)
    );
    assert_eq!(
        h.engine.set_guard_admin(STRANGER, TOKEN, STRANGER),
        Err(GuardError::Unauthorized)
    );
}

// ============================================================================
// Refunds
// ============================================================================

#[test]
fn test_propose_then_cancel_leaves_no_entry() {
    let mut h = harness();
    frozen_carol(&mut h);
    let id = Guardian::hash_operation(TOKEN, CAROL, RECOVERY, SALT);
    assert_eq!(h.engine.guardian().refund_proposed_at(id), None);

    let proposed = h
        .engine
        .propose_refund(REFUND_ADMIN, TOKEN, CAROL, RECOVERY, SALT)
        .unwrap();
    assert_eq!(proposed, id);
    assert_eq!(
        h.engine
            .propose_refund(REFUND_ADMIN, TOKEN, CAROL, RECOVERY, SALT),
        Err(GuardError::RefundAlreadyProposed)
    );

    h.engine
        .cancel_refund_proposal(REFUND_ADMIN, TOKEN, CAROL, RECOVERY, SALT)
        .unwrap();
    assert_eq!(h.engine.guardian().refund_proposed_at(id), None);
    assert_eq!(
        h.engine
            .cancel_refund_proposal(REFUND_ADMIN, TOKEN, CAROL, RECOVERY, SALT),
        Err(GuardError::RefundNotFound)
    );
}

#[test]
fn test_propose_then_execute_moves_whole_balance() {
    let mut h = harness();
    frozen_carol(&mut h);
    let before = h.balance(TOKEN, CAROL);

    h.engine
        .propose_refund(REFUND_ADMIN, TOKEN, CAROL, RECOVERY, SALT)
        .unwrap();

    let err = h
        .engine
        .execute_refund(REFUND_ADMIN, TOKEN, CAROL, RECOVERY, SALT)
        .unwrap_err();
    assert_eq!(err.reason(), "timelock not elapsed");

    h.advance(Config::default().guardian.timelock_period);
    let moved = h
        .engine
        .execute_refund(REFUND_ADMIN, TOKEN, CAROL, RECOVERY, SALT)
        .unwrap();

    assert_eq!(moved, before);
    assert_eq!(h.balance(TOKEN, CAROL), u(0));
    assert_eq!(h.balance(TOKEN, RECOVERY), before);
    assert!(matches!(
        h.engine
            .execute_refund(REFUND_ADMIN, TOKEN, CAROL, RECOVERY, SALT),
        Err(TollgateError::Guard(GuardError::RefundNotFound))
    ));
}

#[test]
fn test_execute_without_timelock_enforcement() {
    let config = Config::builder().enforce_timelock(false).build();
    let mut h = harness_with(&config);
    frozen_carol(&mut h);

    h.engine
        .propose_refund(REFUND_ADMIN, TOKEN, CAROL, RECOVERY, SALT)
        .unwrap();
    let moved = h
        .engine
        .execute_refund(REFUND_ADMIN, TOKEN, CAROL, RECOVERY, SALT)
        .unwrap();
    assert_eq!(moved, u(150));
}

#[test]
fn test_refund_requires_frozen_source_and_refund_admin() {
    let mut h = harness();

    assert_eq!(
        h.engine
            .propose_refund(REFUND_ADMIN, TOKEN, CAROL, RECOVERY, SALT),
        Err(GuardError::AddressNotFrozen)
    );

    frozen_carol(&mut h);
    assert_eq!(
        h.engine
            .propose_refund(PROTECTION_ADMIN, TOKEN, CAROL, RECOVERY, SALT),
        Err(GuardError::NotRefundAdmin)
    );
}

#[test]
fn test_timelock_period_is_admin_only() {
    let mut h = harness();
    frozen_carol(&mut h);

    assert_eq!(
        h.engine.set_timelock_period(STRANGER, 0),
        Err(GuardError::NotAdmin)
    );
    h.engine
        .set_timelock_period(crate::common::ADMIN, 3)
        .unwrap();

    h.engine
        .propose_refund(REFUND_ADMIN, TOKEN, CAROL, RECOVERY, SALT)
        .unwrap();
    h.advance(3);
    h.engine
        .execute_refund(REFUND_ADMIN, TOKEN, CAROL, RECOVERY, SALT)
        .unwrap();
}
