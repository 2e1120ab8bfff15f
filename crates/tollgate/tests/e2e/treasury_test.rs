//! Integration tests for the treasury whitelist strategy.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use tollgate::{GuardError, Strategy};

use crate::common::{
    harness, u, ALICE, BOB, CAROL, PROTECTION_ADMIN, RECOVERY, STRANGER, TOKEN, TREASURY,
};

fn whitelist(h: &crate::common::Harness) -> Vec<tollgate::Address> {
    match h.engine.strategy(TREASURY) {
        Some(Strategy::Treasury(s)) => s.whitelist(TOKEN, ALICE),
        other => panic!("expected a treasury strategy, got {other:?}"),
    }
}

#[test]
fn test_only_whitelisted_destinations_are_admitted() {
    let mut h = harness();
    h.treasury(TOKEN, ALICE, &[CAROL]);

    let err = h.send(TOKEN, ALICE, BOB, 1).unwrap_err();
    assert_eq!(err.reason(), "recipient not whitelisted");
    assert_eq!(err.as_guard(), Some(&GuardError::RecipientNotWhitelisted));
    assert_eq!(h.balance(TOKEN, BOB), u(crate::common::INITIAL_BALANCE));

    h.send(TOKEN, ALICE, CAROL, 123_456).unwrap();
    assert_eq!(h.balance(TOKEN, CAROL), u(123_456));
}

#[test]
fn test_whitelist_merges() {
    let mut h = harness();
    h.treasury(TOKEN, ALICE, &[CAROL]);
    h.treasury(TOKEN, ALICE, &[RECOVERY, CAROL]);

    let mut expected = vec![CAROL, RECOVERY];
    expected.sort();
    assert_eq!(whitelist(&h), expected);

    h.send(TOKEN, ALICE, RECOVERY, 1).unwrap();
    h.send(TOKEN, ALICE, CAROL, 1).unwrap();
}

#[test]
fn test_whitelist_requires_protection_admin() {
    let mut h = harness();

    let err = h
        .engine
        .with_treasury(TREASURY, |s, g, cx| {
            s.set_protected_address(g, cx, STRANGER, TOKEN, ALICE, &[CAROL])
        })
        .unwrap_err();
    assert_eq!(err, GuardError::NotProtectionAdmin);
    assert!(!h.engine.is_address_protected(TOKEN, ALICE));
}

#[test]
fn test_guarded_list_checks_amounts_length() {
    let mut h = harness();

    let err = h
        .engine
        .with_treasury(TREASURY, |s, g, cx| {
            s.set_guarded_list(g, cx, PROTECTION_ADMIN, TOKEN, &[ALICE, BOB], &[u(1)], &[TREASURY, TREASURY])
        })
        .unwrap_err();
    assert_eq!(err, GuardError::length_mismatch(2, 1));
    assert_eq!(err.reason(), "length mismatch");

    h.engine
        .with_treasury(TREASURY, |s, g, cx| {
            s.set_guarded_list(g, cx, PROTECTION_ADMIN, TOKEN, &[ALICE, BOB], &[u(1), u(2)], &[TREASURY, TREASURY])
        })
        .unwrap();
    assert!(h.engine.is_address_protected(TOKEN, BOB));

    // Protected with an empty whitelist: nothing is admitted.
    assert_eq!(
        h.send(TOKEN, BOB, CAROL, 1).unwrap_err().reason(),
        "recipient not whitelisted"
    );
}

#[test]
fn test_remove_guards_clears_whitelist() {
    let mut h = harness();
    h.treasury(TOKEN, ALICE, &[CAROL]);

    h.engine
        .remove_guards(TREASURY, PROTECTION_ADMIN, TOKEN, &[ALICE])
        .unwrap();
    assert!(!h.engine.is_address_protected(TOKEN, ALICE));
    assert!(whitelist(&h).is_empty());
    h.send(TOKEN, ALICE, BOB, 10).unwrap();
}

#[test]
fn test_treasury_cannot_be_paused() {
    let mut h = harness();
    h.treasury(TOKEN, ALICE, &[CAROL]);

    assert_eq!(
        h.engine.pause(TREASURY, PROTECTION_ADMIN, TOKEN, ALICE),
        Err(GuardError::kind_mismatch(TREASURY))
    );
}
