//! Integration tests for per-token scoping.
//!
//! Whatever happens on one token must never be observable on another.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use proptest::prelude::*;
use tollgate::{Address, LimitSnapshot, U256};

use crate::common::{
    account, amount, cap_and_window, harness, limit, u, Harness, ALICE, BOB, CAROL, MULTI,
    OTHER_TOKEN, PROTECTION_ADMIN, REFUND_ADMIN, SINGLE, TOKEN, TREASURY,
};

/// An operation on `TOKEN`.
#[derive(Debug, Clone)]
enum Op {
    SingleLimit(Address, (u64, u64)),
    MultiLimit(Address, Vec<(u64, u64)>),
    Whitelist(Address),
    Transfer(Address, u64),
    Pause(Address),
    Unpause(Address),
    RemoveGuards(Address),
    Threshold(Address, u64),
    Advance(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (account(), cap_and_window()).prop_map(|(a, l)| Op::SingleLimit(a, l)),
        (account(), prop::collection::vec(cap_and_window(), 1..4))
            .prop_map(|(a, ls)| Op::MultiLimit(a, ls)),
        account().prop_map(Op::Whitelist),
        (account(), amount()).prop_map(|(a, n)| Op::Transfer(a, n)),
        account().prop_map(Op::Pause),
        account().prop_map(Op::Unpause),
        account().prop_map(Op::RemoveGuards),
        (account(), amount()).prop_map(|(a, n)| Op::Threshold(a, n)),
        (1u64..20).prop_map(Op::Advance),
    ]
}

/// Apply `op` to `TOKEN`, ignoring rejections.
fn apply(h: &mut Harness, op: &Op) {
    match op {
        Op::SingleLimit(a, (cap, window)) => h.single_limit(TOKEN, *a, *cap, *window),
        Op::MultiLimit(a, limits) => h.multi_limit(TOKEN, *a, limits),
        Op::Whitelist(a) => h.treasury(TOKEN, *a, &[CAROL]),
        Op::Transfer(a, n) => {
            let _ = h.send(TOKEN, *a, CAROL, *n);
        }
        Op::Pause(a) => {
            let _ = h.engine.pause(SINGLE, PROTECTION_ADMIN, TOKEN, *a);
            let _ = h.engine.pause(MULTI, PROTECTION_ADMIN, TOKEN, *a);
        }
        Op::Unpause(a) => {
            let _ = h.engine.unpause(SINGLE, PROTECTION_ADMIN, TOKEN, *a);
            let _ = h.engine.unpause(MULTI, PROTECTION_ADMIN, TOKEN, *a);
        }
        Op::RemoveGuards(a) => {
            for id in [SINGLE, MULTI, TREASURY] {
                let _ = h.engine.remove_guards(id, PROTECTION_ADMIN, TOKEN, &[*a]);
            }
        }
        Op::Threshold(a, n) => {
            let _ = h
                .engine
                .set_guarded_list(PROTECTION_ADMIN, TOKEN, &[*a], &[u(*n)]);
        }
        Op::Advance(n) => h.advance(*n),
    }
}

/// Everything observable about `OTHER_TOKEN`.
#[derive(Debug, PartialEq, Eq)]
struct View {
    protected: Vec<Option<tollgate::StrategyId>>,
    frozen: Vec<bool>,
    balances: Vec<U256>,
    limit: Option<LimitSnapshot>,
    allowed: bool,
}

fn observe(h: &Harness) -> View {
    let accounts = [ALICE, BOB, CAROL];
    View {
        protected: accounts
            .iter()
            .map(|&a| h.engine.protected_strategy(OTHER_TOKEN, a))
            .collect(),
        frozen: accounts
            .iter()
            .map(|&a| h.engine.is_frozen(OTHER_TOKEN, a))
            .collect(),
        balances: accounts.iter().map(|&a| h.balance(OTHER_TOKEN, a)).collect(),
        limit: h.engine.limit(SINGLE, OTHER_TOKEN, BOB, 0).ok(),
        allowed: h.engine.is_transfer_allowed_legacy(OTHER_TOKEN, ALICE, u(1_000)),
    }
}

/// `BOB` carries a single limit on `OTHER_TOKEN` that no operation on
/// `TOKEN` should disturb. The window is long enough that the clock moving
/// never rolls it over.
fn isolated_harness() -> Harness {
    let mut h = harness();
    let start = h.engine.now();
    h.engine
        .with_single_limit(SINGLE, |s, g, cx| {
            s.set_limit(g, cx, PROTECTION_ADMIN, OTHER_TOKEN, BOB, limit(500, u64::MAX, start))
        })
        .unwrap();
    h.send(OTHER_TOKEN, BOB, ALICE, 100).unwrap();
    h
}

#[test]
fn test_roles_are_per_token() {
    let mut h = harness();
    let other_admin = Address::repeat_byte(0x55);

    h.engine
        .set_protection_admin(crate::common::TOKEN_ADMIN, TOKEN, other_admin)
        .unwrap();
    assert_eq!(h.engine.guardian().protection_admin(TOKEN), Some(other_admin));
    assert_eq!(
        h.engine.guardian().protection_admin(OTHER_TOKEN),
        Some(PROTECTION_ADMIN)
    );
    assert_eq!(
        h.engine.guardian().refund_admin(OTHER_TOKEN),
        Some(REFUND_ADMIN)
    );
}

#[test]
fn test_limit_on_one_token_leaves_other_unprotected() {
    let mut h = harness();
    h.single_limit(TOKEN, ALICE, 1, 10);

    assert!(h.engine.is_address_protected(TOKEN, ALICE));
    assert!(!h.engine.is_address_protected(OTHER_TOKEN, ALICE));
    h.send(OTHER_TOKEN, ALICE, BOB, 1_000).unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_operations_on_one_token_never_leak(ops in prop::collection::vec(op(), 1..24)) {
        let mut h = isolated_harness();
        let before = observe(&h);

        for op in &ops {
            apply(&mut h, op);
        }

        prop_assert_eq!(observe(&h), before);
    }
}
