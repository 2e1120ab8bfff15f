//! Fuzz target for fixed-window limit accounting.
//!
//! Drives a [`LimitLedger`] with arbitrary sequences of configuration,
//! pause and admission operations, checking after every step that:
//! - no limit reports more consumed than its cap
//! - a denied admission leaves every limit unchanged
//! - a paused account admits nothing
//!
//! # Running
//!
//! ```bash
//! cargo +nightly fuzz run limit_ledger
//! ```

#![no_main]

use alloy_primitives::{Address, U256};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tollgate_core::types::{LimitSpec, TimePoint};
use tollgate_policy::{Limit, LimitLedger};

const TOKEN: Address = Address::repeat_byte(0x10);

#[derive(Debug, Arbitrary)]
enum Op {
    Set { account: u8, limits: Vec<(u64, u64)> },
    Extend { account: u8, limits: Vec<(u64, u64)> },
    Remove { account: u8 },
    Pause { account: u8 },
    Unpause { account: u8 },
    Consume { account: u8, amount: u64 },
    Advance { units: u16 },
}

fn account(selector: u8) -> Address {
    Address::repeat_byte(selector % 4)
}

fn limits(specs: &[(u64, u64)], now: TimePoint) -> Vec<Limit> {
    specs
        .iter()
        .take(8)
        .map(|&(cap, window)| Limit::new(LimitSpec::new(U256::from(cap), window, now)))
        .collect()
}

fuzz_target!(|ops: Vec<Op>| {
    let mut ledger = LimitLedger::new();
    let mut now = TimePoint::ZERO;

    for op in ops {
        match op {
            Op::Set { account: a, limits: specs } => {
                ledger.set(TOKEN, account(a), limits(&specs, now));
            }
            Op::Extend { account: a, limits: specs } => {
                ledger.extend(TOKEN, account(a), limits(&specs, now));
            }
            Op::Remove { account: a } => {
                ledger.remove(TOKEN, account(a));
            }
            Op::Pause { account: a } => {
                let _ = ledger.pause(TOKEN, account(a), now);
            }
            Op::Unpause { account: a } => {
                let _ = ledger.unpause(TOKEN, account(a));
            }
            Op::Consume { account: a, amount } => {
                let a = account(a);
                let before = ledger.snapshots(TOKEN, a, now);
                let paused = ledger.is_paused(TOKEN, a);
                let result = ledger.try_consume(TOKEN, a, U256::from(amount), now);

                if result.is_err() {
                    assert_eq!(ledger.snapshots(TOKEN, a, now), before);
                }
                if paused {
                    assert!(result.is_err());
                }
            }
            Op::Advance { units } => {
                now = now.saturating_add(u64::from(units));
            }
        }

        for selector in 0..4 {
            for snapshot in ledger.snapshots(TOKEN, account(selector), now) {
                assert!(snapshot.consumed <= snapshot.cap);
            }
        }
    }
});
