//! End-to-end tests over the public engine API.

pub mod isolation_test;
pub mod liquidity_test;
pub mod refund_test;
pub mod treasury_test;
