//! Bursa Ledger - governance token balances and locks.
//!
//! A pure balance and lock store: no interest, no decay. Token holdings
//! are created on first issuance and never deleted. Every time-dependent
//! read takes an explicit instant, so the caller's clock is authoritative.

pub mod holding;
pub mod ledger;

pub use holding::{TokenHolding, TokenSource};
pub use ledger::TokenLedger;
