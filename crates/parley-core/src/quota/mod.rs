//! Per-user question balances and eligibility.

pub mod ledger;
