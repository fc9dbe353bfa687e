//! Pure settlement computation: splitting, aggregation and netting.
//!
//! Nothing in here touches storage or blocks.

pub mod aggregator;
pub mod simplifier;
pub mod splitter;

pub use aggregator::{Aggregation, BalanceAggregator, Balances, IntegrityIssue, IntegrityWarning, validate_ledger};
pub use simplifier::DebtSimplifier;
pub use splitter::{ExpenseSplitter, RemainderPolicy, round_cents};
