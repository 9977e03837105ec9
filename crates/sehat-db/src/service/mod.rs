//! # Ledger Services
//!
//! Transaction-scoped operations over the repositories. Every mutating
//! service opens one transaction and commits all of its row inserts,
//! batch decrements/increments and header updates together - or none of
//! them. This is the single most important correctness property of the
//! ledger: a sale that decrements one batch and fails on a later line
//! leaves no trace.
//!
//! - [`sale`] - sale creation (FEFO consumption) and the receipt read
//! - [`returns`] - return creation and the administrative repair pass
//! - [`purchase`] - stock intake feeding the batch ledger
//! - [`report`] - read-only profit/COGS aggregation

pub mod purchase;
pub mod report;
pub mod returns;
pub mod sale;
