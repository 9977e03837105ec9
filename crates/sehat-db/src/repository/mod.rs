//! # Repository Implementations
//!
//! One repository per aggregate. Repositories are thin row mappers:
//! reads go through the pool, ledger-mutating statements take an
//! explicit `&mut SqliteConnection` so the services can compose them
//! inside one transaction.

pub mod audit;
pub mod batch;
pub mod expense;
pub mod product;
pub mod returns;
pub mod sale;
