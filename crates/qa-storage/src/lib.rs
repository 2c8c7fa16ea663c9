//! SQLite persistence for the policy/chunk corpus.
//!
//! Provides a WAL-mode SQLite database with migrations and a
//! `PolicyRepository` implementation (C1's relational adapter, plus the
//! scroll source for the BM25 index build in `qa-vector`).

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::SqlitePolicyRepository;
