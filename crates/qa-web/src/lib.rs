//! Web-search adapter (C6) for the policy QA engine.
//!
//! A single deadline-bounded call to an external search provider, with a
//! deterministic mock for tests and local development.

pub mod adapter;

pub use adapter::{HttpWebSearch, MockWebSearch};
