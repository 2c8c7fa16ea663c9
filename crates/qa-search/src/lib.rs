//! Policy-discovery search crate — C8's stateless hybrid-search pipeline
//! sitting alongside `qa-chat`'s stateful QA workflow.

pub mod workflow;

pub use workflow::{SearchOutcome, SearchWorkflow};
