//! Conversational interface for the policy QA engine (C5, C7).
//!
//! Owns the per-session caches and the finite-state QA orchestrator that
//! classifies a query, loads cached policy context, decides whether the
//! corpus alone is sufficient, optionally enriches from the web, and
//! generates a cited answer.

pub mod answer;
pub mod cache;
pub mod classify;
pub mod error;
pub mod orchestrator;
pub mod state_machine;

pub use answer::TemplateAnswerGenerator;
pub use cache::{spawn_sweep_task, ChatCache, PolicyContextCache};
pub use classify::{classify_query_type, extract_keywords, is_homepage_or_url_query};
pub use error::ChatError;
pub use orchestrator::QaWorkflow;
pub use state_machine::{next_node, Edge, NodeId};
