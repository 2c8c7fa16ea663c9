//! HTTP surface for the policy QA/search engine — axum router, route
//! handlers, auth and rate-limit middleware, and error→status mapping.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
