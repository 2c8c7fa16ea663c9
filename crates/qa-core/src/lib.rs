pub mod config;
pub mod error;
pub mod ports;
pub mod types;

pub use config::EngineConfig;
pub use error::{QaError, Result};
pub use types::*;
