use thiserror::Error;

/// Top-level error type for the policy QA engine.
///
/// Each variant names an error *kind* rather than a type: subsystem
/// crates raise these directly (or wrap a lower-level error via `From`)
/// so that `?` works seamlessly across crate boundaries, and the API
/// layer maps each kind to an HTTP status independently of where it was
/// raised.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QaError {
    /// No `PolicyContext` cached for this session; caller must call
    /// init-policy first.
    #[error("policy not initialized for this session")]
    PreconditionPolicyNotInitialized,

    /// The vector store (dense search or scroll) could not be reached.
    #[error("vector store transport error: {0}")]
    TransportVectorStore(String),

    /// The relational metadata store could not be reached.
    #[error("metadata store transport error: {0}")]
    TransportMetadataStore(String),

    /// The answer-generation backend (LLM) could not be reached.
    #[error("answer generator transport error: {0}")]
    TransportLlm(String),

    /// The web-search provider could not be reached.
    #[error("web search transport error: {0}")]
    TransportWebSearch(String),

    /// A query vector with the wrong dimensionality (or otherwise
    /// malformed) was passed to dense search.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Malformed request input (empty message, unknown fusion mode, …).
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced policy id does not exist in the relational store.
    #[error("policy not found: {0}")]
    NotFoundPolicy(i64),

    /// Generic storage-layer failure not covered by a more specific
    /// transport variant (e.g. local SQLite file I/O, migrations).
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded/parsed/saved.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// A lock guarding shared state was poisoned by a panicking holder.
    #[error("internal lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<toml::de::Error> for QaError {
    fn from(err: toml::de::Error) -> Self {
        QaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for QaError {
    fn from(err: toml::ser::Error) -> Self {
        QaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for QaError {
    fn from(err: serde_json::Error) -> Self {
        QaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for QA-engine operations.
pub type Result<T> = std::result::Result<T, QaError>;
