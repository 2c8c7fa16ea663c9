//! Dense + sparse retrieval: embedding service, in-memory vector store,
//! BM25 sparse index, tokenizer, and the hybrid searcher that fuses them.

pub mod bm25;
pub mod embedding;
pub mod hybrid;
pub mod index;
pub mod tokenizer;

pub use bm25::Bm25Index;
pub use embedding::{DynEmbeddingService, EmbeddingService, MockEmbedding};
pub use hybrid::HybridSearcher;
pub use index::InMemoryVectorStore;
