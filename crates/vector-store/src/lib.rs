//! # Reco Vector Store
//!
//! Catalog snapshots and the embedding index used for semantic matching.
//!
//! ## Architecture
//!
//! ```text
//! Catalog (ordered products)
//!     │
//!     ├──> Embedder (fastembed MiniLM / hashed / stub)
//!     │      └─> Vector[dim], L2-normalized
//!     │
//!     └──> EmbeddingIndex (dense matrix, inner-product search)
//!            └─> IndexHandle (Arc snapshot, atomic rebuild-and-swap)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use reco_vector_store::{Catalog, EmbeddingModel, IndexHandle};
//! use std::sync::Arc;
//!
//! fn main() -> reco_vector_store::Result<()> {
//!     let catalog = Arc::new(Catalog::builtin()?);
//!     let handle = IndexHandle::build(catalog, Arc::new(EmbeddingModel::new()?))?;
//!
//!     let index = handle.snapshot();
//!     for hit in index.search("customer service representative", 3)? {
//!         println!("{}: {:.3}", hit.product.product_id, hit.score);
//!     }
//!     Ok(())
//! }
//! ```

mod catalog;
mod embeddings;
mod error;
mod handle;
mod index;
mod types;

pub use catalog::{Catalog, CATALOG_SCHEMA_VERSION};
pub use embeddings::{
    model_dir, Embedder, EmbeddingMode, EmbeddingModel, DEFAULT_DIMENSION, FAST_MODEL_DIMENSION,
};
pub use error::{Result, VectorStoreError};
pub use handle::IndexHandle;
pub use index::{product_text, EmbeddingIndex};
pub use types::{SearchHit, SemanticScores};
