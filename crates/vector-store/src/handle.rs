use crate::catalog::Catalog;
use crate::embeddings::Embedder;
use crate::error::Result;
use crate::index::EmbeddingIndex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Shared pointer to the live index.
///
/// Readers take an `Arc` snapshot and keep using it for the whole call; a
/// rebuild builds the replacement without holding the lock and only takes the
/// write lock to exchange pointers.
#[derive(Debug)]
pub struct IndexHandle {
    current: RwLock<Arc<EmbeddingIndex>>,
    generation: AtomicU64,
}

impl IndexHandle {
    #[must_use]
    pub fn new(index: EmbeddingIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn build(catalog: Arc<Catalog>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        Ok(Self::new(EmbeddingIndex::build(catalog, embedder)?))
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<EmbeddingIndex> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install `index` and return the one it replaced.
    pub fn swap(&self, index: EmbeddingIndex) -> Arc<EmbeddingIndex> {
        let next = Arc::new(index);
        let previous = {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, next)
        };
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        log::info!("Embedding index swapped (generation {generation})");
        previous
    }

    /// Build a fresh index for `catalog` and swap it in. On failure the
    /// current index stays live.
    pub fn rebuild(
        &self,
        catalog: Arc<Catalog>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Arc<EmbeddingIndex>> {
        let index = EmbeddingIndex::build(catalog, embedder)?;
        Ok(self.swap(index))
    }

    /// Number of completed swaps since construction.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
