use crate::catalog::Catalog;
use crate::embeddings::{ensure_dimension, normalize, Embedder};
use crate::error::{Result, VectorStoreError};
use crate::types::{SearchHit, SemanticScores};
use ndarray::{Array1, Array2};
use reco_protocol::Product;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Immutable similarity index over one catalog snapshot.
///
/// Row `i` of the matrix is the unit-length embedding of `catalog.products()[i]`,
/// so an inner product with a normalized query is the cosine similarity.
pub struct EmbeddingIndex {
    catalog: Arc<Catalog>,
    embedder: Arc<dyn Embedder>,
    vectors: Option<Array2<f32>>,
}

impl fmt::Debug for EmbeddingIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingIndex")
            .field("products", &self.catalog.len())
            .field("dimension", &self.embedder.dimension())
            .field("vectors", &self.len())
            .finish()
    }
}

impl EmbeddingIndex {
    /// Embed every product in one batch and store the normalized vectors.
    pub fn build(catalog: Arc<Catalog>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if catalog.is_empty() {
            log::info!("Catalog is empty; semantic search disabled");
            return Ok(Self {
                catalog,
                embedder,
                vectors: None,
            });
        }

        let dimension = embedder.dimension();
        let texts: Vec<String> = catalog.products().iter().map(product_text).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let embedded = embedder.embed_batch(&refs)?;
        if embedded.len() != texts.len() {
            return Err(VectorStoreError::IndexError(format!(
                "Embedder returned {} vectors for {} products",
                embedded.len(),
                texts.len()
            )));
        }

        let mut flat = Vec::with_capacity(texts.len() * dimension);
        for mut vector in embedded {
            ensure_dimension(&vector, dimension)?;
            normalize(&mut vector);
            flat.extend(vector);
        }
        let matrix = Array2::from_shape_vec((texts.len(), dimension), flat)
            .map_err(|e| VectorStoreError::IndexError(e.to_string()))?;

        log::info!(
            "Built embedding index: {} products, dim={dimension}",
            catalog.len()
        );
        Ok(Self {
            catalog,
            embedder,
            vectors: Some(matrix),
        })
    }

    /// Top `top_k` products by cosine similarity to `query`.
    ///
    /// Blank queries and indexes without vectors yield no hits. Equal scores
    /// keep catalog order.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit<'_>>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let Some(matrix) = &self.vectors else {
            return Ok(Vec::new());
        };

        let mut query_vector = self.embedder.embed(query)?;
        ensure_dimension(&query_vector, matrix.ncols())?;
        normalize(&mut query_vector);
        let scores = matrix.dot(&Array1::from(query_vector));

        let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(top_k);

        let products = self.catalog.products();
        let hits = ranked
            .into_iter()
            .map(|(row, score)| SearchHit {
                product: &products[row],
                score,
            })
            .collect::<Vec<_>>();
        log::debug!("Semantic search '{query}': {} hits", hits.len());
        Ok(hits)
    }

    /// Similarity of every product to `query`, keyed by `product_id`.
    pub fn semantic_scores(&self, query: &str) -> Result<SemanticScores> {
        let hits = self.search(query, self.catalog.len())?;
        Ok(hits.into_iter().collect())
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    #[must_use]
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.as_ref().map_or(0, Array2::nrows)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Text embedded for a product: name, description and the joined facets.
#[must_use]
pub fn product_text(p: &Product) -> String {
    [
        p.name.as_str(),
        p.description.as_str(),
        p.constructs.join(" ").as_str(),
        p.job_families.join(" ").as_str(),
        p.job_levels.join(" ").as_str(),
        p.use_cases.join(" ").as_str(),
    ]
    .join(" ")
}
