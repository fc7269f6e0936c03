use crate::profile::ScoringWeights;
use reco_protocol::{Product, RecommendationRequest, Volume};
use reco_vector_store::SemanticScores;
use std::cmp::Ordering;

pub const HIGH_VOLUME_TAG: &str = "high_volume";

#[derive(Debug, Clone, Copy)]
pub struct RankedCandidate<'a> {
    pub product: &'a Product,
    pub score: f32,
    pub semantic: f32,
}

/// Catalog items that measure `construct` and share a language with the
/// request, in catalog order.
pub fn candidate_pool<'a>(
    products: &'a [Product],
    construct: &str,
    req: &RecommendationRequest,
) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| p.measures(construct) && req.accepts_any_language(&p.languages))
        .collect()
}

/// Hybrid metadata + semantic scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateRanker {
    weights: ScoringWeights,
}

impl CandidateRanker {
    #[must_use]
    pub const fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    #[must_use]
    pub const fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    #[must_use]
    pub fn score(
        &self,
        product: &Product,
        construct: &str,
        req: &RecommendationRequest,
        semantic: f32,
    ) -> f32 {
        let w = &self.weights;
        let mut score = 0.0;

        if product.measures(construct) {
            score += w.construct_match;
        }
        if contains(&product.job_levels, req.job_level.as_str()) {
            score += w.job_level;
        }
        if contains(&product.job_families, &req.job_family) {
            score += w.job_family;
        }
        if contains(&product.use_cases, req.use_case.as_str()) {
            score += w.use_case;
        }
        if req.accepts_any_language(&product.languages) {
            score += w.language;
        }
        if req.volume == Volume::High && product.has_tag(HIGH_VOLUME_TAG) {
            score += w.high_volume;
        }
        if product.max_duration_min <= req.max_total_duration_min {
            score += w.duration_fit;
        }

        score + w.semantic * semantic
    }

    /// Score `candidates` and sort them best first.
    ///
    /// The sort is stable, so equal totals keep their pool order. Candidates
    /// scoring zero or less are dropped; with the default weights that never
    /// happens for a filtered pool (the construct term alone outweighs the
    /// lowest possible semantic term) and only matters for profiles that
    /// lower `construct_match`.
    pub fn rank<'a>(
        &self,
        candidates: Vec<&'a Product>,
        construct: &str,
        req: &RecommendationRequest,
        semantic_scores: &SemanticScores,
    ) -> Vec<RankedCandidate<'a>> {
        let mut ranked: Vec<RankedCandidate<'a>> = candidates
            .into_iter()
            .map(|product| {
                let semantic = semantic_scores.get(&product.product_id);
                RankedCandidate {
                    product,
                    score: self.score(product, construct, req, semantic),
                    semantic,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.retain(|c| c.score > 0.0);
        ranked
    }
}

fn contains(values: &[String], needle: &str) -> bool {
    values.iter().any(|v| v == needle)
}
