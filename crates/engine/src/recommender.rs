use crate::audit::{AuditSink, NoopAuditSink};
use crate::blueprint::build_blueprint;
use crate::bundle::{BundleAssembler, GreedyAssembler};
use crate::error::Result;
use crate::matcher::match_products;
use crate::profile::RecommenderProfile;
use crate::ranker::CandidateRanker;
use reco_protocol::{BlueprintItem, RecommendationRequest, RecommendationResponse};
use reco_vector_store::IndexHandle;
use std::sync::Arc;

/// End-to-end recommendation pipeline.
///
/// Each call takes one snapshot of the index, so a concurrent rebuild never
/// mixes catalogs within a single response.
pub struct Recommender {
    index: Arc<IndexHandle>,
    ranker: CandidateRanker,
    assembler: Box<dyn BundleAssembler>,
    audit: Box<dyn AuditSink>,
    include_debug: bool,
}

impl std::fmt::Debug for Recommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommender")
            .field("generation", &self.index.generation())
            .field("ranker", &self.ranker)
            .field("strategy", &self.assembler.strategy_id())
            .field("include_debug", &self.include_debug)
            .finish_non_exhaustive()
    }
}

impl Recommender {
    /// Default weights, greedy assembly, no audit trail.
    #[must_use]
    pub fn new(index: Arc<IndexHandle>) -> Self {
        Self {
            index,
            ranker: CandidateRanker::default(),
            assembler: Box::new(GreedyAssembler),
            audit: Box::new(NoopAuditSink),
            include_debug: true,
        }
    }

    #[must_use]
    pub fn from_profile(index: Arc<IndexHandle>, profile: &RecommenderProfile) -> Self {
        log::debug!(
            "Recommender profile '{}' (strategy {})",
            profile.name(),
            profile.strategy().as_str()
        );
        Self {
            ranker: CandidateRanker::new(profile.weights()),
            assembler: profile.strategy().assembler(),
            ..Self::new(index)
        }
    }

    #[must_use]
    pub fn with_assembler(mut self, assembler: Box<dyn BundleAssembler>) -> Self {
        self.assembler = assembler;
        self
    }

    #[must_use]
    pub fn with_audit_sink(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Whether responses carry the `debug` echo of the request.
    #[must_use]
    pub fn with_debug(mut self, include_debug: bool) -> Self {
        self.include_debug = include_debug;
        self
    }

    #[must_use]
    pub fn index(&self) -> &Arc<IndexHandle> {
        &self.index
    }

    #[must_use]
    pub const fn ranker(&self) -> &CandidateRanker {
        &self.ranker
    }

    #[must_use]
    pub fn strategy_id(&self) -> &'static str {
        self.assembler.strategy_id()
    }

    #[must_use]
    pub fn blueprint(&self, req: &RecommendationRequest) -> Vec<BlueprintItem> {
        build_blueprint(req)
    }

    pub fn recommend(&self, req: &RecommendationRequest) -> Result<RecommendationResponse> {
        let index = self.index.snapshot();
        let blueprint = build_blueprint(req);
        log::debug!(
            "Blueprint for '{}': {}",
            req.job_title,
            blueprint
                .iter()
                .map(|i| format!("{}({})", i.construct, i.priority))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let matches = match_products(&blueprint, req, &index, &self.ranker)?;
        let mut response = self.assembler.assemble(&matches, req);
        if !self.include_debug {
            response.debug = None;
        }

        log::info!(
            "Recommended {} product(s) for '{}' ({}/{}): {} of {} min",
            response.products.len(),
            req.job_title,
            req.job_family,
            req.job_level,
            response.total_duration_min,
            req.max_total_duration_min
        );

        if let Err(err) = self.audit.record(req, &response) {
            log::warn!("Failed to write audit record: {err}");
        }

        Ok(response)
    }
}
