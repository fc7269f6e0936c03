//! Assessment bundle recommendation engine
//!
//! Turns a hiring request into a duration-capped bundle of assessment
//! products:
//!
//! ```text
//! request ─▶ blueprint ─▶ per-construct ranking ─▶ bundle assembly ─▶ response
//!                              ▲
//!                  semantic scores (reco-vector-store)
//! ```
//!
//! Ranking mixes catalog metadata with the cosine similarity between the job
//! text and each product. Weights and the assembly strategy come from a
//! [`RecommenderProfile`].

pub mod audit;
pub mod blueprint;
pub mod bundle;
pub mod error;
pub mod matcher;
pub mod profile;
pub mod ranker;
pub mod recommender;

pub use audit::{AuditRecord, AuditSink, JsonlAuditSink, NoopAuditSink};
pub use blueprint::build_blueprint;
pub use bundle::{
    BundleAssembler, GreedyAssembler, KnapsackAssembler, GREEDY_BUNDLE_ID, KNAPSACK_BUNDLE_ID,
};
pub use error::{EngineError, Result};
pub use matcher::{justification, match_products, match_with_scores, Match};
pub use profile::{BundleStrategy, RecommenderProfile, ScoringWeights};
pub use ranker::{candidate_pool, CandidateRanker, RankedCandidate};
pub use recommender::Recommender;
