use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

mod request;

pub use request::{BudgetTier, JobLevel, RecommendationRequest, UseCase, Volume};

/// An assessment product as supplied by the catalog.
///
/// Facet lists have set semantics; their order only matters for the text that
/// gets embedded.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub constructs: Vec<String>,
    pub use_cases: Vec<String>,
    pub job_levels: Vec<String>,
    pub job_families: Vec<String>,
    pub max_duration_min: u32,
    pub languages: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Product {
    #[must_use]
    pub fn measures(&self, construct: &str) -> bool {
        self.constructs.iter().any(|c| c == construct)
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Must,
    Should,
    Nice,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Must => "must",
            Self::Should => "should",
            Self::Nice => "nice",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct BlueprintItem {
    pub construct: String,
    pub priority: Priority,
}

impl BlueprintItem {
    pub fn new(construct: impl Into<String>, priority: Priority) -> Self {
        Self {
            construct: construct.into(),
            priority,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct RecommendedProduct {
    pub product_id: String,
    pub name: String,
    pub reason: String,
    pub max_duration_min: u32,
}

/// Request facets echoed back for troubleshooting.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct BundleDebug {
    pub requested_job_family: String,
    pub requested_job_level: JobLevel,
    pub use_case: UseCase,
}

impl BundleDebug {
    #[must_use]
    pub fn from_request(req: &RecommendationRequest) -> Self {
        Self {
            requested_job_family: req.job_family.clone(),
            requested_job_level: req.job_level,
            use_case: req.use_case,
        }
    }
}

/// The assembled bundle returned to callers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct RecommendationResponse {
    /// Identifies the assembly strategy that produced this bundle.
    pub bundle_id: String,
    pub products: Vec<RecommendedProduct>,
    pub total_duration_min: u32,
    pub constructs_covered: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<BundleDebug>,
}

impl RecommendationResponse {
    #[must_use]
    pub fn product_ids(&self) -> Vec<&str> {
        self.products
            .iter()
            .map(|p| p.product_id.as_str())
            .collect()
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
