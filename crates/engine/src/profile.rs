use std::env;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::bundle::{BundleAssembler, GreedyAssembler, KnapsackAssembler};

const BUILTIN_DEFAULT: &str = include_str!("../../../profiles/default.json");
const BUILTIN_THOROUGH: &str = include_str!("../../../profiles/thorough.json");

/// Additive weights of the candidate score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringWeights {
    pub construct_match: f32,
    pub job_level: f32,
    pub job_family: f32,
    pub use_case: f32,
    pub language: f32,
    pub high_volume: f32,
    pub duration_fit: f32,
    /// Multiplier on the cosine similarity, which lies in [-1, 1].
    pub semantic: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            construct_match: 5.0,
            job_level: 3.0,
            job_family: 3.0,
            use_case: 2.0,
            language: 2.0,
            high_volume: 2.0,
            duration_fit: 1.0,
            semantic: 4.0,
        }
    }
}

impl ScoringWeights {
    fn from_raw(raw: Option<RawWeights>) -> Result<Self> {
        let d = Self::default();
        let raw = raw.unwrap_or_default();
        let weights = Self {
            construct_match: raw.construct_match.unwrap_or(d.construct_match),
            job_level: raw.job_level.unwrap_or(d.job_level),
            job_family: raw.job_family.unwrap_or(d.job_family),
            use_case: raw.use_case.unwrap_or(d.use_case),
            language: raw.language.unwrap_or(d.language),
            high_volume: raw.high_volume.unwrap_or(d.high_volume),
            duration_fit: raw.duration_fit.unwrap_or(d.duration_fit),
            semantic: raw.semantic.unwrap_or(d.semantic),
        };
        weights.validate()?;
        Ok(weights)
    }

    fn validate(&self) -> Result<()> {
        let named = [
            ("construct_match", self.construct_match),
            ("job_level", self.job_level),
            ("job_family", self.job_family),
            ("use_case", self.use_case),
            ("language", self.language),
            ("high_volume", self.high_volume),
            ("duration_fit", self.duration_fit),
            ("semantic", self.semantic),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(anyhow!(
                    "weights.{name} must be a finite non-negative number (got {value})"
                ));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BundleStrategy {
    #[default]
    Greedy,
    Knapsack,
}

impl BundleStrategy {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(Self::Greedy),
            "knapsack" => Ok(Self::Knapsack),
            other => Err(anyhow!(
                "Unknown bundle strategy '{other}' (expected 'greedy' or 'knapsack')"
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Greedy => "greedy",
            Self::Knapsack => "knapsack",
        }
    }

    #[must_use]
    pub fn assembler(self) -> Box<dyn BundleAssembler> {
        match self {
            Self::Greedy => Box::new(GreedyAssembler),
            Self::Knapsack => Box::new(KnapsackAssembler),
        }
    }
}

/// Named bundle of scoring weights and assembly strategy.
#[derive(Clone, Debug)]
pub struct RecommenderProfile {
    name: String,
    description: Option<String>,
    weights: ScoringWeights,
    strategy: BundleStrategy,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProfile {
    schema_version: Option<u32>,
    name: Option<String>,
    description: Option<String>,
    weights: Option<RawWeights>,
    bundle: Option<RawBundle>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWeights {
    construct_match: Option<f32>,
    job_level: Option<f32>,
    job_family: Option<f32>,
    use_case: Option<f32>,
    language: Option<f32>,
    high_volume: Option<f32>,
    duration_fit: Option<f32>,
    semantic: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBundle {
    strategy: Option<String>,
}

impl Default for RecommenderProfile {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            description: None,
            weights: ScoringWeights::default(),
            strategy: BundleStrategy::Greedy,
        }
    }
}

impl RecommenderProfile {
    pub fn builtin(name: &str) -> Option<Result<Self>> {
        let bytes = match name {
            "default" => BUILTIN_DEFAULT,
            "thorough" => BUILTIN_THOROUGH,
            _ => return None,
        };
        Some(Self::from_bytes(name, bytes.as_bytes()))
    }

    /// Resolve a builtin profile name, or else treat `name_or_path` as a file.
    pub fn load(name_or_path: &str) -> Result<Self> {
        if let Some(profile) = Self::builtin(name_or_path) {
            return profile;
        }
        let path = Path::new(name_or_path);
        if path.is_file() {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(name_or_path);
            return Self::from_file(name, path);
        }
        Err(anyhow!(
            "Unknown profile '{name_or_path}' (builtin: default, thorough; or a JSON file path)"
        ))
    }

    /// Profile named by `RECO_PROFILE`, falling back to `default`.
    pub fn from_env() -> Result<Self> {
        let name = env::var("RECO_PROFILE").unwrap_or_else(|_| "default".to_string());
        Self::load(&name)
    }

    pub fn from_file(profile_name: &str, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read profile file {}", path.display()))?;
        Self::from_bytes(profile_name, &bytes)
    }

    pub fn from_bytes(profile_name: &str, bytes: &[u8]) -> Result<Self> {
        let raw: RawProfile = serde_json::from_slice(bytes)
            .with_context(|| format!("Profile '{profile_name}' is not valid JSON configuration"))?;
        Self::from_raw(raw, profile_name)
    }

    fn from_raw(raw: RawProfile, fallback_name: &str) -> Result<Self> {
        if let Some(schema_version) = raw.schema_version {
            if schema_version != 1 {
                return Err(anyhow!(
                    "profile.schema_version {schema_version} is not supported (expected 1)"
                ));
            }
        }

        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| fallback_name.to_string());
        let weights = ScoringWeights::from_raw(raw.weights)
            .with_context(|| format!("Invalid weights for profile '{name}'"))?;
        let strategy = match raw.bundle.and_then(|b| b.strategy) {
            Some(raw) => BundleStrategy::parse(&raw)
                .with_context(|| format!("Invalid bundle config for profile '{name}'"))?,
            None => BundleStrategy::default(),
        };

        Ok(Self {
            name,
            description: raw.description,
            weights,
            strategy,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub const fn weights(&self) -> ScoringWeights {
        self.weights
    }

    #[must_use]
    pub const fn strategy(&self) -> BundleStrategy {
        self.strategy
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: BundleStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
