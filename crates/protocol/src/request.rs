use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum!(
    /// Seniority of the role being hired for.
    JobLevel {
        Entry => "entry",
        Junior => "junior",
        Graduate => "graduate",
        Professional => "professional",
        Manager => "manager",
        Executive => "executive",
    }
);

wire_enum!(
    /// What the assessment results will be used for.
    UseCase {
        Selection => "selection",
        Development => "development",
        Succession => "succession",
    }
);

wire_enum!(
    /// Expected hiring volume.
    Volume {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

wire_enum!(
    BudgetTier {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

/// Structured hiring need plus free-text context.
///
/// Enum fields are validated by serde when the request is decoded; the engine
/// never re-checks them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct RecommendationRequest {
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
    pub job_family: String,
    pub job_level: JobLevel,
    pub use_case: UseCase,
    pub volume: Volume,
    pub assessment_budget: BudgetTier,
    pub max_total_duration_min: u32,
    #[serde(default)]
    pub must_have_constructs: Vec<String>,
    #[serde(default)]
    pub nice_to_have_constructs: Vec<String>,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Reserved for delivery-mode filtering; not consumed by scoring.
    #[serde(default = "default_unsupervised_ok")]
    pub unsupervised_ok: bool,
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

const fn default_unsupervised_ok() -> bool {
    true
}

impl RecommendationRequest {
    /// Free text used for the semantic query: `"{job_title}. {job_description}"`.
    #[must_use]
    pub fn semantic_query(&self) -> String {
        format!("{}. {}", self.job_title, self.job_description)
    }

    #[must_use]
    pub fn accepts_any_language(&self, languages: &[String]) -> bool {
        self.languages.iter().any(|lang| languages.contains(lang))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn optional_fields_take_defaults() {
        let raw = r#"{
            "job_title": "Customer Service Representative",
            "job_family": "customer_service",
            "job_level": "entry",
            "use_case": "selection",
            "volume": "high",
            "assessment_budget": "medium",
            "max_total_duration_min": 40
        }"#;
        let req: RecommendationRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.job_description, "");
        assert_eq!(req.languages, vec!["en".to_string()]);
        assert!(req.must_have_constructs.is_empty());
        assert!(req.nice_to_have_constructs.is_empty());
        assert!(req.unsupervised_ok);
        assert_eq!(req.job_level, JobLevel::Entry);
    }

    #[test]
    fn unknown_enum_values_are_rejected_at_decode() {
        let raw = r#"{
            "job_title": "x",
            "job_family": "it",
            "job_level": "intern",
            "use_case": "selection",
            "volume": "low",
            "assessment_budget": "low",
            "max_total_duration_min": 10
        }"#;
        let err = serde_json::from_str::<RecommendationRequest>(raw).unwrap_err();
        assert!(
            err.to_string().contains("intern"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn wire_names_match_display() {
        for level in JobLevel::ALL {
            let json = serde_json::to_string(level).unwrap();
            assert_eq!(json, format!("\"{level}\""));
        }
        assert_eq!(UseCase::Development.as_str(), "development");
        assert_eq!(Volume::High.to_string(), "high");
    }

    #[test]
    fn schema_marks_defaulted_fields_optional() {
        let schema = serde_json::to_value(schemars::schema_for!(RecommendationRequest)).unwrap();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"job_title"));
        assert!(required.contains(&"max_total_duration_min"));
        assert!(!required.contains(&"languages"));
        assert!(!required.contains(&"job_description"));
    }

    #[test]
    fn semantic_query_joins_title_and_description() {
        let raw = r#"{
            "job_title": "Analyst",
            "job_description": "Builds dashboards",
            "job_family": "analytics",
            "job_level": "professional",
            "use_case": "selection",
            "volume": "low",
            "assessment_budget": "high",
            "max_total_duration_min": 60,
            "languages": ["fr", "de"]
        }"#;
        let req: RecommendationRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.semantic_query(), "Analyst. Builds dashboards");
        assert!(req.accepts_any_language(&["de".to_string()]));
        assert!(!req.accepts_any_language(&["en".to_string()]));
    }
}
