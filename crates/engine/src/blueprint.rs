use reco_protocol::{BlueprintItem, JobLevel, Priority, RecommendationRequest, UseCase, Volume};
use std::collections::HashSet;

pub const COGNITIVE_ABILITY: &str = "cognitive_ability";
pub const BEHAVIORAL_FIT: &str = "behavioral_fit";
pub const PERSONALITY: &str = "personality";

const FRONTLINE_FAMILIES: &[&str] = &["customer_service", "retail"];

/// Ordered blueprint that ignores constructs it already holds.
#[derive(Debug, Default)]
struct BlueprintBuilder {
    items: Vec<BlueprintItem>,
    seen: HashSet<String>,
}

impl BlueprintBuilder {
    fn push(&mut self, construct: &str, priority: Priority) {
        if self.seen.insert(construct.to_string()) {
            self.items.push(BlueprintItem::new(construct, priority));
        }
    }

    fn contains(&self, construct: &str) -> bool {
        self.seen.contains(construct)
    }
}

/// Turn a request into its target constructs.
///
/// Rules apply in a fixed order and the first occurrence of a construct wins,
/// so explicit must-haves keep `must` priority even when a default rule would
/// add the same construct as `should`.
#[must_use]
pub fn build_blueprint(req: &RecommendationRequest) -> Vec<BlueprintItem> {
    let mut bp = BlueprintBuilder::default();

    for construct in &req.must_have_constructs {
        bp.push(construct, Priority::Must);
    }

    if req.use_case == UseCase::Selection && !bp.contains(COGNITIVE_ABILITY) {
        bp.push(COGNITIVE_ABILITY, Priority::Should);
    }

    let frontline = FRONTLINE_FAMILIES.contains(&req.job_family.as_str());
    if (req.volume == Volume::High || frontline) && !bp.contains(BEHAVIORAL_FIT) {
        bp.push(BEHAVIORAL_FIT, Priority::Should);
    }

    let senior = matches!(req.job_level, JobLevel::Manager | JobLevel::Executive);
    if (senior || req.use_case == UseCase::Development) && !bp.contains(PERSONALITY) {
        bp.push(PERSONALITY, Priority::Should);
    }

    for construct in &req.nice_to_have_constructs {
        bp.push(construct, Priority::Nice);
    }

    bp.items
}
