use crate::error::Result;
use crate::ranker::{candidate_pool, CandidateRanker};
use reco_protocol::{BlueprintItem, Product, RecommendationRequest, RecommendedProduct};
use reco_vector_store::{EmbeddingIndex, SemanticScores};

/// Winning product for one blueprint construct.
#[derive(Debug, Clone)]
pub struct Match<'a> {
    pub item: &'a BlueprintItem,
    pub product: &'a Product,
    pub score: f32,
    pub semantic_score: f32,
    pub reason: String,
}

impl Match<'_> {
    #[must_use]
    pub fn duration_min(&self) -> u32 {
        self.product.max_duration_min
    }

    #[must_use]
    pub fn to_recommended(&self) -> RecommendedProduct {
        RecommendedProduct {
            product_id: self.product.product_id.clone(),
            name: self.product.name.clone(),
            reason: self.reason.clone(),
            max_duration_min: self.product.max_duration_min,
        }
    }
}

#[must_use]
pub fn justification(construct: &str, req: &RecommendationRequest, semantic_score: f32) -> String {
    format!(
        "Best match for construct '{construct}' for {}/{} ({}); semantic_fit={semantic_score:.2}.",
        req.job_family, req.job_level, req.use_case
    )
}

/// Run the request's semantic query once, then pick a winner per construct.
pub fn match_products<'a>(
    blueprint: &'a [BlueprintItem],
    req: &RecommendationRequest,
    index: &'a EmbeddingIndex,
    ranker: &CandidateRanker,
) -> Result<Vec<Match<'a>>> {
    let semantic = index.semantic_scores(&req.semantic_query())?;
    log::debug!(
        "Semantic scores for '{}': {} products",
        req.job_title,
        semantic.len()
    );
    let products = index.catalog().products();
    let matches = match_with_scores(blueprint, req, products, &semantic, ranker);
    Ok(matches)
}

/// One match per blueprint item that has at least one ranked candidate, in
/// blueprint order. Items without candidates are skipped.
pub fn match_with_scores<'a>(
    blueprint: &'a [BlueprintItem],
    req: &RecommendationRequest,
    products: &'a [Product],
    semantic: &SemanticScores,
    ranker: &CandidateRanker,
) -> Vec<Match<'a>> {
    let mut matches = Vec::with_capacity(blueprint.len());

    for item in blueprint {
        let pool = candidate_pool(products, &item.construct, req);
        let ranked = ranker.rank(pool, &item.construct, req, semantic);
        let Some(best) = ranked.first() else {
            log::debug!(
                "No candidate for construct '{}' ({})",
                item.construct,
                item.priority
            );
            continue;
        };

        log::debug!(
            "Construct '{}' -> {} (score {:.3}, {} ranked)",
            item.construct,
            best.product.product_id,
            best.score,
            ranked.len()
        );
        matches.push(Match {
            item,
            product: best.product,
            score: best.score,
            semantic_score: best.semantic,
            reason: justification(&item.construct, req, best.semantic),
        });
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reco_protocol::{BudgetTier, JobLevel, Priority, UseCase, Volume};

    fn request() -> RecommendationRequest {
        RecommendationRequest {
            job_title: "Store Associate".to_string(),
            job_description: "Front of house".to_string(),
            job_family: "retail".to_string(),
            job_level: JobLevel::Junior,
            use_case: UseCase::Selection,
            volume: Volume::Medium,
            assessment_budget: BudgetTier::Low,
            max_total_duration_min: 45,
            must_have_constructs: Vec::new(),
            nice_to_have_constructs: Vec::new(),
            languages: vec!["en".to_string()],
            unsupervised_ok: true,
        }
    }

    fn product(id: &str, constructs: &[&str]) -> Product {
        Product {
            product_id: id.to_string(),
            name: format!("{id} test"),
            description: String::new(),
            category: "X".to_string(),
            constructs: constructs.iter().map(ToString::to_string).collect(),
            use_cases: Vec::new(),
            job_levels: Vec::new(),
            job_families: Vec::new(),
            max_duration_min: 20,
            languages: vec!["en".to_string()],
            tags: Vec::new(),
        }
    }

    #[test]
    fn justification_renders_two_decimals() {
        let req = request();
        let expected = concat!(
            "Best match for construct 'behavioral_fit' for retail/junior (selection); ",
            "semantic_fit=0.46."
        );
        assert_eq!(justification("behavioral_fit", &req, 0.456), expected);
        assert_eq!(
            justification("x", &req, 0.0),
            "Best match for construct 'x' for retail/junior (selection); semantic_fit=0.00."
        );
    }

    #[test]
    fn constructs_without_candidates_are_skipped() {
        let req = request();
        let blueprint = vec![
            BlueprintItem::new("motivation", Priority::Must),
            BlueprintItem::new("personality", Priority::Should),
            BlueprintItem::new("cognitive_ability", Priority::Nice),
        ];
        let products = vec![
            product("COG", &["cognitive_ability"]),
            product("OPQ", &["personality"]),
        ];

        let matches = match_with_scores(
            &blueprint,
            &req,
            &products,
            &SemanticScores::new(),
            &CandidateRanker::default(),
        );
        let picked: Vec<(&str, &str)> = matches
            .iter()
            .map(|m| (m.item.construct.as_str(), m.product.product_id.as_str()))
            .collect();
        assert_eq!(
            picked,
            vec![("personality", "OPQ"), ("cognitive_ability", "COG")]
        );
    }

    #[test]
    fn same_product_may_win_several_constructs() {
        let req = request();
        let blueprint = vec![
            BlueprintItem::new("a", Priority::Should),
            BlueprintItem::new("b", Priority::Should),
        ];
        let products = vec![product("AB", &["a", "b"])];
        let matches = match_with_scores(
            &blueprint,
            &req,
            &products,
            &SemanticScores::new(),
            &CandidateRanker::default(),
        );
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.product.product_id == "AB"));
    }

    #[test]
    fn winner_carries_semantic_score_into_reason() {
        let req = request();
        let blueprint = vec![BlueprintItem::new("a", Priority::Should)];
        let products = vec![product("LOW", &["a"]), product("HIGH", &["a"])];
        let semantic: SemanticScores = [("LOW", 0.1_f32), ("HIGH", 0.731)].into_iter().collect();

        let matches = match_with_scores(
            &blueprint,
            &req,
            &products,
            &semantic,
            &CandidateRanker::default(),
        );
        assert_eq!(matches[0].product.product_id, "HIGH");
        assert!(matches[0].reason.ends_with("semantic_fit=0.73."));
        let rec = matches[0].to_recommended();
        assert_eq!(rec.name, "HIGH test");
        assert_eq!(rec.max_duration_min, 20);
    }
}
