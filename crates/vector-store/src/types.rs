use reco_protocol::Product;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub product: &'a Product,
    pub score: f32,
}

/// Cosine similarity per `product_id`; products without an entry score 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemanticScores {
    scores: HashMap<String, f32>,
}

impl SemanticScores {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, product_id: impl Into<String>, score: f32) {
        self.scores.insert(product_id.into(), score);
    }

    #[must_use]
    pub fn get(&self, product_id: &str) -> f32 {
        self.scores.get(product_id).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl<'a> FromIterator<SearchHit<'a>> for SemanticScores {
    fn from_iter<I: IntoIterator<Item = SearchHit<'a>>>(iter: I) -> Self {
        let scores = iter
            .into_iter()
            .map(|hit| (hit.product.product_id.clone(), hit.score))
            .collect();
        Self { scores }
    }
}

impl<K: Into<String>> FromIterator<(K, f32)> for SemanticScores {
    fn from_iter<I: IntoIterator<Item = (K, f32)>>(iter: I) -> Self {
        let scores = iter.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self { scores }
    }
}
