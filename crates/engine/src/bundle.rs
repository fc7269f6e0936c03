use crate::matcher::Match;
use reco_protocol::{BundleDebug, Priority, RecommendationRequest, RecommendationResponse};
use std::collections::{BTreeMap, BTreeSet};

pub const GREEDY_BUNDLE_ID: &str = "AUTO_BUNDLE_V1";
pub const KNAPSACK_BUNDLE_ID: &str = "AUTO_BUNDLE_KNAPSACK_V1";

/// Strategy that decides which matches fit under the duration cap.
pub trait BundleAssembler: Send + Sync {
    /// Versioned identifier reported as `bundle_id`.
    fn strategy_id(&self) -> &'static str;

    /// Indices into `matches`, ascending, whose durations sum to at most `cap_min`.
    fn select(&self, matches: &[Match<'_>], cap_min: u32) -> Vec<usize>;

    fn assemble(
        &self,
        matches: &[Match<'_>],
        req: &RecommendationRequest,
    ) -> RecommendationResponse {
        let chosen = self.select(matches, req.max_total_duration_min);

        let mut products = Vec::with_capacity(chosen.len());
        let mut total_duration_min = 0u32;
        let mut covered = BTreeSet::new();
        for idx in chosen {
            let Some(m) = matches.get(idx) else {
                continue;
            };
            products.push(m.to_recommended());
            total_duration_min = total_duration_min.saturating_add(m.duration_min());
            covered.extend(m.product.constructs.iter().cloned());
        }

        RecommendationResponse {
            bundle_id: self.strategy_id().to_string(),
            products,
            total_duration_min,
            constructs_covered: covered.into_iter().collect(),
            debug: Some(BundleDebug::from_request(req)),
        }
    }
}

/// Walk matches in blueprint order and keep each one that still fits.
///
/// A match that would overflow the cap is dropped for good; later, shorter
/// matches can still get in.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyAssembler;

impl BundleAssembler for GreedyAssembler {
    fn strategy_id(&self) -> &'static str {
        GREEDY_BUNDLE_ID
    }

    fn select(&self, matches: &[Match<'_>], cap_min: u32) -> Vec<usize> {
        let mut chosen = Vec::with_capacity(matches.len());
        let mut total = 0u32;
        for (idx, m) in matches.iter().enumerate() {
            match total.checked_add(m.duration_min()) {
                Some(next) if next <= cap_min => {
                    total = next;
                    chosen.push(idx);
                }
                _ => log::debug!(
                    "Dropping {} for '{}': {} + {} min exceeds cap {}",
                    m.product.product_id,
                    m.item.construct,
                    total,
                    m.duration_min(),
                    cap_min
                ),
            }
        }
        chosen
    }
}

/// Exact 0/1 knapsack over blueprint priorities.
///
/// Maximizes the summed priority value under the cap. Among equally valuable
/// selections it prefers the one that includes earlier matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnapsackAssembler;

const fn priority_value(priority: Priority) -> u32 {
    match priority {
        Priority::Must => 4,
        Priority::Should => 2,
        Priority::Nice => 1,
    }
}

impl BundleAssembler for KnapsackAssembler {
    fn strategy_id(&self) -> &'static str {
        KNAPSACK_BUNDLE_ID
    }

    fn select(&self, matches: &[Match<'_>], cap_min: u32) -> Vec<usize> {
        // Reachable total duration -> best (value, inclusion flags) reaching it.
        let mut states: BTreeMap<u32, (u32, Vec<bool>)> = BTreeMap::new();
        states.insert(0, (0, Vec::with_capacity(matches.len())));

        for m in matches {
            let value = priority_value(m.item.priority);
            let mut next: BTreeMap<u32, (u32, Vec<bool>)> = BTreeMap::new();
            for (&total, (acc, flags)) in &states {
                let mut skip = flags.clone();
                skip.push(false);
                offer(&mut next, total, (*acc, skip));

                if let Some(new_total) = total.checked_add(m.duration_min()) {
                    if new_total <= cap_min {
                        let mut take = flags.clone();
                        take.push(true);
                        offer(&mut next, new_total, (acc + value, take));
                    }
                }
            }
            states = next;
        }

        let best = states
            .into_iter()
            .reduce(|best, candidate| {
                if beats(&candidate.1, &best.1) {
                    candidate
                } else {
                    best
                }
            })
            .map(|(_, (_, flags))| flags)
            .unwrap_or_default();

        best.iter()
            .enumerate()
            .filter_map(|(idx, taken)| taken.then_some(idx))
            .collect()
    }
}

fn offer(states: &mut BTreeMap<u32, (u32, Vec<bool>)>, total: u32, candidate: (u32, Vec<bool>)) {
    match states.get(&total) {
        Some(existing) if !beats(&candidate, existing) => {}
        _ => {
            states.insert(total, candidate);
        }
    }
}

/// Higher value wins; on equal value the flags that include an earlier
/// match win (`true > false` lexicographically).
fn beats(candidate: &(u32, Vec<bool>), incumbent: &(u32, Vec<bool>)) -> bool {
    (candidate.0, &candidate.1) > (incumbent.0, &incumbent.1)
}
