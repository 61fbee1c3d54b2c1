//! Brand-diverse shortlist selection.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::ScoredCandidate;

/// Buyer motivation a shortlist entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Motivation {
    /// Best candidate built around the customer's preferred brand.
    BrandLed,
    /// Strongest financial return.
    Value,
    /// Largest system and battery for the money.
    Performance,
    /// Best overall score, used to fill a short list.
    Balanced,
}

impl fmt::Display for Motivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BrandLed => "brand-led",
            Self::Value => "value",
            Self::Performance => "performance",
            Self::Balanced => "balanced",
        };
        write!(f, "{name}")
    }
}

/// One ranked entry of the final shortlist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortlistEntry {
    /// 1-based position in the shortlist.
    pub rank: usize,
    pub motivation: Motivation,
    pub candidate: ScoredCandidate,
}

const MAX_ENTRIES: usize = 3;

fn brand_key(candidate: &ScoredCandidate) -> String {
    candidate
        .inverter_brand()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Index of the highest-keyed candidate accepted by `eligible`. Ties go to
/// the higher total score, then the earlier candidate.
fn best_by(
    pool: &[ScoredCandidate],
    eligible: impl Fn(usize, &ScoredCandidate) -> bool,
    key: impl Fn(&ScoredCandidate) -> f64,
) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, candidate) in pool.iter().enumerate() {
        if !eligible(idx, candidate) {
            continue;
        }
        let better = match best {
            None => true,
            Some(b) => {
                let current = &pool[b];
                key(candidate)
                    .total_cmp(&key(current))
                    .then(candidate.total_score.total_cmp(&current.total_score))
                    .is_gt()
            }
        };
        if better {
            best = Some(idx);
        }
    }
    best
}

/// Selects up to three mutually diverse candidates.
///
/// Picks, in order: a brand-led entry (only when a preference is stated and
/// some candidate matches it), a value entry by ROI sub-score and a
/// performance entry by performance sub-score. Later picks exclude inverter
/// brands already chosen; a category whose pool is empty is skipped. If fewer
/// than three entries result, the best remaining candidate by total score is
/// added as a balanced pick under the same brand rule. Brands repeat only
/// when every candidate shares one inverter brand, and no candidate appears
/// twice.
pub fn select_shortlist(pool: &[ScoredCandidate], preferred_brand: Option<&str>) -> Vec<ShortlistEntry> {
    let distinct_brands: BTreeSet<String> = pool.iter().map(brand_key).collect();
    let single_brand = distinct_brands.len() <= 1;

    let mut picked: Vec<(Motivation, usize)> = Vec::new();
    let mut used_brands: BTreeSet<String> = BTreeSet::new();

    if let Some(brand) = preferred_brand.map(str::trim).filter(|b| !b.is_empty()) {
        let wanted = brand.to_ascii_lowercase();
        if let Some(idx) = best_by(pool, |_, c| brand_key(c) == wanted, |c| c.total_score) {
            used_brands.insert(brand_key(&pool[idx]));
            picked.push((Motivation::BrandLed, idx));
        }
    }

    let plan: [(Motivation, fn(&ScoredCandidate) -> f64); 3] = [
        (Motivation::Value, |c| c.sub_scores.roi),
        (Motivation::Performance, |c| c.sub_scores.performance),
        (Motivation::Balanced, |c| c.total_score),
    ];
    for (motivation, key) in plan {
        if picked.len() >= MAX_ENTRIES {
            break;
        }
        let eligible = |idx: usize, c: &ScoredCandidate| {
            let unused = !picked.iter().any(|(_, i)| *i == idx);
            unused && (single_brand || !used_brands.contains(&brand_key(c)))
        };
        if let Some(idx) = best_by(pool, eligible, key) {
            used_brands.insert(brand_key(&pool[idx]));
            picked.push((motivation, idx));
        }
    }

    picked
        .into_iter()
        .enumerate()
        .map(|(pos, (motivation, idx))| ShortlistEntry {
            rank: pos + 1,
            motivation,
            candidate: pool[idx].clone(),
        })
        .collect()
}
