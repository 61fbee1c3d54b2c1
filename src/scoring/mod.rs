//! Scoring and diversification.
//!
//! [`score`] turns a priced candidate plus its energy, rebate and ROI figures
//! into a weighted total with justification bullets. [`shortlist`] picks a
//! brand-diverse set of scored candidates, one per buyer motivation.

pub mod score;
pub mod shortlist;

pub use score::{ScoreContext, score_candidate};
pub use shortlist::{Motivation, ShortlistEntry, select_shortlist};

use serde::Serialize;

use crate::candidate::SystemCandidate;
use crate::config::ScoreWeights;
use crate::energy::EnergyFlow;
use crate::rebate::RebateResult;
use crate::roi::RoiMetrics;

/// Per-candidate sub-scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubScores {
    pub roi: f64,
    pub performance: f64,
    pub warranty: f64,
    pub brand: f64,
    pub reliability: f64,
}

impl SubScores {
    /// Weighted mean of the sub-scores. Weights are normalised by their sum.
    pub fn weighted(&self, w: &ScoreWeights) -> f64 {
        let sum = w.sum();
        if sum <= 0.0 {
            return 0.0;
        }
        (self.roi * w.roi
            + self.performance * w.performance
            + self.warranty * w.warranty
            + self.brand * w.brand
            + self.reliability * w.reliability)
            / sum
    }
}

/// A candidate with its full evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: SystemCandidate,
    pub flow: EnergyFlow,
    pub rebate: RebateResult,
    pub roi: RoiMetrics,
    pub sub_scores: SubScores,
    pub total_score: f64,
    pub confidence: f64,
    pub justifications: Vec<String>,
}

impl ScoredCandidate {
    pub fn inverter_brand(&self) -> Option<&str> {
        self.candidate.inverter_brand()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::candidate::{CostBreakdown, SystemCandidate};
    use crate::catalog::{CatalogItem, ItemSpecs, PackageTier, Phase, ShadeGrade, Tier};
    use crate::roi::Guarded;

    /// Minimal scored candidate with one inverter of the given brand.
    pub(crate) fn scored(id: &str, brand: &str, roi: f64, performance: f64, total: f64) -> ScoredCandidate {
        let inverter = CatalogItem {
            id: format!("{id}-inverter"),
            brand: brand.to_string(),
            model: "test".to_string(),
            tier: Tier::Mid,
            specs: ItemSpecs::Inverter {
                ac_kw: 5.0,
                phase: Phase::Single,
                shade_handling: ShadeGrade::Good,
            },
            warranty_years: 10,
            unit_price: 2000.0,
            do_not_sell: false,
            reliable: true,
            hybrid_pair_brands: Vec::new(),
        };
        ScoredCandidate {
            candidate: SystemCandidate {
                id: id.to_string(),
                tier: PackageTier::Balanced,
                panel: None,
                panel_count: 0,
                inverter: Some(inverter),
                battery: None,
                ev_charger: None,
                system_kw: 6.6,
                battery_kwh: None,
                cost: CostBreakdown::default(),
                omitted: Vec::new(),
            },
            flow: EnergyFlow {
                generation_kwh: 0.0,
                self_consumption_kwh: 0.0,
                grid_draw_kwh: 0.0,
                raw_export_kwh: 0.0,
                export_kwh: 0.0,
                lost_export_kwh: 0.0,
                self_consumption_share: 0.5,
                export_ceiling_kw: 5.0,
            },
            rebate: RebateResult {
                zone_rating: 1.382,
                pv_certificates: 0,
                pv_rebate: 0.0,
                battery_certificates: 0,
                battery_rebate: 0.0,
                regional_rebate: 0.0,
                total: 0.0,
            },
            roi: RoiMetrics {
                upfront_cost: 0.0,
                grid_savings: 0.0,
                export_revenue: 0.0,
                fixed_charge_savings: 0.0,
                annual_savings: 0.0,
                payback_years: Guarded::Unbounded,
                npv: 0.0,
                irr_approx_pct: Guarded::Unbounded,
                lcoe: Guarded::Unbounded,
                score: roi,
                confidence: 0.5,
            },
            sub_scores: SubScores {
                roi,
                performance,
                warranty: 0.4,
                brand: 0.5,
                reliability: 1.0,
            },
            total_score: total,
            confidence: 0.5,
            justifications: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_total_normalises_weights() {
        let s = SubScores {
            roi: 1.0,
            performance: 0.0,
            warranty: 0.0,
            brand: 0.0,
            reliability: 0.0,
        };
        let w = ScoreWeights {
            roi: 2.0,
            performance: 2.0,
            warranty: 0.0,
            brand: 0.0,
            reliability: 0.0,
        };
        assert!((s.weighted(&w) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_weights_give_zero() {
        let s = SubScores {
            roi: 1.0,
            performance: 1.0,
            warranty: 1.0,
            brand: 1.0,
            reliability: 1.0,
        };
        let w = ScoreWeights {
            roi: 0.0,
            performance: 0.0,
            warranty: 0.0,
            brand: 0.0,
            reliability: 0.0,
        };
        assert_eq!(s.weighted(&w), 0.0);
    }
}
