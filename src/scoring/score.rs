//! Sub-scores, weighted totals and justification bullets.

use crate::candidate::SystemCandidate;
use crate::config::{ScoringConfig, TierWindow};
use crate::energy::EnergyFlow;
use crate::rebate::RebateResult;
use crate::roi::RoiMetrics;

use super::{ScoredCandidate, SubScores};

/// Everything the scorer needs besides the candidate itself.
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext<'a> {
    pub scoring: &'a ScoringConfig,
    /// Size window of the candidate's tier, used as the performance ceiling.
    pub window: &'a TierWindow,
    pub preferred_brand: Option<&'a str>,
}

fn ratio(value: f64, ceiling: f64) -> f64 {
    if ceiling <= 0.0 {
        return 0.0;
    }
    (value / ceiling).clamp(0.0, 1.0)
}

/// System and battery size normalised against the tier ceilings.
pub fn performance_score(system_kw: f64, battery_kwh: Option<f64>, window: &TierWindow) -> f64 {
    0.5 * ratio(system_kw, window.max_kw) + 0.5 * ratio(battery_kwh.unwrap_or(0.0), window.max_battery_kwh)
}

pub fn warranty_score(candidate: &SystemCandidate, cfg: &ScoringConfig) -> f64 {
    candidate
        .inverter
        .as_ref()
        .map(|inv| ratio(f64::from(inv.warranty_years), cfg.warranty_ceiling_years))
        .unwrap_or(0.0)
}

fn brand_matches(candidate: &SystemCandidate, preferred: Option<&str>) -> bool {
    match (candidate.inverter.as_ref(), preferred) {
        (Some(inv), Some(brand)) => inv.brand_is(brand),
        _ => false,
    }
}

pub fn brand_score(candidate: &SystemCandidate, preferred: Option<&str>, cfg: &ScoringConfig) -> f64 {
    if brand_matches(candidate, preferred) {
        cfg.brand_match_score
    } else {
        cfg.brand_other_score
    }
}

pub fn reliability_score(candidate: &SystemCandidate, cfg: &ScoringConfig) -> f64 {
    if candidate.inverter.as_ref().is_some_and(|inv| inv.reliable) {
        cfg.reliable_score
    } else {
        cfg.unreliable_score
    }
}

/// Justification bullets in fixed priority order, capped at `max_bullets`.
pub fn justifications(
    candidate: &SystemCandidate,
    flow: &EnergyFlow,
    rebate: &RebateResult,
    roi: &RoiMetrics,
    ctx: &ScoreContext<'_>,
) -> Vec<String> {
    let cfg = ctx.scoring;
    let mut bullets = Vec::new();

    if let Some(years) = roi.payback_years.finite() {
        if years < cfg.fast_payback_years {
            bullets.push(format!("Fast payback: about {years:.1} years"));
        }
    }
    if let Some(kwh) = candidate.battery_kwh {
        bullets.push(format!("{kwh:.1} kWh battery for backup and evening use"));
    }
    if let Some(inv) = &candidate.inverter {
        if inv.warranty_years >= cfg.warranty_bullet_years {
            bullets.push(format!("{}-year inverter warranty", inv.warranty_years));
        }
    }
    if candidate.cost.total > 0.0 {
        let share = rebate.total / candidate.cost.total;
        if share >= cfg.rebate_share_bullet {
            bullets.push(format!("Rebates cover {:.0}% of the system cost", share * 100.0));
        }
    }
    if brand_matches(candidate, ctx.preferred_brand) {
        if let Some(brand) = candidate.inverter_brand() {
            bullets.push(format!("Matches your preferred brand ({brand})"));
        }
    }
    if flow.is_export_limited() {
        bullets.push(format!(
            "Export capped at {:.0} kW; {:.1} kWh/day clipped",
            flow.export_ceiling_kw, flow.lost_export_kwh
        ));
    }

    bullets.truncate(cfg.max_bullets);
    bullets
}

/// Scores one candidate against its tier's weight vector.
pub fn score_candidate(
    candidate: SystemCandidate,
    flow: EnergyFlow,
    rebate: RebateResult,
    roi: RoiMetrics,
    ctx: &ScoreContext<'_>,
) -> ScoredCandidate {
    let cfg = ctx.scoring;
    let sub_scores = SubScores {
        roi: roi.score.clamp(0.0, 1.0),
        performance: performance_score(candidate.system_kw, candidate.battery_kwh, ctx.window),
        warranty: warranty_score(&candidate, cfg),
        brand: brand_score(&candidate, ctx.preferred_brand, cfg),
        reliability: reliability_score(&candidate, cfg),
    };
    let total_score = sub_scores.weighted(cfg.weights(candidate.tier));
    let justifications = justifications(&candidate, &flow, &rebate, &roi, ctx);

    ScoredCandidate {
        confidence: roi.confidence,
        candidate,
        flow,
        rebate,
        roi,
        sub_scores,
        total_score,
        justifications,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, PackageTier};
    use crate::candidate::{CandidateParts, CostBasis};
    use crate::config::{PricingConfig, SizingConfig};
    use crate::roi::Guarded;

    fn candidate(inverter_id: &str, battery_id: Option<&str>) -> SystemCandidate {
        let catalog = Catalog::builtin();
        let parts = CandidateParts {
            panel: catalog.get("rec-alpha-pure-430"),
            inverter: catalog.get(inverter_id),
            battery: battery_id.and_then(|id| catalog.get(id)),
            ev_charger: None,
            omitted: Vec::new(),
        };
        let basis = CostBasis {
            system_kw: 8.0,
            roof_complexity: 1.0,
            storey_adder: 0.0,
        };
        SystemCandidate::assemble("premium", PackageTier::Premium, parts, &basis, &PricingConfig::default())
    }

    fn flow(lost_export_kwh: f64) -> EnergyFlow {
        EnergyFlow {
            generation_kwh: 32.0,
            self_consumption_kwh: 12.0,
            grid_draw_kwh: 4.0,
            raw_export_kwh: 20.0,
            export_kwh: 20.0 - lost_export_kwh,
            lost_export_kwh,
            self_consumption_share: 0.75,
            export_ceiling_kw: 5.0,
        }
    }

    fn rebate(total: f64) -> RebateResult {
        RebateResult {
            zone_rating: 1.382,
            pv_certificates: 0,
            pv_rebate: total,
            battery_certificates: 0,
            battery_rebate: 0.0,
            regional_rebate: 0.0,
            total,
        }
    }

    fn roi(payback: Guarded, score: f64) -> RoiMetrics {
        RoiMetrics {
            upfront_cost: 20_000.0,
            grid_savings: 1500.0,
            export_revenue: 500.0,
            fixed_charge_savings: 100.0,
            annual_savings: 2100.0,
            payback_years: payback,
            npv: 5000.0,
            irr_approx_pct: Guarded::Finite(10.5),
            lcoe: Guarded::Finite(0.12),
            score,
            confidence: 0.6,
        }
    }

    fn ctx<'a>(scoring: &'a ScoringConfig, window: &'a TierWindow, preferred: Option<&'a str>) -> ScoreContext<'a> {
        ScoreContext {
            scoring,
            window,
            preferred_brand: preferred,
        }
    }

    #[test]
    fn performance_normalises_against_window() {
        let window = SizingConfig::default().premium;
        assert!((performance_score(13.2, Some(25.0), &window) - 1.0).abs() < 1e-12);
        assert!((performance_score(13.2, None, &window) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn sub_scores_follow_catalog_facts() {
        let cfg = ScoringConfig::default();
        let enphase = candidate("enphase-iq8-8-0", None);
        assert_eq!(warranty_score(&enphase, &cfg), 1.0);
        assert_eq!(brand_score(&enphase, Some("ENPHASE"), &cfg), 1.0);
        assert_eq!(brand_score(&enphase, Some("Fronius"), &cfg), 0.5);
        assert_eq!(brand_score(&enphase, None, &cfg), 0.5);
        assert_eq!(reliability_score(&enphase, &cfg), 1.0);

        let goodwe = candidate("goodwe-gw5000-ds", None);
        assert_eq!(reliability_score(&goodwe, &cfg), 0.7);
        assert!((warranty_score(&goodwe, &cfg) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn bullets_follow_priority_and_cap() {
        let cfg = ScoringConfig::default();
        let window = SizingConfig::default().premium;
        let c = candidate("enphase-iq8-8-0", Some("tesla-powerwall-3"));
        let bullets = justifications(&c, &flow(2.0), &rebate(c.cost.total), &roi(Guarded::Finite(5.0), 0.8), &ctx(&cfg, &window, Some("Enphase")));
        assert_eq!(bullets.len(), 3);
        assert!(bullets[0].starts_with("Fast payback"));
        assert!(bullets[1].contains("kWh battery"));
        assert!(bullets[2].contains("inverter warranty"));
    }

    #[test]
    fn lower_priority_bullets_appear_when_room() {
        let cfg = ScoringConfig::default();
        let window = SizingConfig::default().premium;
        let c = candidate("solaredge-se10k", None);
        let bullets = justifications(&c, &flow(3.0), &rebate(0.0), &roi(Guarded::Unbounded, 0.0), &ctx(&cfg, &window, Some("solaredge")));
        assert_eq!(
            bullets,
            vec![
                "12-year inverter warranty".to_string(),
                "Matches your preferred brand (SolarEdge)".to_string(),
                "Export capped at 5 kW; 3.0 kWh/day clipped".to_string(),
            ]
        );
    }

    #[test]
    fn total_uses_tier_weights() {
        let cfg = ScoringConfig::default();
        let window = SizingConfig::default().premium;
        let c = candidate("fronius-gen24-plus-6-0", Some("byd-hvm-22-1"));
        let scored = score_candidate(c, flow(0.0), rebate(3000.0), roi(Guarded::Finite(9.0), 0.4), &ctx(&cfg, &window, None));
        let expected = scored.sub_scores.weighted(&cfg.premium);
        assert!((scored.total_score - expected).abs() < 1e-12);
        assert!(scored.total_score > 0.0 && scored.total_score <= 1.0);
        assert_eq!(scored.confidence, 0.6);
        assert_eq!(scored.sub_scores.roi, 0.4);
    }
}
