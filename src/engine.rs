//! Recommendation pipeline.
//!
//! Intake flows through sizing, then per tier through SKU selection, the
//! energy flow model, rebates, ROI and scoring, and finally into the
//! diversification selector. The engine holds only shared references to
//! immutable inputs, so a call has no side effects and identical inputs give
//! identical output.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::candidate::{CandidateParts, CostBasis, SystemCandidate};
use crate::catalog::{Catalog, CatalogItem, Category, PackageTier, Phase};
use crate::config::{EngineConfig, SelectionPolicy};
use crate::energy::{self, BatteryInput, FlowInput};
use crate::error::EngineError;
use crate::intake::IntakeProfile;
use crate::rebate::{self, RebateInput};
use crate::roi::{self, ConfidenceInputs, RoiInput};
use crate::scoring::{ScoreContext, ScoredCandidate, ShortlistEntry, score_candidate, select_shortlist};
use crate::sizing::{self, SizingEstimate, TierTarget};
use crate::sku::{InverterRequest, SkuSelector};
use crate::tariff::RegionTariffProfile;

/// Full engine output for one intake.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub catalog_version: String,
    pub region: String,
    pub sizing: SizingEstimate,
    /// Every evaluated candidate, in tier order with primaries before alternates.
    pub candidates: Vec<ScoredCandidate>,
    /// Diversified, ranked picks drawn from `candidates`.
    pub shortlist: Vec<ShortlistEntry>,
}

/// Per-request facts shared by every tier.
struct RequestContext<'a> {
    intake: &'a IntakeProfile,
    sizing: &'a SizingEstimate,
    phase: Phase,
    postcode: Option<u32>,
    zone_rating: f64,
    feed_in_per_kwh: f64,
    confidence: ConfidenceInputs,
}

/// Recommendation engine over an immutable catalog, region and configuration.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'a> {
    catalog: &'a Catalog,
    region: &'a RegionTariffProfile,
    config: &'a EngineConfig,
}

/// Converts a recoverable selection error into an omitted slot.
fn slot<'c>(
    result: Result<&'c CatalogItem, EngineError>,
    omitted: &mut Vec<Category>,
) -> Result<Option<&'c CatalogItem>, EngineError> {
    match result {
        Ok(item) => Ok(Some(item)),
        Err(EngineError::EmptyCatalogTier { category, tier }) => {
            warn!("catalog has no sellable {category} for tier {tier}, omitting");
            omitted.push(category);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

impl<'a> Engine<'a> {
    pub fn new(catalog: &'a Catalog, region: &'a RegionTariffProfile, config: &'a EngineConfig) -> Self {
        Self {
            catalog,
            region,
            config,
        }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn region(&self) -> &'a RegionTariffProfile {
        self.region
    }

    /// Runs the full pipeline for one intake.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidIntake`] if the intake fails validation;
    /// no partial output is produced. Empty catalog slots are not errors: the
    /// component is omitted and the candidate's confidence lowered.
    pub fn recommend(&self, intake: &IntakeProfile) -> Result<Recommendation, EngineError> {
        let sizing = sizing::estimate(intake, self.region, &self.config.sizing)?;
        debug!(
            "annual usage {:.0} kWh, daily load {:.1} kWh, roof complexity {:.2}",
            sizing.annual_usage_kwh,
            sizing.daily_usage_kwh(),
            sizing.roof_complexity
        );
        if !sizing.usage_within_band {
            debug!(
                "household usage {:.1} kWh/day outside {} band [{:.0}, {:.0}]",
                sizing.household_daily_kwh,
                intake.property_type_or_default(),
                sizing.usage_band.low_kwh,
                sizing.usage_band.high_kwh
            );
        }

        let postcode = intake.postcode_number();
        let ctx = RequestContext {
            intake,
            sizing: &sizing,
            phase: intake.phase.resolved(),
            postcode,
            zone_rating: rebate::zone_rating(postcode, self.region.default_zone_rating),
            feed_in_per_kwh: self.region.feed_in.rate_for(intake.retailer.as_deref()),
            confidence: ConfidenceInputs::from_intake(intake),
        };

        let mut candidates = Vec::new();
        for target in &sizing.targets {
            for candidate in self.tier_candidates(target, &ctx)? {
                candidates.push(self.evaluate(candidate, &ctx));
            }
        }

        let shortlist = select_shortlist(&candidates, intake.preferred_brand());
        info!(
            "shortlisted {} of {} candidates: {}",
            shortlist.len(),
            candidates.len(),
            shortlist
                .iter()
                .map(|e| format!("{} ({})", e.candidate.candidate.id, e.motivation))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Recommendation {
            catalog_version: self.catalog.version.clone(),
            region: self.region.name.clone(),
            sizing,
            candidates,
            shortlist,
        })
    }

    /// Builds the primary candidate for a tier plus one alternate per other
    /// eligible inverter brand.
    fn tier_candidates(&self, target: &TierTarget, ctx: &RequestContext<'_>) -> Result<Vec<SystemCandidate>, EngineError> {
        let tier = target.tier;
        let quality = tier.quality_tier();
        let policy: &'a SelectionPolicy = &self.config.policy;
        let sku = SkuSelector::new(self.catalog, policy);
        let mut omitted = Vec::new();

        let panel = slot(sku.select_panel(quality), &mut omitted)?;
        let battery = match target.battery_kwh {
            Some(kwh) => slot(sku.select_battery(quality, kwh), &mut omitted)?,
            None => None,
        };
        let ev_charger = if ctx.intake.has_ev() {
            slot(sku.select_ev_charger(ctx.intake.ev_brand(), quality), &mut omitted)?
        } else {
            None
        };

        let request = InverterRequest {
            tier: quality,
            phase: ctx.phase,
            target_kw: target.system_kw,
            preferred_brand: ctx.intake.preferred_brand(),
            battery,
            only_brand: None,
        };
        let mut inverter_omitted = omitted.clone();
        let primary = slot(sku.select_inverter(&request), &mut inverter_omitted)?;

        let basis = CostBasis {
            system_kw: target.system_kw,
            roof_complexity: ctx.sizing.roof_complexity,
            storey_adder: ctx.sizing.storey_cost_adder,
        };
        let parts = |inverter: Option<&'a CatalogItem>, omitted: Vec<_>| CandidateParts {
            panel,
            inverter,
            battery,
            ev_charger,
            omitted,
        };

        let mut out = vec![SystemCandidate::assemble(
            tier.as_slug(),
            tier,
            parts(primary, inverter_omitted),
            &basis,
            &self.config.pricing,
        )];

        let Some(primary) = primary else {
            return Ok(out);
        };
        for brand in self
            .catalog
            .inverter_brands(quality, ctx.phase, &policy.disabled_brands)
        {
            if primary.brand_is(&brand) {
                continue;
            }
            let alt_request = InverterRequest {
                only_brand: Some(brand.as_str()),
                ..request
            };
            if let Ok(inverter) = sku.select_inverter(&alt_request) {
                let id = format!("{}-{}", tier.as_slug(), brand.to_ascii_lowercase());
                out.push(SystemCandidate::assemble(
                    id,
                    tier,
                    parts(Some(inverter), omitted.clone()),
                    &basis,
                    &self.config.pricing,
                ));
            }
        }

        debug!(
            "{tier}: {} candidate(s), target {:.1} kW / {} kWh battery",
            out.len(),
            target.system_kw,
            target
                .battery_kwh
                .map(|k| format!("{k:.1}"))
                .unwrap_or_else(|| "no".to_string())
        );
        Ok(out)
    }

    /// Runs the flow, rebate, ROI and scoring models for one candidate.
    fn evaluate(&self, candidate: SystemCandidate, ctx: &RequestContext<'_>) -> ScoredCandidate {
        let region = self.region;
        let cfg = self.config;
        let daily_usage_kwh = ctx.sizing.daily_usage_kwh();
        let pv_kw = if candidate.panel.is_some() {
            candidate.system_kw
        } else {
            0.0
        };

        let flow = energy::model(
            &FlowInput {
                pv_kw,
                daily_usage_kwh,
                inverter_ac_kw: candidate.inverter_ac_kw(),
                phase: ctx.phase,
                battery: candidate.battery.as_ref().and_then(|b| {
                    b.battery_usable_kwh().map(|usable_kwh| BatteryInput {
                        usable_kwh,
                        round_trip_efficiency: b.battery_round_trip_efficiency(),
                    })
                }),
            },
            region.pv_yield_kwh_per_kw_day,
            &region.export_caps,
            &region.battery_efficiency,
        );

        let program = region.regional_rebate.as_ref();
        let rebate = rebate::calculate(
            &RebateInput {
                pv_kw,
                battery_kwh: candidate.battery_kwh,
                zone_rating: ctx.zone_rating,
                regional_eligible: rebate::regional_eligible(program, ctx.postcode, candidate.has_battery()),
                regional_amount: program.map(|p| p.amount).unwrap_or(0.0),
            },
            &cfg.rebates,
        );

        let confidence = roi::confidence(&ctx.confidence, candidate.omitted.len(), &cfg.roi);
        let metrics = roi::evaluate(
            &RoiInput {
                flow: &flow,
                flat_rate_per_kwh: ctx.sizing.tariff_cents_per_kwh / 100.0,
                daily_charge: region.daily_charge,
                feed_in_per_kwh: ctx.feed_in_per_kwh,
                battery_kwh: candidate.battery_kwh,
                daily_usage_kwh,
                upfront_cost: (candidate.cost.total - rebate.total).max(0.0),
            },
            &cfg.roi,
            confidence,
        );

        let score_ctx = ScoreContext {
            scoring: &cfg.scoring,
            window: cfg.sizing.window(candidate.tier),
            preferred_brand: ctx.intake.preferred_brand(),
        };
        let scored = score_candidate(candidate, flow, rebate, metrics, &score_ctx);
        debug!(
            "{}: total {:.3}, payback {:.1} y, rebates ${:.0}",
            scored.candidate.id, scored.total_score, scored.roi.payback_years, scored.rebate.total
        );
        scored
    }
}

impl Recommendation {
    /// Candidate ids in shortlist order.
    pub fn shortlisted_ids(&self) -> Vec<&str> {
        self.shortlist
            .iter()
            .map(|e| e.candidate.candidate.id.as_str())
            .collect()
    }

    pub fn candidates_for(&self, tier: PackageTier) -> impl Iterator<Item = &ScoredCandidate> {
        self.candidates.iter().filter(move |c| c.candidate.tier == tier)
    }

    /// Primary (non-alternate) candidate for a tier.
    pub fn primary(&self, tier: PackageTier) -> Option<&ScoredCandidate> {
        self.candidates
            .iter()
            .find(|c| c.candidate.tier == tier && c.candidate.id == tier.as_slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Tier;
    use crate::intake::{BillingPeriod, RoofType, SupplyPhase, UsageLevel};

    fn intake() -> IntakeProfile {
        IntakeProfile::new(300.0, BillingPeriod::Quarterly, RoofType::Tile, 1)
            .with_tariff(30.0)
            .with_usage_level(UsageLevel::Moderate)
            .with_phase(SupplyPhase::Single)
            .with_postcode("2000")
    }

    fn run(catalog: &Catalog, config: &EngineConfig, intake: &IntakeProfile) -> Result<Recommendation, EngineError> {
        let region = config.resolve_region().unwrap_or_else(|_| RegionTariffProfile::nsw());
        Engine::new(catalog, &region, config).recommend(intake)
    }

    #[test]
    fn builds_primary_and_alternates_per_tier() {
        let catalog = Catalog::builtin();
        let rec = run(&catalog, &EngineConfig::baseline(), &intake());
        assert!(rec.is_ok(), "recommend failed: {:?}", rec.err());
        let Ok(rec) = rec else { return };
        for tier in PackageTier::ALL {
            assert!(rec.primary(tier).is_some(), "missing primary for {tier}");
        }
        // Entry single-phase has GoodWe and Sungrow.
        assert_eq!(rec.candidates_for(PackageTier::Value).count(), 2);
    }

    #[test]
    fn shortlist_has_two_or_three_distinct_brands() {
        let catalog = Catalog::builtin();
        let rec = run(&catalog, &EngineConfig::baseline(), &intake());
        let Ok(rec) = rec else {
            panic!("recommend failed");
        };
        assert!((2..=3).contains(&rec.shortlist.len()));
        let mut brands: Vec<_> = rec.shortlist.iter().map(|e| e.candidate.inverter_brand()).collect();
        brands.sort();
        brands.dedup();
        assert_eq!(brands.len(), rec.shortlist.len());
    }

    #[test]
    fn empty_battery_tier_is_omitted_not_fatal() {
        let items: Vec<_> = Catalog::builtin()
            .items()
            .iter()
            .filter(|i| !(i.category() == Category::Battery && i.tier == Tier::Mid))
            .cloned()
            .collect();
        let catalog = Catalog::new("no-mid-batteries", items);
        let rec = run(&catalog, &EngineConfig::baseline(), &intake());
        let Ok(rec) = rec else {
            panic!("recommend failed");
        };
        let balanced = rec.primary(PackageTier::Balanced);
        assert!(balanced.is_some_and(|c| c.candidate.battery.is_none()));
        assert!(balanced.is_some_and(|c| c.candidate.omitted.contains(&Category::Battery)));
        let value = rec.primary(PackageTier::Value);
        assert!(balanced.map(|c| c.confidence) < value.map(|c| c.confidence));
    }

    #[test]
    fn invalid_intake_yields_no_output() {
        let catalog = Catalog::builtin();
        let mut bad = intake();
        bad.bill_amount = 0.0;
        let rec = run(&catalog, &EngineConfig::baseline(), &bad);
        assert!(matches!(rec, Err(EngineError::InvalidIntake { .. })));
    }

    #[test]
    fn ev_owner_gets_matching_charger() {
        let catalog = Catalog::builtin();
        let rec = run(&catalog, &EngineConfig::baseline(), &intake().with_ev(Some("BYD")));
        let Ok(rec) = rec else {
            panic!("recommend failed");
        };
        for c in &rec.candidates {
            assert_eq!(c.candidate.ev_charger.as_ref().map(|e| e.id.as_str()), Some("byd-eva-7kw"));
        }
    }

    #[test]
    fn same_zone_rating_across_tiers() {
        let catalog = Catalog::builtin();
        let rec = run(&catalog, &EngineConfig::baseline(), &intake().with_postcode("4810"));
        let Ok(rec) = rec else {
            panic!("recommend failed");
        };
        assert!(rec.candidates.iter().all(|c| c.rebate.zone_rating == 1.536));
    }

    #[test]
    fn regional_rebate_applies_to_battery_systems_in_range() {
        let catalog = Catalog::builtin();
        let rec = run(&catalog, &EngineConfig::baseline(), &intake());
        let Ok(rec) = rec else {
            panic!("recommend failed");
        };
        for c in &rec.candidates {
            let expected = if c.candidate.has_battery() { 1600.0 } else { 0.0 };
            assert_eq!(c.rebate.regional_rebate, expected);
        }
    }

    #[test]
    fn disabled_brand_never_appears() {
        let catalog = Catalog::builtin();
        let mut config = EngineConfig::baseline();
        config.policy.disabled_brands = vec!["Sungrow".to_string()];
        let rec = run(&catalog, &config, &intake());
        let Ok(rec) = rec else {
            panic!("recommend failed");
        };
        for c in &rec.candidates {
            let cand = &c.candidate;
            for item in [&cand.panel, &cand.inverter, &cand.battery, &cand.ev_charger].into_iter().flatten() {
                assert!(!item.brand_is("Sungrow"));
            }
        }
    }
}
