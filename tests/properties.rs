//! Property tests for the model invariants.

mod common;

use std::collections::BTreeSet;

use proptest::prelude::*;

use pv_recommender::catalog::Phase;
use pv_recommender::config::{EngineConfig, RebateConfig, SizingConfig};
use pv_recommender::energy::{self, BatteryInput, FlowInput};
use pv_recommender::intake::{BillingPeriod, IntakeProfile, RoofType, SupplyPhase, UsageLevel};
use pv_recommender::rebate::{self, RebateInput};
use pv_recommender::sizing;
use pv_recommender::tariff::RegionTariffProfile;

fn roof() -> impl Strategy<Value = RoofType> {
    prop_oneof![
        Just(RoofType::Tile),
        Just(RoofType::Metal),
        Just(RoofType::Concrete),
        Just(RoofType::Flat),
        Just(RoofType::Slate),
    ]
}

fn usage_level() -> impl Strategy<Value = UsageLevel> {
    prop_oneof![Just(UsageLevel::Basic), Just(UsageLevel::Moderate), Just(UsageLevel::Heavy)]
}

fn supply_phase() -> impl Strategy<Value = SupplyPhase> {
    prop_oneof![Just(SupplyPhase::Single), Just(SupplyPhase::Three), Just(SupplyPhase::Unknown)]
}

fn intake() -> impl Strategy<Value = IntakeProfile> {
    (
        20.0f64..3000.0,
        prop_oneof![Just(BillingPeriod::Monthly), Just(BillingPeriod::Quarterly)],
        10.0f64..60.0,
        roof(),
        1u8..=3,
        usage_level(),
        supply_phase(),
        2000u32..2999,
    )
        .prop_map(|(bill, period, tariff, roof, storeys, level, phase, postcode)| {
            IntakeProfile::new(bill, period, roof, storeys)
                .with_tariff(tariff)
                .with_usage_level(level)
                .with_phase(phase)
                .with_postcode(postcode.to_string())
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn usage_grows_with_bill(bill in 1.0f64..5000.0, extra in 0.01f64..500.0, tariff in 5.0f64..80.0) {
        let lo = sizing::annual_usage_from_bill(bill, BillingPeriod::Quarterly, tariff);
        let hi = sizing::annual_usage_from_bill(bill + extra, BillingPeriod::Quarterly, tariff);
        prop_assert!(hi > lo);
    }

    #[test]
    fn targets_stay_in_windows(intake in intake()) {
        let cfg = SizingConfig::default();
        let estimate = sizing::estimate(&intake, &RegionTariffProfile::nsw(), &cfg);
        prop_assert!(estimate.is_ok());
        if let Ok(estimate) = estimate {
            for target in &estimate.targets {
                let w = cfg.window(target.tier);
                prop_assert!(target.system_kw >= w.min_kw && target.system_kw <= w.max_kw);
                if let Some(kwh) = target.battery_kwh {
                    prop_assert!(kwh >= w.min_battery_kwh && kwh <= w.max_battery_kwh);
                }
            }
        }
    }

    #[test]
    fn rebate_total_is_sum_of_parts(
        pv_kw in 0.0f64..20.0,
        battery in proptest::option::of(0.0f64..30.0),
        zone in 1.0f64..1.7,
        eligible in any::<bool>(),
    ) {
        let r = rebate::calculate(
            &RebateInput {
                pv_kw,
                battery_kwh: battery,
                zone_rating: zone,
                regional_eligible: eligible,
                regional_amount: 1600.0,
            },
            &RebateConfig::default(),
        );
        prop_assert!(r.pv_rebate >= 0.0 && r.battery_rebate >= 0.0 && r.regional_rebate >= 0.0);
        prop_assert!((r.total - (r.pv_rebate + r.battery_rebate + r.regional_rebate)).abs() < 1e-9);
    }

    #[test]
    fn energy_balances(
        pv_kw in 0.0f64..15.0,
        usage in 0.0f64..60.0,
        inverter in 3.0f64..15.0,
        three_phase in any::<bool>(),
        battery in proptest::option::of(5.0f64..25.0),
    ) {
        let region = RegionTariffProfile::nsw();
        let flow = energy::model(
            &FlowInput {
                pv_kw,
                daily_usage_kwh: usage,
                inverter_ac_kw: inverter,
                phase: if three_phase { Phase::Three } else { Phase::Single },
                battery: battery.map(|usable_kwh| BatteryInput { usable_kwh, round_trip_efficiency: None }),
            },
            region.pv_yield_kwh_per_kw_day,
            &region.export_caps,
            &region.battery_efficiency,
        );
        prop_assert!((flow.self_consumption_kwh + flow.grid_draw_kwh - usage).abs() < 1e-9);
        prop_assert!((flow.self_consumption_kwh + flow.raw_export_kwh - flow.generation_kwh).abs() < 1e-9);
        prop_assert!(flow.export_kwh <= flow.raw_export_kwh + 1e-12);
        prop_assert!(flow.lost_export_kwh >= 0.0);
        prop_assert!(flow.self_consumption_share > 0.0 && flow.self_consumption_share <= 1.0);
    }

    #[test]
    fn oversized_inverter_clips_export(pv_kw in 6.0f64..15.0, inverter in 5.5f64..12.0) {
        let region = RegionTariffProfile::nsw();
        let flow = energy::model(
            &FlowInput {
                pv_kw,
                daily_usage_kwh: 5.0,
                inverter_ac_kw: inverter,
                phase: Phase::Single,
                battery: None,
            },
            region.pv_yield_kwh_per_kw_day,
            &region.export_caps,
            &region.battery_efficiency,
        );
        prop_assert!(flow.raw_export_kwh > 0.0);
        prop_assert!(flow.export_kwh < flow.raw_export_kwh);
        prop_assert!(flow.is_export_limited());
    }

    #[test]
    fn recommendations_are_deterministic_and_diverse(intake in intake()) {
        let config = EngineConfig::baseline();
        let a = common::recommend_with(&config, &intake);
        let b = common::recommend_with(&config, &intake);
        prop_assert_eq!(&a, &b);
        prop_assert!(a.is_ok(), "valid intake should be recommended: {:?}", a.as_ref().err());
        let Ok(rec) = a else {
            return Ok(());
        };
        let len = rec.shortlist.len();
        prop_assert!((2..=3).contains(&len), "shortlist has {} entries", len);
        let brands: BTreeSet<_> = rec
            .shortlist
            .iter()
            .map(|e| e.candidate.inverter_brand().map(str::to_ascii_lowercase))
            .collect();
        prop_assert_eq!(brands.len(), len);
        let ids: BTreeSet<_> = rec.shortlist.iter().map(|e| e.candidate.candidate.id.clone()).collect();
        prop_assert_eq!(ids.len(), len);
    }
}
