//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use pv_recommender::catalog::Catalog;
use pv_recommender::config::EngineConfig;
use pv_recommender::engine::{Engine, Recommendation};
use pv_recommender::error::EngineError;
use pv_recommender::intake::{BillingPeriod, IntakeProfile, RoofType, SupplyPhase, UsageLevel};
use pv_recommender::tariff::RegionTariffProfile;

/// $300 quarterly bill at 30 c/kWh on a single-storey tile roof in Sydney.
pub fn sydney_intake() -> IntakeProfile {
    IntakeProfile::new(300.0, BillingPeriod::Quarterly, RoofType::Tile, 1)
        .with_tariff(30.0)
        .with_usage_level(UsageLevel::Moderate)
        .with_phase(SupplyPhase::Single)
        .with_postcode("2000")
}

/// Heavy-usage two-storey household on three-phase supply.
pub fn large_household_intake() -> IntakeProfile {
    IntakeProfile::new(900.0, BillingPeriod::Quarterly, RoofType::Metal, 2)
        .with_tariff(32.0)
        .with_usage_level(UsageLevel::Heavy)
        .with_phase(SupplyPhase::Three)
        .with_postcode("2150")
}

/// Runs the engine with the built-in catalog and the given config.
pub fn recommend_with(config: &EngineConfig, intake: &IntakeProfile) -> Result<Recommendation, EngineError> {
    let catalog = Catalog::builtin();
    let region = config
        .resolve_region()
        .unwrap_or_else(|_| RegionTariffProfile::nsw());
    Engine::new(&catalog, &region, config).recommend(intake)
}

/// Runs the engine with the baseline config and built-in catalog.
pub fn recommend(intake: &IntakeProfile) -> Recommendation {
    recommend_with(&EngineConfig::baseline(), intake)
        .unwrap_or_else(|e| panic!("recommendation failed: {e}"))
}
