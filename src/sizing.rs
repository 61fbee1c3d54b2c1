//! Usage and sizing estimator.
//!
//! Converts a bill (or a directly stated daily usage) into an annual
//! consumption estimate and per-tier PV and battery size targets, each
//! clamped to its tier window.

use serde::Serialize;

use crate::catalog::PackageTier;
use crate::config::{SizingConfig, TierWindow};
use crate::error::EngineError;
use crate::intake::{BillingPeriod, BudgetBand, IntakeProfile, OutageSensitivity, UsageLevel};
use crate::tariff::{DailyUsageBand, RegionTariffProfile};

const DAYS_PER_YEAR: f64 = 365.0;

/// Size targets for one package tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierTarget {
    pub tier: PackageTier,
    /// PV array size (kW), within the tier window.
    pub system_kw: f64,
    /// Battery size (kWh), within the tier window; `None` when no battery is offered.
    pub battery_kwh: Option<f64>,
}

/// Output of the usage and sizing estimator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingEstimate {
    /// Household consumption per year, excluding EV charging.
    pub annual_usage_kwh: f64,
    /// Household consumption per day, excluding EV charging.
    pub household_daily_kwh: f64,
    /// EV charging load added to the daily figure.
    pub ev_daily_kwh: f64,
    /// Tariff used to convert the bill (cents/kWh).
    pub tariff_cents_per_kwh: f64,
    pub usage_level: UsageLevel,
    /// Roof-type multiplier scaled by the storey multiplier.
    pub roof_complexity: f64,
    /// Flat cost for storeys above the first.
    pub storey_cost_adder: f64,
    /// Expected daily range for the property type.
    pub usage_band: DailyUsageBand,
    /// Whether the household figure falls inside `usage_band`.
    pub usage_within_band: bool,
    /// Targets in tier order: value, balanced, premium.
    pub targets: Vec<TierTarget>,
}

impl SizingEstimate {
    /// Daily load the system is sized against, EV charging included.
    pub fn daily_usage_kwh(&self) -> f64 {
        self.household_daily_kwh + self.ev_daily_kwh
    }

    pub fn target(&self, tier: PackageTier) -> Option<&TierTarget> {
        self.targets.iter().find(|t| t.tier == tier)
    }
}

/// Annual consumption implied by a bill at a flat tariff.
///
/// `annualized bill / (tariff / 100)`; strictly increasing in `bill_amount`
/// for a positive tariff.
pub fn annual_usage_from_bill(bill_amount: f64, period: BillingPeriod, tariff_cents: f64) -> f64 {
    let annual_bill = bill_amount * period.periods_per_year();
    annual_bill / (tariff_cents / 100.0)
}

/// PV size matching daily usage, scaled for the tier and usage level and
/// clamped to the tier window.
pub fn pv_target_kw(daily_kwh: f64, yield_kwh_per_kw: f64, window: &TierWindow, usage_multiplier: f64) -> f64 {
    let raw = daily_kwh / yield_kwh_per_kw * window.pv_factor * usage_multiplier;
    clamp_to(raw, window.min_kw, window.max_kw)
}

/// Battery size covering a share of daily usage, clamped to the tier window.
pub fn battery_target_kwh(daily_kwh: f64, window: &TierWindow, boost: f64) -> f64 {
    let raw = daily_kwh * window.battery_factor * boost;
    clamp_to(raw, window.min_battery_kwh, window.max_battery_kwh)
}

// NaN collapses to the window minimum.
fn clamp_to(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() { min } else { value.clamp(min, max) }
}

/// Estimates annual usage, roof complexity and per-tier size targets.
///
/// # Errors
///
/// Returns [`EngineError::InvalidIntake`] if the intake fails validation.
pub fn estimate(
    intake: &IntakeProfile,
    region: &RegionTariffProfile,
    cfg: &SizingConfig,
) -> Result<SizingEstimate, EngineError> {
    intake.validate()?;

    let tariff_cents = intake
        .tariff_cents_per_kwh
        .unwrap_or(region.flat_rate_per_kwh * 100.0);
    let annual_usage_kwh = match intake.daily_kwh {
        Some(daily) => daily * DAYS_PER_YEAR,
        None => annual_usage_from_bill(intake.bill_amount, intake.billing_period, tariff_cents),
    };
    let household_daily_kwh = annual_usage_kwh / DAYS_PER_YEAR;
    let ev_daily_kwh = if intake.has_ev() { cfg.ev_daily_kwh } else { 0.0 };
    let daily_kwh = household_daily_kwh + ev_daily_kwh;

    let usage_level = intake.usage_level_or_default();
    let usage_multiplier = cfg.usage.for_level(usage_level);
    let roof_complexity =
        cfg.roof.for_roof(intake.roof_type) * cfg.storey_multiplier(intake.storeys);
    let storey_cost_adder = f64::from(intake.storeys.saturating_sub(1)) * cfg.storey_adder;

    let boost = match intake.outage_sensitivity {
        Some(OutageSensitivity::High) => cfg.outage_battery_boost,
        _ => 1.0,
    };
    let tight_budget = intake.budget == Some(BudgetBand::Tight);

    let targets = PackageTier::ALL
        .iter()
        .map(|&tier| {
            let window = cfg.window(tier);
            let system_kw = pv_target_kw(
                daily_kwh,
                region.pv_yield_kwh_per_kw_day,
                window,
                usage_multiplier,
            );
            let battery_kwh = if tight_budget && tier == PackageTier::Value {
                None
            } else {
                Some(battery_target_kwh(daily_kwh, window, boost))
            };
            TierTarget {
                tier,
                system_kw,
                battery_kwh,
            }
        })
        .collect();

    let usage_band = region
        .usage_bands
        .for_property(intake.property_type_or_default());

    Ok(SizingEstimate {
        annual_usage_kwh,
        household_daily_kwh,
        ev_daily_kwh,
        tariff_cents_per_kwh: tariff_cents,
        usage_level,
        roof_complexity,
        storey_cost_adder,
        usage_band,
        usage_within_band: usage_band.contains(household_daily_kwh),
        targets,
    })
}
