//! ROI engine: annual savings, payback, NPV, IRR approximation, LCOE and a
//! normalised 0–1 score.

use std::fmt;

use serde::Serialize;

use crate::config::RoiConfig;
use crate::energy::EnergyFlow;
use crate::intake::IntakeProfile;

const DAYS_PER_YEAR: f64 = 365.0;

/// Result of a division whose divisor may be zero or negative.
///
/// `Unbounded` stands for an infinite or undefined value (e.g. payback with
/// no savings) and serialises as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Guarded {
    Finite(f64),
    Unbounded,
}

impl Guarded {
    /// `numerator / denominator`, or `Unbounded` when the denominator is ≤ 0
    /// or the quotient is not finite.
    pub fn from_ratio(numerator: f64, denominator: f64) -> Self {
        if denominator <= 0.0 || denominator.is_nan() {
            return Self::Unbounded;
        }
        let value = numerator / denominator;
        if value.is_finite() {
            Self::Finite(value)
        } else {
            Self::Unbounded
        }
    }

    pub fn finite(self) -> Option<f64> {
        match self {
            Self::Finite(v) => Some(v),
            Self::Unbounded => None,
        }
    }

    pub fn is_finite(self) -> bool {
        matches!(self, Self::Finite(_))
    }
}

impl fmt::Display for Guarded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(v) => match f.precision() {
                Some(p) => write!(f, "{v:.p$}"),
                None => write!(f, "{v}"),
            },
            Self::Unbounded => write!(f, "n/a"),
        }
    }
}

/// Which intake fields the customer provided explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfidenceInputs {
    pub stated_daily_usage: bool,
    pub stated_retailer: bool,
    pub known_phase: bool,
    pub explicit_tariff: bool,
}

impl ConfidenceInputs {
    pub fn from_intake(intake: &IntakeProfile) -> Self {
        Self {
            stated_daily_usage: intake.daily_kwh.is_some(),
            stated_retailer: intake.has_stated_retailer(),
            known_phase: intake.phase.is_known(),
            explicit_tariff: intake.tariff_cents_per_kwh.is_some(),
        }
    }

    pub fn explicit_count(&self) -> u32 {
        [
            self.stated_daily_usage,
            self.stated_retailer,
            self.known_phase,
            self.explicit_tariff,
        ]
        .iter()
        .map(|b| u32::from(*b))
        .sum()
    }
}

/// Confidence in a candidate's projection, in `[confidence_min, confidence_max]`.
///
/// Starts at the base value, gains a step per explicitly provided intake
/// field and loses a penalty per component omitted from the candidate.
pub fn confidence(inputs: &ConfidenceInputs, omitted_components: usize, cfg: &RoiConfig) -> f64 {
    let raw = cfg.confidence_base + cfg.confidence_step * f64::from(inputs.explicit_count())
        - cfg.omitted_penalty * omitted_components as f64;
    raw.clamp(cfg.confidence_min, cfg.confidence_max)
}

/// Tariff and system facts the projection needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiInput<'a> {
    pub flow: &'a EnergyFlow,
    /// Import rate ($/kWh).
    pub flat_rate_per_kwh: f64,
    /// Supply charge ($/day).
    pub daily_charge: f64,
    /// Feed-in rate for the customer's retailer ($/kWh).
    pub feed_in_per_kwh: f64,
    pub battery_kwh: Option<f64>,
    pub daily_usage_kwh: f64,
    /// Cost after rebates.
    pub upfront_cost: f64,
}

/// Financial projection for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoiMetrics {
    pub upfront_cost: f64,
    /// Yearly value of self-consumed energy no longer drawn from the grid.
    pub grid_savings: f64,
    pub export_revenue: f64,
    /// Yearly supply-charge saving from battery-backed self-sufficiency.
    pub fixed_charge_savings: f64,
    pub annual_savings: f64,
    pub payback_years: Guarded,
    pub npv: f64,
    /// `annual_savings / upfront_cost × 100`. A simple ratio, not a true IRR.
    pub irr_approx_pct: Guarded,
    /// Levelised cost of energy ($/kWh) over the horizon.
    pub lcoe: Guarded,
    /// Normalised 0–1 blend of payback and NPV.
    pub score: f64,
    pub confidence: f64,
}

/// Normalised ROI score from payback and NPV, each term clamped to `[0, 1]`.
pub fn roi_score(payback: Guarded, npv: f64, cfg: &RoiConfig) -> f64 {
    let payback_term = payback
        .finite()
        .map(|years| (1.0 - years / cfg.payback_ceiling_years).clamp(0.0, 1.0))
        .unwrap_or(0.0);
    let npv_term = (npv / cfg.npv_ceiling).clamp(0.0, 1.0);
    cfg.payback_weight * payback_term + cfg.npv_weight * npv_term
}

/// Projects savings and return metrics over the configured horizon.
pub fn evaluate(input: &RoiInput<'_>, cfg: &RoiConfig, confidence: f64) -> RoiMetrics {
    let flow = input.flow;
    let upfront_cost = input.upfront_cost.max(0.0);

    let grid_savings = (DAYS_PER_YEAR * flow.self_consumption_kwh * input.flat_rate_per_kwh).max(0.0);
    let export_revenue = (DAYS_PER_YEAR * flow.export_kwh * input.feed_in_per_kwh).max(0.0);
    let fixed_charge_savings = match input.battery_kwh {
        Some(kwh) if input.daily_usage_kwh > 0.0 => {
            let coverage = (kwh / input.daily_usage_kwh).clamp(0.0, 1.0);
            (DAYS_PER_YEAR * input.daily_charge * cfg.fixed_charge_offset * coverage).max(0.0)
        }
        _ => 0.0,
    };
    let annual_savings = grid_savings + export_revenue + fixed_charge_savings;

    let payback_years = Guarded::from_ratio(upfront_cost, annual_savings);
    let irr_approx_pct = Guarded::from_ratio(annual_savings * 100.0, upfront_cost);

    let has_battery = input.battery_kwh.is_some();
    let mut discounted = 0.0;
    let mut lifetime_generation = 0.0;
    for year in 1..=cfg.horizon_years {
        let age = f64::from(year - 1);
        let pv_factor = (1.0 - cfg.pv_degradation).powf(age);
        let battery_factor = if has_battery {
            (1.0 - cfg.battery_degradation).powf(age)
        } else {
            1.0
        };
        let cash = grid_savings * pv_factor
            + export_revenue * pv_factor * battery_factor
            + fixed_charge_savings;
        discounted += cash / (1.0 + cfg.discount_rate).powf(f64::from(year));
        lifetime_generation += DAYS_PER_YEAR * flow.generation_kwh * pv_factor;
    }
    let npv = discounted - upfront_cost;
    let lcoe = Guarded::from_ratio(upfront_cost, lifetime_generation);

    RoiMetrics {
        upfront_cost,
        grid_savings,
        export_revenue,
        fixed_charge_savings,
        annual_savings,
        payback_years,
        npv,
        irr_approx_pct,
        lcoe,
        score: roi_score(payback_years, npv, cfg),
        confidence,
    }
}
