//! Daily energy flow model: generation, self-consumption, grid draw and export.

use serde::Serialize;

use crate::catalog::Phase;
use crate::tariff::{BatteryEfficiency, ExportCaps};

/// Self-consumption share without a battery.
const BASE_SHARE: f64 = 0.50;
/// Self-consumption share with any battery, before the size bonus.
const BATTERY_BASE_SHARE: f64 = 0.60;
/// Largest size bonus a battery can add.
const MAX_BATTERY_BONUS: f64 = 0.25;
/// Battery size at which the full bonus applies (kWh).
const FULL_BONUS_KWH: f64 = 20.0;
/// Upper bound on self-consumption share.
const MAX_SHARE: f64 = 0.85;

/// Battery as seen by the flow model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryInput {
    pub usable_kwh: f64,
    /// Catalog round-trip efficiency, if known.
    pub round_trip_efficiency: Option<f64>,
}

/// Inputs for one day of modelled operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowInput {
    pub pv_kw: f64,
    pub daily_usage_kwh: f64,
    /// Inverter AC rating (kW), compared against the export ceiling.
    pub inverter_ac_kw: f64,
    pub phase: Phase,
    pub battery: Option<BatteryInput>,
}

/// Modelled daily energy flows (kWh/day unless noted).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyFlow {
    pub generation_kwh: f64,
    pub self_consumption_kwh: f64,
    pub grid_draw_kwh: f64,
    /// Export before export-cap clipping.
    pub raw_export_kwh: f64,
    /// Export after export-cap clipping.
    pub export_kwh: f64,
    /// Export clipped away by the cap.
    pub lost_export_kwh: f64,
    pub self_consumption_share: f64,
    /// Export ceiling for the connection phase (kW).
    pub export_ceiling_kw: f64,
}

impl EnergyFlow {
    pub fn is_export_limited(&self) -> bool {
        self.lost_export_kwh > 0.0
    }
}

/// Self-consumption share for an optional battery.
///
/// The size bonus grows linearly to its maximum at 20 kWh and is scaled by
/// the battery's clamped round-trip efficiency relative to the region's upper
/// bound.
pub fn self_consumption_share(battery: Option<&BatteryInput>, efficiency: &BatteryEfficiency) -> f64 {
    let Some(battery) = battery else {
        return BASE_SHARE;
    };
    if battery.usable_kwh <= 0.0 {
        return BASE_SHARE;
    }
    let size_factor = (battery.usable_kwh / FULL_BONUS_KWH).min(1.0);
    let rte_factor = efficiency.clamp(battery.round_trip_efficiency) / efficiency.max_rte;
    (BATTERY_BASE_SHARE + MAX_BATTERY_BONUS * size_factor * rte_factor).min(MAX_SHARE)
}

/// Models one day of generation and consumption.
pub fn model(input: &FlowInput, yield_kwh_per_kw: f64, caps: &ExportCaps, efficiency: &BatteryEfficiency) -> EnergyFlow {
    let generation_kwh = input.pv_kw.max(0.0) * yield_kwh_per_kw;
    let usage = input.daily_usage_kwh.max(0.0);
    let share = self_consumption_share(input.battery.as_ref(), efficiency);

    let self_consumption_kwh = generation_kwh.min(usage * share);
    let grid_draw_kwh = (usage - self_consumption_kwh).max(0.0);
    let raw_export_kwh = (generation_kwh - self_consumption_kwh).max(0.0);

    let export_ceiling_kw = caps.ceiling_for(input.phase);
    let export_kwh = if input.inverter_ac_kw > export_ceiling_kw {
        raw_export_kwh * (export_ceiling_kw / input.inverter_ac_kw)
    } else {
        raw_export_kwh
    };

    EnergyFlow {
        generation_kwh,
        self_consumption_kwh,
        grid_draw_kwh,
        raw_export_kwh,
        export_kwh,
        lost_export_kwh: raw_export_kwh - export_kwh,
        self_consumption_share: share,
        export_ceiling_kw,
    }
}
