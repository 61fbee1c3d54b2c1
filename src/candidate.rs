//! System candidates: one assembled configuration per tier and its cost.

use serde::Serialize;

use crate::catalog::{CatalogItem, Category, PackageTier};
use crate::config::PricingConfig;

/// Itemised cost of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CostBreakdown {
    pub panels: f64,
    pub inverter: f64,
    pub battery: f64,
    pub ev_charger: f64,
    /// PV labour scaled by roof complexity.
    pub installation: f64,
    pub battery_install: f64,
    pub ev_install: f64,
    pub storey_adder: f64,
    pub total: f64,
}

/// Items chosen by the SKU selector for one candidate.
#[derive(Debug, Clone, Default)]
pub struct CandidateParts<'a> {
    pub panel: Option<&'a CatalogItem>,
    pub inverter: Option<&'a CatalogItem>,
    pub battery: Option<&'a CatalogItem>,
    pub ev_charger: Option<&'a CatalogItem>,
    /// Categories the catalog could not fill.
    pub omitted: Vec<Category>,
}

/// Sizing facts the cost model needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBasis {
    pub system_kw: f64,
    pub roof_complexity: f64,
    pub storey_adder: f64,
}

/// An assembled configuration for one package tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemCandidate {
    /// Stable identifier, e.g. `"balanced"` or `"balanced-fronius"`.
    pub id: String,
    pub tier: PackageTier,
    pub panel: Option<CatalogItem>,
    pub panel_count: u32,
    pub inverter: Option<CatalogItem>,
    pub battery: Option<CatalogItem>,
    pub ev_charger: Option<CatalogItem>,
    /// Target PV size (kW).
    pub system_kw: f64,
    /// Usable capacity of the chosen battery (kWh).
    pub battery_kwh: Option<f64>,
    pub cost: CostBreakdown,
    pub omitted: Vec<Category>,
}

/// Panels needed to reach `system_kw`, rounded up.
pub fn panel_count(system_kw: f64, panel_watts: u32) -> u32 {
    if panel_watts == 0 || system_kw <= 0.0 {
        return 0;
    }
    // Tolerance absorbs float noise on exact multiples; the cast saturates.
    (system_kw * 1000.0 / f64::from(panel_watts) - 1e-9).ceil() as u32
}

fn price(item: Option<&CatalogItem>) -> f64 {
    item.map(|i| i.unit_price.max(0.0)).unwrap_or(0.0)
}

/// Prices hardware and installation for a set of parts.
pub fn cost(parts: &CandidateParts<'_>, count: u32, basis: &CostBasis, pricing: &PricingConfig) -> CostBreakdown {
    let panels = price(parts.panel) * f64::from(count);
    let inverter = price(parts.inverter);
    let battery = price(parts.battery);
    let ev_charger = price(parts.ev_charger);
    let installation = pricing.install_per_kw * basis.system_kw * basis.roof_complexity;
    let battery_install = if parts.battery.is_some() {
        pricing.battery_install
    } else {
        0.0
    };
    let ev_install = if parts.ev_charger.is_some() {
        pricing.ev_install
    } else {
        0.0
    };
    let storey_adder = basis.storey_adder;
    CostBreakdown {
        panels,
        inverter,
        battery,
        ev_charger,
        installation,
        battery_install,
        ev_install,
        storey_adder,
        total: panels + inverter + battery + ev_charger + installation + battery_install + ev_install + storey_adder,
    }
}

impl SystemCandidate {
    /// Assembles a priced candidate from selected parts.
    pub fn assemble(
        id: impl Into<String>,
        tier: PackageTier,
        parts: CandidateParts<'_>,
        basis: &CostBasis,
        pricing: &PricingConfig,
    ) -> Self {
        let count = parts
            .panel
            .and_then(CatalogItem::panel_watts)
            .map(|w| panel_count(basis.system_kw, w))
            .unwrap_or(0);
        let cost = cost(&parts, count, basis, pricing);
        Self {
            id: id.into(),
            tier,
            panel: parts.panel.cloned(),
            panel_count: count,
            inverter: parts.inverter.cloned(),
            battery: parts.battery.cloned(),
            ev_charger: parts.ev_charger.cloned(),
            system_kw: basis.system_kw,
            battery_kwh: parts.battery.and_then(CatalogItem::battery_usable_kwh),
            cost,
            omitted: parts.omitted,
        }
    }

    /// Brand of the lead inverter, used for diversification.
    pub fn inverter_brand(&self) -> Option<&str> {
        self.inverter.as_ref().map(|i| i.brand.as_str())
    }

    pub fn has_battery(&self) -> bool {
        self.battery.is_some()
    }

    pub fn inverter_ac_kw(&self) -> f64 {
        self.inverter
            .as_ref()
            .and_then(CatalogItem::inverter_ac_kw)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn panel_count_rounds_up() {
        assert_eq!(panel_count(6.6, 440), 15);
        assert_eq!(panel_count(6.61, 440), 16);
        assert_eq!(panel_count(0.0, 440), 0);
        assert_eq!(panel_count(6.6, 0), 0);
    }

    #[test]
    fn cost_sums_every_line() {
        let catalog = Catalog::builtin();
        let parts = CandidateParts {
            panel: catalog.get("jinko-tiger-neo-440"),
            inverter: catalog.get("sungrow-sg5-0rs"),
            battery: catalog.get("sungrow-sbr096"),
            ev_charger: None,
            omitted: Vec::new(),
        };
        let basis = CostBasis {
            system_kw: 6.6,
            roof_complexity: 1.1,
            storey_adder: 500.0,
        };
        let candidate = SystemCandidate::assemble("value", PackageTier::Value, parts, &basis, &PricingConfig::default());
        let c = candidate.cost;
        assert_eq!(candidate.panel_count, 15);
        assert_eq!(c.panels, 15.0 * 165.0);
        assert!((c.installation - 450.0 * 6.6 * 1.1).abs() < 1e-9);
        assert_eq!(c.battery_install, 800.0);
        assert_eq!(c.ev_install, 0.0);
        let sum = c.panels + c.inverter + c.battery + c.ev_charger + c.installation + c.battery_install + c.ev_install + c.storey_adder;
        assert!((c.total - sum).abs() < 1e-9);
        assert_eq!(candidate.battery_kwh, Some(9.6));
        assert_eq!(candidate.inverter_brand(), Some("Sungrow"));
    }

    #[test]
    fn omitted_parts_cost_nothing() {
        let basis = CostBasis {
            system_kw: 6.6,
            roof_complexity: 1.0,
            storey_adder: 0.0,
        };
        let parts = CandidateParts {
            omitted: vec![Category::Panel, Category::Inverter],
            ..CandidateParts::default()
        };
        let candidate = SystemCandidate::assemble("x", PackageTier::Value, parts, &basis, &PricingConfig::default());
        assert_eq!(candidate.panel_count, 0);
        assert_eq!(candidate.inverter_brand(), None);
        assert_eq!(candidate.cost.total, candidate.cost.installation);
        assert_eq!(candidate.omitted.len(), 2);
    }
}
